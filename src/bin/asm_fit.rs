use active_shape::cache::ModelCache;
use active_shape::config::fit::{self, FitToolConfig};
use active_shape::diagnostics::{FitReport, PyramidStage, SearchReport};
use active_shape::diagnostics::timing::elapsed_ms;
use active_shape::image::io::{load_grayscale_image, read_landmarks, save_grayscale_f32, write_json_file};
use active_shape::image::ImageF32;
use active_shape::{CancellationToken, ContourLocator, Shape, TrainingSample};
use std::env;
use std::path::Path;
use std::time::Instant;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn usage(program: &str) -> String {
    format!("Usage: {program} <config.json>")
}

fn run() -> Result<(), String> {
    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "asm_fit".to_string());
    let config_path = args.next().ok_or_else(|| usage(&program))?;
    let config = fit::load_config(Path::new(&config_path))?;

    let mut report = FitReport::default();
    let samples = report.timing.time("load_training", || load_training(&config))?;

    let cache = config.cache_dir.as_ref().map(ModelCache::new);
    let mut locator = report
        .timing
        .time("train", || {
            ContourLocator::train_with_cache(&samples, &config.model, cache.as_ref())
        })
        .map_err(|e| format!("Training failed: {e}"))?;

    let target = load_image(&config.target)?;
    let start = Instant::now();
    locator.set_image(&target);
    let pyramid_ms = elapsed_ms(start);
    report.timing.push("pyramid", pyramid_ms);
    report.pyramid = PyramidStage::from_framework(locator.framework(), pyramid_ms);

    let poses = report
        .timing
        .time("initial_poses", || locator.initial_poses())
        .map_err(|e| e.to_string())?;
    let indices: Vec<usize> = config
        .pose_indices
        .clone()
        .unwrap_or_else(|| (0..poses.poses.len()).collect());
    let references = match &config.target_landmarks {
        Some(paths) => Some(load_shapes(paths)?),
        None => None,
    };

    let cancel = CancellationToken::new();
    let selected = poses.select_indexed(&indices);
    if selected.len() < indices.len() {
        eprintln!(
            "Skipping {} unknown pose indices: only {} poses",
            indices.len() - selected.len(),
            poses.poses.len()
        );
    }
    // References follow the searched poses, so skipped indices take no slot.
    for (slot, (index, pose)) in selected.into_iter().enumerate() {
        let start = Instant::now();
        let outcome = locator
            .fit(pose, &cancel)
            .map_err(|e| format!("Search from pose {index} failed: {e}"))?;
        let elapsed = elapsed_ms(start);
        report.timing.push(format!("search_{index}"), elapsed);

        let error = references
            .as_ref()
            .and_then(|r| r.get(slot))
            .map(|reference| reference.measure_error(&outcome.shape));
        report.searches.push(SearchReport {
            pose_index: index,
            initial_pose: pose,
            landmarks: outcome.shape.points().to_vec(),
            parameters: outcome.params.iter().copied().collect(),
            levels: outcome.levels,
            elapsed_ms: elapsed,
            error,
        });
    }

    print_text_summary(&report);

    if let Some(path) = &config.output.json_out {
        write_json_file(path, &report).map_err(|e| e.to_string())?;
        println!("\nJSON report written to {}", path.display());
    }
    if let Some(dir) = &config.output.debug_dir {
        for level in 0..locator.framework().levels_count() {
            if let Some(img) = locator.framework().image(level) {
                let path = dir.join(format!("level_{level}_filtered.png"));
                save_grayscale_f32(img, &path).map_err(|e| e.to_string())?;
            }
        }
        println!("Debug artifacts written to {}", dir.display());
    }
    Ok(())
}

fn load_image(path: &Path) -> Result<ImageF32, String> {
    let gray = load_grayscale_image(path)
        .map_err(|e| format!("Failed to load image {}: {e}", path.display()))?;
    Ok(ImageF32::from_u8(&gray.as_view()))
}

fn load_shapes(paths: &[impl AsRef<Path>]) -> Result<Vec<Shape>, String> {
    paths
        .iter()
        .map(|p| {
            read_landmarks(p.as_ref())
                .map(Shape::new)
                .map_err(|e| format!("Failed to read landmarks {}: {e}", p.as_ref().display()))
        })
        .collect()
}

fn load_training(config: &FitToolConfig) -> Result<Vec<TrainingSample>, String> {
    config
        .training
        .iter()
        .map(|entry| {
            let image = load_image(&entry.image)?;
            let shapes = load_shapes(&entry.landmarks)?;
            Ok(TrainingSample::new(image, shapes))
        })
        .collect()
}

fn print_text_summary(report: &FitReport) {
    println!("Fit summary");
    println!("  crop offset: {:?}", report.pyramid.crop_offset);
    for lvl in &report.pyramid.levels {
        println!(
            "  L{}: {}x{} mean_response={:.4} k={} m={}",
            lvl.level_index,
            lvl.width,
            lvl.height,
            lvl.mean_response,
            lvl.model_half_width,
            lvl.search_half_width
        );
    }
    for search in &report.searches {
        let levels: Vec<String> = search
            .levels
            .iter()
            .map(|l| {
                format!(
                    "L{}:{}{}",
                    l.level_index,
                    l.iterations,
                    if l.converged { "" } else { "!" }
                )
            })
            .collect();
        print!(
            "  contour {}: {:.3} ms, iterations [{}]",
            search.pose_index,
            search.elapsed_ms,
            levels.join(" ")
        );
        match search.error {
            Some((avg, max)) => println!(", error avg={avg:.4} max={max:.4}"),
            None => println!(),
        }
    }
    println!("\nTimings (ms): total={:.3}", report.timing.total_ms);
    for stage in &report.timing.stages {
        println!("  {}: {:.3}", stage.label, stage.elapsed_ms);
    }
}

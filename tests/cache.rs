mod common;

use active_shape::appearance::{AppearanceKind, ProfileMatcher};
use active_shape::cache::ModelCache;
use active_shape::{AsmConfig, MultiResolutionFramework, Pose, TrainingSample};
use common::init_logging;
use common::synthetic_image::{filled_polygon, stretched_polygon};

fn samples() -> Vec<TrainingSample> {
    [0.0, 0.03]
        .iter()
        .map(|&s| {
            let contour = stretched_polygon(12, s).transformed(&Pose::new([48.0, 48.0], 18.0, 0.0));
            let image = filled_polygon(96, 96, contour.points(), 0.8, 0.2);
            TrainingSample::new(image, vec![contour])
        })
        .collect()
}

fn half_widths(config: &AsmConfig) -> Vec<usize> {
    config.pyramid.levels.iter().map(|l| l.model_half_width).collect()
}

fn as_json(framework: &MultiResolutionFramework) -> Vec<String> {
    framework
        .models()
        .unwrap()
        .into_iter()
        .map(|m| serde_json::to_string(m).unwrap())
        .collect()
}

#[test]
fn second_training_run_reuses_cached_models() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let cache = ModelCache::new(dir.path());
    let config = AsmConfig::default();
    let samples = samples();

    let mut first = MultiResolutionFramework::new(&config);
    assert!(first.train_cached(&samples, &cache).unwrap());
    for level in 0..config.levels() {
        assert!(cache.level_path(level).is_file());
    }

    let mut second = MultiResolutionFramework::new(&config);
    assert!(!second.train_cached(&[], &cache).unwrap());
    assert_eq!(as_json(&first), as_json(&second));
}

#[test]
fn incomplete_or_mismatched_cache_is_a_miss() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let cache = ModelCache::new(dir.path());
    let config = AsmConfig::default();
    let k = half_widths(&config);
    assert!(cache.load(0).unwrap().is_none());

    let mut framework = MultiResolutionFramework::new(&config);
    framework.train(&samples()).unwrap();
    let models = framework.models().unwrap();
    cache.save(0, models[0]).unwrap();
    assert!(cache
        .load_complete(&k, AppearanceKind::Intensity)
        .unwrap()
        .is_none());

    cache.save_all(&models).unwrap();
    assert!(cache
        .load_complete(&k, AppearanceKind::Mahalanobis)
        .unwrap()
        .is_none());
    let loaded = cache
        .load_complete(&k, AppearanceKind::Intensity)
        .unwrap()
        .unwrap();
    assert_eq!(loaded.len(), config.levels());

    let narrower: Vec<usize> = k.iter().map(|k| k - 1).collect();
    assert!(cache
        .load_complete(&narrower, AppearanceKind::Intensity)
        .unwrap()
        .is_none());
}

#[test]
fn cache_trained_with_another_half_width_is_retrained() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let cache = ModelCache::new(dir.path());
    let samples = samples();

    let config = AsmConfig::default();
    let mut first = MultiResolutionFramework::new(&config);
    assert!(first.train_cached(&samples, &cache).unwrap());
    assert_eq!(cache.load(0).unwrap().unwrap().half_width(), 5);

    let mut narrower = AsmConfig::default();
    for level in &mut narrower.pyramid.levels {
        level.model_half_width = 4;
    }
    let mut second = MultiResolutionFramework::new(&narrower);
    assert!(second.train_cached(&samples, &cache).unwrap());
    for level in 0..narrower.levels() {
        assert_eq!(cache.load(level).unwrap().unwrap().half_width(), 4);
        assert_eq!(second.models().unwrap()[level].half_width(), 4);
    }

    let mut third = MultiResolutionFramework::new(&narrower);
    assert!(!third.train_cached(&[], &cache).unwrap());
}

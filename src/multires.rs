//! Multi-resolution framework: per-level filtered images and appearance models.
//!
//! Level 0 is the base image cropped to the region of interest; level `i`
//! is `i` Gaussian reductions of it. Every level is filtered with its own
//! [`FilterParams`](crate::filter::FilterParams) and owns its own appearance
//! model with half-widths `k` (training) and `m` (search).
use crate::appearance::{AppearanceModel, AppearanceTrainer, ProfileMatcher};
use crate::cache::ModelCache;
use crate::config::{AppearanceConfig, AsmConfig, LevelConfig};
use crate::error::{Error, Result};
use crate::filter::process_image;
use crate::image::ImageF32;
use crate::profile::ProfileSampler;
use crate::pyramid::{Pyramid, Roi, RoiSpec};
use crate::shape::Shape;
use log::{debug, info};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One annotated training image.
#[derive(Clone, Debug)]
pub struct TrainingSample {
    pub image: ImageF32,
    pub shapes: Vec<Shape>,
}

impl TrainingSample {
    pub fn new(image: ImageF32, shapes: Vec<Shape>) -> Self {
        Self { image, shapes }
    }
}

#[derive(Clone, Debug)]
pub struct ResolutionLevel {
    pub config: LevelConfig,
    /// Filtered image searched at this level.
    pub image: Option<ImageF32>,
    /// Unfiltered (only reduced) image at this level.
    pub default_image: Option<ImageF32>,
    pub model: Option<AppearanceModel>,
}

impl ResolutionLevel {
    fn new(config: LevelConfig) -> Self {
        Self {
            config,
            image: None,
            default_image: None,
            model: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct MultiResolutionFramework {
    levels: Vec<ResolutionLevel>,
    roi_spec: RoiSpec,
    appearance: AppearanceConfig,
    roi: Option<Roi>,
}

impl MultiResolutionFramework {
    pub fn new(config: &AsmConfig) -> Self {
        Self {
            levels: config
                .pyramid
                .levels
                .iter()
                .copied()
                .map(ResolutionLevel::new)
                .collect(),
            roi_spec: config.pyramid.roi,
            appearance: config.appearance.clone(),
            roi: None,
        }
    }

    #[inline]
    pub fn levels_count(&self) -> usize {
        self.levels.len()
    }

    pub fn level(&self, index: usize) -> Option<&ResolutionLevel> {
        self.levels.get(index)
    }

    /// Train every level's appearance model from annotated images.
    pub fn train(&mut self, samples: &[TrainingSample]) -> Result<()> {
        if samples.iter().all(|s| s.shapes.is_empty()) {
            return Err(Error::TrainingDataInsufficient(
                "no annotated contours to train appearance models".into(),
            ));
        }
        let configs: Vec<LevelConfig> = self.levels.iter().map(|l| l.config).collect();
        let roi_spec = self.roi_spec;
        let per_image = |sample: &TrainingSample| sample_training_profiles(sample, roi_spec, &configs);

        #[cfg(feature = "parallel")]
        let collected: Vec<Vec<Vec<Vec<Vec<f64>>>>> = samples.par_iter().map(per_image).collect();
        #[cfg(not(feature = "parallel"))]
        let collected: Vec<Vec<Vec<Vec<Vec<f64>>>>> = samples.iter().map(per_image).collect();

        let mut trainers: Vec<AppearanceTrainer> = configs
            .iter()
            .map(|c| AppearanceTrainer::new(c.model_half_width))
            .collect();
        for (image_index, levels) in collected.into_iter().enumerate() {
            for (trainer, contours) in trainers.iter_mut().zip(levels) {
                for profiles in contours {
                    trainer.add_profiles(profiles)?;
                }
            }
            debug!("collected training profiles for image {image_index}");
        }

        for (i, (level, trainer)) in self.levels.iter_mut().zip(&trainers).enumerate() {
            level.model = Some(trainer.finish(
                self.appearance.kind,
                i,
                self.appearance.min_normalized_determinant,
            )?);
            info!("level {i}: appearance model trained from {} contours", trainer.contours());
        }
        Ok(())
    }

    /// Reuse cached models when every level is cached with the configured kind
    /// and half-width, otherwise train and refresh the cache. Returns `true` when training ran.
    pub fn train_cached(&mut self, samples: &[TrainingSample], cache: &ModelCache) -> Result<bool> {
        let half_widths: Vec<usize> = self.levels.iter().map(|l| l.config.model_half_width).collect();
        if let Some(models) = cache.load_complete(&half_widths, self.appearance.kind)? {
            self.set_models(models)?;
            return Ok(false);
        }
        self.train(samples)?;
        cache.save_all(&self.models()?)?;
        Ok(true)
    }

    /// Install pre-trained models, one per level.
    pub fn set_models(&mut self, models: Vec<AppearanceModel>) -> Result<()> {
        if models.len() != self.levels.len() {
            return Err(Error::InvalidConfig(format!(
                "{} appearance models supplied for {} levels",
                models.len(),
                self.levels.len()
            )));
        }
        for (i, (level, model)) in self.levels.iter_mut().zip(models).enumerate() {
            if model.half_width() != level.config.model_half_width {
                return Err(Error::InvalidConfig(format!(
                    "level {i}: model half-width {} does not match configured {}",
                    model.half_width(),
                    level.config.model_half_width
                )));
            }
            level.model = Some(model);
        }
        Ok(())
    }

    pub fn models(&self) -> Result<Vec<&AppearanceModel>> {
        self.levels
            .iter()
            .enumerate()
            .map(|(i, l)| l.model.as_ref().ok_or(Error::ModelNotTrained(i)))
            .collect()
    }

    /// Crop `image` to the region of interest and precompute every level.
    pub fn set_image(&mut self, image: &ImageF32) {
        let roi = self.roi_spec.resolve(image.w, image.h);
        let pyramid = Pyramid::build(roi.crop(image), self.levels.len());
        for (level, raw) in self.levels.iter_mut().zip(pyramid.levels) {
            level.image = Some(process_image(&raw, &level.config.filter));
            level.default_image = Some(raw);
        }
        self.roi = Some(roi);
        debug!("search image set, roi {:?}", roi);
    }

    pub fn has_image(&self) -> bool {
        self.roi.is_some()
    }

    pub fn roi(&self) -> Option<Roi> {
        self.roi
    }

    /// Offset to add to level-0 coordinates to get original image coordinates.
    pub fn crop_offset(&self) -> [f64; 2] {
        self.roi.map_or([0.0, 0.0], |r| r.offset())
    }

    pub fn image(&self, level: usize) -> Option<&ImageF32> {
        self.levels.get(level).and_then(|l| l.image.as_ref())
    }

    pub fn default_image(&self, level: usize) -> Option<&ImageF32> {
        self.levels.get(level).and_then(|l| l.default_image.as_ref())
    }

    /// Move every landmark of `shape` to the best matching position along its
    /// normal in `level`'s filtered image.
    pub fn update_landmarks(&self, level: usize, shape: &Shape) -> Result<Shape> {
        let lvl = self
            .levels
            .get(level)
            .ok_or_else(|| Error::InvalidConfig(format!("no pyramid level {level}")))?;
        let image = lvl.image.as_ref().ok_or(Error::NoImage)?;
        let model = lvl.model.as_ref().ok_or(Error::ModelNotTrained(level))?;
        if model.landmarks() != shape.len() {
            return Err(Error::ShapeMismatch {
                expected: model.landmarks(),
                found: shape.len(),
            });
        }

        let sampler = ProfileSampler::new(lvl.config.search_half_width)
            .with_normalize(false)
            .with_positions(true);
        let points = shape
            .points()
            .iter()
            .zip(shape.normals())
            .enumerate()
            .map(|(i, (p, n))| {
                let profile = sampler.sample(image, *p, *n);
                let best = model.find_best_position(&profile.values, i);
                match profile.positions.as_deref() {
                    Some(pos) => {
                        let c = pos[profile.center()];
                        let b = pos[best];
                        [p[0] + (b[0] - c[0]) as f64, p[1] + (b[1] - c[1]) as f64]
                    }
                    None => *p,
                }
            })
            .collect();
        Ok(Shape::new(points))
    }
}

/// Raw training profiles of one image: `[level][contour][landmark]`.
fn sample_training_profiles(
    sample: &TrainingSample,
    roi_spec: RoiSpec,
    configs: &[LevelConfig],
) -> Vec<Vec<Vec<Vec<f64>>>> {
    let roi = roi_spec.resolve(sample.image.w, sample.image.h);
    let offset = roi.offset();
    let pyramid = Pyramid::build(roi.crop(&sample.image), configs.len());
    let mut shapes: Vec<Shape> = sample
        .shapes
        .iter()
        .map(|s| {
            let mut s = s.clone();
            s.translate([-offset[0], -offset[1]]);
            s
        })
        .collect();

    let mut out = Vec::with_capacity(configs.len());
    for (i, (image, config)) in pyramid.levels.iter().zip(configs).enumerate() {
        if i > 0 {
            shapes.iter_mut().for_each(Shape::downsample_transform);
        }
        let filtered = process_image(image, &config.filter);
        let trainer = AppearanceTrainer::new(config.model_half_width);
        out.push(shapes.iter().map(|s| trainer.sample(&filtered, s)).collect());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(w: usize, h: usize) -> ImageF32 {
        let mut img = ImageF32::new(w, h);
        for y in 0..h {
            for x in 0..w {
                img.set(x, y, ((x + 2 * y) % 17) as f32 / 16.0);
            }
        }
        img
    }

    #[test]
    fn set_image_levels_follow_the_gaussian_pyramid() {
        let mut config = AsmConfig::default();
        config.pyramid.roi = RoiSpec::CenteredWindow {
            half_width: 40,
            top: 10,
            bottom: 61,
        };
        let image = ramp(120, 70);
        let mut framework = MultiResolutionFramework::new(&config);
        framework.set_image(&image);

        let roi = config.pyramid.roi.resolve(image.w, image.h);
        let expected = Pyramid::build(roi.crop(&image), config.levels());
        assert_eq!(expected.levels.len(), config.levels());
        for (i, reference) in expected.levels.iter().enumerate() {
            let raw = framework.default_image(i).unwrap();
            let filtered = framework.image(i).unwrap();
            assert_eq!((raw.w, raw.h), (reference.w, reference.h), "level {i}");
            assert_eq!((filtered.w, filtered.h), (reference.w, reference.h), "level {i}");
            assert_eq!(raw.data, reference.data, "level {i}");
        }
        assert_eq!(framework.crop_offset(), [20.0, 10.0]);
        assert!(framework.image(config.levels()).is_none());
    }
}

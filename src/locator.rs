//! High-level contour locator: train once, then fit contours in new images.
use crate::appearance::ProfileMatcher;
use crate::cache::ModelCache;
use crate::config::AsmConfig;
use crate::error::{Error, Result};
use crate::image::ImageF32;
use crate::initial_pose::{estimate_initial_poses, InitialPoses};
use crate::model::ShapeModel;
use crate::multires::{MultiResolutionFramework, TrainingSample};
use crate::search::{ActiveShapeSearch, CancellationToken, SearchOutcome};
use crate::shape::{Pose, Shape};
use log::info;

/// Shape model, per-level appearance models and the image being searched.
#[derive(Clone, Debug)]
pub struct ContourLocator {
    config: AsmConfig,
    model: ShapeModel,
    framework: MultiResolutionFramework,
}

impl ContourLocator {
    /// Train the shape model from every annotated contour and the appearance
    /// models of every pyramid level.
    pub fn train(samples: &[TrainingSample], config: &AsmConfig) -> Result<Self> {
        Self::train_with_cache(samples, config, None)
    }

    /// Like [`ContourLocator::train`], reusing appearance models from `cache`
    /// when a complete set is stored there.
    pub fn train_with_cache(
        samples: &[TrainingSample],
        config: &AsmConfig,
        cache: Option<&ModelCache>,
    ) -> Result<Self> {
        config.validate()?;
        let shapes: Vec<Shape> = samples.iter().flat_map(|s| s.shapes.iter().cloned()).collect();
        let model = ShapeModel::train(&shapes, &config.shape_model)?;
        info!(
            "shape model: {} landmarks, {} components from {} contours",
            model.landmarks(),
            model.pca.components(),
            shapes.len()
        );

        let mut framework = MultiResolutionFramework::new(config);
        match cache {
            Some(cache) => {
                if !framework.train_cached(samples, cache)? {
                    info!("appearance models loaded from {}", cache.dir().display());
                }
            }
            None => framework.train(samples)?,
        }
        let locator = Self {
            config: config.clone(),
            model,
            framework,
        };
        locator.check_landmarks()?;
        Ok(locator)
    }

    /// Assemble a locator from already trained parts.
    pub fn from_parts(config: AsmConfig, model: ShapeModel, framework: MultiResolutionFramework) -> Result<Self> {
        config.validate()?;
        let locator = Self {
            config,
            model,
            framework,
        };
        locator.check_landmarks()?;
        Ok(locator)
    }

    fn check_landmarks(&self) -> Result<()> {
        let expected = self.model.landmarks();
        for model in self.framework.models()? {
            if model.landmarks() != expected {
                return Err(Error::ShapeMismatch {
                    expected,
                    found: model.landmarks(),
                });
            }
        }
        Ok(())
    }

    pub fn config(&self) -> &AsmConfig {
        &self.config
    }

    pub fn model(&self) -> &ShapeModel {
        &self.model
    }

    pub fn framework(&self) -> &MultiResolutionFramework {
        &self.framework
    }

    pub fn set_image(&mut self, image: &ImageF32) {
        self.framework.set_image(image);
    }

    /// Heuristic starting poses in the cropped level-0 frame searched by
    /// [`ContourLocator::fit`].
    pub fn initial_poses(&self) -> Result<InitialPoses> {
        let image = self.framework.default_image(0).ok_or(Error::NoImage)?;
        Ok(estimate_initial_poses(image, &self.config.initial_pose))
    }

    pub fn search(&self) -> ActiveShapeSearch<'_> {
        ActiveShapeSearch::new(&self.model, &self.framework, &self.config.search)
    }

    /// Fit one contour starting from `pose` (cropped level-0 frame).
    pub fn fit(&self, pose: Pose, cancel: &CancellationToken) -> Result<SearchOutcome> {
        self.search().run(pose, cancel)
    }

    /// Estimate the initial poses and fit the contours at `indices`, in order.
    ///
    /// Stops at the first failure, including cancellation.
    pub fn fit_selected(&self, indices: &[usize], cancel: &CancellationToken) -> Result<Vec<(usize, SearchOutcome)>> {
        let poses = self.initial_poses()?;
        poses
            .select_indexed(indices)
            .into_iter()
            .map(|(index, pose)| {
                info!("fitting contour {index} from pose {:?}", pose);
                Ok((index, self.fit(pose, cancel)?))
            })
            .collect()
    }
}

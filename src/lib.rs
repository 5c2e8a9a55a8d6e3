#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod evaluation;
pub mod image;
pub mod locator;
pub mod model;
pub mod search;
pub mod shape;

// Building blocks – public for tools and tests, but considered internals.
pub mod angle;
pub mod appearance;
pub mod cache;
pub mod edges;
pub mod filter;
pub mod initial_pose;
pub mod multires;
pub mod pca;
pub mod profile;
pub mod pyramid;

// --- High-level re-exports -------------------------------------------------

// Main entry points: locator, search and results.
pub use crate::config::{load_config, AsmConfig};
pub use crate::error::{Error, Result};
pub use crate::locator::ContourLocator;
pub use crate::model::ShapeModel;
pub use crate::multires::{MultiResolutionFramework, TrainingSample};
pub use crate::search::{
    ActiveShapeSearch, CancellationToken, SearchOutcome, SearchPhase, SearchSnapshot, StepMode,
};
pub use crate::shape::{Pose, Shape};

// Reports returned to tools.
pub use crate::diagnostics::{FitReport, LevelSummary, SearchReport};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use active_shape::prelude::*;
///
/// # fn main() -> active_shape::Result<()> {
/// let image = ImageF32::new(256, 256);
/// let contour = Shape::new(vec![[100.0, 100.0], [140.0, 100.0], [140.0, 150.0], [100.0, 150.0]]);
/// let samples = vec![TrainingSample::new(image.clone(), vec![contour.clone(), contour])];
///
/// let mut locator = ContourLocator::train(&samples, &AsmConfig::default())?;
/// locator.set_image(&image);
/// let outcome = locator.fit(Pose::new([120.0, 125.0], 30.0, 0.0), &CancellationToken::new())?;
/// println!("fitted {} landmarks", outcome.shape.len());
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::image::ImageF32;
    pub use crate::{
        AsmConfig, CancellationToken, ContourLocator, Pose, Shape, StepMode, TrainingSample,
    };
}

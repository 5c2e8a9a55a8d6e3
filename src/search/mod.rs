//! Active shape search.
//!
//! A search starts from the model's mean shape placed by a pose and refines
//! it from the coarsest pyramid level down to level 0. Every iteration moves
//! the landmarks to their best profile matches, then projects the result back
//! onto the shape model with clamped parameters and scale:
//!
//! ```text
//! Initialize ─► SampleAndUpdate ─► ReprojectClamp ─┬─► SampleAndUpdate …
//!                      ▲                           ├─► Converged ──┐
//!                      │                           └─► LevelExhausted
//!                      └──────── next finer level ◄────────────────┤
//!                                                   level 0 ─► Terminated
//! ```
//!
//! [`ActiveShapeSearch::steps`] exposes the machine as a lazy iterator so a
//! driver can observe each iteration (or each phase); [`ActiveShapeSearch::run`]
//! drains it.

mod cancel;
mod state;
mod steps;

pub use cancel::CancellationToken;
pub use state::{SearchPhase, SearchSnapshot, SearchState, StepMode};
pub use steps::SearchSteps;

use crate::config::SearchConfig;
use crate::diagnostics::LevelSummary;
use crate::error::{Error, Result};
use crate::model::ShapeModel;
use crate::multires::MultiResolutionFramework;
use crate::shape::{Pose, Shape};
use nalgebra::DVector;

/// Result of a completed search.
#[derive(Clone, Debug)]
pub struct SearchOutcome {
    /// Fitted contour in original image coordinates.
    pub shape: Shape,
    /// Final (clamped) shape parameters.
    pub params: DVector<f64>,
    /// Coarsest level first.
    pub levels: Vec<LevelSummary>,
}

/// Read-only context of a search: the shape model, the trained framework
/// holding the current image and the iteration policy.
#[derive(Clone, Copy, Debug)]
pub struct ActiveShapeSearch<'a> {
    model: &'a ShapeModel,
    framework: &'a MultiResolutionFramework,
    config: &'a SearchConfig,
}

impl<'a> ActiveShapeSearch<'a> {
    pub fn new(
        model: &'a ShapeModel,
        framework: &'a MultiResolutionFramework,
        config: &'a SearchConfig,
    ) -> Self {
        Self {
            model,
            framework,
            config,
        }
    }

    pub fn model(&self) -> &'a ShapeModel {
        self.model
    }

    pub fn framework(&self) -> &'a MultiResolutionFramework {
        self.framework
    }

    pub fn config(&self) -> &'a SearchConfig {
        self.config
    }

    /// Place the mean shape at `pose` on the coarsest level.
    ///
    /// `pose` is expressed in level-0 coordinates of the cropped region.
    pub fn initialize(&self, pose: &Pose) -> Result<SearchState> {
        if !self.framework.has_image() {
            return Err(Error::NoImage);
        }
        let levels = self.framework.levels_count();
        if levels == 0 {
            return Err(Error::InvalidConfig("search needs at least one pyramid level".into()));
        }
        // Fails with ModelNotTrained before any iteration starts.
        self.framework.models()?;

        let level = levels - 1;
        let shape = self
            .model
            .mean_shape()
            .transformed(&pose.downsampled(level as u32));
        Ok(SearchState {
            shape,
            params: DVector::zeros(self.model.pca.components()),
            level,
            iteration: 0,
            previous: None,
            last_difference: None,
            summaries: Vec::with_capacity(levels),
        })
    }

    /// Lazy sequence of snapshots of a search starting at `pose`.
    ///
    /// The sequence ends after the `Terminated` snapshot, after the first
    /// error, or right after an `Err(Error::Cancelled)` once `cancel` is set.
    pub fn steps(&self, pose: Pose, mode: StepMode, cancel: CancellationToken) -> SearchSteps<'a> {
        SearchSteps::new(*self, pose, mode, cancel)
    }

    /// Run a full search and return the fitted contour.
    pub fn run(&self, pose: Pose, cancel: &CancellationToken) -> Result<SearchOutcome> {
        let mut steps = self.steps(pose, StepMode::Iteration, cancel.clone());
        let mut last = None;
        for snapshot in steps.by_ref() {
            last = Some(snapshot?);
        }
        match last {
            Some(s) if s.phase == SearchPhase::Terminated => Ok(SearchOutcome {
                shape: s.shape,
                params: s.params,
                levels: steps.level_summaries().to_vec(),
            }),
            _ => Err(Error::Cancelled),
        }
    }
}

/// Candidate shape with every landmark moved to its best match on `level`.
pub fn update_landmarks(framework: &MultiResolutionFramework, level: usize, shape: &Shape) -> Result<Shape> {
    framework.update_landmarks(level, shape)
}

/// Constrain `candidate` to the shape model.
///
/// The candidate is aligned to the mean shape, its parameters are clamped to
/// the allowed deviation and its scale to `config.scale_bounds(level)`, then
/// the reconstruction is placed back with the aligned pose.
pub fn reproject_clamp(
    model: &ShapeModel,
    candidate: &Shape,
    level: usize,
    config: &SearchConfig,
) -> (Shape, DVector<f64>) {
    let (aligned, mut pose) = candidate.aligned_to(&model.mean_shape());
    let mut params = model.project(&aligned);
    model.clamp(&mut params);
    let (min_scale, max_scale) = config.scale_bounds(level);
    pose.scale = pose.scale.clamp(min_scale, max_scale);
    (model.reconstruct(&params).transformed(&pose), params)
}

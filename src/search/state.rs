use crate::diagnostics::LevelSummary;
use crate::shape::Shape;
use nalgebra::DVector;

/// States of the search engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchPhase {
    /// Mean shape placed by the starting pose at the coarsest level.
    Initialize,
    /// Landmarks moved to their best profile matches.
    SampleAndUpdate,
    /// Candidate projected onto the shape model and clamped.
    ReprojectClamp,
    /// The last iteration moved the shape by less than the threshold; the
    /// shape was reverted to its state before that iteration.
    Converged,
    /// The level's iteration budget ran out.
    LevelExhausted,
    /// Search finished; the shape is in original image coordinates.
    Terminated,
}

/// Granularity of [`SearchSteps`](super::SearchSteps).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StepMode {
    /// One snapshot per full iteration (sample, update, reproject, clamp).
    #[default]
    Iteration,
    /// One snapshot per phase.
    Phase,
}

/// What a driver sees after each step.
#[derive(Clone, Debug)]
pub struct SearchSnapshot {
    pub phase: SearchPhase,
    pub level: usize,
    /// Iterations completed at `level`.
    pub iteration: usize,
    /// Current shape, in `level` coordinates (image coordinates once terminated).
    pub shape: Shape,
    pub params: DVector<f64>,
    /// Sum of squared landmark moves of the last completed iteration.
    pub difference: Option<f64>,
}

/// Mutable state owned by one search.
#[derive(Clone, Debug)]
pub struct SearchState {
    pub shape: Shape,
    pub params: DVector<f64>,
    pub level: usize,
    pub iteration: usize,
    /// Shape before the current iteration, kept for the convergence test.
    pub previous: Option<Shape>,
    pub last_difference: Option<f64>,
    pub summaries: Vec<LevelSummary>,
}

impl SearchState {
    pub(crate) fn snapshot(&self, phase: SearchPhase) -> SearchSnapshot {
        SearchSnapshot {
            phase,
            level: self.level,
            iteration: self.iteration,
            shape: self.shape.clone(),
            params: self.params.clone(),
            difference: self.last_difference,
        }
    }
}

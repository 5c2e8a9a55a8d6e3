use super::state::{SearchPhase, SearchSnapshot, SearchState, StepMode};
use super::{reproject_clamp, update_landmarks, ActiveShapeSearch, CancellationToken};
use crate::diagnostics::LevelSummary;
use crate::error::{Error, Result};
use crate::shape::{Pose, Shape};
use log::{debug, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Next {
    Initialize,
    Sample,
    Reproject,
    LevelEnd { converged: bool },
    Terminate,
    Done,
}

/// Iterator over the snapshots of one search.
///
/// Created by [`ActiveShapeSearch::steps`]. In [`StepMode::Iteration`] every
/// item after `Initialize` is a full iteration (reported as `ReprojectClamp`);
/// in [`StepMode::Phase`] the `SampleAndUpdate` candidate is reported too.
/// Level ends are reported as separate `Converged` or `LevelExhausted` items.
pub struct SearchSteps<'a> {
    search: ActiveShapeSearch<'a>,
    pose: Pose,
    mode: StepMode,
    cancel: CancellationToken,
    state: Option<SearchState>,
    candidate: Option<Shape>,
    pending_descent: bool,
    next: Next,
}

impl<'a> SearchSteps<'a> {
    pub(super) fn new(search: ActiveShapeSearch<'a>, pose: Pose, mode: StepMode, cancel: CancellationToken) -> Self {
        Self {
            search,
            pose,
            mode,
            cancel,
            state: None,
            candidate: None,
            pending_descent: false,
            next: Next::Initialize,
        }
    }

    /// Current search state; `None` before the first item.
    pub fn state(&self) -> Option<&SearchState> {
        self.state.as_ref()
    }

    /// Summaries of the levels finished so far, coarsest first.
    pub fn level_summaries(&self) -> &[LevelSummary] {
        self.state
            .as_ref()
            .map(|s| s.summaries.as_slice())
            .unwrap_or_default()
    }

    fn fail(&mut self, err: Error) -> Option<Result<SearchSnapshot>> {
        self.next = Next::Done;
        Some(Err(err))
    }

    fn initialize(&mut self) -> Option<Result<SearchSnapshot>> {
        match self.search.initialize(&self.pose) {
            Ok(state) => {
                debug!(
                    "search initialised at level {} from pose {:?}",
                    state.level, self.pose
                );
                let snapshot = state.snapshot(SearchPhase::Initialize);
                self.state = Some(state);
                self.next = Next::Sample;
                Some(Ok(snapshot))
            }
            Err(e) => self.fail(e),
        }
    }

    fn sample(&mut self) -> Option<Result<SearchSnapshot>> {
        if self.cancel.is_cancelled() {
            info!("search cancelled");
            return self.fail(Error::Cancelled);
        }
        let Some(state) = self.state.as_mut() else {
            return self.fail(Error::NoImage);
        };
        if self.pending_descent {
            self.pending_descent = false;
            state.level -= 1;
            state.shape.upsample_transform();
            state.iteration = 0;
            state.last_difference = None;
        }

        let candidate = match update_landmarks(self.search.framework(), state.level, &state.shape) {
            Ok(c) => c,
            Err(e) => return self.fail(e),
        };
        state.previous = Some(state.shape.clone());

        match self.mode {
            StepMode::Phase => {
                let snapshot = SearchSnapshot {
                    shape: candidate.clone(),
                    ..state.snapshot(SearchPhase::SampleAndUpdate)
                };
                self.candidate = Some(candidate);
                self.next = Next::Reproject;
                Some(Ok(snapshot))
            }
            StepMode::Iteration => {
                self.candidate = Some(candidate);
                self.reproject()
            }
        }
    }

    fn reproject(&mut self) -> Option<Result<SearchSnapshot>> {
        let Some(candidate) = self.candidate.take() else {
            return self.fail(Error::InvalidConfig("reprojection without a candidate".into()));
        };
        let Some(state) = self.state.as_mut() else {
            return self.fail(Error::NoImage);
        };
        let config = self.search.config();
        let (shape, params) = reproject_clamp(self.search.model(), &candidate, state.level, config);
        let difference = state
            .previous
            .as_ref()
            .map_or(f64::INFINITY, |p| shape.sum_of_squared_distances(p));
        state.shape = shape;
        state.params = params;
        state.iteration += 1;
        state.last_difference = Some(difference);

        self.next = if difference < config.convergence_threshold {
            Next::LevelEnd { converged: true }
        } else if state.iteration >= config.max_iterations_per_level {
            Next::LevelEnd { converged: false }
        } else {
            Next::Sample
        };
        Some(Ok(state.snapshot(SearchPhase::ReprojectClamp)))
    }

    fn level_end(&mut self, converged: bool) -> Option<Result<SearchSnapshot>> {
        let Some(state) = self.state.as_mut() else {
            return self.fail(Error::NoImage);
        };
        if converged {
            if let Some(previous) = state.previous.take() {
                state.shape = previous;
            }
        }
        state.summaries.push(LevelSummary {
            level_index: state.level,
            iterations: state.iteration,
            converged,
            last_difference: state.last_difference,
        });
        if converged {
            info!(
                "level {}: converged after {} iterations",
                state.level, state.iteration
            );
        } else {
            info!(
                "level {}: iteration budget of {} exhausted (difference {:.3})",
                state.level,
                state.iteration,
                state.last_difference.unwrap_or(f64::NAN)
            );
        }

        let phase = if converged {
            SearchPhase::Converged
        } else {
            SearchPhase::LevelExhausted
        };
        let snapshot = state.snapshot(phase);
        if state.level == 0 {
            self.next = Next::Terminate;
        } else {
            self.pending_descent = true;
            self.next = Next::Sample;
        }
        Some(Ok(snapshot))
    }

    fn terminate(&mut self) -> Option<Result<SearchSnapshot>> {
        let Some(state) = self.state.as_mut() else {
            return self.fail(Error::NoImage);
        };
        state.shape.translate(self.search.framework().crop_offset());
        self.next = Next::Done;
        Some(Ok(state.snapshot(SearchPhase::Terminated)))
    }
}

impl Iterator for SearchSteps<'_> {
    type Item = Result<SearchSnapshot>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next {
            Next::Initialize => self.initialize(),
            Next::Sample => self.sample(),
            Next::Reproject => self.reproject(),
            Next::LevelEnd { converged } => self.level_end(converged),
            Next::Terminate => self.terminate(),
            Next::Done => None,
        }
    }
}

impl std::iter::FusedIterator for SearchSteps<'_> {}

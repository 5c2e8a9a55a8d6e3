use super::pyramid::PyramidStage;
use super::timing::TimingBreakdown;
use crate::shape::Pose;
use serde::{Deserialize, Serialize};

/// How the search left one pyramid level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelSummary {
    pub level_index: usize,
    pub iterations: usize,
    /// `false` when the iteration budget ran out first.
    pub converged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_difference: Option<f64>,
}

/// One fitted contour.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchReport {
    pub pose_index: usize,
    pub initial_pose: Pose,
    pub landmarks: Vec<[f64; 2]>,
    pub parameters: Vec<f64>,
    pub levels: Vec<LevelSummary>,
    pub elapsed_ms: f64,
    /// `(average, maximum)` relative error when a reference contour is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<(f64, f64)>,
}

/// Everything a fit run reports.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitReport {
    pub timing: TimingBreakdown,
    pub pyramid: PyramidStage,
    pub searches: Vec<SearchReport>,
}

//! Serializable diagnostics for training and search runs.
//!
//! `FitReport` is what the demo tool writes: per-stage timings, the pyramid
//! levels that were searched and one `SearchReport` per fitted contour.

pub mod pyramid;
pub mod search;
pub mod timing;

pub use pyramid::{PyramidLevelReport, PyramidStage};
pub use search::{FitReport, LevelSummary, SearchReport};
pub use timing::{StageTiming, TimingBreakdown};

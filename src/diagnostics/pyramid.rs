use crate::multires::MultiResolutionFramework;
use serde::{Deserialize, Serialize};

/// Statistics for a single searched pyramid level.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PyramidLevelReport {
    pub level_index: usize,
    pub width: usize,
    pub height: usize,
    /// Mean of the filtered (edge response) image.
    pub mean_response: f32,
    pub model_half_width: usize,
    pub search_half_width: usize,
}

/// Pyramid preparation details for the current search image.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PyramidStage {
    pub elapsed_ms: f64,
    pub crop_offset: [f64; 2],
    pub levels: Vec<PyramidLevelReport>,
}

impl PyramidStage {
    pub fn from_framework(framework: &MultiResolutionFramework, elapsed_ms: f64) -> Self {
        let levels = (0..framework.levels_count())
            .filter_map(|level| {
                let lvl = framework.level(level)?;
                let img = lvl.image.as_ref()?;
                let sum: f32 = img.data.iter().copied().sum();
                let denom = (img.w * img.h).max(1) as f32;
                Some(PyramidLevelReport {
                    level_index: level,
                    width: img.w,
                    height: img.h,
                    mean_response: sum / denom,
                    model_half_width: lvl.config.model_half_width,
                    search_half_width: lvl.config.search_half_width,
                })
            })
            .collect();
        Self {
            elapsed_ms,
            crop_offset: framework.crop_offset(),
            levels,
        }
    }
}

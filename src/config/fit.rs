//! Runtime configuration of the `asm_fit` tool.
use super::AsmConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct OutputConfig {
    pub json_out: Option<PathBuf>,
    /// Receives the filtered level images when set.
    pub debug_dir: Option<PathBuf>,
}

/// One training radiograph with a landmark file per annotated contour.
#[derive(Clone, Debug, Deserialize)]
pub struct TrainingEntry {
    pub image: PathBuf,
    pub landmarks: Vec<PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FitToolConfig {
    #[serde(default)]
    pub model: AsmConfig,
    pub training: Vec<TrainingEntry>,
    pub target: PathBuf,
    /// Reference contours of the target for error reporting. Entry `j` belongs
    /// to the `j`-th pose actually searched; indices in `pose_indices` that
    /// name no pose are skipped and take no entry.
    #[serde(default)]
    pub target_landmarks: Option<Vec<PathBuf>>,
    /// Initial poses to search from; all of them when absent.
    #[serde(default)]
    pub pose_indices: Option<Vec<usize>>,
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    #[serde(default)]
    pub output: OutputConfig,
}

pub fn load_config(path: &Path) -> Result<FitToolConfig, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let config: FitToolConfig = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    config
        .model
        .validate()
        .map_err(|e| format!("Invalid model config in {}: {e}", path.display()))?;
    Ok(config)
}

//! On-disk cache of trained per-level appearance models.
//!
//! One JSON file per level (`appearance_level_{i}.json`) inside a directory.
//! A training run only reuses the cache when every level loads.
use crate::appearance::{AppearanceKind, AppearanceModel, ProfileMatcher};
use crate::error::Result;
use crate::image::io::{read_json_file, write_json_file};
use log::{debug, info};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct ModelCache {
    dir: PathBuf,
}

impl ModelCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn level_path(&self, level: usize) -> PathBuf {
        self.dir.join(format!("appearance_level_{level}.json"))
    }

    pub fn save(&self, level: usize, model: &AppearanceModel) -> Result<()> {
        let path = self.level_path(level);
        write_json_file(&path, model)?;
        debug!("cached level {level} appearance model at {}", path.display());
        Ok(())
    }

    /// `Ok(None)` when the artifact does not exist.
    pub fn load(&self, level: usize) -> Result<Option<AppearanceModel>> {
        let path = self.level_path(level);
        if !path.is_file() {
            return Ok(None);
        }
        read_json_file(&path).map(Some)
    }

    /// Every level's model if one artifact per entry of `half_widths` exists,
    /// is of `kind` and was trained with that level's half-width.
    pub fn load_complete(
        &self,
        half_widths: &[usize],
        kind: AppearanceKind,
    ) -> Result<Option<Vec<AppearanceModel>>> {
        let mut models = Vec::with_capacity(half_widths.len());
        for (level, &k) in half_widths.iter().enumerate() {
            match self.load(level)? {
                Some(model) if model.kind() == kind && model.half_width() == k => models.push(model),
                Some(model) => {
                    debug!(
                        "appearance cache miss at level {level}: stored {:?} k={}, wanted {:?} k={k}",
                        model.kind(),
                        model.half_width(),
                        kind
                    );
                    return Ok(None);
                }
                None => {
                    debug!("appearance cache miss at level {level}: no artifact");
                    return Ok(None);
                }
            }
        }
        info!(
            "loaded {} cached appearance models from {}",
            models.len(),
            self.dir.display()
        );
        Ok(Some(models))
    }

    pub fn save_all(&self, models: &[&AppearanceModel]) -> Result<()> {
        for (level, model) in models.iter().enumerate() {
            self.save(level, model)?;
        }
        Ok(())
    }
}

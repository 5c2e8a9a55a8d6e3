//! Model, pyramid and search configuration.
//!
//! Every section deserialises with defaults, so a JSON document only needs to
//! name the values it changes. The defaults reproduce the two-level dental
//! radiograph setup.

pub mod fit;

use crate::appearance::AppearanceKind;
use crate::error::{Error, Result};
use crate::filter::FilterParams;
use crate::image::io::read_json_file;
use crate::initial_pose::InitialPoseParams;
use crate::pyramid::RoiSpec;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsmConfig {
    pub pyramid: PyramidConfig,
    pub shape_model: ShapeModelConfig,
    pub appearance: AppearanceConfig,
    pub search: SearchConfig,
    pub initial_pose: InitialPoseParams,
}

/// Per-level filter and profile settings; the level count is `levels.len()`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PyramidConfig {
    pub levels: Vec<LevelConfig>,
    pub roi: RoiSpec,
}

impl Default for PyramidConfig {
    fn default() -> Self {
        Self {
            levels: vec![
                LevelConfig::new(FilterParams::new(5, 17, 6.0), 5, 14),
                LevelConfig::new(FilterParams::new(3, 15, 6.0), 5, 14),
            ],
            roi: RoiSpec::Full,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub filter: FilterParams,
    /// Training profile half-width `k`.
    pub model_half_width: usize,
    /// Search profile half-width `m` (must exceed `k`).
    pub search_half_width: usize,
}

impl LevelConfig {
    pub fn new(filter: FilterParams, model_half_width: usize, search_half_width: usize) -> Self {
        Self {
            filter,
            model_half_width,
            search_half_width,
        }
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self::new(FilterParams::default(), 5, 14)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeModelConfig {
    /// Mean-shape loop stops once successive means differ by less (SSD).
    pub mean_tolerance: f64,
    pub max_mean_iterations: usize,
    /// Maximum number of PCA components; `0` keeps all.
    pub components_limit: usize,
    /// Fraction of variance to retain; `None` keeps every component.
    pub variance_threshold: Option<f64>,
    /// `c` in the parameter clamp `± c·√λ`.
    pub deviation_multiplier: f64,
}

impl Default for ShapeModelConfig {
    fn default() -> Self {
        Self {
            mean_tolerance: 0.05,
            max_mean_iterations: 100,
            components_limit: 0,
            variance_threshold: Some(0.9),
            deviation_multiplier: 2.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceConfig {
    pub kind: AppearanceKind,
    /// Mahalanobis training fails below this `det(C) / Π Cᵢᵢ`.
    pub min_normalized_determinant: f64,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            kind: AppearanceKind::Intensity,
            min_normalized_determinant: 1e-12,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_iterations_per_level: usize,
    /// A level converges once an iteration moves the shape by less (SSD).
    pub convergence_threshold: f64,
    pub min_scale: f64,
    /// Upper scale bound at level 0; halved for every coarser level.
    pub max_scale_level0: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_iterations_per_level: 100,
            convergence_threshold: 1.0,
            min_scale: 5.0,
            max_scale_level0: 80.0,
        }
    }
}

impl SearchConfig {
    /// `(min, max)` scale allowed at `level`.
    pub fn scale_bounds(&self, level: usize) -> (f64, f64) {
        let max = self.max_scale_level0 / 2f64.powi(level as i32);
        (self.min_scale.min(max), max)
    }
}

impl AsmConfig {
    pub fn levels(&self) -> usize {
        self.pyramid.levels.len()
    }

    /// Check cross-field invariants that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(Error::InvalidConfig(msg));
        if self.pyramid.levels.is_empty() {
            return invalid("pyramid needs at least one level".into());
        }
        for (i, level) in self.pyramid.levels.iter().enumerate() {
            if level.model_half_width == 0 {
                return invalid(format!("level {i}: model_half_width must be positive"));
            }
            if level.search_half_width <= level.model_half_width {
                return invalid(format!(
                    "level {i}: search_half_width ({}) must exceed model_half_width ({})",
                    level.search_half_width, level.model_half_width
                ));
            }
            let median = level.filter.median_kernel;
            if median > 1 && median % 2 == 0 {
                return invalid(format!("level {i}: median_kernel must be odd, got {median}"));
            }
            if level.filter.bilateral_sigma_space <= 0.0 || level.filter.bilateral_sigma_color <= 0.0
            {
                return invalid(format!("level {i}: bilateral sigmas must be positive"));
            }
        }

        let shape = &self.shape_model;
        if shape.mean_tolerance <= 0.0 {
            return invalid("shape_model.mean_tolerance must be positive".into());
        }
        if shape.max_mean_iterations == 0 {
            return invalid("shape_model.max_mean_iterations must be positive".into());
        }
        if let Some(v) = shape.variance_threshold {
            if !(v > 0.0 && v <= 1.0) {
                return invalid(format!("shape_model.variance_threshold {v} outside (0, 1]"));
            }
        }
        if shape.deviation_multiplier <= 0.0 {
            return invalid("shape_model.deviation_multiplier must be positive".into());
        }

        let search = &self.search;
        if search.max_iterations_per_level == 0 {
            return invalid("search.max_iterations_per_level must be positive".into());
        }
        if search.convergence_threshold < 0.0 {
            return invalid("search.convergence_threshold must not be negative".into());
        }
        if search.min_scale <= 0.0 || search.max_scale_level0 <= search.min_scale {
            return invalid(format!(
                "search scale range [{}, {}] is empty",
                search.min_scale, search.max_scale_level0
            ));
        }
        self.initial_pose.validate()
    }
}

/// Read an [`AsmConfig`] from JSON and validate it.
pub fn load_config(path: &Path) -> Result<AsmConfig> {
    let config: AsmConfig = read_json_file(path)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = AsmConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.levels(), 2);
        assert_eq!(cfg.pyramid.levels[1].filter.median_kernel, 3);
        assert_eq!(cfg.search.scale_bounds(1), (5.0, 40.0));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: AsmConfig =
            serde_json::from_str(r#"{ "search": { "max_iterations_per_level": 7 } }"#).unwrap();
        assert_eq!(cfg.search.max_iterations_per_level, 7);
        assert_eq!(cfg.search.convergence_threshold, 1.0);
        assert_eq!(cfg.appearance.kind, AppearanceKind::Intensity);
    }

    #[test]
    fn search_width_must_exceed_model_width() {
        let mut cfg = AsmConfig::default();
        cfg.pyramid.levels[0].search_half_width = 5;
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn even_median_kernel_is_rejected() {
        let mut cfg = AsmConfig::default();
        cfg.pyramid.levels[1].filter.median_kernel = 4;
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn roi_round_trips_through_json() {
        let mut cfg = AsmConfig::default();
        cfg.pyramid.roi = RoiSpec::radiograph();
        let text = serde_json::to_string(&cfg).unwrap();
        let back: AsmConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, cfg);
    }
}

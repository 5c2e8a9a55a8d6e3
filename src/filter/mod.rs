//! Per-level preprocessing: median blur → bilateral smoothing → edge response.
//!
//! Kernel sizes and bilateral sigmas are given the way they are usually tuned
//! on 8-bit images (sigmas in grey levels); they are rescaled internally to
//! the `[0, 1]` intensity range of [`ImageF32`].

pub mod bilateral;
pub mod median;

pub use bilateral::bilateral_filter;
pub use median::median_blur;

use crate::edges::edge_response;
use crate::image::ImageF32;
use serde::{Deserialize, Serialize};

/// Filter parameters of one pyramid level.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    /// Odd median kernel size; `0` or `1` disables the median stage.
    pub median_kernel: usize,
    /// Bilateral neighbourhood diameter in pixels; `<= 1` disables the stage.
    pub bilateral_diameter: usize,
    /// Range sigma in 8-bit grey levels.
    pub bilateral_sigma_color: f64,
    /// Spatial sigma in pixels.
    pub bilateral_sigma_space: f64,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            median_kernel: 5,
            bilateral_diameter: 17,
            bilateral_sigma_color: 6.0,
            bilateral_sigma_space: 200.0,
        }
    }
}

impl FilterParams {
    pub fn new(median_kernel: usize, bilateral_diameter: usize, bilateral_sigma_color: f64) -> Self {
        Self {
            median_kernel,
            bilateral_diameter,
            bilateral_sigma_color,
            ..Self::default()
        }
    }
}

/// Median blur, bilateral smoothing, then Scharr gradient magnitude.
pub fn process_image(image: &ImageF32, params: &FilterParams) -> ImageF32 {
    let smoothed = smooth(image, params);
    edge_response(&smoothed)
}

/// The two denoising stages of [`process_image`] without the edge response.
pub fn smooth(image: &ImageF32, params: &FilterParams) -> ImageF32 {
    let median = median_blur(image, params.median_kernel);
    bilateral_filter(
        &median,
        params.bilateral_diameter,
        params.bilateral_sigma_color / 255.0,
        params.bilateral_sigma_space,
    )
}

use crate::error::{Error, Result};
use crate::filter::FilterParams;
use serde::{Deserialize, Serialize};

/// Tuning constants of the initial pose heuristic.
///
/// Distances are in base-level pixels, intensities in the `[0, 1]` range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialPoseParams {
    /// Columns removed from both image sides before any analysis.
    pub side_margin: usize,
    /// Height of the region above the upper separation row.
    pub upper_crop_height: usize,
    /// Height of the region below the lower separation row.
    pub lower_crop_height: usize,
    /// Rows stay in the separation band while their sum is within this of the minimum.
    pub histogram_delta: f64,
    /// Maximum number of rows the band grows in either direction.
    pub expansion_limit: usize,
    pub filter: FilterParams,
    /// Edge response above which a pixel counts as foreground.
    pub binary_threshold: f64,
    pub hough: HoughParams,
    /// Lines further than this from vertical are dropped (degrees).
    pub vertical_tolerance_deg: f64,
    /// Lines closer than this are merged; also the placeholder spacing.
    pub line_gap: f64,
    /// Lines within this distance of a region side are dropped.
    pub edge_margin: f64,
    pub upper: RegionLayout,
    pub lower: RegionLayout,
}

impl Default for InitialPoseParams {
    fn default() -> Self {
        Self {
            side_margin: 160,
            upper_crop_height: 160,
            lower_crop_height: 160,
            histogram_delta: 5000.0 / 255.0,
            expansion_limit: 200,
            filter: FilterParams::new(5, 17, 6.0),
            binary_threshold: 8.0 / 255.0,
            hough: HoughParams::default(),
            vertical_tolerance_deg: 10.0,
            line_gap: 40.0,
            edge_margin: 40.0,
            upper: RegionLayout {
                outer_offset: 35.0,
                outer_y: 50.0,
                inner_y: 80.0,
                scale: 50.0,
                rotations: [-0.1, 0.1, 0.1, 0.2],
            },
            lower: RegionLayout {
                outer_offset: 40.0,
                outer_y: 90.0,
                inner_y: 100.0,
                scale: 40.0,
                rotations: [0.0, -0.1, -0.1, 0.2],
            },
        }
    }
}

impl InitialPoseParams {
    pub fn validate(&self) -> Result<()> {
        if self.hough.rho_resolution <= 0.0 || self.hough.theta_step_deg <= 0.0 {
            return Err(Error::InvalidConfig(
                "initial_pose.hough resolutions must be positive".into(),
            ));
        }
        if self.line_gap <= 0.0 {
            return Err(Error::InvalidConfig(
                "initial_pose.line_gap must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoughParams {
    /// Distance resolution of the accumulator in pixels.
    pub rho_resolution: f64,
    /// Angle resolution of the accumulator in degrees.
    pub theta_step_deg: f64,
    /// Minimum number of foreground pixels on a line.
    pub vote_threshold: u32,
}

impl Default for HoughParams {
    fn default() -> Self {
        Self {
            rho_resolution: 1.0,
            theta_step_deg: 20.0,
            vote_threshold: 30,
        }
    }
}

/// Placement of the four contours of one region relative to its three lines.
///
/// Outer contours sit `outer_offset` beyond the outermost lines at height
/// `outer_y`; inner contours sit midway between neighbouring lines at
/// `inner_y`. Heights are measured from the region's reference row.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionLayout {
    pub outer_offset: f64,
    pub outer_y: f64,
    pub inner_y: f64,
    pub scale: f64,
    /// Rotation bias per contour, left to right.
    pub rotations: [f64; 4],
}

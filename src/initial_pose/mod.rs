//! Heuristic starting poses for the eight contours of a dental radiograph.
//!
//! The estimator does not use the trained models:
//! 1. crop fixed margins from both image sides;
//! 2. find the dark band between the two jaws from the row-sum histogram;
//! 3. cut a fixed-height window above and below the band;
//! 4. filter each window (median, bilateral, edge response) and binarise it;
//! 5. detect straight lines with a Hough transform;
//! 6. keep the three near-vertical lines closest to the window middle;
//! 7. place four contours per window between and beside those lines.
//!
//! Poses are returned upper jaw first, left to right, in the coordinates of
//! the image passed in.

pub mod histogram;
pub mod hough;
pub mod lines;
pub mod params;

pub use histogram::{separation_band, SeparationBand};
pub use hough::{hough_lines, HoughLine};
pub use lines::{select_three_lines, LineFilter};
pub use params::{HoughParams, InitialPoseParams, RegionLayout};

use crate::filter::process_image;
use crate::image::ImageF32;
use crate::shape::Pose;
use log::{debug, warn};

/// Number of poses produced per image.
pub const POSE_COUNT: usize = 8;

#[derive(Clone, Debug)]
pub struct InitialPoses {
    /// Upper contours left to right, then lower contours left to right.
    pub poses: Vec<Pose>,
    pub band: SeparationBand,
    /// Separating line columns in the side-cropped frame.
    pub upper_lines: [f64; 3],
    pub lower_lines: [f64; 3],
}

impl InitialPoses {
    /// `(index, pose)` for every known index, in the given order. Unknown
    /// indices are logged and skipped.
    pub fn select_indexed(&self, indices: &[usize]) -> Vec<(usize, Pose)> {
        indices
            .iter()
            .filter_map(|&i| match self.poses.get(i) {
                Some(&pose) => Some((i, pose)),
                None => {
                    warn!("initial pose index {i} out of range (have {})", self.poses.len());
                    None
                }
            })
            .collect()
    }

    /// Poses at `indices`, in the given order. Unknown indices are skipped.
    pub fn select(&self, indices: &[usize]) -> Vec<Pose> {
        self.select_indexed(indices).into_iter().map(|(_, pose)| pose).collect()
    }
}

pub fn estimate_initial_poses(image: &ImageF32, params: &InitialPoseParams) -> InitialPoses {
    let side = params.side_margin.min(image.w / 2);
    let inner = image.crop(side, 0, image.w - 2 * side, image.h);

    let band = separation_band(&inner.row_sums(), params.histogram_delta, params.expansion_limit)
        .unwrap_or(SeparationBand {
            top: inner.h / 2,
            bottom: inner.h / 2,
            darkest: inner.h / 2,
        });
    debug!(
        "jaw separation band rows {}..={} (darkest {})",
        band.top, band.bottom, band.darkest
    );

    let upper_y0 = band.top.saturating_sub(params.upper_crop_height);
    let upper = inner.crop(0, upper_y0, inner.w, band.top - upper_y0);
    let lower = inner.crop(0, band.bottom, inner.w, params.lower_crop_height);

    let upper_lines = region_lines(&upper, params);
    let lower_lines = region_lines(&lower, params);

    let x_offset = side as f64;
    let upper_base = band.top as f64 - params.upper_crop_height as f64;
    let lower_base = band.bottom as f64;
    let mut poses = Vec::with_capacity(POSE_COUNT);
    poses.extend(layout(upper_lines, &params.upper, x_offset, upper_base));
    poses.extend(layout(lower_lines, &params.lower, x_offset, lower_base));

    InitialPoses {
        poses,
        band,
        upper_lines,
        lower_lines,
    }
}

fn region_lines(region: &ImageF32, params: &InitialPoseParams) -> [f64; 3] {
    let filter = LineFilter {
        vertical_tolerance: params.vertical_tolerance_deg.to_radians(),
        gap: params.line_gap,
        edge_margin: params.edge_margin,
    };
    if region.is_empty() {
        return select_three_lines(&[], region.w, &filter);
    }
    let edges = process_image(region, &params.filter);
    let mask: Vec<bool> = edges
        .data
        .iter()
        .map(|&v| v as f64 > params.binary_threshold)
        .collect();
    let lines = hough_lines(&mask, edges.w, edges.h, &params.hough);
    debug!("hough: {} candidate lines in {}x{} region", lines.len(), edges.w, edges.h);
    select_three_lines(&lines, region.w, &filter)
}

fn layout(lines: [f64; 3], layout: &RegionLayout, x_offset: f64, y_base: f64) -> [Pose; 4] {
    let xs = [
        lines[0] - layout.outer_offset,
        (lines[0] + lines[1]) / 2.0,
        (lines[1] + lines[2]) / 2.0,
        lines[2] + layout.outer_offset,
    ];
    let ys = [layout.outer_y, layout.inner_y, layout.inner_y, layout.outer_y];
    std::array::from_fn(|i| {
        Pose::new(
            [xs[i] + x_offset, ys[i] + y_base],
            layout.scale,
            layout.rotations[i],
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_places_contours_between_lines() {
        let params = InitialPoseParams::default();
        let poses = layout([100.0, 200.0, 300.0], &params.upper, 160.0, 40.0);
        assert_eq!(poses[0].translation, [225.0, 90.0]);
        assert_eq!(poses[1].translation, [310.0, 120.0]);
        assert_eq!(poses[2].translation, [410.0, 120.0]);
        assert_eq!(poses[3].translation, [495.0, 90.0]);
        assert_eq!(poses[3].rotation, 0.2);
        assert!(poses.iter().all(|p| p.scale == 50.0));
    }

    #[test]
    fn select_skips_unknown_indices() {
        let poses = InitialPoses {
            poses: (0..8).map(|i| Pose::new([i as f64, 0.0], 1.0, 0.0)).collect(),
            band: SeparationBand { top: 0, bottom: 0, darkest: 0 },
            upper_lines: [0.0; 3],
            lower_lines: [0.0; 3],
        };
        let picked = poses.select(&[5, 9, 1]);
        assert_eq!(picked.len(), 2);
        assert_eq!(picked[0].translation[0], 5.0);
        assert_eq!(picked[1].translation[0], 1.0);

        let indexed = poses.select_indexed(&[8, 3, 12, 3, 0]);
        let kept: Vec<usize> = indexed.iter().map(|(i, _)| *i).collect();
        assert_eq!(kept, vec![3, 3, 0]);
        for (i, pose) in &indexed {
            assert_eq!(pose.translation[0], *i as f64);
        }
    }
}

//! Closed landmark contours and their similarity geometry.
//!
//! A [`Shape`] is an ordered, fixed-length sequence of 2D landmarks forming a
//! closed polygon. The centroid and per-landmark boundary normals are derived
//! lazily and dropped whenever a transform changes the geometry they depend
//! on. Shapes are plain values: algorithms that need a "before" snapshot clone
//! the shape instead of sharing it.
//!
//! Rotations follow the image-frame convention (y axis pointing down): a
//! positive angle turns the contour counter-clockwise on screen.

mod pose;
mod procrustes;

pub use pose::Pose;

use crate::angle::rotate_image_frame;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const EPS: f64 = 1e-12;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Shape {
    points: Vec<[f64; 2]>,
    #[serde(skip)]
    centroid: OnceLock<[f64; 2]>,
    #[serde(skip)]
    normals: OnceLock<Vec<[f64; 2]>>,
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        self.points == other.points
    }
}

impl Shape {
    pub fn new(points: Vec<[f64; 2]>) -> Self {
        Self {
            points,
            centroid: OnceLock::new(),
            normals: OnceLock::new(),
        }
    }

    /// Build a shape from an interleaved `[x0, y0, x1, y1, ...]` vector.
    pub fn from_vector(v: &DVector<f64>) -> Self {
        assert!(v.len() % 2 == 0, "flattened shape must have even length");
        Self::new(v.as_slice().chunks_exact(2).map(|c| [c[0], c[1]]).collect())
    }

    /// Interleaved `[x0, y0, x1, y1, ...]` representation used by the PCA.
    pub fn to_vector(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.points.len() * 2,
            self.points.iter().flat_map(|p| p.iter().copied()),
        )
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn points(&self) -> &[[f64; 2]] {
        &self.points
    }

    #[inline]
    pub fn point(&self, index: usize) -> [f64; 2] {
        self.points[index]
    }

    pub fn centroid(&self) -> [f64; 2] {
        *self.centroid.get_or_init(|| {
            let n = self.points.len().max(1) as f64;
            let (sx, sy) = self
                .points
                .iter()
                .fold((0.0, 0.0), |(sx, sy), p| (sx + p[0], sy + p[1]));
            [sx / n, sy / n]
        })
    }

    /// Unit boundary normal per landmark: the normalized sum of the unit
    /// normals of the two adjacent edges.
    pub fn normals(&self) -> &[[f64; 2]] {
        self.normals.get_or_init(|| compute_normals(&self.points))
    }

    pub fn translate(&mut self, v: [f64; 2]) {
        for p in &mut self.points {
            p[0] += v[0];
            p[1] += v[1];
        }
        // Normals are translation invariant.
        self.centroid = OnceLock::new();
    }

    pub fn scale(&mut self, factor: f64) {
        for p in &mut self.points {
            p[0] *= factor;
            p[1] *= factor;
        }
        self.invalidate();
    }

    /// Rotate about the origin, see the module docs for the sign convention.
    pub fn rotate(&mut self, angle: f64) {
        for p in &mut self.points {
            *p = rotate_image_frame(*p, angle);
        }
        self.invalidate();
    }

    /// Rotate, scale, then translate by `pose`.
    pub fn transform(&mut self, pose: &Pose) {
        self.rotate(pose.rotation);
        self.scale(pose.scale);
        self.translate(pose.translation);
    }

    /// Owned copy transformed by `pose`.
    pub fn transformed(&self, pose: &Pose) -> Shape {
        let mut out = self.clone();
        out.transform(pose);
        out
    }

    pub fn move_to_origin(&mut self) {
        let c = self.centroid();
        self.translate([-c[0], -c[1]]);
    }

    /// Scale uniformly so the RMS distance of the landmarks from the centroid
    /// is 1. Returns the RMS distance before scaling; a degenerate (collapsed)
    /// shape is left untouched.
    pub fn normalize(&mut self) -> f64 {
        let c = self.centroid();
        let n = self.points.len().max(1) as f64;
        let sum_sq: f64 = self
            .points
            .iter()
            .map(|p| (p[0] - c[0]).powi(2) + (p[1] - c[1]).powi(2))
            .sum();
        let rms = (sum_sq / n).sqrt();
        if rms > EPS {
            self.scale(1.0 / rms);
        }
        rms
    }

    /// Σ‖pᵢ − qᵢ‖² over corresponding landmarks.
    pub fn sum_of_squared_distances(&self, other: &Shape) -> f64 {
        assert_eq!(self.len(), other.len(), "shapes differ in landmark count");
        self.points
            .iter()
            .zip(&other.points)
            .map(|(p, q)| (p[0] - q[0]).powi(2) + (p[1] - q[1]).powi(2))
            .sum()
    }

    /// Geometry change after downsampling the underlying image once.
    pub fn downsample_transform(&mut self) {
        self.scale(0.5);
    }

    /// Geometry change after upsampling the underlying image once.
    pub fn upsample_transform(&mut self) {
        self.scale(2.0);
    }

    /// Relative landmark error of `found` against `self` as reference.
    ///
    /// Both contours are centred on their centroids; each landmark's
    /// displacement is divided by the reference landmark's distance from the
    /// centroid. Returns `(average, maximum)`.
    pub fn measure_error(&self, found: &Shape) -> (f64, f64) {
        assert_eq!(self.len(), found.len(), "shapes differ in landmark count");
        if self.is_empty() {
            return (0.0, 0.0);
        }
        let cr = self.centroid();
        let cf = found.centroid();
        let errors: Vec<f64> = self
            .points
            .iter()
            .zip(&found.points)
            .map(|(r, f)| {
                let rx = r[0] - cr[0];
                let ry = r[1] - cr[1];
                let dx = (f[0] - cf[0]) - rx;
                let dy = (f[1] - cf[1]) - ry;
                dx.hypot(dy) / rx.hypot(ry).max(EPS)
            })
            .collect();
        let avg = errors.iter().sum::<f64>() / errors.len() as f64;
        let max = errors.iter().cloned().fold(0.0, f64::max);
        (avg, max)
    }

    fn invalidate(&mut self) {
        self.centroid = OnceLock::new();
        self.normals = OnceLock::new();
    }
}

fn unit_or_zero(v: [f64; 2]) -> [f64; 2] {
    let n = v[0].hypot(v[1]);
    if n > EPS {
        [v[0] / n, v[1] / n]
    } else {
        [0.0, 0.0]
    }
}

/// Normal of the edge P→Q: `(Qy − Py, −(Qx − Px))`, unit length.
fn edge_normal(p: [f64; 2], q: [f64; 2]) -> [f64; 2] {
    unit_or_zero([q[1] - p[1], -(q[0] - p[0])])
}

fn compute_normals(points: &[[f64; 2]]) -> Vec<[f64; 2]> {
    let n = points.len();
    (0..n)
        .map(|i| {
            let prev = points[(i + n - 1) % n];
            let cur = points[i];
            let next = points[(i + 1) % n];
            let left = edge_normal(prev, cur);
            let right = edge_normal(cur, next);
            let sum = unit_or_zero([left[0] + right[0], left[1] + right[1]]);
            if sum != [0.0, 0.0] {
                return sum;
            }
            // Cusp or repeated landmarks: fall back to the chord normal.
            let chord = edge_normal(prev, next);
            if chord != [0.0, 0.0] {
                chord
            } else {
                [1.0, 0.0]
            }
        })
        .collect()
}

//! Similarity (Procrustes) alignment of one contour onto another.
use super::{Pose, Shape};

impl Shape {
    /// Align `self` onto `target` in place and return the pose that maps the
    /// aligned contour back to where it was.
    ///
    /// The contour is centred on its centroid, scaled to unit RMS radius and
    /// rotated by the angle minimising the summed squared distance to
    /// `target`, which is expected to be centred and normalized already.
    /// Transforming the result by the returned pose reproduces the input.
    pub fn align(&mut self, target: &Shape) -> Pose {
        assert_eq!(self.len(), target.len(), "shapes differ in landmark count");
        let translation = self.centroid();
        self.move_to_origin();
        let scale = self.normalize();

        let (num, den) = self
            .points()
            .iter()
            .zip(target.points())
            .fold((0.0, 0.0), |(num, den), (p, q)| {
                (
                    num + q[0] * p[1] - q[1] * p[0],
                    den + q[0] * p[0] + q[1] * p[1],
                )
            });
        let angle = num.atan2(den);
        self.rotate(angle);

        Pose {
            translation,
            scale: if scale > 0.0 { scale } else { 1.0 },
            rotation: -angle,
        }
    }

    /// Owned copy aligned onto `target`, together with its pose.
    pub fn aligned_to(&self, target: &Shape) -> (Shape, Pose) {
        let mut out = self.clone();
        let pose = out.align(target);
        (out, pose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn unit_square() -> Shape {
        let mut s = Shape::new(vec![[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]]);
        s.normalize();
        s
    }

    #[test]
    fn recovers_similarity_parameters() {
        let target = unit_square();
        // Counter-clockwise rotation in the mathematical sense.
        let (s, c) = 0.3f64.sin_cos();
        let moved = Shape::new(
            target
                .points()
                .iter()
                .map(|p| {
                    [
                        2.0 * (p[0] * c - p[1] * s) + 10.0,
                        2.0 * (p[0] * s + p[1] * c) + 5.0,
                    ]
                })
                .collect(),
        );

        let (aligned, pose) = moved.aligned_to(&target);
        assert_abs_diff_eq!(pose.translation[0], 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pose.translation[1], 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pose.scale, 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pose.rotation, -0.3, epsilon = 1e-9);
        assert!(aligned.sum_of_squared_distances(&target) < 1e-12);
    }

    #[test]
    fn pose_maps_aligned_shape_back() {
        let target = unit_square();
        let original = Shape::new(vec![[3.0, 4.0], [9.0, 5.0], [8.5, 12.0], [2.0, 10.0]]);
        let (aligned, pose) = original.aligned_to(&target);
        let restored = aligned.transformed(&pose);
        for (a, b) in restored.points().iter().zip(original.points()) {
            assert_abs_diff_eq!(a[0], b[0], epsilon = 1e-9);
            assert_abs_diff_eq!(a[1], b[1], epsilon = 1e-9);
        }
    }

    #[test]
    fn aligning_normalized_shape_to_itself_is_identity() {
        let target = unit_square();
        let (aligned, pose) = target.aligned_to(&target);
        assert_abs_diff_eq!(pose.rotation, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pose.scale, 1.0, epsilon = 1e-12);
        assert!(aligned.sum_of_squared_distances(&target) < 1e-20);
    }
}

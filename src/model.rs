//! Statistical shape model: Procrustes mean estimation followed by PCA.
use crate::config::ShapeModelConfig;
use crate::error::{Error, Result};
use crate::pca::Pca;
use crate::shape::Shape;
use log::{debug, info, warn};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShapeModel {
    pub pca: Pca,
    /// Converged Procrustes mean (centred, unit RMS radius).
    pub procrustes_mean: Shape,
    /// Training shapes aligned onto `procrustes_mean`.
    pub aligned: Vec<Shape>,
    pub deviation_multiplier: f64,
}

impl ShapeModel {
    pub fn train(shapes: &[Shape], config: &ShapeModelConfig) -> Result<Self> {
        let first = shapes.first().ok_or_else(|| {
            Error::TrainingDataInsufficient("no training shapes supplied".into())
        })?;
        let landmarks = first.len();
        if landmarks == 0 {
            return Err(Error::TrainingDataInsufficient(
                "training shapes have no landmarks".into(),
            ));
        }
        if let Some(bad) = shapes.iter().find(|s| s.len() != landmarks) {
            return Err(Error::ShapeMismatch {
                expected: landmarks,
                found: bad.len(),
            });
        }

        let procrustes_mean = estimate_mean(shapes, config);
        let aligned: Vec<Shape> = shapes
            .iter()
            .map(|s| s.aligned_to(&procrustes_mean).0)
            .collect();

        let data = DMatrix::from_fn(aligned.len(), landmarks * 2, |r, c| {
            aligned[r].point(c / 2)[c % 2]
        });
        let mut pca = Pca::train(&data, config.components_limit)?;
        if let Some(fraction) = config.variance_threshold {
            pca.threshold(fraction);
        }
        info!(
            "shape model: {} shapes, {} landmarks, {} components",
            shapes.len(),
            landmarks,
            pca.components()
        );

        Ok(Self {
            pca,
            procrustes_mean,
            aligned,
            deviation_multiplier: config.deviation_multiplier,
        })
    }

    #[inline]
    pub fn landmarks(&self) -> usize {
        self.pca.dimension() / 2
    }

    /// Mean shape used by the search: the PCA column mean as a contour.
    pub fn mean_shape(&self) -> Shape {
        Shape::from_vector(&self.pca.mean)
    }

    pub fn project(&self, shape: &Shape) -> DVector<f64> {
        self.pca.project(&shape.to_vector())
    }

    pub fn reconstruct(&self, b: &DVector<f64>) -> Shape {
        Shape::from_vector(&self.pca.reconstruct(b))
    }

    pub fn allowed_deviation(&self) -> DVector<f64> {
        self.pca.allowed_deviation(self.deviation_multiplier)
    }

    /// Clamp `b` to `± allowed_deviation()` componentwise.
    pub fn clamp(&self, b: &mut DVector<f64>) {
        self.pca.clamp_parameters(b, self.deviation_multiplier);
    }
}

fn estimate_mean(shapes: &[Shape], config: &ShapeModelConfig) -> Shape {
    let mut mean = shapes[0].clone();
    mean.move_to_origin();
    mean.normalize();

    for iteration in 0..config.max_mean_iterations {
        let aligned: Vec<Shape> = shapes.iter().map(|s| s.aligned_to(&mean).0).collect();
        let mut next = average(&aligned);
        next.align(&mean);
        let error = next.sum_of_squared_distances(&mean);
        mean = next;
        debug!("mean shape iteration {iteration}: error {error:.6}");
        if error < config.mean_tolerance {
            return mean;
        }
    }
    warn!(
        "mean shape did not settle below {} after {} iterations",
        config.mean_tolerance, config.max_mean_iterations
    );
    mean
}

fn average(shapes: &[Shape]) -> Shape {
    let n = shapes[0].len();
    let mut acc = vec![[0.0f64; 2]; n];
    for s in shapes {
        for (a, p) in acc.iter_mut().zip(s.points()) {
            a[0] += p[0];
            a[1] += p[1];
        }
    }
    let count = shapes.len() as f64;
    for a in &mut acc {
        a[0] /= count;
        a[1] /= count;
    }
    Shape::new(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn ellipse(n: usize, a: f64, b: f64, angle: f64, t: [f64; 2]) -> Shape {
        let (s, c) = angle.sin_cos();
        Shape::new(
            (0..n)
                .map(|i| {
                    let phi = i as f64 * std::f64::consts::TAU / n as f64;
                    let (x, y) = (a * phi.cos(), b * phi.sin());
                    [x * c - y * s + t[0], x * s + y * c + t[1]]
                })
                .collect(),
        )
    }

    #[test]
    fn mean_is_normalized_and_model_explains_aspect_ratio() {
        let shapes: Vec<Shape> = (0..8)
            .map(|i| {
                let stretch = 1.0 + 0.05 * (i as f64 - 3.5);
                ellipse(12, 10.0 * stretch, 10.0, 0.1 * i as f64, [i as f64, 2.0 * i as f64])
            })
            .collect();
        let model = ShapeModel::train(&shapes, &ShapeModelConfig::default()).unwrap();
        let c = model.procrustes_mean.centroid();
        assert_abs_diff_eq!(c[0], 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c[1], 0.0, epsilon = 1e-9);
        assert_eq!(model.landmarks(), 12);
        assert!(model.pca.components() >= 1);
        for a in &model.aligned {
            assert!(a.sum_of_squared_distances(&model.procrustes_mean) < 0.5);
        }
    }

    #[test]
    fn rejects_mismatched_landmark_counts() {
        let shapes = vec![
            ellipse(10, 5.0, 4.0, 0.0, [0.0, 0.0]),
            ellipse(11, 5.0, 4.0, 0.0, [0.0, 0.0]),
        ];
        let err = ShapeModel::train(&shapes, &ShapeModelConfig::default()).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { expected: 10, found: 11 }));
    }

    #[test]
    fn identical_shapes_have_no_variance() {
        let shapes = vec![ellipse(10, 5.0, 4.0, 0.0, [0.0, 0.0]); 4];
        let err = ShapeModel::train(&shapes, &ShapeModelConfig::default()).unwrap_err();
        assert!(matches!(err, Error::TrainingDataInsufficient(_)));
    }
}

use super::ProfileMatcher;
use crate::error::{Error, Result};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Mean profile plus inverse covariance per landmark.
///
/// Profiles are used as sampled (no L1 normalisation): normalised profiles
/// of non-negative intensities always sum to one, which makes their
/// covariance singular.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MahalanobisModel {
    pub half_width: usize,
    pub means: Vec<DVector<f64>>,
    pub inverse_covariances: Vec<DMatrix<f64>>,
}

impl MahalanobisModel {
    /// Train from raw `2k + 1` profiles per landmark.
    ///
    /// Fails with [`Error::IllConditionedCovariance`] when a landmark's
    /// covariance has a zero variance or its normalised determinant
    /// `det(C) / Π Cᵢᵢ` falls below `min_normalized_determinant`.
    pub fn train(
        half_width: usize,
        samples: &[Vec<Vec<f64>>],
        level: usize,
        min_normalized_determinant: f64,
    ) -> Result<Self> {
        let len = 2 * half_width + 1;
        let mut means = Vec::with_capacity(samples.len());
        let mut inverse_covariances = Vec::with_capacity(samples.len());

        for (landmark, profiles) in samples.iter().enumerate() {
            if profiles.len() < 2 {
                return Err(Error::TrainingDataInsufficient(format!(
                    "landmark {landmark} has {} profiles, covariance needs at least 2",
                    profiles.len()
                )));
            }
            let data = DMatrix::from_fn(profiles.len(), len, |r, c| profiles[r][c]);
            let mean = DVector::from_iterator(len, data.column_iter().map(|c| c.mean()));
            let centred = DMatrix::from_fn(profiles.len(), len, |r, c| data[(r, c)] - mean[c]);
            let cov = centred.transpose() * &centred / (profiles.len() - 1) as f64;

            let determinant = normalized_determinant(&cov);
            if determinant < min_normalized_determinant {
                return Err(Error::IllConditionedCovariance {
                    level,
                    landmark,
                    determinant,
                });
            }
            let inverse = cov.try_inverse().ok_or(Error::IllConditionedCovariance {
                level,
                landmark,
                determinant,
            })?;
            means.push(mean);
            inverse_covariances.push(inverse);
        }

        Ok(Self {
            half_width,
            means,
            inverse_covariances,
        })
    }
}

/// `det(C) / Π Cᵢᵢ`, 0 when any variance vanishes. Lies in `[0, 1]` for a
/// covariance matrix and does not depend on the intensity scale.
fn normalized_determinant(cov: &DMatrix<f64>) -> f64 {
    let mut diag_product = 1.0;
    for &v in cov.diagonal().iter() {
        if v <= f64::EPSILON {
            return 0.0;
        }
        diag_product *= v;
    }
    cov.determinant() / diag_product
}

impl ProfileMatcher for MahalanobisModel {
    fn half_width(&self) -> usize {
        self.half_width
    }

    fn landmarks(&self) -> usize {
        self.means.len()
    }

    fn score(&self, window: &[f64], landmark: usize) -> f64 {
        let d = DVector::from_column_slice(window) - &self.means[landmark];
        let q = (d.transpose() * &self.inverse_covariances[landmark] * &d)[(0, 0)];
        q.max(0.0).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn varied_profiles(count: usize, len: usize) -> Vec<Vec<f64>> {
        (0..count)
            .map(|i| {
                (0..len)
                    .map(|j| ((i * 7 + j * 3) % 11) as f64 + 0.1 * ((i * j) % 5) as f64)
                    .collect()
            })
            .collect()
    }

    #[test]
    fn zero_variance_is_ill_conditioned() {
        let samples = vec![vec![vec![0.2, 0.5, 0.3]; 6]];
        let err = MahalanobisModel::train(1, &samples, 2, 1e-12).unwrap_err();
        assert!(matches!(
            err,
            Error::IllConditionedCovariance { level: 2, landmark: 0, .. }
        ));
    }

    #[test]
    fn single_profile_is_insufficient() {
        let samples = vec![vec![vec![0.2, 0.5, 0.3]]];
        let err = MahalanobisModel::train(1, &samples, 0, 1e-12).unwrap_err();
        assert!(matches!(err, Error::TrainingDataInsufficient(_)));
    }

    #[test]
    fn training_mean_scores_zero() {
        let samples = vec![varied_profiles(20, 3)];
        let model = MahalanobisModel::train(1, &samples, 0, 1e-12).unwrap();
        let mean: Vec<f64> = model.means[0].iter().copied().collect();
        assert!(model.score(&mean, 0) < 1e-9);
        let off: Vec<f64> = mean.iter().map(|v| v + 1.0).collect();
        assert!(model.score(&off, 0) > 0.0);
    }
}

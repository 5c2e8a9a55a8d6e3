//! Principal component decomposition of flattened, aligned shapes.
//!
//! Rows of the training matrix are samples (`[x0, y0, x1, y1, ...]`). When
//! there are more samples than dimensions the `d × d` covariance is
//! decomposed directly; otherwise the smaller `n × n` Gram matrix is used and
//! its eigenvectors are mapped back through the centred data. Both branches
//! normalise by `n − 1`, so eigenvalues are sample variances either way.
use crate::error::{Error, Result};
use log::debug;
use nalgebra::{DMatrix, DVector, SymmetricEigen};
use serde::{Deserialize, Serialize};

/// Relative eigenvalue floor below which Gram-branch components are dropped.
const GRAM_RELATIVE_FLOOR: f64 = 1e-9;
const NORM_EPS: f64 = 1e-12;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Pca {
    /// Column mean of the training data (length `d`).
    pub mean: DVector<f64>,
    /// Orthonormal components as columns (`d × K`).
    pub eigenvectors: DMatrix<f64>,
    /// Component variances, descending (length `K`).
    pub eigenvalues: DVector<f64>,
}

impl Pca {
    /// Decompose `data` (`n × d`, one sample per row). `components_limit == 0`
    /// keeps every component.
    pub fn train(data: &DMatrix<f64>, components_limit: usize) -> Result<Self> {
        let (n, d) = data.shape();
        if n < 2 {
            return Err(Error::TrainingDataInsufficient(format!(
                "PCA needs at least 2 samples, got {n}"
            )));
        }
        if d == 0 {
            return Err(Error::TrainingDataInsufficient(
                "PCA samples have zero dimension".into(),
            ));
        }

        let mean = DVector::from_iterator(d, data.column_iter().map(|c| c.mean()));
        let centred = DMatrix::from_fn(n, d, |r, c| data[(r, c)] - mean[c]);
        let denom = (n - 1) as f64;

        let mut pairs: Vec<(f64, DVector<f64>)> = if n > d {
            let cov = centred.transpose() * &centred / denom;
            let eig = SymmetricEigen::new(cov);
            eig.eigenvalues
                .iter()
                .zip(eig.eigenvectors.column_iter())
                .map(|(&l, v)| (l.max(0.0), v.into_owned()))
                .collect()
        } else {
            let gram = &centred * centred.transpose() / denom;
            let eig = SymmetricEigen::new(gram);
            let max = eig.eigenvalues.iter().cloned().fold(0.0, f64::max);
            eig.eigenvalues
                .iter()
                .zip(eig.eigenvectors.column_iter())
                .filter(|(l, _)| **l > GRAM_RELATIVE_FLOOR * max)
                .filter_map(|(&l, u)| {
                    let v = centred.transpose() * u;
                    let norm = v.norm();
                    (norm > NORM_EPS).then(|| (l, v / norm))
                })
                .collect()
        };

        pairs.sort_by(|a, b| b.0.total_cmp(&a.0));
        if components_limit > 0 {
            pairs.truncate(components_limit);
        }
        if pairs.is_empty() || pairs.iter().all(|(l, _)| *l <= NORM_EPS) {
            return Err(Error::TrainingDataInsufficient(
                "training shapes have zero variance".into(),
            ));
        }

        let k = pairs.len();
        let eigenvalues = DVector::from_iterator(k, pairs.iter().map(|(l, _)| *l));
        let columns: Vec<DVector<f64>> = pairs.into_iter().map(|(_, v)| v).collect();
        let eigenvectors = DMatrix::from_columns(&columns);
        debug!(
            "pca: n={n} d={d} branch={} components={k}",
            if n > d { "covariance" } else { "gram" }
        );
        Ok(Self {
            mean,
            eigenvectors,
            eigenvalues,
        })
    }

    #[inline]
    pub fn components(&self) -> usize {
        self.eigenvalues.len()
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.mean.len()
    }

    /// Keep the smallest prefix of components explaining at least `fraction`
    /// of the total variance. `fraction` is clamped to `[0, 1]`. Returns the
    /// number of components kept.
    pub fn threshold(&mut self, fraction: f64) -> usize {
        let fraction = fraction.clamp(0.0, 1.0);
        let total: f64 = self.eigenvalues.sum();
        if total <= 0.0 {
            return self.components();
        }
        let mut cumulative = 0.0;
        let mut keep = self.components();
        for (i, l) in self.eigenvalues.iter().enumerate() {
            cumulative += l / total;
            if cumulative >= fraction - 1e-12 {
                keep = i + 1;
                break;
            }
        }
        if keep < self.components() {
            self.eigenvalues = self.eigenvalues.rows(0, keep).into_owned();
            self.eigenvectors = self.eigenvectors.columns(0, keep).into_owned();
        }
        debug!("pca threshold {fraction:.3}: keeping {keep} components");
        keep
    }

    /// Parameter vector `b = Wᵀ (x − mean)`.
    pub fn project(&self, x: &DVector<f64>) -> DVector<f64> {
        self.eigenvectors.tr_mul(&(x - &self.mean))
    }

    /// Flattened shape `W b + mean`.
    pub fn reconstruct(&self, b: &DVector<f64>) -> DVector<f64> {
        &self.eigenvectors * b + &self.mean
    }

    /// Per-component clamp bound `multiplier · √λ`.
    pub fn allowed_deviation(&self, multiplier: f64) -> DVector<f64> {
        self.eigenvalues.map(|l| multiplier * l.max(0.0).sqrt())
    }

    /// Clamp each component of `b` to `± allowed_deviation(multiplier)`.
    pub fn clamp_parameters(&self, b: &mut DVector<f64>, multiplier: f64) {
        let bounds = self.allowed_deviation(multiplier);
        for (v, bound) in b.iter_mut().zip(bounds.iter()) {
            *v = v.clamp(-bound, *bound);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn line_data(n: usize) -> DMatrix<f64> {
        // Samples spread along (1, 2, 0) with a tiny second direction.
        DMatrix::from_fn(n, 3, |r, c| {
            let t = r as f64 - (n as f64 - 1.0) / 2.0;
            let wobble = if r % 2 == 0 { 0.01 } else { -0.01 };
            match c {
                0 => t,
                1 => 2.0 * t,
                _ => wobble,
            }
        })
    }

    #[test]
    fn covariance_branch_finds_dominant_direction() {
        let pca = Pca::train(&line_data(10), 0).unwrap();
        assert!(pca.components() <= 3);
        let v = pca.eigenvectors.column(0);
        let expected = DVector::from_vec(vec![1.0, 2.0, 0.0]).normalize();
        assert_abs_diff_eq!(v.dot(&expected).abs(), 1.0, epsilon = 1e-6);
        for w in pca.eigenvalues.as_slice().windows(2) {
            assert!(w[0] >= w[1]);
        }
    }

    #[test]
    fn gram_branch_matches_covariance_branch_variance() {
        // Two samples in three dimensions forces the Gram path.
        let data = DMatrix::from_row_slice(2, 3, &[1.0, 0.0, 0.0, -1.0, 0.0, 0.0]);
        let pca = Pca::train(&data, 0).unwrap();
        assert_eq!(pca.components(), 1);
        // Sample variance of {1, -1} with n - 1 normalisation.
        assert_abs_diff_eq!(pca.eigenvalues[0], 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pca.eigenvectors.column(0).norm(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn project_reconstruct_round_trip() {
        let pca = Pca::train(&line_data(6), 0).unwrap();
        let b = DVector::from_iterator(pca.components(), (0..pca.components()).map(|i| 0.3 - i as f64 * 0.1));
        let back = pca.project(&pca.reconstruct(&b));
        for (x, y) in back.iter().zip(b.iter()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-9);
        }
    }

    #[test]
    fn threshold_keeps_prefix() {
        let mut pca = Pca::train(&line_data(10), 0).unwrap();
        let kept = pca.threshold(0.9);
        assert_eq!(kept, 1);
        assert_eq!(pca.eigenvectors.ncols(), 1);
        let mut full = Pca::train(&line_data(10), 0).unwrap();
        let kept = full.threshold(2.0);
        assert!(kept >= 2);
        assert_eq!(full.eigenvectors.ncols(), kept);
    }

    #[test]
    fn rejects_degenerate_inputs() {
        let one = DMatrix::from_row_slice(1, 2, &[1.0, 2.0]);
        assert!(matches!(Pca::train(&one, 0), Err(Error::TrainingDataInsufficient(_))));
        let same = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 1.0, 2.0, 1.0, 2.0]);
        assert!(matches!(Pca::train(&same, 0), Err(Error::TrainingDataInsufficient(_))));
    }

    #[test]
    fn clamping_respects_allowed_deviation() {
        let pca = Pca::train(&line_data(10), 0).unwrap();
        let bounds = pca.allowed_deviation(2.0);
        let mut b = DVector::from_element(pca.components(), 1e6);
        pca.clamp_parameters(&mut b, 2.0);
        for (v, bound) in b.iter().zip(bounds.iter()) {
            assert!(v.abs() <= *bound + 1e-12);
        }
    }
}

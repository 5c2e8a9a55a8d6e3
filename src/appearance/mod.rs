//! Per-landmark appearance models scoring candidate profile windows.
//!
//! A model stores one descriptor per landmark, `2k + 1` samples long. During
//! search a longer profile (`2m + 1`, `m > k`) is sampled and every window of
//! model length is scored; the centre of the best window becomes the
//! landmark's new position.
//!
//! Two scorers are provided:
//! - [`IntensityModel`]: mean L1-normalised profile, sum of squared differences.
//! - [`MahalanobisModel`]: mean raw profile with inverse covariance.
//!
//! [`AppearanceModel`] is the serialisable tagged union used by the pyramid.

pub mod intensity;
pub mod mahalanobis;
pub mod trainer;

pub use intensity::IntensityModel;
pub use mahalanobis::MahalanobisModel;
pub use trainer::AppearanceTrainer;

use serde::{Deserialize, Serialize};

/// Scoring capability shared by every appearance model.
pub trait ProfileMatcher {
    /// Half-width `k` of the stored descriptors.
    fn half_width(&self) -> usize;

    fn landmarks(&self) -> usize;

    /// Dissimilarity of a `2k + 1` window to the descriptor of `landmark`.
    /// Lower is better.
    fn score(&self, window: &[f64], landmark: usize) -> f64;

    /// Index into `profile` of the centre of the best scoring window.
    ///
    /// Profiles shorter than the descriptor leave the landmark where it is
    /// (the profile centre).
    fn find_best_position(&self, profile: &[f64], landmark: usize) -> usize {
        let len = 2 * self.half_width() + 1;
        if profile.len() < len {
            return profile.len() / 2;
        }
        let mut best = (f64::INFINITY, 0usize);
        for (i, window) in profile.windows(len).enumerate() {
            let s = self.score(window, landmark);
            if s < best.0 {
                best = (s, i);
            }
        }
        best.1 + self.half_width()
    }
}

/// Which scorer a pyramid level trains.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppearanceKind {
    #[default]
    Intensity,
    Mahalanobis,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AppearanceModel {
    Intensity(IntensityModel),
    Mahalanobis(MahalanobisModel),
}

impl AppearanceModel {
    pub fn kind(&self) -> AppearanceKind {
        match self {
            AppearanceModel::Intensity(_) => AppearanceKind::Intensity,
            AppearanceModel::Mahalanobis(_) => AppearanceKind::Mahalanobis,
        }
    }

    fn matcher(&self) -> &dyn ProfileMatcher {
        match self {
            AppearanceModel::Intensity(m) => m,
            AppearanceModel::Mahalanobis(m) => m,
        }
    }
}

impl ProfileMatcher for AppearanceModel {
    fn half_width(&self) -> usize {
        self.matcher().half_width()
    }

    fn landmarks(&self) -> usize {
        self.matcher().landmarks()
    }

    fn score(&self, window: &[f64], landmark: usize) -> f64 {
        self.matcher().score(window, landmark)
    }

    fn find_best_position(&self, profile: &[f64], landmark: usize) -> usize {
        self.matcher().find_best_position(profile, landmark)
    }
}

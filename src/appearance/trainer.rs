use super::{AppearanceKind, AppearanceModel, IntensityModel, MahalanobisModel};
use crate::error::{Error, Result};
use crate::image::ImageF32;
use crate::profile::ProfileSampler;
use crate::shape::Shape;
use log::debug;

/// Accumulates raw training profiles per landmark for one pyramid level.
#[derive(Clone, Debug)]
pub struct AppearanceTrainer {
    half_width: usize,
    samples: Vec<Vec<Vec<f64>>>,
}

impl AppearanceTrainer {
    pub fn new(half_width: usize) -> Self {
        Self {
            half_width,
            samples: Vec::new(),
        }
    }

    #[inline]
    pub fn half_width(&self) -> usize {
        self.half_width
    }

    /// Number of training contours added so far.
    pub fn contours(&self) -> usize {
        self.samples.first().map_or(0, Vec::len)
    }

    /// Sample `2k + 1` raw profiles at every landmark of `shape`.
    pub fn sample(&self, image: &ImageF32, shape: &Shape) -> Vec<Vec<f64>> {
        ProfileSampler::new(self.half_width)
            .with_normalize(false)
            .sample_shape(image, shape)
            .into_iter()
            .map(|p| p.values)
            .collect()
    }

    /// Add the profiles of one contour, one entry per landmark.
    pub fn add_profiles(&mut self, profiles: Vec<Vec<f64>>) -> Result<()> {
        if self.samples.is_empty() {
            self.samples = vec![Vec::new(); profiles.len()];
        }
        if profiles.len() != self.samples.len() {
            return Err(Error::ShapeMismatch {
                expected: self.samples.len(),
                found: profiles.len(),
            });
        }
        for (acc, p) in self.samples.iter_mut().zip(profiles) {
            acc.push(p);
        }
        Ok(())
    }

    pub fn add_shape(&mut self, image: &ImageF32, shape: &Shape) -> Result<()> {
        let profiles = self.sample(image, shape);
        self.add_profiles(profiles)
    }

    /// Build the final model for `level`.
    pub fn finish(
        &self,
        kind: AppearanceKind,
        level: usize,
        min_normalized_determinant: f64,
    ) -> Result<AppearanceModel> {
        if self.samples.is_empty() || self.contours() == 0 {
            return Err(Error::TrainingDataInsufficient(format!(
                "no training profiles collected for level {level}"
            )));
        }
        debug!(
            "level {level}: training {kind:?} appearance from {} contours",
            self.contours()
        );
        Ok(match kind {
            AppearanceKind::Intensity => {
                AppearanceModel::Intensity(IntensityModel::train(self.half_width, &self.samples)?)
            }
            AppearanceKind::Mahalanobis => AppearanceModel::Mahalanobis(MahalanobisModel::train(
                self.half_width,
                &self.samples,
                level,
                min_normalized_determinant,
            )?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appearance::ProfileMatcher;

    fn square() -> Shape {
        Shape::new(vec![[4.0, 4.0], [12.0, 4.0], [12.0, 12.0], [4.0, 12.0]])
    }

    #[test]
    fn identical_profiles_fail_only_for_mahalanobis() {
        let mut image = ImageF32::new(16, 16);
        image.data.fill(0.5);
        let mut trainer = AppearanceTrainer::new(2);
        for _ in 0..5 {
            trainer.add_shape(&image, &square()).unwrap();
        }
        assert_eq!(trainer.contours(), 5);

        let ssd = trainer.finish(AppearanceKind::Intensity, 0, 1e-12).unwrap();
        assert_eq!(ssd.landmarks(), 4);
        assert_eq!(ssd.half_width(), 2);

        let err = trainer
            .finish(AppearanceKind::Mahalanobis, 1, 1e-12)
            .unwrap_err();
        assert!(matches!(err, Error::IllConditionedCovariance { level: 1, .. }));
    }

    #[test]
    fn landmark_count_must_match() {
        let mut trainer = AppearanceTrainer::new(1);
        trainer.add_profiles(vec![vec![0.0; 3]; 4]).unwrap();
        let err = trainer.add_profiles(vec![vec![0.0; 3]; 5]).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { expected: 4, found: 5 }));
    }

    #[test]
    fn empty_trainer_is_insufficient() {
        let trainer = AppearanceTrainer::new(1);
        assert!(matches!(
            trainer.finish(AppearanceKind::Intensity, 0, 1e-12),
            Err(Error::TrainingDataInsufficient(_))
        ));
    }
}

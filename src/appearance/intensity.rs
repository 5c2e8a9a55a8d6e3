use super::ProfileMatcher;
use crate::error::{Error, Result};
use crate::profile::normalize_l1;
use serde::{Deserialize, Serialize};

/// Mean L1-normalised profile per landmark, matched by SSD.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IntensityModel {
    pub half_width: usize,
    pub means: Vec<Vec<f64>>,
}

impl IntensityModel {
    /// `samples[landmark]` holds raw `2k + 1` profiles from every training
    /// contour.
    pub fn train(half_width: usize, samples: &[Vec<Vec<f64>>]) -> Result<Self> {
        let len = 2 * half_width + 1;
        let means = samples
            .iter()
            .enumerate()
            .map(|(landmark, profiles)| {
                if profiles.is_empty() {
                    return Err(Error::TrainingDataInsufficient(format!(
                        "no profiles for landmark {landmark}"
                    )));
                }
                let mut mean = vec![0.0; len];
                for p in profiles {
                    let mut p = p.clone();
                    normalize_l1(&mut p);
                    for (m, v) in mean.iter_mut().zip(&p) {
                        *m += v;
                    }
                }
                let n = profiles.len() as f64;
                mean.iter_mut().for_each(|m| *m /= n);
                Ok(mean)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { half_width, means })
    }
}

impl ProfileMatcher for IntensityModel {
    fn half_width(&self) -> usize {
        self.half_width
    }

    fn landmarks(&self) -> usize {
        self.means.len()
    }

    fn score(&self, window: &[f64], landmark: usize) -> f64 {
        let mut w = window.to_vec();
        normalize_l1(&mut w);
        w.iter()
            .zip(&self.means[landmark])
            .map(|(a, b)| (a - b) * (a - b))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_is_average_of_normalised_profiles() {
        let samples = vec![vec![vec![1.0, 1.0, 2.0], vec![2.0, 2.0, 4.0]]];
        let model = IntensityModel::train(1, &samples).unwrap();
        assert_eq!(model.means[0], vec![0.25, 0.25, 0.5]);
    }

    #[test]
    fn matching_is_scale_invariant() {
        let model = IntensityModel {
            half_width: 1,
            means: vec![vec![0.0, 1.0, 0.0]],
        };
        let profile = [0.0, 0.0, 0.0, 0.0, 7.0, 0.0, 0.0];
        assert_eq!(model.find_best_position(&profile, 0), 4);
    }

    #[test]
    fn identical_profiles_train_fine() {
        let samples = vec![vec![vec![0.5; 5]; 4]];
        assert!(IntensityModel::train(2, &samples).is_ok());
    }
}

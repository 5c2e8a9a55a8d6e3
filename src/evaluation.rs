//! Leave-one-out evaluation.
//!
//! One annotated image is held out, the locator is trained on the others and
//! the held-out contours are fitted and compared against their annotation.
use crate::config::AsmConfig;
use crate::error::{Error, Result};
use crate::locator::ContourLocator;
use crate::multires::TrainingSample;
use crate::search::CancellationToken;
use crate::shape::{Pose, Shape};
use log::info;
use serde::Serialize;

/// Fit error of one held-out contour, relative to its centroid distance.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContourError {
    pub index: usize,
    pub average: f64,
    pub maximum: f64,
    #[serde(skip)]
    pub found: Shape,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveOneOutReport {
    pub left_out: usize,
    pub contours: Vec<ContourError>,
}

impl LeaveOneOutReport {
    pub fn mean_average_error(&self) -> f64 {
        if self.contours.is_empty() {
            return 0.0;
        }
        self.contours.iter().map(|c| c.average).sum::<f64>() / self.contours.len() as f64
    }
}

/// Hold out `samples[left_out]`, train on the rest and fit its contours.
///
/// Contour `i` starts from `poses[i]` when poses are given, otherwise from the
/// `i`-th heuristic initial pose. Poses are in the cropped level-0 frame.
pub fn leave_one_out(
    samples: &[TrainingSample],
    left_out: usize,
    config: &AsmConfig,
    poses: Option<&[Pose]>,
    cancel: &CancellationToken,
) -> Result<LeaveOneOutReport> {
    let held = samples.get(left_out).ok_or_else(|| {
        Error::InvalidConfig(format!(
            "left-out index {left_out} outside {} samples",
            samples.len()
        ))
    })?;
    let training: Vec<TrainingSample> = samples
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != left_out)
        .map(|(_, s)| s.clone())
        .collect();

    let mut locator = ContourLocator::train(&training, config)?;
    locator.set_image(&held.image);
    let starts: Vec<Pose> = match poses {
        Some(p) => p.to_vec(),
        None => locator.initial_poses()?.poses,
    };

    let mut contours = Vec::with_capacity(held.shapes.len());
    for (index, (reference, pose)) in held.shapes.iter().zip(starts).enumerate() {
        let outcome = locator.fit(pose, cancel)?;
        let (average, maximum) = reference.measure_error(&outcome.shape);
        info!("left out {left_out}, contour {index}: avg {average:.4}, max {maximum:.4}");
        contours.push(ContourError {
            index,
            average,
            maximum,
            found: outcome.shape,
        });
    }
    Ok(LeaveOneOutReport { left_out, contours })
}

use serde::{Deserialize, Serialize};

/// Similarity transform placing a normalized shape into image coordinates.
///
/// Applied to a shape as rotate → scale → translate (see [`Shape::transform`]).
///
/// [`Shape::transform`]: super::Shape::transform
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub translation: [f64; 2],
    pub scale: f64,
    /// Rotation in radians, image-frame convention of [`Shape::rotate`](super::Shape::rotate).
    pub rotation: f64,
}

impl Pose {
    pub fn new(translation: [f64; 2], scale: f64, rotation: f64) -> Self {
        Self {
            translation,
            scale,
            rotation,
        }
    }

    pub fn identity() -> Self {
        Self::new([0.0, 0.0], 1.0, 0.0)
    }

    /// The same pose expressed `count` pyramid levels coarser.
    pub fn downsampled(&self, count: u32) -> Self {
        let f = 0.5f64.powi(count as i32);
        Self {
            translation: [self.translation[0] * f, self.translation[1] * f],
            scale: self.scale * f,
            rotation: self.rotation,
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

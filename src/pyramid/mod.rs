//! Grayscale image pyramid with 5-tap Gaussian reduction and 2× decimation.
//!
//! Level 0 is the input (usually already cropped to the region of interest,
//! see [`roi`]); every further level blurs the previous one with the
//! separable kernel `[1, 4, 6, 4, 1] / 16` and keeps every second sample,
//! giving `ceil(w / 2) × ceil(h / 2)` pixels. Border samples clamp to the
//! image extents.

pub mod reduce;
pub mod roi;

pub use reduce::{pyr_down, GAUSSIAN_5TAP};
pub use roi::{Roi, RoiSpec};

use crate::image::ImageF32;

#[derive(Clone, Debug, Default)]
pub struct Pyramid {
    pub levels: Vec<ImageF32>,
}

impl Pyramid {
    /// Build `levels` levels (at least one) starting from `image`.
    pub fn build(image: ImageF32, levels: usize) -> Self {
        let levels_count = levels.max(1);
        let mut levels = Vec::with_capacity(levels_count);
        levels.push(image);
        while levels.len() < levels_count {
            let next = match levels.last() {
                Some(prev) => pyr_down(prev),
                None => break,
            };
            levels.push(next);
        }
        Self { levels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_sizes_round_up() {
        let pyr = Pyramid::build(ImageF32::new(9, 6), 3);
        let sizes: Vec<(usize, usize)> = pyr.levels.iter().map(|l| (l.w, l.h)).collect();
        assert_eq!(sizes, vec![(9, 6), (5, 3), (3, 2)]);
    }

    #[test]
    fn zero_levels_still_keep_base() {
        let pyr = Pyramid::build(ImageF32::new(4, 4), 0);
        assert_eq!(pyr.levels.len(), 1);
    }
}

//! Intensity profiles sampled along landmark normals.
//!
//! For a half-width `c` the sampler walks outward from the landmark's pixel
//! in steps of half a pixel along the unit normal, rounding each step to the
//! nearest pixel and skipping repeats, until `c` distinct pixels are found on
//! each side. The profile is `negative side (far → near) + centre + positive
//! side (near → far)`, always `2c + 1` values long. Reads outside the image
//! yield 0.
use crate::image::ImageF32;
use crate::shape::Shape;

const STEP: f64 = 0.5;
const L1_EPS: f64 = 1e-12;

/// One sampled profile and, optionally, the pixel each value came from.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampledProfile {
    pub values: Vec<f64>,
    pub positions: Option<Vec<[i64; 2]>>,
}

impl SampledProfile {
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Index of the landmark's own pixel.
    #[inline]
    pub fn center(&self) -> usize {
        self.values.len() / 2
    }
}

/// Sampling options: half-width, L1 normalisation, position recording.
#[derive(Clone, Copy, Debug)]
pub struct ProfileSampler {
    pub half_width: usize,
    pub normalize: bool,
    pub record_positions: bool,
}

impl ProfileSampler {
    pub fn new(half_width: usize) -> Self {
        Self {
            half_width,
            normalize: true,
            record_positions: false,
        }
    }

    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn with_positions(mut self, record: bool) -> Self {
        self.record_positions = record;
        self
    }

    /// Sample one profile through `point` along `normal`.
    pub fn sample(&self, image: &ImageF32, point: [f64; 2], normal: [f64; 2]) -> SampledProfile {
        let center = [point[0].round() as i64, point[1].round() as i64];
        let positive = walk(center, normal, 1.0, self.half_width);
        let negative = walk(center, normal, -1.0, self.half_width);

        let pixels: Vec<[i64; 2]> = negative
            .into_iter()
            .rev()
            .chain(std::iter::once(center))
            .chain(positive)
            .collect();
        let mut values: Vec<f64> = pixels
            .iter()
            .map(|p| image.get_or_zero(p[0], p[1]) as f64)
            .collect();
        if self.normalize {
            normalize_l1(&mut values);
        }
        SampledProfile {
            values,
            positions: self.record_positions.then_some(pixels),
        }
    }

    /// Sample a profile at every landmark of `shape`, in landmark order.
    pub fn sample_shape(&self, image: &ImageF32, shape: &Shape) -> Vec<SampledProfile> {
        shape
            .points()
            .iter()
            .zip(shape.normals())
            .map(|(p, n)| self.sample(image, *p, *n))
            .collect()
    }
}

/// Divide by the sum of absolute values; left untouched when that sum is ~0.
pub fn normalize_l1(values: &mut [f64]) {
    let sum: f64 = values.iter().map(|v| v.abs()).sum();
    if sum > L1_EPS {
        for v in values.iter_mut() {
            *v /= sum;
        }
    }
}

/// Distinct pixels on one side of `center`, nearest first.
fn walk(center: [i64; 2], normal: [f64; 2], sign: f64, count: usize) -> Vec<[i64; 2]> {
    let mut out: Vec<[i64; 2]> = Vec::with_capacity(count);
    let max_steps = 8 * (count + 1);
    let origin = [center[0] as f64, center[1] as f64];
    let mut steps = 0;
    while out.len() < count && steps < max_steps {
        steps += 1;
        let t = sign * STEP * steps as f64;
        let p = [
            (origin[0] + t * normal[0]).round() as i64,
            (origin[1] + t * normal[1]).round() as i64,
        ];
        if p != center && out.last() != Some(&p) {
            out.push(p);
        }
    }
    // A degenerate normal never leaves the centre pixel; pad so the profile
    // keeps its length.
    let fill = out.last().copied().unwrap_or(center);
    out.resize(count, fill);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(w: usize, h: usize) -> ImageF32 {
        let mut img = ImageF32::new(w, h);
        for y in 0..h {
            for x in 0..w {
                img.set(x, y, x as f32);
            }
        }
        img
    }

    #[test]
    fn horizontal_profile_reads_consecutive_pixels() {
        let img = ramp(20, 5);
        let prof = ProfileSampler::new(3)
            .with_normalize(false)
            .with_positions(true)
            .sample(&img, [10.2, 2.0], [1.0, 0.0]);
        assert_eq!(prof.values, vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0]);
        assert_eq!(prof.center(), 3);
        assert_eq!(prof.positions.as_ref().unwrap()[3], [10, 2]);
    }

    #[test]
    fn diagonal_profile_has_distinct_positions() {
        let img = ramp(40, 40);
        let n = 0.5f64.sqrt();
        let prof = ProfileSampler::new(5)
            .with_positions(true)
            .sample(&img, [20.0, 20.0], [n, n]);
        let pos = prof.positions.unwrap();
        assert_eq!(pos.len(), 11);
        for w in pos.windows(2) {
            assert_ne!(w[0], w[1]);
        }
    }

    #[test]
    fn out_of_bounds_reads_are_zero() {
        let mut img = ImageF32::new(4, 4);
        img.data.fill(1.0);
        let prof = ProfileSampler::new(3)
            .with_normalize(false)
            .sample(&img, [0.0, 1.0], [1.0, 0.0]);
        assert_eq!(prof.values, vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn l1_normalisation_skips_zero_profiles() {
        let img = ImageF32::new(8, 8);
        let prof = ProfileSampler::new(2).sample(&img, [4.0, 4.0], [0.0, 1.0]);
        assert_eq!(prof.values, vec![0.0; 5]);

        let mut v = vec![1.0, -1.0, 2.0];
        normalize_l1(&mut v);
        assert_eq!(v, vec![0.25, -0.25, 0.5]);
    }

    #[test]
    fn zero_normal_still_produces_full_length() {
        let img = ramp(10, 10);
        let prof = ProfileSampler::new(4).sample(&img, [5.0, 5.0], [0.0, 0.0]);
        assert_eq!(prof.len(), 9);
    }
}

//! Owned single-channel f32 image in row-major layout (stride == width).
//!
//! All per-level processing (filtering, gradients, profile sampling) runs on
//! this type. Intensities converted from 8-bit input live in `[0, 1]`.
use super::traits::{ImageView, ImageViewMut};
use super::u8::ImageU8;

#[derive(Clone, Debug, Default)]
pub struct ImageF32 {
    /// Image width in pixels
    pub w: usize,
    /// Image height in pixels
    pub h: usize,
    /// Number of f32 elements between consecutive rows (equals `w`)
    pub stride: usize,
    /// Backing storage in row-major order
    pub data: Vec<f32>,
}

impl ImageF32 {
    /// Construct a zero-initialized buffer of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            stride: w,
            data: vec![0.0; w * h],
        }
    }

    /// Wrap an existing row-major buffer. `data.len()` must equal `w * h`.
    pub fn from_vec(w: usize, h: usize, data: Vec<f32>) -> Self {
        assert_eq!(data.len(), w * h, "buffer size does not match dimensions");
        Self {
            w,
            h,
            stride: w,
            data,
        }
    }

    /// Convert an 8-bit view into `[0, 1]` floats.
    pub fn from_u8(gray: &ImageU8<'_>) -> Self {
        let mut out = ImageF32::new(gray.w, gray.h);
        for y in 0..gray.h {
            let src = gray.row(y);
            let dst = out.row_mut(y);
            for (d, &s) in dst.iter_mut().zip(src) {
                *d = s as f32 / 255.0;
            }
        }
        out
    }

    #[inline]
    /// Convert (x, y) to a linear index into `data`.
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.stride + x
    }

    #[inline]
    /// Get the pixel value at (x, y).
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.idx(x, y)]
    }

    #[inline]
    /// Set the pixel value at (x, y).
    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    /// Pixel read with signed coordinates; anything outside the image is 0.
    #[inline]
    pub fn get_or_zero(&self, x: i64, y: i64) -> f32 {
        if x < 0 || y < 0 || x as usize >= self.w || y as usize >= self.h {
            return 0.0;
        }
        self.get(x as usize, y as usize)
    }

    /// Copy out the window `[x0, x0 + w) × [y0, y0 + h)`, clipped to the image.
    pub fn crop(&self, x0: usize, y0: usize, w: usize, h: usize) -> ImageF32 {
        let x0 = x0.min(self.w);
        let y0 = y0.min(self.h);
        let w = w.min(self.w - x0);
        let h = h.min(self.h - y0);
        let mut out = ImageF32::new(w, h);
        for y in 0..h {
            let src = &self.row(y0 + y)[x0..x0 + w];
            out.row_mut(y).copy_from_slice(src);
        }
        out
    }

    /// Sum of every row, top to bottom.
    pub fn row_sums(&self) -> Vec<f64> {
        (0..self.h)
            .map(|y| self.row(y).iter().map(|&v| v as f64).sum())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
}

impl ImageView for ImageF32 {
    type Pixel = f32;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn stride(&self) -> usize {
        self.stride
    }
    #[inline]
    fn row(&self, y: usize) -> &[f32] {
        let start = y * self.stride;
        &self.data[start..start + self.w]
    }
}

impl ImageViewMut for ImageF32 {
    #[inline]
    fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let start = y * self.stride;
        let end = start + self.w;
        &mut self.data[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_clips_to_bounds() {
        let mut img = ImageF32::new(4, 3);
        img.set(3, 2, 1.0);
        let c = img.crop(2, 1, 10, 10);
        assert_eq!((c.w, c.h), (2, 2));
        assert_eq!(c.get(1, 1), 1.0);
    }

    #[test]
    fn out_of_bounds_reads_are_zero() {
        let mut img = ImageF32::new(2, 2);
        img.data.fill(0.5);
        assert_eq!(img.get_or_zero(-1, 0), 0.0);
        assert_eq!(img.get_or_zero(0, 2), 0.0);
        assert_eq!(img.get_or_zero(1, 1), 0.5);
    }
}

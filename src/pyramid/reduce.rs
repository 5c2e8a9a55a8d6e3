use crate::image::{ImageF32, ImageView, ImageViewMut};

/// Normalised 5-tap Gaussian filter `[1, 4, 6, 4, 1] / 16`.
pub const GAUSSIAN_5TAP: [f32; 5] = [0.0625, 0.25, 0.375, 0.25, 0.0625];

/// Blur with [`GAUSSIAN_5TAP`] and keep every second row and column.
pub fn pyr_down(src: &ImageF32) -> ImageF32 {
    let mut dst = ImageF32::new(src.w.div_ceil(2), src.h.div_ceil(2));
    if src.w == 0 || src.h == 0 {
        return dst;
    }
    let taps = &GAUSSIAN_5TAP;
    let radius = taps.len() / 2;
    let cache_width = dst.w;
    let mut horiz_cache = vec![0.0f32; cache_width * taps.len()];
    let mut cached_rows = vec![-1isize; taps.len()];

    for y in 0..dst.h {
        let center_sy = (y * 2) as isize;
        for ky in 0..taps.len() {
            let offset = ky as isize - radius as isize;
            let sy = clamp_index(center_sy + offset, src.h) as isize;
            if cached_rows[ky] != sy {
                let cache_row = &mut horiz_cache[ky * cache_width..(ky + 1) * cache_width];
                filter_row_downsample(src.row(sy as usize), cache_row, taps, radius);
                cached_rows[ky] = sy;
            }
        }
        let dst_row = dst.row_mut(y);
        for (x, px) in dst_row.iter_mut().enumerate() {
            *px = taps
                .iter()
                .enumerate()
                .map(|(ky, tap)| tap * horiz_cache[ky * cache_width + x])
                .sum();
        }
    }
    dst
}

fn filter_row_downsample(row: &[f32], out: &mut [f32], taps: &[f32], radius: usize) {
    let mut sx = 0isize;
    for dst_px in out {
        let mut acc = 0.0f32;
        for (k, &tap) in taps.iter().enumerate() {
            let offset = k as isize - radius as isize;
            acc += tap * row[clamp_index(sx + offset, row.len())];
        }
        *dst_px = acc;
        sx += 2;
    }
}

fn clamp_index(idx: isize, upper: usize) -> usize {
    idx.clamp(0, upper as isize - 1) as usize
}

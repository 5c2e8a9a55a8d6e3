use crate::image::{ImageF32, ImageView, ImageViewMut};

/// Square median filter with replicated borders.
///
/// Even kernel sizes are rounded up to the next odd size; `k <= 1` returns a
/// copy of the input.
pub fn median_blur(image: &ImageF32, kernel: usize) -> ImageF32 {
    if kernel <= 1 || image.is_empty() {
        return image.clone();
    }
    let radius = (kernel | 1) / 2;
    let (w, h) = (image.w, image.h);
    let mut out = ImageF32::new(w, h);
    let mut window = Vec::with_capacity((2 * radius + 1) * (2 * radius + 1));

    for y in 0..h {
        // Replicated border: out-of-range rows map to the nearest edge row.
        let rows: Vec<&[f32]> = (0..=2 * radius)
            .map(|dy| image.row((y + dy).saturating_sub(radius).min(h - 1)))
            .collect();
        let dst = out.row_mut(y);
        for (x, px) in dst.iter_mut().enumerate() {
            window.clear();
            for row in &rows {
                for dx in 0..=2 * radius {
                    let sx = (x + dx).saturating_sub(radius).min(w - 1);
                    window.push(row[sx]);
                }
            }
            let mid = window.len() / 2;
            let (_, m, _) = window.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
            *px = *m;
        }
    }
    out
}

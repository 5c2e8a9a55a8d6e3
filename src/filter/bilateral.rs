use crate::image::ImageF32;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Edge-preserving bilateral filter over a circular neighbourhood.
///
/// `sigma_color` is expressed in image intensity units and `sigma_space` in
/// pixels. Borders are replicated. A diameter of 1 or less returns a copy.
pub fn bilateral_filter(
    image: &ImageF32,
    diameter: usize,
    sigma_color: f64,
    sigma_space: f64,
) -> ImageF32 {
    if diameter <= 1 || image.is_empty() {
        return image.clone();
    }
    let radius = (diameter / 2) as i64;
    let space_coeff = -0.5 / (sigma_space * sigma_space).max(f64::EPSILON);
    let color_coeff = -0.5 / (sigma_color * sigma_color).max(f64::EPSILON);

    let mut taps: Vec<(i64, i64, f32)> = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let r2 = (dx * dx + dy * dy) as f64;
            if r2 <= (radius * radius) as f64 {
                taps.push((dx, dy, (r2 * space_coeff).exp() as f32));
            }
        }
    }

    let (w, h) = (image.w, image.h);
    let filter_row = |y: usize, dst: &mut [f32]| {
        for (x, px) in dst.iter_mut().enumerate() {
            let center = image.get(x, y);
            let mut acc = 0.0f32;
            let mut norm = 0.0f32;
            for &(dx, dy, ws) in &taps {
                let sx = (x as i64 + dx).clamp(0, w as i64 - 1) as usize;
                let sy = (y as i64 + dy).clamp(0, h as i64 - 1) as usize;
                let v = image.get(sx, sy);
                let diff = (v - center) as f64;
                let wgt = ws * (diff * diff * color_coeff).exp() as f32;
                acc += wgt * v;
                norm += wgt;
            }
            *px = if norm > 0.0 { acc / norm } else { center };
        }
    };

    let mut out = ImageF32::new(w, h);
    #[cfg(feature = "parallel")]
    {
        out.data
            .par_chunks_mut(w)
            .enumerate()
            .for_each(|(y, dst)| filter_row(y, dst));
    }
    #[cfg(not(feature = "parallel"))]
    {
        out.data
            .chunks_mut(w)
            .enumerate()
            .for_each(|(y, dst)| filter_row(y, dst));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_regions_stay_flat() {
        let mut img = ImageF32::new(9, 9);
        img.data.fill(0.3);
        let out = bilateral_filter(&img, 5, 6.0 / 255.0, 200.0);
        assert!(out.data.iter().all(|&v| (v - 0.3).abs() < 1e-6));
    }

    #[test]
    fn strong_edges_are_preserved() {
        let mut img = ImageF32::new(10, 4);
        for y in 0..4 {
            for x in 5..10 {
                img.set(x, y, 1.0);
            }
        }
        let out = bilateral_filter(&img, 5, 6.0 / 255.0, 200.0);
        assert!(out.get(4, 1) < 1e-3);
        assert!(out.get(5, 1) > 1.0 - 1e-3);
    }

    #[test]
    fn small_noise_is_smoothed() {
        let mut img = ImageF32::new(7, 7);
        img.data.fill(0.5);
        img.set(3, 3, 0.5 + 2.0 / 255.0);
        let out = bilateral_filter(&img, 5, 6.0 / 255.0, 200.0);
        assert!(out.get(3, 3) < img.get(3, 3));
    }
}

//! Standard Hough transform for straight lines on a binary image.
//!
//! Lines are in normal form `x·cos θ + y·sin θ = ρ` with θ in `[0, π)`.
//! Accumulator peaks must exceed the vote threshold and be local maxima
//! along both axes; results are sorted by descending votes.
use super::params::HoughParams;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HoughLine {
    pub rho: f64,
    pub theta: f64,
    pub votes: u32,
}

impl HoughLine {
    /// Column where a near-vertical line crosses the region (sign-folded ρ).
    pub fn column(&self) -> f64 {
        if self.theta > std::f64::consts::FRAC_PI_2 {
            -self.rho
        } else {
            self.rho
        }
    }
}

/// Run the transform over a `width × height` mask stored row-major.
pub fn hough_lines(mask: &[bool], width: usize, height: usize, params: &HoughParams) -> Vec<HoughLine> {
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let theta_step = params.theta_step_deg.to_radians();
    let num_theta = ((std::f64::consts::PI / theta_step).round() as usize).max(1);
    let max_rho = ((width * width + height * height) as f64).sqrt();
    let half = (max_rho / params.rho_resolution).ceil() as usize + 1;
    let num_rho = 2 * half + 1;
    let rho_offset = half as f64;

    let trig: Vec<(f64, f64)> = (0..num_theta)
        .map(|t| {
            let (s, c) = (t as f64 * theta_step).sin_cos();
            (c / params.rho_resolution, s / params.rho_resolution)
        })
        .collect();

    // Padded by one cell on every side so the peak test needs no bounds checks.
    let stride = num_rho + 2;
    let mut acc = vec![0u32; (num_theta + 2) * stride];
    for y in 0..height {
        for x in 0..width {
            if !mask[y * width + x] {
                continue;
            }
            for (t, &(c, s)) in trig.iter().enumerate() {
                let r = (x as f64 * c + y as f64 * s + rho_offset).round() as usize;
                acc[(t + 1) * stride + r + 1] += 1;
            }
        }
    }

    let mut lines = Vec::new();
    for t in 0..num_theta {
        for r in 0..num_rho {
            let base = (t + 1) * stride + r + 1;
            let v = acc[base];
            if v >= params.vote_threshold.max(1)
                && v > acc[base - 1]
                && v >= acc[base + 1]
                && v > acc[base - stride]
                && v >= acc[base + stride]
            {
                lines.push(HoughLine {
                    rho: (r as f64 - rho_offset) * params.rho_resolution,
                    theta: t as f64 * theta_step,
                    votes: v,
                });
            }
        }
    }
    lines.sort_by(|a, b| b.votes.cmp(&a.votes));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_vertical_column() {
        let (w, h) = (40, 50);
        let mut mask = vec![false; w * h];
        for y in 0..h {
            mask[y * w + 12] = true;
        }
        let lines = hough_lines(&mask, w, h, &HoughParams::default());
        let best = lines[0];
        assert_eq!(best.theta, 0.0);
        assert_eq!(best.votes, 50);
        assert!((best.column() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn weak_lines_are_ignored() {
        let (w, h) = (20, 20);
        let mut mask = vec![false; w * h];
        for y in 0..10 {
            mask[y * w + 5] = true;
        }
        let lines = hough_lines(&mask, w, h, &HoughParams::default());
        assert!(lines.is_empty());
    }
}

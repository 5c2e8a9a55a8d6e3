use active_shape::image::ImageF32;
use active_shape::Shape;
use std::f64::consts::PI;

/// Regular `n`-gon around the origin with unit radius, each vertex radius
/// multiplied by `1 + stretch·cos(2θ)`.
pub fn stretched_polygon(n: usize, stretch: f64) -> Shape {
    Shape::new(
        (0..n)
            .map(|i| {
                let t = 2.0 * PI * i as f64 / n as f64;
                let r = 1.0 + stretch * (2.0 * t).cos();
                [r * t.cos(), r * t.sin()]
            })
            .collect(),
    )
}

/// Renders a closed polygon filled with `inside` on an `outside` background.
///
/// A pixel is inside when its centre is (even-odd rule).
pub fn filled_polygon(width: usize, height: usize, polygon: &[[f64; 2]], inside: f32, outside: f32) -> ImageF32 {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    let mut img = ImageF32::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let v = if contains(polygon, x as f64, y as f64) { inside } else { outside };
            img.set(x, y, v);
        }
    }
    img
}

fn contains(polygon: &[[f64; 2]], x: f64, y: f64) -> bool {
    let mut inside = false;
    let n = polygon.len();
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        if (a[1] > y) != (b[1] > y) {
            let cross = a[0] + (y - a[1]) / (b[1] - a[1]) * (b[0] - a[0]);
            if x < cross {
                inside = !inside;
            }
        }
    }
    inside
}

/// Bright "teeth" on a dark background: a dark horizontal gap at rows
/// `gap.0..gap.1` and dark vertical separators of width 3 at `columns`,
/// running through both jaws.
pub fn jaw_stripes(width: usize, height: usize, gap: (usize, usize), columns: &[usize]) -> ImageF32 {
    let mut img = ImageF32::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let in_gap = y >= gap.0 && y < gap.1;
            let on_line = columns.iter().any(|&c| x + 1 >= c && x <= c + 1);
            let v = if in_gap || on_line { 0.05 } else { 0.8 };
            img.set(x, y, v);
        }
    }
    img
}

/// Adds deterministic uniform noise in `[-amplitude, amplitude)` (LCG seeded
/// with `seed`).
pub fn with_noise(image: &ImageF32, amplitude: f32, seed: u64) -> ImageF32 {
    let mut state = seed;
    let mut out = image.clone();
    for v in &mut out.data {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let u = (state >> 40) as f32 / (1u64 << 24) as f32;
        *v += amplitude * (2.0 * u - 1.0);
    }
    out
}

//! Row-sum histogram and the band of dark rows separating two structures.

/// Separation band `[top, bottom]` (inclusive rows) around the darkest row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeparationBand {
    pub top: usize,
    pub bottom: usize,
    pub darkest: usize,
}

/// Find the darkest row and grow the band while rows stay within `delta` of
/// it, at most `limit` rows in each direction. `None` for an empty histogram.
pub fn separation_band(histogram: &[f64], delta: f64, limit: usize) -> Option<SeparationBand> {
    let (darkest, &min) = histogram
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))?;
    let within = |i: usize| histogram[i] <= min + delta;

    let mut bottom = darkest;
    for i in darkest + 1..(darkest + limit).min(histogram.len()) {
        if !within(i) {
            break;
        }
        bottom = i;
    }
    let mut top = darkest;
    for i in (darkest.saturating_sub(limit)..darkest).rev() {
        if !within(i) {
            break;
        }
        top = i;
    }
    Some(SeparationBand {
        top,
        bottom,
        darkest,
    })
}

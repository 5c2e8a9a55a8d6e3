//! Reduction of Hough candidates to three separating vertical lines.
use super::hough::HoughLine;
use crate::angle::{deviation_from_vertical, is_near_vertical};
use log::warn;

#[derive(Clone, Copy, Debug)]
struct Candidate {
    column: f64,
    deviation: f64,
    votes: u32,
}

/// Options for [`select_three_lines`].
#[derive(Clone, Copy, Debug)]
pub struct LineFilter {
    pub vertical_tolerance: f64,
    pub gap: f64,
    pub edge_margin: f64,
}

/// Columns of the three lines nearest the middle of a region `width` wide,
/// left to right.
///
/// Near-vertical candidates closer than `gap` are merged (the more vertical
/// one wins), lines within `edge_margin` of either side are dropped, and
/// missing lines are synthesised `gap` apart.
pub fn select_three_lines(lines: &[HoughLine], width: usize, filter: &LineFilter) -> [f64; 3] {
    let mut candidates: Vec<Candidate> = lines
        .iter()
        .filter(|l| is_near_vertical(l.theta, filter.vertical_tolerance))
        .map(|l| Candidate {
            column: l.column(),
            deviation: deviation_from_vertical(l.theta),
            votes: l.votes,
        })
        .collect();
    candidates.sort_by(|a, b| a.column.total_cmp(&b.column));

    let mut merged: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for c in candidates {
        match merged.last_mut() {
            Some(last) if (c.column - last.column).abs() < filter.gap => {
                let better = c.deviation < last.deviation
                    || (c.deviation == last.deviation && c.votes > last.votes);
                if better {
                    *last = c;
                }
            }
            _ => merged.push(c),
        }
    }

    let right_limit = width as f64 - filter.edge_margin;
    let columns: Vec<f64> = merged
        .iter()
        .map(|c| c.column)
        .filter(|&x| x >= filter.edge_margin && x <= right_limit)
        .collect();

    let middle = width as f64 / 2.0;
    match columns.len() {
        0 => {
            warn!("no separating lines found, using placeholders around the middle");
            [middle - filter.gap, middle, middle + filter.gap]
        }
        1 => {
            warn!("one separating line found, synthesising its neighbours");
            let c = columns[0];
            [c - filter.gap, c, c + filter.gap]
        }
        2 => {
            warn!("two separating lines found, synthesising the third");
            let (a, b) = (columns[0], columns[1]);
            if (a + b) / 2.0 < middle {
                [a, b, b + filter.gap]
            } else {
                [a - filter.gap, a, b]
            }
        }
        n => {
            let nearest = columns
                .iter()
                .enumerate()
                .min_by(|x, y| (x.1 - middle).abs().total_cmp(&(y.1 - middle).abs()))
                .map_or(0, |(i, _)| i);
            let start = nearest.saturating_sub(1).min(n - 3);
            [columns[start], columns[start + 1], columns[start + 2]]
        }
    }
}

//! Chart surfaces.

mod svg;
mod terminal;

pub use svg::SvgChart;
pub use terminal::TerminalChart;

use crate::history::History;
use crate::layout::Panel;

/// Message index range of the x axis, never empty.
pub(crate) fn x_bounds(history: &History) -> (f64, f64) {
    match history.index_span() {
        Some((first, last)) if last > first => (first as f64, last as f64),
        Some((first, _)) => (first as f64, first as f64 + 1.0),
        None => (0.0, 1.0),
    }
}

/// Value range covering every trace of `panel`, padded, never empty.
pub(crate) fn y_bounds(panel: &Panel, history: &History) -> (f64, f64) {
    let bounds = panel
        .traces
        .iter()
        .filter_map(|t| history.get(t.field).and_then(|s| s.bounds()))
        .fold(None, |acc: Option<(f64, f64)>, (lo, hi)| match acc {
            None => Some((lo, hi)),
            Some((a, b)) => Some((a.min(lo), b.max(hi))),
        });
    match bounds {
        None => (0.0, 1.0),
        Some((lo, hi)) if hi - lo < f64::EPSILON => (lo - 1.0, hi + 1.0),
        Some((lo, hi)) => {
            let pad = (hi - lo) * 0.05;
            (lo - pad, hi + pad)
        }
    }
}

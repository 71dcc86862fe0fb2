//! Deterministic systematic-sampling decimation.

use tracing::debug;

/// Reduce a sequence to at most `max_points` elements by stride sampling.
///
/// Computes `step = ceil(len / max_points)` and keeps indices
/// `0, step, 2*step, …`. The first element is always retained, order is
/// preserved, and the same input always produces the same selection.
/// When `len <= max_points` this is the identity.
///
/// This is intentionally a stride sample rather than reservoir sampling:
/// it is deterministic, O(N), and needs no memory beyond the output.
pub fn decimate<T>(items: Vec<T>, max_points: usize) -> Vec<T> {
    if max_points == 0 {
        return Vec::new();
    }
    if items.len() <= max_points {
        return items;
    }

    let step = items.len().div_ceil(max_points);
    debug!(
        input = items.len(),
        max_points = max_points,
        step = step,
        "Decimating point sequence"
    );
    items.into_iter().step_by(step).collect()
}

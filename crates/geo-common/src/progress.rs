//! Progress reporting protocol shared by every parser.

/// Sink for parse-progress events.
///
/// Parsers emit a monotonically non-decreasing sequence of percentages
/// ending at 100 on success (no guarantee on failure). Events are
/// ephemeral: the sink is expected to forward them to a UI or log, not
/// retain them. Reporting must stay cheap — it is called from inside
/// extraction loops at bounded intervals.
pub trait ProgressSink {
    fn report(&self, percent: u8, message: &str);
}

/// A sink that discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _percent: u8, _message: &str) {}
}

/// Any `Fn(u8, &str)` closure can serve as a sink directly.
impl<F: Fn(u8, &str)> ProgressSink for F {
    fn report(&self, percent: u8, message: &str) {
        self(percent, message)
    }
}

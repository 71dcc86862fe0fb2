//! The canonical normalized dataset produced by every parser.

use serde::{Deserialize, Serialize};

use crate::point::{Point, ValueRange};

/// A bounded, decimated collection of points plus source metadata.
///
/// This is the single representation all downstream consumers read.
/// It is assembled once by the format dispatcher (or the field switcher)
/// and replaced wholesale on re-parse, re-upload, or field switch —
/// never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    /// Logical file name the dataset was derived from. Also the key into
    /// the raw source cache for field switching.
    pub name: String,
    /// Extracted points, in extraction order. Length is bounded by the
    /// decimation ceiling the dataset was assembled with.
    pub points: Vec<Point>,
    /// Exact min/max over `points[*].value`, or `{0, 1}` when empty.
    pub value_range: ValueRange,
    /// Candidate value-field names detected in the source, in detection
    /// order.
    pub fields: Vec<String>,
    /// The field currently backing `points[*].value`.
    pub selected_field: String,
}

impl Dataset {
    /// Assemble a dataset from already-decimated points.
    ///
    /// The value range is recomputed here so the invariant between
    /// `points` and `value_range` cannot drift.
    pub fn new(
        name: impl Into<String>,
        points: Vec<Point>,
        fields: Vec<String>,
        selected_field: impl Into<String>,
    ) -> Self {
        let value_range = ValueRange::from_points(&points);
        Self {
            name: name.into(),
            points,
            value_range,
            fields,
            selected_field: selected_field.into(),
        }
    }
}

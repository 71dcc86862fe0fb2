//! Geolocated scalar observations and their value range.

use serde::{Deserialize, Serialize};

/// A single geolocated scalar observation.
///
/// Coordinates are geographic degrees (EPSG:4326). A `Point` is an
/// immutable value object; it has no identity beyond its fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Latitude in degrees, within [-90, 90].
    pub lat: f64,
    /// Longitude in degrees, within [-180, 180].
    pub lon: f64,
    /// Observed scalar value. Always finite.
    pub value: f64,
}

impl Point {
    /// Construct a point, validating the invariants every parser relies on.
    ///
    /// Returns `None` if the latitude or longitude is non-finite or out of
    /// range, or if the value is NaN or infinite. All extraction paths go
    /// through this, so a produced `Dataset` never contains an invalid point.
    pub fn checked(lat: f64, lon: f64, value: f64) -> Option<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return None;
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return None;
        }
        if !value.is_finite() {
            return None;
        }
        Some(Self { lat, lon, value })
    }
}

/// Min/max of the `value` field over a collection of points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    /// Compute the range over a slice of points.
    ///
    /// An empty slice yields the degenerate `{0, 1}` range so downstream
    /// color scaling always has a non-zero span to work with.
    pub fn from_points(points: &[Point]) -> Self {
        if points.is_empty() {
            return Self { min: 0.0, max: 1.0 };
        }

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for p in points {
            if p.value < min {
                min = p.value;
            }
            if p.value > max {
                max = p.value;
            }
        }
        Self { min, max }
    }
}

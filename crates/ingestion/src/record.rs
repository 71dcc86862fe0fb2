//! Shared per-record extraction logic.
//!
//! The tabular parser, the structured parser, and the field switcher all
//! funnel through [`extract_points`], so a field switch reproduces exactly
//! the validation behavior of the original parse.

use geo_common::{Point, ProgressSink};
use serde_json::Value;
use tracing::warn;

use crate::cache::RawRecord;

/// Ordered synonym table mapping source field spellings to canonical names.
///
/// Consulted case-insensitively, first hit wins. Spellings not listed here
/// keep their raw name, so unconventional-but-numeric fields remain
/// selectable as value fields.
const FIELD_SYNONYMS: &[(&[&str], &str)] = &[
    (&["lat", "latitude", "y"], "latitude"),
    (&["lon", "lng", "long", "longitude", "x"], "longitude"),
    (&["temp", "sst", "temperature"], "temperature"),
    (&["sal", "salinity"], "salinity"),
    (&["chl", "chlorophyll"], "chlorophyll"),
];

/// Map a source field name to its canonical form, or `None` if unmapped.
pub(crate) fn canonical_field_name(name: &str) -> Option<&'static str> {
    let lower = name.trim().to_lowercase();
    FIELD_SYNONYMS
        .iter()
        .find(|(spellings, _)| spellings.contains(&lower.as_str()))
        .map(|(_, canonical)| *canonical)
}

/// Coerce a JSON value to a finite-or-not f64. `None` means "not numeric".
///
/// Strings are parsed so delimited-text cells and quoted JSON numbers both
/// coerce. Booleans and nulls do not count as numeric.
pub(crate) fn coerce_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Points extracted from a source plus the metadata the dispatcher needs
/// to assemble a `Dataset`.
pub(crate) struct Extraction {
    pub points: Vec<Point>,
    pub fields: Vec<String>,
    pub selected_field: String,
}

/// Extract validated points from raw records.
///
/// Per-record failures (missing field, failed coercion, out-of-range
/// coordinate, non-finite value) skip the record and never abort the
/// extraction. Returns the surviving points and the skipped count; the
/// caller decides whether zero survivors is a structural error.
///
/// Progress is interpolated over the 40–90% window, reported every ~10%
/// of records.
pub(crate) fn extract_points(
    records: &[RawRecord],
    lat_field: &str,
    lon_field: &str,
    value_field: &str,
    progress: &dyn ProgressSink,
) -> (Vec<Point>, usize) {
    let mut points = Vec::new();
    let mut skipped = 0usize;
    let report_every = (records.len() / 10).max(1);

    for (i, record) in records.iter().enumerate() {
        if i % report_every == 0 {
            let percent = 40 + (i * 50 / records.len()) as u8;
            progress.report(percent, "extracting records");
        }

        let extracted = record
            .get(lat_field)
            .and_then(coerce_numeric)
            .zip(record.get(lon_field).and_then(coerce_numeric))
            .zip(record.get(value_field).and_then(coerce_numeric))
            .and_then(|((lat, lon), value)| Point::checked(lat, lon, value));

        match extracted {
            Some(point) => points.push(point),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(
            skipped = skipped,
            total = records.len(),
            value_field = value_field,
            "Skipped records failing coordinate/value validation"
        );
    }

    (points, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_common::NoProgress;
    use serde_json::json;

    fn record(lat: Value, lon: Value, temp: Value) -> RawRecord {
        let mut map = RawRecord::new();
        map.insert("latitude".to_string(), lat);
        map.insert("longitude".to_string(), lon);
        map.insert("temperature".to_string(), temp);
        map
    }

    #[test]
    fn test_canonical_field_name() {
        assert_eq!(canonical_field_name("LAT"), Some("latitude"));
        assert_eq!(canonical_field_name("y"), Some("latitude"));
        assert_eq!(canonical_field_name("lng"), Some("longitude"));
        assert_eq!(canonical_field_name("SST"), Some("temperature"));
        assert_eq!(canonical_field_name("chl"), Some("chlorophyll"));
        assert_eq!(canonical_field_name("station_id"), None);
    }

    #[test]
    fn test_coerce_numeric() {
        assert_eq!(coerce_numeric(&json!(3.5)), Some(3.5));
        assert_eq!(coerce_numeric(&json!("  -12.25 ")), Some(-12.25));
        assert_eq!(coerce_numeric(&json!("abc")), None);
        assert_eq!(coerce_numeric(&json!(true)), None);
        assert_eq!(coerce_numeric(&json!(null)), None);
    }

    #[test]
    fn test_extract_skips_invalid_records() {
        let records = vec![
            record(json!(10.0), json!(20.0), json!(5.0)),
            record(json!(91.0), json!(20.0), json!(5.0)),
            record(json!(10.0), json!(20.0), json!("NaN")),
            record(json!("bad"), json!(20.0), json!(5.0)),
        ];
        let (points, skipped) =
            extract_points(&records, "latitude", "longitude", "temperature", &NoProgress);
        assert_eq!(points.len(), 1);
        assert_eq!(skipped, 3);
        assert_eq!(points[0], Point::checked(10.0, 20.0, 5.0).unwrap());
    }

    #[test]
    fn test_extract_skips_missing_fields() {
        let mut partial = RawRecord::new();
        partial.insert("latitude".to_string(), json!(10.0));
        let (points, skipped) =
            extract_points(&[partial], "latitude", "longitude", "temperature", &NoProgress);
        assert!(points.is_empty());
        assert_eq!(skipped, 1);
    }
}

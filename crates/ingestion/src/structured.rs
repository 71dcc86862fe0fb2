//! Structured-record (JSON) parsing, including the GeoJSON point-feature
//! convention.

use bytes::Bytes;
use geo_common::{IngestError, IngestResult, ProgressSink};
use serde_json::Value;
use tracing::{info, warn};

use crate::cache::{RawRecord, RawSourceCache, RawSourceRecord, SourceKind};
use crate::record::{canonical_field_name, coerce_numeric, extract_points, Extraction};

/// Pull the record array out of the supported top-level shapes.
///
/// Accepted, in probing order: a bare array of records, an object with a
/// `data` array, a feature collection with point features, or a single
/// record (wrapped into a one-element array).
fn collect_raw_records(top: Value) -> IngestResult<Vec<Value>> {
    match top {
        Value::Array(records) => Ok(records),
        Value::Object(mut obj) => {
            if matches!(obj.get("data"), Some(Value::Array(_))) {
                if let Some(Value::Array(records)) = obj.remove("data") {
                    return Ok(records);
                }
            }
            if matches!(obj.get("features"), Some(Value::Array(_))) {
                if let Some(Value::Array(features)) = obj.remove("features") {
                    return Ok(features.into_iter().map(flatten_feature).collect());
                }
            }
            Ok(vec![Value::Object(obj)])
        }
        _ => Err(IngestError::InvalidStructure(
            "expected an array of records, an object with a 'data' array, \
             a feature collection, or a single record"
                .to_string(),
        )),
    }
}

/// Convert a GeoJSON point feature into a flat record:
/// `{...properties, latitude: coordinates[1], longitude: coordinates[0]}`.
///
/// Features without usable geometry keep their properties; the missing
/// coordinates make the record fail validation later rather than aborting
/// the parse here.
fn flatten_feature(feature: Value) -> Value {
    let Value::Object(mut feature) = feature else {
        return feature;
    };

    let coords = feature
        .get("geometry")
        .and_then(|g| g.get("coordinates"))
        .and_then(Value::as_array)
        .map(|c| (c.first().cloned(), c.get(1).cloned()));

    let mut record = match feature.remove("properties") {
        Some(Value::Object(props)) => props,
        _ => serde_json::Map::new(),
    };
    if let Some((Some(lon), Some(lat))) = coords {
        record.insert("latitude".to_string(), lat);
        record.insert("longitude".to_string(), lon);
    }
    Value::Object(record)
}

/// Rewrite a record's keys through the synonym table. Unmapped keys keep
/// their raw name and value, numeric or not.
fn canonicalize_record(record: serde_json::Map<String, Value>) -> RawRecord {
    let mut mapped = RawRecord::new();
    for (key, value) in record {
        let canonical = canonical_field_name(&key)
            .map(str::to_string)
            .unwrap_or(key);
        mapped.insert(canonical, value);
    }
    mapped
}

/// Parse a structured text source into points and register the assembled
/// records in the cache.
pub(crate) fn parse_structured(
    data: &Bytes,
    file_name: &str,
    cache: &RawSourceCache,
    progress: &dyn ProgressSink,
) -> IngestResult<Extraction> {
    progress.report(5, "parsing structured text");

    let top: Value = serde_json::from_slice(data)?;
    let raw_records = collect_raw_records(top)?;

    progress.report(20, "assembling records");

    let mut non_objects = 0usize;
    let records: Vec<RawRecord> = raw_records
        .into_iter()
        .filter_map(|value| match value {
            Value::Object(obj) => Some(canonicalize_record(obj)),
            _ => {
                non_objects += 1;
                None
            }
        })
        .collect();
    if non_objects > 0 {
        warn!(skipped = non_objects, "Skipped non-record entries");
    }

    // Candidate value fields are sampled from the first record: numeric,
    // non-coordinate fields in detection order.
    let candidate_fields: Vec<String> = records
        .first()
        .map(|record| {
            record
                .iter()
                .filter(|(key, value)| {
                    key.as_str() != "latitude"
                        && key.as_str() != "longitude"
                        && coerce_numeric(value).is_some()
                })
                .map(|(key, _)| key.clone())
                .collect()
        })
        .unwrap_or_default();
    let Some(value_field) = candidate_fields.first().cloned() else {
        return Err(IngestError::NoValidRecords);
    };

    let (points, skipped) =
        extract_points(&records, "latitude", "longitude", &value_field, progress);
    if points.is_empty() {
        return Err(IngestError::NoValidRecords);
    }

    info!(
        file = file_name,
        records = records.len(),
        points = points.len(),
        skipped = skipped,
        value_field = %value_field,
        "Parsed structured records"
    );

    cache.insert(
        file_name,
        RawSourceRecord {
            bytes: data.clone(),
            kind: SourceKind::Structured,
            records,
            lat_field: "latitude".to_string(),
            lon_field: "longitude".to_string(),
            candidate_fields: candidate_fields.clone(),
        },
    );

    Ok(Extraction {
        points,
        fields: candidate_fields,
        selected_field: value_field,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collect_bare_array() {
        let records = collect_raw_records(json!([{"a": 1}, {"a": 2}])).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_collect_data_wrapper() {
        let records = collect_raw_records(json!({"data": [{"a": 1}]})).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_collect_single_record_wraps() {
        let records = collect_raw_records(json!({"lat": 1.0, "lon": 2.0})).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_collect_scalar_is_invalid() {
        assert!(matches!(
            collect_raw_records(json!(42)),
            Err(IngestError::InvalidStructure(_))
        ));
    }

    #[test]
    fn test_flatten_feature_pulls_coordinates() {
        let feature = json!({
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [72.0, 15.0]},
            "properties": {"temperature": 28}
        });
        let record = flatten_feature(feature);
        assert_eq!(record["latitude"], json!(15.0));
        assert_eq!(record["longitude"], json!(72.0));
        assert_eq!(record["temperature"], json!(28));
    }

    #[test]
    fn test_canonicalize_record_maps_synonyms() {
        let record = json!({"Lat": 1.0, "LNG": 2.0, "sst": 20.0, "station": "A"});
        let Value::Object(obj) = record else { unreachable!() };
        let mapped = canonicalize_record(obj);
        assert!(mapped.contains_key("latitude"));
        assert!(mapped.contains_key("longitude"));
        assert!(mapped.contains_key("temperature"));
        assert_eq!(mapped["station"], json!("A"));
    }
}

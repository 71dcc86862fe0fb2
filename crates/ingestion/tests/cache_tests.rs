//! Integration tests for the raw source cache and field switching.

use bytes::Bytes;
use geo_common::{IngestError, NoProgress};
use ingestion::{parse_dataset, ParseOptions, RawSourceCache};
use test_utils::fixtures;

fn parse(text: &str, name: &str, cache: &RawSourceCache) -> geo_common::Dataset {
    parse_dataset(
        Bytes::from(text.to_string()),
        name,
        cache,
        &ParseOptions::default(),
        &NoProgress,
    )
    .unwrap()
}

#[test]
fn test_tabular_field_switch_preserves_row_validation() {
    let cache = RawSourceCache::new();
    let dataset = parse(fixtures::CSV_TWO_FIELDS, "obs.csv", &cache);
    assert_eq!(dataset.selected_field, "temp");
    assert_eq!(dataset.points.len(), 2);

    let switched = cache
        .switch_dataset_field(&dataset, "salinity", &NoProgress)
        .unwrap();

    // The row with lat=91 is rejected again; only the value column changes.
    assert_eq!(switched.points.len(), 2);
    assert_eq!(switched.selected_field, "salinity");
    assert_eq!(switched.fields, dataset.fields);
    assert_eq!(switched.points[0].lat, dataset.points[0].lat);
    assert_eq!(switched.points[0].lon, dataset.points[0].lon);
    assert_eq!(switched.points[0].value, 35.1);
    assert_eq!(switched.points[1].value, 34.2);
    assert_eq!(switched.value_range.min, 34.2);
    assert_eq!(switched.value_range.max, 35.1);
}

#[test]
fn test_structured_field_switch() {
    let cache = RawSourceCache::new();
    let dataset = parse(fixtures::JSON_DATA_WRAPPER, "cruise.json", &cache);
    assert_eq!(dataset.selected_field, "temperature");

    let switched = cache
        .switch_dataset_field(&dataset, "salinity", &NoProgress)
        .unwrap();
    assert_eq!(switched.points.len(), 2);
    assert_eq!(switched.selected_field, "salinity");
    assert_eq!(switched.points[0].value, 35.0);
    assert_eq!(switched.points[1].value, 34.5);
}

#[test]
fn test_grid_field_switch_reparses_cached_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("multi.nc");
    test_utils::generators::write_grid_netcdf(
        &path,
        "lat",
        "lon",
        "temp",
        &[0.0, 10.0],
        &[0.0, 20.0],
        &[],
        &[1.0, 2.0, 3.0, 4.0],
    )
    .unwrap();
    {
        let mut file = netcdf::append(&path).unwrap();
        let mut var = file.add_variable::<f64>("salinity", &["lat", "lon"]).unwrap();
        var.put_values(&[34.0, 34.1, 34.2, 34.3], ..).unwrap();
    }

    let cache = RawSourceCache::new();
    let data = Bytes::from(std::fs::read(&path).unwrap());
    let dataset = parse_dataset(
        data,
        "multi.nc",
        &cache,
        &ParseOptions::default(),
        &NoProgress,
    )
    .unwrap();

    let switched = cache
        .switch_dataset_field(&dataset, "salinity", &NoProgress)
        .unwrap();
    assert_eq!(switched.selected_field, "salinity");
    assert_eq!(switched.points.len(), 4);
    assert_eq!(switched.value_range.min, 34.0);
    assert_eq!(switched.value_range.max, 34.3);
}

#[test]
fn test_switch_to_unknown_field_lists_candidates() {
    let cache = RawSourceCache::new();
    let dataset = parse(fixtures::CSV_TWO_FIELDS, "obs.csv", &cache);

    let err = cache
        .switch_dataset_field(&dataset, "pressure", &NoProgress)
        .unwrap_err();
    match err {
        IngestError::UnknownField { field, available } => {
            assert_eq!(field, "pressure");
            assert_eq!(available, vec!["temp", "salinity"]);
        }
        other => panic!("expected UnknownField, got {:?}", other),
    }
}

#[test]
fn test_switch_without_cache_entry_fails() {
    let cache = RawSourceCache::new();
    let dataset = parse(fixtures::CSV_TWO_FIELDS, "obs.csv", &cache);

    let other_cache = RawSourceCache::new();
    let err = other_cache
        .switch_dataset_field(&dataset, "salinity", &NoProgress)
        .unwrap_err();
    assert!(matches!(err, IngestError::SourceNotCached(name) if name == "obs.csv"));
}

#[test]
fn test_clear_drops_entries() {
    let cache = RawSourceCache::new();
    let dataset = parse(fixtures::CSV_TWO_FIELDS, "obs.csv", &cache);
    assert_eq!(cache.len(), 1);

    cache.clear();
    assert!(cache.is_empty());
    let err = cache
        .switch_dataset_field(&dataset, "salinity", &NoProgress)
        .unwrap_err();
    assert!(matches!(err, IngestError::SourceNotCached(_)));
}

#[test]
fn test_reparse_same_name_overwrites_entry() {
    let cache = RawSourceCache::new();
    parse(fixtures::CSV_TWO_FIELDS, "obs.csv", &cache);
    assert_eq!(cache.get("obs.csv").unwrap().records.len(), 3);

    parse(fixtures::CSV_MIXED_VALIDITY, "obs.csv", &cache);
    assert_eq!(cache.len(), 1);
    let record = cache.get("obs.csv").unwrap();
    assert_eq!(record.candidate_fields, vec!["temp"]);
}

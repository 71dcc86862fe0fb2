//! Inline text fixtures for parser tests.

/// Header `lat,lon,temp`; one valid row, one out-of-range latitude, one
/// non-numeric value.
pub const CSV_MIXED_VALIDITY: &str = "lat,lon,temp\n10,20,5\n91,20,5\n10,20,NaN\n";

/// Two fully valid rows with an extra candidate column.
pub const CSV_TWO_FIELDS: &str =
    "lat,lon,temp,salinity\n10.0,20.0,5.0,35.1\n-45.5,120.25,18.5,34.2\n91.0,0.0,1.0,30.0\n";

/// Tab-delimited variant of a two-row observation file.
pub const TSV_BASIC: &str = "lat\tlon\ttemp\n10\t20\t5\n11\t21\t6\n";

/// Rows where every value cell fails numeric coercion.
pub const CSV_ALL_INVALID_VALUES: &str = "lat,lon,temp\n10,20,n/a\n11,21,missing\n";

/// Headers with no recognizable coordinate columns.
pub const CSV_NO_COORDS: &str = "station,reading\nA,5\nB,6\n";

/// A GeoJSON feature collection with a single point feature.
pub const GEOJSON_SINGLE_FEATURE: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "geometry": {"type": "Point", "coordinates": [72.0, 15.0]},
      "properties": {"temperature": 28}
    }
  ]
}"#;

/// An array of records using synonym field spellings (`lat`/`lng`/`sst`).
pub const JSON_RECORD_ARRAY: &str = r#"[
  {"lat": 10.0, "lng": 20.0, "sst": 25.5, "station": "A"},
  {"lat": 92.0, "lng": 20.0, "sst": 24.0, "station": "B"},
  {"lat": -5.0, "lng": 140.0, "sst": 29.1, "station": "C"}
]"#;

/// Records wrapped in a `data` array with multiple numeric fields.
pub const JSON_DATA_WRAPPER: &str = r#"{
  "data": [
    {"latitude": 1.0, "longitude": 2.0, "temperature": 20.0, "salinity": 35.0},
    {"latitude": 3.0, "longitude": 4.0, "temperature": 22.0, "salinity": 34.5}
  ]
}"#;

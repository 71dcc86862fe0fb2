//! Delimited-text (CSV/TXT) parsing with header-based column detection.

use bytes::Bytes;
use geo_common::{IngestError, IngestResult, ProgressSink};
use serde_json::Value;
use tracing::{info, warn};

use crate::cache::{RawRecord, RawSourceCache, RawSourceRecord, SourceKind};
use crate::record::{extract_points, Extraction};

/// Header spellings accepted for the latitude column.
const LAT_HEADERS: &[&str] = &["lat", "latitude", "y"];
/// Header spellings accepted for the longitude column.
const LON_HEADERS: &[&str] = &["lon", "long", "longitude", "x"];

/// Guess the delimiter from the header line.
///
/// Plain-text exports frequently come tab- or semicolon-separated; the
/// delimiter with the most occurrences in the first line wins, comma by
/// default.
fn sniff_delimiter(data: &[u8]) -> u8 {
    let header_line = data.split(|&b| b == b'\n').next().unwrap_or(data);
    [b',', b'\t', b';']
        .into_iter()
        .max_by_key(|&d| header_line.iter().filter(|&&b| b == d).count())
        .unwrap_or(b',')
}

/// Find the index of the first header matching one of `candidates`
/// (case-insensitive, trimmed).
fn find_column(headers: &[String], candidates: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| candidates.contains(&h.trim().to_lowercase().as_str()))
}

/// Parse delimited text into points and register the raw rows in the cache.
pub(crate) fn parse_tabular(
    data: &Bytes,
    file_name: &str,
    cache: &RawSourceCache,
    progress: &dyn ProgressSink,
) -> IngestResult<Extraction> {
    progress.report(5, "reading delimited text");

    let delimiter = sniff_delimiter(data);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data.as_ref());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| IngestError::MalformedInput(format!("failed to read header row: {}", e)))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let lat_col = find_column(&headers, LAT_HEADERS);
    let lon_col = find_column(&headers, LON_HEADERS);
    let (lat_col, lon_col) = match (lat_col, lon_col) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => {
            return Err(IngestError::MissingCoordinateColumns { headers });
        }
    };

    // All non-coordinate columns stay selectable; the first one is the
    // initially selected value field.
    let candidate_fields: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != lat_col && i != lon_col)
        .map(|(_, h)| h.clone())
        .collect();
    let value_field = candidate_fields.first().cloned().ok_or_else(|| {
        IngestError::InvalidStructure(
            "no data columns beyond the coordinate columns".to_string(),
        )
    })?;

    progress.report(20, "parsing data rows");

    let mut rows: Vec<RawRecord> = Vec::new();
    let mut width_mismatches = 0usize;
    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                width_mismatches += 1;
                warn!(row = rows.len() + width_mismatches, error = %e, "Skipping unreadable row");
                continue;
            }
        };
        if record.len() != headers.len() {
            width_mismatches += 1;
            warn!(
                expected = headers.len(),
                found = record.len(),
                "Skipping row with mismatched field count"
            );
            continue;
        }

        let mut row = RawRecord::new();
        for (header, cell) in headers.iter().zip(record.iter()) {
            row.insert(header.clone(), Value::String(cell.to_string()));
        }
        rows.push(row);
    }

    let lat_field = headers[lat_col].clone();
    let lon_field = headers[lon_col].clone();
    let (points, skipped) = extract_points(&rows, &lat_field, &lon_field, &value_field, progress);

    if points.is_empty() {
        return Err(IngestError::NoValidRecords);
    }

    info!(
        file = file_name,
        rows = rows.len(),
        points = points.len(),
        skipped = skipped,
        width_mismatches = width_mismatches,
        value_field = %value_field,
        "Parsed delimited text"
    );

    cache.insert(
        file_name,
        RawSourceRecord {
            bytes: data.clone(),
            kind: SourceKind::Tabular,
            records: rows,
            lat_field,
            lon_field,
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

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter(b"lat,lon,temp\n1,2,3"), b',');
        assert_eq!(sniff_delimiter(b"lat\tlon\ttemp\n1\t2\t3"), b'\t');
        assert_eq!(sniff_delimiter(b"lat;lon;temp\n1;2;3"), b';');
        assert_eq!(sniff_delimiter(b"single_column"), b',');
    }

    #[test]
    fn test_find_column_case_insensitive() {
        let headers = vec!["Station".to_string(), "LAT".to_string(), "Lon".to_string()];
        assert_eq!(find_column(&headers, LAT_HEADERS), Some(1));
        assert_eq!(find_column(&headers, LON_HEADERS), Some(2));
        assert_eq!(find_column(&headers, &["depth"]), None);
    }
}

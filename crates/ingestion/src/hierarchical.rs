//! Hierarchical container (HDF5) parsing by conventional-path probing.
//!
//! HDF5 sources carry no dimension metadata we can rely on, so the three
//! roles (latitude, longitude, value) are resolved by probing a table of
//! candidate dataset names under a table of conventional group prefixes,
//! lazily, first hit wins.

use bytes::Bytes;
use geo_common::{IngestError, IngestResult, Point, ProgressSink};
use tracing::{debug, info, warn};

use crate::record::Extraction;
use crate::stage::stage_bytes;

/// Candidate dataset names per role. Probed in order.
const LAT_DATASETS: &[&str] = &["lat", "latitude", "y", "LAT", "LATITUDE"];
const LON_DATASETS: &[&str] = &["lon", "longitude", "x", "LON", "LONGITUDE"];
const VALUE_DATASETS: &[&str] = &[
    "value",
    "data",
    "temperature",
    "temp",
    "sst",
    "salinity",
    "chlorophyll",
    "pressure",
    "depth",
    "elevation",
    "VALUE",
    "DATA",
];

/// Conventional group prefixes, root first.
const GROUP_PREFIXES: &[&str] = &["", "data", "geophysical_data", "HDFEOS/GRIDS/Grid/Data Fields"];

/// Default float fill magnitude; mirrors the grid parser's missing-cell
/// convention so unmasked fill values do not pollute the value range.
const FILL_THRESHOLD: f64 = 1e30;

/// Probe candidate paths for one role, returning the first dataset that
/// opens and reads as a flat numeric array. Failed paths accumulate in
/// `tried` for the error message.
fn probe_dataset(
    file: &hdf5::File,
    names: &[&str],
    tried: &mut Vec<String>,
) -> Option<(String, Vec<f64>)> {
    for name in names {
        for prefix in GROUP_PREFIXES {
            let path = if prefix.is_empty() {
                format!("/{}", name)
            } else {
                format!("/{}/{}", prefix, name)
            };
            if let Ok(dataset) = file.dataset(&path) {
                if let Ok(data) = dataset.read_raw::<f64>() {
                    debug!(path = %path, len = data.len(), "Resolved hierarchical dataset");
                    return Some((path, data));
                }
            }
            tried.push(path);
        }
    }
    None
}

fn resolve_role(
    file: &hdf5::File,
    role: &'static str,
    names: &[&str],
) -> IngestResult<(String, Vec<f64>)> {
    let mut tried = Vec::new();
    probe_dataset(file, names, &mut tried)
        .ok_or_else(|| IngestError::RequiredDatasetsNotFound {
            role: role.to_string(),
            tried,
        })
}

/// Parse a hierarchical binary container into points.
pub(crate) fn parse_hierarchical(
    data: &Bytes,
    file_name: &str,
    progress: &dyn ProgressSink,
) -> IngestResult<Extraction> {
    progress.report(5, "opening hierarchical container");

    // The HDF5 C library prints to stderr on failed lookups even when the
    // caller handles them; probing makes that noisy without this.
    hdf5::silence_errors(true);

    let staged = stage_bytes(data, ".h5")?;
    let file = hdf5::File::open(staged.path()).map_err(|e| {
        IngestError::MalformedInput(format!("not a readable hierarchical container: {}", e))
    })?;

    progress.report(15, "probing conventional dataset paths");

    let (lat_path, lats) = resolve_role(&file, "latitude", LAT_DATASETS)?;
    let (lon_path, lons) = resolve_role(&file, "longitude", LON_DATASETS)?;
    let (value_path, values) = resolve_role(&file, "value", VALUE_DATASETS)?;

    debug!(
        lat = %lat_path,
        lon = %lon_path,
        value = %value_path,
        "Resolved hierarchical container roles"
    );
    progress.report(30, "extraction started");

    let (nlat, nlon, nvalues) = (lats.len(), lons.len(), values.len());
    let mut points = Vec::new();
    let mut skipped = 0usize;

    let mut push_cell = |lat: f64, lon: f64, value: f64| {
        if value.is_nan() || value.abs() >= FILL_THRESHOLD {
            skipped += 1;
            return;
        }
        match Point::checked(lat, lon, value) {
            Some(point) => points.push(point),
            None => skipped += 1,
        }
    };

    if nlat == nlon && nvalues == nlat {
        // Point-based layout: direct triples.
        let report_every = (nlat / 10).max(1);
        for i in 0..nlat {
            if i % report_every == 0 {
                progress.report(30 + (i * 60 / nlat) as u8, "extracting point triples");
            }
            push_cell(lats[i], lons[i], values[i]);
        }
    } else if nvalues == nlat * nlon {
        // Full Cartesian grid, row-major values.
        let total = nlat * nlon;
        let mut processed = 0usize;
        for (lat_idx, &lat) in lats.iter().enumerate() {
            for (lon_idx, &lon) in lons.iter().enumerate() {
                processed += 1;
                if processed % 10_000 == 0 {
                    progress.report(30 + (processed * 60 / total) as u8, "extracting grid cells");
                }
                push_cell(lat, lon, values[lat_idx * nlon + lon_idx]);
            }
        }
    } else {
        return Err(IngestError::IncompatibleDimensions {
            lat_len: nlat,
            lon_len: nlon,
            value_len: nvalues,
        });
    }

    if points.is_empty() {
        return Err(IngestError::NoValidPoints);
    }
    if skipped > 0 {
        warn!(skipped = skipped, "Skipped cells during hierarchical extraction");
    }

    let value_field = value_path
        .rsplit('/')
        .next()
        .unwrap_or(value_path.as_str())
        .to_string();

    info!(
        file = file_name,
        points = points.len(),
        value = %value_field,
        "Extracted hierarchical container points"
    );

    Ok(Extraction {
        points,
        fields: vec![value_field.clone()],
        selected_field: value_field,
    })
}

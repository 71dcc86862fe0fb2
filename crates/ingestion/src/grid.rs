//! Gridded multi-dimensional container (NetCDF) parsing.
//!
//! Grid sources arrive with unknown, inconsistently named schemas: the
//! latitude/longitude coordinate variables and the physical value variable
//! all have to be auto-detected, and the value variable's dimensionality
//! (2-D lat/lon up to 4-D time/depth/lat/lon) is resolved once into a
//! fixed accessor before the cell loop runs.

use bytes::Bytes;
use geo_common::{IngestError, IngestResult, Point, ProgressSink};
use tracing::{debug, info, warn};

use crate::cache::{RawSourceCache, RawSourceRecord, SourceKind};
use crate::record::Extraction;
use crate::stage::stage_bytes;

/// Variable names recognized as the latitude coordinate.
const LAT_VARIABLES: &[&str] = &[
    "lat", "latitude", "y", "yt", "y_t", "yt_j", "yaxis", "lat_deg", "nav_lat", "nlat",
    "latitude_t",
];

/// Variable names recognized as the longitude coordinate.
const LON_VARIABLES: &[&str] = &[
    "lon", "longitude", "long", "x", "xt", "x_t", "xt_i", "xaxis", "lon_deg", "nav_lon", "nlon",
    "longitude_t",
];

/// Name fragments that exclude a variable from value selection
/// (auxiliary axes and metadata, not physical quantities).
const EXCLUDED_FRAGMENTS: &[&str] = &["time", "depth", "lev", "bnds", "bound", "crs"];

/// Physical-quantity names preferred as the value variable, in priority
/// order.
const PREFERRED_VALUES: &[&str] = &[
    "temp",
    "temperature",
    "sst",
    "salinity",
    "sal",
    "chlorophyll",
    "chl",
    "ssh",
    "u",
    "v",
    "w",
];

/// Fill-value convention: a cell at or beyond this magnitude is missing.
const FILL_THRESHOLD: f64 = 1e30;

fn is_coordinate_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    LAT_VARIABLES.contains(&lower.as_str()) || LON_VARIABLES.contains(&lower.as_str())
}

fn is_excluded(name: &str) -> bool {
    let lower = name.to_lowercase();
    is_coordinate_name(&lower) || EXCLUDED_FRAGMENTS.iter().any(|f| lower.contains(f))
}

/// Fixed access pattern for reading a grid cell, resolved once before the
/// cell loop.
///
/// Time and depth are always read at slice 0, and values are row-major, so
/// every pattern reduces to the same `lat * lon_count + lon` offset — what
/// distinguishes them is which buffer lengths they accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GridAccess {
    /// Rank 4: `[time][depth][lat][lon]`.
    TimeDepthLatLon,
    /// Rank 3: `[time_or_depth][lat][lon]`.
    SliceLatLon,
    /// Rank 2: `[lat][lon]`.
    LatLon,
    /// Rank 1: flattened row-major `[lat * lon_count + lon]`.
    Flat,
}

impl GridAccess {
    fn for_rank(rank: usize) -> Option<Self> {
        match rank {
            4 => Some(Self::TimeDepthLatLon),
            3 => Some(Self::SliceLatLon),
            2 => Some(Self::LatLon),
            1 => Some(Self::Flat),
            _ => None,
        }
    }

    /// Whether a buffer of this length is consistent with the pattern.
    fn fits(self, len: usize, nlat: usize, nlon: usize) -> bool {
        let cell_count = nlat * nlon;
        if cell_count == 0 {
            return false;
        }
        match self {
            Self::LatLon | Self::Flat => len == cell_count,
            Self::SliceLatLon | Self::TimeDepthLatLon => len % cell_count == 0 && len >= cell_count,
        }
    }

    fn index(self, lat_idx: usize, lon_idx: usize, nlon: usize) -> usize {
        lat_idx * nlon + lon_idx
    }

    fn label(self) -> &'static str {
        match self {
            Self::TimeDepthLatLon => "[time][depth][lat][lon]",
            Self::SliceLatLon => "[time_or_depth][lat][lon]",
            Self::LatLon => "[lat][lon]",
            Self::Flat => "[lat * lon_count + lon]",
        }
    }
}

/// Effective rank of the value variable: the declared rank when it is
/// trustworthy, otherwise inferred from the materialized buffer length.
fn effective_rank(declared: usize, data_len: usize, nlat: usize, nlon: usize) -> usize {
    if declared >= 2 {
        return declared;
    }
    let cell_count = nlat * nlon;
    if cell_count == 0 {
        return declared;
    }
    if data_len == cell_count {
        2
    } else if data_len > cell_count && data_len % cell_count == 0 {
        3
    } else {
        declared
    }
}

/// Resolve the access pattern: declared rank first, then fall back through
/// `[lat][lon]`, `[0][lat][lon]`, flattened — accepting the first whose
/// bounds are consistent with the buffer. The length check is what stands
/// in for "did not raise an access error": a pattern that fits never
/// indexes out of bounds with time/depth at slice 0.
fn resolve_access(rank: usize, len: usize, nlat: usize, nlon: usize) -> Option<GridAccess> {
    if let Some(access) = GridAccess::for_rank(rank) {
        if access.fits(len, nlat, nlon) {
            return Some(access);
        }
    }
    [GridAccess::LatLon, GridAccess::SliceLatLon, GridAccess::Flat]
        .into_iter()
        .find(|access| access.fits(len, nlat, nlon))
}

/// Declared element count of a variable (product of its dimension sizes).
fn var_len(var: &netcdf::Variable) -> usize {
    var.dimensions().iter().map(|d| d.len()).product()
}

fn read_values(var: &netcdf::Variable) -> IngestResult<Vec<f64>> {
    var.get_values::<f64, _>(..)
        .map_err(|e| IngestError::ContainerRead(format!("failed to read '{}': {}", var.name(), e)))
}

fn find_variable<'f>(file: &'f netcdf::File, names: &[&str]) -> Option<netcdf::Variable<'f>> {
    file.variables()
        .find(|v| names.contains(&v.name().to_lowercase().as_str()))
}

/// Pick the value variable when no explicit field override is given.
///
/// Preference order: a known physical-quantity name with rank >= 2, then
/// the first non-excluded variable with rank >= 2, then — when dimension
/// metadata is unreliable — the first non-excluded variable whose
/// materialized data length implies rank >= 2.
fn select_value_variable<'f>(
    file: &'f netcdf::File,
    nlat: usize,
    nlon: usize,
) -> Option<netcdf::Variable<'f>> {
    for preferred in PREFERRED_VALUES {
        if let Some(var) = file
            .variables()
            .find(|v| v.name().to_lowercase() == *preferred && v.dimensions().len() >= 2)
        {
            return Some(var);
        }
    }

    if let Some(var) = file
        .variables()
        .find(|v| !is_excluded(&v.name()) && v.dimensions().len() >= 2)
    {
        return Some(var);
    }

    // Dimension metadata unreliable: fall back to measuring the data.
    // A buffer the size of the grid implies rank >= 2; a buffer matching
    // equal-length lat/lon arrays is a point-based value variable.
    file.variables()
        .filter(|v| !is_excluded(&v.name()) && v.dimensions().len() < 2)
        .find(|v| {
            read_values(v)
                .map(|data| {
                    effective_rank(v.dimensions().len(), data.len(), nlat, nlon) >= 2
                        || (nlat == nlon && data.len() == nlat)
                })
                .unwrap_or(false)
        })
}

/// Per-variable diagnostic table for `ValueVariableNotFound`.
fn variable_diagnostics(file: &netcdf::File) -> String {
    let mut diag = String::from("variables considered:\n");
    for var in file.variables() {
        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        diag.push_str(&format!(
            "  {}: rank={}, dims=[{}], excluded={}\n",
            var.name(),
            var.dimensions().len(),
            dims.join(", "),
            is_excluded(&var.name()),
        ));
    }
    diag.push_str("dimension sizes: ");
    let sizes: Vec<String> = file
        .dimensions()
        .map(|d| format!("{}={}", d.name(), d.len()))
        .collect();
    diag.push_str(&sizes.join(", "));
    diag
}

/// Parse a gridded binary container into points.
///
/// `field` is the explicit value-variable override used by field switching;
/// when present it bypasses value-variable auto-detection entirely.
pub(crate) fn parse_grid(
    data: &Bytes,
    file_name: &str,
    field: Option<&str>,
    cache: &RawSourceCache,
    progress: &dyn ProgressSink,
) -> IngestResult<Extraction> {
    progress.report(5, "opening grid container");

    let staged = stage_bytes(data, ".nc")?;
    let file = netcdf::open(staged.path())
        .map_err(|e| IngestError::MalformedInput(format!("not a readable grid container: {}", e)))?;

    progress.report(10, "container structure parsed");

    let variable_names: Vec<String> = file.variables().map(|v| v.name()).collect();

    let lat_var = find_variable(&file, LAT_VARIABLES);
    let lon_var = find_variable(&file, LON_VARIABLES);
    let (lat_var, lon_var) = match (lat_var, lon_var) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => {
            return Err(IngestError::CoordinateVariablesNotFound {
                variables: variable_names,
            });
        }
    };
    let lat_name = lat_var.name();
    let lon_name = lon_var.name();

    // Every non-excluded variable with grid rank stays selectable for
    // field switching, in file order.
    let mut candidate_fields: Vec<String> = file
        .variables()
        .filter(|v| !is_excluded(&v.name()) && v.dimensions().len() >= 2)
        .map(|v| v.name())
        .collect();

    let value_var = match field {
        Some(name) => file.variable(name).ok_or_else(|| IngestError::UnknownField {
            field: name.to_string(),
            available: candidate_fields.clone(),
        })?,
        None => select_value_variable(&file, var_len(&lat_var), var_len(&lon_var))
            .ok_or_else(|| IngestError::ValueVariableNotFound(variable_diagnostics(&file)))?,
    };
    let value_name = value_var.name();
    if !candidate_fields.iter().any(|f| f == &value_name) {
        candidate_fields.insert(0, value_name.clone());
    }

    progress.report(20, "variables detected");
    debug!(
        file = file_name,
        lat = %lat_name,
        lon = %lon_name,
        value = %value_name,
        "Detected grid variables"
    );

    let lats = read_values(&lat_var)?;
    let lons = read_values(&lon_var)?;
    let values = read_values(&value_var)?;
    let declared_rank = value_var.dimensions().len();
    let (nlat, nlon) = (lats.len(), lons.len());

    progress.report(30, "extraction started");

    let mut points = Vec::new();
    let mut missing = 0usize;
    let mut access_errors = 0usize;

    // Already point-based: equal-length 1-D lat/lon/value triples need a
    // direct zip, not a Cartesian traversal.
    let pattern_label;
    if declared_rank <= 1 && nlat == nlon && values.len() == nlat {
        pattern_label = "point triples";
        for i in 0..nlat {
            let value = values[i];
            if value.is_nan() || value.abs() >= FILL_THRESHOLD {
                missing += 1;
                continue;
            }
            match Point::checked(lats[i], lons[i], value) {
                Some(point) => points.push(point),
                None => missing += 1,
            }
        }
    } else {
        let rank = effective_rank(declared_rank, values.len(), nlat, nlon);
        let access = resolve_access(rank, values.len(), nlat, nlon).ok_or_else(|| {
            IngestError::NoValidGridPoints(format!(
                "no access pattern fits: lat_count={}, lon_count={}, value_count={}, declared_rank={}",
                nlat,
                nlon,
                values.len(),
                declared_rank
            ))
        })?;
        pattern_label = access.label();
        debug!(
            rank = rank,
            pattern = pattern_label,
            "Resolved grid access pattern"
        );

        let total_cells = nlat * nlon;
        let mut processed = 0usize;
        for lat_idx in 0..nlat {
            for lon_idx in 0..nlon {
                processed += 1;
                if processed % 10_000 == 0 {
                    let percent = 30 + (processed * 60 / total_cells) as u8;
                    progress.report(percent, "extracting grid cells");
                }

                let Some(&value) = values.get(access.index(lat_idx, lon_idx, nlon)) else {
                    access_errors += 1;
                    if access_errors <= 3 {
                        debug!(
                            lat_idx = lat_idx,
                            lon_idx = lon_idx,
                            "Grid cell access out of bounds"
                        );
                    }
                    continue;
                };
                if value.is_nan() || value.abs() >= FILL_THRESHOLD {
                    missing += 1;
                    continue;
                }
                match Point::checked(lats[lat_idx], lons[lon_idx], value) {
                    Some(point) => points.push(point),
                    None => missing += 1,
                }
            }
        }
    }

    if points.is_empty() {
        return Err(IngestError::NoValidGridPoints(format!(
            "pattern {}: lat_count={}, lon_count={}, value_count={}, missing={}, access_errors={}",
            pattern_label,
            nlat,
            nlon,
            values.len(),
            missing,
            access_errors
        )));
    }
    if missing > 0 || access_errors > 0 {
        warn!(
            missing = missing,
            access_errors = access_errors,
            "Skipped grid cells during extraction"
        );
    }

    info!(
        file = file_name,
        points = points.len(),
        pattern = pattern_label,
        value = %value_name,
        "Extracted grid points"
    );

    cache.insert(
        file_name,
        RawSourceRecord {
            bytes: data.clone(),
            kind: SourceKind::Grid,
            records: Vec::new(),
            lat_field: lat_name,
            lon_field: lon_name,
            candidate_fields: candidate_fields.clone(),
        },
    );

    Ok(Extraction {
        points,
        fields: candidate_fields,
        selected_field: value_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_excluded() {
        assert!(is_excluded("lat"));
        assert!(is_excluded("NAV_LON"));
        assert!(is_excluded("time"));
        assert!(is_excluded("depth_bnds"));
        assert!(!is_excluded("sst"));
        assert!(!is_excluded("chlorophyll"));
    }

    #[test]
    fn test_effective_rank_trusts_declared() {
        assert_eq!(effective_rank(3, 24, 2, 3), 3);
        assert_eq!(effective_rank(2, 6, 2, 3), 2);
    }

    #[test]
    fn test_effective_rank_infers_from_length() {
        // Declared rank 0/1 but the buffer is a full grid (or several
        // stacked slices of one).
        assert_eq!(effective_rank(1, 6, 2, 3), 2);
        assert_eq!(effective_rank(0, 12, 2, 3), 3);
        assert_eq!(effective_rank(1, 5, 2, 3), 1);
    }

    #[test]
    fn test_resolve_access_by_rank() {
        assert_eq!(resolve_access(2, 6, 2, 3), Some(GridAccess::LatLon));
        assert_eq!(resolve_access(3, 12, 2, 3), Some(GridAccess::SliceLatLon));
        assert_eq!(
            resolve_access(4, 24, 2, 3),
            Some(GridAccess::TimeDepthLatLon)
        );
        assert_eq!(resolve_access(1, 6, 2, 3), Some(GridAccess::Flat));
    }

    #[test]
    fn test_resolve_access_falls_back_on_bad_rank() {
        // Declared rank 1 but the buffer holds stacked slices.
        assert_eq!(resolve_access(1, 12, 2, 3), Some(GridAccess::SliceLatLon));
        // Rank outside the supported range resolves by length alone.
        assert_eq!(resolve_access(5, 6, 2, 3), Some(GridAccess::LatLon));
        // Nothing fits.
        assert_eq!(resolve_access(2, 7, 2, 3), None);
        assert_eq!(resolve_access(2, 6, 0, 3), None);
    }

    #[test]
    fn test_access_index_is_row_major() {
        assert_eq!(GridAccess::LatLon.index(1, 2, 3), 5);
        assert_eq!(GridAccess::Flat.index(0, 0, 3), 0);
    }
}

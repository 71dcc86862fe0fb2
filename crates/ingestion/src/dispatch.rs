//! Format dispatch and dataset assembly.

use std::path::Path;

use bytes::Bytes;
use geo_common::{Dataset, IngestError, IngestResult, ProgressSink};
use tracing::info;

use crate::cache::RawSourceCache;
use crate::decimate::decimate;
use crate::{grid, hierarchical, structured, tabular};

/// Decimation ceiling for text-class sources (tabular, structured).
pub const DEFAULT_TEXT_MAX_POINTS: usize = 100_000;
/// Decimation ceiling for grid-class sources (grid, hierarchical), which
/// produce denser point clouds for the same rendering budget.
pub const DEFAULT_GRID_MAX_POINTS: usize = 50_000;

/// Source family detected from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Delimited text with a header row (.csv, .txt)
    Tabular,
    /// Nested structured records (.json, .geojson)
    Structured,
    /// Gridded multi-dimensional binary container (.nc)
    Grid,
    /// Hierarchical binary container (.hdf, .hdf5, .h5)
    Hierarchical,
}

impl SourceFormat {
    fn default_max_points(self) -> usize {
        match self {
            Self::Tabular | Self::Structured => DEFAULT_TEXT_MAX_POINTS,
            Self::Grid | Self::Hierarchical => DEFAULT_GRID_MAX_POINTS,
        }
    }
}

/// Detect the source format from a file name's extension, case-insensitive.
pub fn detect_source_format(file_name: &str) -> Option<SourceFormat> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())?
        .to_lowercase();

    match ext.as_str() {
        "csv" | "txt" => Some(SourceFormat::Tabular),
        "json" | "geojson" => Some(SourceFormat::Structured),
        "nc" => Some(SourceFormat::Grid),
        "hdf" | "hdf5" | "h5" => Some(SourceFormat::Hierarchical),
        _ => None,
    }
}

/// Options recognized by every parser entry point.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Decimation ceiling override. Defaults to 100 000 for text-class
    /// sources and 50 000 for grid-class sources.
    pub max_points: Option<usize>,
    /// Explicit value-variable name for grid sources, bypassing value
    /// auto-detection.
    pub field: Option<String>,
}

/// Parse a file into a normalized [`Dataset`].
///
/// Routes to exactly one parser by extension, then assembles the result:
/// decimates to the configured ceiling, computes the value range, and
/// attaches the detected fields. A failed parse never produces a dataset.
///
/// Tabular and structured parses register their raw records in `cache`
/// (keyed by `file_name`) so the field switcher can re-derive the dataset
/// without re-reading the file; grid parses register the original bytes.
pub fn parse_dataset(
    data: Bytes,
    file_name: &str,
    cache: &RawSourceCache,
    options: &ParseOptions,
    progress: &dyn ProgressSink,
) -> IngestResult<Dataset> {
    if data.is_empty() {
        return Err(IngestError::EmptyInput);
    }
    let format = detect_source_format(file_name)
        .ok_or_else(|| IngestError::UnsupportedFormat(file_name.to_string()))?;

    info!(file = file_name, format = ?format, size = data.len(), "Parsing dataset");

    let extraction = match format {
        SourceFormat::Tabular => tabular::parse_tabular(&data, file_name, cache, progress)?,
        SourceFormat::Structured => structured::parse_structured(&data, file_name, cache, progress)?,
        SourceFormat::Grid => grid::parse_grid(
            &data,
            file_name,
            options.field.as_deref(),
            cache,
            progress,
        )?,
        SourceFormat::Hierarchical => hierarchical::parse_hierarchical(&data, file_name, progress)?,
    };

    let ceiling = options.max_points.unwrap_or(format.default_max_points());
    let extracted = extraction.points.len();
    progress.report(95, "decimating");
    let points = decimate(extraction.points, ceiling);

    let dataset = Dataset::new(
        file_name,
        points,
        extraction.fields,
        extraction.selected_field,
    );
    info!(
        file = file_name,
        extracted = extracted,
        kept = dataset.points.len(),
        field = %dataset.selected_field,
        "Dataset assembled"
    );
    progress.report(100, "complete");

    Ok(dataset)
}

/// Read a file from disk and parse it. Convenience wrapper over
/// [`parse_dataset`] using the file's name as the logical dataset name.
pub fn parse_file(
    path: impl AsRef<Path>,
    cache: &RawSourceCache,
    options: &ParseOptions,
    progress: &dyn ProgressSink,
) -> IngestResult<Dataset> {
    let path = path.as_ref();
    let data = Bytes::from(std::fs::read(path)?);
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");
    parse_dataset(data, file_name, cache, options, progress)
}

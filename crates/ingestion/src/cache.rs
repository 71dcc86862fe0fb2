//! Raw source cache and field switching.
//!
//! Retains enough of each parsed source, keyed by logical file name, to
//! re-derive a `Dataset` for a different value field without re-reading
//! the file. Tabular and structured sources cache their raw records;
//! grid sources cache the original bytes and are re-parsed with an
//! explicit field override.
//!
//! The cache is an explicit owned map with a caller-driven lifecycle:
//! re-parsing a file with the same name overwrites its entry, and the
//! cache is unbounded until the caller clears it.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use bytes::Bytes;
use geo_common::{Dataset, IngestError, IngestResult, ProgressSink};
use tracing::{debug, info};

use crate::decimate::decimate;
use crate::dispatch::{DEFAULT_GRID_MAX_POINTS, DEFAULT_TEXT_MAX_POINTS};
use crate::grid;
use crate::record::extract_points;

/// An opaque parsed row/record, as assembled by the tabular or structured
/// parser.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Which parser produced a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Tabular,
    Structured,
    Grid,
}

/// Cached raw source data for one logical file name.
#[derive(Debug, Clone)]
pub struct RawSourceRecord {
    /// The original file bytes. Retained so grid sources can be re-parsed
    /// for a different field; callers must not invalidate the handle while
    /// it remains cached.
    pub bytes: Bytes,
    pub kind: SourceKind,
    /// Raw records for tabular/structured sources. Empty for grid sources.
    pub records: Vec<RawRecord>,
    /// Detected coordinate field names within `records` (or coordinate
    /// variable names for grid sources).
    pub lat_field: String,
    pub lon_field: String,
    /// Value-field names eligible for switching, in detection order.
    pub candidate_fields: Vec<String>,
}

/// Process-lifetime cache of raw source data, keyed by file name.
///
/// Access is serialized per the lock: writers are last-writer-wins and
/// readers never observe a partial entry. Entries are never evicted
/// proactively; call [`RawSourceCache::clear`] to drop them all.
#[derive(Debug, Default)]
pub struct RawSourceCache {
    inner: RwLock<HashMap<String, RawSourceRecord>>,
}

impl RawSourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or overwrite the entry for `name`.
    pub fn insert(&self, name: &str, record: RawSourceRecord) {
        debug!(
            name = name,
            kind = ?record.kind,
            records = record.records.len(),
            candidates = record.candidate_fields.len(),
            "Caching raw source data"
        );
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), record);
    }

    /// The last stored record for `name`, if any.
    pub fn get(&self, name: &str) -> Option<RawSourceRecord> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Re-derive `dataset` with `new_field` as the value selector.
    ///
    /// Tabular and structured sources re-run the same per-record extraction
    /// and validation as the original parse against the cached records, so
    /// the same rows are accepted and rejected; only the value column and
    /// `selected_field` differ. Grid sources re-invoke the grid parser on
    /// the retained bytes with the field passed as an explicit override.
    pub fn switch_dataset_field(
        &self,
        dataset: &Dataset,
        new_field: &str,
        progress: &dyn ProgressSink,
    ) -> IngestResult<Dataset> {
        let record = self
            .get(&dataset.name)
            .ok_or_else(|| IngestError::SourceNotCached(dataset.name.clone()))?;

        if !record.candidate_fields.iter().any(|f| f == new_field) {
            return Err(IngestError::UnknownField {
                field: new_field.to_string(),
                available: record.candidate_fields.clone(),
            });
        }

        info!(
            name = %dataset.name,
            from = %dataset.selected_field,
            to = new_field,
            kind = ?record.kind,
            "Switching dataset field"
        );

        let switched = match record.kind {
            SourceKind::Tabular | SourceKind::Structured => {
                progress.report(10, "re-deriving dataset from cached records");
                let (points, _skipped) = extract_points(
                    &record.records,
                    &record.lat_field,
                    &record.lon_field,
                    new_field,
                    progress,
                );
                if points.is_empty() {
                    return Err(IngestError::NoValidRecords);
                }
                let points = decimate(points, DEFAULT_TEXT_MAX_POINTS);
                Dataset::new(
                    dataset.name.clone(),
                    points,
                    record.candidate_fields.clone(),
                    new_field,
                )
            }
            SourceKind::Grid => {
                let extraction = grid::parse_grid(
                    &record.bytes,
                    &dataset.name,
                    Some(new_field),
                    self,
                    progress,
                )?;
                let points = decimate(extraction.points, DEFAULT_GRID_MAX_POINTS);
                Dataset::new(dataset.name.clone(), points, extraction.fields, new_field)
            }
        };

        progress.report(100, "field switch complete");
        Ok(switched)
    }
}

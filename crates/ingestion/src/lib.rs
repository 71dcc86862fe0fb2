//! Multi-format geospatial dataset ingestion and normalization.
//!
//! Accepts heterogeneous scientific data sources and produces the single
//! canonical in-memory representation all downstream consumers read: a
//! bounded collection of geolocated scalar observations
//! ([`geo_common::Dataset`]).
//!
//! # Architecture
//!
//! The format dispatcher routes an input file to one of four parsers by
//! extension:
//!
//! - delimited text (.csv/.txt) with header-based column detection;
//! - structured records (.json/.geojson), including the GeoJSON
//!   point-feature convention;
//! - gridded multi-dimensional containers (.nc) with coordinate/value
//!   variable auto-detection and dimensional-access fallback;
//! - hierarchical containers (.hdf/.hdf5/.h5) probed by conventional
//!   dataset paths.
//!
//! Extracted points pass through deterministic stride decimation to bound
//! memory and rendering cost regardless of source size. Tabular and
//! structured parses also register their raw records in the
//! [`RawSourceCache`], so the value field can be switched later without
//! re-reading the file; grid sources retain their bytes and are re-parsed
//! with an explicit field override instead.

pub mod cache;
pub mod decimate;
pub mod dispatch;
mod grid;
mod hierarchical;
mod record;
mod stage;
mod structured;
mod tabular;

// Re-exports
pub use cache::{RawRecord, RawSourceCache, RawSourceRecord, SourceKind};
pub use decimate::decimate;
pub use dispatch::{
    detect_source_format, parse_dataset, parse_file, ParseOptions, SourceFormat,
    DEFAULT_GRID_MAX_POINTS, DEFAULT_TEXT_MAX_POINTS,
};

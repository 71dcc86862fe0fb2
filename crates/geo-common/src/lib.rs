//! Common types shared across the geoscope ingestion workspace.

pub mod dataset;
pub mod error;
pub mod point;
pub mod progress;

pub use dataset::Dataset;
pub use error::{IngestError, IngestResult};
pub use point::{Point, ValueRange};
pub use progress::{NoProgress, ProgressSink};

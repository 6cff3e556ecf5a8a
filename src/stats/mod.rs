//! Per-stream ingest statistics

pub mod metrics;

pub use metrics::{IngestStats, IngestStatsSnapshot};

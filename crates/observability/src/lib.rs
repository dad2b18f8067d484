//! Statistics export for simulation sweeps
//!
//! This crate turns the flow statistics of a finished run into a
//! [`RunArtifact`], writes it to disk as JSON or CSV following the configured
//! naming policy, and summarizes a directory of artifacts across runs.
//!
//! # Features
//!
//! - **Flow statistics**: per-flow counters, delay and jitter sums, histograms
//! - **Exporters**: async JSON and CSV exporters behind one trait
//! - **Naming policy**: one file per run, or a single overwritten file
//! - **Summaries**: mean, median, spread and quartiles per (mobility, protocol)

pub mod artifact;
pub mod exporter;
pub mod flow;
pub mod summary;
pub mod writer;

pub use artifact::{ArtifactTotals, FlowRow, RunArtifact};
pub use exporter::{exporter_for, ArtifactExporter, CsvExporter, JsonExporter};
pub use flow::{FlowProtocol, FlowStats, HistogramBin};
pub use summary::{load_artifacts, Distribution, GroupSummary, SweepSummary};
pub use writer::{artifact_file_name, ArtifactWriter};

use std::path::PathBuf;

/// Errors that can occur while exporting or reading artifacts
#[derive(thiserror::Error, Debug)]
pub enum ObservabilityError {
    #[error("Export failed: {0}")]
    Export(String),

    #[error("Cannot access {path}: {source}")]
    Path {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for observability operations
pub type Result<T> = std::result::Result<T, ObservabilityError>;

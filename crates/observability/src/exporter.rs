//! Artifact exporters for different output formats

use crate::{FlowRow, RunArtifact, Result};
use async_trait::async_trait;
use scenarios::ArtifactFormat;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Trait for rendering run artifacts in a given format
#[async_trait]
pub trait ArtifactExporter: Send + Sync {
    fn format(&self) -> ArtifactFormat;

    async fn export(&self, artifact: &RunArtifact) -> Result<String>;

    async fn export_to_file(&self, artifact: &RunArtifact, path: &Path) -> Result<()> {
        let content = self.export(artifact).await?;
        let mut file = File::create(path).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Build the exporter for a configured format
pub fn exporter_for(format: ArtifactFormat, pretty: bool) -> Box<dyn ArtifactExporter> {
    match format {
        ArtifactFormat::Json if pretty => Box::new(JsonExporter::pretty()),
        ArtifactFormat::Json => Box::new(JsonExporter::new()),
        ArtifactFormat::Csv => Box::new(CsvExporter::new()),
    }
}

/// Exports the whole artifact, histograms included, as JSON
#[derive(Debug, Default)]
pub struct JsonExporter {
    pretty: bool,
}

impl JsonExporter {
    pub fn new() -> Self {
        Self { pretty: false }
    }

    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

#[async_trait]
impl ArtifactExporter for JsonExporter {
    fn format(&self) -> ArtifactFormat {
        ArtifactFormat::Json
    }

    async fn export(&self, artifact: &RunArtifact) -> Result<String> {
        let result = if self.pretty {
            serde_json::to_string_pretty(artifact)?
        } else {
            serde_json::to_string(artifact)?
        };
        Ok(result)
    }
}

/// Exports one row per flow
#[derive(Debug)]
pub struct CsvExporter {
    include_headers: bool,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvExporter {
    pub fn new() -> Self {
        Self {
            include_headers: true,
        }
    }

    pub fn without_headers() -> Self {
        Self {
            include_headers: false,
        }
    }
}

#[async_trait]
impl ArtifactExporter for CsvExporter {
    fn format(&self) -> ArtifactFormat {
        ArtifactFormat::Csv
    }

    async fn export(&self, artifact: &RunArtifact) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(self.include_headers)
            .from_writer(Vec::new());
        let rows = artifact.rows();
        // serialize() only emits headers alongside the first row
        if rows.is_empty() && self.include_headers {
            writer.write_record(FlowRow::HEADERS)?;
        }
        for row in rows {
            writer.serialize(row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| crate::ObservabilityError::Export(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| crate::ObservabilityError::Export(e.to_string()))
    }
}

//! Placing artifacts on disk according to the naming policy

use crate::exporter::{exporter_for, ArtifactExporter};
use crate::{ObservabilityError, Result, RunArtifact};
use scenarios::{ArtifactFormat, ArtifactPolicy, OutputSpec, RunConfig};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name used for a run under the per-run policy
pub fn artifact_file_name(run: &RunConfig, format: ArtifactFormat) -> String {
    format!("results_{}.{}", run.name(), format.extension())
}

/// Writes each run's artifact into the output directory
pub struct ArtifactWriter {
    directory: PathBuf,
    policy: ArtifactPolicy,
    exporter: Box<dyn ArtifactExporter>,
}

impl ArtifactWriter {
    pub fn new(
        directory: impl Into<PathBuf>,
        policy: ArtifactPolicy,
        exporter: Box<dyn ArtifactExporter>,
    ) -> Self {
        Self {
            directory: directory.into(),
            policy,
            exporter,
        }
    }

    pub fn from_spec(spec: &OutputSpec) -> Self {
        Self::new(
            spec.directory.clone(),
            spec.policy.clone(),
            exporter_for(spec.format, spec.pretty),
        )
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn path_for(&self, run: &RunConfig) -> PathBuf {
        match &self.policy {
            ArtifactPolicy::PerRun => self
                .directory
                .join(artifact_file_name(run, self.exporter.format())),
            ArtifactPolicy::Overwrite { file_name } => self.directory.join(file_name),
        }
    }

    /// Export the artifact and return where it landed
    pub async fn write(&self, artifact: &RunArtifact) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|source| ObservabilityError::Path {
                path: self.directory.clone(),
                source,
            })?;

        let path = self.path_for(&artifact.run);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            warn!(
                "Overwriting {} with results of {}",
                path.display(),
                artifact.run
            );
        }
        self.exporter.export_to_file(artifact, &path).await?;
        debug!("Wrote {} flows to {}", artifact.flows.len(), path.display());
        Ok(path)
    }
}

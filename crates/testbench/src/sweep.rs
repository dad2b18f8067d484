//! Sweep driver: every run of a [`SweepConfig`], in order, each on a fresh engine

use crate::bench::{run_experiment, RunOutcome};
use crate::engine::EngineFactory;
use crate::{Result, TestbenchError};
use observability::{ArtifactWriter, RunArtifact};
use scenarios::{RunConfig, SweepConfig};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// How one run of the sweep ended
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Succeeded {
        run: RunConfig,
        seed: u64,
        flows: usize,
        tx_packets: u64,
        rx_packets: u64,
        lost_packets: u64,
        /// `None` when artifacts are disabled or the export failed
        artifact: Option<PathBuf>,
        export_error: Option<String>,
    },
    Failed {
        run: RunConfig,
        error: String,
        /// The run was rejected before the engine advanced
        configuration: bool,
    },
}

impl RunStatus {
    pub fn run(&self) -> &RunConfig {
        match self {
            RunStatus::Succeeded { run, .. } | RunStatus::Failed { run, .. } => run,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Succeeded { .. })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SweepReport {
    pub runs: Vec<RunStatus>,
}

impl SweepReport {
    pub fn succeeded(&self) -> usize {
        self.runs.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.runs.len() - self.succeeded()
    }

    pub fn all_failed(&self) -> bool {
        !self.runs.is_empty() && self.succeeded() == 0
    }
}

pub struct SweepDriver {
    config: SweepConfig,
    factory: Arc<dyn EngineFactory>,
    writer: Option<ArtifactWriter>,
}

impl SweepDriver {
    /// Driver writing artifacts as configured in `config.output`
    pub fn new(config: SweepConfig, factory: Arc<dyn EngineFactory>) -> Self {
        let writer = ArtifactWriter::from_spec(&config.output);
        Self {
            config,
            factory,
            writer: Some(writer),
        }
    }

    /// Keep results in the report only
    pub fn without_artifacts(mut self) -> Self {
        self.writer = None;
        self
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Execute every run sequentially.
    ///
    /// An invalid sweep is refused as a whole. Once runs start, a failed run
    /// is logged and recorded and the sweep moves on to the next one.
    pub async fn run(&self) -> Result<SweepReport> {
        self.config.validate()?;
        let runs = self.config.runs();
        info!("Starting sweep of {} runs", runs.len());

        let mut report = SweepReport::default();
        for run in runs {
            info!("Running simulation with {}", run);
            let status = match self.execute(run).await {
                Ok(outcome) => self.record(outcome).await,
                Err(e) => {
                    error!("Run {} failed: {}", run.name(), e);
                    RunStatus::Failed {
                        run,
                        error: e.to_string(),
                        configuration: e.is_configuration_error(),
                    }
                }
            };
            report.runs.push(status);
        }

        info!(
            "Sweep finished: {} succeeded, {} failed",
            report.succeeded(),
            report.failed()
        );
        Ok(report)
    }

    /// Run on a blocking thread; the engine is synchronous
    async fn execute(&self, run: RunConfig) -> Result<RunOutcome> {
        let factory = Arc::clone(&self.factory);
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || run_experiment(factory.as_ref(), &config, &run))
            .await
            .map_err(|e| TestbenchError::Engine(format!("run task failed: {}", e)))?
    }

    async fn record(&self, outcome: RunOutcome) -> RunStatus {
        let artifact = outcome.artifact();
        let (path, export_error) = match &self.writer {
            Some(writer) => match write_artifact(writer, &artifact).await {
                Ok(path) => (Some(path), None),
                Err(e) => {
                    warn!("Could not write artifact for {}: {}", outcome.run.name(), e);
                    (None, Some(e.to_string()))
                }
            },
            None => (None, None),
        };
        let totals = artifact.totals();
        RunStatus::Succeeded {
            run: outcome.run,
            seed: outcome.seed,
            flows: totals.flows,
            tx_packets: totals.tx_packets,
            rx_packets: totals.rx_packets,
            lost_packets: totals.lost_packets,
            artifact: path,
            export_error,
        }
    }
}

async fn write_artifact(writer: &ArtifactWriter, artifact: &RunArtifact) -> Result<PathBuf> {
    Ok(writer.write(artifact).await?)
}

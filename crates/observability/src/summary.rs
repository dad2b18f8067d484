//! Cross-run statistics over a directory of artifacts
//!
//! Flows are grouped by (mobility, protocol mode) across all client counts.
//! Per-flow mean delay and mean jitter only count flows that received
//! something; loss rate counts every flow.

use crate::{ObservabilityError, Result, RunArtifact};
use scenarios::ProtocolMode;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// Descriptive statistics of a sample
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Distribution {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// Coefficient of variation in percent; `None` when the mean is zero
    pub cv_percent: Option<f64>,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
}

impl Distribution {
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = sorted.len() as f64;
        let mean = sorted.iter().sum::<f64>() / n;
        let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();
        let p50 = percentile(&sorted, 50.0);

        Some(Self {
            count: sorted.len(),
            mean,
            median: p50,
            std_dev,
            cv_percent: (mean != 0.0).then(|| std_dev / mean * 100.0),
            p25: percentile(&sorted, 25.0),
            p50,
            p75: percentile(&sorted, 75.0),
        })
    }
}

/// Linear interpolation between closest ranks over sorted data
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// Statistics for one (mobility, protocol) group
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupSummary {
    pub mobility_enabled: bool,
    pub protocol: ProtocolMode,
    pub runs: usize,
    pub flows: usize,
    pub delay_s: Option<Distribution>,
    pub jitter_s: Option<Distribution>,
    pub loss_rate: Option<Distribution>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SweepSummary {
    pub groups: Vec<GroupSummary>,
}

impl SweepSummary {
    pub fn from_artifacts(artifacts: &[RunArtifact]) -> Self {
        #[derive(Default)]
        struct Samples {
            runs: usize,
            flows: usize,
            delays: Vec<f64>,
            jitters: Vec<f64>,
            losses: Vec<f64>,
        }

        let mut groups: BTreeMap<(bool, ProtocolMode), Samples> = BTreeMap::new();
        for artifact in artifacts {
            let entry = groups
                .entry((artifact.run.mobility_enabled, artifact.run.protocol))
                .or_default();
            entry.runs += 1;
            for flow in &artifact.flows {
                entry.flows += 1;
                entry.delays.extend(flow.mean_delay_s());
                entry.jitters.extend(flow.mean_jitter_s());
                entry.losses.push(flow.loss_rate());
            }
        }

        let groups = groups
            .into_iter()
            .map(|((mobility_enabled, protocol), s)| GroupSummary {
                mobility_enabled,
                protocol,
                runs: s.runs,
                flows: s.flows,
                delay_s: Distribution::from_samples(&s.delays),
                jitter_s: Distribution::from_samples(&s.jitters),
                loss_rate: Distribution::from_samples(&s.losses),
            })
            .collect();
        Self { groups }
    }

    /// Load every `.json` and `.csv` artifact in `dir` and summarize them
    pub async fn from_directory(dir: &Path) -> Result<Self> {
        let artifacts = load_artifacts(dir).await?;
        Ok(Self::from_artifacts(&artifacts))
    }
}

/// Read all artifacts in a directory; unreadable files are skipped with a warning
pub async fn load_artifacts(dir: &Path) -> Result<Vec<RunArtifact>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|source| ObservabilityError::Path {
            path: dir.to_path_buf(),
            source,
        })?;

    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        paths.push(entry.path());
    }
    paths.sort();

    let mut artifacts = Vec::new();
    for path in paths {
        let parsed = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => read_artifact_file(&path)
                .await
                .and_then(|content| RunArtifact::from_json_str(&content).map(|a| vec![a])),
            Some("csv") => read_artifact_file(&path)
                .await
                .and_then(|content| RunArtifact::from_csv_str(&content)),
            _ => continue,
        };
        match parsed {
            Ok(found) => {
                debug!("Loaded {} run(s) from {}", found.len(), path.display());
                artifacts.extend(found);
            }
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }
    Ok(artifacts)
}

async fn read_artifact_file(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ObservabilityError::Path {
            path: path.to_path_buf(),
            source,
        })
}

fn fmt_dist(f: &mut fmt::Formatter<'_>, name: &str, dist: &Option<Distribution>) -> fmt::Result {
    match dist {
        Some(d) => writeln!(
            f,
            "  {:<10} n={:<5} mean={:.6} median={:.6} std={:.6} cv={} p25={:.6} p75={:.6}",
            name,
            d.count,
            d.mean,
            d.median,
            d.std_dev,
            d.cv_percent
                .map_or_else(|| "-".to_string(), |cv| format!("{cv:.1}%")),
            d.p25,
            d.p75
        ),
        None => writeln!(f, "  {name:<10} no samples"),
    }
}

impl fmt::Display for SweepSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for group in &self.groups {
            writeln!(
                f,
                "{} / {} ({} runs, {} flows)",
                if group.mobility_enabled { "mobile" } else { "static" },
                group.protocol,
                group.runs,
                group.flows
            )?;
            fmt_dist(f, "delay_s", &group.delay_s)?;
            fmt_dist(f, "jitter_s", &group.jitter_s)?;
            fmt_dist(f, "loss_rate", &group.loss_rate)?;
        }
        Ok(())
    }
}

//! CLI command implementations
//!
//! Kept apart from main.rs so option handling can be unit tested.

use anyhow::{bail, Context, Result};
use observability::SweepSummary;
use scenarios::{
    ArtifactFormat, ArtifactPolicy, Presets, ProtocolMode, RunConfig, SweepConfig,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use testbench::{NetworkSimFactory, RunStatus, SweepDriver, SweepReport};
use tracing::{error, info};

/// Options of the 'run' command
#[derive(Debug, Default)]
pub struct RunOptions {
    pub clients: u32,
    pub mobility: bool,
    pub protocol: String,
    pub output_dir: Option<PathBuf>,
    pub format: Option<String>,
    pub seed: Option<u64>,
}

/// Options of the 'sweep' command
#[derive(Debug, Default)]
pub struct SweepOptions {
    pub config: Option<PathBuf>,
    pub preset: Option<String>,
    pub clients: Vec<u32>,
    pub protocols: Vec<String>,
    pub mobility: Vec<String>,
    pub overwrite: Option<String>,
    pub report: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub format: Option<String>,
    pub seed: Option<u64>,
}

/// Implementation of the 'list' command - prints the run matrix
pub fn cmd_list(config: Option<PathBuf>, preset: Option<String>) -> Result<()> {
    let sweep = load_sweep(config.as_deref(), preset.as_deref())?;

    println!("Sweep runs ({}):", sweep.run_count());
    println!("==================");
    println!("  {:>3}  {:>7}  {:<8}  {:<8}", "#", "clients", "mobility", "protocol");
    for (i, run) in sweep.runs().iter().enumerate() {
        println!(
            "  {:>3}  {:>7}  {:<8}  {:<8}",
            i + 1,
            run.client_count,
            run.mobility_slug(),
            run.protocol
        );
    }
    println!("\nPresets: {}", Presets::names().join(", "));

    Ok(())
}

/// Implementation of the 'run' command - executes a single run
pub async fn cmd_run(options: RunOptions) -> Result<()> {
    let protocol: ProtocolMode = options.protocol.parse()?;
    let run = RunConfig::new(options.clients, options.mobility, protocol);
    run.validate()?;

    let mut sweep = Presets::single(run);
    apply_output(
        &mut sweep,
        options.output_dir,
        options.format.as_deref(),
        options.seed,
    )?;

    let report = SweepDriver::new(sweep, Arc::new(NetworkSimFactory))
        .run()
        .await?;
    print_report(&report);

    match report.runs.first() {
        Some(RunStatus::Failed { error, .. }) => bail!("Run {} failed: {}", run.name(), error),
        _ => Ok(()),
    }
}

/// Implementation of the 'sweep' command - runs every (filtered) sweep point
pub async fn cmd_sweep(options: SweepOptions) -> Result<()> {
    let mut sweep = load_sweep(options.config.as_deref(), options.preset.as_deref())?;

    let protocols = options
        .protocols
        .iter()
        .map(|p| p.parse::<ProtocolMode>())
        .collect::<Result<Vec<_>, _>>()?;
    let mobility = options
        .mobility
        .iter()
        .map(|m| parse_mobility(m))
        .collect::<Result<Vec<_>>>()?;
    sweep.restrict(&options.clients, &mobility, &protocols);

    apply_output(
        &mut sweep,
        options.output_dir,
        options.format.as_deref(),
        options.seed,
    )?;
    if let Some(file_name) = options.overwrite {
        sweep.output.policy = ArtifactPolicy::Overwrite { file_name };
    }

    let report = SweepDriver::new(sweep, Arc::new(NetworkSimFactory))
        .run()
        .await?;
    print_report(&report);

    if let Some(path) = options.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    if report.all_failed() {
        error!("Every run of the sweep failed");
        bail!("All {} runs failed", report.runs.len());
    }
    Ok(())
}

/// Implementation of the 'summarize' command - statistics per (mobility, protocol)
pub async fn cmd_summarize(dir: PathBuf, json: bool) -> Result<()> {
    let summary = SweepSummary::from_directory(&dir)
        .await
        .with_context(|| format!("Failed to summarize {}", dir.display()))?;
    if summary.groups.is_empty() {
        bail!("No artifacts found in {}", dir.display());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", summary);
    }
    Ok(())
}

/// Sweep from a file, a preset name, or the full default matrix
fn load_sweep(config: Option<&Path>, preset: Option<&str>) -> Result<SweepConfig> {
    match (config, preset) {
        (Some(path), _) => Ok(SweepConfig::from_file(path)?),
        (None, Some(name)) => Presets::by_name(name).with_context(|| {
            format!(
                "Unknown preset: {} (available: {})",
                name,
                Presets::names().join(", ")
            )
        }),
        (None, None) => Ok(Presets::full_sweep()),
    }
}

fn apply_output(
    sweep: &mut SweepConfig,
    output_dir: Option<PathBuf>,
    format: Option<&str>,
    seed: Option<u64>,
) -> Result<()> {
    if let Some(dir) = output_dir {
        sweep.output.directory = dir;
    }
    if let Some(format) = format {
        sweep.output.format = format.parse::<ArtifactFormat>()?;
    }
    if let Some(seed) = seed {
        sweep.base_seed = seed;
    }
    Ok(())
}

fn parse_mobility(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "mobile" => Ok(true),
        "off" | "false" | "static" => Ok(false),
        other => bail!("Unknown mobility mode: {} (expected off or on)", other),
    }
}

fn print_report(report: &SweepReport) {
    for status in &report.runs {
        match status {
            RunStatus::Succeeded {
                run,
                flows,
                tx_packets,
                rx_packets,
                lost_packets,
                artifact,
                export_error,
                ..
            } => {
                let target = match (artifact, export_error) {
                    (Some(path), _) => path.display().to_string(),
                    (None, Some(e)) => format!("not written ({})", e),
                    (None, None) => "not written".to_string(),
                };
                println!(
                    "{:<24} ok     flows={:<4} tx={:<7} rx={:<7} lost={:<6} -> {}",
                    run.name(),
                    flows,
                    tx_packets,
                    rx_packets,
                    lost_packets,
                    target
                );
            }
            RunStatus::Failed { run, error, .. } => {
                println!("{:<24} FAILED {}", run.name(), error);
            }
        }
    }
    println!(
        "{} of {} runs succeeded",
        report.succeeded(),
        report.runs.len()
    );
}

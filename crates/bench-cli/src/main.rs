//! Wireless sweep CLI
//!
//! Lists, runs and summarizes simulation sweeps: one server behind an
//! access point serving N wireless clients, swept over client count,
//! mobility and protocol mode.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use commands::{cmd_list, cmd_run, cmd_summarize, cmd_sweep, RunOptions, SweepOptions};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Where and how artifacts are written
#[derive(Args, Debug, Default)]
struct OutputArgs {
    /// Directory receiving one artifact per run
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Artifact format (json or csv)
    #[arg(long)]
    format: Option<String>,

    /// Base seed mixed into every run's seed
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the runs of a sweep in execution order
    List {
        /// Sweep file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Preset sweep name (full, static, smoke, udp)
        #[arg(long, conflicts_with = "config")]
        preset: Option<String>,
    },

    /// Run a single simulation
    Run {
        /// Number of wireless clients
        #[arg(long)]
        clients: u32,

        /// Put every node on a random walk
        #[arg(long)]
        mobility: bool,

        /// Protocol mode (udp, tcp or mixed)
        #[arg(long, default_value = "udp")]
        protocol: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Run a sweep, optionally filtered
    Sweep {
        /// Sweep file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Preset sweep name (full, static, smoke, udp)
        #[arg(long, conflicts_with = "config")]
        preset: Option<String>,

        /// Only these client counts
        #[arg(long, value_delimiter = ',')]
        clients: Vec<u32>,

        /// Only these protocol modes
        #[arg(long, value_delimiter = ',')]
        protocols: Vec<String>,

        /// Only these mobility modes (off, on)
        #[arg(long, value_delimiter = ',')]
        mobility: Vec<String>,

        /// Write every run to this one file instead of one file per run
        #[arg(long)]
        overwrite: Option<String>,

        /// Also write the sweep report as JSON
        #[arg(long)]
        report: Option<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Summarize the artifacts in a directory
    Summarize {
        /// Directory holding artifacts
        dir: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::List { config, preset } => {
            cmd_list(config, preset)?;
        }
        Commands::Run {
            clients,
            mobility,
            protocol,
            output,
        } => {
            cmd_run(RunOptions {
                clients,
                mobility,
                protocol,
                output_dir: output.output_dir,
                format: output.format,
                seed: output.seed,
            })
            .await?;
        }
        Commands::Sweep {
            config,
            preset,
            clients,
            protocols,
            mobility,
            overwrite,
            report,
            output,
        } => {
            cmd_sweep(SweepOptions {
                config,
                preset,
                clients,
                protocols,
                mobility,
                overwrite,
                report,
                output_dir: output.output_dir,
                format: output.format,
                seed: output.seed,
            })
            .await?;
        }
        Commands::Summarize { dir, json } => {
            cmd_summarize(dir, json).await?;
        }
    }

    Ok(())
}

//! Experiment definitions for the wireless sweep harness
//!
//! This crate provides the data model shared by the engine adapter, the
//! exporters and the CLI: protocol modes, run identities, the sweep matrix
//! and every parameter a run is built from (links, wireless cell,
//! addressing, mobility, traffic, schedule, output).

pub mod builder;
pub mod link;
pub mod mobility;
pub mod output;
pub mod presets;
pub mod protocol;
pub mod run;
pub mod schedule;
pub mod sweep;
pub mod traffic;

pub use builder::SweepBuilder;
pub use link::{AddressingSpec, PointToPointSpec, WifiSpec};
pub use mobility::{MobilityPlan, MobilityPolicy, MotionKind, NodeRole, Rectangle, RoleOverrides};
pub use output::{ArtifactFormat, ArtifactPolicy, OutputSpec};
pub use presets::Presets;
pub use protocol::ProtocolMode;
pub use run::RunConfig;
pub use schedule::{RunSchedule, ScheduleWindow};
pub use sweep::SweepConfig;
pub use traffic::{BulkParams, EchoParams, TrafficSpec};

use std::path::PathBuf;
use thiserror::Error;

/// Errors in an experiment definition
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("A run needs at least one client")]
    NoClients,

    #[error("Unknown protocol mode: {0}")]
    UnknownProtocol(String),

    #[error("Unknown artifact format: {0}")]
    UnknownFormat(String),

    #[error("Sweep dimension '{0}' is empty")]
    EmptyDimension(&'static str),

    #[error("Sweep lists the same value twice in one dimension")]
    DuplicateRun,

    #[error("Invalid mobility configuration: {0}")]
    InvalidMobility(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Invalid traffic configuration: {0}")]
    InvalidTraffic(String),

    #[error("Cannot read sweep file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid sweep file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialize a `Duration` as fractional seconds
pub(crate) mod serde_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(serde::de::Error::custom(format!("invalid duration: {}", secs)));
        }
        Ok(Duration::from_nanos((secs * 1e9).round() as u64))
    }
}

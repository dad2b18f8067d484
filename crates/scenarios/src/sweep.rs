//! Sweep configuration: the matrix of runs and the parameters shared by all of them

use crate::link::{AddressingSpec, PointToPointSpec, WifiSpec};
use crate::mobility::MobilityPlan;
use crate::output::OutputSpec;
use crate::protocol::ProtocolMode;
use crate::run::RunConfig;
use crate::schedule::RunSchedule;
use crate::traffic::TrafficSpec;
use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Client counts swept by default
pub const DEFAULT_CLIENT_COUNTS: [u32; 6] = [1, 2, 4, 8, 16, 32];
/// Mobility modes swept by default
pub const DEFAULT_MOBILITY_MODES: [bool; 2] = [false, true];

/// Complete description of a sweep.
///
/// Every field has a default, so a JSON sweep file only needs to name what
/// it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub client_counts: Vec<u32>,
    pub mobility_modes: Vec<bool>,
    pub protocols: Vec<ProtocolMode>,
    pub base_seed: u64,
    pub schedule: RunSchedule,
    pub traffic: TrafficSpec,
    pub link: PointToPointSpec,
    pub wifi: WifiSpec,
    pub addressing: AddressingSpec,
    pub mobility: MobilityPlan,
    pub output: OutputSpec,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            client_counts: DEFAULT_CLIENT_COUNTS.to_vec(),
            mobility_modes: DEFAULT_MOBILITY_MODES.to_vec(),
            protocols: ProtocolMode::ALL.to_vec(),
            base_seed: 1,
            schedule: RunSchedule::default(),
            traffic: TrafficSpec::default(),
            link: PointToPointSpec::default(),
            wifi: WifiSpec::default(),
            addressing: AddressingSpec::default(),
            mobility: MobilityPlan::default(),
            output: OutputSpec::default(),
        }
    }
}

impl SweepConfig {
    /// Load a sweep from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: SweepConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// All runs in execution order: mobility, then protocol, then client count
    pub fn runs(&self) -> Vec<RunConfig> {
        let mut runs =
            Vec::with_capacity(self.mobility_modes.len() * self.protocols.len() * self.client_counts.len());
        for &mobility in &self.mobility_modes {
            for &protocol in &self.protocols {
                for &clients in &self.client_counts {
                    runs.push(RunConfig::new(clients, mobility, protocol));
                }
            }
        }
        runs
    }

    pub fn run_count(&self) -> usize {
        self.mobility_modes.len() * self.protocols.len() * self.client_counts.len()
    }

    /// Keep only the listed values of each non-empty filter, preserving order
    pub fn restrict(
        &mut self,
        client_counts: &[u32],
        mobility_modes: &[bool],
        protocols: &[ProtocolMode],
    ) {
        if !client_counts.is_empty() {
            self.client_counts.retain(|c| client_counts.contains(c));
        }
        if !mobility_modes.is_empty() {
            self.mobility_modes.retain(|m| mobility_modes.contains(m));
        }
        if !protocols.is_empty() {
            self.protocols.retain(|p| protocols.contains(p));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client_counts.is_empty() {
            return Err(ConfigError::EmptyDimension("client_counts"));
        }
        if self.mobility_modes.is_empty() {
            return Err(ConfigError::EmptyDimension("mobility_modes"));
        }
        if self.protocols.is_empty() {
            return Err(ConfigError::EmptyDimension("protocols"));
        }
        if has_duplicates(&self.client_counts)
            || has_duplicates(&self.mobility_modes)
            || has_duplicates(&self.protocols)
        {
            return Err(ConfigError::DuplicateRun);
        }
        self.schedule.validate()?;
        self.mobility.validate()?;
        self.traffic.validate()?;
        Ok(())
    }
}

fn has_duplicates<T: PartialEq>(values: &[T]) -> bool {
    values
        .iter()
        .enumerate()
        .any(|(i, v)| values[i + 1..].contains(v))
}

//! Builder pattern for creating custom sweeps
//!
//! This module provides SweepBuilder for constructing SweepConfig
//! instances with a fluent API.

use crate::mobility::{MotionKind, NodeRole};
use crate::output::{ArtifactFormat, ArtifactPolicy};
use crate::protocol::ProtocolMode;
use crate::schedule::RunSchedule;
use crate::sweep::SweepConfig;
use crate::ConfigError;
use std::path::PathBuf;

/// Sweep builder for creating custom sweeps
pub struct SweepBuilder {
    config: SweepConfig,
}

impl SweepBuilder {
    pub fn new() -> Self {
        Self {
            config: SweepConfig::default(),
        }
    }

    pub fn client_counts(mut self, counts: impl Into<Vec<u32>>) -> Self {
        self.config.client_counts = counts.into();
        self
    }

    pub fn mobility_modes(mut self, modes: impl Into<Vec<bool>>) -> Self {
        self.config.mobility_modes = modes.into();
        self
    }

    pub fn protocols(mut self, protocols: impl Into<Vec<ProtocolMode>>) -> Self {
        self.config.protocols = protocols.into();
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.base_seed = seed;
        self
    }

    pub fn schedule(mut self, schedule: RunSchedule) -> Self {
        self.config.schedule = schedule;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output.directory = dir.into();
        self
    }

    pub fn format(mut self, format: ArtifactFormat) -> Self {
        self.config.output.format = format;
        self
    }

    pub fn artifact_policy(mut self, policy: ArtifactPolicy) -> Self {
        self.config.output.policy = policy;
        self
    }

    /// Override the motion kind of one role regardless of the run's mobility flag
    pub fn pin_role(mut self, role: NodeRole, kind: MotionKind) -> Self {
        let overrides = &mut self.config.mobility.overrides;
        match role {
            NodeRole::Server => overrides.server = Some(kind),
            NodeRole::AccessPoint => overrides.access_point = Some(kind),
            NodeRole::Client => overrides.clients = Some(kind),
        }
        self
    }

    pub fn build(self) -> Result<SweepConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for SweepBuilder {
    fn default() -> Self {
        Self::new()
    }
}

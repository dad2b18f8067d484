//! Experiment harness for wireless + wired network sweeps
//!
//! This crate assembles a three-tier network (one server, one access point,
//! N wireless clients) on top of a [`SimulationEngine`], attaches traffic
//! generators according to a protocol mode, runs the engine to a fixed
//! deadline and exports per-flow statistics. [`SweepDriver`] repeats this for
//! every point of a [`SweepConfig`], each run on a fresh engine instance.

pub mod addr;
pub mod bench;
pub mod engine;
pub mod mobility;
pub mod schedule;
pub mod sweep;
pub mod topology;
pub mod traffic;

pub use addr::AddressPlan;
pub use bench::{run_experiment, RunContext, RunOutcome};
pub use engine::{
    AppHandle, DeviceHandle, EngineFactory, NetworkSimEngine, NetworkSimFactory, NodeHandle,
    SimulationEngine, WifiDevices,
};
pub use mobility::{MobilityAssignment, MobilityConfigurator};
pub use schedule::{RunScheduler, ScheduledApp};
pub use scenarios::{ProtocolMode, RunConfig, SweepConfig};
pub use sweep::{RunStatus, SweepDriver, SweepReport};
pub use topology::{NodeRecord, Topology, TopologyBuilder};
pub use traffic::{InstalledTraffic, TrafficPlan, TrafficRole};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TestbenchError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] scenarios::ConfigError),

    #[error("Address configuration error: {0}")]
    Addressing(String),

    #[error("Simulation engine error: {0}")]
    Engine(String),

    #[error("Export failed: {0}")]
    Export(#[from] observability::ObservabilityError),
}

impl TestbenchError {
    /// Configuration problems stop a run before the engine is touched
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, TestbenchError::Config(_) | TestbenchError::Addressing(_))
    }
}

impl From<network_sim::SimError> for TestbenchError {
    fn from(e: network_sim::SimError) -> Self {
        TestbenchError::Engine(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TestbenchError>;

//! Discrete-event simulation of small wired + wireless networks
//!
//! The simulator models nodes joined by point-to-point links and shared
//! wifi cells, moves nodes around under a mobility model, runs UDP echo and
//! TCP bulk applications between them, and records per-flow statistics at
//! the IP layer.

pub mod app;
pub mod flowmon;
pub mod medium;
pub mod mobility;
pub mod packet;
pub mod sim;
pub mod time;

use std::net::Ipv4Addr;
use thiserror::Error;

pub use app::{AppConfig, AppCounters};
pub use flowmon::{FlowKey, FlowMonitor, FlowRecord, Histogram};
pub use medium::{PointToPointConfig, WifiConfig};
pub use mobility::{Bounds, MobilityModel, Position};
pub use packet::{Packet, Payload, Transport};
pub use sim::{AppId, CellId, DeviceId, NetworkSimulator, NodeId, RunSummary};
pub use time::SimTime;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("unknown node {0}")]
    UnknownNode(usize),

    #[error("unknown device {0}")]
    UnknownDevice(usize),

    #[error("unknown wifi cell {0}")]
    UnknownCell(usize),

    #[error("unknown application {0}")]
    UnknownApp(usize),

    #[error("address {0} is already assigned")]
    AddressConflict(Ipv4Addr),

    #[error("port {port} already has a listener on node {node}")]
    DuplicateEndpoint { node: usize, port: u16 },

    #[error("node {0} has run out of ephemeral ports")]
    PortsExhausted(usize),

    #[error("routes must be built before running")]
    RoutesNotBuilt,
}

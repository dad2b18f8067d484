//! Link, wireless cell and addressing parameters

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::time::Duration;

/// Wired server <-> access point link
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointToPointSpec {
    pub data_rate_bps: u64,
    #[serde(with = "crate::serde_secs")]
    pub delay: Duration,
    /// Drop-tail queue length per direction, in packets
    pub queue_packets: usize,
}

impl Default for PointToPointSpec {
    fn default() -> Self {
        Self {
            data_rate_bps: 100_000_000, // 100 Mbps
            delay: Duration::from_millis(1),
            queue_packets: 100,
        }
    }
}

/// Shared wireless cell: one access point, all clients
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WifiSpec {
    pub ssid: String,
    pub phy_rate_bps: u64,
    /// Fixed per-frame airtime overhead (preamble, contention, MAC ack)
    #[serde(with = "crate::serde_secs")]
    pub frame_overhead: Duration,
    pub queue_packets: usize,
    /// Frames are always delivered up to this distance
    pub reliable_range_m: f64,
    /// Frames are never delivered beyond this distance
    pub max_range_m: f64,
}

impl Default for WifiSpec {
    fn default() -> Self {
        Self {
            ssid: "sweep-cell".to_string(),
            phy_rate_bps: 54_000_000,
            frame_overhead: Duration::from_micros(100),
            queue_packets: 500,
            reliable_range_m: 50.0,
            max_range_m: 110.0,
        }
    }
}

/// Two private IPv4 prefixes: wired link and wireless cell
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressingSpec {
    pub link_network: Ipv4Addr,
    pub link_prefix: u8,
    pub wireless_network: Ipv4Addr,
    pub wireless_prefix: u8,
}

impl Default for AddressingSpec {
    fn default() -> Self {
        Self {
            link_network: Ipv4Addr::new(10, 1, 1, 0),
            link_prefix: 24,
            wireless_network: Ipv4Addr::new(192, 168, 0, 0),
            wireless_prefix: 24,
        }
    }
}

//! Per-flow statistics as exported in run artifacts

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// Transport protocol of a flow
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowProtocol {
    Udp,
    Tcp,
}

impl fmt::Display for FlowProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowProtocol::Udp => write!(f, "udp"),
            FlowProtocol::Tcp => write!(f, "tcp"),
        }
    }
}

/// One non-empty histogram bin; times in seconds
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub start_s: f64,
    pub width_s: f64,
    pub count: u64,
}

/// Statistics of one (protocol, source, destination) flow.
///
/// All times are seconds of simulated time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowStats {
    pub flow_id: u32,
    pub protocol: FlowProtocol,
    pub source_address: Ipv4Addr,
    pub source_port: u16,
    pub destination_address: Ipv4Addr,
    pub destination_port: u16,
    pub tx_bytes: u64,
    pub rx_bytes: u64,
    pub tx_packets: u64,
    pub rx_packets: u64,
    pub lost_packets: u64,
    pub time_first_tx_s: f64,
    pub time_last_tx_s: f64,
    pub time_first_rx_s: Option<f64>,
    pub time_last_rx_s: Option<f64>,
    pub delay_sum_s: f64,
    pub jitter_sum_s: f64,
    #[serde(default)]
    pub delay_histogram: Vec<HistogramBin>,
    #[serde(default)]
    pub jitter_histogram: Vec<HistogramBin>,
}

impl FlowStats {
    /// Mean one-way delay over received packets
    pub fn mean_delay_s(&self) -> Option<f64> {
        (self.rx_packets > 0).then(|| self.delay_sum_s / self.rx_packets as f64)
    }

    /// Jitter sum averaged over received packets
    pub fn mean_jitter_s(&self) -> Option<f64> {
        (self.rx_packets > 0).then(|| self.jitter_sum_s / self.rx_packets as f64)
    }

    /// Lost over transmitted packets; zero for a flow that never sent
    pub fn loss_rate(&self) -> f64 {
        if self.tx_packets == 0 {
            0.0
        } else {
            self.lost_packets as f64 / self.tx_packets as f64
        }
    }

    /// Received bits per second between first transmission and last reception
    pub fn throughput_bps(&self) -> Option<f64> {
        let last = self.time_last_rx_s?;
        let span = last - self.time_first_tx_s;
        (span > 0.0).then(|| self.rx_bytes as f64 * 8.0 / span)
    }

    pub fn has_packets(&self) -> bool {
        self.tx_packets > 0
    }
}

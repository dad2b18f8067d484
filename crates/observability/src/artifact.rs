//! The result document written once per run

use crate::flow::{FlowProtocol, FlowStats};
use crate::Result;
use chrono::{DateTime, Utc};
use scenarios::{ProtocolMode, RunConfig};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Everything recorded for one run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunArtifact {
    pub run: RunConfig,
    pub seed: u64,
    pub deadline_s: f64,
    pub generated_at: DateTime<Utc>,
    pub flows: Vec<FlowStats>,
}

/// Aggregate counters over all flows of a run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArtifactTotals {
    pub flows: usize,
    pub tx_packets: u64,
    pub rx_packets: u64,
    pub lost_packets: u64,
}

impl RunArtifact {
    pub fn new(run: RunConfig, seed: u64, deadline_s: f64, flows: Vec<FlowStats>) -> Self {
        Self {
            run,
            seed,
            deadline_s,
            generated_at: Utc::now(),
            flows,
        }
    }

    pub fn totals(&self) -> ArtifactTotals {
        self.flows.iter().fold(
            ArtifactTotals {
                flows: self.flows.len(),
                ..Default::default()
            },
            |mut acc, flow| {
                acc.tx_packets += flow.tx_packets;
                acc.rx_packets += flow.rx_packets;
                acc.lost_packets += flow.lost_packets;
                acc
            },
        )
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Rebuild artifacts from a CSV export, one per distinct run
    ///
    /// Runs without flows leave only a header line and are not recovered.
    pub fn from_csv_str(content: &str) -> Result<Vec<Self>> {
        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let mut artifacts: Vec<RunArtifact> = Vec::new();
        for row in reader.deserialize::<FlowRow>() {
            let row = row?;
            let run = RunConfig::new(row.client_count, row.mobility_enabled, row.protocol_mode);
            let flow = row.flow();
            match artifacts.iter_mut().find(|a| a.run == run && a.seed == row.seed) {
                Some(artifact) => artifact.flows.push(flow),
                None => artifacts.push(RunArtifact {
                    run,
                    seed: row.seed,
                    deadline_s: row.deadline_s,
                    generated_at: row.generated_at,
                    flows: vec![flow],
                }),
            }
        }
        Ok(artifacts)
    }

    /// Flat rows for tabular export; histograms are left out
    pub fn rows(&self) -> Vec<FlowRow> {
        self.flows.iter().map(|flow| FlowRow::new(self, flow)).collect()
    }
}

/// One CSV line: run identity followed by the flow counters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowRow {
    pub client_count: u32,
    pub mobility_enabled: bool,
    pub protocol_mode: ProtocolMode,
    pub seed: u64,
    pub deadline_s: f64,
    pub generated_at: DateTime<Utc>,
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
}

impl FlowRow {
    /// Column names in serialization order
    pub const HEADERS: [&'static str; 23] = [
        "client_count",
        "mobility_enabled",
        "protocol_mode",
        "seed",
        "deadline_s",
        "generated_at",
        "flow_id",
        "protocol",
        "source_address",
        "source_port",
        "destination_address",
        "destination_port",
        "tx_bytes",
        "rx_bytes",
        "tx_packets",
        "rx_packets",
        "lost_packets",
        "time_first_tx_s",
        "time_last_tx_s",
        "time_first_rx_s",
        "time_last_rx_s",
        "delay_sum_s",
        "jitter_sum_s",
    ];

    fn new(artifact: &RunArtifact, flow: &FlowStats) -> Self {
        Self {
            client_count: artifact.run.client_count,
            mobility_enabled: artifact.run.mobility_enabled,
            protocol_mode: artifact.run.protocol,
            seed: artifact.seed,
            deadline_s: artifact.deadline_s,
            generated_at: artifact.generated_at,
            flow_id: flow.flow_id,
            protocol: flow.protocol,
            source_address: flow.source_address,
            source_port: flow.source_port,
            destination_address: flow.destination_address,
            destination_port: flow.destination_port,
            tx_bytes: flow.tx_bytes,
            rx_bytes: flow.rx_bytes,
            tx_packets: flow.tx_packets,
            rx_packets: flow.rx_packets,
            lost_packets: flow.lost_packets,
            time_first_tx_s: flow.time_first_tx_s,
            time_last_tx_s: flow.time_last_tx_s,
            time_first_rx_s: flow.time_first_rx_s,
            time_last_rx_s: flow.time_last_rx_s,
            delay_sum_s: flow.delay_sum_s,
            jitter_sum_s: flow.jitter_sum_s,
        }
    }

    fn flow(&self) -> FlowStats {
        FlowStats {
            flow_id: self.flow_id,
            protocol: self.protocol,
            source_address: self.source_address,
            source_port: self.source_port,
            destination_address: self.destination_address,
            destination_port: self.destination_port,
            tx_bytes: self.tx_bytes,
            rx_bytes: self.rx_bytes,
            tx_packets: self.tx_packets,
            rx_packets: self.rx_packets,
            lost_packets: self.lost_packets,
            time_first_tx_s: self.time_first_tx_s,
            time_last_tx_s: self.time_last_tx_s,
            time_first_rx_s: self.time_first_rx_s,
            time_last_rx_s: self.time_last_rx_s,
            delay_sum_s: self.delay_sum_s,
            jitter_sum_s: self.jitter_sum_s,
            delay_histogram: Vec::new(),
            jitter_histogram: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::tests::sample_flow;

    #[test]
    fn test_totals() {
        let artifact = RunArtifact::new(
            RunConfig::new(2, false, ProtocolMode::Udp),
            7,
            10.0,
            vec![sample_flow(1, 8, 0), sample_flow(2, 6, 2)],
        );
        assert_eq!(
            artifact.totals(),
            ArtifactTotals {
                flows: 2,
                tx_packets: 16,
                rx_packets: 14,
                lost_packets: 2,
            }
        );
    }

    #[test]
    fn test_rows_carry_run_identity() {
        let artifact = RunArtifact::new(
            RunConfig::new(4, true, ProtocolMode::Mixed),
            3,
            10.0,
            vec![sample_flow(1, 8, 0)],
        );
        let rows = artifact.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].client_count, 4);
        assert!(rows[0].mobility_enabled);
        assert_eq!(rows[0].protocol_mode, ProtocolMode::Mixed);
        assert_eq!(rows[0].seed, 3);
    }
}

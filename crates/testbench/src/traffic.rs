//! Traffic plan selection
//!
//! Decides which application each node hosts for a protocol mode. The plan
//! is a pure function of (protocol, client count, server address, traffic
//! parameters); installing it on an engine is a separate step.

use crate::engine::{AppHandle, NodeHandle, SimulationEngine};
use crate::topology::Topology;
use crate::Result;
use scenarios::{ProtocolMode, TrafficSpec};
use serde::Serialize;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;
use tracing::debug;

/// Application role bound to one node
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum TrafficRole {
    UdpEchoServer {
        port: u16,
    },
    UdpEchoClient {
        remote: SocketAddrV4,
        max_packets: u32,
        interval: Duration,
        packet_size: u32,
    },
    /// Bound to the wildcard address
    TcpSink {
        local: SocketAddrV4,
    },
    /// `max_bytes == 0` sends until stopped
    TcpBulkSender {
        remote: SocketAddrV4,
        max_bytes: u64,
        segment_size: u32,
    },
}

impl TrafficRole {
    pub fn is_udp(&self) -> bool {
        matches!(
            self,
            TrafficRole::UdpEchoServer { .. } | TrafficRole::UdpEchoClient { .. }
        )
    }

    pub fn is_server_side(&self) -> bool {
        matches!(
            self,
            TrafficRole::UdpEchoServer { .. } | TrafficRole::TcpSink { .. }
        )
    }
}

/// Roles for the server and for every client, by client index
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TrafficPlan {
    pub protocol: ProtocolMode,
    pub server_apps: Vec<TrafficRole>,
    pub client_apps: Vec<TrafficRole>,
}

impl TrafficPlan {
    /// Build the plan for one run.
    ///
    /// In mixed mode even-indexed clients run the UDP echo client and
    /// odd-indexed clients the TCP bulk sender, and the server hosts only
    /// the TCP sink, so the UDP requests go unanswered.
    pub fn select(
        protocol: ProtocolMode,
        client_count: u32,
        server: Ipv4Addr,
        traffic: &TrafficSpec,
    ) -> Self {
        let remote = SocketAddrV4::new(server, traffic.port);
        let echo_client = TrafficRole::UdpEchoClient {
            remote,
            max_packets: traffic.echo.max_packets,
            interval: traffic.echo.interval,
            packet_size: traffic.echo.packet_size,
        };
        let bulk_sender = TrafficRole::TcpBulkSender {
            remote,
            max_bytes: traffic.bulk.max_bytes,
            segment_size: traffic.bulk.segment_size,
        };
        let tcp_sink = TrafficRole::TcpSink {
            local: SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, traffic.port),
        };

        let (server_apps, client_apps) = match protocol {
            ProtocolMode::Udp => (
                vec![TrafficRole::UdpEchoServer { port: traffic.port }],
                vec![echo_client; client_count as usize],
            ),
            ProtocolMode::Tcp => (vec![tcp_sink], vec![bulk_sender; client_count as usize]),
            ProtocolMode::Mixed => (
                vec![tcp_sink],
                (0..client_count)
                    .map(|i| {
                        if i % 2 == 0 {
                            echo_client.clone()
                        } else {
                            bulk_sender.clone()
                        }
                    })
                    .collect(),
            ),
        };

        Self {
            protocol,
            server_apps,
            client_apps,
        }
    }

    pub fn count(&self, predicate: impl Fn(&TrafficRole) -> bool) -> usize {
        self.server_apps
            .iter()
            .chain(&self.client_apps)
            .filter(|role| predicate(role))
            .count()
    }
}

/// Applications installed on an engine, split by side
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InstalledTraffic {
    pub server_apps: Vec<(NodeHandle, AppHandle)>,
    pub client_apps: Vec<(NodeHandle, AppHandle)>,
}

impl InstalledTraffic {
    /// Install `plan` on the nodes of `topology`
    pub fn install(
        engine: &mut dyn SimulationEngine,
        topology: &Topology,
        plan: &TrafficPlan,
    ) -> Result<Self> {
        let mut installed = InstalledTraffic::default();
        for role in &plan.server_apps {
            let app = engine.install_application(topology.server.handle, role)?;
            installed.server_apps.push((topology.server.handle, app));
        }
        for (client, role) in topology.clients.iter().zip(&plan.client_apps) {
            let app = engine.install_application(client.handle, role)?;
            installed.client_apps.push((client.handle, app));
        }
        debug!(
            "Installed {} server and {} client applications",
            installed.server_apps.len(),
            installed.client_apps.len()
        );
        Ok(installed)
    }
}

//! The simulation engine seam
//!
//! The harness only ever talks to a [`SimulationEngine`]: it creates nodes,
//! wires links, assigns addresses, installs and schedules applications, runs
//! to a deadline and reads back flow statistics. [`NetworkSimEngine`] adapts
//! the in-process `network-sim` simulator to this trait.

use crate::traffic::TrafficRole;
use crate::{Result, TestbenchError};
use ipnetwork::Ipv4Network;
use network_sim::{
    AppConfig, AppId, Bounds, CellId, DeviceId, FlowRecord, Histogram, MobilityModel,
    NetworkSimulator, NodeId, PointToPointConfig, Position, SimTime, Transport, WifiConfig,
};
use observability::{FlowProtocol, FlowStats, HistogramBin};
use scenarios::{MobilityPolicy, NodeRole, PointToPointSpec, Rectangle, ScheduleWindow, WifiSpec};
use std::time::Duration;
use tracing::debug;

/// Opaque node handle issued by an engine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeHandle(pub usize);

/// Opaque network device handle issued by an engine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeviceHandle(pub usize);

/// Opaque application handle issued by an engine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AppHandle(pub usize);

/// Devices created when a wireless cell is installed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WifiDevices {
    pub access_point: DeviceHandle,
    pub stations: Vec<DeviceHandle>,
}

/// Operations the harness needs from a discrete-event network simulator
pub trait SimulationEngine: Send {
    fn create_node(&mut self, role: NodeRole, index: u32) -> Result<NodeHandle>;

    fn install_point_to_point(
        &mut self,
        a: NodeHandle,
        b: NodeHandle,
        spec: &PointToPointSpec,
    ) -> Result<(DeviceHandle, DeviceHandle)>;

    fn install_wifi(
        &mut self,
        access_point: NodeHandle,
        stations: &[NodeHandle],
        spec: &WifiSpec,
    ) -> Result<WifiDevices>;

    fn assign_address(&mut self, device: DeviceHandle, address: Ipv4Network) -> Result<()>;

    fn set_mobility(&mut self, node: NodeHandle, policy: &MobilityPolicy) -> Result<()>;

    fn install_application(&mut self, node: NodeHandle, role: &TrafficRole) -> Result<AppHandle>;

    fn schedule_application(&mut self, app: AppHandle, window: ScheduleWindow) -> Result<()>;

    fn populate_routing(&mut self) -> Result<()>;

    fn enable_flow_monitor(&mut self) -> Result<()>;

    /// Advance simulated time to `deadline`; nothing runs past it
    fn run_until(&mut self, deadline: Duration) -> Result<()>;

    fn collect_flow_stats(&self) -> Result<Vec<FlowStats>>;

    /// Release every per-run resource; calling it twice is harmless
    fn destroy(&mut self);
}

/// Creates one fresh engine per run
pub trait EngineFactory: Send + Sync {
    fn create(&self, seed: u64) -> Result<Box<dyn SimulationEngine>>;
}

/// Factory for the in-process reference engine
#[derive(Clone, Copy, Debug, Default)]
pub struct NetworkSimFactory;

impl EngineFactory for NetworkSimFactory {
    fn create(&self, seed: u64) -> Result<Box<dyn SimulationEngine>> {
        Ok(Box::new(NetworkSimEngine::new(seed)))
    }
}

/// [`SimulationEngine`] backed by `network_sim::NetworkSimulator`
#[derive(Debug)]
pub struct NetworkSimEngine {
    sim: Option<NetworkSimulator>,
}

impl NetworkSimEngine {
    pub fn new(seed: u64) -> Self {
        Self {
            sim: Some(NetworkSimulator::new(seed)),
        }
    }

    /// The underlying simulator, if not yet destroyed
    pub fn simulator(&self) -> Option<&NetworkSimulator> {
        self.sim.as_ref()
    }

    fn sim(&mut self) -> Result<&mut NetworkSimulator> {
        self.sim
            .as_mut()
            .ok_or_else(|| TestbenchError::Engine("engine already destroyed".to_string()))
    }
}

fn bounds(r: &Rectangle) -> Bounds {
    Bounds {
        x_min: r.x_min,
        x_max: r.x_max,
        y_min: r.y_min,
        y_max: r.y_max,
    }
}

fn mobility_model(policy: &MobilityPolicy) -> MobilityModel {
    match policy {
        MobilityPolicy::Fixed => MobilityModel::Fixed {
            position: Position::default(),
        },
        MobilityPolicy::RandomWalk {
            bounds: area,
            initial_area,
            speed_min_mps,
            speed_max_mps,
            step_distance_m,
        } => MobilityModel::RandomWalk {
            bounds: bounds(area),
            initial_area: bounds(initial_area),
            speed_min_mps: *speed_min_mps,
            speed_max_mps: *speed_max_mps,
            step_distance_m: *step_distance_m,
        },
    }
}

fn app_config(role: &TrafficRole) -> AppConfig {
    match role {
        TrafficRole::UdpEchoServer { port } => AppConfig::UdpEchoServer { port: *port },
        TrafficRole::UdpEchoClient {
            remote,
            max_packets,
            interval,
            packet_size,
        } => AppConfig::UdpEchoClient {
            remote: *remote,
            max_packets: *max_packets,
            interval: SimTime::from(*interval),
            packet_size: *packet_size,
        },
        TrafficRole::TcpSink { local } => AppConfig::TcpSink { port: local.port() },
        TrafficRole::TcpBulkSender {
            remote,
            max_bytes,
            segment_size,
        } => AppConfig::TcpBulkSender {
            remote: *remote,
            max_bytes: *max_bytes,
            segment_size: *segment_size,
        },
    }
}

fn histogram(h: &Histogram) -> Vec<HistogramBin> {
    let width_s = h.bin_width().as_secs_f64();
    h.bins()
        .into_iter()
        .map(|(start, count)| HistogramBin {
            start_s: start.as_secs_f64(),
            width_s,
            count,
        })
        .collect()
}

fn flow_stats(record: &FlowRecord) -> FlowStats {
    FlowStats {
        flow_id: record.flow_id,
        protocol: match record.key.protocol {
            Transport::Udp => FlowProtocol::Udp,
            Transport::Tcp => FlowProtocol::Tcp,
        },
        source_address: *record.key.source.ip(),
        source_port: record.key.source.port(),
        destination_address: *record.key.destination.ip(),
        destination_port: record.key.destination.port(),
        tx_bytes: record.tx_bytes,
        rx_bytes: record.rx_bytes,
        tx_packets: record.tx_packets,
        rx_packets: record.rx_packets,
        lost_packets: record.lost_packets,
        time_first_tx_s: record.time_first_tx.as_secs_f64(),
        time_last_tx_s: record.time_last_tx.as_secs_f64(),
        time_first_rx_s: record.time_first_rx.map(|t| t.as_secs_f64()),
        time_last_rx_s: record.time_last_rx.map(|t| t.as_secs_f64()),
        delay_sum_s: record.delay_sum.as_secs_f64(),
        jitter_sum_s: record.jitter_sum.as_secs_f64(),
        delay_histogram: histogram(&record.delay_histogram),
        jitter_histogram: histogram(&record.jitter_histogram),
    }
}

impl SimulationEngine for NetworkSimEngine {
    fn create_node(&mut self, role: NodeRole, index: u32) -> Result<NodeHandle> {
        let id = self.sim()?.add_node(format!("{}{}", role, index));
        Ok(NodeHandle(id.0))
    }

    fn install_point_to_point(
        &mut self,
        a: NodeHandle,
        b: NodeHandle,
        spec: &PointToPointSpec,
    ) -> Result<(DeviceHandle, DeviceHandle)> {
        let config = PointToPointConfig {
            data_rate_bps: spec.data_rate_bps,
            delay: SimTime::from(spec.delay),
            queue_packets: spec.queue_packets,
        };
        let (da, db) = self
            .sim()?
            .connect_point_to_point(NodeId(a.0), NodeId(b.0), &config)?;
        Ok((DeviceHandle(da.0), DeviceHandle(db.0)))
    }

    fn install_wifi(
        &mut self,
        access_point: NodeHandle,
        stations: &[NodeHandle],
        spec: &WifiSpec,
    ) -> Result<WifiDevices> {
        let config = WifiConfig {
            ssid: spec.ssid.clone(),
            phy_rate_bps: spec.phy_rate_bps,
            frame_overhead: SimTime::from(spec.frame_overhead),
            queue_packets: spec.queue_packets,
            reliable_range_m: spec.reliable_range_m,
            max_range_m: spec.max_range_m,
        };
        let sim = self.sim()?;
        let cell: CellId = sim.create_wifi_cell(&config);
        let stations = stations
            .iter()
            .map(|s| {
                sim.attach_wifi(NodeId(s.0), cell)
                    .map(|d| DeviceHandle(d.0))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let ap = sim.attach_wifi(NodeId(access_point.0), cell)?;
        debug!("Wifi cell '{}' with {} stations", config.ssid, stations.len());
        Ok(WifiDevices {
            access_point: DeviceHandle(ap.0),
            stations,
        })
    }

    fn assign_address(&mut self, device: DeviceHandle, address: Ipv4Network) -> Result<()> {
        self.sim()?
            .assign_address(DeviceId(device.0), address.ip(), address.prefix())?;
        Ok(())
    }

    fn set_mobility(&mut self, node: NodeHandle, policy: &MobilityPolicy) -> Result<()> {
        self.sim()?
            .set_mobility(NodeId(node.0), mobility_model(policy))?;
        Ok(())
    }

    fn install_application(&mut self, node: NodeHandle, role: &TrafficRole) -> Result<AppHandle> {
        let id = self.sim()?.install_app(NodeId(node.0), app_config(role))?;
        Ok(AppHandle(id.0))
    }

    fn schedule_application(&mut self, app: AppHandle, window: ScheduleWindow) -> Result<()> {
        self.sim()?.set_app_window(
            AppId(app.0),
            SimTime::from(window.start),
            SimTime::from(window.stop),
        )?;
        Ok(())
    }

    fn populate_routing(&mut self) -> Result<()> {
        self.sim()?.build_routes();
        Ok(())
    }

    fn enable_flow_monitor(&mut self) -> Result<()> {
        self.sim()?.enable_flow_monitor();
        Ok(())
    }

    fn run_until(&mut self, deadline: Duration) -> Result<()> {
        let summary = self.sim()?.run(SimTime::from(deadline))?;
        debug!(
            "Engine stopped at {}: {} events, {} packets sent, {} dropped",
            summary.end_time, summary.events_processed, summary.packets_sent, summary.packets_dropped
        );
        Ok(())
    }

    fn collect_flow_stats(&self) -> Result<Vec<FlowStats>> {
        let sim = self
            .sim
            .as_ref()
            .ok_or_else(|| TestbenchError::Engine("engine already destroyed".to_string()))?;
        Ok(sim.flow_records().iter().map(flow_stats).collect())
    }

    fn destroy(&mut self) {
        if let Some(sim) = self.sim.take() {
            debug!("Destroying engine with {} nodes", sim.node_count());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_destroyed_engine_refuses_work() {
        let mut engine = NetworkSimEngine::new(1);
        engine.create_node(NodeRole::Server, 0).unwrap();
        engine.destroy();
        engine.destroy();
        assert!(engine.simulator().is_none());
        assert!(matches!(
            engine.create_node(NodeRole::Client, 0),
            Err(TestbenchError::Engine(_))
        ));
        assert!(engine.collect_flow_stats().is_err());
    }

    #[test]
    fn test_policy_conversion() {
        let policy = MobilityPolicy::RandomWalk {
            bounds: Rectangle::centered_square(100.0),
            initial_area: Rectangle::new(0.0, 50.0, 0.0, 50.0),
            speed_min_mps: 2.0,
            speed_max_mps: 4.0,
            step_distance_m: 1.0,
        };
        match mobility_model(&policy) {
            MobilityModel::RandomWalk { bounds, .. } => {
                assert_eq!(bounds.x_min, -50.0);
                assert_eq!(bounds.y_max, 50.0);
            }
            other => panic!("unexpected model {:?}", other),
        }
        assert!(!mobility_model(&MobilityPolicy::Fixed).is_random_walk());
    }

    #[test]
    fn test_engine_errors_are_mapped() {
        let mut engine = NetworkSimEngine::new(1);
        let a = engine.create_node(NodeRole::Server, 0).unwrap();
        let b = engine.create_node(NodeRole::AccessPoint, 0).unwrap();
        let (da, db) = engine
            .install_point_to_point(a, b, &PointToPointSpec::default())
            .unwrap();
        let net = Ipv4Network::new(Ipv4Addr::new(10, 1, 1, 1), 24).unwrap();
        engine.assign_address(da, net).unwrap();
        let err = engine.assign_address(db, net).unwrap_err();
        assert!(matches!(err, TestbenchError::Engine(_)));
        assert!(!err.is_configuration_error());
    }
}

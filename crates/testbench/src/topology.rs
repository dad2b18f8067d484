//! Three-tier topology: server, access point and N wireless clients

use crate::addr::AddressPlan;
use crate::engine::{DeviceHandle, NodeHandle, SimulationEngine, WifiDevices};
use crate::Result;
use ipnetwork::Ipv4Network;
use scenarios::{AddressingSpec, ConfigError, NodeRole, PointToPointSpec, WifiSpec};
use std::net::Ipv4Addr;
use tracing::debug;

/// A node created for this run, identified by role and index within the role
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeRecord {
    pub role: NodeRole,
    pub index: u32,
    pub handle: NodeHandle,
}

/// Everything the topology builder allocated on the engine
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Topology {
    pub server: NodeRecord,
    pub access_point: NodeRecord,
    pub clients: Vec<NodeRecord>,
    /// Server and access point ends of the wired link
    pub link: (DeviceHandle, DeviceHandle),
    pub wifi: WifiDevices,
    pub link_block: Ipv4Network,
    pub wireless_block: Ipv4Network,
    pub server_address: Ipv4Addr,
    pub client_addresses: Vec<Ipv4Addr>,
}

impl Topology {
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Every node of the run, server first and clients last
    pub fn nodes(&self) -> impl Iterator<Item = &NodeRecord> {
        [&self.server, &self.access_point]
            .into_iter()
            .chain(self.clients.iter())
    }

    pub fn node_count(&self) -> usize {
        self.clients.len() + 2
    }
}

/// Builds the topology on an engine
pub struct TopologyBuilder<'a> {
    link: &'a PointToPointSpec,
    wifi: &'a WifiSpec,
    addressing: &'a AddressingSpec,
}

impl<'a> TopologyBuilder<'a> {
    pub fn new(
        link: &'a PointToPointSpec,
        wifi: &'a WifiSpec,
        addressing: &'a AddressingSpec,
    ) -> Self {
        Self {
            link,
            wifi,
            addressing,
        }
    }

    /// Create nodes, the server <-> AP link and the wireless cell, then address them.
    ///
    /// Fails with a configuration error before touching the engine when
    /// `client_count` is zero or the address plan cannot hold the clients.
    pub fn build(&self, engine: &mut dyn SimulationEngine, client_count: u32) -> Result<Topology> {
        if client_count == 0 {
            return Err(ConfigError::NoClients.into());
        }
        let plan = AddressPlan::new(self.addressing)?;
        let link_hosts = plan.link_hosts()?;
        let wireless_hosts = plan.wireless_hosts(client_count)?;

        let server = NodeRecord {
            role: NodeRole::Server,
            index: 0,
            handle: engine.create_node(NodeRole::Server, 0)?,
        };
        let access_point = NodeRecord {
            role: NodeRole::AccessPoint,
            index: 0,
            handle: engine.create_node(NodeRole::AccessPoint, 0)?,
        };
        let clients = (0..client_count)
            .map(|index| {
                Ok(NodeRecord {
                    role: NodeRole::Client,
                    index,
                    handle: engine.create_node(NodeRole::Client, index)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let link = engine.install_point_to_point(server.handle, access_point.handle, self.link)?;
        let stations: Vec<NodeHandle> = clients.iter().map(|c| c.handle).collect();
        let wifi = engine.install_wifi(access_point.handle, &stations, self.wifi)?;

        engine.assign_address(link.0, link_hosts.server)?;
        engine.assign_address(link.1, link_hosts.access_point)?;
        for (device, address) in wifi.stations.iter().zip(&wireless_hosts.clients) {
            engine.assign_address(*device, *address)?;
        }
        engine.assign_address(wifi.access_point, wireless_hosts.access_point)?;

        debug!(
            "Topology: {} clients in {} behind {} (server {})",
            client_count,
            plan.wireless_block(),
            plan.link_block(),
            link_hosts.server.ip()
        );

        Ok(Topology {
            server,
            access_point,
            clients,
            link,
            wifi,
            link_block: plan.link_block(),
            wireless_block: plan.wireless_block(),
            server_address: link_hosts.server.ip(),
            client_addresses: wireless_hosts.clients.iter().map(|n| n.ip()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::NetworkSimEngine;
    use crate::TestbenchError;

    fn build(clients: u32) -> Result<Topology> {
        let link = PointToPointSpec::default();
        let wifi = WifiSpec::default();
        let addressing = AddressingSpec::default();
        let mut engine = NetworkSimEngine::new(1);
        TopologyBuilder::new(&link, &wifi, &addressing).build(&mut engine, clients)
    }

    #[test]
    fn test_node_counts() {
        for clients in [1, 2, 4, 8, 16, 32] {
            let topology = build(clients).unwrap();
            assert_eq!(topology.client_count(), clients as usize);
            assert_eq!(topology.server.role, NodeRole::Server);
            assert_eq!(topology.access_point.role, NodeRole::AccessPoint);
            assert_eq!(topology.nodes().count(), clients as usize + 2);
            assert_eq!(topology.wifi.stations.len(), clients as usize);
            assert!(topology
                .clients
                .iter()
                .enumerate()
                .all(|(i, c)| c.index == i as u32 && c.role == NodeRole::Client));
        }
    }

    #[test]
    fn test_zero_clients_is_a_configuration_error() {
        let err = build(0).unwrap_err();
        assert!(err.is_configuration_error());
        assert!(matches!(
            err,
            TestbenchError::Config(ConfigError::NoClients)
        ));
    }

    #[test]
    fn test_addresses() {
        let topology = build(2).unwrap();
        assert_eq!(topology.server_address, Ipv4Addr::new(10, 1, 1, 1));
        assert_eq!(
            topology.client_addresses,
            vec![Ipv4Addr::new(192, 168, 0, 1), Ipv4Addr::new(192, 168, 0, 2)]
        );
        assert!(!topology.link_block.contains(topology.wireless_block.network()));
        assert!(!topology.wireless_block.contains(topology.link_block.network()));
    }
}

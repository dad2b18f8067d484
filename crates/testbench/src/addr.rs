//! IPv4 address planning for the link and wireless subnets
//!
//! Hosts are handed out sequentially from the first usable address of each
//! block: on the link the server gets `.1` and the access point `.2`; in the
//! wireless cell clients get `.1 ..= .N` in index order and the access point
//! takes the next address.

use crate::{Result, TestbenchError};
use ipnetwork::Ipv4Network;
use scenarios::AddressingSpec;
use std::net::Ipv4Addr;
use tracing::debug;

/// The two disjoint address blocks of one run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressPlan {
    link: Ipv4Network,
    wireless: Ipv4Network,
}

/// Addresses on the server <-> access point link
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkAddresses {
    pub server: Ipv4Network,
    pub access_point: Ipv4Network,
}

/// Addresses inside the wireless cell
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WirelessAddresses {
    pub clients: Vec<Ipv4Network>,
    pub access_point: Ipv4Network,
}

impl AddressPlan {
    /// Build and check the plan; the blocks must not overlap
    pub fn new(spec: &AddressingSpec) -> Result<Self> {
        let link = block(spec.link_network, spec.link_prefix)?;
        let wireless = block(spec.wireless_network, spec.wireless_prefix)?;

        if link.contains(wireless.network()) || wireless.contains(link.network()) {
            return Err(TestbenchError::Addressing(format!(
                "link block {} overlaps wireless block {}",
                link, wireless
            )));
        }
        debug!("Address plan: link {}, wireless {}", link, wireless);
        Ok(Self { link, wireless })
    }

    pub fn link_block(&self) -> Ipv4Network {
        self.link
    }

    pub fn wireless_block(&self) -> Ipv4Network {
        self.wireless
    }

    pub fn link_hosts(&self) -> Result<LinkAddresses> {
        Ok(LinkAddresses {
            server: host(self.link, 1)?,
            access_point: host(self.link, 2)?,
        })
    }

    pub fn wireless_hosts(&self, clients: u32) -> Result<WirelessAddresses> {
        let needed = clients as u64 + 1;
        if needed > usable_hosts(self.wireless) {
            return Err(TestbenchError::Addressing(format!(
                "wireless block {} cannot hold {} clients and an access point",
                self.wireless, clients
            )));
        }
        let clients = (1..=clients)
            .map(|n| host(self.wireless, n))
            .collect::<Result<Vec<_>>>()?;
        let access_point = host(self.wireless, clients.len() as u32 + 1)?;
        Ok(WirelessAddresses {
            clients,
            access_point,
        })
    }
}

fn block(address: Ipv4Addr, prefix: u8) -> Result<Ipv4Network> {
    let net = Ipv4Network::new(address, prefix)
        .map_err(|e| TestbenchError::Addressing(format!("{}/{}: {}", address, prefix, e)))?;
    Ipv4Network::new(net.network(), prefix)
        .map_err(|e| TestbenchError::Addressing(e.to_string()))
}

fn usable_hosts(net: Ipv4Network) -> u64 {
    let size = 1u64 << (32 - net.prefix() as u32);
    size.saturating_sub(2)
}

/// The `n`-th usable host of a block, keeping the block's prefix
fn host(net: Ipv4Network, n: u32) -> Result<Ipv4Network> {
    if n as u64 > usable_hosts(net) {
        return Err(TestbenchError::Addressing(format!(
            "host {} is outside {}",
            n, net
        )));
    }
    let address = Ipv4Addr::from(u32::from(net.network()) + n);
    Ipv4Network::new(address, net.prefix()).map_err(|e| TestbenchError::Addressing(e.to_string()))
}

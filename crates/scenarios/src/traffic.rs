//! Traffic generator parameters

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Largest UDP payload that fits an IPv4 datagram
pub const MAX_UDP_PAYLOAD: u32 = 65_507;

/// Largest TCP payload that fits an IPv4 datagram without options
pub const MAX_TCP_SEGMENT: u32 = 65_495;

/// UDP echo client parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EchoParams {
    pub max_packets: u32,
    #[serde(with = "crate::serde_secs")]
    pub interval: Duration,
    /// Payload size in bytes
    pub packet_size: u32,
}

impl Default for EchoParams {
    fn default() -> Self {
        Self {
            max_packets: 10,
            interval: Duration::from_secs(1),
            packet_size: 1024,
        }
    }
}

/// TCP bulk sender parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkParams {
    /// Byte budget; 0 means the sender runs until it is stopped
    pub max_bytes: u64,
    /// Segment payload size in bytes
    pub segment_size: u32,
}

impl Default for BulkParams {
    fn default() -> Self {
        Self {
            max_bytes: 0,
            segment_size: 536,
        }
    }
}

impl BulkParams {
    pub fn is_unlimited(&self) -> bool {
        self.max_bytes == 0
    }
}

/// Traffic section of a sweep configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficSpec {
    /// Port shared by the echo server, the sink and every client
    pub port: u16,
    pub echo: EchoParams,
    pub bulk: BulkParams,
}

impl TrafficSpec {
    /// Packet sizes must fit a single IPv4 datagram
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.echo.packet_size > MAX_UDP_PAYLOAD {
            return Err(ConfigError::InvalidTraffic(format!(
                "echo packet size {} exceeds {} bytes",
                self.echo.packet_size, MAX_UDP_PAYLOAD
            )));
        }
        if self.bulk.segment_size == 0 || self.bulk.segment_size > MAX_TCP_SEGMENT {
            return Err(ConfigError::InvalidTraffic(format!(
                "bulk segment size {} outside 1..={} bytes",
                self.bulk.segment_size, MAX_TCP_SEGMENT
            )));
        }
        Ok(())
    }
}

impl Default for TrafficSpec {
    fn default() -> Self {
        Self {
            port: 9,
            echo: EchoParams::default(),
            bulk: BulkParams::default(),
        }
    }
}

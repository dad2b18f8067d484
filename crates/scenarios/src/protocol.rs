//! Transport protocol modes swept by the harness

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which traffic generators a run installs on its clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolMode {
    /// Every client runs a UDP echo client against a UDP echo server
    Udp,
    /// Every client runs a TCP bulk sender against a TCP sink
    Tcp,
    /// Even-indexed clients send UDP echo, odd-indexed clients send TCP bulk
    Mixed,
}

impl ProtocolMode {
    /// All modes in sweep order
    pub const ALL: [ProtocolMode; 3] = [ProtocolMode::Udp, ProtocolMode::Tcp, ProtocolMode::Mixed];

    /// Label used in log lines
    pub fn label(&self) -> &'static str {
        match self {
            ProtocolMode::Udp => "UDP",
            ProtocolMode::Tcp => "TCP",
            ProtocolMode::Mixed => "TCP+UDP",
        }
    }

    /// Lowercase identifier used in file names and on the command line
    pub fn slug(&self) -> &'static str {
        match self {
            ProtocolMode::Udp => "udp",
            ProtocolMode::Tcp => "tcp",
            ProtocolMode::Mixed => "mixed",
        }
    }

    /// Stable numeric code, mixed into per-run seeds
    pub fn code(&self) -> u64 {
        match self {
            ProtocolMode::Udp => 0,
            ProtocolMode::Tcp => 1,
            ProtocolMode::Mixed => 2,
        }
    }
}

impl fmt::Display for ProtocolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl FromStr for ProtocolMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "udp" => Ok(ProtocolMode::Udp),
            "tcp" => Ok(ProtocolMode::Tcp),
            "mixed" | "tcp+udp" | "udp+tcp" | "udp_tcp" => Ok(ProtocolMode::Mixed),
            _ => Err(ConfigError::UnknownProtocol(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_protocol_names() {
        assert_eq!("udp".parse::<ProtocolMode>().unwrap(), ProtocolMode::Udp);
        assert_eq!("TCP".parse::<ProtocolMode>().unwrap(), ProtocolMode::Tcp);
        assert_eq!("tcp+udp".parse::<ProtocolMode>().unwrap(), ProtocolMode::Mixed);
        assert_eq!(" Mixed ".parse::<ProtocolMode>().unwrap(), ProtocolMode::Mixed);
    }

    #[test]
    fn test_unknown_protocol_is_config_error() {
        let err = "sctp".parse::<ProtocolMode>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProtocol(ref name) if name == "sctp"));
        assert!(err.to_string().contains("sctp"));
    }

    #[test]
    fn test_labels_and_codes_are_distinct() {
        assert_eq!(ProtocolMode::Mixed.to_string(), "TCP+UDP");
        let codes: Vec<u64> = ProtocolMode::ALL.iter().map(|p| p.code()).collect();
        assert_eq!(codes, vec![0, 1, 2]);
    }
}

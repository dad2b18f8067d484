//! Preset sweeps for common experiment campaigns

use crate::protocol::ProtocolMode;
use crate::run::RunConfig;
use crate::sweep::SweepConfig;

/// Preset collections for common sweeps
pub struct Presets;

impl Presets {
    /// The full matrix: 2 mobility modes x 3 protocols x 6 client counts
    pub fn full_sweep() -> SweepConfig {
        SweepConfig::default()
    }

    /// Static topologies only
    pub fn static_sweep() -> SweepConfig {
        SweepConfig {
            mobility_modes: vec![false],
            ..SweepConfig::default()
        }
    }

    /// Small matrix that finishes quickly, for smoke tests
    pub fn smoke_sweep() -> SweepConfig {
        SweepConfig {
            client_counts: vec![1, 2],
            ..SweepConfig::default()
        }
    }

    /// A sweep consisting of exactly one run
    pub fn single(run: RunConfig) -> SweepConfig {
        SweepConfig {
            client_counts: vec![run.client_count],
            mobility_modes: vec![run.mobility_enabled],
            protocols: vec![run.protocol],
            ..SweepConfig::default()
        }
    }

    /// Lookup by name, as used on the command line
    pub fn by_name(name: &str) -> Option<SweepConfig> {
        match name {
            "full" => Some(Self::full_sweep()),
            "static" => Some(Self::static_sweep()),
            "smoke" => Some(Self::smoke_sweep()),
            "udp" => Some(SweepConfig {
                protocols: vec![ProtocolMode::Udp],
                ..SweepConfig::default()
            }),
            _ => None,
        }
    }

    pub fn names() -> &'static [&'static str] {
        &["full", "static", "smoke", "udp"]
    }
}

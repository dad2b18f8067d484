//! Where and how run artifacts are written

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::ConfigError;

/// Artifact file format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    #[default]
    Json,
    Csv,
}

impl ArtifactFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactFormat::Json => "json",
            ArtifactFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ArtifactFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ArtifactFormat::Json),
            "csv" => Ok(ArtifactFormat::Csv),
            other => Err(ConfigError::UnknownFormat(other.to_string())),
        }
    }
}

/// Whether successive runs share one artifact file
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ArtifactPolicy {
    /// One file per run, named after the run
    #[default]
    PerRun,
    /// Every run rewrites the same file; only the last run survives
    Overwrite { file_name: String },
}

/// Output section of a sweep configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSpec {
    pub directory: PathBuf,
    pub format: ArtifactFormat,
    pub policy: ArtifactPolicy,
    /// Pretty-print JSON artifacts
    pub pretty: bool,
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("results"),
            format: ArtifactFormat::Json,
            policy: ArtifactPolicy::PerRun,
            pretty: true,
        }
    }
}

use std::path::PathBuf;
use std::str::FromStr;

use log::warn;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use toml::*;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmitMode {
    /// The full topology artifact for the execution backend.
    #[default]
    Topology,
    /// Only the stats naming map consumed by the stats tooling.
    StatsLayout,
}

impl FromStr for EmitMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "topology" => Ok(Self::Topology),
            "stats_layout" => Ok(Self::StatsLayout),
            _ => Err(format!(
                "unsupported emit mode '{}', expected one of: topology, stats_layout",
                value
            )),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimConfig {
    /// Where to write the emitted JSON; empty means stdout.
    pub output: PathBuf,
    pub emit: EmitMode,
    pub log_level: u64,
}

pub trait Config: DeserializeOwned + Default {
    fn from_section(section: Option<&Value>) -> Self {
        match section {
            Some(value) => value.clone().try_into().expect("cannot deserialize config"),
            None => {
                warn!("config section not found");
                Self::default()
            }
        }
    }
}

impl Config for SimConfig {}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::new(),
            emit: EmitMode::Topology,
            log_level: 0,
        }
    }
}

use std::path::PathBuf;

use anyhow::Context;
use log::warn;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use toml::*;

use crate::timeq::Cycle;

pub trait Config: DeserializeOwned + Default {
    fn from_section(section: Option<&Value>) -> anyhow::Result<Self> {
        match section {
            Some(value) => value
                .clone()
                .try_into()
                .with_context(|| format!("cannot deserialize {}", std::any::type_name::<Self>())),
            None => {
                warn!("config section for {} not found", std::any::type_name::<Self>());
                Ok(Self::default())
            }
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct FrontendConfig {
    /// Registry key of the memory standard, e.g. "DDR4".
    pub standard: String,
    /// Bytes moved per access; also the engine's address interleave granule.
    pub cache_line_size: u32,
    /// Text report destination. Kept in memory when unset.
    pub stats_path: Option<PathBuf>,
    pub stats_json: Option<PathBuf>,
    // filled from the [engine] section
    #[serde(skip)]
    pub engine: EngineConfig,
}

impl Config for FrontendConfig {}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            standard: "DDR4".to_string(),
            cache_line_size: 64,
            stats_path: None,
            stats_json: None,
            engine: EngineConfig::default(),
        }
    }
}

/// Overrides applied on top of the standard's preset.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    pub channels: Option<usize>,
    pub banks_per_channel: Option<usize>,
    pub queue_depth: Option<usize>,
    pub read_latency: Option<Cycle>,
    pub write_latency: Option<Cycle>,
    pub bytes_per_cycle: Option<u32>,
}

impl Config for EngineConfig {}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct SimConfig {
    /// 0: errors only, 1: info, 2: debug
    pub log_level: u64,
    pub max_cycles: Cycle,
}

impl Config for SimConfig {}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            log_level: 1,
            max_cycles: 10_000_000,
        }
    }
}

use log::error;
use phf::phf_map;

use crate::engine::queue_model::{EngineParams, QueueEngine};
use crate::engine::TimingEngine;
use crate::frontend::error::FrontendError;
use crate::sim::config::FrontendConfig;
use crate::timeq::Cycle;

/// Per-standard defaults for the stand-in engine. Latencies are in engine cycles and cover
/// activation plus column access plus burst; they are coarse, not a DRAM timing model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardPreset {
    pub name: &'static str,
    pub clock_period_ns: f64,
    pub channels: usize,
    pub banks_per_channel: usize,
    pub queue_depth: usize,
    pub read_latency: Cycle,
    pub write_latency: Cycle,
    pub bytes_per_cycle: u32,
}

static STANDARDS: phf::Map<&'static str, StandardPreset> = phf_map! {
    "DDR3" => StandardPreset {
        name: "DDR3",
        clock_period_ns: 1.25,
        channels: 1,
        banks_per_channel: 8,
        queue_depth: 32,
        read_latency: 26,
        write_latency: 12,
        bytes_per_cycle: 16,
    },
    "DDR4" => StandardPreset {
        name: "DDR4",
        clock_period_ns: 0.833,
        channels: 1,
        banks_per_channel: 16,
        queue_depth: 32,
        read_latency: 36,
        write_latency: 16,
        bytes_per_cycle: 16,
    },
    "LPDDR3" => StandardPreset {
        name: "LPDDR3",
        clock_period_ns: 1.25,
        channels: 1,
        banks_per_channel: 8,
        queue_depth: 32,
        read_latency: 31,
        write_latency: 10,
        bytes_per_cycle: 8,
    },
    "LPDDR4" => StandardPreset {
        name: "LPDDR4",
        clock_period_ns: 0.625,
        channels: 2,
        banks_per_channel: 8,
        queue_depth: 32,
        read_latency: 65,
        write_latency: 22,
        bytes_per_cycle: 4,
    },
    "GDDR5" => StandardPreset {
        name: "GDDR5",
        clock_period_ns: 0.667,
        channels: 1,
        banks_per_channel: 16,
        queue_depth: 32,
        read_latency: 38,
        write_latency: 7,
        bytes_per_cycle: 16,
    },
    "WideIO" => StandardPreset {
        name: "WideIO",
        clock_period_ns: 3.75,
        channels: 4,
        banks_per_channel: 4,
        queue_depth: 32,
        read_latency: 10,
        write_latency: 5,
        bytes_per_cycle: 16,
    },
    "WideIO2" => StandardPreset {
        name: "WideIO2",
        clock_period_ns: 0.938,
        channels: 8,
        banks_per_channel: 8,
        queue_depth: 32,
        read_latency: 23,
        write_latency: 8,
        bytes_per_cycle: 16,
    },
    "HBM" => StandardPreset {
        name: "HBM",
        clock_period_ns: 1.0,
        channels: 8,
        banks_per_channel: 16,
        queue_depth: 32,
        read_latency: 16,
        write_latency: 4,
        bytes_per_cycle: 32,
    },
    "SALP-1" => StandardPreset {
        name: "SALP-1",
        clock_period_ns: 1.25,
        channels: 1,
        banks_per_channel: 8,
        queue_depth: 32,
        read_latency: 26,
        write_latency: 12,
        bytes_per_cycle: 16,
    },
    "SALP-2" => StandardPreset {
        name: "SALP-2",
        clock_period_ns: 1.25,
        channels: 1,
        banks_per_channel: 8,
        queue_depth: 32,
        read_latency: 24,
        write_latency: 12,
        bytes_per_cycle: 16,
    },
    "SALP-MASA" => StandardPreset {
        name: "SALP-MASA",
        clock_period_ns: 1.25,
        channels: 1,
        banks_per_channel: 8,
        queue_depth: 32,
        read_latency: 22,
        write_latency: 12,
        bytes_per_cycle: 16,
    },
};

pub fn lookup(name: &str) -> Option<&'static StandardPreset> {
    STANDARDS.get(name)
}

/// Registered standard names, sorted.
pub fn standard_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = STANDARDS.keys().copied().collect();
    names.sort_unstable();
    names
}

/// Bind `config.standard` to a concrete engine. An unknown name is a configuration error and
/// nothing is built.
pub fn create_engine(config: &FrontendConfig) -> Result<Box<dyn TimingEngine>, FrontendError> {
    let preset = match lookup(&config.standard) {
        Some(preset) => preset,
        None => {
            error!(
                "unrecognized standard name '{}', expected one of: {}",
                config.standard,
                standard_names().join(", ")
            );
            return Err(FrontendError::UnknownStandard(config.standard.clone()));
        }
    };
    let params = EngineParams::resolve(preset, &config.engine, config.cache_line_size)?;
    Ok(Box::new(QueueEngine::new(params)))
}

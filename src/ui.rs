use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use toml::Table;

use crate::frontend::MemoryFrontend;
use crate::sim::config::{Config, EngineConfig, FrontendConfig, SimConfig};
use crate::timeq::Cycle;
use crate::traffic::{PatternKind, TrafficConfig};

#[derive(Parser, Debug, Default)]
#[command(version, about)]
pub struct MemfrontArgs {
    #[arg(help = "Path to config.toml")]
    pub config_path: Option<PathBuf>,
    #[arg(long, help = "Override memory standard (e.g. DDR4, HBM)")]
    pub standard: Option<String>,
    #[arg(long, help = "Write the statistics report to this file")]
    pub stats: Option<PathBuf>,
    #[arg(long, help = "Override number of requests to issue")]
    pub requests: Option<u64>,
    #[arg(long, value_enum, help = "Override address pattern")]
    pub pattern: Option<PatternKind>,
    #[arg(long, help = "Override fraction of writes")]
    pub write_ratio: Option<f64>,
    #[arg(long, help = "Override traffic seed")]
    pub seed: Option<u64>,
    #[arg(long, help = "Enable log at level (0:none, 1:info, 2:debug)")]
    pub log: Option<u64>,
    #[arg(long, help = "Stop after this many cycles")]
    pub max_cycles: Option<Cycle>,
}

/// Everything one run needs, after TOML and CLI overrides are merged.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub sim: SimConfig,
    pub frontend: FrontendConfig,
    pub traffic: TrafficConfig,
}

pub fn read_toml(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))
}

/// Build the run configuration from TOML text. If `cli_args` is given, its options override the
/// TOML ones.
pub fn parse_config(
    toml_string: &str,
    cli_args: Option<&MemfrontArgs>,
) -> anyhow::Result<RunConfig> {
    let table: Table = toml::from_str(toml_string).context("cannot parse config toml")?;
    let section = |name: &str| table.get(name);

    let mut sim = SimConfig::from_section(section("sim"))?;
    let mut frontend = FrontendConfig::from_section(section("frontend"))?;
    frontend.engine = EngineConfig::from_section(section("engine"))?;
    let mut traffic = TrafficConfig::from_section(section("traffic"))?;

    if let Some(args) = cli_args {
        sim.log_level = args.log.unwrap_or(sim.log_level);
        sim.max_cycles = args.max_cycles.unwrap_or(sim.max_cycles);
        if let Some(standard) = &args.standard {
            frontend.standard = standard.clone();
        }
        if args.stats.is_some() {
            frontend.stats_path = args.stats.clone();
        }
        traffic.requests = args.requests.unwrap_or(traffic.requests);
        traffic.pattern = args.pattern.unwrap_or(traffic.pattern);
        traffic.write_ratio = args.write_ratio.unwrap_or(traffic.write_ratio);
        traffic.seed = args.seed.unwrap_or(traffic.seed);
    }
    traffic.validate()?;

    Ok(RunConfig {
        sim,
        frontend,
        traffic,
    })
}

pub fn load_config(path: &Path) -> anyhow::Result<RunConfig> {
    parse_config(&read_toml(path)?, None)
}

pub fn make_frontend(config: &RunConfig) -> anyhow::Result<MemoryFrontend> {
    MemoryFrontend::new(&config.frontend)
        .with_context(|| format!("cannot build a '{}' frontend", config.frontend.standard))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOML: &str = r#"
[sim]
log_level = 0
max_cycles = 5000

[frontend]
standard = "HBM"
cache_line_size = 32

[engine]
channels = 4
read_latency = 20

[traffic]
requests = 100
pattern = "strided"
stride = 4096
"#;

    #[test]
    fn sections_are_merged() {
        let config = parse_config(TOML, None).unwrap();
        assert_eq!(5000, config.sim.max_cycles);
        assert_eq!("HBM", config.frontend.standard);
        assert_eq!(32, config.frontend.cache_line_size);
        assert_eq!(Some(4), config.frontend.engine.channels);
        assert_eq!(Some(20), config.frontend.engine.read_latency);
        assert_eq!(None, config.frontend.engine.write_latency);
        assert_eq!(PatternKind::Strided, config.traffic.pattern);
        assert_eq!(4096, config.traffic.stride);
    }

    #[test]
    fn cli_overrides_toml() {
        let args = MemfrontArgs::parse_from([
            "memfront",
            "--standard",
            "DDR3",
            "--requests",
            "7",
            "--pattern",
            "single_channel",
            "--max-cycles",
            "99",
        ]);
        let config = parse_config(TOML, Some(&args)).unwrap();
        assert_eq!("DDR3", config.frontend.standard);
        assert_eq!(7, config.traffic.requests);
        assert_eq!(PatternKind::SingleChannel, config.traffic.pattern);
        assert_eq!(99, config.sim.max_cycles);
        assert_eq!(0, config.sim.log_level);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = parse_config("", None).unwrap();
        assert_eq!(FrontendConfig::default(), config.frontend);
        let frontend = make_frontend(&config).unwrap();
        assert_eq!(1, frontend.num_channels());
    }

    #[test]
    fn engine_overrides_reach_the_engine() {
        let config = parse_config(TOML, None).unwrap();
        let frontend = make_frontend(&config).unwrap();
        assert_eq!(4, frontend.num_channels());
    }

    #[test]
    fn unknown_standard_is_reported() {
        let config = parse_config("[frontend]\nstandard = \"DDR9\"", None).unwrap();
        match make_frontend(&config) {
            Err(err) => assert!(format!("{err:#}").contains("DDR9")),
            Ok(_) => panic!("DDR9 should not resolve"),
        }
    }
}

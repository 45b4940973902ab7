use anyhow::bail;
use clap::Parser;
use memfront::sim::log::{init_logger_at, to_level_filter};
use memfront::traffic::{self, TrafficGenerator};
use memfront::ui::{self, MemfrontArgs};

pub fn main() -> anyhow::Result<()> {
    let argv = MemfrontArgs::parse();
    let toml_string = match &argv.config_path {
        Some(path) => ui::read_toml(path)?,
        None => String::new(),
    };
    let config = ui::parse_config(&toml_string, Some(&argv))?;
    init_logger_at(to_level_filter(config.sim.log_level));

    let mut frontend = ui::make_frontend(&config)?;
    let generator = TrafficGenerator::new(
        &config.traffic,
        config.frontend.cache_line_size,
        frontend.num_channels(),
    )?;
    let outcome = traffic::run(
        &mut frontend,
        generator,
        config.sim.max_cycles,
        config.traffic.submits_per_tick,
    )?;

    let summary = frontend.shutdown()?;
    print!("{}", summary.text);

    if !outcome.completed {
        bail!(
            "workload did not drain within {} cycles ({} of {} requests submitted)",
            config.sim.max_cycles,
            outcome.submitted,
            config.traffic.requests
        );
    }
    Ok(())
}

use anyhow::ensure;
use serde::Deserialize;

use crate::sim::config::Config;

/// Address stream shape.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// consecutive cache lines
    Sequential,
    /// `stride` bytes apart
    Strided,
    /// uniform over `span_bytes`, line aligned
    Random,
    /// consecutive lines of channel 0 only
    #[value(name = "single_channel")]
    SingleChannel,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TrafficConfig {
    pub requests: u64,
    pub pattern: PatternKind,
    pub base: u64,
    pub stride: u64,
    pub span_bytes: u64,
    /// probability of each request being a write
    pub write_ratio: f64,
    pub seed: u64,
    /// upper bound on submissions per tick; backpressure may stop earlier
    pub submits_per_tick: usize,
}

impl Config for TrafficConfig {}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            requests: 4096,
            pattern: PatternKind::Sequential,
            base: 0,
            stride: 256,
            span_bytes: 1 << 30,
            write_ratio: 0.0,
            seed: 0,
            submits_per_tick: 4,
        }
    }
}

impl TrafficConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.write_ratio),
            "traffic write_ratio must be within [0, 1], got {}",
            self.write_ratio
        );
        ensure!(self.submits_per_tick > 0, "traffic submits_per_tick must be > 0");
        ensure!(
            self.pattern != PatternKind::Strided || self.stride > 0,
            "strided traffic needs a non-zero stride"
        );
        ensure!(
            self.pattern != PatternKind::Random || self.span_bytes > 0,
            "random traffic needs a non-zero span_bytes"
        );
        Ok(())
    }
}

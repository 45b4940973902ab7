//! The contract between the frontend and a cycle-level memory timing engine.
//!
//! The frontend never looks inside an engine: it offers one request per channel per step, asks
//! where accepted requests landed, advances the clock and is told about completions through the
//! callback passed to [`TimingEngine::advance_clock`].

pub mod queue_model;
pub mod registry;

use serde::Serialize;

use crate::frontend::request::RequestKind;

pub use queue_model::{EngineParams, QueueEngine};
pub use registry::{create_engine, lookup, standard_names, StandardPreset};

pub type ChannelId = usize;
pub type BankId = usize;
pub type RequestId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineRequest {
    pub id: RequestId,
    pub address: u64,
    pub kind: RequestKind,
}

/// Reported by the engine exactly once for every request it accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub id: RequestId,
    pub channel: ChannelId,
    pub bank: BankId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Topology {
    pub channels: usize,
    pub banks_per_channel: usize,
}

impl Topology {
    pub fn num_banks(&self) -> usize {
        self.channels * self.banks_per_channel
    }
}

pub trait TimingEngine {
    /// Nominal cycle time, informational only.
    fn clock_period_ns(&self) -> f64;

    fn topology(&self) -> Topology;

    fn channel_of(&self, address: u64) -> ChannelId;

    /// Try to admit one request this cycle. Must not block.
    fn accept(&mut self, request: EngineRequest) -> bool;

    /// Bank of the request most recently admitted by `accept`.
    fn bank_of_last_accepted(&self) -> Option<BankId>;

    /// Progress one cycle. May call `on_complete` any number of times.
    fn advance_clock(&mut self, on_complete: &mut dyn FnMut(Completion));

    /// Flush engine state at shutdown and return its own statistics lines.
    fn drain_and_finalize(&mut self) -> Vec<String>;
}

//! Stand-in timing engine: one in-order timed server per bank, a per-channel admission limit and
//! a plain interleaved address decode. Enough to drive the frontend end to end; it models no
//! row buffers, refresh or command timing.

use log::debug;
use serde::Serialize;
use smallvec::SmallVec;

use crate::engine::registry::StandardPreset;
use crate::engine::{
    BankId, ChannelId, Completion, EngineRequest, RequestId, TimingEngine, Topology,
};
use crate::frontend::error::FrontendError;
use crate::frontend::request::RequestKind;
use crate::sim::config::EngineConfig;
use crate::timeq::{Backpressure, Cycle, ServerConfig, ServiceRequest, TimedServer};

#[derive(Debug, Clone, PartialEq)]
pub struct EngineParams {
    pub standard: &'static str,
    pub clock_period_ns: f64,
    pub topology: Topology,
    pub queue_depth: usize,
    pub read_latency: Cycle,
    pub write_latency: Cycle,
    pub bytes_per_cycle: u32,
    pub line_bytes: u32,
}

impl EngineParams {
    /// Preset values with the `[engine]` overrides applied on top.
    pub fn resolve(
        preset: &'static StandardPreset,
        overrides: &EngineConfig,
        line_bytes: u32,
    ) -> Result<Self, FrontendError> {
        let params = Self {
            standard: preset.name,
            clock_period_ns: preset.clock_period_ns,
            topology: Topology {
                channels: overrides.channels.unwrap_or(preset.channels),
                banks_per_channel: overrides
                    .banks_per_channel
                    .unwrap_or(preset.banks_per_channel),
            },
            queue_depth: overrides.queue_depth.unwrap_or(preset.queue_depth),
            read_latency: overrides.read_latency.unwrap_or(preset.read_latency),
            write_latency: overrides.write_latency.unwrap_or(preset.write_latency),
            bytes_per_cycle: overrides.bytes_per_cycle.unwrap_or(preset.bytes_per_cycle),
            line_bytes,
        };
        params.validate()?;
        Ok(params)
    }

    fn validate(&self) -> Result<(), FrontendError> {
        let invalid = |what: &str| Err(FrontendError::InvalidConfig(what.to_string()));
        if self.topology.channels == 0 {
            return invalid("engine needs at least one channel");
        }
        if self.topology.banks_per_channel == 0 {
            return invalid("engine needs at least one bank per channel");
        }
        if self.queue_depth == 0 {
            return invalid("engine queue_depth must be > 0");
        }
        if self.bytes_per_cycle == 0 {
            return invalid("engine bytes_per_cycle must be > 0");
        }
        if !self.line_bytes.is_power_of_two() {
            return invalid("cache_line_size must be a non-zero power of two");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct EngineStats {
    pub accepted_reads: u64,
    pub accepted_writes: u64,
    pub channel_full_rejects: u64,
    pub bank_busy_rejects: u64,
    pub completed: u64,
    pub cycles: u64,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    id: RequestId,
    channel: ChannelId,
    bank: BankId,
}

pub struct QueueEngine {
    params: EngineParams,
    line_shift: u32,
    clk: Cycle,
    banks: Vec<TimedServer<Slot>>,
    channel_inflight: Vec<usize>,
    last_bank: Option<BankId>,
    stats: EngineStats,
}

impl QueueEngine {
    pub fn new(params: EngineParams) -> Self {
        let server = ServerConfig {
            base_latency: params.read_latency,
            bytes_per_cycle: params.bytes_per_cycle,
            queue_capacity: params.queue_depth,
        };
        let banks = (0..params.topology.num_banks())
            .map(|_| TimedServer::new(server))
            .collect();
        Self {
            line_shift: params.line_bytes.trailing_zeros(),
            clk: 0,
            banks,
            channel_inflight: vec![0; params.topology.channels],
            last_bank: None,
            stats: EngineStats::default(),
            params,
        }
    }

    pub fn bank_of(&self, address: u64) -> BankId {
        let line = address >> self.line_shift;
        let channels = self.params.topology.channels as u64;
        ((line / channels) % self.params.topology.banks_per_channel as u64) as BankId
    }

    fn server_index(&self, channel: ChannelId, bank: BankId) -> usize {
        channel * self.params.topology.banks_per_channel + bank
    }
}

impl TimingEngine for QueueEngine {
    fn clock_period_ns(&self) -> f64 {
        self.params.clock_period_ns
    }

    fn topology(&self) -> Topology {
        self.params.topology
    }

    fn channel_of(&self, address: u64) -> ChannelId {
        let line = address >> self.line_shift;
        (line % self.params.topology.channels as u64) as ChannelId
    }

    fn accept(&mut self, request: EngineRequest) -> bool {
        let channel = self.channel_of(request.address);
        if self.channel_inflight[channel] >= self.params.queue_depth {
            self.stats.channel_full_rejects += 1;
            return false;
        }

        let bank = self.bank_of(request.address);
        let latency = match request.kind {
            RequestKind::Read => self.params.read_latency,
            RequestKind::Write => self.params.write_latency,
        };
        let slot = Slot {
            id: request.id,
            channel,
            bank,
        };
        let index = self.server_index(channel, bank);
        let service = ServiceRequest::new(slot, self.params.line_bytes).with_latency(latency);
        match self.banks[index].try_enqueue(self.clk, service) {
            Ok(ticket) => {
                debug!(
                    "{} {}#{} {:#x} -> ch{} bank{} ready@{}",
                    self.params.standard,
                    request.kind.short(),
                    request.id,
                    request.address,
                    channel,
                    bank,
                    ticket.ready_at()
                );
                self.channel_inflight[channel] += 1;
                self.last_bank = Some(bank);
                match request.kind {
                    RequestKind::Read => self.stats.accepted_reads += 1,
                    RequestKind::Write => self.stats.accepted_writes += 1,
                }
                true
            }
            Err(Backpressure::QueueFull { .. }) => {
                self.stats.channel_full_rejects += 1;
                false
            }
            Err(Backpressure::Busy { .. }) => {
                self.stats.bank_busy_rejects += 1;
                false
            }
        }
    }

    fn bank_of_last_accepted(&self) -> Option<BankId> {
        self.last_bank
    }

    fn advance_clock(&mut self, on_complete: &mut dyn FnMut(Completion)) {
        self.clk += 1;
        self.stats.cycles += 1;
        let now = self.clk;

        let mut done: SmallVec<[Slot; 8]> = SmallVec::new();
        for server in self.banks.iter_mut() {
            server.service_ready(now, |result| done.push(result.payload));
        }
        for slot in done {
            self.channel_inflight[slot.channel] -= 1;
            self.stats.completed += 1;
            on_complete(Completion {
                id: slot.id,
                channel: slot.channel,
                bank: slot.bank,
            });
        }
    }

    fn drain_and_finalize(&mut self) -> Vec<String> {
        let pending: usize = self.banks.iter().map(TimedServer::len).sum();
        let s = &self.stats;
        vec![
            format!(
                "{} engine cycles {} tCK {}ns",
                self.params.standard, s.cycles, self.params.clock_period_ns
            ),
            format!(
                "{} engine acceptedReads {} acceptedWrites {} completed {} pending {}",
                self.params.standard, s.accepted_reads, s.accepted_writes, s.completed, pending
            ),
            format!(
                "{} engine channelFullRejects {} bankBusyRejects {}",
                self.params.standard, s.channel_full_rejects, s.bank_busy_rejects
            ),
        ]
    }
}

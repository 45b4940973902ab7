//! Request frontend for a cycle-level memory timing engine.
//!
//! Callers submit (address, kind) pairs whenever they like; requests wait in one FIFO per channel
//! until [`MemoryFrontend::step`] offers the head of each queue to the engine. Completed reads come
//! back through a single completion queue, completed writes only show up in the counters. Nothing
//! here runs on its own: one `step` is one engine clock.

pub mod bank;
pub mod error;
pub mod ingress;
pub mod ledger;
pub mod request;
pub mod telemetry;

#[cfg(test)]
mod unit_tests;

use std::io;
use std::path::PathBuf;

use log::{debug, error, info};
use serde::Serialize;

use crate::engine::{self, ChannelId, EngineRequest, TimingEngine, Topology};
use crate::sim::config::FrontendConfig;
use crate::sim::stats::{self, StatsSink};
use crate::timeq::Cycle;

pub use error::{FrontendError, ProtocolViolation};
pub use ingress::BACKPRESSURE_THRESHOLD;
pub use request::RequestKind;
pub use telemetry::{Telemetry, TelemetryReport};

use ingress::IngressQueues;
use ledger::Ledger;
use request::{InflightRecord, PendingRequest};

/// What `shutdown` produced.
#[derive(Debug, Clone, Serialize)]
pub struct ShutdownSummary {
    pub report: TelemetryReport,
    pub engine_stats: Vec<String>,
    /// Full text written to the statistics sink.
    pub text: String,
}

pub struct MemoryFrontend {
    engine: Box<dyn TimingEngine>,
    topology: Topology,
    cache_line_size: u32,
    now: Cycle,
    ingress: IngressQueues,
    ledger: Ledger,
    sink: StatsSink,
    stats_json: Option<PathBuf>,
    finalized: bool,
}

impl MemoryFrontend {
    /// Build the engine named by `config.standard` and open the statistics sink. Fails without
    /// building anything if the standard is unknown.
    pub fn new(config: &FrontendConfig) -> Result<Self, FrontendError> {
        let engine = engine::create_engine(config)?;
        Self::with_engine(engine, config)
    }

    /// Wrap an already constructed engine. `config.standard` and `config.engine` are ignored.
    pub fn with_engine(
        engine: Box<dyn TimingEngine>,
        config: &FrontendConfig,
    ) -> Result<Self, FrontendError> {
        let topology = engine.topology();
        if topology.channels == 0 || topology.banks_per_channel == 0 {
            return Err(FrontendError::InvalidConfig(format!(
                "engine reports an empty topology ({} channels, {} banks per channel)",
                topology.channels, topology.banks_per_channel
            )));
        }
        if config.cache_line_size == 0 {
            return Err(FrontendError::InvalidConfig(
                "cache_line_size must be > 0".to_string(),
            ));
        }
        let sink = StatsSink::open(config.stats_path.as_deref())?;

        info!(
            "memory frontend: {} channels x {} banks, tCK {}ns, {}B per access, stats -> {}",
            topology.channels,
            topology.banks_per_channel,
            engine.clock_period_ns(),
            config.cache_line_size,
            sink.path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<memory>".to_string())
        );

        Ok(Self {
            engine,
            topology,
            cache_line_size: config.cache_line_size,
            now: 0,
            ingress: IngressQueues::new(topology.channels),
            ledger: Ledger::new(topology),
            sink,
            stats_json: config.stats_json.clone(),
            finalized: false,
        })
    }

    fn channel_for(&self, address: u64) -> ChannelId {
        let channel = self.engine.channel_of(address);
        assert!(
            channel < self.topology.channels,
            "engine mapped {:#x} to channel {} of {}",
            address,
            channel,
            self.topology.channels
        );
        channel
    }

    /// Queue a request on its channel. Never blocks and never refuses; callers that want flow
    /// control poll [`available`](Self::available) first.
    pub fn submit(&mut self, address: u64, kind: RequestKind) {
        let channel = self.channel_for(address);
        self.ingress.push(
            channel,
            PendingRequest {
                address,
                kind,
                arrival_cycle: self.now,
            },
        );
    }

    /// Advisory backpressure: false once the target channel holds more than
    /// [`BACKPRESSURE_THRESHOLD`] requests.
    pub fn available(&self, address: u64) -> bool {
        self.ingress.available(self.channel_for(address))
    }

    /// Advance one clock: offer each channel's head to the engine in channel order, then tick the
    /// engine and retire whatever it reports done.
    pub fn step(&mut self) -> Result<(), FrontendError> {
        self.ledger.record_tick();

        for channel in 0..self.topology.channels {
            self.dispatch(channel)?;
        }

        let now = self.now;
        // the tick ends at now + 1; a request held for L ticks reports latency L
        let departure = now + 1;
        let mut violation = None;
        let Self { engine, ledger, .. } = &mut *self;
        engine.advance_clock(&mut |completion| {
            if violation.is_some() {
                return;
            }
            if let Err(err) = ledger.retire(completion, departure) {
                violation = Some(err);
            }
        });
        self.now += 1;

        match violation {
            Some(err) => {
                error!("cycle {}: {}", now, err);
                Err(err.into())
            }
            None => Ok(()),
        }
    }

    fn dispatch(&mut self, channel: ChannelId) -> Result<(), FrontendError> {
        let Some(head) = self.ingress.front(channel).copied() else {
            return Ok(());
        };
        let id = self.ledger.next_id();
        let request = EngineRequest {
            id,
            address: head.address,
            kind: head.kind,
        };
        if !self.engine.accept(request) {
            return Ok(());
        }
        self.ingress.pop(channel);

        let bank = match self.engine.bank_of_last_accepted() {
            Some(bank) => bank,
            None => {
                let err = ProtocolViolation::MissingBank { id };
                error!("cycle {}: {}", self.now, err);
                return Err(err.into());
            }
        };
        if let Err(err) = self
            .ledger
            .admit(InflightRecord::from_pending(head, channel, bank))
        {
            error!("cycle {}: {}", self.now, err);
            return Err(err.into());
        }
        debug!(
            "cycle {}: accepted {}#{} {:#x} ch{} bank{}",
            self.now,
            head.kind.short(),
            id,
            head.address,
            channel,
            bank
        );
        Ok(())
    }

    pub fn completion_ready(&self) -> bool {
        !self.ledger.completed().is_empty()
    }

    pub fn peek_completed(&self) -> Option<u64> {
        self.ledger.completed().front().copied()
    }

    pub fn pop_completed(&mut self) -> Option<u64> {
        self.ledger.completed_mut().pop_front()
    }

    /// Take every completed read address, oldest first.
    pub fn drain_completed(&mut self) -> Vec<u64> {
        self.ledger.completed_mut().drain(..).collect()
    }

    /// Nothing queued, nothing inflight and nothing left to pop.
    pub fn is_idle(&self) -> bool {
        self.ingress.is_empty() && self.ledger.inflight() == 0 && !self.completion_ready()
    }

    pub fn num_channels(&self) -> usize {
        self.topology.channels
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn queue_len(&self, channel: ChannelId) -> usize {
        self.ingress.len(channel)
    }

    pub fn inflight(&self) -> usize {
        self.ledger.inflight()
    }

    pub fn outstanding(&self) -> u64 {
        self.ledger.outstanding()
    }

    pub fn bank_occupancy(&self, channel: ChannelId, bank: usize) -> Option<u32> {
        self.ledger.banks().count(channel, bank)
    }

    pub fn active_banks(&self) -> usize {
        self.ledger.banks().active_banks()
    }

    pub fn now(&self) -> Cycle {
        self.now
    }

    pub fn clock_period_ns(&self) -> f64 {
        self.engine.clock_period_ns()
    }

    pub fn telemetry(&self) -> &Telemetry {
        self.ledger.telemetry()
    }

    /// One-line dump of queue depths for debugging.
    pub fn internal_size(&self) -> String {
        let queues: Vec<String> = self.ingress.lens().map(|n| n.to_string()).collect();
        format!(
            "cycle {} ingress [{}] inflight {} completed {} active_banks {}",
            self.now,
            queues.join(" "),
            self.ledger.inflight(),
            self.ledger.completed().len(),
            self.active_banks()
        )
    }

    /// Emit the final report, let the engine drain, and release it.
    pub fn shutdown(mut self) -> Result<ShutdownSummary, FrontendError> {
        self.finalize()
    }

    fn finalize(&mut self) -> Result<ShutdownSummary, FrontendError> {
        self.finalized = true;
        let report = self.ledger.telemetry().report(self.cache_line_size);
        info!("{}", report);
        if !self.is_idle() {
            info!("shutting down with work left: {}", self.internal_size());
        }

        let engine_stats = self.engine.drain_and_finalize();
        let mut text = format!("{report}\n");
        for line in &engine_stats {
            text.push_str(line);
            text.push('\n');
        }

        if let Err(source) = self.write_report(&text) {
            return Err(FrontendError::StatsSink {
                path: self.sink.path().map(PathBuf::from).unwrap_or_default(),
                source,
            });
        }

        let summary = ShutdownSummary {
            report,
            engine_stats,
            text,
        };
        if let Some(path) = &self.stats_json {
            stats::write_json(path, &summary)?;
        }
        Ok(summary)
    }

    fn write_report(&mut self, text: &str) -> io::Result<()> {
        for line in text.lines() {
            self.sink.write_line(line)?;
        }
        self.sink.flush()
    }
}

impl Drop for MemoryFrontend {
    fn drop(&mut self) {
        if self.finalized {
            return;
        }
        if let Err(err) = self.finalize() {
            error!("memory frontend shutdown failed: {}", err);
        }
    }
}

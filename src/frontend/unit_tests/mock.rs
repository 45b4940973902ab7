use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

use crate::engine::{BankId, ChannelId, Completion, EngineRequest, TimingEngine, Topology};
use crate::frontend::MemoryFrontend;
use crate::sim::config::FrontendConfig;
use crate::timeq::Cycle;

/// Knobs and observations shared between a test and the engine it handed to the frontend.
#[derive(Debug, Default)]
pub struct MockState {
    pub clk: Cycle,
    pub latency: Cycle,
    pub blocked_channels: HashSet<ChannelId>,
    /// every offer, accepted or not
    pub offers: Vec<(Cycle, EngineRequest)>,
    pub accepted: Vec<EngineRequest>,
    /// delivered on the next clock, ahead of regular completions
    pub injected: VecDeque<Completion>,
    /// replaces the bank reported after an acceptance
    pub bank_override: Option<Option<BankId>>,
    /// report completions that become ready on the same clock youngest first
    pub reverse_order: bool,
    pub finalized: bool,
    pending: Vec<(Cycle, Completion)>,
    last_bank: Option<BankId>,
}

pub type Shared = Rc<RefCell<MockState>>;

pub struct MockEngine {
    topology: Topology,
    state: Shared,
}

impl MockEngine {
    pub fn new(channels: usize, banks_per_channel: usize, latency: Cycle) -> (Self, Shared) {
        let state = Rc::new(RefCell::new(MockState {
            latency,
            ..MockState::default()
        }));
        let engine = Self {
            topology: Topology {
                channels,
                banks_per_channel,
            },
            state: Rc::clone(&state),
        };
        (engine, state)
    }

    fn bank_of(&self, address: u64) -> BankId {
        let line = address >> 6;
        ((line / self.topology.channels as u64) % self.topology.banks_per_channel as u64) as BankId
    }
}

impl TimingEngine for MockEngine {
    fn clock_period_ns(&self) -> f64 {
        1.0
    }

    fn topology(&self) -> Topology {
        self.topology
    }

    fn channel_of(&self, address: u64) -> ChannelId {
        ((address >> 6) % self.topology.channels as u64) as ChannelId
    }

    fn accept(&mut self, request: EngineRequest) -> bool {
        let channel = self.channel_of(request.address);
        let bank = self.bank_of(request.address);
        let mut st = self.state.borrow_mut();
        let clk = st.clk;
        st.offers.push((clk, request));
        if st.blocked_channels.contains(&channel) {
            return false;
        }
        let ready_at = clk + st.latency;
        st.pending.push((
            ready_at,
            Completion {
                id: request.id,
                channel,
                bank,
            },
        ));
        st.accepted.push(request);
        st.last_bank = st.bank_override.unwrap_or(Some(bank));
        true
    }

    fn bank_of_last_accepted(&self) -> Option<BankId> {
        self.state.borrow().last_bank
    }

    fn advance_clock(&mut self, on_complete: &mut dyn FnMut(Completion)) {
        let ready = {
            let mut st = self.state.borrow_mut();
            st.clk += 1;
            let now = st.clk;
            let mut ready: Vec<Completion> = st.injected.drain(..).collect();
            let (done, waiting): (Vec<_>, Vec<_>) =
                st.pending.drain(..).partition(|(at, _)| *at <= now);
            st.pending = waiting;
            let mut done: Vec<Completion> = done.into_iter().map(|(_, c)| c).collect();
            if st.reverse_order {
                done.reverse();
            }
            ready.extend(done);
            ready
        };
        for completion in ready {
            on_complete(completion);
        }
    }

    fn drain_and_finalize(&mut self) -> Vec<String> {
        let mut st = self.state.borrow_mut();
        st.finalized = true;
        vec![format!("mock engine cycles {} pending {}", st.clk, st.pending.len())]
    }
}

pub fn frontend(
    channels: usize,
    banks_per_channel: usize,
    latency: Cycle,
) -> (MemoryFrontend, Shared) {
    let (engine, state) = MockEngine::new(channels, banks_per_channel, latency);
    let frontend = MemoryFrontend::with_engine(Box::new(engine), &FrontendConfig::default())
        .expect("mock topology is valid");
    (frontend, state)
}

/// Step until nothing is queued or inflight, popping completions as they come.
pub fn run_to_idle(frontend: &mut MemoryFrontend, max_steps: u64) -> Vec<u64> {
    let mut popped = Vec::new();
    for _ in 0..max_steps {
        frontend.step().expect("no protocol violation");
        popped.extend(frontend.drain_completed());
        if frontend.is_idle() {
            return popped;
        }
    }
    panic!("frontend not idle after {max_steps} steps: {}", frontend.internal_size());
}

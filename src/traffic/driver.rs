use log::{debug, info, warn};
use serde::Serialize;

use crate::frontend::{FrontendError, MemoryFrontend, RequestKind};
use crate::timeq::Cycle;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrafficOutcome {
    pub submitted: u64,
    pub reads_returned: u64,
    /// ticks spent stalled on backpressure with work left to submit
    pub stalled_ticks: u64,
    pub cycles: Cycle,
    /// false when `max_cycles` ran out first
    pub completed: bool,
}

/// Feed `requests` into `frontend` until the stream is exhausted and the frontend drains, or
/// `max_cycles` ticks have passed. Up to `submits_per_tick` requests are submitted per tick, and
/// only while their channel reports `available`.
pub fn run<I>(
    frontend: &mut MemoryFrontend,
    requests: I,
    max_cycles: Cycle,
    submits_per_tick: usize,
) -> Result<TrafficOutcome, FrontendError>
where
    I: IntoIterator<Item = (u64, RequestKind)>,
{
    let mut requests = requests.into_iter().peekable();
    let mut outcome = TrafficOutcome::default();
    let start = frontend.now();

    loop {
        if requests.peek().is_none() && frontend.is_idle() {
            outcome.completed = true;
            break;
        }
        if frontend.now() - start >= max_cycles {
            warn!(
                "traffic stopped after {} cycles with work left: {}",
                max_cycles,
                frontend.internal_size()
            );
            break;
        }

        let mut submitted_now = 0;
        while submitted_now < submits_per_tick {
            let Some(&(address, kind)) = requests.peek() else {
                break;
            };
            if !frontend.available(address) {
                break;
            }
            frontend.submit(address, kind);
            requests.next();
            submitted_now += 1;
        }
        if submitted_now == 0 && requests.peek().is_some() {
            outcome.stalled_ticks += 1;
        }
        outcome.submitted += submitted_now as u64;

        frontend.step()?;
        outcome.reads_returned += frontend.drain_completed().len() as u64;

        if frontend.now() % 100_000 == 0 {
            debug!(
                "traffic: {} submitted, {} reads back, {}",
                outcome.submitted,
                outcome.reads_returned,
                frontend.internal_size()
            );
        }
    }

    outcome.cycles = frontend.now() - start;
    info!(
        "traffic: {} requests submitted, {} reads returned in {} cycles",
        outcome.submitted, outcome.reads_returned, outcome.cycles
    );
    Ok(outcome)
}

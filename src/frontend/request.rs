use serde::{Deserialize, Serialize};

use crate::engine::{BankId, ChannelId};
use crate::timeq::Cycle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Read,
    Write,
}

impl RequestKind {
    pub fn from_is_write(is_write: bool) -> Self {
        if is_write {
            Self::Write
        } else {
            Self::Read
        }
    }

    pub fn short(self) -> &'static str {
        match self {
            Self::Read => "r",
            Self::Write => "w",
        }
    }
}

/// A request waiting in its channel's ingress queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRequest {
    pub address: u64,
    pub kind: RequestKind,
    pub arrival_cycle: Cycle,
}

/// A request the engine has accepted and not yet completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InflightRecord {
    pub address: u64,
    pub kind: RequestKind,
    pub channel: ChannelId,
    pub bank: BankId,
    pub arrival_cycle: Cycle,
}

impl InflightRecord {
    pub fn from_pending(pending: PendingRequest, channel: ChannelId, bank: BankId) -> Self {
        Self {
            address: pending.address,
            kind: pending.kind,
            channel,
            bank,
            arrival_cycle: pending.arrival_cycle,
        }
    }
}

/// What is left of a request once the engine reports it done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetiredRequest {
    pub address: u64,
    pub kind: RequestKind,
    pub channel: ChannelId,
    pub bank: BankId,
    pub arrival_cycle: Cycle,
    /// first cycle after the tick in which the engine reported completion
    pub departure_cycle: Cycle,
}

impl RetiredRequest {
    pub fn latency(&self) -> Cycle {
        self.departure_cycle.saturating_sub(self.arrival_cycle)
    }
}

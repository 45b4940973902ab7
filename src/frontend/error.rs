use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::engine::{BankId, ChannelId, RequestId};

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("unrecognized standard name '{0}'")]
    UnknownStandard(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("cannot write statistics to {}: {source}", .path.display())]
    StatsSink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("engine protocol violation: {0}")]
    Protocol(#[from] ProtocolViolation),
}

/// The engine broke its side of the contract. Simulation results cannot be trusted afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    #[error("completion for request #{id}, which is not inflight")]
    UnknownCompletion { id: RequestId },
    #[error(
        "request #{id} completed at ch{reported_channel}/bank{reported_bank} \
         but was accepted at ch{channel}/bank{bank}"
    )]
    CompletionMismatch {
        id: RequestId,
        channel: ChannelId,
        bank: BankId,
        reported_channel: ChannelId,
        reported_bank: BankId,
    },
    #[error("request #{id} accepted without a bank id")]
    MissingBank { id: RequestId },
    #[error("ch{channel}/bank{bank} is outside the engine topology")]
    BankOutOfRange {
        channel: ChannelId,
        bank: BankId,
    },
    #[error("ch{channel}/bank{bank} released with no request inflight")]
    BankUnderflow {
        channel: ChannelId,
        bank: BankId,
    },
}

use std::collections::VecDeque;

use crate::engine::ChannelId;
use crate::frontend::request::PendingRequest;

/// Advisory per-channel depth. `available` turns false once a queue holds more than this many
/// requests; `push` never refuses.
pub const BACKPRESSURE_THRESHOLD: usize = 512;

#[derive(Debug, Default)]
pub struct IngressQueues {
    queues: Vec<VecDeque<PendingRequest>>,
}

impl IngressQueues {
    pub fn new(num_channels: usize) -> Self {
        Self {
            queues: (0..num_channels).map(|_| VecDeque::new()).collect(),
        }
    }

    pub fn push(&mut self, channel: ChannelId, request: PendingRequest) {
        self.queues[channel].push_back(request);
    }

    pub fn front(&self, channel: ChannelId) -> Option<&PendingRequest> {
        self.queues[channel].front()
    }

    pub fn pop(&mut self, channel: ChannelId) -> Option<PendingRequest> {
        self.queues[channel].pop_front()
    }

    pub fn len(&self, channel: ChannelId) -> usize {
        self.queues[channel].len()
    }

    pub fn available(&self, channel: ChannelId) -> bool {
        self.len(channel) <= BACKPRESSURE_THRESHOLD
    }

    pub fn is_empty(&self) -> bool {
        self.queues.iter().all(VecDeque::is_empty)
    }

    pub fn lens(&self) -> impl Iterator<Item = usize> + '_ {
        self.queues.iter().map(VecDeque::len)
    }
}

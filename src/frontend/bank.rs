use crate::engine::{BankId, ChannelId, Topology};
use crate::frontend::error::ProtocolViolation;

/// Inflight request count per (channel, bank), sized to the engine's topology. Only feeds BLP.
#[derive(Debug)]
pub struct BankOccupancy {
    topology: Topology,
    counts: Vec<u32>,
    active: usize,
}

impl BankOccupancy {
    pub fn new(topology: Topology) -> Self {
        Self {
            topology,
            counts: vec![0; topology.num_banks()],
            active: 0,
        }
    }

    fn index(&self, channel: ChannelId, bank: BankId) -> Result<usize, ProtocolViolation> {
        if channel >= self.topology.channels || bank >= self.topology.banks_per_channel {
            return Err(ProtocolViolation::BankOutOfRange { channel, bank });
        }
        Ok(channel * self.topology.banks_per_channel + bank)
    }

    /// Returns true if the bank just became active.
    pub fn occupy(&mut self, channel: ChannelId, bank: BankId) -> Result<bool, ProtocolViolation> {
        let idx = self.index(channel, bank)?;
        self.counts[idx] += 1;
        let activated = self.counts[idx] == 1;
        if activated {
            self.active += 1;
        }
        Ok(activated)
    }

    /// Returns true if the bank just went idle.
    pub fn release(&mut self, channel: ChannelId, bank: BankId) -> Result<bool, ProtocolViolation> {
        let idx = self.index(channel, bank)?;
        let count = &mut self.counts[idx];
        if *count == 0 {
            return Err(ProtocolViolation::BankUnderflow { channel, bank });
        }
        *count -= 1;
        let idled = *count == 0;
        if idled {
            self.active -= 1;
        }
        Ok(idled)
    }

    pub fn count(&self, channel: ChannelId, bank: BankId) -> Option<u32> {
        self.index(channel, bank).ok().map(|idx| self.counts[idx])
    }

    pub fn active_banks(&self) -> usize {
        self.active
    }
}

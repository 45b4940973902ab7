//! Everything the completion handler touches: inflight records keyed by request id, bank
//! occupancy, the completion queue and the telemetry counters. Kept apart from the engine so the
//! engine can call back into it while the frontend is in the middle of a step.

use std::collections::{HashMap, VecDeque};

use log::debug;

use crate::engine::{Completion, RequestId, Topology};
use crate::frontend::bank::BankOccupancy;
use crate::frontend::error::ProtocolViolation;
use crate::frontend::request::{InflightRecord, RequestKind, RetiredRequest};
use crate::frontend::telemetry::Telemetry;
use crate::timeq::Cycle;

#[derive(Debug)]
pub struct Ledger {
    next_id: RequestId,
    inflight: HashMap<RequestId, InflightRecord>,
    banks: BankOccupancy,
    completed: VecDeque<u64>,
    telemetry: Telemetry,
}

impl Ledger {
    pub fn new(topology: Topology) -> Self {
        Self {
            next_id: 0,
            inflight: HashMap::new(),
            banks: BankOccupancy::new(topology),
            completed: VecDeque::new(),
            telemetry: Telemetry::default(),
        }
    }

    /// Id the next admitted request will get.
    pub fn next_id(&self) -> RequestId {
        self.next_id
    }

    /// Record a request the engine just accepted under `next_id()`.
    pub fn admit(&mut self, record: InflightRecord) -> Result<RequestId, ProtocolViolation> {
        self.banks.occupy(record.channel, record.bank)?;
        let id = self.next_id;
        self.next_id += 1;
        self.inflight.insert(id, record);
        Ok(id)
    }

    /// Completion handler. Applies every effect of one completion or none of them.
    pub fn retire(
        &mut self,
        completion: Completion,
        departure: Cycle,
    ) -> Result<RetiredRequest, ProtocolViolation> {
        let id = completion.id;
        let record = *self
            .inflight
            .get(&id)
            .ok_or(ProtocolViolation::UnknownCompletion { id })?;
        if (record.channel, record.bank) != (completion.channel, completion.bank) {
            return Err(ProtocolViolation::CompletionMismatch {
                id,
                channel: record.channel,
                bank: record.bank,
                reported_channel: completion.channel,
                reported_bank: completion.bank,
            });
        }
        self.banks.release(record.channel, record.bank)?;
        self.inflight.remove(&id);

        let retired = RetiredRequest {
            address: record.address,
            kind: record.kind,
            channel: record.channel,
            bank: record.bank,
            arrival_cycle: record.arrival_cycle,
            departure_cycle: departure,
        };
        match retired.kind {
            RequestKind::Read => {
                self.completed.push_back(retired.address);
                self.telemetry.record_read(retired.latency());
            }
            RequestKind::Write => self.telemetry.record_write(),
        }
        debug!(
            "retired {}#{} {:#x} ch{} bank{} latency {}",
            retired.kind.short(),
            id,
            retired.address,
            retired.channel,
            retired.bank,
            retired.latency()
        );
        Ok(retired)
    }

    pub fn record_tick(&mut self) {
        self.telemetry
            .record_tick(self.inflight.len(), self.banks.active_banks());
    }

    pub fn inflight(&self) -> usize {
        self.inflight.len()
    }

    /// Accepted and not yet completed. Always equals `inflight()`.
    pub fn outstanding(&self) -> u64 {
        self.inflight.len() as u64
    }

    pub fn banks(&self) -> &BankOccupancy {
        &self.banks
    }

    pub fn completed(&self) -> &VecDeque<u64> {
        &self.completed
    }

    pub fn completed_mut(&mut self) -> &mut VecDeque<u64> {
        &mut self.completed
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> Ledger {
        Ledger::new(Topology {
            channels: 2,
            banks_per_channel: 2,
        })
    }

    fn record(address: u64, kind: RequestKind, channel: usize, bank: usize) -> InflightRecord {
        InflightRecord {
            address,
            kind,
            channel,
            bank,
            arrival_cycle: 3,
        }
    }

    fn completion(id: RequestId, channel: usize, bank: usize) -> Completion {
        Completion { id, channel, bank }
    }

    #[test]
    fn read_lands_in_completion_queue() {
        let mut l = ledger();
        let id = l.admit(record(0x80, RequestKind::Read, 1, 0)).unwrap();
        assert_eq!(0, id);
        assert_eq!(1, l.next_id());
        assert_eq!(1, l.banks().active_banks());

        let retired = l.retire(completion(id, 1, 0), 10).unwrap();
        assert_eq!(7, retired.latency());
        assert_eq!(Some(&0x80), l.completed().front());
        assert_eq!(1, l.telemetry().finished_reads());
        assert_eq!(7, l.telemetry().sum_read_latency());
        assert_eq!(0, l.inflight());
        assert_eq!(0, l.outstanding());
        assert_eq!(0, l.banks().active_banks());
    }

    #[test]
    fn write_is_counted_and_discarded() {
        let mut l = ledger();
        let id = l.admit(record(0x40, RequestKind::Write, 0, 1)).unwrap();
        l.retire(completion(id, 0, 1), 4).unwrap();
        assert!(l.completed().is_empty());
        assert_eq!(1, l.telemetry().finished_writes());
        assert_eq!(0, l.telemetry().finished_reads());
    }

    #[test]
    fn double_completion_is_rejected() {
        let mut l = ledger();
        let id = l.admit(record(0, RequestKind::Read, 0, 0)).unwrap();
        l.retire(completion(id, 0, 0), 5).unwrap();
        assert_eq!(
            Err(ProtocolViolation::UnknownCompletion { id }),
            l.retire(completion(id, 0, 0), 6)
        );
        assert_eq!(1, l.completed().len());
        assert_eq!(0, l.outstanding());
    }

    #[test]
    fn mismatched_bank_leaves_state_untouched() {
        let mut l = ledger();
        let id = l.admit(record(0, RequestKind::Read, 0, 0)).unwrap();
        let err = l.retire(completion(id, 0, 1), 5).unwrap_err();
        assert!(matches!(err, ProtocolViolation::CompletionMismatch { .. }));
        assert_eq!(1, l.inflight());
        assert_eq!(1, l.outstanding());
        assert_eq!(Some(1), l.banks().count(0, 0));
    }

    #[test]
    fn out_of_range_bank_is_refused_at_admission() {
        let mut l = ledger();
        let err = l.admit(record(0, RequestKind::Read, 0, 7)).unwrap_err();
        assert_eq!(
            ProtocolViolation::BankOutOfRange {
                channel: 0,
                bank: 7
            },
            err
        );
        assert_eq!(0, l.inflight());
        assert_eq!(0, l.next_id());
    }
}

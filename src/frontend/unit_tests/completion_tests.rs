use super::mock::{self, run_to_idle};
use crate::engine::Completion;
use crate::frontend::{FrontendError, ProtocolViolation, RequestKind};

#[test]
fn completion_queue_keeps_engine_order() {
    let (mut fe, st) = mock::frontend(2, 2, 2);
    st.borrow_mut().reverse_order = true;
    fe.submit(0x000, RequestKind::Read);
    fe.submit(0x040, RequestKind::Read);

    fe.step().unwrap();
    assert!(!fe.completion_ready());
    fe.step().unwrap();
    assert_eq!(vec![0x040, 0x000], fe.drain_completed());
}

#[test]
fn writes_never_reach_the_completion_queue() {
    let (mut fe, _st) = mock::frontend(2, 2, 3);
    fe.submit(0x000, RequestKind::Write);
    fe.submit(0x040, RequestKind::Read);
    fe.submit(0x080, RequestKind::Write);

    let popped = run_to_idle(&mut fe, 50);
    assert_eq!(vec![0x040], popped);
    assert_eq!(2, fe.telemetry().finished_writes());
    assert_eq!(1, fe.telemetry().finished_reads());
}

#[test]
fn peek_does_not_consume() {
    let (mut fe, _st) = mock::frontend(1, 1, 1);
    assert_eq!(None, fe.peek_completed());
    assert_eq!(None, fe.pop_completed());

    fe.submit(0xdead_beef_c0, RequestKind::Read);
    fe.step().unwrap();
    assert!(fe.completion_ready());
    assert_eq!(Some(0xdead_beef_c0), fe.peek_completed());
    assert_eq!(Some(0xdead_beef_c0), fe.peek_completed());
    assert_eq!(Some(0xdead_beef_c0), fe.pop_completed());
    assert!(!fe.completion_ready());
}

#[test]
fn unknown_completion_is_a_protocol_error() {
    let (mut fe, st) = mock::frontend(1, 1, 4);
    st.borrow_mut().injected.push_back(Completion {
        id: 99,
        channel: 0,
        bank: 0,
    });
    match fe.step() {
        Err(FrontendError::Protocol(ProtocolViolation::UnknownCompletion { id })) => {
            assert_eq!(99, id)
        }
        other => panic!("expected unknown completion, got {other:?}"),
    }
    assert_eq!(0, fe.outstanding());
    assert_eq!(0, fe.active_banks());
}

#[test]
fn duplicate_completion_is_a_protocol_error() {
    let (mut fe, st) = mock::frontend(1, 1, 1);
    fe.submit(0x0, RequestKind::Read);
    fe.step().unwrap();
    assert_eq!(Some(0x0), fe.pop_completed());

    st.borrow_mut().injected.push_back(Completion {
        id: 0,
        channel: 0,
        bank: 0,
    });
    let err = fe.step().unwrap_err();
    assert!(matches!(
        err,
        FrontendError::Protocol(ProtocolViolation::UnknownCompletion { id: 0 })
    ));
    assert!(!fe.completion_ready());
    assert_eq!(1, fe.telemetry().finished_reads());
}

#[test]
fn completion_for_another_bank_is_a_protocol_error() {
    // engine reports bank 1 at acceptance but completes the request on bank 0
    let (mut fe, st) = mock::frontend(1, 2, 2);
    st.borrow_mut().bank_override = Some(Some(1));
    fe.submit(0x0, RequestKind::Read);
    fe.step().unwrap();
    assert_eq!(Some(1), fe.bank_occupancy(0, 1));

    let err = fe.step().unwrap_err();
    match err {
        FrontendError::Protocol(ProtocolViolation::CompletionMismatch {
            bank,
            reported_bank,
            ..
        }) => assert_eq!((1, 0), (bank, reported_bank)),
        other => panic!("expected mismatch, got {other:?}"),
    }
    assert_eq!(1, fe.outstanding());
}

#[test]
fn acceptance_without_a_bank_is_a_protocol_error() {
    let (mut fe, st) = mock::frontend(1, 2, 2);
    st.borrow_mut().bank_override = Some(None);
    fe.submit(0x0, RequestKind::Write);
    let err = fe.step().unwrap_err();
    assert!(matches!(
        err,
        FrontendError::Protocol(ProtocolViolation::MissingBank { id: 0 })
    ));
}

#[test]
fn bank_outside_topology_is_a_protocol_error() {
    let (mut fe, st) = mock::frontend(1, 2, 2);
    st.borrow_mut().bank_override = Some(Some(9));
    fe.submit(0x0, RequestKind::Read);
    let err = fe.step().unwrap_err();
    assert!(matches!(
        err,
        FrontendError::Protocol(ProtocolViolation::BankOutOfRange { channel: 0, bank: 9 })
    ));
    assert_eq!(0, fe.inflight());
}

//! Session Lifecycle Tests
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
use patina_tcg_opal::{MethodStatus, OpalSession, RetryPolicy, TcgError, TransportConfig, uid};

use crate::opal_integration::common::*;

#[test]
fn test_anybody_session_on_admin_sp() {
    init_logger();
    let tper = SimulatedTper::opal2();
    let stall = RecordingStall::default();

    let mut session = OpalSession::new(&tper, &stall, 0, COM_ID);
    assert_eq!(session.start_session(uid::ADMIN_SP, true, None, None), Ok(MethodStatus::SUCCESS));
    assert_eq!(session.tper_session_id(), Some(TPER_SESSION_ID));
    assert_eq!(tper.calls(), vec![Call::new(uid::SMUID, uid::METHOD_START_SESSION)]);
}

#[test]
fn test_start_then_end_sends_one_end_session() {
    init_logger();
    let tper = SimulatedTper::opal2();
    let stall = RecordingStall::default();

    let session = open(&tper, &stall, uid::ADMIN_SP, uid::AUTHORITY_SID, MSID);
    session.end_session().unwrap();

    let state = tper.state.borrow();
    assert_eq!(state.end_sessions, 1);
    assert_eq!(state.session, None);
    assert_eq!(state.calls.len(), 1);
}

#[test]
fn test_wrong_pin_is_a_refusal_not_an_error() {
    init_logger();
    let tper = SimulatedTper::opal2();
    let stall = RecordingStall::default();

    let mut session = OpalSession::new(&tper, &stall, 0, COM_ID);
    assert_eq!(
        session.start_session(uid::ADMIN_SP, true, Some(&b"not the msid"[..]), Some(uid::AUTHORITY_SID)),
        Ok(MethodStatus::NOT_AUTHORIZED)
    );
    assert_eq!(session.tper_session_id(), None);
    assert_eq!(tper.state.borrow().end_sessions, 0);

    let session = open(&tper, &stall, uid::ADMIN_SP, uid::AUTHORITY_SID, MSID);
    assert_eq!(session.get_tries(uid::CPIN_SID), Ok(1));
    assert_eq!(session.get_try_limit(uid::CPIN_SID), Ok(5));
    session.end_session().unwrap();
}

#[test]
fn test_locking_sp_is_closed_until_activated() {
    init_logger();
    let tper = SimulatedTper::opal2();
    let stall = RecordingStall::default();

    let mut session = OpalSession::new(&tper, &stall, 0, COM_ID);
    assert_eq!(
        session.start_session(uid::LOCKING_SP, true, Some(MSID), Some(uid::AUTHORITY_LOCKING_SP_ADMIN1)),
        Ok(MethodStatus::INVALID_PARAMETER)
    );

    take_ownership(&tper, &stall, b"owner");
    let session = open(&tper, &stall, uid::LOCKING_SP, uid::AUTHORITY_LOCKING_SP_ADMIN1, b"owner");
    session.end_session().unwrap();
}

#[test]
fn test_refused_start_session() {
    init_logger();
    let tper = SimulatedTper::opal2();
    tper.state.borrow_mut().refuse = Some((uid::SMUID, MethodStatus::NO_SESSIONS_AVAILABLE));
    let stall = RecordingStall::default();

    let mut session = OpalSession::new(&tper, &stall, 0, COM_ID);
    assert_eq!(session.start_session(uid::ADMIN_SP, false, None, None), Ok(MethodStatus::NO_SESSIONS_AVAILABLE));
    assert_eq!(session.tper_session_id(), None);
}

#[test]
fn test_slow_answers_are_polled() {
    init_logger();
    let tper = SimulatedTper::opal2();
    tper.state.borrow_mut().not_ready_polls = 3;
    let stall = RecordingStall::default();

    let session = open(&tper, &stall, uid::ADMIN_SP, uid::AUTHORITY_SID, MSID);
    assert_eq!(session.tper_session_id(), Some(TPER_SESSION_ID));
    assert_eq!(tper.state.borrow().session_receives, 4);
    assert_eq!(stall.count.get(), 3);
    assert_eq!(stall.total_us.get(), 3 * 2000);
}

#[test]
fn test_exhausted_polling_fails() {
    init_logger();
    let tper = SimulatedTper::opal2();
    tper.state.borrow_mut().not_ready_polls = 10;
    let stall = RecordingStall::default();
    let config = TransportConfig {
        retry: RetryPolicy { min_attempts: 4, attempts_per_second: 1, interval_us: 10 },
        ..Default::default()
    };

    let mut session = OpalSession::new(&tper, &stall, 0, COM_ID).with_config(config);
    assert_eq!(session.start_session(uid::ADMIN_SP, true, None, None), Err(TcgError::Failure));
    assert_eq!(session.tper_session_id(), None);
    assert_eq!(tper.state.borrow().session_receives, 4);
    assert_eq!(stall.count.get(), 3);
}

#[test]
fn test_methods_without_session_send_nothing() {
    init_logger();
    let tper = SimulatedTper::opal2();
    let stall = RecordingStall::default();
    let session = OpalSession::new(&tper, &stall, 0, COM_ID);

    assert_eq!(session.activate_locking_sp(), Err(TcgError::Failure));
    assert_eq!(session.set_password(uid::CPIN_SID, b"pw"), Err(TcgError::Failure));
    assert_eq!(session.psid_revert(), Err(TcgError::Failure));
    assert!(tper.calls().is_empty());
}

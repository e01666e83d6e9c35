//! Security Operation Tests
//!
//! Ownership, credentials, locking ranges, key generation and revert against the simulated TPer.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
use patina_tcg_core::discovery::DataRemovalMechanism;
use patina_tcg_opal::{
    MethodStatus, OpalSession, TcgError, TcgUid,
    uid::{self, locking_column},
};

use crate::opal_integration::common::*;

const OWNER_PIN: &[u8] = b"owner-pin";
const USER_PIN: &[u8] = b"user-pin";

fn owned_opal2() -> SimulatedTper {
    let tper = SimulatedTper::opal2();
    take_ownership(&tper, &RecordingStall::default(), OWNER_PIN);
    tper.clear_calls();
    tper
}

fn column(column: u8) -> u32 {
    column as u32
}

#[test]
fn test_take_ownership() {
    init_logger();
    let tper = SimulatedTper::opal2();
    let stall = RecordingStall::default();
    take_ownership(&tper, &stall, OWNER_PIN);

    assert_eq!(tper.pin(uid::CPIN_SID).as_deref(), Some(OWNER_PIN));
    assert_eq!(tper.pin(uid::CPIN_LOCKING_SP_ADMIN1).as_deref(), Some(OWNER_PIN));
    assert!(tper.state.borrow().locking_sp_active);

    let mut session = OpalSession::new(&tper, &stall, 0, COM_ID);
    assert_eq!(
        session.start_session(uid::ADMIN_SP, true, Some(MSID), Some(uid::AUTHORITY_SID)),
        Ok(MethodStatus::NOT_AUTHORIZED)
    );
}

#[test]
fn test_activate_locking_sp_is_idempotent() {
    init_logger();
    let tper = SimulatedTper::opal2();
    let stall = RecordingStall::default();

    let session = open(&tper, &stall, uid::ADMIN_SP, uid::AUTHORITY_SID, MSID);
    assert_eq!(session.activate_locking_sp(), Ok(MethodStatus::SUCCESS));
    assert_eq!(session.activate_locking_sp(), Ok(MethodStatus::SUCCESS));
    session.end_session().unwrap();
    assert!(tper.state.borrow().locking_sp_active);
}

#[test]
fn test_get_msid() {
    init_logger();
    let tper = SimulatedTper::opal2();
    let stall = RecordingStall::default();

    let mut session = OpalSession::new(&tper, &stall, 0, COM_ID);
    assert_eq!(session.start_session(uid::ADMIN_SP, false, None, None), Ok(MethodStatus::SUCCESS));

    let mut small = [0xAAu8; 16];
    assert_eq!(session.get_msid(&mut small), Err(TcgError::BufferTooSmall { required: MSID.len() }));
    assert_eq!(MSID.len(), 42);
    assert!(small.iter().all(|b| *b == 0xAA));

    let mut buffer = [0u8; 64];
    assert_eq!(session.get_msid(&mut buffer), Ok(MSID.len()));
    assert_eq!(&buffer[..MSID.len()], MSID);
    session.end_session().unwrap();
}

#[test]
fn test_read_only_session_cannot_set_password() {
    init_logger();
    let tper = SimulatedTper::opal2();
    let stall = RecordingStall::default();

    let mut session = OpalSession::new(&tper, &stall, 0, COM_ID);
    assert_eq!(
        session.start_session(uid::ADMIN_SP, false, Some(MSID), Some(uid::AUTHORITY_SID)),
        Ok(MethodStatus::SUCCESS)
    );
    assert_eq!(session.set_password(uid::CPIN_SID, b"new"), Ok(MethodStatus::NOT_AUTHORIZED));
    assert_eq!(tper.pin(uid::CPIN_SID).as_deref(), Some(MSID));
}

#[test]
fn test_set_locking_range_is_idempotent() {
    init_logger();
    let tper = owned_opal2();
    let stall = RecordingStall::default();
    let session = open(&tper, &stall, uid::LOCKING_SP, uid::AUTHORITY_LOCKING_SP_ADMIN1, OWNER_PIN);
    let range = uid::locking_range(1);

    for _ in 0..2 {
        assert_eq!(
            session.set_locking_range(range, 0x800, 0x10_0000, true, true, false, true),
            Ok(MethodStatus::SUCCESS)
        );
        assert_eq!(tper.value(range, column(locking_column::RANGE_START)), Some(Value::Uint(0x800)));
        assert_eq!(tper.value(range, column(locking_column::RANGE_LENGTH)), Some(Value::Uint(0x10_0000)));
        assert_eq!(tper.value(range, column(locking_column::WRITE_LOCKED)), Some(Value::Uint(1)));
    }
    assert_eq!(
        tper.calls(),
        vec![
            Call::new(uid::SMUID, uid::METHOD_START_SESSION),
            Call::new(range, uid::METHOD_SET),
            Call::new(range, uid::METHOD_SET),
        ]
    );
    session.end_session().unwrap();
}

#[test]
fn test_global_range_ignores_start_and_length() {
    init_logger();
    let tper = owned_opal2();
    let stall = RecordingStall::default();
    let session = open(&tper, &stall, uid::LOCKING_SP, uid::AUTHORITY_LOCKING_SP_ADMIN1, OWNER_PIN);

    assert_eq!(
        session.set_locking_range(uid::LOCKING_RANGE_GLOBAL, 5, 5, true, true, true, false),
        Ok(MethodStatus::SUCCESS)
    );
    let global = uid::LOCKING_RANGE_GLOBAL;
    assert_eq!(tper.value(global, column(locking_column::RANGE_START)), Some(Value::Uint(0)));
    assert_eq!(tper.value(global, column(locking_column::RANGE_LENGTH)), Some(Value::Uint(0)));
    assert_eq!(tper.value(global, column(locking_column::READ_LOCKED)), Some(Value::Uint(1)));

    assert_eq!(session.update_global_locking_range(false, false), Ok(MethodStatus::SUCCESS));
    assert_eq!(tper.value(global, column(locking_column::READ_LOCKED)), Some(Value::Uint(0)));
    session.end_session().unwrap();
}

#[test]
fn test_enable_user_and_grant_global_range_control() {
    init_logger();
    let tper = owned_opal2();
    let stall = RecordingStall::default();
    let admin = open(&tper, &stall, uid::LOCKING_SP, uid::AUTHORITY_LOCKING_SP_ADMIN1, OWNER_PIN);
    tper.clear_calls();

    assert_eq!(
        admin.set_locking_sp_authority_enabled_and_pin(
            uid::CPIN_LOCKING_SP_USER1,
            uid::AUTHORITY_LOCKING_SP_USER1,
            USER_PIN
        ),
        Ok(MethodStatus::SUCCESS)
    );
    assert_eq!(
        tper.calls(),
        vec![
            Call::new(uid::AUTHORITY_LOCKING_SP_USER1, uid::METHOD_SET),
            Call::new(uid::CPIN_LOCKING_SP_USER1, uid::METHOD_SET),
            Call::new(uid::ACE_LOCKING_GLOBAL_RANGE_SET_RD_LOCKED, uid::METHOD_SET),
            Call::new(uid::ACE_LOCKING_GLOBAL_RANGE_SET_WR_LOCKED, uid::METHOD_SET),
            Call::new(uid::ACE_LOCKING_GLOBAL_RANGE_GET_ALL, uid::METHOD_SET),
            Call::new(uid::LOCKING_RANGE_GLOBAL, uid::METHOD_GET),
            Call::new(uid::ACE_K_AES_256_GLOBAL_RANGE_GEN_KEY, uid::METHOD_SET),
        ]
    );
    assert_eq!(tper.value(uid::ACE_K_AES_256_GLOBAL_RANGE_GEN_KEY, ACE_BOOLEAN_EXPR), Some(Value::List));
    assert_eq!(tper.pin(uid::CPIN_LOCKING_SP_USER1).as_deref(), Some(USER_PIN));
    admin.end_session().unwrap();

    let user = open(&tper, &stall, uid::LOCKING_SP, uid::AUTHORITY_LOCKING_SP_USER1, USER_PIN);
    assert_eq!(user.update_global_locking_range(true, true), Ok(MethodStatus::SUCCESS));
    user.end_session().unwrap();

    let admin = open(&tper, &stall, uid::LOCKING_SP, uid::AUTHORITY_LOCKING_SP_ADMIN1, OWNER_PIN);
    assert_eq!(admin.disable_user(), Ok(MethodStatus::SUCCESS));
    admin.end_session().unwrap();

    let mut user = OpalSession::new(&tper, &stall, 0, COM_ID);
    assert_eq!(
        user.start_session(uid::LOCKING_SP, true, Some(USER_PIN), Some(uid::AUTHORITY_LOCKING_SP_USER1)),
        Ok(MethodStatus::NOT_AUTHORIZED)
    );
}

#[test]
fn test_refused_ace_grant_is_a_failure_without_rollback() {
    init_logger();
    let tper = owned_opal2();
    tper.state.borrow_mut().refuse = Some((uid::ACE_LOCKING_GLOBAL_RANGE_GET_ALL, MethodStatus::NOT_AUTHORIZED));
    let stall = RecordingStall::default();
    let admin = open(&tper, &stall, uid::LOCKING_SP, uid::AUTHORITY_LOCKING_SP_ADMIN1, OWNER_PIN);

    assert_eq!(
        admin.set_locking_sp_authority_enabled_and_pin(
            uid::CPIN_LOCKING_SP_USER1,
            uid::AUTHORITY_LOCKING_SP_USER1,
            USER_PIN
        ),
        Err(TcgError::Failure)
    );
    assert_eq!(tper.value(uid::AUTHORITY_LOCKING_SP_USER1, AUTHORITY_ENABLED), Some(Value::Uint(1)));
    assert_eq!(tper.pin(uid::CPIN_LOCKING_SP_USER1).as_deref(), Some(USER_PIN));
    assert!(!tper.calls().contains(&Call::new(uid::LOCKING_RANGE_GLOBAL, uid::METHOD_GET)));
}

#[test]
fn test_refused_enable_is_returned_as_status() {
    init_logger();
    let tper = owned_opal2();
    tper.state.borrow_mut().refuse = Some((uid::AUTHORITY_LOCKING_SP_USER1, MethodStatus::INVALID_PARAMETER));
    let stall = RecordingStall::default();
    let admin = open(&tper, &stall, uid::LOCKING_SP, uid::AUTHORITY_LOCKING_SP_ADMIN1, OWNER_PIN);
    tper.clear_calls();

    assert_eq!(
        admin.set_locking_sp_authority_enabled_and_pin(
            uid::CPIN_LOCKING_SP_USER1,
            uid::AUTHORITY_LOCKING_SP_USER1,
            USER_PIN
        ),
        Ok(MethodStatus::INVALID_PARAMETER)
    );
    assert_eq!(tper.calls().len(), 1);
}

#[test]
fn test_unknown_active_key_is_a_failure() {
    init_logger();
    let tper = owned_opal2();
    tper.state.borrow_mut().tables.insert(
        (uid::LOCKING_RANGE_GLOBAL, column(locking_column::ACTIVE_KEY)),
        Value::Bytes(TcgUid(0x0000_0807_0000_0001).to_bytes().to_vec()),
    );
    let stall = RecordingStall::default();
    let admin = open(&tper, &stall, uid::LOCKING_SP, uid::AUTHORITY_LOCKING_SP_ADMIN1, OWNER_PIN);

    assert_eq!(
        admin.set_locking_sp_authority_enabled_and_pin(
            uid::CPIN_LOCKING_SP_USER1,
            uid::AUTHORITY_LOCKING_SP_USER1,
            USER_PIN
        ),
        Err(TcgError::Failure)
    );
    assert_eq!(tper.value(uid::ACE_LOCKING_GLOBAL_RANGE_GET_ALL, ACE_BOOLEAN_EXPR), Some(Value::List));
}

#[test]
fn test_pyrite_grant_skips_gen_key_ace() {
    init_logger();
    let tper = SimulatedTper::pyrite2();
    let stall = RecordingStall::default();
    take_ownership(&tper, &stall, OWNER_PIN);
    let admin = open(&tper, &stall, uid::LOCKING_SP, uid::AUTHORITY_LOCKING_SP_ADMIN1, OWNER_PIN);

    assert_eq!(admin.retrieve_global_locking_range_active_key(), Err(TcgError::Failure));
    assert_eq!(
        admin.set_locking_sp_authority_enabled_and_pin(
            uid::CPIN_LOCKING_SP_USER1,
            uid::AUTHORITY_LOCKING_SP_USER1,
            USER_PIN
        ),
        Ok(MethodStatus::SUCCESS)
    );
    assert_eq!(tper.value(uid::ACE_K_AES_128_GLOBAL_RANGE_GEN_KEY, ACE_BOOLEAN_EXPR), None);
    assert_eq!(tper.value(uid::ACE_K_AES_256_GLOBAL_RANGE_GEN_KEY, ACE_BOOLEAN_EXPR), None);
    admin.end_session().unwrap();
}

#[test]
fn test_global_range_gen_key() {
    init_logger();
    let tper = owned_opal2();
    let stall = RecordingStall::default();
    let admin = open(&tper, &stall, uid::LOCKING_SP, uid::AUTHORITY_LOCKING_SP_ADMIN1, OWNER_PIN);
    tper.clear_calls();

    assert_eq!(admin.retrieve_global_locking_range_active_key(), Ok(uid::K_AES_256_GLOBAL_RANGE_KEY));
    assert_eq!(admin.global_locking_range_gen_key(), Ok(MethodStatus::SUCCESS));
    assert_eq!(tper.state.borrow().gen_keys, 1);
    assert_eq!(tper.calls().last(), Some(&Call::new(uid::K_AES_256_GLOBAL_RANGE_KEY, uid::METHOD_GEN_KEY)));
    admin.end_session().unwrap();
}

#[test]
fn test_admin_revert_keeping_data_aborts_when_unlock_is_refused() {
    init_logger();
    let tper = owned_opal2();
    let stall = RecordingStall::default();
    let admin = open(&tper, &stall, uid::LOCKING_SP, uid::AUTHORITY_LOCKING_SP_ADMIN1, OWNER_PIN);
    assert_eq!(admin.update_global_locking_range(true, false), Ok(MethodStatus::SUCCESS));

    tper.state.borrow_mut().refuse = Some((uid::LOCKING_RANGE_GLOBAL, MethodStatus::NOT_AUTHORIZED));
    tper.clear_calls();

    assert_eq!(admin.admin_revert(true), Ok(MethodStatus::NOT_AUTHORIZED));
    assert_eq!(tper.calls(), vec![Call::new(uid::LOCKING_RANGE_GLOBAL, uid::METHOD_SET)]);
    assert!(tper.state.borrow().reverts.is_empty());
    assert!(tper.state.borrow().locking_sp_active);
}

#[test]
fn test_admin_revert_keeping_data_unlocks_first() {
    init_logger();
    let tper = owned_opal2();
    let stall = RecordingStall::default();
    let admin = open(&tper, &stall, uid::LOCKING_SP, uid::AUTHORITY_LOCKING_SP_ADMIN1, OWNER_PIN);
    assert_eq!(admin.update_global_locking_range(true, true), Ok(MethodStatus::SUCCESS));
    tper.clear_calls();

    assert_eq!(admin.admin_revert(true), Ok(MethodStatus::SUCCESS));
    assert_eq!(
        tper.calls(),
        vec![Call::new(uid::LOCKING_RANGE_GLOBAL, uid::METHOD_SET), Call::new(uid::THIS_SP, uid::METHOD_REVERT_SP)]
    );

    let state = tper.state.borrow();
    assert_eq!(state.reverts, vec![true]);
    assert!(!state.locking_sp_active);
    // The revert closed the session on the drive; no EndSession follows it.
    assert_eq!(state.end_sessions, 1);
    assert_eq!(state.session, None);
}

#[test]
fn test_admin_revert_erasing_data() {
    init_logger();
    let tper = owned_opal2();
    let stall = RecordingStall::default();
    let admin = open(&tper, &stall, uid::LOCKING_SP, uid::AUTHORITY_LOCKING_SP_ADMIN1, OWNER_PIN);
    tper.clear_calls();

    assert_eq!(admin.admin_revert(false), Ok(MethodStatus::SUCCESS));
    assert_eq!(tper.calls(), vec![Call::new(uid::THIS_SP, uid::METHOD_REVERT_SP)]);
    assert_eq!(tper.state.borrow().reverts, vec![false]);
    assert_eq!(tper.pin(uid::CPIN_SID).as_deref(), Some(OWNER_PIN));
}

#[test]
fn test_psid_revert_restores_factory_state() {
    init_logger();
    let tper = owned_opal2();
    let stall = RecordingStall::default();

    let session = open(&tper, &stall, uid::ADMIN_SP, uid::AUTHORITY_PSID, PSID);
    assert_eq!(session.psid_revert(), Ok(MethodStatus::SUCCESS));
    assert_eq!(tper.calls().last(), Some(&Call::new(uid::ADMIN_SP, uid::METHOD_REVERT)));
    assert!(!tper.state.borrow().locking_sp_active);
    assert_eq!(tper.pin(uid::CPIN_SID).as_deref(), Some(MSID));

    // Ownership can be taken again with the MSID.
    take_ownership(&tper, &stall, b"second-owner");
}

#[test]
fn test_psid_revert_needs_psid_authority() {
    init_logger();
    let tper = owned_opal2();
    let stall = RecordingStall::default();

    let mut session = OpalSession::new(&tper, &stall, 0, COM_ID);
    assert_eq!(session.start_session(uid::ADMIN_SP, true, None, None), Ok(MethodStatus::SUCCESS));
    assert_eq!(session.psid_revert(), Ok(MethodStatus::NOT_AUTHORIZED));
    assert!(tper.state.borrow().locking_sp_active);
}

#[test]
fn test_pyrite2_data_removal_and_revert() {
    init_logger();
    let tper = SimulatedTper::pyrite2();
    let stall = RecordingStall::default();

    let session = open(&tper, &stall, uid::ADMIN_SP, uid::AUTHORITY_SID, MSID);
    assert_eq!(
        session.pyrite2_get_active_data_removal_mechanism(),
        Ok(DataRemovalMechanism::CryptographicErase)
    );
    assert_eq!(session.pyrite2_admin_revert(false, 3600), Ok(MethodStatus::SUCCESS));
    assert_eq!(tper.state.borrow().reverts, vec![false]);
}

#[test]
fn test_pyrite2_psid_revert_with_estimate() {
    init_logger();
    let tper = SimulatedTper::pyrite2();
    let stall = RecordingStall::default();
    take_ownership(&tper, &stall, OWNER_PIN);
    let session = open(&tper, &stall, uid::ADMIN_SP, uid::AUTHORITY_PSID, PSID);

    // Beyond the 5000 attempt floor, within the budget of a 20 second estimate.
    tper.state.borrow_mut().not_ready_polls = 6000;
    assert_eq!(session.pyrite2_psid_revert(20), Ok(MethodStatus::SUCCESS));
    assert_eq!(stall.count.get(), 6000);
}

//! Common Test Infrastructure for the Opal Integration Tests
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent


pub use device::*;

use std::sync::Once;

use patina_tcg_opal::{MethodStatus, OpalSession, TcgUid, uid};

static INIT: Once = Once::new();

pub fn init_logger() {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();

        // No logging unless RUST_LOG is set.
        if std::env::var("RUST_LOG").is_err() {
            builder.filter_level(log::LevelFilter::Off);
        }

        builder.is_test(true).init();
    });
}

/// Opens a write session on `sp` as `authority` with `pin`, panicking on refusal.
pub fn open<'a>(
    tper: &'a SimulatedTper,
    stall: &'a RecordingStall,
    sp: TcgUid,
    authority: TcgUid,
    pin: &[u8],
) -> OpalSession<'a> {
    let mut session = OpalSession::new(tper, stall, 0, COM_ID);
    let status = session.start_session(sp, true, Some(pin), Some(authority)).expect("StartSession exchange");
    assert_eq!(status, MethodStatus::SUCCESS, "StartSession on {} as {}", sp, authority);
    session
}

/// Takes ownership of a fresh drive: SID PIN set to `sid_pin` and the Locking SP activated.
pub fn take_ownership(tper: &SimulatedTper, stall: &RecordingStall, sid_pin: &[u8]) {
    let session = open(tper, stall, uid::ADMIN_SP, uid::AUTHORITY_SID, MSID);
    assert_eq!(session.set_password(uid::CPIN_SID, sid_pin), Ok(MethodStatus::SUCCESS));
    assert_eq!(session.activate_locking_sp(), Ok(MethodStatus::SUCCESS));
    session.end_session().expect("EndSession");
}

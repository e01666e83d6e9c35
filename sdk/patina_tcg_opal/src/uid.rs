//! Opal SSC object UIDs and column numbers.
//!
//! Core UIDs shared by every SSC (Session Manager, ThisSP, method UIDs) live in [`patina_tcg_core::uid`] and are
//! re-exported here.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
pub use patina_tcg_core::uid::*;

pub const ADMIN_SP: TcgUid = TcgUid(0x0000_0205_0000_0001);
pub const LOCKING_SP: TcgUid = TcgUid(0x0000_0205_0000_0002);

// Admin SP authorities.
pub const AUTHORITY_SID: TcgUid = TcgUid(0x0000_0009_0000_0006);
pub const AUTHORITY_PSID: TcgUid = TcgUid(0x0000_0009_0001_FF01);

// Locking SP authorities.
pub const AUTHORITY_LOCKING_SP_ADMIN1: TcgUid = TcgUid(0x0000_0009_0001_0001);
pub const AUTHORITY_LOCKING_SP_USER1: TcgUid = TcgUid(0x0000_0009_0003_0001);

// C_PIN rows.
pub const CPIN_SID: TcgUid = TcgUid(0x0000_000B_0000_0001);
pub const CPIN_MSID: TcgUid = TcgUid(0x0000_000B_0000_8402);
pub const CPIN_LOCKING_SP_ADMIN1: TcgUid = TcgUid(0x0000_000B_0001_0001);
pub const CPIN_LOCKING_SP_USER1: TcgUid = TcgUid(0x0000_000B_0003_0001);

// Locking table rows.
pub const LOCKING_RANGE_GLOBAL: TcgUid = TcgUid(0x0000_0802_0000_0001);

/// Returns the Locking table row of non-global range `index` (1 based).
pub const fn locking_range(index: u8) -> TcgUid {
    TcgUid(0x0000_0802_0003_0000 | index as u64)
}

// ACE rows protecting the global locking range and its keys.
pub const ACE_LOCKING_GLOBAL_RANGE_SET_RD_LOCKED: TcgUid = TcgUid(0x0000_0008_0003_E000);
pub const ACE_LOCKING_GLOBAL_RANGE_SET_WR_LOCKED: TcgUid = TcgUid(0x0000_0008_0003_E800);
pub const ACE_LOCKING_GLOBAL_RANGE_GET_ALL: TcgUid = TcgUid(0x0000_0008_0003_D000);
pub const ACE_K_AES_128_GLOBAL_RANGE_GEN_KEY: TcgUid = TcgUid(0x0000_0008_0003_B000);
pub const ACE_K_AES_256_GLOBAL_RANGE_GEN_KEY: TcgUid = TcgUid(0x0000_0008_0003_B800);

// Media encryption key rows of the global range.
pub const K_AES_128_GLOBAL_RANGE_KEY: TcgUid = TcgUid(0x0000_0805_0000_0001);
pub const K_AES_256_GLOBAL_RANGE_KEY: TcgUid = TcgUid(0x0000_0806_0000_0001);

/// Pyrite 2.0 DataRemovalMechanism table row.
pub const DATA_REMOVAL_MECHANISM: TcgUid = TcgUid(0x0000_1101_0000_0001);

/// Name of the RevertSP parameter asking the drive to keep the global range key.
pub const REVERT_KEEP_GLOBAL_RANGE_KEY: u32 = 0x0006_0000;

/// C_PIN table columns.
pub mod cpin_column {
    pub const PIN: u8 = 3;
    pub const TRY_LIMIT: u8 = 5;
    pub const TRIES: u8 = 6;
}

/// Locking table columns.
pub mod locking_column {
    pub const RANGE_START: u8 = 3;
    pub const RANGE_LENGTH: u8 = 4;
    pub const READ_LOCK_ENABLED: u8 = 5;
    pub const WRITE_LOCK_ENABLED: u8 = 6;
    pub const READ_LOCKED: u8 = 7;
    pub const WRITE_LOCKED: u8 = 8;
    pub const LOCK_ON_RESET: u8 = 9;
    pub const ACTIVE_KEY: u8 = 10;
}

/// DataRemovalMechanism table column holding the active mechanism.
pub const DATA_REMOVAL_ACTIVE_MECHANISM_COLUMN: u8 = 1;

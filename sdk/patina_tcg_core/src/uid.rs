//! TCG Unique Identifiers (UIDs)
//!
//! Objects, tables, rows and methods on a TPer are all addressed by 8 byte UIDs transmitted as byte sequence atoms.
//! The values here are the ones defined by the TCG Storage Architecture Core Specification. SSC specific UIDs (for
//! example the Opal Locking SP rows) are defined by the crates implementing those SSCs.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
use core::fmt;

/// An 8 byte TCG UID, held as the big-endian integer it is on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TcgUid(pub u64);

impl TcgUid {
    /// Size of a UID in bytes.
    pub const SIZE: usize = 8;

    /// Builds a UID from its eight wire bytes.
    pub const fn from_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_be_bytes(bytes))
    }

    /// Builds a UID from a slice, which must be exactly eight bytes long.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; 8] = bytes.try_into().ok()?;
        Some(Self::from_bytes(bytes))
    }

    /// Returns the wire representation of the UID.
    pub const fn to_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Debug for TcgUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TcgUid({:#018X})", self.0)
    }
}

impl fmt::Display for TcgUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018X}", self.0)
    }
}

/// The null UID.
pub const NULL: TcgUid = TcgUid(0x0000_0000_0000_0000);

/// Session Manager, the invoking object of the session management methods.
pub const SMUID: TcgUid = TcgUid(0x0000_0000_0000_00FF);
/// The SP the session is currently open to.
pub const THIS_SP: TcgUid = TcgUid(0x0000_0000_0000_0001);

// Session manager methods.
pub const METHOD_PROPERTIES: TcgUid = TcgUid(0x0000_0000_0000_FF01);
pub const METHOD_START_SESSION: TcgUid = TcgUid(0x0000_0000_0000_FF02);
pub const METHOD_SYNC_SESSION: TcgUid = TcgUid(0x0000_0000_0000_FF03);

// Object methods.
pub const METHOD_NEXT: TcgUid = TcgUid(0x0000_0006_0000_0008);
pub const METHOD_GET_ACL: TcgUid = TcgUid(0x0000_0006_0000_000D);
pub const METHOD_GEN_KEY: TcgUid = TcgUid(0x0000_0006_0000_0010);
pub const METHOD_REVERT_SP: TcgUid = TcgUid(0x0000_0006_0000_0011);
pub const METHOD_GET: TcgUid = TcgUid(0x0000_0006_0000_0016);
pub const METHOD_SET: TcgUid = TcgUid(0x0000_0006_0000_0017);
pub const METHOD_AUTHENTICATE: TcgUid = TcgUid(0x0000_0006_0000_001C);
pub const METHOD_REVERT: TcgUid = TcgUid(0x0000_0006_0000_0202);
pub const METHOD_ACTIVATE: TcgUid = TcgUid(0x0000_0006_0000_0203);
pub const METHOD_RANDOM: TcgUid = TcgUid(0x0000_0006_0000_0601);

// Authorities common to every SP.
pub const AUTHORITY_ANYBODY: TcgUid = TcgUid(0x0000_0009_0000_0001);
pub const AUTHORITY_ADMINS: TcgUid = TcgUid(0x0000_0009_0000_0002);

/// Half-UID tagging an authority reference inside an ACE boolean expression.
pub const ACE_EXPRESSION_AUTHORITY_HALF_UID: u32 = 0x0000_0C05;
/// Half-UID tagging a boolean operator inside an ACE boolean expression.
pub const ACE_EXPRESSION_BOOLEAN_HALF_UID: u32 = 0x0000_040E;

/// Boolean operators usable in an ACE boolean expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AceBooleanOperator {
    And = 0,
    Or = 1,
    Not = 2,
}

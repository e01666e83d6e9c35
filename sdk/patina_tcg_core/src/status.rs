//! TCG method status codes.
//!
//! Every method response ends with a status list whose first element is the method status. The status reports
//! whether the TPer executed the method, independent of whether the exchange itself worked.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
use core::fmt;

/// Status byte of a TCG method response.
///
/// Codes not listed as constants are preserved as-is.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodStatus(pub u8);

impl MethodStatus {
    pub const SUCCESS: Self = Self(0x00);
    pub const NOT_AUTHORIZED: Self = Self(0x01);
    pub const OBSOLETE: Self = Self(0x02);
    pub const SP_BUSY: Self = Self(0x03);
    pub const SP_FAILED: Self = Self(0x04);
    pub const SP_DISABLED: Self = Self(0x05);
    pub const SP_FROZEN: Self = Self(0x06);
    pub const NO_SESSIONS_AVAILABLE: Self = Self(0x07);
    pub const UNIQUENESS_CONFLICT: Self = Self(0x08);
    pub const INSUFFICIENT_SPACE: Self = Self(0x09);
    pub const INSUFFICIENT_ROWS: Self = Self(0x0A);
    pub const INVALID_PARAMETER: Self = Self(0x0C);
    pub const TPER_MALFUNCTION: Self = Self(0x0F);
    pub const TRANSACTION_FAILURE: Self = Self(0x10);
    pub const RESPONSE_OVERFLOW: Self = Self(0x11);
    pub const AUTHORITY_LOCKED_OUT: Self = Self(0x12);
    pub const FAIL: Self = Self(0x3F);

    /// Returns true if the TPer executed the method.
    pub const fn is_success(self) -> bool {
        self.0 == Self::SUCCESS.0
    }

    fn name(self) -> Option<&'static str> {
        Some(match self {
            Self::SUCCESS => "Success",
            Self::NOT_AUTHORIZED => "NotAuthorized",
            Self::OBSOLETE => "Obsolete",
            Self::SP_BUSY => "SpBusy",
            Self::SP_FAILED => "SpFailed",
            Self::SP_DISABLED => "SpDisabled",
            Self::SP_FROZEN => "SpFrozen",
            Self::NO_SESSIONS_AVAILABLE => "NoSessionsAvailable",
            Self::UNIQUENESS_CONFLICT => "UniquenessConflict",
            Self::INSUFFICIENT_SPACE => "InsufficientSpace",
            Self::INSUFFICIENT_ROWS => "InsufficientRows",
            Self::INVALID_PARAMETER => "InvalidParameter",
            Self::TPER_MALFUNCTION => "TPerMalfunction",
            Self::TRANSACTION_FAILURE => "TransactionFailure",
            Self::RESPONSE_OVERFLOW => "ResponseOverflow",
            Self::AUTHORITY_LOCKED_OUT => "AuthorityLockedOut",
            Self::FAIL => "Fail",
            _ => return None,
        })
    }
}

impl fmt::Debug for MethodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}({:#04X})", self.0),
            None => write!(f, "MethodStatus({:#04X})", self.0),
        }
    }
}

impl fmt::Display for MethodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<u8> for MethodStatus {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

//! Error types and conversions for the TCG Storage crates.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
use core::fmt::Display;

use r_efi::efi;

/// Transport and protocol level failures.
///
/// A method the device executed and refused is not an error at this level. Refusals travel as a
/// [`MethodStatus`](crate::MethodStatus) next to a successful result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcgError {
    /// The device could not be reached, the response was malformed, the ComIDs did not match or the device never
    /// reported a complete response.
    Failure,
    /// The buffer given for the operation cannot hold the data. `required` is the size that would have been needed.
    BufferTooSmall {
        /// Size in bytes that would have been needed.
        required: usize,
    },
}

/// Result type used throughout the TCG Storage crates.
pub type Result<T> = core::result::Result<T, TcgError>;

impl From<scroll::Error> for TcgError {
    fn from(value: scroll::Error) -> Self {
        match value {
            scroll::Error::TooBig { size, .. } => TcgError::BufferTooSmall { required: size },
            _ => TcgError::Failure,
        }
    }
}

impl From<TcgError> for efi::Status {
    fn from(value: TcgError) -> Self {
        match value {
            TcgError::Failure => efi::Status::DEVICE_ERROR,
            TcgError::BufferTooSmall { .. } => efi::Status::BUFFER_TOO_SMALL,
        }
    }
}

impl Display for TcgError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TcgError::Failure => write!(f, "TCG transport or protocol failure"),
            TcgError::BufferTooSmall { required } => write!(f, "Buffer too small, {required} bytes required"),
        }
    }
}

impl core::error::Error for TcgError {}

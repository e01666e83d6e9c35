//! TCG Storage Opal Support
//!
//! Host side of the TCG Storage Opal, Opal Lite and Pyrite Security Subsystem Classes. The crate talks to a
//! self-encrypting drive through the [`StorageSecurityCommand`] seam (the `EFI_STORAGE_SECURITY_COMMAND_PROTOCOL`
//! in firmware) and is layered as follows:
//!
//! * [`transport`]: `trusted_send` / `trusted_recv` with 512 byte transfer granularity and bounded polling for
//!   in-progress responses.
//! * [`session`]: [`OpalSession`] opens and closes sessions with a Security Provider and runs the
//!   send/receive/parse/status chain for every method call.
//! * [`ops`]: credential, locking range and revert operations on an open session.
//! * [`attributes`]: Level 0 Discovery based capability probing and the `feature_supported` /
//!   `feature_enabled` / `device_locked` predicates.
//! * [`block_sid`]: the Block SID authentication request.
//!
//! Two result channels are kept apart. [`TcgError`] reports that an exchange could not be completed (transport
//! failure, malformed response, undersized buffer). [`MethodStatus`] reports what the drive decided about a method
//! it did execute and is returned inside `Ok`.
//!
//! ## Example
//!
//! ```rust
//! use patina_tcg_opal::{OpalSession, Stall, StorageSecurityCommand, TcgError, uid};
//! use r_efi::efi;
//!
//! struct NoMedia;
//!
//! impl StorageSecurityCommand for NoMedia {
//!     fn send_data(&self, _: u32, _: u64, _: u8, _: u16, _: &[u8]) -> Result<(), efi::Status> {
//!         Err(efi::Status::NO_MEDIA)
//!     }
//!
//!     fn receive_data(&self, _: u32, _: u64, _: u8, _: u16, _: &mut [u8]) -> Result<usize, efi::Status> {
//!         Err(efi::Status::NO_MEDIA)
//!     }
//! }
//!
//! struct NoWait;
//!
//! impl Stall for NoWait {
//!     fn stall(&self, _microseconds: usize) {}
//! }
//!
//! let mut session = OpalSession::new(&NoMedia, &NoWait, 0, 0x07FE);
//! assert_eq!(session.start_session(uid::ADMIN_SP, true, None, None), Err(TcgError::Failure));
//!
//! // No session is open, so methods fail without touching the transport.
//! let mut msid = [0u8; 32];
//! assert_eq!(session.get_msid(&mut msid), Err(TcgError::Failure));
//! ```
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]

pub mod attributes;
pub mod block_sid;
pub mod config;
pub mod ops;
pub mod protocol;
pub mod session;
pub mod transport;
pub mod uid;

pub use attributes::{OpalDiskSupportAttribute, device_locked, feature_enabled, feature_supported};
pub use config::{RetryPolicy, TransportConfig};
pub use patina_tcg_core::{MethodStatus, Result, TcgError, TcgUid};
pub use protocol::{Stall, StorageSecurityCommand};
pub use session::OpalSession;

/// Size of the scratch buffers used for every exchange.
pub const BUFFER_SIZE: usize = 512;

/// Transfer granularity of the storage security commands.
pub const BLOCK_SIZE: usize = 512;

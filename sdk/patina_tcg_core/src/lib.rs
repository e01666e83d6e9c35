//! TCG Storage Core Data Stream Support
//!
//! Implements the framing and token encoding defined by the TCG Storage Architecture Core Specification. Every
//! method call exchanged with a Trusted Peripheral (TPer) is carried in a ComPacket that holds a Packet that holds a
//! SubPacket whose payload is a stream of tokens:
//!
//! ```text
//! ComPacket (20 byte header, ComID routing)
//! └── Packet (24 byte header, TPer/host session numbers)
//!     └── SubPacket (12 byte header, payload padded to 4 bytes)
//!         └── Call InvokingUID MethodUID StartList ... EndList EndOfData [status 0 0]
//! ```
//!
//! [`TcgCreate`] builds such a stream while tracking the open scopes so that every start has its matching end.
//! [`TcgParse`] validates the framing of a received stream and walks its tokens. The [`command`] module holds the
//! complete messages the Opal library needs (StartSession, EndSession, Set C_PIN and friends) and the SyncSession
//! response parser. [`discovery`] decodes Level 0 Discovery data and the supported security protocol list.
//!
//! Nothing in this crate performs I/O. Transport, retry and session policy belong to the caller.
//!
//! ## Example
//!
//! ```rust
//! use patina_tcg_core::{SessionIds, TcgCreate, TcgParse, uid};
//!
//! let ids = SessionIds { com_id: 0x07FE, com_id_ext: 0, tper_session_id: 0x1001, host_session_id: 1 };
//! let mut buffer = [0u8; 512];
//!
//! let mut create = TcgCreate::new(&mut buffer);
//! create.start_method_packet(&ids).unwrap();
//! create.start_method_call(uid::THIS_SP, uid::METHOD_RANDOM).unwrap();
//! create.start_parameters().unwrap();
//! create.add_u32(16).unwrap();
//! create.end_parameters().unwrap();
//! create.end_method_call().unwrap();
//! create.end_method_packet().unwrap();
//! let size = create.finish().unwrap();
//!
//! let parse = TcgParse::new(&buffer[..size]).unwrap();
//! assert!(parse.check_com_ids(0x07FE, 0).is_ok());
//! ```
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]

pub mod command;
pub mod create;
pub mod discovery;
pub mod error;
pub mod packet;
pub mod parse;
pub mod status;
pub mod token;
pub mod uid;

pub use command::SessionIds;
pub use create::TcgCreate;
pub use error::{Result, TcgError};
pub use parse::TcgParse;
pub use status::MethodStatus;
pub use token::Token;
pub use uid::TcgUid;

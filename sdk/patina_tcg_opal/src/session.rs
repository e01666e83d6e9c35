//! Opal session management and method invocation.
//!
//! An [`OpalSession`] is bound to one medium and one base ComID. [`OpalSession::start_session`] opens a session
//! with a Security Provider; every method issued afterwards runs through [`OpalSession::perform_method`], which
//! sends the message, polls for the answer, validates the framing and ComID routing and extracts the method status.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
use patina_tcg_core::{
    MethodStatus, Result, SessionIds, TcgError, TcgParse, TcgUid,
    command::{self, StartSession},
    discovery::SECURITY_PROTOCOL_TCG1,
};

use crate::{
    BUFFER_SIZE,
    config::TransportConfig,
    protocol::{Stall, StorageSecurityCommand},
    transport::Transport,
};

/// Host session number used for every session opened by this library.
pub const HOST_SESSION_ID: u32 = 1;

/// Session state for one medium.
///
/// `tper_session_id` is `None` until [`OpalSession::start_session`] succeeds. Ending a session does not reset it;
/// the owner decides whether the structure is reused.
pub struct OpalSession<'a> {
    pub(crate) transport: Transport<'a>,
    com_id: u16,
    com_id_ext: u16,
    host_session_id: u32,
    tper_session_id: Option<u32>,
}

impl<'a> OpalSession<'a> {
    /// Creates a closed session on `media_id` addressing base ComID `com_id`.
    pub fn new(command: &'a dyn StorageSecurityCommand, stall: &'a dyn Stall, media_id: u32, com_id: u16) -> Self {
        Self {
            transport: Transport::new(command, stall, media_id),
            com_id,
            com_id_ext: 0,
            host_session_id: 0,
            tper_session_id: None,
        }
    }

    /// Replaces the default transport timing.
    pub fn with_config(mut self, config: TransportConfig) -> Self {
        self.transport = self.transport.with_config(config);
        self
    }

    pub fn transport(&self) -> &Transport<'a> {
        &self.transport
    }

    pub fn com_id(&self) -> u16 {
        self.com_id
    }

    pub fn tper_session_id(&self) -> Option<u32> {
        self.tper_session_id
    }

    /// Routing identifiers of the session. The TPer session number reads 0 while no session is open.
    pub fn ids(&self) -> SessionIds {
        SessionIds {
            com_id: self.com_id,
            com_id_ext: self.com_id_ext,
            tper_session_id: self.tper_session_id.unwrap_or(0),
            host_session_id: self.host_session_id,
        }
    }

    /// Opens a session with `sp`.
    ///
    /// Returns the StartSession method status. The session is open only when the status is success; a refusal
    /// leaves it closed. A SyncSession answer that cannot be parsed is reported as [`TcgError::Failure`] after a
    /// best effort EndSession.
    pub fn start_session(
        &mut self,
        sp: TcgUid,
        write: bool,
        host_challenge: Option<&[u8]>,
        host_signing_authority: Option<TcgUid>,
    ) -> Result<MethodStatus> {
        self.com_id_ext = 0;
        self.host_session_id = HOST_SESSION_ID;
        self.tper_session_id = None;

        let mut buffer = [0u8; BUFFER_SIZE];
        let params = StartSession { sp, write, host_challenge, host_signing_authority };
        let size =
            command::create_start_session(&mut buffer, self.com_id, self.com_id_ext, self.host_session_id, &params)?;

        log::debug!(target: "tcg_opal", "StartSession on {} (write: {}, ComID {:#06X})", sp, write, self.com_id);
        let (mut parse, status) = self.exchange(size, &mut buffer, 0)?;
        if !status.is_success() {
            log::warn!(target: "tcg_opal", "StartSession on {} refused: {:?}", sp, status);
            return Ok(status);
        }

        match command::parse_sync_session(&mut parse, self.host_session_id) {
            Ok(tper_session_id) => {
                log::debug!(target: "tcg_opal", "Session open, TSN {:#X} HSN {:#X}", tper_session_id, self.host_session_id);
                self.tper_session_id = Some(tper_session_id);
                Ok(status)
            }
            Err(err) => {
                log::error!(target: "tcg_opal", "Malformed SyncSession response: {}", err);
                if let Err(err) = self.end_session() {
                    log::debug!(target: "tcg_opal", "EndSession after malformed SyncSession failed: {}", err);
                }
                Err(TcgError::Failure)
            }
        }
    }

    /// Closes the session with an EndOfSession token and waits for the TPer's EndOfSession answer.
    pub fn end_session(&self) -> Result<()> {
        let mut buffer = [0u8; BUFFER_SIZE];
        let size = command::create_end_session(&mut buffer, &self.ids())?;

        log::debug!(target: "tcg_opal", "EndSession TSN {:#X} HSN {:#X}", self.ids().tper_session_id, self.host_session_id);
        self.transport.trusted_send(SECURITY_PROTOCOL_TCG1, self.com_id, size, &mut buffer)?;
        self.transport.trusted_recv(SECURITY_PROTOCOL_TCG1, self.com_id, &mut buffer, 0)?;

        let mut parse = TcgParse::new(&buffer)?;
        parse.check_com_ids(self.com_id, self.com_id_ext)?;
        parse.next_end_of_session()
    }

    /// Sends the `send_size` byte message in `buffer` and parses the response written back into `buffer`.
    ///
    /// Returns the parse cursor positioned at the start of the response payload together with the method status.
    /// The status is not judged here. Fails without any I/O if no session is open.
    pub fn perform_method<'b>(
        &self,
        send_size: usize,
        buffer: &'b mut [u8],
        estimate_time_cost: u32,
    ) -> Result<(TcgParse<'b>, MethodStatus)> {
        if self.tper_session_id.is_none() {
            log::error!(target: "tcg_opal", "Method issued without an open session");
            return Err(TcgError::Failure);
        }
        self.exchange(send_size, buffer, estimate_time_cost)
    }

    fn exchange<'b>(
        &self,
        send_size: usize,
        buffer: &'b mut [u8],
        estimate_time_cost: u32,
    ) -> Result<(TcgParse<'b>, MethodStatus)> {
        self.transport.trusted_send(SECURITY_PROTOCOL_TCG1, self.com_id, send_size, buffer)?;
        self.transport.trusted_recv(SECURITY_PROTOCOL_TCG1, self.com_id, buffer, estimate_time_cost)?;

        let buffer: &'b [u8] = buffer;
        let parse = TcgParse::new(buffer)?;
        parse.check_com_ids(self.com_id, self.com_id_ext)?;
        let status = parse.method_status()?;
        log::trace!(target: "tcg_opal", "Method status {:?}", status);
        Ok((parse, status))
    }
}

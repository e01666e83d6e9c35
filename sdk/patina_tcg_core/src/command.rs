//! Complete TCG messages used by the Opal library.
//!
//! Each `create_*` function writes a whole ComPacket into the supplied buffer and returns its size. The `parse_*`
//! functions consume the matching response bodies.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
use crate::{
    create::TcgCreate,
    error::{Result, TcgError},
    parse::TcgParse,
    token,
    uid::{self, AceBooleanOperator, TcgUid},
};

/// Name of the `Values` parameter of the Set method.
pub const SET_VALUES: u8 = 0x01;

/// Name of the `startColumn` parameter of the Get method's cell block.
pub const GET_START_COLUMN: u8 = 0x03;

/// Name of the `endColumn` parameter of the Get method's cell block.
pub const GET_END_COLUMN: u8 = 0x04;

/// Optional StartSession parameter name carrying the host challenge.
pub const START_SESSION_HOST_CHALLENGE: u8 = 0x00;

/// Optional StartSession parameter name carrying the host signing authority.
pub const START_SESSION_HOST_SIGNING_AUTHORITY: u8 = 0x03;

/// C_PIN table: PIN column.
pub const CPIN_PIN_COLUMN: u8 = 0x03;

/// Authority table: Enabled column.
pub const AUTHORITY_ENABLED_COLUMN: u8 = 0x05;

/// ACE table: BooleanExpr column.
pub const ACE_BOOLEAN_EXPRESSION_COLUMN: u8 = 0x03;

/// Identifiers routing a message to a ComID and session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionIds {
    pub com_id: u16,
    pub com_id_ext: u16,
    /// TPer session number, 0 outside of a session.
    pub tper_session_id: u32,
    /// Host session number, 0 outside of a session.
    pub host_session_id: u32,
}

/// Parameters of a StartSession method call.
#[derive(Debug, Clone, Copy)]
pub struct StartSession<'a> {
    /// Security Provider the session is opened on.
    pub sp: TcgUid,
    pub write: bool,
    /// PIN presented for `host_signing_authority`. An empty challenge is not sent.
    pub host_challenge: Option<&'a [u8]>,
    pub host_signing_authority: Option<TcgUid>,
}

/// Writes a StartSession call to the Session Manager.
///
/// The message travels outside of any session, so the Packet carries TPer and host session numbers of 0 while the
/// host session number to use is passed as the first parameter.
pub fn create_start_session(
    buffer: &mut [u8],
    com_id: u16,
    com_id_ext: u16,
    host_session_id: u32,
    params: &StartSession,
) -> Result<usize> {
    let mut create = TcgCreate::new(buffer);
    create.start_method_packet(&SessionIds { com_id, com_id_ext, tper_session_id: 0, host_session_id: 0 })?;
    create.start_method_call(uid::SMUID, uid::METHOD_START_SESSION)?;
    create.start_parameters()?;
    create.add_u32(host_session_id)?;
    create.add_uid(params.sp)?;
    create.add_bool(params.write)?;
    if let Some(challenge) = params.host_challenge.filter(|challenge| !challenge.is_empty()) {
        create.start_name()?;
        create.add_u8(START_SESSION_HOST_CHALLENGE)?;
        create.add_bytes(challenge)?;
        create.end_name()?;
    }
    if let Some(authority) = params.host_signing_authority {
        create.start_name()?;
        create.add_u8(START_SESSION_HOST_SIGNING_AUTHORITY)?;
        create.add_uid(authority)?;
        create.end_name()?;
    }
    create.end_parameters()?;
    create.end_method_call()?;
    create.end_method_packet()?;
    create.finish()
}

/// Consumes a SyncSession response and returns the TPer session number it assigns.
///
/// The echoed host session number must match `host_session_id`.
pub fn parse_sync_session(parse: &mut TcgParse, host_session_id: u32) -> Result<u32> {
    parse.next_call()?;
    let invoking = parse.next_uid()?;
    let method = parse.next_uid()?;
    if invoking != uid::SMUID || method != uid::METHOD_SYNC_SESSION {
        log::debug!(target: "tcg_core", "Expected SyncSession, found {} on {}", method, invoking);
        return Err(TcgError::Failure);
    }
    parse.next_start_list()?;
    let echoed = parse.next_u32()?;
    if echoed != host_session_id {
        log::debug!(target: "tcg_core", "SyncSession echoed HSN {:#X}, expected {:#X}", echoed, host_session_id);
        return Err(TcgError::Failure);
    }
    let tper_session_id = parse.next_u32()?;
    log::trace!(target: "tcg_core", "SyncSession HSN {:#X} TSN {:#X}", echoed, tper_session_id);
    Ok(tper_session_id)
}

/// Writes the EndOfSession message closing the session named by `ids`.
pub fn create_end_session(buffer: &mut [u8], ids: &SessionIds) -> Result<usize> {
    let mut create = TcgCreate::new(buffer);
    create.start_method_packet(ids)?;
    create.add_control_token(token::END_OF_SESSION)?;
    create.end_method_packet()?;
    create.finish()
}

/// Opens a Set method call on `row` up to the start of the `Values` list.
///
/// The caller adds `StartName column value EndName` groups and closes with [`end_method_set`].
pub fn start_method_set(create: &mut TcgCreate, row: TcgUid) -> Result<()> {
    create.start_method_call(row, uid::METHOD_SET)?;
    create.start_parameters()?;
    create.start_name()?;
    create.add_u8(SET_VALUES)?;
    create.start_list()
}

/// Closes a Set method call opened by [`start_method_set`].
pub fn end_method_set(create: &mut TcgCreate) -> Result<()> {
    create.end_list()?;
    create.end_name()?;
    create.end_parameters()?;
    create.end_method_call()
}

/// Writes a Get call for columns `start_column..=end_column` of `row`.
pub fn create_get_columns(
    buffer: &mut [u8],
    ids: &SessionIds,
    row: TcgUid,
    start_column: u32,
    end_column: u32,
) -> Result<usize> {
    let mut create = TcgCreate::new(buffer);
    create.start_method_packet(ids)?;
    create.start_method_call(row, uid::METHOD_GET)?;
    create.start_parameters()?;
    create.start_list()?;
    create.start_name()?;
    create.add_u8(GET_START_COLUMN)?;
    create.add_u32(start_column)?;
    create.end_name()?;
    create.start_name()?;
    create.add_u8(GET_END_COLUMN)?;
    create.add_u32(end_column)?;
    create.end_name()?;
    create.end_list()?;
    create.end_parameters()?;
    create.end_method_call()?;
    create.end_method_packet()?;
    create.finish()
}

/// Consumes the two list openings that start a Get response.
pub fn parse_get_response_start(parse: &mut TcgParse) -> Result<()> {
    parse.next_start_list()?;
    parse.next_start_list()
}

/// Consumes `StartName column`, failing if the column is not the expected one.
///
/// The column value is left for the caller, followed by the EndName token.
pub fn parse_column_name(parse: &mut TcgParse, column: u32) -> Result<()> {
    parse.next_start_name()?;
    let found = parse.next_u32()?;
    if found != column {
        log::debug!(target: "tcg_core", "Expected column {}, found column {}", column, found);
        return Err(TcgError::Failure);
    }
    Ok(())
}

/// Writes a Set of the PIN column of the C_PIN row `cpin_row`.
pub fn create_set_cpin(buffer: &mut [u8], ids: &SessionIds, cpin_row: TcgUid, pin: &[u8]) -> Result<usize> {
    let mut create = TcgCreate::new(buffer);
    create.start_method_packet(ids)?;
    start_method_set(&mut create, cpin_row)?;
    create.start_name()?;
    create.add_u8(CPIN_PIN_COLUMN)?;
    create.add_bytes(pin)?;
    create.end_name()?;
    end_method_set(&mut create)?;
    create.end_method_packet()?;
    create.finish()
}

/// Writes a Set of the Enabled column of `authority`.
pub fn create_set_authority_enabled(
    buffer: &mut [u8],
    ids: &SessionIds,
    authority: TcgUid,
    enabled: bool,
) -> Result<usize> {
    let mut create = TcgCreate::new(buffer);
    create.start_method_packet(ids)?;
    start_method_set(&mut create, authority)?;
    create.start_name()?;
    create.add_u8(AUTHORITY_ENABLED_COLUMN)?;
    create.add_bool(enabled)?;
    create.end_name()?;
    end_method_set(&mut create)?;
    create.end_method_packet()?;
    create.finish()
}

/// Writes a Set of the BooleanExpr column of `ace_row` to `authority1 <operator> authority2`.
pub fn create_set_ace(
    buffer: &mut [u8],
    ids: &SessionIds,
    ace_row: TcgUid,
    authority1: TcgUid,
    authority2: TcgUid,
    operator: AceBooleanOperator,
) -> Result<usize> {
    let authority_ref = uid::ACE_EXPRESSION_AUTHORITY_HALF_UID.to_be_bytes();

    let mut create = TcgCreate::new(buffer);
    create.start_method_packet(ids)?;
    start_method_set(&mut create, ace_row)?;
    create.start_name()?;
    create.add_u8(ACE_BOOLEAN_EXPRESSION_COLUMN)?;
    create.start_list()?;

    for authority in [authority1, authority2] {
        create.start_name()?;
        create.add_bytes(&authority_ref)?;
        create.add_uid(authority)?;
        create.end_name()?;
    }

    create.start_name()?;
    create.add_bytes(&uid::ACE_EXPRESSION_BOOLEAN_HALF_UID.to_be_bytes())?;
    create.add_u8(operator as u8)?;
    create.end_name()?;

    create.end_list()?;
    create.end_name()?;
    end_method_set(&mut create)?;
    create.end_method_packet()?;
    create.finish()
}

/// Builds a whole method message around a body written by `body`.
///
/// `body` receives the builder positioned inside the data SubPacket and must leave every scope it opens closed.
pub fn create_method<F>(buffer: &mut [u8], ids: &SessionIds, body: F) -> Result<usize>
where
    F: FnOnce(&mut TcgCreate) -> Result<()>,
{
    let mut create = TcgCreate::new(buffer);
    create.start_method_packet(ids)?;
    body(&mut create)?;
    create.end_method_packet()?;
    create.finish()
}

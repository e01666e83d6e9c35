//! TCG data stream builder.
//!
//! [`TcgCreate`] writes a ComPacket into a caller supplied buffer. Each `start_*` call pushes a scope and each
//! `end_*` call must close the innermost open scope of the same kind, so a mismatched or missing end is reported as
//! [`TcgError::Failure`] instead of producing a malformed frame. The header length fields are filled in when their
//! scope ends.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
use scroll::Pwrite;

use crate::{
    error::{Result, TcgError},
    packet::{ComPacketHeader, PacketHeader, SUB_PACKET_ALIGNMENT, SUB_PACKET_KIND_DATA, SubPacketHeader},
    token,
    uid::TcgUid,
};

/// Deepest scope nesting the builder supports.
pub const MAX_SCOPE_DEPTH: usize = 16;

/// An open scope and the buffer offset where it started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    ComPacket(usize),
    Packet(usize),
    SubPacket(usize),
    MethodCall,
    Parameters,
    List,
    Name,
}

impl Scope {
    fn same_kind(&self, other: &Scope) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }
}

/// Builder for a TCG ComPacket.
pub struct TcgCreate<'a> {
    buffer: &'a mut [u8],
    offset: usize,
    scopes: [Scope; MAX_SCOPE_DEPTH],
    depth: usize,
}

impl<'a> TcgCreate<'a> {
    /// Creates a builder writing from the start of `buffer`.
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer, offset: 0, scopes: [Scope::List; MAX_SCOPE_DEPTH], depth: 0 }
    }

    /// Number of bytes written so far.
    pub fn size(&self) -> usize {
        self.offset
    }

    /// Completes the stream and returns its size. Fails if any scope is still open.
    pub fn finish(self) -> Result<usize> {
        if self.depth != 0 {
            log::error!(target: "tcg_core", "Stream finished with {} open scope(s), innermost {:?}", self.depth, self.scopes[self.depth - 1]);
            return Err(TcgError::Failure);
        }
        Ok(self.offset)
    }

    fn push(&mut self, scope: Scope) -> Result<()> {
        if self.depth == MAX_SCOPE_DEPTH {
            log::error!(target: "tcg_core", "Scope nesting exceeds {}", MAX_SCOPE_DEPTH);
            return Err(TcgError::Failure);
        }
        self.scopes[self.depth] = scope;
        self.depth += 1;
        Ok(())
    }

    fn pop(&mut self, expected: Scope) -> Result<Scope> {
        match self.depth.checked_sub(1).map(|top| self.scopes[top]) {
            Some(scope) if scope.same_kind(&expected) => {
                self.depth -= 1;
                Ok(scope)
            }
            found => {
                log::error!(target: "tcg_core", "Mismatched end: expected {:?}, innermost open scope {:?}", expected, found);
                Err(TcgError::Failure)
            }
        }
    }

    fn is_open(&self, scope: Scope) -> bool {
        self.scopes[..self.depth].iter().any(|open| open.same_kind(&scope))
    }

    fn reserve(&mut self, length: usize) -> Result<&mut [u8]> {
        let end = self.offset + length;
        if end > self.buffer.len() {
            return Err(TcgError::BufferTooSmall { required: end });
        }
        let start = self.offset;
        self.offset = end;
        Ok(&mut self.buffer[start..end])
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.reserve(data.len())?.copy_from_slice(data);
        Ok(())
    }

    fn add_token_byte(&mut self, byte: u8) -> Result<()> {
        if !self.is_open(Scope::SubPacket(0)) {
            log::error!(target: "tcg_core", "Token {:#04X} written outside of a SubPacket", byte);
            return Err(TcgError::Failure);
        }
        self.write(&[byte])
    }

    /// Starts the ComPacket. Must be the first scope of the stream.
    pub fn start_com_packet(&mut self, com_id: u16, com_id_ext: u16) -> Result<()> {
        if self.depth != 0 || self.offset != 0 {
            return Err(TcgError::Failure);
        }
        let header = ComPacketHeader { com_id, com_id_ext, ..Default::default() };
        self.reserve(ComPacketHeader::SIZE)?.pwrite_with(header, 0, scroll::BE)?;
        self.push(Scope::ComPacket(0))
    }

    /// Starts a Packet inside the open ComPacket.
    pub fn start_packet(
        &mut self,
        tper_session_id: u32,
        host_session_id: u32,
        sequence_number: u32,
        ack_type: u16,
        acknowledgement: u32,
    ) -> Result<()> {
        if !matches!(self.scopes[..self.depth], [Scope::ComPacket(_)]) {
            return Err(TcgError::Failure);
        }
        let start = self.offset;
        let header =
            PacketHeader { tper_session_id, host_session_id, sequence_number, ack_type, acknowledgement, length: 0 };
        self.reserve(PacketHeader::SIZE)?.pwrite_with(header, 0, scroll::BE)?;
        self.push(Scope::Packet(start))
    }

    /// Starts a SubPacket of the given kind inside the open Packet.
    pub fn start_sub_packet(&mut self, kind: u16) -> Result<()> {
        if !matches!(self.scopes[..self.depth], [Scope::ComPacket(_), Scope::Packet(_)]) {
            return Err(TcgError::Failure);
        }
        let start = self.offset;
        self.reserve(SubPacketHeader::SIZE)?.pwrite_with(SubPacketHeader { kind, length: 0 }, 0, scroll::BE)?;
        self.push(Scope::SubPacket(start))
    }

    /// Ends the open SubPacket, recording its payload length and padding it to a 4 byte boundary.
    pub fn end_sub_packet(&mut self) -> Result<()> {
        let Scope::SubPacket(start) = self.pop(Scope::SubPacket(0))? else {
            return Err(TcgError::Failure);
        };
        let payload_length = self.offset - start - SubPacketHeader::SIZE;
        self.buffer.pwrite_with(payload_length as u32, start + SubPacketHeader::LENGTH_OFFSET, scroll::BE)?;

        let padding = (SUB_PACKET_ALIGNMENT - payload_length % SUB_PACKET_ALIGNMENT) % SUB_PACKET_ALIGNMENT;
        self.reserve(padding)?.fill(0);
        Ok(())
    }

    /// Ends the open Packet, recording its length.
    pub fn end_packet(&mut self) -> Result<()> {
        let Scope::Packet(start) = self.pop(Scope::Packet(0))? else {
            return Err(TcgError::Failure);
        };
        let length = self.offset - start - PacketHeader::SIZE;
        self.buffer.pwrite_with(length as u32, start + PacketHeader::LENGTH_OFFSET, scroll::BE)?;
        Ok(())
    }

    /// Ends the ComPacket, recording its length.
    pub fn end_com_packet(&mut self) -> Result<()> {
        let Scope::ComPacket(start) = self.pop(Scope::ComPacket(0))? else {
            return Err(TcgError::Failure);
        };
        let length = self.offset - start - ComPacketHeader::SIZE;
        self.buffer.pwrite_with(length as u32, start + ComPacketHeader::LENGTH_OFFSET, scroll::BE)?;
        Ok(())
    }

    /// Starts the method call `method` on the object `invoking`.
    pub fn start_method_call(&mut self, invoking: TcgUid, method: TcgUid) -> Result<()> {
        if self.is_open(Scope::MethodCall) {
            return Err(TcgError::Failure);
        }
        self.add_token_byte(token::CALL)?;
        self.push(Scope::MethodCall)?;
        self.add_uid(invoking)?;
        self.add_uid(method)
    }

    /// Ends the method call with the EndOfData token and an all-zero status list.
    pub fn end_method_call(&mut self) -> Result<()> {
        self.pop(Scope::MethodCall)?;
        self.add_token_byte(token::END_OF_DATA)?;
        self.write(&[token::START_LIST, 0, 0, 0, token::END_LIST])
    }

    /// Starts the parameter list of the open method call.
    pub fn start_parameters(&mut self) -> Result<()> {
        if !matches!(self.scopes[..self.depth].last(), Some(Scope::MethodCall)) {
            return Err(TcgError::Failure);
        }
        self.add_token_byte(token::START_LIST)?;
        self.push(Scope::Parameters)
    }

    /// Ends the parameter list.
    pub fn end_parameters(&mut self) -> Result<()> {
        self.pop(Scope::Parameters)?;
        self.add_token_byte(token::END_LIST)
    }

    pub fn start_list(&mut self) -> Result<()> {
        self.add_token_byte(token::START_LIST)?;
        self.push(Scope::List)
    }

    pub fn end_list(&mut self) -> Result<()> {
        self.pop(Scope::List)?;
        self.add_token_byte(token::END_LIST)
    }

    pub fn start_name(&mut self) -> Result<()> {
        self.add_token_byte(token::START_NAME)?;
        self.push(Scope::Name)
    }

    pub fn end_name(&mut self) -> Result<()> {
        self.pop(Scope::Name)?;
        self.add_token_byte(token::END_NAME)
    }

    /// Adds a bare control token such as EndOfSession or EndOfData.
    ///
    /// Scoped tokens (lists, names, calls) must go through their `start_*`/`end_*` functions.
    pub fn add_control_token(&mut self, control: u8) -> Result<()> {
        match control {
            token::END_OF_DATA
            | token::END_OF_SESSION
            | token::START_TRANSACTION
            | token::END_TRANSACTION
            | token::EMPTY => self.add_token_byte(control),
            _ => Err(TcgError::Failure),
        }
    }

    /// Adds an unsigned integer using the smallest atom that holds it.
    pub fn add_u64(&mut self, value: u64) -> Result<()> {
        if value <= token::TINY_ATOM_MAX_VALUE {
            return self.add_token_byte(value as u8);
        }
        let bytes = value.to_be_bytes();
        let skip = (value.leading_zeros() / 8) as usize;
        let data = &bytes[skip..];
        self.add_token_byte(token::SHORT_ATOM | data.len() as u8)?;
        self.write(data)
    }

    pub fn add_u32(&mut self, value: u32) -> Result<()> {
        self.add_u64(value as u64)
    }

    pub fn add_u16(&mut self, value: u16) -> Result<()> {
        self.add_u64(value as u64)
    }

    pub fn add_u8(&mut self, value: u8) -> Result<()> {
        self.add_u64(value as u64)
    }

    pub fn add_bool(&mut self, value: bool) -> Result<()> {
        self.add_u64(value as u64)
    }

    /// Adds a byte sequence atom.
    pub fn add_bytes(&mut self, data: &[u8]) -> Result<()> {
        let (header, header_len) = token::byte_sequence_header(data.len())?;
        if !self.is_open(Scope::SubPacket(0)) {
            return Err(TcgError::Failure);
        }
        self.write(&header[..header_len])?;
        self.write(data)
    }

    /// Adds a UID as an 8 byte sequence atom.
    pub fn add_uid(&mut self, uid: TcgUid) -> Result<()> {
        self.add_bytes(&uid.to_bytes())
    }

    /// Starts the ComPacket, Packet and data SubPacket for a message on the given session.
    pub fn start_method_packet(&mut self, ids: &crate::SessionIds) -> Result<()> {
        self.start_com_packet(ids.com_id, ids.com_id_ext)?;
        self.start_packet(ids.tper_session_id, ids.host_session_id, 0, 0, 0)?;
        self.start_sub_packet(SUB_PACKET_KIND_DATA)
    }

    /// Ends the SubPacket, Packet and ComPacket opened by [`TcgCreate::start_method_packet`].
    pub fn end_method_packet(&mut self) -> Result<()> {
        self.end_sub_packet()?;
        self.end_packet()?;
        self.end_com_packet()
    }
}

//! TCG data stream parser.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
use scroll::Pread;

use crate::{
    error::{Result, TcgError},
    packet::{ComPacketHeader, PacketHeader, SubPacketHeader},
    status::MethodStatus,
    token::Token,
    uid::TcgUid,
};

/// Read cursor over the first SubPacket payload of a received ComPacket.
///
/// The cursor is `Copy`, so a look-ahead is a copy that gets dropped.
#[derive(Debug, Clone, Copy)]
pub struct TcgParse<'a> {
    com_packet: ComPacketHeader,
    packet: PacketHeader,
    sub_packet: SubPacketHeader,
    payload: &'a [u8],
    cursor: usize,
}

impl<'a> TcgParse<'a> {
    /// Validates the ComPacket, Packet and SubPacket framing of `buffer` and positions the cursor at the start of
    /// the SubPacket payload.
    pub fn new(buffer: &'a [u8]) -> Result<Self> {
        let mut offset = 0;
        let com_packet: ComPacketHeader =
            buffer.gread_with(&mut offset, scroll::BE).map_err(|_| TcgError::Failure)?;
        if com_packet.length == 0 || com_packet.length as usize > buffer.len() - offset {
            log::debug!(target: "tcg_core", "Invalid ComPacket length {:#X} for a {:#X} byte buffer", com_packet.length, buffer.len());
            return Err(TcgError::Failure);
        }

        let packet: PacketHeader = buffer.gread_with(&mut offset, scroll::BE).map_err(|_| TcgError::Failure)?;
        if packet.length as usize > (com_packet.length as usize).saturating_sub(PacketHeader::SIZE) {
            log::debug!(target: "tcg_core", "Packet length {:#X} exceeds ComPacket length {:#X}", packet.length, com_packet.length);
            return Err(TcgError::Failure);
        }

        let sub_packet: SubPacketHeader =
            buffer.gread_with(&mut offset, scroll::BE).map_err(|_| TcgError::Failure)?;
        if sub_packet.length as usize > (packet.length as usize).saturating_sub(SubPacketHeader::SIZE) {
            log::debug!(target: "tcg_core", "SubPacket length {:#X} exceeds Packet length {:#X}", sub_packet.length, packet.length);
            return Err(TcgError::Failure);
        }

        let payload = &buffer[offset..offset + sub_packet.length as usize];
        Ok(Self { com_packet, packet, sub_packet, payload, cursor: 0 })
    }

    pub fn com_packet(&self) -> &ComPacketHeader {
        &self.com_packet
    }

    pub fn packet(&self) -> &PacketHeader {
        &self.packet
    }

    pub fn sub_packet(&self) -> &SubPacketHeader {
        &self.sub_packet
    }

    /// Bytes of payload left after the cursor.
    pub fn remaining(&self) -> usize {
        self.payload.len() - self.cursor
    }

    /// Verifies the response was routed to the expected ComID and ComID extension.
    pub fn check_com_ids(&self, com_id: u16, com_id_ext: u16) -> Result<()> {
        if self.com_packet.com_id != com_id || self.com_packet.com_id_ext != com_id_ext {
            log::warn!(
                target: "tcg_core",
                "ComID mismatch: expected {:#06X}:{:#06X}, received {:#06X}:{:#06X}",
                com_id,
                com_id_ext,
                self.com_packet.com_id,
                self.com_packet.com_id_ext
            );
            return Err(TcgError::Failure);
        }
        Ok(())
    }

    /// Returns the next token without consuming it.
    pub fn peek_token(&self) -> Result<Token<'a>> {
        let payload = self.payload;
        let (token, _) = Token::decode(&payload[self.cursor..])?;
        Ok(token)
    }

    /// Consumes and returns the next token.
    pub fn next_token(&mut self) -> Result<Token<'a>> {
        let payload = self.payload;
        let (token, size) = Token::decode(&payload[self.cursor..])?;
        self.cursor += size;
        Ok(token)
    }

    fn expect(&mut self, expected: Token<'static>) -> Result<()> {
        let token = self.next_token()?;
        if token != expected {
            log::debug!(target: "tcg_core", "Expected {:?}, found {:?}", expected, token);
            return Err(TcgError::Failure);
        }
        Ok(())
    }

    pub fn next_start_list(&mut self) -> Result<()> {
        self.expect(Token::StartList)
    }

    pub fn next_end_list(&mut self) -> Result<()> {
        self.expect(Token::EndList)
    }

    pub fn next_start_name(&mut self) -> Result<()> {
        self.expect(Token::StartName)
    }

    pub fn next_end_name(&mut self) -> Result<()> {
        self.expect(Token::EndName)
    }

    pub fn next_call(&mut self) -> Result<()> {
        self.expect(Token::Call)
    }

    pub fn next_end_of_data(&mut self) -> Result<()> {
        self.expect(Token::EndOfData)
    }

    pub fn next_end_of_session(&mut self) -> Result<()> {
        self.expect(Token::EndOfSession)
    }

    /// Consumes an unsigned integer token.
    pub fn next_u64(&mut self) -> Result<u64> {
        let token = self.next_token()?;
        token.as_u64().ok_or_else(|| {
            log::debug!(target: "tcg_core", "Expected an unsigned integer, found {:?}", token);
            TcgError::Failure
        })
    }

    pub fn next_u32(&mut self) -> Result<u32> {
        u32::try_from(self.next_u64()?).map_err(|_| TcgError::Failure)
    }

    pub fn next_u16(&mut self) -> Result<u16> {
        u16::try_from(self.next_u64()?).map_err(|_| TcgError::Failure)
    }

    pub fn next_u8(&mut self) -> Result<u8> {
        u8::try_from(self.next_u64()?).map_err(|_| TcgError::Failure)
    }

    pub fn next_bool(&mut self) -> Result<bool> {
        match self.next_u64()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(TcgError::Failure),
        }
    }

    /// Consumes a byte sequence token.
    pub fn next_bytes(&mut self) -> Result<&'a [u8]> {
        match self.next_token()? {
            Token::Bytes(data) => Ok(data),
            token => {
                log::debug!(target: "tcg_core", "Expected a byte sequence, found {:?}", token);
                Err(TcgError::Failure)
            }
        }
    }

    /// Consumes an 8 byte sequence as a UID.
    pub fn next_uid(&mut self) -> Result<TcgUid> {
        TcgUid::from_slice(self.next_bytes()?).ok_or(TcgError::Failure)
    }

    /// Consumes a complete value (atom, or list/name with everything it encloses).
    pub fn skip_value(&mut self) -> Result<()> {
        let mut depth = 0_usize;
        loop {
            match self.next_token()? {
                Token::StartList | Token::StartName => depth += 1,
                Token::EndList | Token::EndName => depth = depth.checked_sub(1).ok_or(TcgError::Failure)?,
                Token::TinyAtom { .. } | Token::Integer { .. } | Token::Bytes(_) | Token::Empty => {}
                token => {
                    log::debug!(target: "tcg_core", "Unexpected {:?} inside a value", token);
                    return Err(TcgError::Failure);
                }
            }
            if depth == 0 {
                return Ok(());
            }
        }
    }

    /// Returns the method status reported in the status list after the EndOfData token.
    ///
    /// The cursor is not moved.
    pub fn method_status(&self) -> Result<MethodStatus> {
        let mut look_ahead = *self;
        loop {
            match look_ahead.next_token() {
                Ok(Token::EndOfData) => break,
                Ok(_) => {}
                Err(err) => {
                    log::debug!(target: "tcg_core", "No EndOfData token in response");
                    return Err(err);
                }
            }
        }
        look_ahead.next_start_list()?;
        let status = look_ahead.next_u8()?;
        // Two reserved elements.
        look_ahead.next_u64()?;
        look_ahead.next_u64()?;
        look_ahead.next_end_list()?;
        Ok(MethodStatus(status))
    }
}

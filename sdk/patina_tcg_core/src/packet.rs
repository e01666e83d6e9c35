//! ComPacket, Packet and SubPacket headers.
//!
//! All multi-byte header fields are big-endian on the wire. The headers are converted with explicit
//! [`scroll::Endian::Big`] contexts so the byte order swap happens only at these serialization boundaries.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
use scroll::{
    Pread, Pwrite,
    ctx::{TryFromCtx, TryIntoCtx},
};

/// Reserved ComID, never assigned to a session.
pub const RESERVED_COM_ID: u16 = 0x0000;

/// SubPacket kind carrying a data payload.
pub const SUB_PACKET_KIND_DATA: u16 = 0x0000;

/// SubPacket payloads are padded to a multiple of this many bytes.
pub const SUB_PACKET_ALIGNMENT: usize = 4;

/// ComPacket header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComPacketHeader {
    pub com_id: u16,
    pub com_id_ext: u16,
    /// Number of response bytes the TPer still holds for this ComID.
    pub outstanding_data: u32,
    pub min_transfer: u32,
    /// Number of bytes following the header.
    pub length: u32,
}

impl ComPacketHeader {
    /// Size of the header on the wire.
    pub const SIZE: usize = 20;

    /// Byte offset of the `outstanding_data` field.
    pub const OUTSTANDING_DATA_OFFSET: usize = 8;

    /// Byte offset of the `length` field.
    pub const LENGTH_OFFSET: usize = 16;
}

impl TryIntoCtx<scroll::Endian> for ComPacketHeader {
    type Error = scroll::Error;

    fn try_into_ctx(self, dest: &mut [u8], ctx: scroll::Endian) -> Result<usize, Self::Error> {
        let mut offset = 0;
        dest.gwrite_with(0_u32, &mut offset, ctx)?; // Reserved
        dest.gwrite_with(self.com_id, &mut offset, ctx)?;
        dest.gwrite_with(self.com_id_ext, &mut offset, ctx)?;
        dest.gwrite_with(self.outstanding_data, &mut offset, ctx)?;
        dest.gwrite_with(self.min_transfer, &mut offset, ctx)?;
        dest.gwrite_with(self.length, &mut offset, ctx)?;
        Ok(offset)
    }
}

impl TryFromCtx<'_, scroll::Endian> for ComPacketHeader {
    type Error = scroll::Error;

    fn try_from_ctx(from: &[u8], ctx: scroll::Endian) -> Result<(Self, usize), Self::Error> {
        let mut offset = 0;
        let _reserved: u32 = from.gread_with(&mut offset, ctx)?;
        Ok((
            ComPacketHeader {
                com_id: from.gread_with(&mut offset, ctx)?,
                com_id_ext: from.gread_with(&mut offset, ctx)?,
                outstanding_data: from.gread_with(&mut offset, ctx)?,
                min_transfer: from.gread_with(&mut offset, ctx)?,
                length: from.gread_with(&mut offset, ctx)?,
            },
            offset,
        ))
    }
}

/// Packet header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PacketHeader {
    pub tper_session_id: u32,
    pub host_session_id: u32,
    pub sequence_number: u32,
    pub ack_type: u16,
    pub acknowledgement: u32,
    /// Number of bytes following the header.
    pub length: u32,
}

impl PacketHeader {
    /// Size of the header on the wire.
    pub const SIZE: usize = 24;

    /// Byte offset of the `length` field.
    pub const LENGTH_OFFSET: usize = 20;
}

impl TryIntoCtx<scroll::Endian> for PacketHeader {
    type Error = scroll::Error;

    fn try_into_ctx(self, dest: &mut [u8], ctx: scroll::Endian) -> Result<usize, Self::Error> {
        let mut offset = 0;
        dest.gwrite_with(self.tper_session_id, &mut offset, ctx)?;
        dest.gwrite_with(self.host_session_id, &mut offset, ctx)?;
        dest.gwrite_with(self.sequence_number, &mut offset, ctx)?;
        dest.gwrite_with(0_u16, &mut offset, ctx)?; // Reserved
        dest.gwrite_with(self.ack_type, &mut offset, ctx)?;
        dest.gwrite_with(self.acknowledgement, &mut offset, ctx)?;
        dest.gwrite_with(self.length, &mut offset, ctx)?;
        Ok(offset)
    }
}

impl TryFromCtx<'_, scroll::Endian> for PacketHeader {
    type Error = scroll::Error;

    fn try_from_ctx(from: &[u8], ctx: scroll::Endian) -> Result<(Self, usize), Self::Error> {
        let mut offset = 0;
        let tper_session_id = from.gread_with(&mut offset, ctx)?;
        let host_session_id = from.gread_with(&mut offset, ctx)?;
        let sequence_number = from.gread_with(&mut offset, ctx)?;
        let _reserved: u16 = from.gread_with(&mut offset, ctx)?;
        Ok((
            PacketHeader {
                tper_session_id,
                host_session_id,
                sequence_number,
                ack_type: from.gread_with(&mut offset, ctx)?,
                acknowledgement: from.gread_with(&mut offset, ctx)?,
                length: from.gread_with(&mut offset, ctx)?,
            },
            offset,
        ))
    }
}

/// SubPacket header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubPacketHeader {
    pub kind: u16,
    /// Payload length, not including the alignment padding.
    pub length: u32,
}

impl SubPacketHeader {
    /// Size of the header on the wire.
    pub const SIZE: usize = 12;

    /// Byte offset of the `length` field.
    pub const LENGTH_OFFSET: usize = 8;
}

impl TryIntoCtx<scroll::Endian> for SubPacketHeader {
    type Error = scroll::Error;

    fn try_into_ctx(self, dest: &mut [u8], ctx: scroll::Endian) -> Result<usize, Self::Error> {
        let mut offset = 0;
        dest.gwrite_with(&[0_u8; 6][..], &mut offset, ())?; // Reserved
        dest.gwrite_with(self.kind, &mut offset, ctx)?;
        dest.gwrite_with(self.length, &mut offset, ctx)?;
        Ok(offset)
    }
}

impl TryFromCtx<'_, scroll::Endian> for SubPacketHeader {
    type Error = scroll::Error;

    fn try_from_ctx(from: &[u8], ctx: scroll::Endian) -> Result<(Self, usize), Self::Error> {
        let mut offset = 6;
        Ok((
            SubPacketHeader { kind: from.gread_with(&mut offset, ctx)?, length: from.gread_with(&mut offset, ctx)? },
            offset,
        ))
    }
}

/// Reads the `(length, outstanding_data)` pair of the ComPacket header at the start of `buffer`.
pub fn com_packet_progress(buffer: &[u8]) -> Option<(u32, u32)> {
    let length = buffer.pread_with::<u32>(ComPacketHeader::LENGTH_OFFSET, scroll::BE).ok()?;
    let outstanding = buffer.pread_with::<u32>(ComPacketHeader::OUTSTANDING_DATA_OFFSET, scroll::BE).ok()?;
    Some((length, outstanding))
}

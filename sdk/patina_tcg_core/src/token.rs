//! TCG data stream tokens.
//!
//! A SubPacket payload is a sequence of tokens. Atoms carry integers or byte sequences, every other token is a
//! single control byte.
//!
//! | Atom   | Header                                   | Data length |
//! |--------|------------------------------------------|-------------|
//! | Tiny   | `0 S d d d d d d`                        | in header   |
//! | Short  | `1 0 B S L L L L`                        | 0 - 15      |
//! | Medium | `1 1 0 B S L L L` + 1 length byte        | 0 - 2047    |
//! | Long   | `1 1 1 0 0 0 B S` + 3 length bytes       | 0 - 2^24-1  |
//!
//! `B` marks a byte sequence, `S` a signed integer.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
use crate::error::{Result, TcgError};

pub const TINY_ATOM_SIGN_FLAG: u8 = 0x40;
pub const TINY_ATOM_DATA_MASK: u8 = 0x3F;
pub const TINY_ATOM_MAX_VALUE: u64 = 0x3F;

pub const SHORT_ATOM: u8 = 0x80;
pub const SHORT_ATOM_BYTE_FLAG: u8 = 0x20;
pub const SHORT_ATOM_SIGN_FLAG: u8 = 0x10;
pub const SHORT_ATOM_LENGTH_MASK: u8 = 0x0F;
pub const SHORT_ATOM_MAX_LENGTH: usize = 0x0F;

pub const MEDIUM_ATOM: u8 = 0xC0;
pub const MEDIUM_ATOM_BYTE_FLAG: u8 = 0x10;
pub const MEDIUM_ATOM_SIGN_FLAG: u8 = 0x08;
pub const MEDIUM_ATOM_LENGTH_HIGH_MASK: u8 = 0x07;
pub const MEDIUM_ATOM_MAX_LENGTH: usize = 0x7FF;

pub const LONG_ATOM: u8 = 0xE0;
pub const LONG_ATOM_BYTE_FLAG: u8 = 0x02;
pub const LONG_ATOM_SIGN_FLAG: u8 = 0x01;
pub const LONG_ATOM_MAX_LENGTH: usize = 0xFF_FFFF;

pub const START_LIST: u8 = 0xF0;
pub const END_LIST: u8 = 0xF1;
pub const START_NAME: u8 = 0xF2;
pub const END_NAME: u8 = 0xF3;
pub const CALL: u8 = 0xF8;
pub const END_OF_DATA: u8 = 0xF9;
pub const END_OF_SESSION: u8 = 0xFA;
pub const START_TRANSACTION: u8 = 0xFB;
pub const END_TRANSACTION: u8 = 0xFC;
pub const EMPTY: u8 = 0xFF;

/// A decoded token borrowing its data from the parsed buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Integer held in the header byte itself.
    TinyAtom { signed: bool, value: u8 },
    /// Integer atom (short, medium or long), big-endian data.
    Integer { signed: bool, data: &'a [u8] },
    /// Byte sequence atom (short, medium or long).
    Bytes(&'a [u8]),
    StartList,
    EndList,
    StartName,
    EndName,
    Call,
    EndOfData,
    EndOfSession,
    StartTransaction,
    EndTransaction,
    Empty,
}

impl<'a> Token<'a> {
    /// Decodes the token starting at `buffer[0]`.
    ///
    /// Returns the token and the number of bytes it occupies. Atoms whose declared length runs past the end of
    /// `buffer` and reserved header values are rejected.
    pub fn decode(buffer: &'a [u8]) -> Result<(Token<'a>, usize)> {
        let header = *buffer.first().ok_or(TcgError::Failure)?;

        let (header_len, data_len, is_bytes, signed) = match header {
            0x00..=0x7F => {
                let token = Token::TinyAtom {
                    signed: header & TINY_ATOM_SIGN_FLAG != 0,
                    value: header & TINY_ATOM_DATA_MASK,
                };
                return Ok((token, 1));
            }
            0x80..=0xBF => (
                1,
                (header & SHORT_ATOM_LENGTH_MASK) as usize,
                header & SHORT_ATOM_BYTE_FLAG != 0,
                header & SHORT_ATOM_SIGN_FLAG != 0,
            ),
            0xC0..=0xDF => {
                let low = *buffer.get(1).ok_or(TcgError::Failure)?;
                (
                    2,
                    (((header & MEDIUM_ATOM_LENGTH_HIGH_MASK) as usize) << 8) | low as usize,
                    header & MEDIUM_ATOM_BYTE_FLAG != 0,
                    header & MEDIUM_ATOM_SIGN_FLAG != 0,
                )
            }
            0xE0..=0xE3 => {
                let length = buffer.get(1..4).ok_or(TcgError::Failure)?;
                (
                    4,
                    ((length[0] as usize) << 16) | ((length[1] as usize) << 8) | length[2] as usize,
                    header & LONG_ATOM_BYTE_FLAG != 0,
                    header & LONG_ATOM_SIGN_FLAG != 0,
                )
            }
            START_LIST => return Ok((Token::StartList, 1)),
            END_LIST => return Ok((Token::EndList, 1)),
            START_NAME => return Ok((Token::StartName, 1)),
            END_NAME => return Ok((Token::EndName, 1)),
            CALL => return Ok((Token::Call, 1)),
            END_OF_DATA => return Ok((Token::EndOfData, 1)),
            END_OF_SESSION => return Ok((Token::EndOfSession, 1)),
            START_TRANSACTION => return Ok((Token::StartTransaction, 1)),
            END_TRANSACTION => return Ok((Token::EndTransaction, 1)),
            EMPTY => return Ok((Token::Empty, 1)),
            _ => {
                log::trace!(target: "tcg_core", "Reserved token header {:#04X}", header);
                return Err(TcgError::Failure);
            }
        };

        let data = buffer.get(header_len..header_len + data_len).ok_or(TcgError::Failure)?;
        let token = if is_bytes {
            // A signed byte sequence is a continued sequence, which this implementation does not produce or accept.
            if signed {
                return Err(TcgError::Failure);
            }
            Token::Bytes(data)
        } else {
            Token::Integer { signed, data }
        };
        Ok((token, header_len + data_len))
    }

    /// Returns the value of an unsigned integer token (tiny or integer atom of at most 8 bytes).
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Token::TinyAtom { signed: false, value } => Some(value as u64),
            Token::Integer { signed: false, data } if data.len() <= 8 => {
                Some(data.iter().fold(0_u64, |value, byte| (value << 8) | *byte as u64))
            }
            _ => None,
        }
    }
}

/// Returns the atom header bytes for a byte sequence of `length` bytes along with the number of header bytes used.
pub fn byte_sequence_header(length: usize) -> Result<([u8; 4], usize)> {
    if length <= SHORT_ATOM_MAX_LENGTH {
        Ok(([SHORT_ATOM | SHORT_ATOM_BYTE_FLAG | length as u8, 0, 0, 0], 1))
    } else if length <= MEDIUM_ATOM_MAX_LENGTH {
        Ok(([MEDIUM_ATOM | MEDIUM_ATOM_BYTE_FLAG | (length >> 8) as u8, length as u8, 0, 0], 2))
    } else if length <= LONG_ATOM_MAX_LENGTH {
        Ok(([LONG_ATOM | LONG_ATOM_BYTE_FLAG, (length >> 16) as u8, (length >> 8) as u8, length as u8], 4))
    } else {
        Err(TcgError::Failure)
    }
}

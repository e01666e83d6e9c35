//! Trusted send and receive.
//!
//! Storage security commands move whole 512 byte blocks. [`Transport::trusted_send`] pads the outgoing message and
//! [`Transport::trusted_recv`] polls the device until the ComPacket it returns is complete.
//!
//! A TPer that has not finished processing a method answers with a ComPacket whose `Length` is 0 or whose
//! `OutstandingData` is not 0. Such answers are retried after a stall, for a bounded number of attempts derived from
//! the caller's time estimate (see [`RetryPolicy`](crate::RetryPolicy)).
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
use patina_tcg_core::{
    Result, TcgError,
    discovery::{LEVEL0_DISCOVERY_COM_ID, SECURITY_PROTOCOL_TCG1, SECURITY_PROTOCOL_TCG2},
    packet::{self, ComPacketHeader},
};

use crate::{
    BLOCK_SIZE,
    config::TransportConfig,
    protocol::{Stall, StorageSecurityCommand},
};

/// Security protocol transport bound to one medium.
#[derive(Clone, Copy)]
pub struct Transport<'a> {
    command: &'a dyn StorageSecurityCommand,
    stall: &'a dyn Stall,
    config: TransportConfig,
    media_id: u32,
}

impl<'a> Transport<'a> {
    pub fn new(command: &'a dyn StorageSecurityCommand, stall: &'a dyn Stall, media_id: u32) -> Self {
        Self { command, stall, config: TransportConfig::default(), media_id }
    }

    pub fn with_config(self, config: TransportConfig) -> Self {
        Self { config, ..self }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn media_id(&self) -> u32 {
        self.media_id
    }

    /// Sends the first `transfer_length` bytes of `buffer`.
    ///
    /// The transfer is rounded up to the block size and the bytes between `transfer_length` and the rounded length
    /// are zeroed, so `buffer` must hold the rounded length.
    pub fn trusted_send(&self, protocol: u8, sp_specific: u16, transfer_length: usize, buffer: &mut [u8]) -> Result<()> {
        let rounded = transfer_length.div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
        if rounded > buffer.len() {
            log::error!(target: "tcg_opal", "Send of {:#X} bytes needs a {:#X} byte buffer, got {:#X}", transfer_length, rounded, buffer.len());
            return Err(TcgError::BufferTooSmall { required: rounded });
        }
        buffer[transfer_length..rounded].fill(0);

        log::trace!(target: "tcg_opal", "TrustedSend protocol {:#04X} sp_specific {:#06X} length {:#X}", protocol, sp_specific, rounded);
        self.command
            .send_data(self.media_id, self.config.timeout_ns, protocol, sp_specific.swap_bytes(), &buffer[..rounded])
            .map_err(|status| {
                log::error!(target: "tcg_opal", "TrustedSend protocol {:#04X} sp_specific {:#06X} failed: {:#x?}", protocol, sp_specific, status);
                TcgError::Failure
            })
    }

    /// Receives a response into `buffer` and returns the transfer size reported by the device.
    ///
    /// Only the block aligned part of `buffer` is used. For Opal session traffic the call polls until the ComPacket
    /// is complete or the retry budget for `estimate_time_cost` seconds runs out.
    pub fn trusted_recv(
        &self,
        protocol: u8,
        sp_specific: u16,
        buffer: &mut [u8],
        estimate_time_cost: u32,
    ) -> Result<usize> {
        let capacity = buffer.len() / BLOCK_SIZE * BLOCK_SIZE;
        if capacity < ComPacketHeader::SIZE {
            log::error!(target: "tcg_opal", "Receive buffer of {:#X} bytes holds no complete block", buffer.len());
            return Err(TcgError::BufferTooSmall { required: BLOCK_SIZE });
        }
        let buffer = &mut buffer[..capacity];

        let attempts = self.config.retry.attempts(estimate_time_cost);
        for attempt in 0..attempts {
            if attempt != 0 {
                self.stall.stall(self.config.retry.interval_us);
            }

            buffer.fill(0);
            let transfer_size = self
                .command
                .receive_data(self.media_id, self.config.timeout_ns, protocol, sp_specific.swap_bytes(), buffer)
                .map_err(|status| {
                    log::error!(target: "tcg_opal", "TrustedRecv protocol {:#04X} sp_specific {:#06X} failed: {:#x?}", protocol, sp_specific, status);
                    TcgError::Failure
                })?;

            if !polls_for_completion(protocol, sp_specific) {
                return Ok(transfer_size);
            }

            match packet::com_packet_progress(buffer) {
                Some((length, 0)) if length != 0 => {
                    log::trace!(target: "tcg_opal", "TrustedRecv complete after {} attempt(s), length {:#X}", attempt + 1, length);
                    return Ok(transfer_size);
                }
                progress => {
                    log::trace!(target: "tcg_opal", "TrustedRecv attempt {} not complete: {:?}", attempt + 1, progress);
                }
            }
        }

        log::error!(target: "tcg_opal", "TrustedRecv protocol {:#04X} sp_specific {:#06X} gave up after {} attempts", protocol, sp_specific, attempts);
        Err(TcgError::Failure)
    }
}

/// Level 0 Discovery and non-TCG protocols answer immediately; only ComPacket traffic reports progress.
fn polls_for_completion(protocol: u8, sp_specific: u16) -> bool {
    (protocol == SECURITY_PROTOCOL_TCG1 || protocol == SECURITY_PROTOCOL_TCG2) && sp_specific != LEVEL0_DISCOVERY_COM_ID
}

//! Block SID authentication.
//!
//! The Block SID request (security protocol 0x02, ComID 0x0005) makes the drive refuse SID authentication until the
//! next power cycle, or also until the next hardware reset when `hardware_reset` is set. It needs no session and the
//! drive sends no response.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
use patina_tcg_core::{
    Result,
    discovery::{BlockSidClearEvents, SECURITY_PROTOCOL_TCG2},
};

use crate::{BUFFER_SIZE, session::OpalSession};

/// ComID of the Block SID authentication command.
pub const BLOCK_SID_COM_ID: u16 = 0x0005;

impl OpalSession<'_> {
    /// Sends the Block SID authentication command.
    pub fn block_sid(&self, hardware_reset: bool) -> Result<()> {
        let mut buffer = [0u8; BUFFER_SIZE];
        buffer[0] = BlockSidClearEvents::new().with_hardware_reset(hardware_reset).into_bits();

        self.transport.trusted_send(SECURITY_PROTOCOL_TCG2, BLOCK_SID_COM_ID, 2, &mut buffer).inspect_err(|err| {
            log::error!(target: "tcg_opal", "Block SID failed: {}", err);
        })?;
        log::info!(target: "tcg_opal", "Block SID sent (clear on hardware reset: {})", hardware_reset);
        Ok(())
    }
}

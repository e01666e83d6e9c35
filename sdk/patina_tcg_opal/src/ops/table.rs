//! Table getters.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
use patina_tcg_core::{Result, TcgError, TcgUid, discovery::DataRemovalMechanism};

use crate::{
    session::OpalSession,
    uid::{self, cpin_column},
};

impl OpalSession<'_> {
    /// Copies the C_PIN_MSID PIN into `buffer` and returns its length.
    ///
    /// If the PIN does not fit, nothing is written and the error carries the PIN length.
    pub fn get_msid(&self, buffer: &mut [u8]) -> Result<usize> {
        self.get_column(uid::CPIN_MSID, cpin_column::PIN, |parse| {
            let pin = parse.next_bytes()?;
            if pin.len() > buffer.len() {
                log::error!(target: "tcg_opal", "MSID of {} bytes does not fit a {} byte buffer", pin.len(), buffer.len());
                return Err(TcgError::BufferTooSmall { required: pin.len() });
            }
            buffer[..pin.len()].copy_from_slice(pin);
            Ok(pin.len())
        })
    }

    /// Reads the TryLimit column of the C_PIN row `cpin_row`.
    pub fn get_try_limit(&self, cpin_row: TcgUid) -> Result<u32> {
        self.get_column(cpin_row, cpin_column::TRY_LIMIT, |parse| parse.next_u32())
    }

    /// Reads the Tries column (failed authentication attempts) of the C_PIN row `cpin_row`.
    pub fn get_tries(&self, cpin_row: TcgUid) -> Result<u32> {
        self.get_column(cpin_row, cpin_column::TRIES, |parse| parse.next_u32())
    }

    /// Reads the active data removal mechanism of a Pyrite 2.0 drive.
    pub fn pyrite2_get_active_data_removal_mechanism(&self) -> Result<DataRemovalMechanism> {
        self.get_column(uid::DATA_REMOVAL_MECHANISM, uid::DATA_REMOVAL_ACTIVE_MECHANISM_COLUMN, |parse| {
            let value = parse.next_u64()?;
            DataRemovalMechanism::try_from(value).inspect_err(|_| {
                log::error!(target: "tcg_opal", "Active data removal mechanism {} out of range", value);
            })
        })
    }
}

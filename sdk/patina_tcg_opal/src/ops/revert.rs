//! Admin and PSID revert.
//!
//! A successful revert ends the session on the drive side. None of these functions send EndSession afterwards.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
use patina_tcg_core::{MethodStatus, Result};

use crate::{session::OpalSession, uid};

impl OpalSession<'_> {
    /// Reverts the SP the session is open on. See [`OpalSession::pyrite2_admin_revert`].
    pub fn admin_revert(&self, keep_user_data: bool) -> Result<MethodStatus> {
        self.pyrite2_admin_revert(keep_user_data, 0)
    }

    /// Reverts the SP the session is open on, waiting up to `estimate_time_cost` seconds for the drive.
    ///
    /// With `keep_user_data` the global range is unlocked first and RevertSP asks the drive to keep the global
    /// range key. If the unlock is refused or fails, no revert is attempted and the unlock result is returned.
    pub fn pyrite2_admin_revert(&self, keep_user_data: bool, estimate_time_cost: u32) -> Result<MethodStatus> {
        if keep_user_data {
            let status = self.update_global_locking_range(false, false)?;
            if !status.is_success() {
                log::warn!(target: "tcg_opal", "Global range unlock before revert refused: {:?}", status);
                return Ok(status);
            }
        }

        let status = self.call_method(uid::THIS_SP, uid::METHOD_REVERT_SP, estimate_time_cost, |create| {
            if keep_user_data {
                create.start_name()?;
                create.add_u32(uid::REVERT_KEEP_GLOBAL_RANGE_KEY)?;
                create.add_bool(true)?;
                create.end_name()?;
            }
            Ok(())
        })?;
        log::info!(target: "tcg_opal", "RevertSP (keep user data: {}): {:?}", keep_user_data, status);
        Ok(status)
    }

    /// Reverts the TPer to its manufactured state. Issued on an Admin SP session authenticated with the PSID.
    pub fn psid_revert(&self) -> Result<MethodStatus> {
        self.pyrite2_psid_revert(0)
    }

    /// [`OpalSession::psid_revert`] waiting up to `estimate_time_cost` seconds for the drive.
    pub fn pyrite2_psid_revert(&self, estimate_time_cost: u32) -> Result<MethodStatus> {
        let status = self.call_method(uid::ADMIN_SP, uid::METHOD_REVERT, estimate_time_cost, |_| Ok(()))?;
        log::info!(target: "tcg_opal", "PSID Revert: {:?}", status);
        Ok(status)
    }
}

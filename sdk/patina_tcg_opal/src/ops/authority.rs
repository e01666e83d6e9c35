//! Locking SP activation, credentials and authority enablement.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
use patina_tcg_core::{MethodStatus, Result, TcgError, TcgUid, command, uid::AceBooleanOperator};

use crate::{session::OpalSession, uid};

impl OpalSession<'_> {
    /// Activates the Locking SP. Issued on an Admin SP session authenticated as SID.
    ///
    /// Activating an already active Locking SP succeeds without changing it.
    pub fn activate_locking_sp(&self) -> Result<MethodStatus> {
        let status = self.call_method(uid::LOCKING_SP, uid::METHOD_ACTIVATE, 0, |_| Ok(()))?;
        log::debug!(target: "tcg_opal", "Activate Locking SP: {:?}", status);
        Ok(status)
    }

    /// Sets the PIN of the C_PIN row `cpin_row`.
    pub fn set_password(&self, cpin_row: TcgUid, new_pin: &[u8]) -> Result<MethodStatus> {
        let status =
            self.run_method(0, |buffer, ids| command::create_set_cpin(buffer, ids, cpin_row, new_pin))?;
        if !status.is_success() {
            log::warn!(target: "tcg_opal", "Set PIN of {} refused: {:?}", cpin_row, status);
        }
        Ok(status)
    }

    /// Enables `authority`, sets its PIN and grants it, alongside the Admins, control of the global locking range.
    ///
    /// The grants cover the SetRdLocked, SetWrLocked and GetAll ACEs of the global range and, when the range's
    /// active key is an AES-128 or AES-256 key, the GenKey ACE of that key. A drive without a readable active key
    /// (Pyrite) gets no GenKey grant.
    ///
    /// A refused enable or PIN update is returned as its status. A refused ACE update is a [`TcgError::Failure`].
    /// Completed steps are not rolled back.
    pub fn set_locking_sp_authority_enabled_and_pin(
        &self,
        cpin_row: TcgUid,
        authority: TcgUid,
        new_pin: &[u8],
    ) -> Result<MethodStatus> {
        let status =
            self.run_method(0, |buffer, ids| command::create_set_authority_enabled(buffer, ids, authority, true))?;
        if !status.is_success() {
            log::warn!(target: "tcg_opal", "Enable of {} refused: {:?}", authority, status);
            return Ok(status);
        }

        let status = self.set_password(cpin_row, new_pin)?;
        if !status.is_success() {
            return Ok(status);
        }

        for ace in [
            uid::ACE_LOCKING_GLOBAL_RANGE_SET_RD_LOCKED,
            uid::ACE_LOCKING_GLOBAL_RANGE_SET_WR_LOCKED,
            uid::ACE_LOCKING_GLOBAL_RANGE_GET_ALL,
        ] {
            self.grant_ace(ace, authority)?;
        }

        let active_key = match self.retrieve_global_locking_range_active_key() {
            Ok(active_key) => active_key,
            Err(err) => {
                log::debug!(target: "tcg_opal", "No active key for the global range ({}), GenKey ACE not updated", err);
                return Ok(MethodStatus::SUCCESS);
            }
        };
        let gen_key_ace = match active_key {
            uid::K_AES_128_GLOBAL_RANGE_KEY => uid::ACE_K_AES_128_GLOBAL_RANGE_GEN_KEY,
            uid::K_AES_256_GLOBAL_RANGE_KEY => uid::ACE_K_AES_256_GLOBAL_RANGE_GEN_KEY,
            other => {
                log::error!(target: "tcg_opal", "Unrecognized global range active key {}", other);
                return Err(TcgError::Failure);
            }
        };
        self.grant_ace(gen_key_ace, authority)?;
        Ok(MethodStatus::SUCCESS)
    }

    /// Disables the Locking SP User1 authority.
    pub fn disable_user(&self) -> Result<MethodStatus> {
        self.run_method(0, |buffer, ids| {
            command::create_set_authority_enabled(buffer, ids, uid::AUTHORITY_LOCKING_SP_USER1, false)
        })
    }

    /// Sets the BooleanExpr of `ace` to `authority OR Admins`.
    fn grant_ace(&self, ace: TcgUid, authority: TcgUid) -> Result<()> {
        let status = self.run_method(0, |buffer, ids| {
            command::create_set_ace(buffer, ids, ace, authority, uid::AUTHORITY_ADMINS, AceBooleanOperator::Or)
        })?;
        if !status.is_success() {
            log::error!(target: "tcg_opal", "Update of ACE {} for {} refused: {:?}", ace, authority, status);
            return Err(TcgError::Failure);
        }
        Ok(())
    }
}

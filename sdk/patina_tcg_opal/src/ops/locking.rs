//! Locking range configuration and key generation.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
use patina_tcg_core::{MethodStatus, Result, TcgCreate, TcgUid, command};

use crate::{
    session::OpalSession,
    uid::{self, locking_column},
};

fn add_column(create: &mut TcgCreate, column: u8, add_value: impl FnOnce(&mut TcgCreate) -> Result<()>) -> Result<()> {
    create.start_name()?;
    create.add_u8(column)?;
    add_value(create)?;
    create.end_name()
}

impl OpalSession<'_> {
    /// Sets the ReadLocked and WriteLocked columns of the global locking range.
    pub fn update_global_locking_range(&self, read_locked: bool, write_locked: bool) -> Result<MethodStatus> {
        let status = self.run_method(0, |buffer, ids| {
            command::create_method(buffer, ids, |create| {
                command::start_method_set(create, uid::LOCKING_RANGE_GLOBAL)?;
                add_column(create, locking_column::READ_LOCKED, |create| create.add_bool(read_locked))?;
                add_column(create, locking_column::WRITE_LOCKED, |create| create.add_bool(write_locked))?;
                command::end_method_set(create)
            })
        })?;
        log::debug!(target: "tcg_opal", "Global range read_locked={} write_locked={}: {:?}", read_locked, write_locked, status);
        Ok(status)
    }

    /// Configures locking range `range`.
    ///
    /// `range_start` and `range_length` are not sent for the global range, which always covers the whole medium.
    #[allow(clippy::too_many_arguments)]
    pub fn set_locking_range(
        &self,
        range: TcgUid,
        range_start: u64,
        range_length: u64,
        read_lock_enabled: bool,
        write_lock_enabled: bool,
        read_locked: bool,
        write_locked: bool,
    ) -> Result<MethodStatus> {
        let status = self.run_method(0, |buffer, ids| {
            command::create_method(buffer, ids, |create| {
                command::start_method_set(create, range)?;
                if range != uid::LOCKING_RANGE_GLOBAL {
                    add_column(create, locking_column::RANGE_START, |create| create.add_u64(range_start))?;
                    add_column(create, locking_column::RANGE_LENGTH, |create| create.add_u64(range_length))?;
                }
                add_column(create, locking_column::READ_LOCK_ENABLED, |create| create.add_bool(read_lock_enabled))?;
                add_column(create, locking_column::WRITE_LOCK_ENABLED, |create| create.add_bool(write_lock_enabled))?;
                add_column(create, locking_column::READ_LOCKED, |create| create.add_bool(read_locked))?;
                add_column(create, locking_column::WRITE_LOCKED, |create| create.add_bool(write_locked))?;
                command::end_method_set(create)
            })
        })?;
        if !status.is_success() {
            log::warn!(target: "tcg_opal", "Set of locking range {} refused: {:?}", range, status);
        }
        Ok(status)
    }

    /// Reads the ActiveKey column of the global locking range.
    pub fn retrieve_global_locking_range_active_key(&self) -> Result<TcgUid> {
        self.get_column(uid::LOCKING_RANGE_GLOBAL, locking_column::ACTIVE_KEY, |parse| parse.next_uid())
    }

    /// Generates a new media encryption key for the global range, cryptographically erasing its data.
    ///
    /// Fails before any GenKey is sent if the active key cannot be read.
    pub fn global_locking_range_gen_key(&self) -> Result<MethodStatus> {
        let active_key = self.retrieve_global_locking_range_active_key()?;
        let status = self.call_method(active_key, uid::METHOD_GEN_KEY, 0, |_| Ok(()))?;
        log::debug!(target: "tcg_opal", "GenKey on {}: {:?}", active_key, status);
        Ok(status)
    }
}

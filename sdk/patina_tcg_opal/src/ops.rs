//! Security operations on an open session.
//!
//! Every operation builds one or more method calls, runs them through [`OpalSession::perform_method`] and reports
//! the drive's verdict as a [`MethodStatus`] inside `Ok`. `Err` is reserved for exchanges that could not be
//! completed. The getters are the exception: they need the value the drive returns, so a refused Get is reported as
//! [`TcgError::Failure`](patina_tcg_core::TcgError::Failure).
//!
//! | Module | Operations |
//! |--------|------------|
//! | [`authority`] | `activate_locking_sp`, `set_password`, `set_locking_sp_authority_enabled_and_pin`, `disable_user` |
//! | [`locking`] | `update_global_locking_range`, `set_locking_range`, `global_locking_range_gen_key`, `retrieve_global_locking_range_active_key` |
//! | [`revert`] | `admin_revert`, `pyrite2_admin_revert`, `psid_revert`, `pyrite2_psid_revert` |
//! | [`table`] | `get_msid`, `get_try_limit`, `get_tries`, `pyrite2_get_active_data_removal_mechanism` |
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
use patina_tcg_core::{MethodStatus, Result, SessionIds, TcgCreate, TcgError, TcgParse, TcgUid, command};

use crate::{BUFFER_SIZE, session::OpalSession};

pub mod authority;
pub mod locking;
pub mod revert;
pub mod table;

impl OpalSession<'_> {
    /// Builds a message with `build`, runs it and returns the method status.
    pub(crate) fn run_method<F>(&self, estimate_time_cost: u32, build: F) -> Result<MethodStatus>
    where
        F: FnOnce(&mut [u8], &SessionIds) -> Result<usize>,
    {
        let mut buffer = [0u8; BUFFER_SIZE];
        let size = build(&mut buffer, &self.ids())?;
        let (_, status) = self.perform_method(size, &mut buffer, estimate_time_cost)?;
        Ok(status)
    }

    /// Runs a method call `method` on `invoking` whose parameter list is written by `parameters`.
    pub(crate) fn call_method<F>(
        &self,
        invoking: TcgUid,
        method: TcgUid,
        estimate_time_cost: u32,
        parameters: F,
    ) -> Result<MethodStatus>
    where
        F: FnOnce(&mut TcgCreate) -> Result<()>,
    {
        self.run_method(estimate_time_cost, |buffer, ids| {
            command::create_method(buffer, ids, |create| {
                create.start_method_call(invoking, method)?;
                create.start_parameters()?;
                parameters(create)?;
                create.end_parameters()?;
                create.end_method_call()
            })
        })
    }

    /// Runs a Get of the single column `column` of `row` and hands the column value to `read`.
    ///
    /// A refused Get is a [`TcgError::Failure`].
    pub(crate) fn get_column<T, F>(&self, row: TcgUid, column: u8, read: F) -> Result<T>
    where
        F: FnOnce(&mut TcgParse) -> Result<T>,
    {
        let mut buffer = [0u8; BUFFER_SIZE];
        let size = command::create_get_columns(&mut buffer, &self.ids(), row, column as u32, column as u32)?;
        let (mut parse, status) = self.perform_method(size, &mut buffer, 0)?;
        if !status.is_success() {
            log::warn!(target: "tcg_opal", "Get of {} column {} refused: {:?}", row, column, status);
            return Err(TcgError::Failure);
        }

        command::parse_get_response_start(&mut parse)?;
        command::parse_column_name(&mut parse, column as u32)?;
        let value = read(&mut parse)?;
        parse.next_end_name()?;
        Ok(value)
    }
}

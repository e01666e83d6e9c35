//! TCG Opal Integration Tests
//!
//! Runs the `patina_tcg_opal` session, discovery and security operations against a simulated TPer.
//!
//! ## Logging
//!
//! The `env_logger` crate can be used to enable logging during tests. Set `RUST_LOG` to the desired level, for
//! example:
//!
//! ```sh
//! RUST_LOG=tcg_opal=trace,simulated_tper=debug cargo make test -p patina_tcg_opal --test opal_integration
//! ```
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent

// Common utilities available to all test modules
mod common;

mod discovery_tests;
mod ops_tests;
mod session_tests;

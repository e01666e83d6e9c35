//! Transport timing configuration.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent

/// Timeout handed to every send and receive call, 5 seconds in nanoseconds.
pub const DEFAULT_TIMEOUT_NS: u64 = 5_000_000_000;

/// Polling budget of `trusted_recv` while the TPer reports a response as still in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts made regardless of the caller's estimate.
    pub min_attempts: u32,
    /// Attempts granted per second of the caller's estimated time cost.
    pub attempts_per_second: u32,
    /// Stall between two attempts, in microseconds.
    pub interval_us: usize,
}

impl RetryPolicy {
    /// Number of receive attempts for an operation expected to take `estimate_time_cost` seconds.
    pub fn attempts(&self, estimate_time_cost: u32) -> u32 {
        self.min_attempts.max(estimate_time_cost.saturating_mul(self.attempts_per_second))
    }
}

impl Default for RetryPolicy {
    /// 5000 attempts 2 ms apart, about 10 seconds.
    fn default() -> Self {
        Self { min_attempts: 5000, attempts_per_second: 500, interval_us: 2000 }
    }
}

/// Configuration of the transport adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    pub timeout_ns: u64,
    pub retry: RetryPolicy,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { timeout_ns: DEFAULT_TIMEOUT_NS, retry: RetryPolicy::default() }
    }
}

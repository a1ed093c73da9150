// ABOUTME: Exponential backoff with a delay cap and random jitter
// ABOUTME: Shared by webhook retries and chat session reconnects
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

use rand::Rng;
use std::time::Duration;

/// Exponential backoff policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// Delay before the first retry
    pub base: Duration,
    /// Upper bound on any delay
    pub max: Duration,
}

impl Backoff {
    /// Policy from millisecond values
    #[must_use]
    pub const fn from_millis(base_ms: u64, max_ms: u64) -> Self {
        Self {
            base: Duration::from_millis(base_ms),
            max: Duration::from_millis(max_ms),
        }
    }

    /// Delay without jitter for the `attempt`-th retry (1-based)
    #[must_use]
    pub fn nominal(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(20);
        self.base
            .checked_mul(1_u32 << exponent)
            .map_or(self.max, |delay| delay.min(self.max))
    }

    /// Delay with up to 25% random jitter subtracted, so retries never exceed the cap
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let nominal = self.nominal(attempt);
        let spread = nominal.as_millis() / 4;
        if spread == 0 {
            return nominal;
        }
        let jitter = rand::thread_rng().gen_range(0..=spread);
        nominal.saturating_sub(Duration::from_millis(u64::try_from(jitter).unwrap_or(0)))
    }
}

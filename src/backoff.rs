// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Delay schedule between poll attempts.

use crate::constants::poll::{BACKOFF_MAX_MILLIS, BACKOFF_MIN_MILLIS};
use rand::Rng;
use std::time::Duration;

/// Bounds of the delay band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    pub min: Duration,
    pub max: Duration,
    pub jitter: bool,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(BACKOFF_MIN_MILLIS),
            max: Duration::from_millis(BACKOFF_MAX_MILLIS),
            jitter: true,
        }
    }
}

impl BackoffConfig {
    /// A band that always yields `delay`
    pub fn constant(delay: Duration) -> Self {
        Self {
            min: delay,
            max: delay,
            jitter: false,
        }
    }

    pub fn build(self) -> Backoff {
        Backoff::new(self)
    }
}

/// Per-poll delay generator.
///
/// Yields `min` on every call when jitter is off, a uniform draw from
/// `[min, max]` when it is on. A `max` below `min` collapses the band to `min`.
#[derive(Debug)]
pub struct Backoff {
    config: BackoffConfig,
    attempt: u32,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self { config, attempt: 0 }
    }

    pub fn next(&mut self) -> Duration {
        self.attempt = self.attempt.saturating_add(1);

        let BackoffConfig { min, max, jitter } = self.config;
        if !jitter || max <= min {
            return min;
        }

        rand::thread_rng().gen_range(min..=max)
    }

    /// Number of delays handed out so far
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Largest delay this generator can produce
    pub fn max_delay(&self) -> Duration {
        self.config.max.max(self.config.min)
    }
}

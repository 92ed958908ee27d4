//
// Copyright (c) Dell Inc., or its subsidiaries. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//

use num::checked_pow;
use std::time::Duration;

/// The backoff policy used between attempts.
///
/// Maps the index of an attempt (starting at 0) to the time the engine waits
/// if that attempt fails with a transient fault. The engine asks for the wait
/// time before running the attempt and throws the value away when the attempt
/// succeeds or turns out to be the last one, so implementations must be pure.
pub trait RecoveryWaitTime {
    fn recovery_wait_time(&self, attempt: u32) -> Duration;
}

/// Any closure mapping an attempt index to a `Duration` is a backoff policy.
impl<F> RecoveryWaitTime for F
where
    F: Fn(u32) -> Duration,
{
    fn recovery_wait_time(&self, attempt: u32) -> Duration {
        self(attempt)
    }
}

/// Capped exponential backoff.
///
/// The wait for attempt `n` is `initial_delay * backoff_coefficient^n`,
/// never longer than `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryWithBackoff {
    initial_delay: Duration,
    backoff_coefficient: u32,
    max_delay: Option<Duration>,
}

impl RetryWithBackoff {
    /// Constructs a new exponential back-off strategy,
    /// using default setting.
    pub fn default_setting() -> RetryWithBackoff {
        RetryWithBackoff {
            initial_delay: Duration::from_millis(1),
            backoff_coefficient: 10,
            max_delay: Some(Duration::from_millis(10000)),
        }
    }

    /// Waits the same `delay` after every failed attempt.
    pub fn fixed(delay: Duration) -> RetryWithBackoff {
        RetryWithBackoff {
            initial_delay: delay,
            backoff_coefficient: 1,
            max_delay: None,
        }
    }

    /// Apply a initial delay.
    pub fn initial_delay(mut self, initial_delay: Duration) -> RetryWithBackoff {
        self.initial_delay = initial_delay;
        self
    }

    /// Apply a backoff coefficient.
    pub fn backoff_coefficient(mut self, backoff_coefficient: u32) -> RetryWithBackoff {
        self.backoff_coefficient = backoff_coefficient;
        self
    }

    /// Apply a maximum delay. No retry delay will be longer than this `Duration`.
    pub fn max_delay(mut self, duration: Duration) -> RetryWithBackoff {
        self.max_delay = Some(duration);
        self
    }
}

impl Default for RetryWithBackoff {
    fn default() -> Self {
        RetryWithBackoff::default_setting()
    }
}

impl RecoveryWaitTime for RetryWithBackoff {
    fn recovery_wait_time(&self, attempt: u32) -> Duration {
        let coefficient = checked_pow(self.backoff_coefficient, attempt as usize);
        let delay = coefficient.and_then(|coefficient| self.initial_delay.checked_mul(coefficient));

        match (delay, self.max_delay) {
            (Some(delay), Some(max_delay)) => delay.min(max_delay),
            (Some(delay), None) => delay,
            // overflowed
            (None, Some(max_delay)) => max_delay,
            (None, None) => Duration::MAX,
        }
    }
}

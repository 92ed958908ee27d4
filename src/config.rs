//
// Copyright (c) Dell Inc., or its subsidiaries. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//

use crate::fault_parser::{default_transient_fault_parser, retryable_fault_parser, Retryable};
use crate::retry_policy::{RecoveryWaitTime, RetryWithBackoff};
use derive_builder::*;
use getset::{CopyGetters, Getters};
use std::env;
use std::error::Error;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_RETRY_ATTEMPTS: i32 = 5;
const RECOVERY_ENABLED_ENV: &str = "fault_recovery_enabled";
const RETRY_ATTEMPTS_ENV: &str = "fault_recovery_retry_attempts";

pub type RecoveryWaitTimeCallback = Arc<dyn RecoveryWaitTime + Send + Sync>;
pub type TransientFaultParserCallback = Arc<dyn Fn(&(dyn Error + 'static)) -> bool + Send + Sync>;

/// Settings of the transient fault recovery engine.
///
/// Built with [`RecoveryConfigBuilder`]; `enable_transient_fault_recovery` and
/// `retry_attempts` fall back to the `fault_recovery_enabled` and
/// `fault_recovery_retry_attempts` environment variables before the compiled
/// defaults.
#[derive(Builder, Getters, CopyGetters, Clone)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct RecoveryConfig {
    #[get_copy = "pub"]
    #[builder(default = "self.default_enable_transient_fault_recovery()")]
    enable_transient_fault_recovery: bool,

    /// Retries after the first attempt.
    #[get_copy = "pub"]
    #[builder(default = "self.default_retry_attempts()")]
    retry_attempts: i32,

    #[get = "pub"]
    #[builder(setter(custom), default = "default_recovery_wait_time_callback()")]
    recovery_wait_time_callback: RecoveryWaitTimeCallback,

    #[get = "pub"]
    #[builder(setter(custom), default = "default_transient_fault_parser_callback()")]
    transient_fault_parser_callback: TransientFaultParserCallback,
}

impl RecoveryConfig {
    pub fn builder() -> RecoveryConfigBuilder {
        RecoveryConfigBuilder::default()
    }

    /// The wait that applies if attempt number `attempt` fails.
    pub fn recovery_wait_time(&self, attempt: u32) -> Duration {
        self.recovery_wait_time_callback.recovery_wait_time(attempt)
    }

    pub fn is_transient(&self, error: &(dyn Error + 'static)) -> bool {
        (self.transient_fault_parser_callback)(error)
    }

    // validated non-negative at build time
    pub(crate) fn max_retries(&self) -> u32 {
        self.retry_attempts.max(0) as u32
    }
}

/// The compiled defaults, ignoring the environment.
impl Default for RecoveryConfig {
    fn default() -> Self {
        RecoveryConfig {
            enable_transient_fault_recovery: true,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            recovery_wait_time_callback: default_recovery_wait_time_callback(),
            transient_fault_parser_callback: default_transient_fault_parser_callback(),
        }
    }
}

impl fmt::Debug for RecoveryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecoveryConfig")
            .field(
                "enable_transient_fault_recovery",
                &self.enable_transient_fault_recovery,
            )
            .field("retry_attempts", &self.retry_attempts)
            .field("recovery_wait_time_callback", &"<callback>")
            .field("transient_fault_parser_callback", &"<callback>")
            .finish()
    }
}

fn default_recovery_wait_time_callback() -> RecoveryWaitTimeCallback {
    Arc::new(RetryWithBackoff::default_setting())
}

fn default_transient_fault_parser_callback() -> TransientFaultParserCallback {
    Arc::new(default_transient_fault_parser)
}

fn env_override<T>(key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let value = env::var(key).ok()?;
    match value.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!("ignoring {}={:?}: {}", key, value, e);
            None
        }
    }
}

impl RecoveryConfigBuilder {
    /// Sets the backoff policy, either a [`RetryWithBackoff`] or any
    /// `Fn(u32) -> Duration`.
    pub fn recovery_wait_time_callback<P>(&mut self, policy: P) -> &mut Self
    where
        P: RecoveryWaitTime + Send + Sync + 'static,
    {
        self.recovery_wait_time_callback = Some(Arc::new(policy));
        self
    }

    /// Sets the predicate deciding whether a failure is transient.
    pub fn transient_fault_parser_callback<F>(&mut self, parser: F) -> &mut Self
    where
        F: Fn(&(dyn Error + 'static)) -> bool + Send + Sync + 'static,
    {
        self.transient_fault_parser_callback = Some(Arc::new(parser));
        self
    }

    /// Classifies failures of type `E` with [`Retryable::can_retry`].
    pub fn transient_fault_parser_for<E>(&mut self) -> &mut Self
    where
        E: Retryable + Error + 'static,
    {
        self.transient_fault_parser_callback(retryable_fault_parser::<E>)
    }

    fn default_enable_transient_fault_recovery(&self) -> bool {
        env_override(RECOVERY_ENABLED_ENV).unwrap_or(true)
    }

    fn default_retry_attempts(&self) -> i32 {
        env_override(RETRY_ATTEMPTS_ENV).unwrap_or(DEFAULT_RETRY_ATTEMPTS)
    }

    fn validate(&self) -> Result<(), String> {
        let retry_attempts = self
            .retry_attempts
            .unwrap_or_else(|| self.default_retry_attempts());
        if retry_attempts < 0 {
            return Err(format!(
                "retry_attempts must not be negative, got {}",
                retry_attempts
            ));
        }
        Ok(())
    }
}

//
// Copyright (c) Dell Inc., or its subsidiaries. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//

use snafu::Snafu;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::time::Duration;

pub const ATTEMPTS_KEY: &str = "Attempts";
pub const RECOVERY_WAIT_TIME_KEY: &str = "RecoveryWaitTimeInSeconds";
pub const TOTAL_RECOVERY_WAIT_TIME_KEY: &str = "TotalRecoveryWaitTimeInSeconds";

/// Summary the engine records when it runs out of retries on a transient fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransientFaultDiagnostic {
    pub(crate) attempts: u32,
    pub(crate) recovery_wait_time: Duration,
    pub(crate) total_recovery_wait_time: Duration,
}

impl TransientFaultDiagnostic {
    /// Number of retries performed, not counting the first attempt.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The wait that would have preceded the next retry.
    pub fn recovery_wait_time(&self) -> Duration {
        self.recovery_wait_time
    }

    /// Sum of every wait actually performed.
    pub fn total_recovery_wait_time(&self) -> Duration {
        self.total_recovery_wait_time
    }

    /// String keyed view of the diagnostic, durations in seconds.
    pub fn metadata(&self) -> BTreeMap<&'static str, String> {
        let mut metadata = BTreeMap::new();
        metadata.insert(ATTEMPTS_KEY, self.attempts.to_string());
        metadata.insert(
            RECOVERY_WAIT_TIME_KEY,
            self.recovery_wait_time.as_secs_f64().to_string(),
        );
        metadata.insert(
            TOTAL_RECOVERY_WAIT_TIME_KEY,
            self.total_recovery_wait_time.as_secs_f64().to_string(),
        );
        metadata
    }
}

impl fmt::Display for TransientFaultDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={}, {}={}, {}={}",
            ATTEMPTS_KEY,
            self.attempts,
            RECOVERY_WAIT_TIME_KEY,
            self.recovery_wait_time.as_secs_f64(),
            TOTAL_RECOVERY_WAIT_TIME_KEY,
            self.total_recovery_wait_time.as_secs_f64()
        )
    }
}

/// One entry of an aggregated failure log.
#[derive(Debug, Snafu)]
pub enum Failure<E>
where
    E: Error + 'static,
{
    #[snafu(display("{}", source))]
    Operation { source: E },
    #[snafu(display("Transient fault recovery exhausted its retries ({})", diagnostic))]
    RetriesExhausted { diagnostic: TransientFaultDiagnostic },
}

impl<E> Failure<E>
where
    E: Error + 'static,
{
    /// The failure raised by the work, if this entry is not the synthetic diagnostic.
    pub fn as_operation(&self) -> Option<&E> {
        match self {
            Failure::Operation { source } => Some(source),
            Failure::RetriesExhausted { .. } => None,
        }
    }

    pub fn diagnostic(&self) -> Option<&TransientFaultDiagnostic> {
        match self {
            Failure::Operation { .. } => None,
            Failure::RetriesExhausted { diagnostic } => Some(diagnostic),
        }
    }
}

/// Every failure seen during one engine invocation, most recent first.
#[derive(Debug)]
pub struct AggregatedFailure<E>
where
    E: Error + 'static,
{
    failures: Vec<Failure<E>>,
}

impl<E> AggregatedFailure<E>
where
    E: Error + 'static,
{
    pub(crate) fn new(failures: Vec<Failure<E>>) -> Self {
        AggregatedFailure { failures }
    }

    pub fn failures(&self) -> &[Failure<E>] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// The synthetic diagnostic, present only when retries were exhausted.
    pub fn diagnostic(&self) -> Option<&TransientFaultDiagnostic> {
        self.failures.first().and_then(Failure::diagnostic)
    }

    /// The failures raised by the work, most recent first.
    pub fn errors(&self) -> impl Iterator<Item = &E> {
        self.failures.iter().filter_map(Failure::as_operation)
    }

    pub fn into_failures(self) -> Vec<Failure<E>> {
        self.failures
    }
}

impl<E> fmt::Display for AggregatedFailure<E>
where
    E: Error + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failure(s) during transient fault recovery", self.failures.len())?;
        if let Some(latest) = self.failures.first() {
            write!(f, ", most recent: {}", latest)?;
        }
        Ok(())
    }
}

impl<E> Error for AggregatedFailure<E>
where
    E: Error + 'static,
{
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.failures.first().map(|failure| failure as &(dyn Error + 'static))
    }
}

/// The error returned by the engine.
#[derive(Debug, Snafu)]
pub enum RecoveryError<E>
where
    E: Error + 'static,
{
    /// Recovery was disabled and the single attempt failed.
    #[snafu(display("{}", source))]
    Unrecovered { source: E },
    /// Recovery was enabled and gave up.
    #[snafu(display("{}", source))]
    Aggregated { source: AggregatedFailure<E> },
}

impl<E> RecoveryError<E>
where
    E: Error + 'static,
{
    pub fn aggregated(&self) -> Option<&AggregatedFailure<E>> {
        match self {
            RecoveryError::Unrecovered { .. } => None,
            RecoveryError::Aggregated { source } => Some(source),
        }
    }

    pub fn into_aggregated(self) -> Option<AggregatedFailure<E>> {
        match self {
            RecoveryError::Unrecovered { .. } => None,
            RecoveryError::Aggregated { source } => Some(source),
        }
    }

    /// The failure propagated verbatim when recovery is disabled.
    pub fn unrecovered(&self) -> Option<&E> {
        match self {
            RecoveryError::Unrecovered { source } => Some(source),
            RecoveryError::Aggregated { .. } => None,
        }
    }
}

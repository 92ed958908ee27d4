//
// Copyright (c) Dell Inc., or its subsidiaries. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//

use crate::config::RecoveryConfig;
use crate::failure_log::FailureLog;
use crate::retry_result::{RecoveryError, TransientFaultDiagnostic};
use crate::work_item::{Function, Procedure, Tester, WorkItem};
use std::error::Error;
use std::thread::sleep;
use std::time::Duration;
use tracing::{debug, error, warn};

/// What to do after a failed attempt.
pub(crate) enum Next<E>
where
    E: Error + 'static,
{
    Wait(Duration),
    GiveUp(RecoveryError<E>),
}

/// State of one engine invocation with recovery enabled, shared by the
/// blocking and async engines.
pub(crate) struct RecoveryLoop<'a, E>
where
    E: Error + 'static,
{
    config: &'a RecoveryConfig,
    log: FailureLog<E>,
    attempt: u32,
    recovery_wait_time: Duration,
    total_recovery_wait_time: Duration,
}

impl<'a, E> RecoveryLoop<'a, E>
where
    E: Error + 'static,
{
    pub(crate) fn new(config: &'a RecoveryConfig) -> Self {
        RecoveryLoop {
            config,
            log: FailureLog::new(),
            attempt: 0,
            recovery_wait_time: Duration::default(),
            total_recovery_wait_time: Duration::default(),
        }
    }

    pub(crate) fn log(&self) -> &FailureLog<E> {
        &self.log
    }

    pub(crate) fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Looks up the wait for the attempt about to run.
    pub(crate) fn begin_attempt(&mut self) {
        self.recovery_wait_time = self.config.recovery_wait_time(self.attempt);
        debug!(
            "starting attempt {}, recovery wait time {:?}",
            self.attempt, self.recovery_wait_time
        );
    }

    pub(crate) fn on_failure(&mut self, failure: E) -> Next<E> {
        let is_transient = self.config.is_transient(&failure);
        let exhausted = self.attempt >= self.config.max_retries();

        if exhausted || !is_transient {
            if is_transient {
                error!(
                    "attempt {} failed and no retries are left: {}",
                    self.attempt, failure
                );
            } else {
                error!("attempt {} failed with a permanent fault: {}", self.attempt, failure);
            }
            self.log.record(failure);
            if is_transient {
                self.log.record_diagnostic(TransientFaultDiagnostic {
                    attempts: self.attempt,
                    recovery_wait_time: self.recovery_wait_time,
                    total_recovery_wait_time: self.total_recovery_wait_time,
                });
            }
            return Next::GiveUp(RecoveryError::Aggregated {
                source: self.log.take_aggregated(),
            });
        }

        warn!(
            "attempt {} failed with a transient fault, retrying in {:?}: {}",
            self.attempt, self.recovery_wait_time, failure
        );
        self.log.record(failure);
        self.total_recovery_wait_time = self
            .total_recovery_wait_time
            .saturating_add(self.recovery_wait_time);
        self.attempt += 1;
        Next::Wait(self.recovery_wait_time)
    }
}

/// Runs `work` until it succeeds, retries run out or it fails with a permanent fault.
///
/// With recovery disabled the work runs once and its failure comes back as
/// [`RecoveryError::Unrecovered`]. Otherwise every failure is logged and the
/// engine gives up with [`RecoveryError::Aggregated`], whose log is most recent
/// first and starts with a [`TransientFaultDiagnostic`] when the retries were
/// exhausted on a transient fault. The calling thread is blocked during waits.
pub fn execute<W>(config: &RecoveryConfig, mut work: W) -> Result<W::Output, RecoveryError<W::Error>>
where
    W: WorkItem,
{
    if !config.enable_transient_fault_recovery() {
        return match work.run_once(&FailureLog::new()) {
            Ok(value) => Ok(value),
            Err(source) => {
                work.release_partial_result();
                Err(RecoveryError::Unrecovered { source })
            }
        };
    }

    let mut recovery = RecoveryLoop::new(config);
    loop {
        recovery.begin_attempt();
        match work.run_once(recovery.log()) {
            Ok(value) => {
                if recovery.attempt() > 0 {
                    debug!("succeeded after {} retries", recovery.attempt());
                }
                return Ok(value);
            }
            Err(failure) => {
                work.release_partial_result();
                match recovery.on_failure(failure) {
                    Next::Wait(delay) => sleep(delay),
                    Next::GiveUp(error) => return Err(error),
                }
            }
        }
    }
}

/// Runs a procedure with transient fault recovery.
/// It can be used as follows:
/// let config = RecoveryConfig::default();
/// execute_procedure(&config, || connection.flush())?;
pub fn execute_procedure<F, E>(config: &RecoveryConfig, procedure: F) -> Result<(), RecoveryError<E>>
where
    F: FnMut() -> Result<(), E>,
    E: Error + 'static,
{
    execute(config, Procedure::new(procedure))
}

/// Runs a function with transient fault recovery and returns its result.
pub fn execute_function<F, T, E>(config: &RecoveryConfig, function: F) -> Result<T, RecoveryError<E>>
where
    F: FnMut() -> Result<T, E>,
    E: Error + 'static,
{
    execute(config, Function::new(function))
}

/// Runs a tester with transient fault recovery.
///
/// The tester writes its result into the slot it is given and returns whether
/// it succeeded. A `false` flag is an answer, not a failure, and is returned
/// as is. Whatever a failed attempt left in the slot is dropped.
pub fn execute_tester<F, T, E>(
    config: &RecoveryConfig,
    tester: F,
) -> Result<(bool, Option<T>), RecoveryError<E>>
where
    F: FnMut(&mut Option<T>) -> Result<bool, E>,
    E: Error + 'static,
{
    execute(config, Tester::new(tester))
}

//
// Copyright (c) Dell Inc., or its subsidiaries. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//

use super::config::RecoveryConfig;
use super::retry_policy::RetryWithBackoff;
use super::retry_result::{
    Failure, ATTEMPTS_KEY, RECOVERY_WAIT_TIME_KEY, TOTAL_RECOVERY_WAIT_TIME_KEY,
};
use super::retry_sync::{execute_function, execute_procedure};
use snafu::Snafu;
use std::error::Error;
use std::io;
use std::time::{Duration, Instant};

#[derive(Debug, PartialEq, Eq, Snafu)]
enum SnafuError {
    #[snafu(display("Attempt {} timed out", attempt))]
    Timeout { attempt: u32 },
}

fn timeout(attempt: u32) -> SnafuError {
    SnafuError::Timeout { attempt }
}

fn recovery(retry_attempts: i32, wait: Duration) -> RecoveryConfig {
    RecoveryConfig::builder()
        .enable_transient_fault_recovery(true)
        .retry_attempts(retry_attempts)
        .recovery_wait_time_callback(RetryWithBackoff::fixed(wait))
        .transient_fault_parser_callback(|_: &(dyn Error + 'static)| true)
        .build()
        .unwrap()
}

#[test]
fn disabled_recovery_propagates_the_exact_failure() {
    let config = RecoveryConfig::builder()
        .enable_transient_fault_recovery(false)
        .retry_attempts(4)
        .build()
        .unwrap();
    let mut calls = 0;
    let res = execute_function(&config, || -> Result<(), io::Error> {
        calls += 1;
        Err(io::Error::new(io::ErrorKind::TimedOut, "first and only"))
    });

    assert_eq!(calls, 1);
    let error = res.unwrap_err();
    let failure = error.unrecovered().unwrap();
    assert_eq!(failure.kind(), io::ErrorKind::TimedOut);
    assert_eq!(failure.to_string(), "first and only");
}

#[test]
fn exhausted_retries_aggregate_every_failure() {
    for retry_attempts in 0..5u32 {
        let mut calls = 0;
        let res = execute_function(
            &recovery(retry_attempts as i32, Duration::from_millis(0)),
            || -> Result<(), SnafuError> {
                calls += 1;
                Err(timeout(calls - 1))
            },
        );

        assert_eq!(calls, retry_attempts + 1);
        let aggregated = res.unwrap_err().into_aggregated().unwrap();
        assert_eq!(aggregated.len() as u32, retry_attempts + 2);
        assert_eq!(aggregated.diagnostic().unwrap().attempts(), retry_attempts);
        let order: Vec<&SnafuError> = aggregated.errors().collect();
        let expected: Vec<SnafuError> = (0..=retry_attempts).rev().map(timeout).collect();
        assert_eq!(order, expected.iter().collect::<Vec<_>>());
    }
}

#[test]
fn total_wait_sums_the_waits_performed() {
    let config = RecoveryConfig::builder()
        .enable_transient_fault_recovery(true)
        .retry_attempts(3)
        .recovery_wait_time_callback(|attempt: u32| Duration::from_millis(u64::from(attempt) + 1))
        .build()
        .unwrap();
    let res = execute_procedure(&config, || Err(timeout(0)));

    let aggregated = res.unwrap_err().into_aggregated().unwrap();
    let diagnostic = aggregated.diagnostic().unwrap();
    assert_eq!(diagnostic.total_recovery_wait_time(), Duration::from_millis(1 + 2 + 3));
    assert_eq!(diagnostic.recovery_wait_time(), Duration::from_millis(4));
}

#[test]
fn succeeds_after_transient_failures() {
    let retry_attempts = 4;
    for k in 0..=retry_attempts {
        let mut calls = 0;
        let res = execute_function(&recovery(retry_attempts as i32, Duration::from_millis(0)), || {
            calls += 1;
            if calls <= k {
                Err(timeout(calls - 1))
            } else {
                Ok("done")
            }
        });

        assert_eq!(res.unwrap(), "done");
        assert_eq!(calls, k + 1);
    }
}

#[test]
fn permanent_first_failure_is_not_retried() {
    let config = RecoveryConfig::builder()
        .enable_transient_fault_recovery(true)
        .retry_attempts(10)
        .recovery_wait_time_callback(RetryWithBackoff::fixed(Duration::from_secs(60)))
        .transient_fault_parser_callback(|_: &(dyn Error + 'static)| false)
        .build()
        .unwrap();
    let start = Instant::now();
    let mut calls = 0;
    let res = execute_procedure(&config, || {
        calls += 1;
        Err(timeout(0))
    });

    assert_eq!(calls, 1);
    assert!(start.elapsed() < Duration::from_secs(60));
    let aggregated = res.unwrap_err().into_aggregated().unwrap();
    assert_eq!(aggregated.len(), 1);
    assert!(matches!(aggregated.failures()[0], Failure::Operation { .. }));
}

#[test]
fn zero_backoff_retries_without_delay() {
    let start = Instant::now();
    let mut calls = 0;
    let res = execute_procedure(&recovery(50, Duration::from_millis(0)), || {
        calls += 1;
        Err(timeout(calls))
    });

    assert_eq!(calls, 51);
    assert!(start.elapsed() < Duration::from_secs(1));
    let aggregated = res.unwrap_err().into_aggregated().unwrap();
    assert_eq!(
        aggregated.diagnostic().unwrap().total_recovery_wait_time(),
        Duration::from_millis(0)
    );
}

#[test]
fn two_transient_failures_then_success() {
    let start = Instant::now();
    let mut calls = 0;
    let res = execute_function(&recovery(2, Duration::from_millis(10)), || {
        calls += 1;
        if calls < 3 {
            Err(timeout(calls - 1))
        } else {
            Ok(calls)
        }
    });

    assert_eq!(res.unwrap(), 3);
    assert_eq!(calls, 3);
    assert!(start.elapsed() >= Duration::from_millis(20));
}

#[test]
fn one_retry_then_give_up() {
    let mut calls = 0;
    let res = execute_procedure(&recovery(1, Duration::from_millis(10)), || {
        calls += 1;
        Err(timeout(calls - 1))
    });

    assert_eq!(calls, 2);
    let aggregated = res.unwrap_err().into_aggregated().unwrap();
    assert_eq!(aggregated.len(), 3);
    let failures = aggregated.failures();
    assert!(matches!(failures[0], Failure::RetriesExhausted { .. }));
    assert_eq!(failures[1].as_operation(), Some(&timeout(1)));
    assert_eq!(failures[2].as_operation(), Some(&timeout(0)));

    let metadata = aggregated.diagnostic().unwrap().metadata();
    assert_eq!(metadata[ATTEMPTS_KEY], "1");
    assert_eq!(metadata[RECOVERY_WAIT_TIME_KEY], "0.01");
    assert_eq!(metadata[TOTAL_RECOVERY_WAIT_TIME_KEY], "0.01");
}

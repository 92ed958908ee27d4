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
use crate::retry_result::RecoveryError;
use crate::retry_sync::{Next, RecoveryLoop};
use std::error::Error;
use std::future::Future;
use tokio::time::sleep;
use tracing::debug;

/// Runs the given operation asynchronously with transient fault recovery.
///
/// Same semantics as [`execute`](crate::retry_sync::execute), except that
/// waiting suspends the task on the tokio timer instead of blocking the thread.
/// It can be used as follows:
/// let config = RecoveryConfig::default();
/// let reply = execute_async(&config, || async { client.send(&request).await }).await?;
pub async fn execute_async<O, F, T, E>(config: &RecoveryConfig, mut operation: O) -> Result<T, RecoveryError<E>>
where
    O: FnMut() -> F,
    F: Future<Output = Result<T, E>>,
    E: Error + 'static,
{
    if !config.enable_transient_fault_recovery() {
        return operation()
            .await
            .map_err(|source| RecoveryError::Unrecovered { source });
    }

    let mut recovery = RecoveryLoop::new(config);
    loop {
        recovery.begin_attempt();
        let result: Result<T, E> = operation().await;

        match result {
            Ok(value) => {
                if recovery.attempt() > 0 {
                    debug!("succeeded after {} retries", recovery.attempt());
                }
                return Ok(value);
            }
            Err(failure) => match recovery.on_failure(failure) {
                Next::Wait(delay) => sleep(delay).await,
                Next::GiveUp(error) => return Err(error),
            },
        }
    }
}

//
// Copyright (c) Dell Inc., or its subsidiaries. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//

//! Transient fault recovery: runs fallible work until it succeeds, its retries
//! run out, or it fails with a fault that is not worth retrying.
//! It can be used as follows:
//! ```
//! # use fault_recovery::config::RecoveryConfig;
//! # use fault_recovery::retry_policy::RetryWithBackoff;
//! # use fault_recovery::retry_sync::execute_function;
//! # use std::io;
//! # use std::time::Duration;
//! let config = RecoveryConfig::builder()
//!     .enable_transient_fault_recovery(true)
//!     .retry_attempts(3)
//!     .recovery_wait_time_callback(RetryWithBackoff::fixed(Duration::from_millis(1)))
//!     .build()
//!     .unwrap();
//! let mut replies = vec![Err(io::Error::from(io::ErrorKind::TimedOut)), Ok(42)].into_iter();
//! let value = execute_function(&config, || replies.next().unwrap()).unwrap();
//!
//! assert_eq!(value, 42);
//! ```
//! The timeout is transient, so the function is retried once after waiting 1ms.
//! A failure the transient fault parser rejects, such as `PermissionDenied`,
//! returns immediately. If all retries fail, the error carries every failure,
//! most recent first, behind a diagnostic of the attempts and waits.
//!

#![deny(
    clippy::all,
    clippy::cargo,
    clippy::else_if_without_else,
    clippy::empty_line_after_outer_attr,
    clippy::multiple_inherent_impl,
    clippy::mut_mut,
    clippy::path_buf_push_overwrite
)]
#![warn(
    clippy::cargo_common_metadata,
    clippy::mutex_integer,
    clippy::needless_borrow,
    clippy::unwrap_used,
    clippy::similar_names
)]
#![allow(clippy::multiple_crate_versions)]

pub mod config;
pub mod failure_log;
pub mod fault_parser;
pub mod retry_async;
pub mod retry_policy;
pub mod retry_result;
pub mod retry_sync;
pub mod work_item;
#[cfg(test)]
mod test;

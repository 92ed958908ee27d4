//
// Copyright (c) Dell Inc., or its subsidiaries. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//

use crate::retry_result::{AggregatedFailure, Failure, TransientFaultDiagnostic};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::error::Error;
use std::sync::Arc;

/// The failure log of a single engine invocation.
///
/// Entries are kept most recent first. Clones share the same log, so work that
/// fails on a background thread can hand a clone to that thread and record
/// into it while the engine records the foreground failures.
#[derive(Debug)]
pub struct FailureLog<E>
where
    E: Error + 'static,
{
    entries: Arc<Mutex<VecDeque<Failure<E>>>>,
}

impl<E> FailureLog<E>
where
    E: Error + 'static,
{
    pub(crate) fn new() -> Self {
        FailureLog {
            entries: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Prepends a failure raised by the work.
    pub fn record(&self, error: E) {
        self.entries.lock().push_front(Failure::Operation { source: error });
    }

    pub(crate) fn record_diagnostic(&self, diagnostic: TransientFaultDiagnostic) {
        self.entries
            .lock()
            .push_front(Failure::RetriesExhausted { diagnostic });
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Moves every entry out of the log.
    pub(crate) fn take_aggregated(&self) -> AggregatedFailure<E> {
        let failures = self.entries.lock().drain(..).collect();
        AggregatedFailure::new(failures)
    }
}

impl<E> Clone for FailureLog<E>
where
    E: Error + 'static,
{
    fn clone(&self) -> Self {
        FailureLog {
            entries: self.entries.clone(),
        }
    }
}

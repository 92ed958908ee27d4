//
// Copyright (c) Dell Inc., or its subsidiaries. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//

//! The shapes of work the engine can run.
//!
//! Arguments are captured by the closures, so a single wrapper per shape covers
//! every arity.

use crate::failure_log::FailureLog;
use derive_new::new;
use std::error::Error;
use std::marker::PhantomData;
use tracing::debug;

/// A unit of work the engine runs once per attempt.
pub trait WorkItem {
    type Output;
    type Error: Error + 'static;

    /// Runs a single attempt.
    ///
    /// `log` is the failure log of the current invocation. Work that fails on a
    /// background thread can record those failures into a clone of it.
    fn run_once(&mut self, log: &FailureLog<Self::Error>) -> Result<Self::Output, Self::Error>;

    /// Releases anything a failed attempt left behind. Called after every failed
    /// attempt, before the engine waits or propagates the failure.
    fn release_partial_result(&mut self) {}
}

/// Work with no result.
#[derive(new)]
pub struct Procedure<F> {
    procedure: F,
}

impl<F, E> WorkItem for Procedure<F>
where
    F: FnMut() -> Result<(), E>,
    E: Error + 'static,
{
    type Output = ();
    type Error = E;

    fn run_once(&mut self, _log: &FailureLog<E>) -> Result<(), E> {
        (self.procedure)()
    }
}

/// Work returning a single result.
#[derive(new)]
pub struct Function<F> {
    function: F,
}

impl<F, T, E> WorkItem for Function<F>
where
    F: FnMut() -> Result<T, E>,
    E: Error + 'static,
{
    type Output = T;
    type Error = E;

    fn run_once(&mut self, _log: &FailureLog<E>) -> Result<T, E> {
        (self.function)()
    }
}

/// Work reporting a success flag, with its result written to an out slot.
///
/// A value left in the slot by a failed attempt is dropped before the next
/// attempt or before the failure propagates, so partially built results are
/// never carried across attempts.
#[derive(new)]
pub struct Tester<F, T> {
    tester: F,
    #[new(default)]
    result: Option<T>,
}

impl<F, T, E> WorkItem for Tester<F, T>
where
    F: FnMut(&mut Option<T>) -> Result<bool, E>,
    E: Error + 'static,
{
    type Output = (bool, Option<T>);
    type Error = E;

    fn run_once(&mut self, _log: &FailureLog<E>) -> Result<(bool, Option<T>), E> {
        let succeeded = (self.tester)(&mut self.result)?;
        Ok((succeeded, self.result.take()))
    }

    fn release_partial_result(&mut self) {
        if self.result.take().is_some() {
            debug!("released partial result of failed attempt");
        }
    }
}

/// Work that receives the invocation's failure log.
#[derive(new)]
pub struct Observed<F, E> {
    work: F,
    #[new(default)]
    _error: PhantomData<fn() -> E>,
}

impl<F, T, E> WorkItem for Observed<F, E>
where
    F: FnMut(&FailureLog<E>) -> Result<T, E>,
    E: Error + 'static,
{
    type Output = T;
    type Error = E;

    fn run_once(&mut self, log: &FailureLog<E>) -> Result<T, E> {
        (self.work)(log)
    }
}

//
// Copyright (c) Dell Inc., or its subsidiaries. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//

//! Classification of failures into transient and permanent faults.

use std::error::Error;
use std::io;

/// An error that knows whether the operation that produced it is worth retrying.
pub trait Retryable {
    fn can_retry(&self) -> bool;
}

/// The `io::ErrorKind`s the default parser treats as transient: timeouts,
/// dropped or refused connections and interrupted calls.
pub const TRANSIENT_IO_ERROR_KINDS: [io::ErrorKind; 9] = [
    io::ErrorKind::TimedOut,
    io::ErrorKind::ConnectionReset,
    io::ErrorKind::ConnectionAborted,
    io::ErrorKind::ConnectionRefused,
    io::ErrorKind::NotConnected,
    io::ErrorKind::BrokenPipe,
    io::ErrorKind::Interrupted,
    io::ErrorKind::WouldBlock,
    io::ErrorKind::AddrNotAvailable,
];

pub fn is_transient_io_error(error: &io::Error) -> bool {
    TRANSIENT_IO_ERROR_KINDS.contains(&error.kind())
}

/// The default transient fault parser.
///
/// Walks the source chain of `error`; the first `io::Error` found decides
/// using [`TRANSIENT_IO_ERROR_KINDS`]. A failure with no `io::Error` anywhere
/// in its chain is considered transient.
pub fn default_transient_fault_parser(error: &(dyn Error + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(e) = current {
        if let Some(io_error) = e.downcast_ref::<io::Error>() {
            return is_transient_io_error(io_error);
        }
        current = e.source();
    }
    true
}

/// Parser for failures of type `E`, deferring to [`Retryable::can_retry`].
///
/// Failures of any other type fall back to [`default_transient_fault_parser`].
pub fn retryable_fault_parser<E>(error: &(dyn Error + 'static)) -> bool
where
    E: Retryable + Error + 'static,
{
    match error.downcast_ref::<E>() {
        Some(e) => e.can_retry(),
        None => default_transient_fault_parser(error),
    }
}

/*
 *   Copyright (c) 2024 R3BL LLC
 *   All rights reserved.
 *
 *   Licensed under the Apache License, Version 2.0 (the "License");
 *   you may not use this file except in compliance with the License.
 *   You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 *   Unless required by applicable law or agreed to in writing, software
 *   distributed under the License is distributed on an "AS IS" BASIS,
 *   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *   See the License for the specific language governing permissions and
 *   limitations under the License.
 */

//! Two error types live here:
//!
//! - [`SyscallResult`] carries a *retriable-or-not* classification of a raw
//!   syscall return value. It never allocates and never escapes a
//!   would-block error out of [`crate::net`].
//! - [`EvioError`]/[`Result`] is the ordinary Rust error type for anything
//!   that isn't a per-syscall outcome: resource setup failures (bind,
//!   listen, epoll_create, timerfd_create), protocol errors surfaced by a
//!   collaborator, and terminal I/O errors a caller asked to see.

use std::fmt;

/// Crate-wide error type. Setup failures carry a context label, e.g.
/// `("bind", ...)` or `("listen", ...)`.
#[derive(Debug, thiserror::Error)]
pub enum EvioError {
    #[error("{context}: {source}")]
    ResourceSetup {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl EvioError {
    pub fn setup(context: &'static str, source: std::io::Error) -> Self {
        EvioError::ResourceSetup { context, source }
    }
}

/// Crate-wide [`std::result::Result`] alias.
pub type Result<T> = std::result::Result<T, EvioError>;

/// Outcome of a single syscall: either the value it returned, or the
/// `errno` left behind.
///
/// The only policy the I/O path depends on is [`SyscallResult::is_retriable`]:
/// would-block, try-again, interrupted, and in-progress are folded back into
/// the *try-then-wait* loop in [`crate::net::AsyncFile`]; everything else is
/// handed back to the caller.
#[derive(Debug, Clone, Copy)]
pub enum SyscallResult<T> {
    Value(T),
    Errno(i32),
}

impl<T> SyscallResult<T> {
    /// Builds a [`SyscallResult`] from a raw syscall return value using the
    /// common POSIX convention: negative means failure, consult `errno`.
    /// `to_value` turns the non-negative return code into `T` (e.g. `as
    /// usize` for a byte count, or discard it for a unit-returning call).
    pub fn from_retval(rc: libc::c_long, to_value: impl FnOnce(libc::c_long) -> T) -> Self {
        if rc < 0 {
            SyscallResult::Errno(unsafe { *libc::__errno_location() })
        } else {
            SyscallResult::Value(to_value(rc))
        }
    }

    pub fn is_retriable(&self) -> bool {
        match self {
            SyscallResult::Errno(errno) => matches!(
                *errno,
                libc::EAGAIN | libc::EWOULDBLOCK | libc::EINTR | libc::EINPROGRESS
            ),
            SyscallResult::Value(_) => false,
        }
    }

    pub fn is_err(&self) -> bool {
        matches!(self, SyscallResult::Errno(_))
    }

    /// Value, or an [`EvioError::ResourceSetup`] tagged with `label`.
    pub fn unwrap_or_raise(self, label: &'static str) -> Result<T> {
        match self {
            SyscallResult::Value(v) => Ok(v),
            SyscallResult::Errno(errno) => Err(EvioError::setup(
                label,
                std::io::Error::from_raw_os_error(errno),
            )),
        }
    }

    /// Converts into `std::io::Result<T>`, the shape terminal errors take
    /// once they cross the [`crate::net::AsyncFile`] boundary.
    pub fn into_io_result(self) -> std::io::Result<T> {
        match self {
            SyscallResult::Value(v) => Ok(v),
            SyscallResult::Errno(errno) => Err(std::io::Error::from_raw_os_error(errno)),
        }
    }

    pub fn message(&self) -> String
    where
        T: fmt::Debug,
    {
        match self {
            SyscallResult::Value(v) => format!("{v:?}"),
            SyscallResult::Errno(errno) => std::io::Error::from_raw_os_error(*errno).to_string(),
        }
    }
}

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

//! An in-process connected pair of [`AsyncFile`]s, for exercising
//! read/write/readiness-waiting without binding a real TCP listener (and
//! without the port-already-in-use flakiness that comes with one).

use evio_core::{AsyncFile, Handle};

use crate::error::TestSupportError;

/// Creates a connected `AF_UNIX`/`SOCK_STREAM` pair via `socketpair(2)`,
/// both ends non-blocking and registered with `handle`'s loop. Bytes
/// written to one end show up for reading on the other, same as a real
/// loopback TCP connection, at a fraction of the setup cost.
pub fn loopback_pair(handle: Handle) -> Result<(AsyncFile, AsyncFile), TestSupportError> {
    let mut fds = [0 as libc::c_int; 2];
    let rc = unsafe {
        libc::socketpair(
            libc::AF_UNIX,
            libc::SOCK_STREAM | libc::SOCK_NONBLOCK | libc::SOCK_CLOEXEC,
            0,
            fds.as_mut_ptr(),
        )
    };
    if rc < 0 {
        return Err(TestSupportError::SocketPair(std::io::Error::last_os_error()));
    }
    let a = AsyncFile::adopt(handle.clone(), fds[0]);
    let b = AsyncFile::adopt(handle, fds[1]);
    Ok((a, b))
}

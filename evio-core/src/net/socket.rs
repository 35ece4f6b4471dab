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

//! Thin, free-function wrappers over the handful of raw socket syscalls
//! [`super::AsyncFile`] needs. Every one of these creates the fd
//! non-blocking and close-on-exec up front; nothing in this crate ever
//! makes a blocking syscall on a socket fd.

use std::net::SocketAddr;
use std::os::unix::io::RawFd;

use crate::error::{EvioError, Result};
use crate::net::address::{self, RawSockAddr};

pub fn new_stream_socket(domain: libc::c_int) -> Result<RawFd> {
    let fd = unsafe { libc::socket(domain, libc::SOCK_STREAM | libc::SOCK_NONBLOCK | libc::SOCK_CLOEXEC, 0) };
    if fd < 0 {
        return Err(EvioError::setup("socket", std::io::Error::last_os_error()));
    }
    Ok(fd)
}

pub fn set_reuseaddr(fd: RawFd) -> Result<()> {
    let one: libc::c_int = 1;
    let rc = unsafe {
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_REUSEADDR,
            &one as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };
    if rc < 0 {
        return Err(EvioError::setup("setsockopt(SO_REUSEADDR)", std::io::Error::last_os_error()));
    }
    Ok(())
}

/// Lets multiple listening sockets bind the same address and port, with
/// the kernel load-balancing accepted connections across them. Linux-only
/// (`SO_REUSEPORT` landed in 3.9); callers on other platforms should not
/// wire this in.
pub fn set_reuseport(fd: RawFd) -> Result<()> {
    let one: libc::c_int = 1;
    let rc = unsafe {
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_REUSEPORT,
            &one as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };
    if rc < 0 {
        return Err(EvioError::setup("setsockopt(SO_REUSEPORT)", std::io::Error::last_os_error()));
    }
    Ok(())
}

pub fn bind(fd: RawFd, addr: SocketAddr) -> Result<()> {
    let raw = address::to_raw(addr);
    let rc = unsafe { libc::bind(fd, raw.as_ptr(), raw.len) };
    if rc < 0 {
        return Err(EvioError::setup("bind", std::io::Error::last_os_error()));
    }
    Ok(())
}

pub fn listen(fd: RawFd, backlog: i32) -> Result<()> {
    let rc = unsafe { libc::listen(fd, backlog) };
    if rc < 0 {
        return Err(EvioError::setup("listen", std::io::Error::last_os_error()));
    }
    Ok(())
}

pub fn local_addr(fd: RawFd) -> Result<SocketAddr> {
    let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
    let mut len = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;
    let rc = unsafe { libc::getsockname(fd, &mut storage as *mut _ as *mut libc::sockaddr, &mut len) };
    if rc < 0 {
        return Err(EvioError::setup("getsockname", std::io::Error::last_os_error()));
    }
    Ok(unsafe { address::from_raw(&storage) })
}

/// `connect(2)` on a non-blocking socket always returns immediately: either
/// it succeeds synchronously (loopback is common), or it sets `EINPROGRESS`
/// and the caller waits for write-readiness before checking `SO_ERROR`.
pub fn start_connect(fd: RawFd, addr: SocketAddr) -> libc::c_int {
    let raw: RawSockAddr = address::to_raw(addr);
    let rc = unsafe { libc::connect(fd, raw.as_ptr(), raw.len) };
    if rc == 0 {
        0
    } else {
        unsafe { *libc::__errno_location() }
    }
}

pub fn take_socket_error(fd: RawFd) -> Result<()> {
    let mut err: libc::c_int = 0;
    let mut len = std::mem::size_of::<libc::c_int>() as libc::socklen_t;
    let rc = unsafe {
        libc::getsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_ERROR,
            &mut err as *mut _ as *mut libc::c_void,
            &mut len,
        )
    };
    if rc < 0 {
        return Err(EvioError::setup("getsockopt(SO_ERROR)", std::io::Error::last_os_error()));
    }
    if err != 0 {
        return Err(EvioError::setup("connect", std::io::Error::from_raw_os_error(err)));
    }
    Ok(())
}

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

//! [`AsyncFile`] wraps one non-blocking fd and turns the *try, and if it
//! would block, wait for readiness, then try again* loop every socket
//! syscall needs into a plain `.await`.

use std::mem::MaybeUninit;
use std::net::SocketAddr;
use std::os::unix::io::RawFd;

use crate::error::{Result, SyscallResult};
use crate::net::address;
use crate::net::socket;
use crate::reactor::Handle;

/// A non-blocking fd registered with an event loop's poller.
pub struct AsyncFile {
    handle: Handle,
    fd: RawFd,
}

impl AsyncFile {
    fn from_raw(handle: Handle, fd: RawFd) -> Self {
        handle.register(fd);
        Self { handle, fd }
    }

    /// Takes ownership of an already-open, already-non-blocking fd (for
    /// example one created outside this crate) and starts tracking it on
    /// `handle`'s loop.
    pub fn adopt(handle: Handle, fd: RawFd) -> Self {
        Self::from_raw(handle, fd)
    }

    pub fn raw_fd(&self) -> RawFd {
        self.fd
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        socket::local_addr(self.fd)
    }

    /// Creates a non-blocking listening socket bound to `addr`.
    pub fn bind(handle: Handle, addr: SocketAddr, backlog: i32) -> Result<Self> {
        let fd = socket::new_stream_socket(address::domain_for(&addr))?;
        let setup = socket::set_reuseaddr(fd)
            .and_then(|_| socket::set_reuseport(fd))
            .and_then(|_| socket::bind(fd, addr))
            .and_then(|_| socket::listen(fd, backlog));
        if let Err(err) = setup {
            unsafe { libc::close(fd) };
            return Err(err);
        }
        Ok(Self::from_raw(handle, fd))
    }

    /// Connects to `addr`, suspending until the connection completes (or
    /// fails).
    pub async fn connect(handle: Handle, addr: SocketAddr) -> Result<Self> {
        let fd = socket::new_stream_socket(address::domain_for(&addr))?;
        let errno = socket::start_connect(fd, addr);
        if errno != 0 && errno != libc::EINPROGRESS {
            unsafe { libc::close(fd) };
            return Err(crate::error::EvioError::setup("connect", std::io::Error::from_raw_os_error(errno)));
        }
        let file = Self::from_raw(handle, fd);
        if errno == libc::EINPROGRESS {
            file.handle.wait_writable(file.fd).await;
            if let Err(err) = socket::take_socket_error(file.fd) {
                return Err(err);
            }
        }
        Ok(file)
    }

    /// Accepts one connection, suspending until one is pending.
    pub async fn accept(&self) -> Result<(Self, SocketAddr)> {
        loop {
            let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
            let mut len = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;
            let rc = unsafe {
                libc::accept4(
                    self.fd,
                    &mut storage as *mut _ as *mut libc::sockaddr,
                    &mut len,
                    libc::SOCK_NONBLOCK | libc::SOCK_CLOEXEC,
                )
            };
            let outcome = SyscallResult::from_retval(rc as libc::c_long, |rc| rc as RawFd);
            match outcome {
                SyscallResult::Value(peer_fd) => {
                    let peer_addr = unsafe { address::from_raw(&storage) };
                    return Ok((Self::from_raw(self.handle.clone(), peer_fd), peer_addr));
                }
                SyscallResult::Errno(errno) if outcome.is_retriable() => {
                    let _ = errno;
                    self.handle.wait_readable(self.fd).await;
                }
                SyscallResult::Errno(errno) => {
                    return Err(crate::error::EvioError::setup("accept4", std::io::Error::from_raw_os_error(errno)));
                }
            }
        }
    }

    /// Reads at least one byte into `buf`, or `0` at end-of-file.
    /// Suspends (possibly more than once) while the fd isn't readable.
    pub async fn read(&self, buf: &mut [u8]) -> Result<usize> {
        // SAFETY: `u8` and `MaybeUninit<u8>` share layout, and treating an
        // already-initialized `&mut [u8]` as `&mut [MaybeUninit<u8>]` is
        // always sound -- we're only ever narrowing what the type claims
        // about memory that's already valid.
        let uninit = unsafe { std::slice::from_raw_parts_mut(buf.as_mut_ptr() as *mut MaybeUninit<u8>, buf.len()) };
        self.read_uninit(uninit).await
    }

    /// Reads at least one byte into `buf`, or `0` at end-of-file, writing
    /// through `buf` without requiring it to be pre-initialized. Suspends
    /// (possibly more than once) while the fd isn't readable.
    pub async fn read_uninit(&self, buf: &mut [MaybeUninit<u8>]) -> Result<usize> {
        loop {
            let rc = unsafe { libc::read(self.fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) };
            let outcome = SyscallResult::from_retval(rc as libc::c_long, |rc| rc as usize);
            match outcome {
                SyscallResult::Value(n) => return Ok(n),
                SyscallResult::Errno(_) if outcome.is_retriable() => {
                    self.handle.wait_readable(self.fd).await;
                }
                SyscallResult::Errno(errno) => {
                    return Err(std::io::Error::from_raw_os_error(errno).into());
                }
            }
        }
    }

    /// Writes at least one byte from `buf`. Suspends while the fd isn't
    /// writable.
    pub async fn write(&self, buf: &[u8]) -> Result<usize> {
        loop {
            let rc = unsafe { libc::write(self.fd, buf.as_ptr() as *const libc::c_void, buf.len()) };
            let outcome = SyscallResult::from_retval(rc as libc::c_long, |rc| rc as usize);
            match outcome {
                SyscallResult::Value(n) => return Ok(n),
                SyscallResult::Errno(_) if outcome.is_retriable() => {
                    self.handle.wait_writable(self.fd).await;
                }
                SyscallResult::Errno(errno) => {
                    return Err(std::io::Error::from_raw_os_error(errno).into());
                }
            }
        }
    }

    /// Writes the whole buffer, looping over short writes.
    pub async fn write_all(&self, mut buf: &[u8]) -> Result<()> {
        while !buf.is_empty() {
            let n = self.write(buf).await?;
            buf = &buf[n..];
        }
        Ok(())
    }
}

impl Drop for AsyncFile {
    fn drop(&mut self) {
        self.handle.unregister(self.fd);
        unsafe {
            libc::close(self.fd);
        }
    }
}

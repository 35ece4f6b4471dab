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

//! Conversions between `std::net::SocketAddr` and the raw `sockaddr_*`
//! structs the socket syscalls need. No `socket2` dependency -- this
//! crate talks to the kernel directly everywhere else, so it does here
//! too.

use std::ffi::CString;
use std::mem;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};

use crate::error::{EvioError, Result};

/// A raw sockaddr big enough for either family, plus the length a syscall
/// taking `*mut sockaddr` should be told about it.
pub struct RawSockAddr {
    pub storage: libc::sockaddr_storage,
    pub len: libc::socklen_t,
}

impl RawSockAddr {
    pub fn as_ptr(&self) -> *const libc::sockaddr {
        &self.storage as *const _ as *const libc::sockaddr
    }

    pub fn as_mut_ptr(&mut self) -> *mut libc::sockaddr {
        &mut self.storage as *mut _ as *mut libc::sockaddr
    }
}

pub fn to_raw(addr: SocketAddr) -> RawSockAddr {
    let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
    let len = match addr {
        SocketAddr::V4(v4) => {
            let sin = sockaddr_in_from(v4);
            unsafe {
                std::ptr::write(&mut storage as *mut _ as *mut libc::sockaddr_in, sin);
            }
            mem::size_of::<libc::sockaddr_in>() as libc::socklen_t
        }
        SocketAddr::V6(v6) => {
            let sin6 = sockaddr_in6_from(v6);
            unsafe {
                std::ptr::write(&mut storage as *mut _ as *mut libc::sockaddr_in6, sin6);
            }
            mem::size_of::<libc::sockaddr_in6>() as libc::socklen_t
        }
    };
    RawSockAddr { storage, len }
}

fn sockaddr_in_from(addr: SocketAddrV4) -> libc::sockaddr_in {
    libc::sockaddr_in {
        sin_family: libc::AF_INET as libc::sa_family_t,
        sin_port: addr.port().to_be(),
        sin_addr: libc::in_addr {
            s_addr: u32::from_ne_bytes(addr.ip().octets()),
        },
        sin_zero: [0; 8],
    }
}

fn sockaddr_in6_from(addr: SocketAddrV6) -> libc::sockaddr_in6 {
    libc::sockaddr_in6 {
        sin6_family: libc::AF_INET6 as libc::sa_family_t,
        sin6_port: addr.port().to_be(),
        sin6_flowinfo: addr.flowinfo(),
        sin6_addr: libc::in6_addr {
            s6_addr: addr.ip().octets(),
        },
        sin6_scope_id: addr.scope_id(),
    }
}

/// Converts a populated `sockaddr_storage` back to a `SocketAddr`. Used
/// after `accept`/`getsockname`/`getpeername`.
///
/// # Safety
/// `storage` must have been filled in by the kernel for a family the
/// socket actually uses (`AF_INET` or `AF_INET6`).
pub unsafe fn from_raw(storage: &libc::sockaddr_storage) -> SocketAddr {
    match storage.ss_family as i32 {
        libc::AF_INET => {
            let sin = &*(storage as *const _ as *const libc::sockaddr_in);
            let ip = Ipv4Addr::from(u32::from_ne_bytes(sin.sin_addr.s_addr.to_ne_bytes()));
            SocketAddr::V4(SocketAddrV4::new(ip, u16::from_be(sin.sin_port)))
        }
        libc::AF_INET6 => {
            let sin6 = &*(storage as *const _ as *const libc::sockaddr_in6);
            let ip = Ipv6Addr::from(sin6.sin6_addr.s6_addr);
            SocketAddr::V6(SocketAddrV6::new(
                ip,
                u16::from_be(sin6.sin6_port),
                sin6.sin6_flowinfo,
                sin6.sin6_scope_id,
            ))
        }
        other => panic!("unsupported address family in sockaddr_storage: {other}"),
    }
}

pub fn domain_for(addr: &SocketAddr) -> libc::c_int {
    match addr.ip() {
        IpAddr::V4(_) => libc::AF_INET,
        IpAddr::V6(_) => libc::AF_INET6,
    }
}

/// Resolves `host`:`port` into every candidate stream-socket address the
/// system resolver offers, in the order `getaddrinfo(3)` returns them --
/// typically address-family preference order (`/etc/gai.conf` on glibc),
/// not a guarantee of reachability. Callers that want "the first address
/// that actually connects" should try them in order and fall through on
/// failure, the way a DNS-backed client normally does.
pub fn resolve(host: &str, port: u16) -> Result<Vec<SocketAddr>> {
    let host_c = CString::new(host)
        .map_err(|_| EvioError::setup("getaddrinfo", std::io::Error::from(std::io::ErrorKind::InvalidInput)))?;
    let port_c = CString::new(port.to_string()).expect("a port number never contains a nul byte");

    let mut hints: libc::addrinfo = unsafe { mem::zeroed() };
    hints.ai_socktype = libc::SOCK_STREAM;
    hints.ai_protocol = libc::IPPROTO_TCP;

    let mut result: *mut libc::addrinfo = std::ptr::null_mut();
    let rc = unsafe { libc::getaddrinfo(host_c.as_ptr(), port_c.as_ptr(), &hints, &mut result) };
    if rc != 0 {
        return Err(EvioError::setup(
            "getaddrinfo",
            std::io::Error::new(std::io::ErrorKind::Other, gai_strerror(rc)),
        ));
    }

    let mut addrs = Vec::new();
    let mut cur = result;
    while !cur.is_null() {
        let info = unsafe { &*cur };
        if let Some(addr) = unsafe { socket_addr_from_addrinfo(info) } {
            addrs.push(addr);
        }
        cur = info.ai_next;
    }
    unsafe { libc::freeaddrinfo(result) };
    Ok(addrs)
}

fn gai_strerror(rc: libc::c_int) -> String {
    unsafe {
        let msg = libc::gai_strerror(rc);
        std::ffi::CStr::from_ptr(msg).to_string_lossy().into_owned()
    }
}

/// # Safety
/// `info.ai_addr` must be non-null and point to a `sockaddr_in` or
/// `sockaddr_in6` matching `info.ai_family`, as `getaddrinfo` guarantees
/// for every node in the list it returns.
unsafe fn socket_addr_from_addrinfo(info: &libc::addrinfo) -> Option<SocketAddr> {
    match info.ai_family {
        libc::AF_INET => {
            let sin = &*(info.ai_addr as *const libc::sockaddr_in);
            let ip = Ipv4Addr::from(u32::from_ne_bytes(sin.sin_addr.s_addr.to_ne_bytes()));
            Some(SocketAddr::V4(SocketAddrV4::new(ip, u16::from_be(sin.sin_port))))
        }
        libc::AF_INET6 => {
            let sin6 = &*(info.ai_addr as *const libc::sockaddr_in6);
            let ip = Ipv6Addr::from(sin6.sin6_addr.s6_addr);
            Some(SocketAddr::V6(SocketAddrV6::new(
                ip,
                u16::from_be(sin6.sin6_port),
                sin6.sin6_flowinfo,
                sin6.sin6_scope_id,
            )))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_loopback_literal_needs_no_dns() {
        let addrs = resolve("127.0.0.1", 8080).expect("loopback literal should always resolve");
        assert!(!addrs.is_empty());
        assert!(addrs.iter().all(|a| a.ip() == IpAddr::V4(Ipv4Addr::LOCALHOST) && a.port() == 8080));
    }

    #[test]
    fn resolve_rejects_a_host_with_an_embedded_nul() {
        assert!(resolve("bad\0host", 80).is_err());
    }
}

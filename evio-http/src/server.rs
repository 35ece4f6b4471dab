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

//! A connection-per-task server loop: one [`Handle::accept`]-driven task
//! accepts, and spawns one more task per connection that reads, parses,
//! dispatches through a [`Router`], and writes back -- the same
//! fire-and-forget-per-connection shape as the source's `HttpWorker::accept`
//! / `HttpConnection::handle`, minus its multi-threaded worker pool (this
//! crate's event loop, like the rest of `evio_core`, is single-threaded).

use std::rc::Rc;
use std::time::Duration;

use evio_core::{wait_any2, AsyncFile, ByteBuffer, Either2, EventLoop, Handle};

use crate::error::Result;
use crate::parser;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

const INITIAL_BUFFER_CAPACITY: usize = 4096;
const READ_CHUNK: usize = 4096;

/// Tuning knobs for [`serve`]. `max_body_len` bounds request bodies this
/// server will parse; `read_timeout` (if set) races every read against a
/// sleep, closing idle connections instead of holding their fd open
/// forever -- the Rust realization of `HttpServer::with_timeout`'s
/// `time_out_sec_` in the source this crate demonstrates.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub max_body_len: usize,
    pub read_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_body_len: 1024 * 1024,
            read_timeout: None,
        }
    }
}

/// Binds `listener` and runs the accept loop until [`Handle::stop`] is
/// called on `event_loop`'s handle. Blocks the calling thread (via
/// [`EventLoop::run`]); call this last.
pub fn serve(event_loop: &EventLoop, listener: AsyncFile, router: Router, config: ServerConfig) {
    let handle = event_loop.handle();
    let router = Rc::new(router);
    let config = Rc::new(config);
    event_loop.run(evio_core::Task::new(accept_loop(handle, listener, router, config)));
}

async fn accept_loop(handle: Handle, listener: AsyncFile, router: Rc<Router>, config: Rc<ServerConfig>) {
    loop {
        match listener.accept().await {
            Ok((conn, _peer_addr)) => {
                let router = router.clone();
                let config = config.clone();
                handle.spawn(handle_connection(handle.clone(), conn, router, config));
            }
            Err(err) => {
                tracing::warn!(error = %err, "accept failed, continuing to serve existing connections");
            }
        }
    }
}

async fn handle_connection(handle: Handle, conn: AsyncFile, router: Rc<Router>, config: Rc<ServerConfig>) {
    let mut buf = ByteBuffer::with_capacity(INITIAL_BUFFER_CAPACITY);
    loop {
        match read_one_request(&handle, &conn, &mut buf, &config).await {
            Ok(Some(req)) => {
                let keep_alive = req.keep_alive();
                let response = router.dispatch(&req);
                if write_response(&conn, &response).await.is_err() || !keep_alive {
                    return;
                }
            }
            Ok(None) => return, // peer closed, or the read timed out
            Err(err) => {
                tracing::debug!(error = %err, "closing connection after a request error");
                let _ = write_response(&conn, &Response::new(400)).await;
                return;
            }
        }
    }
}

/// Reads and parses requests off `conn` into `buf` until one full request
/// is available, `buf` already held one (pipelined requests), or the
/// connection is closed/timed out.
async fn read_one_request(
    handle: &Handle,
    conn: &AsyncFile,
    buf: &mut ByteBuffer,
    config: &ServerConfig,
) -> Result<Option<Request>> {
    loop {
        if let Some(parsed) = parser::parse(buf.as_slice(), config.max_body_len)? {
            buf.consume(parsed.consumed);
            return Ok(Some(parsed.request));
        }

        // `spare_capacity_mut` grows `buf` by the full chunk up front, so
        // the tail start has to be captured before it (and before the read
        // future below borrows `buf` mutably for the rest of this block).
        let reserved_start = buf.len();
        let tail = buf.spare_capacity_mut(READ_CHUNK);
        let read_fut = conn.read_uninit(tail);
        let n = match config.read_timeout {
            None => read_fut.await.map_err(crate::error::HttpError::Runtime)?,
            Some(timeout) => match wait_any2(read_fut, handle.sleep(timeout)).await {
                Either2::First(result) => result.map_err(crate::error::HttpError::Runtime)?,
                Either2::Second(()) => {
                    buf.set_len_after_write(0, reserved_start);
                    return Ok(None);
                }
            },
        };
        buf.set_len_after_write(n, reserved_start);
        if n == 0 {
            return Ok(None);
        }
    }
}

async fn write_response(conn: &AsyncFile, response: &Response) -> std::result::Result<(), evio_core::EvioError> {
    let mut out = ByteBuffer::new();
    response.serialize(&mut out);
    conn.write_all(out.as_slice()).await
}

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

//! A small HTTP/1.1 server built on `evio_core`, demonstrating its
//! [`evio_core::AsyncFile`], [`evio_core::wait_any2`] timeout idiom, and
//! [`evio_core::AdaptiveRadixTree`]-backed routing end to end.

mod error;
mod parser;
mod request;
mod response;
mod router;
mod server;

pub use error::{HttpError, Result};
pub use parser::{parse, Parsed};
pub use request::{Method, Request, Version};
pub use response::{status_phrase, Response};
pub use router::Router;
pub use server::{serve, ServerConfig};

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

/// Everything that can go wrong turning a connection's bytes into a
/// dispatched response.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("malformed request line")]
    InvalidRequestLine,

    #[error("malformed header line")]
    InvalidHeader,

    #[error("unsupported HTTP version")]
    UnsupportedVersion,

    #[error("Content-Length header is not a valid integer")]
    InvalidContentLength,

    #[error("request body exceeds the {0}-byte connection limit")]
    BodyTooLarge(usize),

    #[error(transparent)]
    Runtime(#[from] evio_core::EvioError),
}

pub type Result<T> = std::result::Result<T, HttpError>;

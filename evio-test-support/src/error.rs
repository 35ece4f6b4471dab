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

/// Errors raised by this crate's own fixture setup (distinct from
/// [`evio_core::EvioError`], which this crate's fixtures otherwise just
/// propagate via `?`).
#[derive(Debug, thiserror::Error)]
pub enum TestSupportError {
    #[error("socketpair(2) failed: {0}")]
    SocketPair(std::io::Error),

    #[error(transparent)]
    Runtime(#[from] evio_core::EvioError),
}

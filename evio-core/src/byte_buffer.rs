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

//! A small growable byte buffer for protocol-parser collaborators: append
//! bytes that arrived off the wire, hand a parser a slice view, then
//! [`ByteBuffer::consume`] whatever prefix the parser ate.

use std::mem::MaybeUninit;

/// Contiguous, append-only byte storage with a consumable front.
#[derive(Debug, Default, Clone)]
pub struct ByteBuffer {
    data: Vec<u8>,
}

impl ByteBuffer {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    pub fn append(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// A slice view over the whole buffer.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Drops the first `n` bytes, shifting the remainder to the front.
    /// Used after a parser reports how much of the buffer it consumed.
    pub fn consume(&mut self, n: usize) {
        assert!(n <= self.data.len(), "consume past end of buffer");
        self.data.drain(0..n);
    }

    /// Reserves room for at least `additional` more unwritten bytes and
    /// returns a mutable, possibly-uninitialized view over the spare
    /// capacity, for a zero-copy `read(2)` directly into the buffer's
    /// tail. The caller must only read back the bytes it actually wrote
    /// (via [`MaybeUninit::write`] or an FFI call that does the
    /// equivalent) and must report how many via [`Self::set_len_after_write`]
    /// before this buffer's initialized range is trusted to include them.
    pub fn spare_capacity_mut(&mut self, additional: usize) -> &mut [MaybeUninit<u8>] {
        self.data.reserve(additional);
        let spare = self.data.spare_capacity_mut();
        &mut spare[..additional]
    }

    /// Grows the buffer's initialized length to cover `written` bytes
    /// past `reserved_tail_start`, after a write into the slice returned
    /// by [`Self::spare_capacity_mut`] actually initialized them.
    pub fn set_len_after_write(&mut self, written: usize, reserved_tail_start: usize) {
        // SAFETY: the caller is attesting that `written` bytes starting at
        // `reserved_tail_start` were just initialized, via the contract on
        // `spare_capacity_mut`.
        unsafe {
            self.data.set_len(reserved_tail_start + written);
        }
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

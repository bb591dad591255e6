// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! RDRAM model shared by the command fetcher and the render workers
//!
//! The RDP addresses main memory in three granularities: bytes (framebuffer
//! and texture image bytes), halfwords (16-bit color and depth pixels) and
//! words (32-bit color pixels, command lists). Memory is big-endian; words are
//! kept as native `u32` values and sub-word accesses select their lane from
//! the address.
//!
//! # Hidden Bits
//!
//! Every halfword carries two extra bits (the 9th bit of each byte on the
//! real RDRAM). The pixel pipeline stores coverage and depth-slope data there.
//! They are kept in a side array indexed by halfword and only touched by the
//! `pair_*` accessors.
//!
//! # Address Masking
//!
//! | Access   | Index mask  | Unit     |
//! |----------|-------------|----------|
//! | byte     | 0x00FFFFFF  | byte     |
//! | halfword | 0x007FFFFF  | 16 bits  |
//! | word     | 0x003FFFFF  | 32 bits  |
//!
//! Reads beyond the installed size return 0 and writes beyond it are dropped.
//!
//! # Concurrency
//!
//! Render workers write disjoint scanlines of the same framebuffer from
//! several threads. Storage is made of relaxed atomics so that sub-word
//! writes to neighbouring pixels in one word never lose each other's bits;
//! the worker pool's fan-out/join provides all the ordering needed.
//!
//! # Example
//!
//! ```
//! use rdpx::core::memory::Rdram;
//!
//! let rdram = Rdram::new(0x1000).unwrap();
//! rdram.write_idx32(0, 0x1122_3344);
//! assert_eq!(rdram.read_addr8(0), 0x11);
//! assert_eq!(rdram.read_idx16(1), 0x3344);
//!
//! rdram.pair_write16(2, 0xBEEF, 3);
//! assert_eq!(rdram.pair_read16(2), (0xBEEF, 3));
//! ```

use crate::core::error::{EmulatorError, Result};
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

/// Main memory with hidden-bit side storage
pub struct Rdram {
    /// Big-endian words stored as native values
    words: Vec<AtomicU32>,

    /// Two hidden bits per halfword
    hidden: Vec<AtomicU8>,
}

impl Rdram {
    /// Default installed size (8MB, expansion pak)
    pub const DEFAULT_SIZE: usize = 8 * 1024 * 1024;

    /// Largest addressable size (16MB)
    pub const MAX_SIZE: usize = 16 * 1024 * 1024;

    const ADDR8_MASK: u32 = 0x00FF_FFFF;
    const IDX16_MASK: u32 = 0x007F_FFFF;
    const IDX32_MASK: u32 = 0x003F_FFFF;

    /// Create zeroed RDRAM of `size` bytes
    ///
    /// # Errors
    ///
    /// Returns [`EmulatorError::InvalidRdramSize`] when `size` is zero, not a
    /// multiple of 4, or larger than [`Rdram::MAX_SIZE`].
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 || size % 4 != 0 || size > Self::MAX_SIZE {
            return Err(EmulatorError::InvalidRdramSize {
                got: size,
                max: Self::MAX_SIZE,
            });
        }

        Ok(Self {
            words: (0..size / 4).map(|_| AtomicU32::new(0)).collect(),
            hidden: (0..size / 2).map(|_| AtomicU8::new(0)).collect(),
        })
    }

    /// Create RDRAM initialised from big-endian words
    pub fn from_words(words: &[u32]) -> Result<Self> {
        let rdram = Self::new(words.len() * 4)?;
        for (slot, &word) in rdram.words.iter().zip(words) {
            slot.store(word, Ordering::Relaxed);
        }
        Ok(rdram)
    }

    /// Installed size in bytes
    pub fn size(&self) -> usize {
        self.words.len() * 4
    }

    /// Copy a big-endian byte image into memory starting at `offset`
    ///
    /// Bytes past the end of memory are ignored. Hidden bits are untouched.
    pub fn load_bytes(&self, offset: u32, bytes: &[u8]) {
        for (i, &byte) in bytes.iter().enumerate() {
            let addr = offset as usize + i;
            if addr >= self.size() {
                break;
            }
            self.write_addr8(addr as u32, byte);
        }
    }

    /// Dump memory as a big-endian byte image
    pub fn to_bytes(&self) -> Vec<u8> {
        self.words
            .iter()
            .flat_map(|w| w.load(Ordering::Relaxed).to_be_bytes())
            .collect()
    }

    /// Dump memory as words
    pub fn to_words(&self) -> Vec<u32> {
        self.words
            .iter()
            .map(|w| w.load(Ordering::Relaxed))
            .collect()
    }

    /// Clear all memory and hidden bits
    pub fn clear(&self) {
        for word in &self.words {
            word.store(0, Ordering::Relaxed);
        }
        for bits in &self.hidden {
            bits.store(0, Ordering::Relaxed);
        }
    }

    /// Hidden bits of halfword `idx`
    pub fn hidden(&self, idx: u32) -> u8 {
        let idx = (idx & Self::IDX16_MASK) as usize;
        self.hidden
            .get(idx)
            .map_or(0, |bits| bits.load(Ordering::Relaxed))
    }

    #[inline(always)]
    fn load_word(&self, idx: usize) -> u32 {
        self.words
            .get(idx)
            .map_or(0, |w| w.load(Ordering::Relaxed))
    }

    #[inline(always)]
    fn store_lane(&self, idx: usize, mask: u32, value: u32) {
        if let Some(word) = self.words.get(idx) {
            let _ = word.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |old| {
                Some((old & !mask) | (value & mask))
            });
        }
    }

    #[inline(always)]
    fn store_hidden(&self, idx: usize, value: u8) {
        if let Some(bits) = self.hidden.get(idx) {
            bits.store(value, Ordering::Relaxed);
        }
    }

    /// Read byte at `addr`
    #[inline(always)]
    pub fn read_addr8(&self, addr: u32) -> u8 {
        let addr = addr & Self::ADDR8_MASK;
        let shift = (3 - (addr & 3)) * 8;
        (self.load_word((addr >> 2) as usize) >> shift) as u8
    }

    /// Read halfword at index `idx`
    #[inline(always)]
    pub fn read_idx16(&self, idx: u32) -> u16 {
        let idx = idx & Self::IDX16_MASK;
        let shift = (1 - (idx & 1)) * 16;
        (self.load_word((idx >> 1) as usize) >> shift) as u16
    }

    /// Read word at index `idx`
    #[inline(always)]
    pub fn read_idx32(&self, idx: u32) -> u32 {
        self.load_word((idx & Self::IDX32_MASK) as usize)
    }

    /// Read halfword at index `idx` together with its hidden bits
    #[inline(always)]
    pub fn pair_read16(&self, idx: u32) -> (u16, u8) {
        let idx = idx & Self::IDX16_MASK;
        if (idx as usize) < self.hidden.len() {
            (self.read_idx16(idx), self.hidden(idx))
        } else {
            (0, 0)
        }
    }

    /// Write byte at `addr`
    #[inline(always)]
    pub fn write_addr8(&self, addr: u32, value: u8) {
        let addr = addr & Self::ADDR8_MASK;
        let shift = (3 - (addr & 3)) * 8;
        self.store_lane((addr >> 2) as usize, 0xFF << shift, (value as u32) << shift);
    }

    /// Write halfword at index `idx`
    #[inline(always)]
    pub fn write_idx16(&self, idx: u32, value: u16) {
        let idx = idx & Self::IDX16_MASK;
        let shift = (1 - (idx & 1)) * 16;
        self.store_lane(
            (idx >> 1) as usize,
            0xFFFF << shift,
            (value as u32) << shift,
        );
    }

    /// Write word at index `idx`
    #[inline(always)]
    pub fn write_idx32(&self, idx: u32, value: u32) {
        if let Some(word) = self.words.get((idx & Self::IDX32_MASK) as usize) {
            word.store(value, Ordering::Relaxed);
        }
    }

    /// Write byte at `addr`; odd bytes also set the hidden bits of their halfword
    #[inline(always)]
    pub fn pair_write8(&self, addr: u32, value: u8, hidden: u8) {
        let addr = addr & Self::ADDR8_MASK;
        if (addr as usize) < self.size() {
            self.write_addr8(addr, value);
            if addr & 1 != 0 {
                self.store_hidden((addr >> 1) as usize, hidden);
            }
        }
    }

    /// Write halfword and hidden bits at index `idx`
    #[inline(always)]
    pub fn pair_write16(&self, idx: u32, value: u16, hidden: u8) {
        let idx = idx & Self::IDX16_MASK;
        if (idx as usize) < self.hidden.len() {
            self.write_idx16(idx, value);
            self.store_hidden(idx as usize, hidden);
        }
    }

    /// Write word at index `idx` with the hidden bits of both halfwords
    #[inline(always)]
    pub fn pair_write32(&self, idx: u32, value: u32, hidden_hi: u8, hidden_lo: u8) {
        let idx = idx & Self::IDX32_MASK;
        if (idx as usize) < self.words.len() {
            self.write_idx32(idx, value);
            self.store_hidden((idx << 1) as usize, hidden_hi);
            self.store_hidden(((idx << 1) + 1) as usize, hidden_lo);
        }
    }
}

impl Default for Rdram {
    fn default() -> Self {
        Self {
            words: (0..Self::DEFAULT_SIZE / 4).map(|_| AtomicU32::new(0)).collect(),
            hidden: (0..Self::DEFAULT_SIZE / 2).map(|_| AtomicU8::new(0)).collect(),
        }
    }
}

impl std::fmt::Debug for Rdram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rdram").field("size", &self.size()).finish()
    }
}

#[cfg(test)]
mod tests;

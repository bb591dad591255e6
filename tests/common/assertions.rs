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

//! Custom assertions for framebuffer testing

use super::fixtures::{pixel16, snapshot, FB};
use rdpx::core::memory::Rdram;

/// Assert the framebuffer pixel at `(x, y)` has expected value in `mask`
#[allow(dead_code)]
pub fn assert_pixel16(rdram: &Rdram, x: u32, y: u32, expected: u16, mask: u16) {
    let actual = pixel16(rdram, FB, x, y) & mask;
    assert_eq!(
        actual, expected,
        "Pixel ({}, {}) mismatch: expected 0x{:04X}, got 0x{:04X}",
        x, y, expected, actual
    );
}

/// Assert two RDRAM images are identical, hidden bits included
#[allow(dead_code)]
pub fn assert_same_memory(expected: &Rdram, actual: &Rdram, label: &str) {
    let (words_a, hidden_a) = snapshot(expected);
    let (words_b, hidden_b) = snapshot(actual);

    if let Some(i) = words_a.iter().zip(&words_b).position(|(a, b)| a != b) {
        panic!(
            "{}: RDRAM word 0x{:X} differs: 0x{:08X} vs 0x{:08X}",
            label, i, words_a[i], words_b[i]
        );
    }
    if let Some(i) = hidden_a.iter().zip(&hidden_b).position(|(a, b)| a != b) {
        panic!(
            "{}: hidden bits of halfword 0x{:X} differ: {} vs {}",
            label, i, hidden_a[i], hidden_b[i]
        );
    }
}

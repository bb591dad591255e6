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

//! RDP front-end tests
//!
//! Covers:
//! - Command validation, scheduling and batching
//! - Fill rectangles, scissoring and fill-mode crashes
//! - DP command-list fetch from RDRAM and DMEM
//! - Trace recording and replay

use super::*;

mod fill;
mod list;
mod recording;

/// Color image base used by the fill tests
const FB: u32 = 0x1000;
/// Color image width in pixels
const FB_WIDTH: u32 = 32;

fn rdp_with(workers: u32, rdram_size: usize) -> (Rdp, Arc<Rdram>) {
    let rdram = Arc::new(Rdram::new(rdram_size).unwrap());
    let config = CoreConfig {
        num_workers: workers,
        parallel: workers != 1,
        ..CoreConfig::default()
    };
    let rdp = Rdp::new(config, rdram.clone()).unwrap();
    (rdp, rdram)
}

fn rdp(workers: u32) -> (Rdp, Arc<Rdram>) {
    rdp_with(workers, 0x10000)
}

fn submit(rdp: &mut Rdp, cmds: &[[u32; 2]]) {
    for cmd in cmds {
        rdp.command(cmd).unwrap();
    }
}

fn color_image(size: u32, addr: u32) -> [u32; 2] {
    [0x3f00_0000 | (size << 19) | (FB_WIDTH - 1), addr]
}

fn other_modes(w0: u32, w1: u32) -> [u32; 2] {
    [0x2f00_0000 | w0, w1]
}

fn fill_mode() -> [u32; 2] {
    other_modes(3 << 20, 0)
}

/// Scissor in whole pixels
fn scissor(x0: u32, y0: u32, x1: u32, y1: u32) -> [u32; 2] {
    [0x2d00_0000 | ((x0 * 4) << 12) | (y0 * 4), ((x1 * 4) << 12) | (y1 * 4)]
}

fn fill_color(color: u32) -> [u32; 2] {
    [0x3700_0000, color]
}

/// Fill rectangle in whole pixels
fn fill_rect(x0: u32, y0: u32, x1: u32, y1: u32) -> [u32; 2] {
    [0x3600_0000 | ((x1 * 4) << 12) | (y1 * 4), ((x0 * 4) << 12) | (y0 * 4)]
}

fn sync_full() -> [u32; 2] {
    [0x2900_0000, 0]
}

/// 16-bit fill program covering (0,0)-(8,4) inclusive
fn fill_program(color: u32) -> Vec<[u32; 2]> {
    vec![
        color_image(PIXEL_SIZE_16BIT, FB),
        fill_mode(),
        scissor(0, 0, FB_WIDTH, 32),
        fill_color(color),
        fill_rect(0, 0, 8, 4),
        sync_full(),
    ]
}

fn pixel16(rdram: &Rdram, x: u32, y: u32) -> u16 {
    rdram.read_idx16((FB >> 1) + y * FB_WIDTH + x)
}

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

use super::*;

/// Byte address of the command lists in RDRAM
const LIST: u32 = 0x8000;

fn write_list(rdram: &Rdram, addr: u32, words: &[u32]) -> u32 {
    for (i, &word) in words.iter().enumerate() {
        rdram.write_idx32((addr >> 2) + i as u32, word);
    }
    addr + (words.len() as u32) * 4
}

fn flatten(cmds: &[[u32; 2]]) -> Vec<u32> {
    cmds.iter().flatten().copied().collect()
}

#[test]
fn test_list_from_rdram() {
    let (mut rdp, rdram) = rdp(1);
    let end = write_list(&rdram, LIST, &flatten(&fill_program(0x5555_5555)));

    let mut regs = DpRegisters {
        start: LIST,
        current: LIST,
        end,
        status: DpStatus::FREEZE | DpStatus::START_VALID,
    };
    rdp.process_command_list(&mut regs, None);

    assert_eq!(pixel16(&rdram, 8, 4), 0x5555);
    assert_eq!(regs.start, end);
    assert_eq!(regs.current, end);
    assert!(!regs.status.contains(DpStatus::FREEZE));
    assert!(regs.status.contains(DpStatus::START_VALID));
}

#[test]
fn test_list_cursors_aligned_down() {
    let (mut rdp, rdram) = rdp(1);
    let end = write_list(&rdram, LIST, &flatten(&fill_program(0x5555_5555)));

    let mut regs = DpRegisters {
        current: LIST + 5,
        end: end + 7,
        ..DpRegisters::default()
    };
    rdp.process_command_list(&mut regs, None);

    assert_eq!(pixel16(&rdram, 0, 0), 0x5555);
    assert_eq!(regs.current, end + 7);
    assert_eq!(regs.start, end + 7);
}

#[test]
fn test_list_from_dmem() {
    let (mut rdp, rdram) = rdp(1);
    let mut dmem = vec![0u32; 0x400];
    let words = flatten(&fill_program(0x7777_7777));
    dmem[..words.len()].copy_from_slice(&words);

    // DMEM addressing wraps at 4 KiB
    let mut regs = DpRegisters {
        current: 0x1000,
        end: 0x1000 + (words.len() as u32) * 4,
        status: DpStatus::XBUS_DMA,
        ..DpRegisters::default()
    };
    rdp.process_command_list(&mut regs, Some(&dmem));

    assert_eq!(pixel16(&rdram, 2, 2), 0x7777);
    assert_eq!(regs.current, regs.end);
}

#[test]
fn test_empty_list_only_clears_freeze() {
    let (mut rdp, _) = rdp(1);
    let mut regs = DpRegisters {
        start: 0x10,
        current: 0x20,
        end: 0x20,
        status: DpStatus::FREEZE | DpStatus::XBUS_DMA,
    };
    rdp.process_command_list(&mut regs, None);

    assert_eq!(regs.start, 0x10);
    assert_eq!(regs.current, 0x20);
    assert_eq!(regs.status, DpStatus::XBUS_DMA);
}

#[test]
fn test_partial_command_dropped_at_end() {
    let (mut rdp, rdram) = rdp(1);
    let mut words = flatten(&fill_program(0x5555_5555));
    // First half of a Texture_Rectangle
    words.extend([0x2400_0000 | (32 << 12) | 32, 0]);
    let end = write_list(&rdram, LIST, &words);

    let mut regs = DpRegisters {
        current: LIST,
        end,
        ..DpRegisters::default()
    };
    rdp.process_command_list(&mut regs, None);

    assert_eq!(pixel16(&rdram, 0, 0), 0x5555);
    assert_eq!(regs.current, end);
    assert!(!rdp.is_crashed());
}

#[test]
fn test_command_straddling_fetch_chunk() {
    let (mut rdp, rdram) = rdp_with(1, 0x80000);
    let fb = 0x60000;

    let mut words = flatten(&[
        [0x3f00_0000 | (PIXEL_SIZE_16BIT << 19) | (FB_WIDTH - 1), fb],
        fill_mode(),
        scissor(0, 0, FB_WIDTH, 8),
        fill_color(0x4321_4321),
    ]);
    while words.len() < FETCH_CHUNK_WORDS as usize - 2 {
        words.extend([0, 0]);
    }
    // Texture_Rectangle (4 words) split across the chunk boundary; in
    // fill mode it fills like a Fill_Rectangle
    words.extend([0x2400_0000 | (8 << 12) | 8, 0, 0, 0x0400_0400]);
    words.extend(sync_full());
    let end = write_list(&rdram, 0, &words);

    let mut regs = DpRegisters {
        current: 0,
        end,
        ..DpRegisters::default()
    };
    rdp.process_command_list(&mut regs, None);

    assert_eq!(rdram.read_idx16(fb >> 1), 0x4321);
    assert_eq!(rdram.read_idx16((fb >> 1) + FB_WIDTH + 2), 0x4321);
    assert_eq!(regs.current, end);
}

#[test]
fn test_crash_stops_list() {
    let (mut rdp, rdram) = rdp(1);
    let mut program = fill_program(0xffff_ffff);
    program[0] = color_image(PIXEL_SIZE_4BIT, FB);
    program.insert(5, color_image(PIXEL_SIZE_16BIT, FB));
    program.insert(6, fill_rect(0, 0, 8, 4));
    let end = write_list(&rdram, LIST, &flatten(&program));

    let mut regs = DpRegisters {
        current: LIST,
        end,
        ..DpRegisters::default()
    };
    rdp.process_command_list(&mut regs, None);

    assert!(rdp.is_crashed());
    assert_eq!(rdp.pipeline().color_image().size, PIXEL_SIZE_4BIT);
    assert_eq!(pixel16(&rdram, 0, 0), 0);
    assert_eq!(regs.current, end);
}

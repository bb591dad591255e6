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

//! End-to-end rendering through the public command interface

mod common;

use common::assertions::*;
use common::display_list::*;
use common::fixtures::*;
use rdpx::core::rdp::tables::tables;
use rdpx::core::rdp::{DpRegisters, DpStatus};

/// RGBA16 texel whose channels all differ (r=0x0f g=0x1e b=0x17 a=1)
const TEXEL: u16 = 0x7bdf;

fn prim_depth_word(prim_z: u32) -> u16 {
    // Primitive depth enters the pipeline as an 18-bit value (z << 3); the
    // delta 0x100 compresses to 8, whose upper bits land in the low two bits
    tables().z_com[(prim_z << 3) as usize] | 2
}

fn render(list: &DisplayList) -> std::sync::Arc<rdpx::core::memory::Rdram> {
    let (mut rdp, rdram) = create_rdp(1);
    write_uniform_texture(&rdram, TEXEL);
    list.submit(&mut rdp).unwrap();
    rdp.flush();
    assert!(!rdp.is_crashed());
    rdram
}

#[test]
fn test_clear_fills_both_buffers() {
    let rdram = render(&clear_buffers(BACKGROUND).sync_full());

    for (x, y) in [(0, 0), (31, 0), (0, 23), (31, 23), (17, 9)] {
        assert_eq!(pixel16(&rdram, FB, x, y), 0x0843);
        assert_eq!(pixel16(&rdram, ZB, x, y), 0xfffc);
    }
}

#[test]
fn test_textured_rect_reproduces_texel() {
    let rdram = render(&scene());

    // The low bit of a 16-bit pixel carries coverage, not color
    for y in 5..=6 {
        for x in 9..=14 {
            assert_pixel16(&rdram, x, y, TEXEL & 0xfffe, 0xfffe);
        }
    }
}

#[test]
fn test_prim_depth_written_without_compare() {
    let rdram = render(&scene());
    let expected = prim_depth_word(SCENE_PRIM_Z);

    for y in 5..=6 {
        for x in 9..=14 {
            assert_eq!(pixel16(&rdram, ZB, x, y), expected, "depth at ({}, {})", x, y);
            assert_eq!(hidden_bits(&rdram, ZB, x, y), 0);
        }
    }
}

#[test]
fn test_triangle_shaded_between_edges() {
    let rdram = render(&scene());
    let background = (BACKGROUND & 0xffff) as u16;

    // Inside: right of the vertical major edge, left of the diagonal
    let inside = pixel16(&rdram, FB, 5, 12);
    assert_ne!(inside, background);
    assert_ne!(pixel16(&rdram, ZB, 5, 12), 0xfffc);

    // Left of the major edge, past the diagonal, above and below
    for (x, y) in [(2, 10), (28, 10), (10, 0), (10, 1), (5, 22)] {
        assert_eq!(pixel16(&rdram, FB, x, y), background, "pixel ({}, {})", x, y);
        assert_eq!(pixel16(&rdram, ZB, x, y), 0xfffc, "depth ({}, {})", x, y);
    }
}

#[test]
fn test_triangle_red_falls_off_to_the_right() {
    let rdram = render(&scene());
    let red = |x| pixel16(&rdram, FB, x, 12) >> 11;

    assert!(red(5) > red(10), "red {} vs {}", red(5), red(10));
}

#[test]
fn test_depth_compare_rejects_farther_rect() {
    let base = clear_buffers(BACKGROUND)
        .extend(load_texture())
        .extend(gradient_triangle());
    let reference = render(&base.clone().sync_full());

    let occluded = render(
        &base
            .extend(textured_rect(Z_COMPARE | Z_UPDATE, 0x7fff, 4, 4, 12, 8))
            .sync_full(),
    );

    assert_same_memory(&reference, &occluded, "occluded rectangle");
}

#[test]
fn test_depth_compare_accepts_nearer_rect() {
    let rdram = render(
        &clear_buffers(BACKGROUND)
            .extend(load_texture())
            .extend(gradient_triangle())
            .extend(textured_rect(Z_COMPARE | Z_UPDATE, 0, 4, 4, 12, 8))
            .sync_full(),
    );

    for (x, y) in [(5, 5), (8, 6), (10, 5)] {
        assert_pixel16(&rdram, x, y, TEXEL & 0xfffe, 0xfffe);
        assert_eq!(pixel16(&rdram, ZB, x, y), prim_depth_word(0));
    }
}

#[test]
fn test_command_list_matches_direct_submission() {
    const LIST: u32 = 0x8000;

    let direct = render(&scene());

    let (mut rdp, rdram) = create_rdp(1);
    write_uniform_texture(&rdram, TEXEL);
    let words = scene().to_words();
    for (i, &word) in words.iter().enumerate() {
        rdram.write_idx32((LIST >> 2) + i as u32, word);
    }

    let mut regs = DpRegisters {
        start: LIST,
        current: LIST,
        end: LIST + 4 * words.len() as u32,
        status: DpStatus::START_VALID,
    };
    rdp.process_command_list(&mut regs, None);
    rdp.flush();

    assert_eq!(regs.current, regs.end);
    for y in 0..FB_HEIGHT {
        for x in 0..FB_WIDTH {
            assert_eq!(pixel16(&rdram, FB, x, y), pixel16(&direct, FB, x, y));
            assert_eq!(pixel16(&rdram, ZB, x, y), pixel16(&direct, ZB, x, y));
        }
    }
}

#[test]
fn test_four_bit_color_image_crashes_once() {
    let (mut rdp, rdram) = create_rdp(1);
    let list = DisplayList::new()
        .other_modes(FILL_MODE, 0)
        .scissor(0, 0, FB_WIDTH, FB_HEIGHT)
        .color_image(0, FB_WIDTH, FB)
        .fill_color(0xffff_ffff)
        .fill_rect(0, 0, 4, 4)
        .fill_rect(0, 0, 4, 4)
        .sync_full();

    list.submit(&mut rdp).unwrap();

    assert!(rdp.is_crashed());
    assert_eq!(rdp.crash_latch().warnings_emitted(), 1);
    assert_eq!(rdram.read_idx32(FB >> 2), 0);
}

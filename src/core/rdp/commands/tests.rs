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
use crate::core::memory::Rdram;
use crate::core::rdp::crash::CrashLatch;
use crate::core::rdp::types::*;
use std::sync::Arc;

fn pipeline() -> Pipeline {
    let rdram = Arc::new(Rdram::new(0x1000).unwrap());
    Pipeline::new(rdram, Arc::new(CrashLatch::new()))
}

#[test]
fn test_triangle_lengths_follow_opcode_bits() {
    for id in 0x08..=0x0F {
        let info = command_info(id);
        let mut words = 8;
        if id & 4 != 0 {
            words += 16;
        }
        if id & 2 != 0 {
            words += 16;
        }
        if id & 1 != 0 {
            words += 4;
        }
        assert_eq!(info.words(), words, "{}", info.name);
        assert!(info.multi && !info.single && !info.sync);
    }
    assert_eq!(command_info(0x0F).words(), CMD_MAX_WORDS);
}

#[test]
fn test_scheduling_flags() {
    for id in [CMD_NO_OP, CMD_SYNC_LOAD, CMD_SYNC_PIPE, CMD_SYNC_TILE] {
        let info = command_info(id);
        assert!(info.single && !info.multi && !info.sync, "{}", info.name);
    }

    let full = command_info(CMD_SYNC_FULL);
    assert!(full.single && !full.multi && full.sync);

    let mask = command_info(CMD_SET_MASK_IMAGE);
    assert!(mask.single && mask.multi && mask.sync);

    let color = command_info(CMD_SET_COLOR_IMAGE);
    assert!(!color.single && color.multi && color.sync);

    for id in (0x2A..=0x3D).filter(|&id| id != 0x31) {
        let info = command_info(id);
        assert!(info.multi && !info.single && !info.sync, "{}", info.name);
        assert_eq!(info.words(), 2);
    }
    assert_eq!(command_info(CMD_TEXTURE_RECTANGLE).words(), 4);
    assert_eq!(command_info(CMD_TEXTURE_RECTANGLE_FLIP).words(), 4);
}

#[test]
fn test_unassigned_opcodes() {
    let unassigned: Vec<u32> = (0..64).filter(|&id| command_info(id).is_invalid()).collect();
    let expected: Vec<u32> = (0x01..=0x07).chain(0x10..=0x23).chain([0x31]).collect();
    assert_eq!(unassigned, expected);

    for id in unassigned {
        let info = command_info(id);
        assert_eq!(info.length, 8);
        assert!(info.single && !info.multi && !info.sync);
    }
}

#[test]
fn test_command_id_ignores_upper_bits() {
    assert_eq!(command_id(0xE900_0000), CMD_SYNC_FULL);
    assert_eq!(command_id(0x3F12_3456), CMD_SET_COLOR_IMAGE);
}

#[test]
fn test_set_scissor_fields() {
    let mut p = pipeline();
    p.execute(&[0x2D00_0000 | (8 << 12) | 4, (3 << 24) | (1280 << 12) | 960]);

    assert_eq!(p.clip(), &Rect { xh: 8, yh: 4, xl: 1280, yl: 960 });
    assert!(p.scfield);
    assert!(p.sckeepodd);
}

#[test]
fn test_set_other_modes_marks_derivs_stale() {
    let mut p = pipeline();
    p.derivs.stale = false;

    p.execute(&[0x2F00_0000 | (1 << 20) | (1 << 19), (1 << 5) | (1 << 4)]);

    assert_eq!(p.other_modes().cycle_type, CycleType::TwoCycle);
    assert!(p.other_modes().persp_tex_en);
    assert!(p.other_modes().z_update_en);
    assert!(p.other_modes().z_compare_en);
    assert!(p.derivs.stale);
}

#[test]
fn test_set_combine_marks_derivs_stale() {
    let mut p = pipeline();
    p.derivs.stale = false;

    p.execute(&[0x3CFF_FFFF, 0xFFFC_F279]);

    assert_eq!(p.combiner[0].rgb_add, RgbInput::Texel0);
    assert_eq!(p.combiner[0].rgb_mul, RgbInput::Zero);
    assert_eq!(p.combiner[1].alpha_add, AlphaInput::Texel0);
    assert!(p.derivs.stale);
}

#[test]
fn test_set_prim_depth_keeps_15_bits() {
    let mut p = pipeline();
    p.execute(&[0x2E00_0000, 0xFFFF_1234]);
    assert_eq!(p.primitive_z, 0x7FFF_0000);
    assert_eq!(p.primitive_delta_z, 0x1234);
}

#[test]
fn test_set_convert_scales_k0_to_k3() {
    let mut p = pipeline();
    // k0 = 1, k1 = -1 (0x1ff), k4 = 5, k5 = 7
    p.execute(&[0x2C00_0000 | (1 << 13) | (0x1FF << 4), (5 << 9) | 7]);

    assert_eq!(p.k0_tf, 3);
    assert_eq!(p.k1_tf, -1);
    assert_eq!(p.k4, 5);
    assert_eq!(p.k5, 7);
}

#[test]
fn test_color_registers() {
    let mut p = pipeline();
    p.execute(&[0x3700_0000, 0xDEAD_BEEF]);
    p.execute(&[0x3800_0000, 0x1122_3344]);
    p.execute(&[0x3A00_0000 | (3 << 8) | 0x80, 0x5566_7788]);

    assert_eq!(p.fill_color, 0xDEAD_BEEF);
    assert_eq!(p.fog_color, Color { r: 0x11, g: 0x22, b: 0x33, a: 0x44 });
    assert_eq!(p.prim_color, Color { r: 0x55, g: 0x66, b: 0x77, a: 0x88 });
    assert_eq!(p.min_level, 3);
    assert_eq!(p.prim_lod_frac, 0x80);
}

#[test]
fn test_image_descriptors() {
    let mut p = pipeline();
    p.execute(&[0x3F00_0000 | (2 << 19) | 319, 0xAB10_0000]);
    p.execute(&[0x3D00_0000 | (3 << 21) | (1 << 19) | 63, 0x0020_0000]);
    p.execute(&[0x3E00_0000, 0x0030_0000]);

    let ci = p.color_image();
    assert_eq!((ci.size, ci.width, ci.address), (PIXEL_SIZE_16BIT, 320, 0x10_0000));

    let ti = p.texture_image();
    assert_eq!((ti.format, ti.size, ti.width), (FORMAT_IA, PIXEL_SIZE_8BIT, 64));
    assert_eq!(p.zb_address(), 0x30_0000);
}

#[test]
fn test_empty_and_invalid_commands_do_nothing() {
    let mut p = pipeline();
    p.execute(&[]);
    p.execute(&[0x0500_0000, 0xFFFF_FFFF]);
    assert_eq!(p.fill_color, 0);
    assert!(!p.crash.is_crashed());
}

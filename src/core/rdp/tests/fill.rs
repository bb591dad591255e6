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

#[test]
fn test_fill_rect_includes_lower_right_edge() {
    let (mut rdp, rdram) = rdp(1);
    submit(&mut rdp, &fill_program(0xf801_f801));

    for y in 0..=4 {
        for x in 0..=8 {
            assert_eq!(pixel16(&rdram, x, y), 0xf801, "pixel ({}, {})", x, y);
        }
    }
    assert_eq!(pixel16(&rdram, 9, 0), 0);
    assert_eq!(pixel16(&rdram, 0, 5), 0);
    assert!(!rdp.is_crashed());
}

#[test]
fn test_fill_alternates_color_halves() {
    let (mut rdp, rdram) = rdp(1);
    submit(&mut rdp, &fill_program(0xaaaa_5555));

    assert_eq!(pixel16(&rdram, 0, 0), 0xaaaa);
    assert_eq!(pixel16(&rdram, 1, 0), 0x5555);
    assert_eq!(pixel16(&rdram, 2, 1), 0xaaaa);
}

#[test]
fn test_fill_rect_with_scissor() {
    let (mut rdp, rdram) = rdp(1);
    submit(
        &mut rdp,
        &[
            color_image(PIXEL_SIZE_16BIT, FB),
            fill_mode(),
            scissor(2, 1, 6, 3),
            fill_color(0xffff_ffff),
            fill_rect(0, 0, 8, 4),
            sync_full(),
        ],
    );

    for y in 0..6 {
        for x in 0..10 {
            let inside = (2..=6).contains(&x) && (1..=2).contains(&y);
            let expected = if inside { 0xffff } else { 0 };
            assert_eq!(pixel16(&rdram, x, y), expected, "pixel ({}, {})", x, y);
        }
    }
}

#[test]
fn test_fill_16bit_sets_hidden_bits_from_color() {
    let (mut rdp, rdram) = rdp(1);
    submit(&mut rdp, &fill_program(0x0001_0000));

    // Even pixels take the high half (alpha bit set), odd the low half
    let idx = FB >> 1;
    assert_eq!(rdram.hidden(idx), 3);
    assert_eq!(rdram.hidden(idx + 1), 0);
}

#[test]
fn test_fill_32bit() {
    let (mut rdp, rdram) = rdp(1);
    submit(
        &mut rdp,
        &[
            color_image(PIXEL_SIZE_32BIT, FB),
            fill_mode(),
            scissor(0, 0, FB_WIDTH, 8),
            fill_color(0x1122_3344),
            fill_rect(0, 0, 3, 1),
            sync_full(),
        ],
    );

    let row = (FB >> 2) + FB_WIDTH;
    assert_eq!(rdram.read_idx32((FB >> 2) + 3), 0x1122_3344);
    assert_eq!(rdram.read_idx32(row), 0x1122_3344);
    assert_eq!(rdram.read_idx32((FB >> 2) + 4), 0);
}

#[test]
fn test_4bit_fill_crashes_and_warns_once() {
    let (mut rdp, rdram) = rdp(1);
    let mut program = fill_program(0xffff_ffff);
    program[0] = color_image(PIXEL_SIZE_4BIT, FB);

    submit(&mut rdp, &program);
    assert!(rdp.is_crashed());

    rdp.reset_crash();
    assert!(!rdp.is_crashed());
    submit(&mut rdp, &[fill_rect(0, 0, 8, 4), sync_full()]);
    assert!(rdp.is_crashed());

    let latch = rdp.crash_latch();
    assert!(latch.has_warned(CrashWarning::FillCrash));
    assert_eq!(latch.warnings_emitted(), 1);
    assert!(rdram.to_words().iter().all(|&w| w == 0));
}

#[test]
fn test_fill_with_depth_compare_crashes_before_writing() {
    let (mut rdp, rdram) = rdp(1);
    let mut program = fill_program(0xffff_ffff);
    // z_compare_en
    program[1] = other_modes(3 << 20, 1 << 4);

    submit(&mut rdp, &program);
    assert!(rdp.is_crashed());
    assert!(rdp.crash_latch().has_warned(CrashWarning::FillBitCrash));
    assert_eq!(pixel16(&rdram, 0, 0), 0);
}

#[test]
fn test_fill_with_depth_update_writes_one_line() {
    let (mut rdp, rdram) = rdp(1);
    let mut program = fill_program(0xffff_ffff);
    // z_update_en without primitive depth
    program[1] = other_modes(3 << 20, 1 << 5);

    submit(&mut rdp, &program);
    assert!(rdp.is_crashed());
    assert_eq!(pixel16(&rdram, 0, 0), 0xffff);
    assert_eq!(pixel16(&rdram, 0, 1), 0);
}

#[test]
fn test_fill_with_primitive_depth_update_is_allowed() {
    let (mut rdp, rdram) = rdp(1);
    let mut program = fill_program(0xffff_ffff);
    program[1] = other_modes(3 << 20, (1 << 5) | (1 << 2));

    submit(&mut rdp, &program);
    assert!(!rdp.is_crashed());
    assert_eq!(pixel16(&rdram, 0, 4), 0xffff);
}

#[test]
fn test_crashed_pipeline_ignores_primitives_until_reset() {
    for workers in [1, 3] {
        let (mut rdp, rdram) = rdp(workers);
        let mut program = fill_program(0xffff_ffff);
        program[0] = color_image(PIXEL_SIZE_4BIT, FB);
        submit(&mut rdp, &program);
        assert!(rdp.is_crashed());

        submit(
            &mut rdp,
            &[
                color_image(PIXEL_SIZE_16BIT, FB),
                fill_rect(0, 0, 8, 4),
                sync_full(),
            ],
        );
        assert!(rdp.is_crashed());
        assert_eq!(pixel16(&rdram, 0, 0), 0, "{} workers", workers);

        // Register state set while crashed is kept
        rdp.reset_crash();
        submit(&mut rdp, &[fill_rect(0, 0, 8, 4), sync_full()]);
        assert!(!rdp.is_crashed());
        assert_eq!(pixel16(&rdram, 0, 0), 0xffff, "{} workers", workers);
    }
}

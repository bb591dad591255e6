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

//! Test fixtures for common render scenarios

use super::display_list::*;
use rdpx::core::config::CoreConfig;
use rdpx::core::memory::Rdram;
use rdpx::core::rdp::Rdp;
use std::sync::Arc;

pub const RDRAM_SIZE: usize = 0x10000;

/// 16-bit framebuffer, 32x24 pixels
pub const FB: u32 = 0x1000;
pub const FB_WIDTH: u32 = 32;
pub const FB_HEIGHT: u32 = 24;

/// Depth buffer, same dimensions as the framebuffer
pub const ZB: u32 = 0x3000;

/// RGBA16 texture image, 8x4 texels
pub const TEXTURE: u32 = 0x5000;
pub const TEXTURE_WIDTH: u32 = 8;
pub const TEXTURE_HEIGHT: u32 = 4;

/// Depth value a cleared depth buffer holds
pub const Z_FAR: u32 = 0xfffc_fffc;

/// Delta Z used with primitive depth
pub const PRIM_DELTA_Z: u32 = 0x0100;

/// Primitive depth of the textured rectangle in [`scene`]
pub const SCENE_PRIM_Z: u32 = 0x1234;

/// Framebuffer clear color of [`scene`]
pub const BACKGROUND: u32 = 0x0843_0843;

/// Configuration for `workers` render workers
#[allow(dead_code)]
pub fn config(workers: u32) -> CoreConfig {
    CoreConfig {
        num_workers: workers,
        parallel: workers != 1,
        ..CoreConfig::default()
    }
}

/// Create an RDP over a fresh RDRAM
#[allow(dead_code)]
pub fn create_rdp(workers: u32) -> (Rdp, Arc<Rdram>) {
    let rdram = Arc::new(Rdram::new(RDRAM_SIZE).expect("valid RDRAM size"));
    let rdp = Rdp::new(config(workers), Arc::clone(&rdram)).expect("RDP setup");
    (rdp, rdram)
}

/// Fill an 8x4 RGBA16 texture with one texel value
#[allow(dead_code)]
pub fn write_uniform_texture(rdram: &Rdram, texel: u16) {
    for i in 0..TEXTURE_WIDTH * TEXTURE_HEIGHT {
        rdram.write_idx16((TEXTURE >> 1) + i, texel);
    }
}

/// Read the 16-bit pixel at `(x, y)` of a framebuffer-sized image at `base`
#[allow(dead_code)]
pub fn pixel16(rdram: &Rdram, base: u32, x: u32, y: u32) -> u16 {
    rdram.read_idx16((base >> 1) + y * FB_WIDTH + x)
}

/// Hidden bits of the pixel at `(x, y)` of an image at `base`
#[allow(dead_code)]
pub fn hidden_bits(rdram: &Rdram, base: u32, x: u32, y: u32) -> u8 {
    rdram.hidden((base >> 1) + y * FB_WIDTH + x)
}

/// RDRAM words and every hidden bit pair
#[allow(dead_code)]
pub fn snapshot(rdram: &Rdram) -> (Vec<u32>, Vec<u8>) {
    let hidden = (0..(rdram.size() / 2) as u32).map(|i| rdram.hidden(i)).collect();
    (rdram.to_words(), hidden)
}

/// Clear the depth buffer to the far plane and the framebuffer to `background`
#[allow(dead_code)]
pub fn clear_buffers(background: u32) -> DisplayList {
    DisplayList::new()
        .other_modes(FILL_MODE, 0)
        .scissor(0, 0, FB_WIDTH, FB_HEIGHT)
        .color_image(SIZE_16BIT, FB_WIDTH, ZB)
        .fill_color(Z_FAR)
        .fill_rect(0, 0, FB_WIDTH - 1, FB_HEIGHT - 1)
        .sync_pipe()
        .color_image(SIZE_16BIT, FB_WIDTH, FB)
        .fill_color(background)
        .fill_rect(0, 0, FB_WIDTH - 1, FB_HEIGHT - 1)
        .sync_pipe()
        .mask_image(ZB)
}

/// Load the 8x4 texture into tile 0
#[allow(dead_code)]
pub fn load_texture() -> DisplayList {
    DisplayList::new()
        .texture_image(SIZE_16BIT, TEXTURE_WIDTH, TEXTURE)
        .set_tile(0, SIZE_16BIT, 2, 0)
        .load_tile(0, 0, 0, TEXTURE_WIDTH - 1, TEXTURE_HEIGHT - 1)
        .sync_load()
}

/// Gouraud-shaded, depth-tested triangle with vertices (4, 2), (24, 2) and
/// (4, 20)
///
/// The major edge is the vertical left edge.
#[allow(dead_code)]
pub fn gradient_triangle() -> DisplayList {
    let yh = 2 * 4;
    let ym = 20 * 4;
    let yl = 20 * 4;
    let dxmdy = (-(20i32 << 16) / 18) as u32;

    let edges = [
        (0x0d << 24) | (1 << 23) | yl,
        (ym << 16) | yh,
        4 << 16,
        0,
        4 << 16,
        0,
        24 << 16,
        dxmdy,
    ];

    // r g b a start 255/64/32/255; per pixel r -8 g +4; per line r -4 g +2
    let shade = [
        (255 << 16) | 64,
        (32 << 16) | 255,
        (0xfff8 << 16) | 4,
        0,
        0,
        0,
        0,
        0,
        (0xfffc << 16) | 2,
        0,
        (0xfffc << 16) | 2,
        0,
        0,
        0,
        0,
        0,
    ];

    let depth = [0x2000_0000, 0x0001_0000, 0x0002_0000, 0x0002_0000];

    let words: Vec<u32> = edges.iter().chain(&shade).chain(&depth).copied().collect();

    DisplayList::new()
        .other_modes(0, Z_COMPARE | Z_UPDATE)
        .combine(combine_add(INPUT_SHADE))
        .raw(&words)
        .sync_pipe()
}

/// Textured rectangle over pixels `(x0, y0)..(x1, y1)` at a primitive depth
///
/// `z_modes` selects the depth compare and update bits; the depth source is
/// always the primitive depth with a delta of 0x100.
#[allow(dead_code)]
pub fn textured_rect(z_modes: u32, prim_z: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> DisplayList {
    DisplayList::new()
        .other_modes(ONE_CYCLE_NO_DITHER, z_modes | Z_SOURCE_PRIM)
        .combine(combine_add(INPUT_TEXEL0))
        .prim_depth(prim_z, PRIM_DELTA_Z)
        .texture_rect(0, x0, y0, x1, y1)
        .sync_pipe()
}

/// Depth-cleared scene with a triangle, a textured rectangle and a final sync
#[allow(dead_code)]
pub fn scene() -> DisplayList {
    clear_buffers(BACKGROUND)
        .extend(load_texture())
        .extend(gradient_triangle())
        .extend(textured_rect(Z_UPDATE, SCENE_PRIM_Z, 8, 4, 16, 8))
        .sync_full()
}

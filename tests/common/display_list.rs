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

//! Display-list builder
//!
//! Coordinates are whole pixels unless noted; the builder converts them to
//! the 10.2 fixed point the commands carry.

use rdpx::core::error::Result;
use rdpx::core::rdp::Rdp;

pub const SIZE_16BIT: u32 = 2;
pub const FORMAT_RGBA: u32 = 0;

/// Other modes, first word: 1-cycle, no texture filter conversion, no dither
pub const ONE_CYCLE_NO_DITHER: u32 = 0x0000_0cf0;
/// Other modes, first word: 1-cycle with random RGB dither and noise alpha dither
#[allow(dead_code)]
pub const ONE_CYCLE_NOISE_DITHER: u32 = 0x0000_0ca0;
/// Other modes, first word: fill mode
pub const FILL_MODE: u32 = 3 << 20;

pub const Z_COMPARE: u32 = 1 << 4;
pub const Z_UPDATE: u32 = 1 << 5;
pub const Z_SOURCE_PRIM: u32 = 1 << 2;

/// Combiner input selecting texel 0 (RGB add and alpha add)
pub const INPUT_TEXEL0: u32 = 1;
/// Combiner input selecting the shade color
pub const INPUT_SHADE: u32 = 4;

/// Set_Combine words computing `(0 - 0) * 0 + input` in both cycles
pub fn combine_add(input: u32) -> [u32; 2] {
    let w0 = 0x3cff_ffff;
    let w1 = (0xff << 24)
        | (7 << 21)
        | (7 << 18)
        | (input << 15)
        | (7 << 12)
        | (input << 9)
        | (input << 6)
        | (7 << 3)
        | input;
    [w0, w1]
}

#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    commands: Vec<Vec<u32>>,
}

#[allow(dead_code)]
impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(mut self, words: &[u32]) -> Self {
        self.commands.push(words.to_vec());
        self
    }

    pub fn color_image(self, size: u32, width: u32, addr: u32) -> Self {
        self.raw(&[0x3f00_0000 | (size << 19) | (width - 1), addr])
    }

    pub fn mask_image(self, addr: u32) -> Self {
        self.raw(&[0x3e00_0000, addr])
    }

    pub fn texture_image(self, size: u32, width: u32, addr: u32) -> Self {
        self.raw(&[0x3d00_0000 | (FORMAT_RGBA << 21) | (size << 19) | (width - 1), addr])
    }

    pub fn scissor(self, x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        self.raw(&[
            0x2d00_0000 | ((x0 * 4) << 12) | (y0 * 4),
            ((x1 * 4) << 12) | (y1 * 4),
        ])
    }

    pub fn other_modes(self, w0: u32, w1: u32) -> Self {
        self.raw(&[0x2f00_0000 | w0, w1])
    }

    pub fn combine(self, words: [u32; 2]) -> Self {
        self.raw(&words)
    }

    pub fn fill_color(self, color: u32) -> Self {
        self.raw(&[0x3700_0000, color])
    }

    pub fn prim_depth(self, z: u32, dz: u32) -> Self {
        self.raw(&[0x2e00_0000, (z << 16) | dz])
    }

    pub fn fill_rect(self, x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        self.raw(&[
            0x3600_0000 | ((x1 * 4) << 12) | (y1 * 4),
            ((x0 * 4) << 12) | (y0 * 4),
        ])
    }

    /// Set_Tile for an RGBA tile; `line` is in 64-bit words
    pub fn set_tile(self, tile: u32, size: u32, line: u32, tmem: u32) -> Self {
        self.raw(&[
            0x3500_0000 | (FORMAT_RGBA << 21) | (size << 19) | (line << 9) | tmem,
            tile << 24,
        ])
    }

    /// Load_Tile of texels `(sl, tl)..=(sh, th)`
    pub fn load_tile(self, tile: u32, sl: u32, tl: u32, sh: u32, th: u32) -> Self {
        self.raw(&[
            0x3400_0000 | ((sl * 4) << 12) | (tl * 4),
            (tile << 24) | ((sh * 4) << 12) | (th * 4),
        ])
    }

    /// Texture_Rectangle with texel coordinates starting at 0 and one
    /// texel per pixel
    pub fn texture_rect(self, tile: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        self.raw(&[
            0x2400_0000 | ((x1 * 4) << 12) | (y1 * 4),
            (tile << 24) | ((x0 * 4) << 12) | (y0 * 4),
            0,
            (0x0400 << 16) | 0x0400,
        ])
    }

    pub fn sync_load(self) -> Self {
        self.raw(&[0x2600_0000, 0])
    }

    pub fn sync_pipe(self) -> Self {
        self.raw(&[0x2700_0000, 0])
    }

    pub fn sync_full(self) -> Self {
        self.raw(&[0x2900_0000, 0])
    }

    pub fn extend(mut self, other: DisplayList) -> Self {
        self.commands.extend(other.commands);
        self
    }

    pub fn commands(&self) -> &[Vec<u32>] {
        &self.commands
    }

    /// Submit every command, in order
    pub fn submit(&self, rdp: &mut Rdp) -> Result<()> {
        for cmd in &self.commands {
            rdp.command(cmd)?;
        }
        Ok(())
    }

    /// Flatten into a DP command list
    pub fn to_words(&self) -> Vec<u32> {
        self.commands.iter().flatten().copied().collect()
    }
}

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

//! Tile descriptors and TMEM loads
//!
//! Load commands are turned into a small rectangle walked by
//! [`Pipeline::edgewalker_for_loads`]: one span per texture row, with S/T
//! stepping through the texture image.

use super::super::Pipeline;
use super::CMD_LOAD_TLUT;

/// Tile index carried in bits 24-26 of the second word
#[inline(always)]
fn tile_index(w1: u32) -> usize {
    ((w1 >> 24) & 7) as usize
}

impl Pipeline {
    /// Set_Tile (0x35)
    ///
    /// ```text
    /// w0: format(21-23) size(19-20) line(9-17) tmem(0-8)
    /// w1: tile(24-26) palette(20-23) ct mt mask_t shift_t cs ms mask_s shift_s
    /// ```
    pub(in crate::core::rdp) fn set_tile(&mut self, w0: u32, w1: u32) {
        let tile = &mut self.tiles[tile_index(w1)];
        tile.format = (w0 >> 21) & 7;
        tile.size = (w0 >> 19) & 3;
        tile.line = ((w0 >> 9) & 0x1ff) as i32;
        tile.tmem = (w0 & 0x1ff) as i32;
        tile.palette = ((w1 >> 20) & 0xf) as i32;
        tile.ct = (w1 >> 19) & 1 != 0;
        tile.mt = (w1 >> 18) & 1 != 0;
        tile.mask_t = ((w1 >> 14) & 0xf) as i32;
        tile.shift_t = ((w1 >> 10) & 0xf) as i32;
        tile.cs = (w1 >> 9) & 1 != 0;
        tile.ms = (w1 >> 8) & 1 != 0;
        tile.mask_s = ((w1 >> 4) & 0xf) as i32;
        tile.shift_s = (w1 & 0xf) as i32;
        tile.update_derivs();
    }

    /// Write the tile bounds shared by Set_Tile_Size and the load commands
    fn set_tile_bounds(&mut self, w0: u32, w1: u32) -> (usize, i32, i32, i32, i32) {
        let tilenum = tile_index(w1);
        let tile = &mut self.tiles[tilenum];
        tile.sl = ((w0 >> 12) & 0xfff) as i32;
        tile.tl = (w0 & 0xfff) as i32;
        tile.sh = ((w1 >> 12) & 0xfff) as i32;
        tile.th = (w1 & 0xfff) as i32;
        tile.update_clamp_diffs();
        (tilenum, tile.sl, tile.tl, tile.sh, tile.th)
    }

    /// Set_Tile_Size (0x32)
    pub(in crate::core::rdp) fn set_tile_size(&mut self, w0: u32, w1: u32) {
        self.set_tile_bounds(w0, w1);
    }

    /// Load_Block (0x33)
    ///
    /// Loads one long row starting at (sl, tl). The `th` field holds dxt,
    /// the T increment per 64-bit TMEM word used to swap odd rows.
    pub(in crate::core::rdp) fn load_block(&mut self, w0: u32, w1: u32) {
        let (tilenum, sl, tl, sh, dxt) = self.set_tile_bounds(w0, w1);
        let (tilenum, sl, tl, sh, dxt) = (tilenum as u32, sl as u32, tl as u32, sh as u32, dxt as u32);
        let tlclamped = tl & 0x3ff;
        let ti_size = self.texture_image.size;

        let lew = [
            (w0 & 0xff00_0000) | (0x10 << 19) | (tilenum << 16) | ((tlclamped << 2) | 3),
            (((tlclamped << 2) | 3) << 16) | (tlclamped << 2),
            sh << 16,
            sl << 16,
            sh << 16,
            ((sl << 3) << 16) | (tl << 3),
            (dxt & 0xff) << 8,
            ((0x80 >> ti_size) << 16) | (dxt >> 8),
            0x20,
            0x20,
        ];

        self.edgewalker_for_loads(&lew, true, false);
    }

    /// Load_Tile (0x34) and Load_TLUT (0x30)
    pub(in crate::core::rdp) fn load_tile_or_tlut(&mut self, id: u32, w0: u32, w1: u32) {
        let (tilenum, sl, tl, sh, th) = self.set_tile_bounds(w0, w1);
        let (tilenum, sl, tl, sh, th) = (tilenum as u32, sl as u32, tl as u32, sh as u32, th as u32);
        let ti_size = self.texture_image.size;

        let lew = [
            (w0 & 0xff00_0000) | (0x10 << 19) | (tilenum << 16) | (th | 3),
            ((th | 3) << 16) | tl,
            ((sh >> 2) << 16) | ((sh & 3) << 14),
            ((sl >> 2) << 16) | ((sl & 3) << 14),
            ((sh >> 2) << 16) | ((sh & 3) << 14),
            ((sl << 3) << 16) | (tl << 3),
            0,
            (0x200 >> ti_size) << 16,
            0x20,
            0x20,
        ];

        let ltlut = id == CMD_LOAD_TLUT;
        self.edgewalker_for_loads(&lew, ltlut, ltlut);
    }
}

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

//! Triangle and rectangle commands
//!
//! Every primitive is expanded into the 44-word edge data consumed by
//! [`Pipeline::edgewalker_for_prims`]. Triangles carry it directly, with
//! the shade, texture and depth blocks present or zeroed according to the
//! low three opcode bits. Rectangles synthesize it.

use super::super::render::EDGE_WORDS;
use super::super::types::*;
use super::super::Pipeline;
use super::{CMD_FILL_RECTANGLE, CMD_TEXTURE_RECTANGLE, CMD_TEXTURE_RECTANGLE_FLIP};

const EDGE_BLOCK: usize = 8;
const SHADE_BLOCK: usize = 16;
const TEXTURE_BLOCK: usize = 16;
const DEPTH_BLOCK: usize = 4;

/// Rectangle bounds from the first two command words
///
/// Fill and copy modes render whole scanlines, so the bottom edge is
/// extended to include the last line.
fn rect_edges(w0: u32, w1: u32, whole_lines: bool) -> [u32; 8] {
    let xl = (w0 >> 12) & 0xfff;
    let mut yl = w0 & 0xfff;
    let xh = (w1 >> 12) & 0xfff;
    let yh = w1 & 0xfff;

    if whole_lines {
        yl |= 3;
    }

    let xlint = (xl >> 2) & 0x3ff;
    let xhint = (xh >> 2) & 0x3ff;
    let left = (xlint << 16) | ((xl & 3) << 14);

    [
        yl,
        (yl << 16) | yh,
        left,
        0,
        (xhint << 16) | ((xh & 3) << 14),
        0,
        left,
        0,
    ]
}

impl Pipeline {
    fn renders_whole_lines(&self) -> bool {
        matches!(self.other_modes.cycle_type, CycleType::Fill | CycleType::Copy)
    }

    /// Triangles (0x08-0x0F)
    ///
    /// ```text
    /// bit 2: shade coefficients   (16 words)
    /// bit 1: texture coefficients (16 words)
    /// bit 0: depth coefficients   (4 words)
    /// ```
    pub(in crate::core::rdp) fn triangle(&mut self, id: u32, cmd: &[u32]) {
        let mut ew = [0u32; EDGE_WORDS];
        let mut src = 0;

        let blocks = [
            (true, 0, EDGE_BLOCK),
            (id & 4 != 0, 8, SHADE_BLOCK),
            (id & 2 != 0, 24, TEXTURE_BLOCK),
            (id & 1 != 0, 40, DEPTH_BLOCK),
        ];
        for (present, dst, len) in blocks {
            if present {
                ew[dst..dst + len].copy_from_slice(&cmd[src..src + len]);
                src += len;
            }
        }

        self.edgewalker_for_prims(&ew);
    }

    /// Texture_Rectangle (0x24) and Texture_Rectangle_Flip (0x25)
    ///
    /// ```text
    /// w0: xl(12-23) yl(0-11)   w1: tile(24-26) xh(12-23) yh(0-11)
    /// w2: s(16-31) t(0-15)     w3: dsdx(16-31) dtdy(0-15)
    /// ```
    ///
    /// The flipped form swaps the S and T gradients.
    pub(in crate::core::rdp) fn texture_rectangle(&mut self, cmd: &[u32], flip: bool) {
        let tilenum = (cmd[1] >> 24) & 7;
        let s = (cmd[2] >> 16) & 0xffff;
        let t = cmd[2] & 0xffff;
        let dsdx = sign16(((cmd[3] >> 16) & 0xffff) as i32);
        let dtdy = sign16((cmd[3] & 0xffff) as i32);

        let edges = rect_edges(cmd[0], cmd[1], self.renders_whole_lines());
        let opcode = if flip {
            CMD_TEXTURE_RECTANGLE_FLIP
        } else {
            CMD_TEXTURE_RECTANGLE
        };

        let mut ew = [0u32; EDGE_WORDS];
        ew[..8].copy_from_slice(&edges);
        ew[0] |= (opcode << 24) | ((0x80 | tilenum) << 16);
        ew[24] = (s << 16) | t;

        let (along_x, along_y) = if flip { (dtdy, dsdx) } else { (dsdx, dtdy) };
        let int_x = (along_x >> 5) as u32;
        let frac_x = (along_x & 0x1f) as u32;
        let int_y = (along_y >> 5) as u32;
        let frac_y = (along_y & 0x1f) as u32;

        if flip {
            // dT/dx in the low halves, dS/de and dS/dy in the high halves
            ew[26] = int_x & 0xffff;
            ew[30] = frac_x << 11;
            ew[32] = int_y << 16;
            ew[34] = int_y << 16;
            ew[36] = frac_y << 27;
            ew[38] = frac_y << 27;
        } else {
            ew[26] = int_x << 16;
            ew[30] = (frac_x << 11) << 16;
            ew[32] = int_y & 0xffff;
            ew[34] = int_y & 0xffff;
            ew[36] = frac_y << 11;
            ew[38] = frac_y << 11;
        }

        self.edgewalker_for_prims(&ew);
    }

    /// Fill_Rectangle (0x36)
    pub(in crate::core::rdp) fn fill_rectangle(&mut self, w0: u32, w1: u32) {
        let edges = rect_edges(w0, w1, self.renders_whole_lines());

        let mut ew = [0u32; EDGE_WORDS];
        ew[..8].copy_from_slice(&edges);
        ew[0] |= (CMD_FILL_RECTANGLE << 24) | (0x80 << 16);

        self.edgewalker_for_prims(&ew);
    }
}

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

//! TMEM loads
//!
//! Load_Block, Load_Tile and Load_TLUT share one pipeline: each span is a
//! row of the texture image, read 64 bits at a time and scattered into the
//! TMEM banks. YUV and 32-bit RGBA textures are split so that the high
//! half of TMEM holds the second half of each texel.

use super::super::types::*;
use super::super::Pipeline;
use crate::core::trace::TraceEntry;

const WORD_ADDR_XOR: u32 = 1;

/// How a 64-bit load is laid out in TMEM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TmemFormatting {
    /// Y bytes low, UV bytes high
    Yuv,
    /// RG halfwords low, BA halfwords high
    Rgba32,
    /// Plain 64-bit words
    Linear,
}

/// Replicate one halfword into all four lanes of a qword
#[inline(always)]
fn splat16(v: u32) -> u64 {
    let v = (v & 0xffff) as u64;
    (v << 48) | (v << 32) | (v << 16) | v
}

impl Pipeline {
    /// Run the load pipeline for spans `start..=end`
    pub(in crate::core::rdp) fn loading_pipeline(
        &mut self,
        start: i32,
        end: i32,
        tilenum: usize,
        coord_quad: bool,
        ltlut: bool,
    ) {
        if end > start && ltlut {
            log::debug!("TLUT load spans more than one line, RDP crashed");
            self.crash.crash();
            return;
        }

        let tile = self.tiles[tilenum];
        let formatting = if tile.format == FORMAT_YUV {
            TmemFormatting::Yuv
        } else if tile.format == FORMAT_RGBA && tile.size == PIXEL_SIZE_32BIT {
            TmemFormatting::Rgba32
        } else {
            TmemFormatting::Linear
        };

        let image = self.texture_image;
        let (tiadvance, spanadvance) = match image.size {
            PIXEL_SIZE_4BIT => {
                log::debug!("load from a 4-bit texture image, RDP crashed");
                self.crash.crash();
                return;
            }
            PIXEL_SIZE_8BIT => (8, 8),
            PIXEL_SIZE_16BIT if ltlut => (2, 1),
            PIXEL_SIZE_16BIT => (8, 4),
            _ => (8, 2),
        };

        let dsinc = self.sd.ds;
        let dtinc = self.sd.dt;

        for i in start..=end {
            let span = self.spans[i as usize];
            let mut s = span.s;
            let mut t = span.t;

            let ti_index = image.width.wrapping_mul(i as u32).wrapping_add(span.unscrx as u32);
            let mut tiptr = image.address.wrapping_add(pixels_to_bytes(ti_index, image.size));
            let length = (span.lx - span.unscrx + 1) & 0xfff;

            self.capture_load_source(tiptr, pixels_to_bytes(length as u32, image.size));

            let mut j = 0;
            while j < length {
                let (sss, sst) = self.tc_pipeline_load((s >> 16) & 0xffff, (t >> 16) & 0xffff, tilenum, coord_quad);
                let dswap = sst & 1 != 0;
                let group = self.get_tmem_idx(sss, sst, tilenum);

                let loadqword = self.read_load_qword(tiptr, ltlut);
                self.store_load_qword(loadqword, formatting, &group, dswap);

                s = s.wrapping_add(dsinc) & !0x1f;
                t = t.wrapping_add(dtinc) & !0x1f;
                tiptr = tiptr.wrapping_add(tiadvance);
                j += spanadvance;
            }
        }
    }

    /// Record the RDRAM a load is about to read when a trace is being captured
    fn capture_load_source(&mut self, tiptr: u32, bytes: u32) {
        let Some(capture) = self.capture.as_mut() else {
            return;
        };
        let index = (tiptr >> 2) & !1;
        let count = (bytes >> 2) + 4;
        let words = (0..count)
            .map(|k| self.rdram.read_idx32(index.wrapping_add(k)))
            .collect();
        capture.push(TraceEntry::Rdram { index, words });
    }

    /// 64 bits of texture image at byte address `tiptr`
    ///
    /// TLUT loads replicate the addressed halfword into every lane.
    fn read_load_qword(&self, tiptr: u32, ltlut: bool) -> u64 {
        let idx = (tiptr >> 2) & !1;
        let v: [u64; 4] = std::array::from_fn(|k| self.rdram.read_idx32(idx.wrapping_add(k as u32)) as u64);

        match tiptr & 7 {
            0 if ltlut => splat16((v[0] >> 16) as u32),
            0 => (v[0] << 32) | v[1],
            1 => (v[0] << 40) | (v[1] << 8) | (v[2] >> 24),
            2 if ltlut => splat16(v[0] as u32),
            2 => (v[0] << 48) | (v[1] << 16) | (v[2] >> 16),
            3 => (v[0] << 56) | (v[1] << 24) | (v[2] >> 8),
            4 if ltlut => splat16((v[1] >> 16) as u32),
            4 => (v[1] << 32) | v[2],
            5 => (v[1] << 40) | (v[2] << 8) | (v[3] >> 24),
            6 if ltlut => splat16(v[1] as u32),
            6 => (v[1] << 48) | (v[2] << 16) | (v[3] >> 16),
            _ => (v[1] << 56) | (v[2] << 24) | (v[3] >> 8),
        }
    }

    fn store_load_qword(&mut self, q: u64, formatting: TmemFormatting, group: &crate::core::rdp::texture::TmemGroup, dswap: bool) {
        let [idx0, idx1, idx2, idx3] = group.idx;

        let split = match formatting {
            TmemFormatting::Yuv => {
                let byte = |shift: u32| ((q >> shift) & 0xff) as u32;
                Some((
                    (byte(56) << 24) | (byte(40) << 16) | (byte(24) << 8) | byte(8),
                    (byte(48) << 24) | (byte(32) << 16) | (byte(16) << 8) | byte(0),
                ))
            }
            TmemFormatting::Rgba32 => Some((
                (((q >> 48) << 16) | ((q >> 16) & 0xffff)) as u32,
                ((((q >> 32) & 0xffff) << 16) | (q & 0xffff)) as u32,
            )),
            TmemFormatting::Linear => None,
        };

        if let Some((low, high)) = split {
            let (a, b) = if group.bit3flipped { (idx2, idx3) } else { (idx0, idx1) };
            self.set_tmem16(a ^ WORD_ADDR_XOR, (low >> 16) as u16);
            self.set_tmem16(b ^ WORD_ADDR_XOR, low as u16);
            self.set_tmem16((a | 0x400) ^ WORD_ADDR_XOR, (high >> 16) as u16);
            self.set_tmem16((b | 0x400) ^ WORD_ADDR_XOR, high as u16);
            return;
        }

        let hi = if group.hibit { 0x400 } else { 0 };
        let lanes = if !dswap {
            [q >> 48, q >> 32, q >> 16, q]
        } else {
            [q >> 16, q, q >> 48, q >> 32]
        };
        for (idx, lane) in [idx0, idx1, idx2, idx3].into_iter().zip(lanes) {
            self.set_tmem16((idx | hi) ^ WORD_ADDR_XOR, lane as u16);
        }
    }
}

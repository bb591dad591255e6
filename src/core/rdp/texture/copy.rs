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

//! Copy-mode TMEM access
//!
//! Copy mode reads 64 bits per clock straight out of the four TMEM banks.
//! Each bank serves one halfword, so the four sample addresses are routed to
//! banks by their low two bits before being reassembled in pixel order.

use super::super::types::*;
use super::super::Pipeline;

const WORD_ADDR_XOR: u32 = 1;

/// Pick the address among `idx` that falls into `bank`
#[inline(always)]
pub(in crate::core::rdp) fn sort_tmem_idx(idx: [u32; 4], bank: u32) -> u32 {
    idx.iter()
        .find(|&&i| i & 3 == bank)
        .map_or(0, |&i| i & 0x3ff)
}

/// TMEM halfword indices of a four-texel group, one per bank
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(in crate::core::rdp) struct TmemGroup {
    pub idx: [u32; 4],
    pub bit3flipped: bool,
    pub hibit: bool,
}

impl Pipeline {
    /// Bank-sorted halfword indices addressed by a load at (`s`, `t`)
    pub(in crate::core::rdp) fn get_tmem_idx(&self, s: i32, t: i32, tilenum: usize) -> TmemGroup {
        let tile = &self.tiles[tilenum];
        let tbase = ((tile.line.wrapping_mul(t) & 0x1ff) + tile.tmem) as u32;
        let s = s as u32;

        let sshorts = if tile.size == PIXEL_SIZE_8BIT || tile.format == FORMAT_YUV {
            s >> 1
        } else if tile.size >= PIXEL_SIZE_16BIT {
            s
        } else {
            s >> 2
        } & 0x7ff;

        let bit3flipped = ((sshorts & 2) != 0) ^ (t & 1 != 0);

        let a = ((tbase << 2).wrapping_add(sshorts)) & 0x7fd;
        let mut group = [a, (a + 1) & 0x7ff, (a + 2) & 0x7ff, (a + 3) & 0x7ff];
        let hibit = a & 0x400 != 0;

        if t & 1 != 0 {
            for idx in group.iter_mut() {
                *idx ^= 2;
            }
        }

        TmemGroup {
            idx: [
                sort_tmem_idx(group, 0),
                sort_tmem_idx(group, 1),
                sort_tmem_idx(group, 2),
                sort_tmem_idx(group, 3),
            ],
            bit3flipped,
            hibit,
        }
    }

    /// Palette index of a CI texel read in copy mode
    fn compute_color_index(&self, readshort: u32, nybbleoffset: u32, tilenum: usize) -> u32 {
        let tile = &self.tiles[tilenum];
        let (lownib, hinib) = if tile.size == PIXEL_SIZE_4BIT {
            ((nybbleoffset ^ 3) << 2, tile.palette as u32)
        } else {
            let lownib = ((nybbleoffset & 2) ^ 2) << 2;
            let hinib = if lownib != 0 {
                (readshort >> 12) & 0xf
            } else {
                (readshort >> 4) & 0xf
            };
            (lownib, hinib)
        };
        (hinib << 4) | ((readshort >> lownib) & 0xf)
    }

    /// Expand a sub-16-bit texel to the byte written by copy mode
    fn replicate_for_copy(&self, inshort: u32, nybbleoffset: u32, tilenum: usize, tformat: u32, tsize: u32) -> u32 {
        match tsize {
            PIXEL_SIZE_4BIT => {
                let nib = (inshort >> ((nybbleoffset ^ 3) << 2)) & 0xf;
                if tformat == FORMAT_CI {
                    ((self.tiles[tilenum].palette as u32) << 4) | nib
                } else if tformat == FORMAT_IA {
                    let byte = (nib << 4) | nib;
                    (byte & 0xe0) | ((byte & 0xe0) >> 3) | ((byte & 0xc0) >> 6)
                } else {
                    (nib << 4) | nib
                }
            }
            PIXEL_SIZE_8BIT => {
                let hishift = ((nybbleoffset ^ 3) | 1) << 2;
                if tformat == FORMAT_IA {
                    let nib = (inshort >> hishift) & 0xf;
                    (nib << 4) | nib
                } else {
                    let lownib = (inshort >> (hishift & !4)) & 0xf;
                    let hinib = (inshort >> hishift) & 0xf;
                    (hinib << 4) | lownib
                }
            }
            _ => (inshort >> 8) & 0xff,
        }
    }

    /// Gather the eight halfwords a copy clock can see for samples `s..s3` on row `t`
    fn read_tmem_copy(&self, s: [i32; 4], t: i32, tilenum: usize) -> ([u32; 8], [bool; 6], [u32; 6]) {
        let tile = &self.tiles[tilenum];
        let tbase = ((tile.line.wrapping_mul(t) & 0x1ff) + tile.tmem) as u32;

        let shift = if tile.size == PIXEL_SIZE_8BIT || tile.format == FORMAT_YUV {
            1
        } else if tile.size >= PIXEL_SIZE_16BIT {
            2
        } else {
            0
        };
        let sh: [u32; 4] = s.map(|v| ((v as u32) << shift) & 0x1fff);

        let tbase = tbase << 4;
        let mut tidx_a = tbase.wrapping_add(sh[0]) & 0x1fff;
        let mut tidx_bhi = tbase.wrapping_add(sh[1]) & 0x1fff;
        let mut tidx_c = tbase.wrapping_add(sh[2]) & 0x1fff;
        let mut tidx_dhi = tbase.wrapping_add(sh[3]) & 0x1fff;

        let (mut tidx_blow, mut tidx_dlow) = if tile.format == FORMAT_YUV {
            let delta = sh[1].wrapping_sub(sh[0]);
            let blow = tidx_a.wrapping_add(delta << 1) & 0x1fff;
            let dlow = blow.wrapping_add(sh[3]).wrapping_sub(sh[0]) & 0x1fff;
            (blow, dlow)
        } else {
            (tidx_bhi, tidx_dhi)
        };

        if t & 1 != 0 {
            tidx_a ^= 8;
            tidx_blow ^= 8;
            tidx_bhi ^= 8;
            tidx_c ^= 8;
            tidx_dlow ^= 8;
            tidx_dhi ^= 8;
        }

        let all = [tidx_a, tidx_blow, tidx_bhi, tidx_c, tidx_dlow, tidx_dhi];
        let hibits = all.map(|i| i & 0x1000 != 0);
        let lowbits = all.map(|i| i & 0xf);
        let [a, blow, bhi, c, dlow, dhi] = all.map(|i| i >> 2);

        let mut sortshort = [0u32; 8];
        let low_group = [a, blow, c, dlow];
        let shorts: [u32; 4] = [0, 1, 2, 3]
            .map(|bank| self.tmem16(sort_tmem_idx(low_group, bank) ^ WORD_ADDR_XOR) as u32);

        sortshort[0] = shorts[(lowbits[0] >> 2) as usize];
        sortshort[1] = shorts[(lowbits[1] >> 2) as usize];
        sortshort[2] = shorts[(lowbits[3] >> 2) as usize];
        sortshort[3] = shorts[(lowbits[4] >> 2) as usize];

        let high_idx: [u32; 4] = if self.other_modes.en_tlut {
            let ci = [
                self.compute_color_index(sortshort[0], lowbits[0] & 3, tilenum),
                self.compute_color_index(sortshort[1], lowbits[1] & 3, tilenum),
                self.compute_color_index(sortshort[2], lowbits[3] & 3, tilenum),
                self.compute_color_index(sortshort[3], lowbits[4] & 3, tilenum),
            ];
            [ci[0] << 2, (ci[1] << 2) | 1, (ci[2] << 2) | 2, (ci[3] << 2) | 3]
        } else {
            let high_group = [a, bhi, c, dhi];
            [0, 1, 2, 3].map(|bank| sort_tmem_idx(high_group, bank))
        };

        let shorts: [u32; 4] = high_idx.map(|i| self.tmem16((i | 0x400) ^ WORD_ADDR_XOR) as u32);

        if self.other_modes.en_tlut {
            sortshort[4..8].copy_from_slice(&shorts);
        } else {
            sortshort[4] = shorts[(lowbits[0] >> 2) as usize];
            sortshort[5] = shorts[(lowbits[2] >> 2) as usize];
            sortshort[6] = shorts[(lowbits[3] >> 2) as usize];
            sortshort[7] = shorts[(lowbits[5] >> 2) as usize];
        }

        (sortshort, hibits, lowbits)
    }

    /// One 64-bit copy-mode read: four texels starting at (`sss`, `sst`)
    ///
    /// Returns the (high, low) 32-bit halves. For 16-bit sources each half
    /// holds two texels; otherwise the high half holds four replicated bytes
    /// and the low half the raw halfwords of the last two samples.
    pub(in crate::core::rdp) fn fetch_qword_copy(&self, sss: i32, sst: i32, tilenum: usize) -> (u32, u32) {
        let (tformat, tsize) = if self.other_modes.en_tlut {
            let format = if self.other_modes.tlut_type { FORMAT_IA } else { FORMAT_RGBA };
            (format, PIXEL_SIZE_16BIT)
        } else {
            let tile = &self.tiles[tilenum];
            (tile.format, tile.size)
        };

        let (ss, st) = self.tc_pipeline_copy(sss, sst, tilenum);
        let (sortshort, hibits, lowbits) = self.read_tmem_copy(ss, st, tilenum);
        let largetex = tformat == FORMAT_YUV || (tformat == FORMAT_RGBA && tsize == PIXEL_SIZE_32BIT);

        let [shorta, shortb, shortc, shortd] = if self.other_modes.en_tlut {
            [sortshort[4], sortshort[5], sortshort[6], sortshort[7]]
        } else if largetex {
            [sortshort[0], sortshort[1], sortshort[2], sortshort[3]]
        } else {
            [
                if hibits[0] { sortshort[4] } else { sortshort[0] },
                if hibits[1] { sortshort[5] } else { sortshort[1] },
                if hibits[3] { sortshort[6] } else { sortshort[2] },
                if hibits[4] { sortshort[7] } else { sortshort[3] },
            ]
        };

        let lowdword = (shortc << 16) | shortd;
        let hidword = if tsize == PIXEL_SIZE_16BIT {
            (shorta << 16) | shortb
        } else {
            let rep = |short, lb: u32| self.replicate_for_copy(short, lb & 3, tilenum, tformat, tsize);
            (rep(shorta, lowbits[0]) << 24)
                | (rep(shortb, lowbits[1]) << 16)
                | (rep(shortc, lowbits[3]) << 8)
                | rep(shortd, lowbits[4])
        };

        (hidword, lowdword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_tmem_idx_routes_by_bank() {
        let group = [0x105, 0x106, 0x107, 0x108];
        assert_eq!(sort_tmem_idx(group, 0), 0x108);
        assert_eq!(sort_tmem_idx(group, 1), 0x105);
        assert_eq!(sort_tmem_idx(group, 3), 0x107);
        assert_eq!(sort_tmem_idx([1, 1, 1, 1], 2), 0);
    }
}

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

//! Texture unit
//!
//! Turns interpolated S/T/W into filtered texels: perspective divide, LOD,
//! shift/clamp/mask, TMEM fetch and the bilinear or YUV convert filter.
//! Copy mode and TMEM loads take their own reduced paths (`copy`).

mod coords;
mod copy;
mod fetch;
mod lod;

pub(in crate::core::rdp) use coords::trelative;
pub(in crate::core::rdp) use copy::TmemGroup;
pub(in crate::core::rdp) use lod::TexStep;

use super::tables::tables;
use super::types::*;
use super::Pipeline;

/// Bilinear interpolation of one channel within the lower or upper triangle
#[inline(always)]
fn bilerp(base: i32, frac_a: i32, a: i32, frac_b: i32, b: i32) -> i32 {
    base + ((frac_a * (a - base) + frac_b * (b - base) + 0x10) >> 5)
}

impl Pipeline {
    /// Perspective divide of the S/T pair by W
    ///
    /// Returns 17-bit coordinates with the over/underflow flags in bits 17-18.
    #[inline(always)]
    pub(in crate::core::rdp) fn tcdiv(&self, ss: i32, st: i32, sw: i32) -> (i32, i32) {
        if self.other_modes.persp_tex_en {
            tcdiv_persp(ss, st, sw)
        } else {
            tcdiv_nopersp(ss, st)
        }
    }

    /// Filtered texel for one pipeline cycle
    ///
    /// `prev` is the texel of the previous cycle and feeds the YUV convert
    /// path when `convert_one` is set.
    pub(in crate::core::rdp) fn texture_pipeline_cycle(
        &self,
        prev: &Color,
        sss: i32,
        sst: i32,
        tilenum: usize,
        cycle: usize,
    ) -> Color {
        let tile = &self.tiles[tilenum];
        let modes = &self.other_modes;
        let bilerp_en = if cycle != 0 { modes.bi_lerp1 } else { modes.bi_lerp0 };
        let convert = modes.convert_one && cycle != 0;

        let (sss1, sst1, maxs, maxt) = tile.shift_cycle(sss, sst);
        let sss1 = trelative(sss1, tile.sl);
        let sst1 = trelative(sst1, tile.tl);

        if !modes.sample_type {
            let (s, t) = tile.clamp_cycle_light(sss1, sst1, maxs, maxt);
            let (s, t) = tile.mask(s, t);
            let t0 = self.fetch_point(s, t, tilenum);

            return if bilerp_en {
                if !convert {
                    Color {
                        r: t0.r & 0x1ff,
                        g: t0.g & 0x1ff,
                        b: t0.b,
                        a: t0.a,
                    }
                } else {
                    Color::splat(prev.b)
                }
            } else {
                let t0 = if convert { *prev } else { t0 };
                self.yuv_convert(&t0)
            };
        }

        let mut sfrac = sss1 & 0x1f;
        let mut tfrac = sst1 & 0x1f;
        let (s0, t0) = tile.clamp_cycle(sss1, sst1, &mut sfrac, &mut tfrac, maxs, maxt);
        let s1 = if tile.format != FORMAT_YUV { s0 + 1 } else { s0 + 2 };
        let mut ss = [s0, s1];
        let mut tt = [t0, t0 + 1];
        tile.mask_coupled(&mut ss, &mut tt);

        if !bilerp_en {
            let t0 = self.fetch_point(ss[0], tt[0], tilenum);
            let t0 = if convert { *prev } else { t0 };
            return self.yuv_convert(&t0);
        }

        let [t0, t1, t2, t3] = self.fetch_texel_quadro(ss, tt, tilenum);
        let channels = |c: &Color| [c.r, c.g, c.b, c.a];
        let (c0, c1, c2, c3) = (channels(&t0), channels(&t1), channels(&t2), channels(&t3));
        let mut out = [0i32; 4];

        if !modes.mid_texel || sfrac != 0x10 || tfrac != 0x10 {
            let upper = (sfrac + tfrac) & 0x20 != 0;
            for i in 0..4 {
                out[i] = match (convert, upper) {
                    (false, true) => {
                        let invsf = 0x20 - sfrac;
                        let invtf = 0x20 - tfrac;
                        bilerp(c3[i], invsf, c2[i], invtf, c1[i])
                    }
                    (false, false) => bilerp(c0[i], sfrac, c1[i], tfrac, c2[i]),
                    (true, true) => {
                        prev.b
                            + ((prev.r * (c2[i] - c3[i]) + prev.g * (c1[i] - c3[i]) + 0x80) >> 8)
                    }
                    (true, false) => {
                        prev.b
                            + ((prev.r * (c1[i] - c0[i]) + prev.g * (c2[i] - c0[i]) + 0x80) >> 8)
                    }
                };
            }
        } else {
            // Mid-texel: average of all four samples
            for i in 0..4 {
                let inv_t0 = !c0[i];
                let corner = (inv_t0 + c3[i]) << 6;
                out[i] = if !convert {
                    let (sf, tf) = (sfrac << 2, tfrac << 2);
                    c0[i] + ((sf * (c1[i] - c0[i]) + tf * (c2[i] - c0[i]) + corner + 0xc0) >> 8)
                } else {
                    prev.b
                        + ((prev.r * (c1[i] - c0[i]) + prev.g * (c2[i] - c0[i]) + corner + 0xc0)
                            >> 8)
                };
            }
        }

        Color {
            r: out[0] & 0x1ff,
            g: out[1] & 0x1ff,
            b: out[2] & 0x1ff,
            a: out[3] & 0x1ff,
        }
    }

    #[inline(always)]
    fn fetch_point(&self, s: i32, t: i32, tilenum: usize) -> Color {
        if self.other_modes.en_tlut {
            self.fetch_texel_entlut(s, t, tilenum)
        } else {
            self.fetch_texel(s, t, tilenum)
        }
    }

    /// YUV to RGB with the Set_Convert coefficients
    #[inline(always)]
    fn yuv_convert(&self, t0: &Color) -> Color {
        Color {
            r: (t0.b + ((self.k0_tf * t0.g + 0x80) >> 8)) & 0x1ff,
            g: (t0.b + ((self.k1_tf * t0.r + self.k2_tf * t0.g + 0x80) >> 8)) & 0x1ff,
            b: (t0.b + ((self.k3_tf * t0.r + 0x80) >> 8)) & 0x1ff,
            a: t0.b & 0x1ff,
        }
    }
}

/// Divide S and T by W through the reciprocal table
pub(in crate::core::rdp) fn tcdiv_persp(ss: i32, st: i32, sw: i32) -> (i32, i32) {
    let w_carry = sign16(sw) <= 0;
    let sw = sw & 0x7fff;

    let entry = tables().tcdiv[sw as usize];
    let rcp = entry >> 4;
    let shift = entry & 0xf;

    let sprod = sign16(ss).wrapping_mul(rcp);
    let tprod = sign16(st).wrapping_mul(rcp);

    let tempmask = ((1i32 << 30) - 1) & -((1i32 << 29) >> shift);

    let resolve = |prod: i32| -> i32 {
        let oob = prod & tempmask;
        // The sign test reads the shifted product unless no shift happened
        let (temp, tested) = if shift != 0xe {
            let shifted = prod >> (13 - shift);
            (shifted, shifted)
        } else {
            (prod.wrapping_shl(1), prod)
        };
        let mut overunder = 0;
        if oob != tempmask && oob != 0 {
            overunder = if tested & (1 << 29) == 0 { 2 << 17 } else { 1 << 17 };
        }
        if w_carry {
            overunder |= 2 << 17;
        }
        (temp & 0x1ffff) | overunder
    };

    (resolve(sprod), resolve(tprod))
}

/// Affine path: the coordinates pass through unchanged
#[inline(always)]
pub(in crate::core::rdp) fn tcdiv_nopersp(ss: i32, st: i32) -> (i32, i32) {
    (sign16(ss) & 0x1ffff, sign16(st) & 0x1ffff)
}

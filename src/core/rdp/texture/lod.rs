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

//! Level of detail
//!
//! LOD is the larger of the texel-space distances to the neighbouring
//! pixel(s). From it the pipeline derives the mipmap tile(s) to sample and
//! the `lod_frac` blend factor fed to the combiner. Each span renderer walks
//! pixels in a different order, so each has its own way of picking the
//! neighbour samples.

#![allow(clippy::too_many_arguments)]

use super::super::tables::tables;
use super::super::types::{sign, SpanSigs};
use super::super::Pipeline;

/// Interpolated S/T/W of the current pixel and their per-pixel increments
#[derive(Debug, Clone, Copy, Default)]
pub(in crate::core::rdp) struct TexStep {
    pub s: i32,
    pub t: i32,
    pub w: i32,
    pub dsinc: i32,
    pub dtinc: i32,
    pub dwinc: i32,
}

impl TexStep {
    /// Integer S/T/W `steps` pixels away from the current one
    #[inline(always)]
    fn at(&self, steps: i32) -> (i32, i32, i32) {
        (
            self.s.wrapping_add(self.dsinc.wrapping_mul(steps)) >> 16,
            self.t.wrapping_add(self.dtinc.wrapping_mul(steps)) >> 16,
            self.w.wrapping_add(self.dwinc.wrapping_mul(steps)) >> 16,
        )
    }

    /// Same as [`TexStep::at`] but starting from another scanline's origin
    #[inline(always)]
    fn from_origin(&self, s: i32, t: i32, w: i32, steps: i32) -> (i32, i32, i32) {
        TexStep { s, t, w, ..*self }.at(steps)
    }
}

/// Outputs of the LOD tile/fraction logic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(in crate::core::rdp) struct LodSignals {
    pub l_tile: usize,
    pub magnify: bool,
    pub distant: bool,
    pub lod_frac: i32,
}

/// Saturate the 19-bit divide output to the 16-bit range used by LOD
#[inline(always)]
pub(in crate::core::rdp) fn tclod_tcclamp(sss: i32, sst: i32) -> (i32, i32) {
    let clamp = |v: i32| -> i32 {
        if v & 0x40000 != 0 {
            0x7fff
        } else if v & 0x20000 != 0 {
            0x8000
        } else {
            match v & 0x18000 {
                0x8000 => 0x7fff,
                0x10000 => 0x8000,
                _ => v & 0xffff,
            }
        }
    };
    (clamp(sss), clamp(sst))
}

/// Largest of the S/T deltas and `previous`, squeezed to 15 bits
#[inline(always)]
pub(in crate::core::rdp) fn tclod_4x17_to_15(scurr: i32, snext: i32, tcurr: i32, tnext: i32, previous: i32) -> i32 {
    let delta = |cur: i32, next: i32| {
        let d = sign(next, 17) - sign(cur, 17);
        if d & 0x20000 != 0 {
            !d & 0x1ffff
        } else {
            d
        }
    };
    let dels = delta(scurr, snext).max(delta(tcurr, tnext)).max(previous);
    let mut lod = dels & 0x7fff;
    if dels & 0x1c000 != 0 {
        lod |= 0x4000;
    }
    lod
}

#[inline(always)]
fn any_clamped(coords: &[i32]) -> bool {
    coords.iter().any(|c| c & 0x60000 != 0)
}

impl Pipeline {
    /// Tile offset, magnification and LOD fraction for `lod`
    pub(in crate::core::rdp) fn lodfrac_lodtile_signals(&self, lodclamp: bool, lod: i32) -> LodSignals {
        let modes = &self.other_modes;
        let filtered = modes.sharpen_tex_en || modes.detail_tex_en;

        if lod & 0x4000 != 0 || lodclamp {
            return LodSignals {
                l_tile: 7,
                magnify: false,
                distant: true,
                lod_frac: 0xff,
            };
        }

        if lod < self.min_level || lod < 32 {
            let distant = self.max_level == 0;
            let base = if lod < self.min_level { self.min_level } else { lod };
            let lod_frac = if !filtered {
                if distant {
                    0xff
                } else {
                    0
                }
            } else if modes.sharpen_tex_en {
                (base << 3) | 0x100
            } else {
                base << 3
            };
            return LodSignals {
                l_tile: 0,
                magnify: true,
                distant,
                lod_frac,
            };
        }

        let l_tile = tables().log2[((lod >> 5) & 0xff) as usize] as usize;
        let distant = if self.max_level != 0 {
            lod & 0x6000 != 0 || l_tile >= self.max_level as usize
        } else {
            true
        };
        let lod_frac = if !filtered && distant {
            0xff
        } else {
            ((lod << 3) >> l_tile) & 0xff
        };
        LodSignals {
            l_tile,
            magnify: false,
            distant,
            lod_frac,
        }
    }

    /// Tile for renderers that sample a single LOD level
    #[inline(always)]
    fn select_single_tile(&self, prim_tile: usize, sig: &LodSignals, t1: &mut usize) {
        if !self.other_modes.tex_lod_en {
            return;
        }
        let l_tile = if sig.distant { self.max_level as usize } else { sig.l_tile };
        *t1 = if !self.other_modes.detail_tex_en || sig.magnify {
            (prim_tile + l_tile) & 7
        } else {
            (prim_tile + l_tile + 1) & 7
        };
    }

    /// Tiles for renderers that sample two adjacent LOD levels
    #[inline(always)]
    fn select_tile_pair(&self, prim_tile: usize, sig: &LodSignals, t1: &mut usize, t2: &mut usize) {
        let modes = &self.other_modes;
        if !modes.tex_lod_en {
            return;
        }
        let l_tile = if sig.distant { self.max_level as usize } else { sig.l_tile };
        if !modes.detail_tex_en {
            *t1 = (prim_tile + l_tile) & 7;
            *t2 = if !(sig.distant || (!modes.sharpen_tex_en && sig.magnify)) {
                (*t1 + 1) & 7
            } else {
                *t1
            };
        } else {
            *t1 = if !sig.magnify {
                (prim_tile + l_tile + 1) & 7
            } else {
                (prim_tile + l_tile) & 7
            };
            *t2 = if !sig.distant && !sig.magnify {
                (prim_tile + l_tile + 2) & 7
            } else {
                (prim_tile + l_tile + 1) & 7
            };
        }
    }

    /// LOD against the next pixel and the same pixel on the next scanline
    fn lod_2cycle(&self, init: (i32, i32), next: (i32, i32), step: &TexStep) -> LodSignals {
        let (ys, yt, yw) = TexStep {
            dsinc: self.sd.dsdy,
            dtinc: self.sd.dtdy,
            dwinc: self.sd.dwdy,
            ..*step
        }
        .at(1);
        let (nextys, nextyt) = self.tcdiv(ys, yt, yw);

        let (inits, initt) = init;
        let (nexts, nextt) = next;
        let lodclamp = any_clamped(&[initt, nextt, inits, nexts, nextys, nextyt]);
        let mut lod = 0;
        if !lodclamp {
            lod = tclod_4x17_to_15(inits, nexts, initt, nextt, 0);
            lod = tclod_4x17_to_15(inits, nextys, initt, nextyt, lod);
        }
        self.lodfrac_lodtile_signals(lodclamp, lod)
    }

    #[inline(always)]
    fn next_pixel(&self, step: &TexStep) -> (i32, i32) {
        let (s, t, w) = step.at(1);
        self.tcdiv(s, t, w)
    }

    /// 2-cycle LOD when the next pixel's coordinates are already known
    pub(in crate::core::rdp) fn tclod_2cycle_current(
        &mut self,
        sss: &mut i32,
        sst: &mut i32,
        next: (i32, i32),
        step: &TexStep,
        prim_tile: usize,
        t1: &mut usize,
        t2: &mut usize,
    ) {
        let init = (*sss, *sst);
        (*sss, *sst) = tclod_tcclamp(*sss, *sst);
        if self.derivs.do_lod {
            let sig = self.lod_2cycle(init, next, step);
            self.lod_frac = sig.lod_frac;
            self.select_tile_pair(prim_tile, &sig, t1, t2);
        }
    }

    pub(in crate::core::rdp) fn tclod_2cycle_current_simple(
        &mut self,
        sss: &mut i32,
        sst: &mut i32,
        step: &TexStep,
        prim_tile: usize,
        t1: &mut usize,
        t2: &mut usize,
    ) {
        let init = (*sss, *sst);
        (*sss, *sst) = tclod_tcclamp(*sss, *sst);
        if self.derivs.do_lod {
            let next = self.next_pixel(step);
            let sig = self.lod_2cycle(init, next, step);
            self.lod_frac = sig.lod_frac;
            self.select_tile_pair(prim_tile, &sig, t1, t2);
        }
    }

    pub(in crate::core::rdp) fn tclod_2cycle_current_notexel1(
        &mut self,
        sss: &mut i32,
        sst: &mut i32,
        step: &TexStep,
        prim_tile: usize,
        t1: &mut usize,
    ) {
        let init = (*sss, *sst);
        (*sss, *sst) = tclod_tcclamp(*sss, *sst);
        if self.derivs.do_lod {
            let next = self.next_pixel(step);
            let sig = self.lod_2cycle(init, next, step);
            self.lod_frac = sig.lod_frac;
            self.select_single_tile(prim_tile, &sig, t1);
        }
    }

    /// 2-cycle LOD for the pipelined next pixel; the fraction goes to `prelodfrac`
    pub(in crate::core::rdp) fn tclod_2cycle_next(
        &self,
        sss: &mut i32,
        sst: &mut i32,
        step: &TexStep,
        prim_tile: usize,
        t1: &mut usize,
        t2: &mut usize,
        prelodfrac: &mut i32,
    ) {
        let init = (*sss, *sst);
        (*sss, *sst) = tclod_tcclamp(*sss, *sst);
        if self.derivs.do_lod {
            let next = self.next_pixel(step);
            let sig = self.lod_2cycle(init, next, step);
            *prelodfrac = sig.lod_frac;
            self.select_tile_pair(prim_tile, &sig, t1, t2);
        }
    }

    /// Far sample for 1-cycle LOD when the next scanline is not involved
    #[inline(always)]
    fn far_in_span(step: &TexStep, sigs: &SpanSigs) -> (i32, i32, i32) {
        if !(sigs.preendspan && sigs.longspan) && !(sigs.endspan && sigs.midspan) {
            step.at(2)
        } else {
            step.at(-1)
        }
    }

    #[inline(always)]
    fn lod_1cycle(&self, next: (i32, i32), far: (i32, i32, i32)) -> LodSignals {
        let (fars, fart) = self.tcdiv(far.0, far.1, far.2);
        let (nexts, nextt) = next;
        let lodclamp = any_clamped(&[fart, nextt, fars, nexts]);
        let lod = if !lodclamp {
            tclod_4x17_to_15(nexts, fars, nextt, fart, 0)
        } else {
            0
        };
        self.lodfrac_lodtile_signals(lodclamp, lod)
    }

    /// 1-cycle LOD when the next pixel's coordinates are already known
    pub(in crate::core::rdp) fn tclod_1cycle_current(
        &mut self,
        sss: &mut i32,
        sst: &mut i32,
        next: (i32, i32),
        step: &TexStep,
        scanline: usize,
        prim_tile: usize,
        t1: &mut usize,
        sigs: &SpanSigs,
    ) {
        (*sss, *sst) = tclod_tcclamp(*sss, *sst);
        if !self.derivs.do_lod {
            return;
        }

        let nextspan = self.spans[scanline + 1];
        let far = if nextspan.validline {
            if !sigs.endspan || !sigs.longspan {
                Self::far_in_span(step, sigs)
            } else {
                step.from_origin(nextspan.s, nextspan.t, nextspan.w, 1)
            }
        } else {
            step.at(2)
        };

        let sig = self.lod_1cycle(next, far);
        self.lod_frac = sig.lod_frac;
        self.select_single_tile(prim_tile, &sig, t1);
    }

    pub(in crate::core::rdp) fn tclod_1cycle_current_simple(
        &mut self,
        sss: &mut i32,
        sst: &mut i32,
        step: &TexStep,
        scanline: usize,
        prim_tile: usize,
        t1: &mut usize,
        sigs: &SpanSigs,
    ) {
        (*sss, *sst) = tclod_tcclamp(*sss, *sst);
        if !self.derivs.do_lod {
            return;
        }

        let nextspan = self.spans[scanline + 1];
        let (next, far) = if nextspan.validline {
            if !sigs.endspan || !sigs.longspan {
                (step.at(1), Self::far_in_span(step, sigs))
            } else {
                (
                    step.from_origin(nextspan.s, nextspan.t, nextspan.w, 0),
                    step.from_origin(nextspan.s, nextspan.t, nextspan.w, 1),
                )
            }
        } else {
            (step.at(1), step.at(2))
        };

        let next = self.tcdiv(next.0, next.1, next.2);
        let sig = self.lod_1cycle(next, far);
        self.lod_frac = sig.lod_frac;
        self.select_single_tile(prim_tile, &sig, t1);
    }

    /// 1-cycle LOD for the pipelined next pixel; the fraction goes to `prelodfrac`
    pub(in crate::core::rdp) fn tclod_1cycle_next(
        &self,
        sss: &mut i32,
        sst: &mut i32,
        step: &TexStep,
        scanline: usize,
        prim_tile: usize,
        t1: &mut usize,
        sigs: &SpanSigs,
        prelodfrac: &mut i32,
    ) {
        (*sss, *sst) = tclod_tcclamp(*sss, *sst);
        if !self.derivs.do_lod {
            return;
        }

        let nextspan = self.spans[scanline + 1];
        let origin = |steps| step.from_origin(nextspan.s, nextspan.t, nextspan.w, steps);
        let (next, far) = if !nextspan.validline {
            (step.at(1), step.at(2))
        } else if !sigs.nextspan {
            if !sigs.endspan || !sigs.longspan {
                (step.at(1), Self::far_in_span(step, sigs))
            } else {
                (origin(0), origin(1))
            }
        } else if sigs.longspan {
            (origin(1), origin(2))
        } else if sigs.midspan {
            (origin(0), origin(1))
        } else if sigs.onelessthanmid {
            (step.at(1), step.at(-1))
        } else {
            (step.at(1), step.at(2))
        };

        let next = self.tcdiv(next.0, next.1, next.2);
        let sig = self.lod_1cycle(next, far);
        *prelodfrac = sig.lod_frac;
        self.select_single_tile(prim_tile, &sig, t1);
    }

    /// Copy-mode tile selection; only gated by `tex_lod_en`
    pub(in crate::core::rdp) fn tclod_copy(
        &self,
        sss: &mut i32,
        sst: &mut i32,
        step: &TexStep,
        prim_tile: usize,
        t1: &mut usize,
    ) {
        (*sss, *sst) = tclod_tcclamp(*sss, *sst);
        if !self.other_modes.tex_lod_en {
            return;
        }

        let (nexts, nextt) = self.next_pixel(step);
        let far = step.at(2);
        let (fars, fart) = self.tcdiv(far.0, far.1, far.2);
        let lodclamp = any_clamped(&[fart, nextt, fars, nexts]);
        let lod = if !lodclamp {
            tclod_4x17_to_15(nexts, fars, nextt, fart, 0)
        } else {
            0
        };

        let max_level = self.max_level as usize;
        let (magnify, l_tile) = if lod & 0x4000 != 0 || lodclamp {
            (false, max_level)
        } else if lod < 32 {
            (true, 0)
        } else {
            let l_tile = tables().log2[((lod >> 5) & 0xff) as usize] as usize;
            let distant = max_level == 0 || lod & 0x6000 != 0 || l_tile >= max_level;
            (false, if distant { max_level } else { l_tile })
        };

        *t1 = if !self.other_modes.detail_tex_en || magnify {
            (prim_tile + l_tile) & 7
        } else {
            (prim_tile + l_tile + 1) & 7
        };
    }

    /// Coordinates of texel 1 in the 1-cycle complete renderer
    pub(in crate::core::rdp) fn get_texel1_1cycle(&self, step: &TexStep, scanline: usize, sigs: &SpanSigs) -> (i32, i32) {
        let nextspan = self.spans[scanline + 1];
        let (s, t, w) = if !sigs.endspan || !sigs.longspan || !nextspan.validline {
            step.at(1)
        } else {
            step.from_origin(nextspan.s, nextspan.t, nextspan.w, 0)
        };
        self.tcdiv(s, t, w)
    }

    /// Coordinates of the pipelined next texel 0 in 2-cycle mode
    pub(in crate::core::rdp) fn get_nexttexel0_2cycle(&self, step: &TexStep) -> (i32, i32) {
        self.next_pixel(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tcclamp_saturates_out_of_range() {
        assert_eq!(tclod_tcclamp(0x40000, 0x20000), (0x7fff, 0x8000));
        assert_eq!(tclod_tcclamp(0x8000, 0x10000), (0x7fff, 0x8000));
        assert_eq!(tclod_tcclamp(0x1234, 0x18000), (0x1234, 0x8000));
    }

    #[test]
    fn test_4x17_takes_largest_delta() {
        assert_eq!(tclod_4x17_to_15(0, 0x40, 0, 0x10, 0), 0x40);
        assert_eq!(tclod_4x17_to_15(0, 0x40, 0, 0x10, 0x80), 0x80);
        // Negative deltas are folded to their magnitude minus one
        assert_eq!(tclod_4x17_to_15(0x40, 0, 0, 0, 0), 0x3f);
        // Large deltas set the overflow flag
        assert_eq!(tclod_4x17_to_15(0, 0x4000, 0, 0, 0) & 0x4000, 0x4000);
    }
}

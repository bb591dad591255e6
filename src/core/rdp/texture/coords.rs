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

//! Texture coordinate stages: shift, clamp and mask/mirror
//!
//! Coordinates arrive here as S10.5 values produced by the perspective
//! divide. The shift stage applies the tile's power-of-two scale, the clamp
//! stage converts to texel units relative to the tile origin, and the mask
//! stage wraps or mirrors inside the tile.

use super::super::tables::tables;
use super::super::types::{sign16, Tile};
use super::super::Pipeline;

/// Apply a tile shift amount to one coordinate
#[inline(always)]
fn shift_coord(coord: i32, shifter: i32) -> i32 {
    if shifter < 11 {
        sign16(coord) >> shifter
    } else {
        sign16(coord.wrapping_shl((16 - shifter) as u32))
    }
}

/// Mirror and mask one coordinate
#[inline(always)]
fn mask_coord(coord: i32, mask: i32, mirror: bool, threshold: i32) -> i32 {
    let mut coord = coord;
    if mirror {
        let wrap = (coord >> threshold) & 1;
        coord ^= -wrap;
    }
    coord & tables().maskbits[mask as usize]
}

/// Clamp one coordinate, returning it in texel units
///
/// `frac` is zeroed whenever the coordinate is pinned to an edge.
#[inline(always)]
fn clamp_coord(coord: i32, clampen: bool, max: bool, diff: i32, frac: &mut i32) -> i32 {
    if !clampen {
        coord >> 5
    } else if max {
        *frac = 0;
        diff
    } else if coord & 0x10000 == 0 {
        coord >> 5
    } else {
        *frac = 0;
        0
    }
}

impl Tile {
    /// Mask stage for a single sample
    #[inline(always)]
    pub(in crate::core::rdp) fn mask(&self, s: i32, t: i32) -> (i32, i32) {
        let s = if self.mask_s != 0 {
            mask_coord(s, self.mask_s, self.ms, self.f.masksclamped)
        } else {
            s
        };
        let t = if self.mask_t != 0 {
            mask_coord(t, self.mask_t, self.mt, self.f.masktclamped)
        } else {
            t
        };
        (s, t)
    }

    /// Mask stage for the 2x2 bilinear footprint
    #[inline(always)]
    pub(in crate::core::rdp) fn mask_coupled(&self, s: &mut [i32; 2], t: &mut [i32; 2]) {
        if self.mask_s != 0 {
            for v in s.iter_mut() {
                *v = mask_coord(*v, self.mask_s, self.ms, self.f.masksclamped);
            }
        }
        if self.mask_t != 0 {
            for v in t.iter_mut() {
                *v = mask_coord(*v, self.mask_t, self.mt, self.f.masktclamped);
            }
        }
    }

    /// Mask stage for the four horizontally adjacent samples of a copy
    #[inline(always)]
    pub(in crate::core::rdp) fn mask_copy(&self, s: &mut [i32; 4], t: &mut i32) {
        if self.mask_s != 0 {
            for v in s.iter_mut() {
                *v = mask_coord(*v, self.mask_s, self.ms, self.f.masksclamped);
            }
        }
        if self.mask_t != 0 {
            *t = mask_coord(*t, self.mask_t, self.mt, self.f.masktclamped);
        }
    }

    /// Shift stage, also reporting whether each coordinate passed the tile end
    #[inline(always)]
    pub(in crate::core::rdp) fn shift_cycle(&self, s: i32, t: i32) -> (i32, i32, bool, bool) {
        let s = shift_coord(s, self.shift_s);
        let t = shift_coord(t, self.shift_t);
        (s, t, (s >> 3) >= self.sh, (t >> 3) >= self.th)
    }

    /// Shift stage used by copy mode
    #[inline(always)]
    pub(in crate::core::rdp) fn shift_copy(&self, s: i32, t: i32) -> (i32, i32) {
        (shift_coord(s, self.shift_s), shift_coord(t, self.shift_t))
    }

    /// Clamp stage of the filtered path
    #[inline(always)]
    pub(in crate::core::rdp) fn clamp_cycle(
        &self,
        s: i32,
        t: i32,
        sfrac: &mut i32,
        tfrac: &mut i32,
        maxs: bool,
        maxt: bool,
    ) -> (i32, i32) {
        (
            clamp_coord(s, self.f.clampens, maxs, self.f.clampdiffs, sfrac),
            clamp_coord(t, self.f.clampent, maxt, self.f.clampdifft, tfrac),
        )
    }

    /// Clamp stage of the point-sampled path
    #[inline(always)]
    pub(in crate::core::rdp) fn clamp_cycle_light(
        &self,
        s: i32,
        t: i32,
        maxs: bool,
        maxt: bool,
    ) -> (i32, i32) {
        let mut unused = 0;
        (
            clamp_coord(s, self.f.clampens, maxs, self.f.clampdiffs, &mut unused),
            clamp_coord(t, self.f.clampent, maxt, self.f.clampdifft, &mut unused),
        )
    }
}

/// Coordinate relative to a tile origin in 10.2 fixed point
#[inline(always)]
pub(in crate::core::rdp) fn trelative(coord: i32, origin: i32) -> i32 {
    coord.wrapping_sub(origin << 3)
}

impl Pipeline {
    /// Copy-mode coordinate pipeline: four adjacent S samples and one T
    pub(in crate::core::rdp) fn tc_pipeline_copy(&self, s: i32, t: i32, tilenum: usize) -> ([i32; 4], i32) {
        let tile = &self.tiles[tilenum];
        let (s0, t0) = tile.shift_copy(s, t);
        let s0 = trelative(s0, tile.sl) >> 5;
        let mut t0 = trelative(t0, tile.tl) >> 5;
        let mut ss = [s0, s0 + 1, s0 + 2, s0 + 3];
        tile.mask_copy(&mut ss, &mut t0);
        (ss, t0)
    }

    /// Load-mode coordinate pipeline
    ///
    /// Block and TLUT loads keep two extra fraction bits (`coord_quad`).
    pub(in crate::core::rdp) fn tc_pipeline_load(&self, s: i32, t: i32, tilenum: usize, coord_quad: bool) -> (i32, i32) {
        let tile = &self.tiles[tilenum];
        let s = trelative(sign16(s), tile.sl);
        let t = trelative(sign16(t), tile.tl);
        if coord_quad {
            (s >> 3, t >> 3)
        } else {
            (s >> 5, t >> 5)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_flips_odd_repeats() {
        let mut tile = Tile {
            mask_s: 3,
            ms: true,
            ..Tile::default()
        };
        tile.update_derivs();
        assert_eq!(tile.mask(5, 0).0, 5);
        assert_eq!(tile.mask(9, 0).0, 6);
    }

    #[test]
    fn test_shift_left_for_large_shift_values() {
        let tile = Tile {
            shift_s: 15,
            ..Tile::default()
        };
        assert_eq!(tile.shift_copy(0x10, 0).0, 0x20);
    }

    #[test]
    fn test_clamp_pins_to_tile_edge() {
        let mut tile = Tile {
            cs: true,
            sh: 7 << 2,
            ..Tile::default()
        };
        tile.update_clamp_diffs();
        tile.update_derivs();
        let mut sfrac = 0x1f;
        let mut tfrac = 0;
        let (s, _) = tile.clamp_cycle(9 << 5, 0, &mut sfrac, &mut tfrac, true, false);
        assert_eq!(s, 7);
        assert_eq!(sfrac, 0);

        let (s, _) = tile.clamp_cycle_light(0x10000, 0, false, false);
        assert_eq!(s, 0);
    }
}

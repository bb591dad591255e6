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

//! Depth buffer
//!
//! Depth is stored as a 14-bit floating point value (3-bit exponent,
//! 11-bit mantissa) plus a 4-bit log2 of the depth slope split between the
//! low two bits of the halfword and its two hidden bits.

use super::super::tables::tables;
use super::super::types::ZMode;
use super::super::Pipeline;

/// Largest representable depth
const Z_MAX: u32 = 0x3ffff;

/// 4-bit log2 encoding of a 16-bit power-of-two depth slope
#[inline(always)]
pub(in crate::core::rdp) fn dz_compress(value: u32) -> u32 {
    let mut j = 0;
    if value & 0xff00 != 0 {
        j |= 8;
    }
    if value & 0xf0f0 != 0 {
        j |= 4;
    }
    if value & 0xcccc != 0 {
        j |= 2;
    }
    if value & 0xaaaa != 0 {
        j |= 1;
    }
    j
}

#[inline(always)]
pub(in crate::core::rdp) fn dz_decompress(compressed: u32) -> u32 {
    1 << compressed
}

/// 18-bit depth of a stored 16-bit depth word
#[inline(always)]
pub(in crate::core::rdp) fn z_decompress(zb: u32) -> u32 {
    tables().z_complete_dec[((zb >> 2) & 0x3fff) as usize]
}

/// Round a depth slope sum up to a power of two
pub(in crate::core::rdp) fn normalize_dzpix(sum: i32) -> i32 {
    if sum & 0xc000 != 0 {
        return 0x8000;
    }
    if sum & 0xffff == 0 {
        return 1;
    }
    if sum == 1 {
        return 3;
    }
    let mut count = 0x2000;
    while count > 0 {
        if sum & count != 0 {
            return count << 1;
        }
        count >>= 1;
    }
    0
}

/// Outcome of the depth test for one pixel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(in crate::core::rdp) struct DepthTest {
    /// Pixel survives
    pub pass: bool,
    /// Blender should mix with memory
    pub blend_en: bool,
    /// Coverage overflowed when added to memory coverage
    pub prewrap: bool,
}

#[inline(always)]
fn blender_shifts(pixel: i32, memory: i32) -> (i32, i32) {
    ((pixel - memory).clamp(0, 4), (memory - pixel).clamp(0, 4))
}

impl Pipeline {
    /// Store depth `z` and slope `dzpixenc` at depth buffer index `zcurpixel`
    pub(in crate::core::rdp) fn z_store(&self, zcurpixel: u32, z: u32, dzpixenc: u32) {
        let zval = tables().z_com[(z & Z_MAX) as usize] | (dzpixenc >> 2) as u16;
        self.rdram.pair_write16(zcurpixel, zval, (dzpixenc & 3) as u8);
    }

    /// Depth test of `sz` against the depth buffer at `zcurpixel`
    ///
    /// Also updates the blender shifters and, in interpenetrating mode,
    /// scales `cvg` by how far the surfaces are apart.
    pub(in crate::core::rdp) fn z_compare(
        &mut self,
        zcurpixel: u32,
        sz: u32,
        dzpix: u32,
        dzpixenc: u32,
        cvg: &mut u32,
        memcvg: u32,
    ) -> DepthTest {
        let modes = self.other_modes;
        let real_shifters = self.derivs.real_blender_shifters;
        let interpixel_shifters = self.derivs.interpixel_blender_shifters;
        let enc = dzpixenc as i32;

        if !modes.z_compare_en {
            let shiftb = if dzpixenc < 0xb { 4 } else { 0xf - enc };
            if real_shifters {
                self.blshifta = 0;
                self.blshiftb = shiftb;
            }
            if interpixel_shifters {
                self.pastblshifta = 0;
                self.pastblshiftb = shiftb;
            }
            self.pastrawdzmem = 0xf;

            let overflow = (memcvg + *cvg) & 8 != 0;
            return DepthTest {
                pass: true,
                blend_en: modes.force_blend || (!overflow && modes.antialias_en),
                prewrap: overflow,
            };
        }

        let t = tables();
        let sz = sz & Z_MAX;
        let (zval, hval) = self.rdram.pair_read16(zcurpixel);
        let zval = zval as u32;
        let oz = z_decompress(zval);
        let rawdzmem = (((zval & 3) << 2) | hval as u32) as i32;
        let mut dzmem = dz_decompress(rawdzmem as u32);

        if real_shifters {
            (self.blshifta, self.blshiftb) = blender_shifts(enc, rawdzmem);
        }
        if interpixel_shifters {
            (self.pastblshifta, self.pastblshiftb) = blender_shifts(enc, self.pastrawdzmem);
        }
        self.pastrawdzmem = rawdzmem;

        let mut force_coplanar = false;
        let precision_factor = (zval >> 13) & 0xf;
        if precision_factor < 3 {
            if dzmem != 0x8000 {
                let modifier = 16 >> precision_factor;
                dzmem <<= 1;
                if dzmem < modifier {
                    dzmem = modifier;
                }
            } else {
                force_coplanar = true;
                dzmem = 0xffff;
            }
        }

        let dznotshift = t.deltaz_comparator[((dzpix | dzmem) & 0xffff) as usize] as u32;
        let dznew = dznotshift << 3;

        let farther = force_coplanar || sz + dznew >= oz;
        let overflow = (memcvg + *cvg) & 8 != 0;
        let blend_en = modes.force_blend || (!overflow && modes.antialias_en && farther);

        let infront = sz < oz;
        let max = oz == Z_MAX;
        let nearer = force_coplanar || (sz as i32 - dznew as i32) <= oz as i32;

        let pass = match modes.z_mode {
            ZMode::Opaque => max || if overflow { infront } else { nearer },
            ZMode::Interpenetrating => {
                if !infront || !farther || !overflow {
                    max || if overflow { infront } else { nearer }
                } else {
                    let dzenc = dz_compress(dznotshift & 0xffff);
                    let cvgcoeff = ((oz >> dzenc).wrapping_sub(sz >> dzenc)) & 0xf;
                    *cvg = ((cvgcoeff * *cvg) >> 3) & 0xf;
                    true
                }
            }
            ZMode::Transparent => infront || max,
            ZMode::Decal => farther && nearer && !max,
        };

        DepthTest {
            pass,
            blend_en,
            prewrap: overflow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dz_compress_is_log2_of_powers() {
        for k in 0..16 {
            assert_eq!(dz_compress(dz_decompress(k)), k);
        }
    }

    #[test]
    fn test_normalize_dzpix() {
        assert_eq!(normalize_dzpix(0), 1);
        assert_eq!(normalize_dzpix(1), 3);
        assert_eq!(normalize_dzpix(2), 4);
        assert_eq!(normalize_dzpix(3), 4);
        assert_eq!(normalize_dzpix(0x1234), 0x2000);
        assert_eq!(normalize_dzpix(0x4000), 0x8000);
    }
}

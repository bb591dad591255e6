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

//! Copy cycle renderer
//!
//! Copies 64 bits of TMEM per step straight to the color image. Only 8-bit
//! and 16-bit targets receive data; a 4-bit target is walked but written
//! with zeroes, and a 32-bit target crashes the pipeline.

use super::super::crash::CrashWarning;
use super::super::types::*;
use super::super::Pipeline;
use super::TexStep;

/// Byte offset of pixel `pix`, with 4-bit images addressed per byte
#[inline(always)]
fn copy_pixels_to_bytes(pix: u32, size: u32) -> u32 {
    if size == PIXEL_SIZE_4BIT {
        pix
    } else {
        pixels_to_bytes(pix, size)
    }
}

/// Rotate an 8-bit threshold right by `n` bits
#[inline(always)]
fn rotate_threshold(threshold: i32, n: u32) -> i32 {
    ((threshold << (8 - n)) | (threshold >> n)) & 0xff
}

impl Pipeline {
    pub(in crate::core::rdp) fn render_spans_copy(&mut self, start: i32, end: i32, tilenum: usize, flip: bool) {
        let size = self.color_image.size;
        if size == PIXEL_SIZE_32BIT {
            self.crash.crash_with_warning(
                CrashWarning::CopyStrange,
                "copy cycle into a 32-bit color image, RDP crashed",
            );
            return;
        }

        let prim_tile = tilenum;
        let mut tile1 = tilenum;

        let (dsinc, dtinc, dwinc, xinc) = if flip {
            (self.sd.ds, self.sd.dt, self.sd.dw, 1i32)
        } else {
            (self.sd.ds.wrapping_neg(), self.sd.dt.wrapping_neg(), self.sd.dw.wrapping_neg(), -1)
        };

        let fbadvance = if size == PIXEL_SIZE_4BIT { 8 } else { 16 >> size };
        let bytesperpixel: i32 = if size == PIXEL_SIZE_4BIT { 1 } else { 1 << (size - 1) };
        let fbptr_advance: i32 = if flip { 8 } else { -8 };
        let image = self.color_image;

        for i in start..=end {
            let span = self.spans[i as usize];
            if !span.validline {
                continue;
            }
            self.seed_line(i as usize);

            let mut s = span.s;
            let mut t = span.t;
            let mut w = span.w;

            let row = image.width.wrapping_mul(i as u32);
            let mut fbptr = image
                .address
                .wrapping_add(copy_pixels_to_bytes(row.wrapping_add(span.rx as u32), size));
            let fbendptr = image
                .address
                .wrapping_add(copy_pixels_to_bytes(row.wrapping_add(span.lx as u32), size));
            let length = if flip { span.lx - span.rx } else { span.rx - span.lx };

            let mut j = 0;
            while j <= length {
                let (mut sss, mut sst) = self.tcdiv(s >> 16, t >> 16, w >> 16);
                let step = TexStep {
                    s,
                    t,
                    w,
                    dsinc,
                    dtinc,
                    dwinc,
                };
                self.tclod_copy(&mut sss, &mut sst, &step, prim_tile, &mut tile1);

                let (hi, lo) = self.fetch_qword_copy(sss, sst, tile1);
                let copyqword = if size == PIXEL_SIZE_16BIT || size == PIXEL_SIZE_8BIT {
                    ((hi as u64) << 32) | lo as u64
                } else {
                    0
                };

                let alphamask = self.copy_alpha_mask(copyqword, size);

                let remaining = if flip {
                    fbendptr.wrapping_sub(fbptr) as i32
                } else {
                    fbptr.wrapping_sub(fbendptr) as i32
                };
                let mut copywmask = remaining.wrapping_add(bytesperpixel).min(8);

                let mut addr = fbptr;
                let mut k = 7i32;
                while copywmask > 0 {
                    let byte = ((copyqword >> (k << 3)) & 0xff) as u8;
                    if alphamask & (1 << k) != 0 {
                        let hidden = if byte & 1 != 0 { 3 } else { 0 };
                        self.rdram.pair_write8(addr, byte, hidden);
                    }
                    k -= 1;
                    addr = addr.wrapping_add(xinc as u32);
                    copywmask -= 1;
                }

                s = s.wrapping_add(dsinc);
                t = t.wrapping_add(dtinc);
                w = w.wrapping_add(dwinc);
                fbptr = fbptr.wrapping_add(fbptr_advance as u32);
                j += fbadvance;
            }
        }
    }

    /// Per-byte write enables from the alpha compare
    ///
    /// 16-bit copies test bit 0 of each texel. 8-bit copies compare the low
    /// four texels against the blend alpha, or against a random threshold
    /// rotated per texel when alpha dithering is on.
    fn copy_alpha_mask(&mut self, copyqword: u64, size: u32) -> u32 {
        if !self.other_modes.alpha_compare_en {
            return 0xff;
        }

        match size {
            PIXEL_SIZE_16BIT => {
                let bit = |shift: u32| (copyqword >> shift) & 1 != 0;
                let mut mask = 0;
                if bit(48) {
                    mask |= 0xc0;
                }
                if bit(32) {
                    mask |= 0x30;
                }
                if bit(16) {
                    mask |= 0x0c;
                }
                if bit(0) {
                    mask |= 0x03;
                }
                mask
            }
            PIXEL_SIZE_8BIT => {
                let dithered = self.other_modes.dither_alpha_en;
                let threshold = if dithered { self.irand() & 0xff } else { self.blend_color.a };
                let thresholds = if dithered {
                    [
                        threshold,
                        rotate_threshold(threshold, 2),
                        rotate_threshold(threshold, 4),
                        rotate_threshold(threshold, 6),
                    ]
                } else {
                    [threshold; 4]
                };

                [(24u32, 0xc0u32), (16, 0x30), (8, 0x0c), (0, 0x03)]
                    .into_iter()
                    .zip(thresholds)
                    .filter(|&((shift, _), th)| ((copyqword >> shift) & 0xff) as i32 >= th)
                    .fold(0, |mask, ((_, bits), _)| mask | bits)
            }
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_threshold_matches_byte_rotation() {
        assert_eq!(rotate_threshold(0x81, 2), 0x60);
        assert_eq!(rotate_threshold(0x81, 4), 0x18);
        assert_eq!(rotate_threshold(0x81, 6), 0x06);
        assert_eq!(rotate_threshold(0xff, 6), 0xff);
    }

    #[test]
    fn test_copy_addressing_for_4bit_is_per_byte() {
        assert_eq!(copy_pixels_to_bytes(10, PIXEL_SIZE_4BIT), 10);
        assert_eq!(copy_pixels_to_bytes(10, PIXEL_SIZE_16BIT), 20);
    }
}

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

//! Color image access
//!
//! Reads and writes of the color image in each pixel size, including the
//! coverage value stored in the low color bits and the hidden bits.

use super::super::crash::CrashWarning;
use super::super::tables::tables;
use super::super::types::*;
use super::super::Pipeline;

/// Expand an RGBA5551 pixel to 8-bit channels
#[inline(always)]
fn rgba5551(word: u16) -> (i32, i32, i32) {
    let rep = &tables().replicated_rgba;
    let w = word as usize;
    (rep[(w >> 11) & 0x1f], rep[(w >> 6) & 0x1f], rep[(w >> 1) & 0x1f])
}

impl Pipeline {
    /// Read the color image pixel `curpixel`
    ///
    /// Returns the memory color and its stored coverage.
    pub(in crate::core::rdp) fn fbread(&self, curpixel: u32) -> (Color, u32) {
        let image = &self.color_image;
        let rdram = &self.rdram;
        let read_en = self.other_modes.image_read_en;

        match image.size {
            PIXEL_SIZE_4BIT => (
                Color {
                    r: 0,
                    g: 0,
                    b: 0,
                    a: 0xe0,
                },
                7,
            ),
            PIXEL_SIZE_8BIT => {
                let mem = rdram.read_addr8(image.address.wrapping_add(curpixel)) as i32;
                (Color { r: mem, g: mem, b: mem, a: 0xe0 }, 7)
            }
            PIXEL_SIZE_16BIT => {
                let addr = (image.address >> 1).wrapping_add(curpixel);
                let (word, hidden) = if read_en {
                    rdram.pair_read16(addr)
                } else {
                    (rdram.read_idx16(addr), 0)
                };

                let (r, g, b, lowbits) = if image.format == FORMAT_RGBA {
                    let (r, g, b) = rgba5551(word);
                    (r, g, b, (((word & 1) as u32) << 2) | hidden as u32)
                } else {
                    let i = (word >> 8) as i32;
                    (i, i, i, ((word >> 5) & 7) as u32)
                };

                if read_en {
                    (Color { r, g, b, a: (lowbits << 5) as i32 }, lowbits)
                } else {
                    (Color { r, g, b, a: 0xe0 }, 7)
                }
            }
            _ => {
                let mem = rdram.read_idx32((image.address >> 2).wrapping_add(curpixel));
                let r = ((mem >> 24) & 0xff) as i32;
                let g = ((mem >> 16) & 0xff) as i32;
                let b = ((mem >> 8) & 0xff) as i32;
                if read_en {
                    (Color { r, g, b, a: (mem & 0xe0) as i32 }, (mem >> 5) & 7)
                } else {
                    (Color { r, g, b, a: 0xe0 }, 7)
                }
            }
        }
    }

    /// Read `curpixel` into the memory color register
    pub(in crate::core::rdp) fn fbread1(&mut self, curpixel: u32) -> u32 {
        let (color, memcvg) = self.fbread(curpixel);
        self.memory = color;
        memcvg
    }

    /// Read `curpixel` into the prefetched memory color used by 2-cycle mode
    pub(in crate::core::rdp) fn fbread2(&mut self, curpixel: u32) -> u32 {
        let (color, memcvg) = self.fbread(curpixel);
        self.pre_memory = color;
        memcvg
    }

    /// Coverage value written back with the pixel
    pub(in crate::core::rdp) fn finalize_spanalpha(&self, blend_en: bool, cvg: u32, memcvg: u32) -> u32 {
        match self.other_modes.cvg_dest {
            CvgDest::Clamp => {
                let v = if blend_en {
                    cvg.wrapping_add(memcvg)
                } else {
                    cvg.wrapping_sub(1)
                };
                if v & 8 != 0 {
                    7
                } else {
                    v & 7
                }
            }
            CvgDest::Wrap => (cvg + memcvg) & 7,
            CvgDest::Zap => 7,
            CvgDest::Save => memcvg,
        }
    }

    /// Write a blended pixel
    pub(in crate::core::rdp) fn fbwrite(
        &self,
        curpixel: u32,
        (r, g, b): (i32, i32, i32),
        blend_en: bool,
        cvg: u32,
        memcvg: u32,
    ) {
        let image = &self.color_image;
        let rdram = &self.rdram;
        let (r, g, b) = (r as u32, g as u32, b as u32);

        match image.size {
            PIXEL_SIZE_4BIT => rdram.write_addr8(image.address.wrapping_add(curpixel), 0),
            PIXEL_SIZE_8BIT => {
                let hidden = if r & 1 != 0 { 3 } else { 0 };
                rdram.pair_write8(image.address.wrapping_add(curpixel), r as u8, hidden);
            }
            PIXEL_SIZE_16BIT => {
                let mut finalcvg = self.finalize_spanalpha(blend_en, cvg, memcvg);
                let color = if image.format == FORMAT_RGBA {
                    ((r & !7) << 8) | ((g & !7) << 3) | ((b & !7) >> 2)
                } else {
                    let c = (r << 8) | (finalcvg << 5);
                    finalcvg = 0;
                    c
                };
                let value = (color | (finalcvg >> 2)) as u16;
                rdram.pair_write16(
                    (image.address >> 1).wrapping_add(curpixel),
                    value,
                    (finalcvg & 3) as u8,
                );
            }
            _ => {
                let finalcvg = self.finalize_spanalpha(blend_en, cvg, memcvg);
                let value = (r << 24) | (g << 16) | (b << 8) | (finalcvg << 5);
                let hidden_hi = if g & 1 != 0 { 3 } else { 0 };
                rdram.pair_write32((image.address >> 2).wrapping_add(curpixel), value, hidden_hi, 0);
            }
        }
    }

    /// Write the fill color to `curpixel`
    ///
    /// Filling a 4-bit image is not possible on hardware and crashes the
    /// pipeline.
    pub(in crate::core::rdp) fn fbfill(&self, curpixel: u32) {
        let image = &self.color_image;
        let rdram = &self.rdram;
        let fill = self.fill_color;

        match image.size {
            PIXEL_SIZE_4BIT => {
                self.crash.crash_with_warning(
                    CrashWarning::FillCrash,
                    "fill cycle into a 4-bit color image, RDP crashed",
                );
            }
            PIXEL_SIZE_8BIT => {
                let addr = image.address.wrapping_add(curpixel);
                let value = (fill >> (((addr & 3) ^ 3) << 3)) & 0xff;
                let hidden = (((value & 1) << 1) | (value & 1)) as u8;
                rdram.pair_write8(addr, value as u8, hidden);
            }
            PIXEL_SIZE_16BIT => {
                let idx = (image.address >> 1).wrapping_add(curpixel);
                let value = if idx & 1 != 0 { fill & 0xffff } else { fill >> 16 };
                let hidden = (((value & 1) << 1) | (value & 1)) as u8;
                rdram.pair_write16(idx, value as u16, hidden);
            }
            _ => {
                let hidden_hi = if fill & 0x10000 != 0 { 3 } else { 0 };
                let hidden_lo = if fill & 1 != 0 { 3 } else { 0 };
                rdram.pair_write32((image.address >> 2).wrapping_add(curpixel), fill, hidden_hi, hidden_lo);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::memory::Rdram;
    use crate::core::rdp::crash::CrashLatch;
    use std::sync::Arc;

    fn pipeline(size: u32) -> Pipeline {
        let rdram = Arc::new(Rdram::new(0x1000).unwrap());
        let mut p = Pipeline::new(rdram, Arc::new(CrashLatch::new()));
        p.color_image = ImageDesc {
            format: FORMAT_RGBA,
            size,
            width: 32,
            address: 0x100,
        };
        p
    }

    #[test]
    fn test_finalize_spanalpha_modes() {
        let mut p = pipeline(PIXEL_SIZE_16BIT);
        assert_eq!(p.finalize_spanalpha(false, 8, 7), 7);
        assert_eq!(p.finalize_spanalpha(false, 0, 7), 7);
        assert_eq!(p.finalize_spanalpha(true, 3, 2), 5);
        p.other_modes.cvg_dest = CvgDest::Wrap;
        assert_eq!(p.finalize_spanalpha(true, 7, 3), 2);
        p.other_modes.cvg_dest = CvgDest::Zap;
        assert_eq!(p.finalize_spanalpha(true, 0, 0), 7);
        p.other_modes.cvg_dest = CvgDest::Save;
        assert_eq!(p.finalize_spanalpha(true, 1, 4), 4);
    }

    #[test]
    fn test_rgba16_write_read_back() {
        let mut p = pipeline(PIXEL_SIZE_16BIT);
        p.fbwrite(3, (0xf8, 0x80, 0x08), false, 8, 7);
        let word = p.rdram.read_idx16((0x100 >> 1) + 3);
        assert_eq!(word, 0xfc03);
        assert_eq!(p.rdram.hidden((0x100 >> 1) + 3), 3);

        p.other_modes.image_read_en = true;
        let (color, memcvg) = p.fbread(3);
        assert_eq!((color.r, color.g, color.b), (0xff, 0x84, 0x08));
        assert_eq!(memcvg, 7);
        assert_eq!(color.a, 0xe0);
    }

    #[test]
    fn test_fill_16bit_alternates_halves() {
        let mut p = pipeline(PIXEL_SIZE_16BIT);
        p.fill_color = 0xaaaa_5555;
        p.fbfill(0);
        p.fbfill(1);
        assert_eq!(p.rdram.read_idx32(0x100 >> 2), 0xaaaa_5555);
        assert_eq!(p.rdram.hidden(0x100 >> 1), 0);
        assert_eq!(p.rdram.hidden((0x100 >> 1) + 1), 3);
    }

    #[test]
    fn test_fill_4bit_crashes() {
        let p = pipeline(PIXEL_SIZE_4BIT);
        p.fbfill(0);
        assert!(p.crash.is_crashed());
        assert!(p.crash.has_warned(CrashWarning::FillCrash));
    }
}

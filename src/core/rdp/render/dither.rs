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

//! Dither values and per-pixel shade correction

use super::super::tables::{tables, BAYER_MATRIX, MAGIC_MATRIX};
use super::super::types::NoiseMode;
use super::super::Pipeline;

impl Pipeline {
    /// Color and alpha dither values for pixel (`x`, `y`)
    ///
    /// Returns `(cdith, adith)`. In complete noise mode this also refreshes
    /// the combiner noise input.
    pub(in crate::core::rdp) fn dither_noise(&mut self, x: i32, y: i32) -> (i32, i32) {
        match self.derivs.noise {
            NoiseMode::Nothing => return (7, 0),
            NoiseMode::Complete => self.noise = ((self.irand() & 7) << 6) | 0x20,
            NoiseMode::DitherOnly => {}
        }

        let index = (((y & 3) << 2) | (x & 3)) as usize;
        let magic = MAGIC_MATRIX[index];
        let bayer = BAYER_MATRIX[index];
        let noise_alpha = (self.noise >> 6) & 7;

        let cdith = match self.derivs.rgb_alpha_dither >> 2 {
            0 => magic,
            1 => bayer,
            2 => self.irand(),
            _ => 7,
        };
        let adith = match self.derivs.rgb_alpha_dither {
            0 => magic,
            4 => bayer,
            8 => magic,
            12 => bayer,
            1 | 5 => !cdith & 7,
            9 => !magic & 7,
            13 => !bayer & 7,
            v if v & 3 == 2 => noise_alpha,
            _ => 0,
        };
        (cdith, adith)
    }

    /// Subpixel-corrected shade color and depth for the current pixel
    ///
    /// Partially covered pixels sample the shade at the first covered
    /// sub-sample (`offx`, `offy`) instead of the pixel corner. Updates the
    /// shade register and returns the 18-bit depth.
    pub(in crate::core::rdp) fn rgbaz_correct_clip(
        &mut self,
        (offx, offy): (i32, i32),
        (r, g, b, a): (i32, i32, i32, i32),
        z: i32,
        cvg: u32,
    ) -> i32 {
        let sd = &self.sd;
        let (r, g, b, a, sz) = if cvg == 8 {
            (r >> 2, g >> 2, b >> 2, a >> 2, z >> 3)
        } else {
            let summand = |c: i32, dy: i32| offx.wrapping_mul(c).wrapping_add(offy.wrapping_mul(dy));
            (
                ((r << 2) + summand(sd.cdr, sd.drdy)) >> 4,
                ((g << 2) + summand(sd.cdg, sd.dgdy)) >> 4,
                ((b << 2) + summand(sd.cdb, sd.dbdy)) >> 4,
                ((a << 2) + summand(sd.cda, sd.dady)) >> 4,
                ((z << 2).wrapping_add(summand(sd.cdz, sd.dzdy))) >> 5,
            )
        };

        let clamp9 = &tables().clamp9;
        self.shade.r = clamp9[(r & 0x1ff) as usize];
        self.shade.g = clamp9[(g & 0x1ff) as usize];
        self.shade.b = clamp9[(b & 0x1ff) as usize];
        self.shade.a = clamp9[(a & 0x1ff) as usize];

        match (sz & 0x60000) >> 17 {
            0 | 1 => sz & 0x3ffff,
            2 => 0x3ffff,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::memory::Rdram;
    use crate::core::rdp::crash::CrashLatch;
    use std::sync::Arc;

    fn pipeline() -> Pipeline {
        let rdram = Arc::new(Rdram::new(0x1000).unwrap());
        Pipeline::new(rdram, Arc::new(CrashLatch::new()))
    }

    #[test]
    fn test_magic_square_dither() {
        let mut p = pipeline();
        p.derivs.noise = NoiseMode::DitherOnly;
        p.derivs.rgb_alpha_dither = 0;
        assert_eq!(p.dither_noise(1, 0), (6, 6));
        assert_eq!(p.dither_noise(3, 3), (0, 0));
    }

    #[test]
    fn test_bayer_with_inverted_alpha() {
        let mut p = pipeline();
        p.derivs.noise = NoiseMode::DitherOnly;
        p.derivs.rgb_alpha_dither = 5;
        assert_eq!(p.dither_noise(1, 0), (4, 3));
    }

    #[test]
    fn test_no_dither() {
        let mut p = pipeline();
        p.derivs.noise = NoiseMode::Nothing;
        assert_eq!(p.dither_noise(2, 2), (7, 0));
    }

    #[test]
    fn test_noise_mode_sets_noise_input() {
        let mut p = pipeline();
        p.derivs.noise = NoiseMode::Complete;
        p.derivs.rgb_alpha_dither = 0xe;
        let (cdith, adith) = p.dither_noise(0, 0);
        assert_eq!(cdith, 7);
        assert_eq!(p.noise & 0x3f, 0x20);
        assert_eq!(adith, (p.noise >> 6) & 7);
    }

    #[test]
    fn test_full_coverage_takes_pixel_corner() {
        let mut p = pipeline();
        let z = p.rgbaz_correct_clip((0, 0), (0x40 << 2, 0x80 << 2, 0x3fc, 0), 0x1000 << 3, 8);
        assert_eq!((p.shade.r, p.shade.g, p.shade.b, p.shade.a), (0x40, 0x80, 0xff, 0));
        assert_eq!(z, 0x1000);
    }
}

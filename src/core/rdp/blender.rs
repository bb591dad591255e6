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

//! Blender
//!
//! Mixes the combiner output with memory, fog or the blend color:
//! `(P * A + M * B) / (A + B)`. Runs after the alpha compare and coverage
//! tests, and applies the RGB dither on the way out.

use super::tables::tables;
use super::types::*;
use super::Pipeline;

impl Pipeline {
    fn blend_color_input(&self, input: BlendColorInput) -> (i32, i32, i32) {
        let c = match input {
            BlendColorInput::Pixel => &self.pixel,
            BlendColorInput::BlendedPixel => &self.blended_pixel,
            BlendColorInput::Memory => &self.memory,
            BlendColorInput::BlendColor => &self.blend_color,
            BlendColorInput::Fog => &self.fog_color,
        };
        (c.r, c.g, c.b)
    }

    fn blend_alpha1(&self, cycle: usize) -> i32 {
        match self.blender[cycle].alpha1 {
            BlendAlphaInput::PixelAlpha => self.pixel.a,
            BlendAlphaInput::FogAlpha => self.fog_color.a,
            BlendAlphaInput::ShadeAlpha => self.shade.a,
            _ => 0,
        }
    }

    fn blend_alpha2(&self, cycle: usize) -> i32 {
        match self.blender[cycle].alpha2 {
            BlendAlphaInput::InvPixelAlpha => !self.blend_alpha1(cycle) & 0xff,
            BlendAlphaInput::MemoryAlpha => self.memory.a,
            BlendAlphaInput::One => 0xff,
            _ => 0,
        }
    }

    /// Alpha compare against the blend color alpha or a random threshold
    pub(in crate::core::rdp) fn alpha_compare(&mut self, alpha: i32) -> bool {
        if !self.other_modes.alpha_compare_en {
            return true;
        }
        let threshold = if self.other_modes.dither_alpha_en {
            self.irand() & 0xff
        } else {
            self.blend_color.a
        };
        alpha >= threshold
    }

    /// Weighted blend of cycle `cycle`
    ///
    /// `shifts` are the blender shifters applied when the second weight is
    /// memory alpha. With `normalize` the sum is divided by `A + B` unless
    /// force_blend is set.
    fn blend_equation(&self, cycle: usize, shifts: (i32, i32), normalize: bool) -> (i32, i32, i32) {
        let special = if cycle == 0 {
            self.derivs.special_bsel0
        } else {
            self.derivs.special_bsel1
        };
        let mut blend1a = self.blend_alpha1(cycle) >> 3;
        let mut blend2a = self.blend_alpha2(cycle) >> 3;
        if special {
            blend1a = (blend1a >> shifts.0) & 0x3c;
            blend2a = (blend2a >> shifts.1) | 3;
        }
        let mulb = blend2a + 1;

        let p = self.blend_color_input(self.blender[cycle].color1);
        let m = self.blend_color_input(self.blender[cycle].color2);
        let blr = p.0 * blend1a + m.0 * mulb;
        let blg = p.1 * blend1a + m.1 * mulb;
        let blb = p.2 * blend1a + m.2 * mulb;

        if normalize && !self.other_modes.force_blend {
            let bldiv = &tables().bldiv;
            let sum = (((blend1a & !3) + (blend2a & !3) + 4) << 9) as usize;
            let div = |v: i32| bldiv[sum | ((v >> 2) & 0x7ff) as usize] as i32;
            (div(blr), div(blg), div(blb))
        } else {
            ((blr >> 5) & 0xff, (blg >> 5) & 0xff, (blb >> 5) & 0xff)
        }
    }

    /// Ordered/random dither of an 8-bit color down to 5 bits per channel
    pub(in crate::core::rdp) fn rgb_dither(&self, rgb: (i32, i32, i32), dith: i32) -> (i32, i32, i32) {
        if !self.derivs.rgb_dither {
            return rgb;
        }

        let (rcomp, gcomp, bcomp) = if self.other_modes.rgb_dither_sel != 2 {
            (dith, dith, dith)
        } else {
            (dith & 7, (dith >> 3) & 7, (dith >> 6) & 7)
        };

        let channel = |v: i32, comp: i32| {
            let rounded = if v > 247 { 255 } else { (v & 0xf8) + 8 };
            let replace = (comp - (v & 7)) >> 31;
            v + ((rounded - v) & replace)
        };

        (channel(rgb.0, rcomp), channel(rgb.1, gcomp), channel(rgb.2, bcomp))
    }

    /// One-cycle blend; `None` when the pixel is rejected
    pub(in crate::core::rdp) fn blender_1cycle(
        &mut self,
        dith: i32,
        blend_en: bool,
        prewrap: bool,
        cvg: u32,
        cvbit: u32,
    ) -> Option<(i32, i32, i32)> {
        if !self.alpha_compare(self.pixel.a) {
            return None;
        }
        let covered = if self.other_modes.antialias_en { cvg } else { cvbit };
        if covered == 0 {
            return None;
        }

        let rgb = if !self.other_modes.color_on_cvg || prewrap {
            let dontblend = self.derivs.partial_reject_1cycle && self.pixel.a >= 0xff;
            if !blend_en || dontblend {
                self.blend_color_input(self.blender[0].color1)
            } else {
                self.blend_equation(0, (self.blshifta, self.blshiftb), true)
            }
        } else {
            self.blend_color_input(self.blender[0].color2)
        };

        Some(self.rgb_dither(rgb, dith))
    }

    /// Two-cycle blend
    ///
    /// Cycle 0 always blends without normalization into the blended pixel
    /// register; cycle 1 then behaves like the one-cycle blender. The memory
    /// color is advanced from the prefetched value whether or not the pixel
    /// survives.
    pub(in crate::core::rdp) fn blender_2cycle(
        &mut self,
        dith: i32,
        blend_en: bool,
        prewrap: bool,
        cvg: u32,
        cvbit: u32,
        acalpha: i32,
    ) -> Option<(i32, i32, i32)> {
        let covered = if self.other_modes.antialias_en { cvg } else { cvbit };
        if !self.alpha_compare(acalpha) || covered == 0 {
            self.memory = self.pre_memory;
            return None;
        }

        let (r, g, b) = self.blend_equation(0, (self.pastblshifta, self.pastblshiftb), false);
        self.memory = self.pre_memory;
        self.blended_pixel = Color {
            r,
            g,
            b,
            a: self.pixel.a,
        };

        let rgb = if !self.other_modes.color_on_cvg || prewrap {
            let dontblend = self.derivs.partial_reject_2cycle && self.pixel.a >= 0xff;
            if !blend_en || dontblend {
                self.blend_color_input(self.blender[1].color1)
            } else {
                self.blend_equation(1, (self.blshifta, self.blshiftb), true)
            }
        } else {
            self.blend_color_input(self.blender[1].color2)
        };

        Some(self.rgb_dither(rgb, dith))
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
        let mut p = Pipeline::new(rdram, Arc::new(CrashLatch::new()));
        p.derivs.rgb_dither = false;
        p
    }

    #[test]
    fn test_unblended_pixel_passes_through() {
        let mut p = pipeline();
        p.pixel = Color {
            r: 10,
            g: 20,
            b: 30,
            a: 0xff,
        };
        let out = p.blender_1cycle(0, false, true, 8, 1);
        assert_eq!(out, Some((10, 20, 30)));
    }

    #[test]
    fn test_pixel_over_memory_blend_weights() {
        let mut p = pipeline();
        // P * alpha + M * (1 - alpha)
        p.blender[0] = BlenderCycle::decode(0, 0, 0, 1, 0);
        p.pixel = Color {
            r: 0xff,
            g: 0,
            b: 0x80,
            a: 0xff,
        };
        p.memory = Color::default();
        let (r, g, b) = p.blend_equation(0, (0, 0), false);
        assert_eq!((r, g), (0xf7, 0));
        assert!(b > 0x78 && b <= 0x80);

        p.pixel.a = 0;
        p.memory = Color::splat(0x40);
        let (r, _, _) = p.blend_equation(0, (0, 0), false);
        assert_eq!(r, 0x40);
    }

    #[test]
    fn test_zero_coverage_rejects() {
        let mut p = pipeline();
        p.other_modes.antialias_en = true;
        assert_eq!(p.blender_1cycle(0, false, true, 0, 1), None);
    }

    #[test]
    fn test_alpha_compare_threshold() {
        let mut p = pipeline();
        p.other_modes.alpha_compare_en = true;
        p.blend_color.a = 0x80;
        assert!(!p.alpha_compare(0x7f));
        assert!(p.alpha_compare(0x80));
    }

    #[test]
    fn test_rgb_dither_rounds_up_above_threshold() {
        let mut p = pipeline();
        p.derivs.rgb_dither = true;
        assert_eq!(p.rgb_dither((0x11, 0x10, 0xfb), 0), (0x18, 0x10, 0xff));
        assert_eq!(p.rgb_dither((0x11, 0x10, 0xfb), 7), (0x11, 0x10, 0xfb));
    }
}

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

//! Color combiner
//!
//! Evaluates `(A - B) * C + D` per channel on 9-bit signed inputs with a
//! 17-bit intermediate, then derives the pixel alpha from coverage, keying
//! and alpha dither. Two-cycle mode chains cycle 0 into cycle 1 through the
//! combined color register.

use super::tables::tables;
use super::types::*;
use super::Pipeline;

/// Combiner constant one
const ONE: i32 = 0x100;

#[inline(always)]
fn color_equation(a: i32, b: i32, c: i32, d: i32) -> i32 {
    let t = tables();
    let a = t.ext9[(a & 0x1ff) as usize];
    let b = t.ext9[(b & 0x1ff) as usize];
    let c = signf(c, 9);
    let d = t.ext9[(d & 0x1ff) as usize];
    ((a - b).wrapping_mul(c) + (d << 8) + 0x80) & 0x1ffff
}

#[inline(always)]
fn alpha_equation(a: i32, b: i32, c: i32, d: i32) -> i32 {
    let t = tables();
    let a = t.ext9[(a & 0x1ff) as usize];
    let b = t.ext9[(b & 0x1ff) as usize];
    let c = signf(c, 9);
    let d = t.ext9[(d & 0x1ff) as usize];
    (((a - b).wrapping_mul(c) + (d << 8) + 0x80) >> 8) & 0x1ff
}

/// Distance of one channel from the key center, scaled by the key width
#[inline(always)]
fn key_distance(combined: i32, width: i32) -> i32 {
    let key = sign(combined, 17);
    if key >= 0 {
        (width << 4) - key
    } else {
        (width << 4) + key
    }
}

impl Pipeline {
    /// Current value of an RGB combiner input
    fn rgb_input(&self, input: RgbInput) -> (i32, i32, i32) {
        let rgb = |c: &Color| (c.r, c.g, c.b);
        let splat = |v: i32| (v, v, v);
        match input {
            RgbInput::Combined => rgb(&self.combined),
            RgbInput::Texel0 => rgb(&self.texel0),
            RgbInput::Texel1 => rgb(&self.texel1),
            RgbInput::Prim => rgb(&self.prim_color),
            RgbInput::Shade => rgb(&self.shade),
            RgbInput::Env => rgb(&self.env_color),
            RgbInput::One => splat(ONE),
            RgbInput::Noise => splat(self.noise),
            RgbInput::KeyCenter => rgb(&self.key_center),
            RgbInput::KeyScale => rgb(&self.key_scale),
            RgbInput::K4 => splat(self.k4),
            RgbInput::K5 => splat(self.k5),
            RgbInput::CombinedAlpha => splat(self.combined.a),
            RgbInput::Texel0Alpha => splat(self.texel0.a),
            RgbInput::Texel1Alpha => splat(self.texel1.a),
            RgbInput::PrimAlpha => splat(self.prim_color.a),
            RgbInput::ShadeAlpha => splat(self.shade.a),
            RgbInput::EnvAlpha => splat(self.env_color.a),
            RgbInput::LodFrac => splat(self.lod_frac),
            RgbInput::PrimLodFrac => splat(self.prim_lod_frac),
            RgbInput::Zero => splat(0),
        }
    }

    /// Current value of an alpha combiner input
    fn alpha_input(&self, input: AlphaInput) -> i32 {
        match input {
            AlphaInput::Combined => self.combined.a,
            AlphaInput::Texel0 => self.texel0.a,
            AlphaInput::Texel1 => self.texel1.a,
            AlphaInput::Prim => self.prim_color.a,
            AlphaInput::Shade => self.shade.a,
            AlphaInput::Env => self.env_color.a,
            AlphaInput::One => ONE,
            AlphaInput::LodFrac => self.lod_frac,
            AlphaInput::PrimLodFrac => self.prim_lod_frac,
            AlphaInput::Zero => 0,
        }
    }

    /// Run one combiner cycle into `self.combined`
    ///
    /// RGB is left in 17-bit precision; alpha is 9 bits.
    fn combine_cycle(&mut self, cycle: usize) {
        let cc = self.combiner[cycle];

        self.combined = if cc.rgb_mul != RgbInput::Zero {
            let a = self.rgb_input(cc.rgb_sub_a);
            let b = self.rgb_input(cc.rgb_sub_b);
            let c = self.rgb_input(cc.rgb_mul);
            let d = self.rgb_input(cc.rgb_add);
            Color {
                r: color_equation(a.0, b.0, c.0, d.0),
                g: color_equation(a.1, b.1, c.1, d.1),
                b: color_equation(a.2, b.2, c.2, d.2),
                a: self.combined.a,
            }
        } else {
            let ext9 = &tables().ext9;
            let d = self.rgb_input(cc.rgb_add);
            let add = |v: i32| ((ext9[(v & 0x1ff) as usize] << 8) + 0x80) & 0x1ffff;
            Color {
                r: add(d.0),
                g: add(d.1),
                b: add(d.2),
                a: self.combined.a,
            }
        };

        self.combined.a = if cc.alpha_mul != AlphaInput::Zero {
            alpha_equation(
                self.alpha_input(cc.alpha_sub_a),
                self.alpha_input(cc.alpha_sub_b),
                self.alpha_input(cc.alpha_mul),
                self.alpha_input(cc.alpha_add),
            )
        } else {
            tables().ext9[(self.alpha_input(cc.alpha_add) & 0x1ff) as usize] & 0x1ff
        };
    }

    /// Chroma key alpha of the 17-bit combined color
    fn key_alpha(&self) -> i32 {
        let red = key_distance(self.combined.r, self.key_width.r);
        let green = key_distance(self.combined.g, self.key_width.g);
        let blue = key_distance(self.combined.b, self.key_width.b);
        red.min(green).min(blue).clamp(0, 0xff)
    }

    /// Final cycle: clamp to 8-bit pixel color, apply keying and coverage alpha
    fn finish_pixel(&mut self, adseed: i32, cvg: &mut u32, chromabypass: (i32, i32, i32)) {
        let clamp9 = &tables().clamp9;

        if !self.other_modes.key_en {
            self.combined.r >>= 8;
            self.combined.g >>= 8;
            self.combined.b >>= 8;
            self.pixel.r = clamp9[(self.combined.r & 0x1ff) as usize];
            self.pixel.g = clamp9[(self.combined.g & 0x1ff) as usize];
            self.pixel.b = clamp9[(self.combined.b & 0x1ff) as usize];
        } else {
            self.keyalpha = self.key_alpha();
            self.pixel.r = clamp9[(chromabypass.0 & 0x1ff) as usize];
            self.pixel.g = clamp9[(chromabypass.1 & 0x1ff) as usize];
            self.pixel.b = clamp9[(chromabypass.2 & 0x1ff) as usize];
            self.combined.r >>= 8;
            self.combined.g >>= 8;
            self.combined.b >>= 8;
        }

        self.pixel.a = clamp9[(self.combined.a & 0x1ff) as usize];
        if self.pixel.a == 0xff {
            self.pixel.a = 0x100;
        }

        self.pixel.a = self.coverage_alpha(self.pixel.a, adseed, cvg, true);

        self.shade.a += adseed;
        if self.shade.a & 0x100 != 0 {
            self.shade.a = 0xff;
        }
    }

    /// Alpha after coverage-times-alpha, alpha-from-coverage and dither
    ///
    /// When `write_cvg` is set the coverage is replaced by the alpha-scaled
    /// coverage, as the last combiner cycle does.
    fn coverage_alpha(&self, alpha: i32, adseed: i32, cvg: &mut u32, write_cvg: bool) -> i32 {
        let modes = &self.other_modes;
        let scaled = if modes.cvg_times_alpha {
            let temp = (alpha * (*cvg as i32) + 4) >> 3;
            if write_cvg {
                *cvg = ((temp >> 5) & 0xf) as u32;
            }
            temp
        } else {
            0
        };

        if !modes.alpha_cvg_select {
            if !modes.key_en {
                let a = alpha + adseed;
                if a & 0x100 != 0 {
                    0xff
                } else {
                    a
                }
            } else {
                self.keyalpha
            }
        } else {
            let a = if modes.cvg_times_alpha {
                scaled
            } else {
                (*cvg as i32) << 5
            };
            a.min(0xff)
        }
    }

    /// One-cycle combiner: cycle 1 equation only
    pub(in crate::core::rdp) fn combiner_1cycle(&mut self, adseed: i32, cvg: &mut u32) {
        let chromabypass = if self.other_modes.key_en {
            self.rgb_input(self.combiner[1].rgb_sub_a)
        } else {
            (0, 0, 0)
        };

        self.combine_cycle(1);
        self.finish_pixel(adseed, cvg, chromabypass);
    }

    /// Two-cycle combiner
    ///
    /// Returns the alpha used by the alpha compare, which samples cycle 0.
    /// Texels shift down by one cycle between the two equations.
    pub(in crate::core::rdp) fn combiner_2cycle(&mut self, adseed: i32, cvg: &mut u32) -> i32 {
        let mut acalpha = 0;
        self.combine_cycle(0);

        if self.other_modes.alpha_compare_en {
            if self.other_modes.key_en {
                self.keyalpha = self.key_alpha();
            }

            let mut preacalpha = tables().clamp9[(self.combined.a & 0x1ff) as usize];
            if preacalpha == 0xff {
                preacalpha = 0x100;
            }
            let mut cvg_copy = *cvg;
            acalpha = self.coverage_alpha(preacalpha, adseed, &mut cvg_copy, false);
        }

        self.combined.r >>= 8;
        self.combined.g >>= 8;
        self.combined.b >>= 8;

        self.texel0 = self.texel1;
        self.texel1 = self.nexttexel;

        let chromabypass = if self.other_modes.key_en {
            self.rgb_input(self.combiner[1].rgb_sub_a)
        } else {
            (0, 0, 0)
        };

        self.combine_cycle(1);
        self.finish_pixel(adseed, cvg, chromabypass);
        acalpha
    }
}

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

//! Register write commands
//!
//! Mode, color, key, convert, scissor and image descriptor registers.
//! Set_Other_Modes and Set_Combine also resolve the blender and combiner
//! selectors and mark the derived state stale.

use super::super::types::*;
use super::super::Pipeline;

impl CombinerCycle {
    /// Resolve the selectors of combiner cycle `cycle` from Set_Combine codes
    pub fn from_modes(modes: &CombineModes, cycle: usize) -> Self {
        let (sa, sb, m, a, asa, asb, am, aa) = if cycle == 0 {
            (
                modes.sub_a_rgb0,
                modes.sub_b_rgb0,
                modes.mul_rgb0,
                modes.add_rgb0,
                modes.sub_a_a0,
                modes.sub_b_a0,
                modes.mul_a0,
                modes.add_a0,
            )
        } else {
            (
                modes.sub_a_rgb1,
                modes.sub_b_rgb1,
                modes.mul_rgb1,
                modes.add_rgb1,
                modes.sub_a_a1,
                modes.sub_b_a1,
                modes.mul_a1,
                modes.add_a1,
            )
        };

        Self {
            rgb_sub_a: RgbInput::sub_a(sa),
            rgb_sub_b: RgbInput::sub_b(sb),
            rgb_mul: RgbInput::mul(m),
            rgb_add: RgbInput::add(a),
            alpha_sub_a: AlphaInput::sub_add(asa),
            alpha_sub_b: AlphaInput::sub_add(asb),
            alpha_mul: AlphaInput::mul(am),
            alpha_add: AlphaInput::sub_add(aa),
        }
    }
}

impl Pipeline {
    /// Set_Other_Modes (0x2F)
    ///
    /// ```text
    /// w0 bits 20-21: cycle type       w1 bits 16-31: blender mux codes
    /// w0 bits 8-19:  texture flags    w1 bits 0-14:  blend/depth/coverage flags
    /// w0 bits 4-7:   dither selects
    /// ```
    pub(in crate::core::rdp) fn set_other_modes(&mut self, w0: u32, w1: u32) {
        let m = OtherModes::decode(w0, w1);
        self.blender = [
            BlenderCycle::decode(0, m.blend_m1a_0, m.blend_m1b_0, m.blend_m2a_0, m.blend_m2b_0),
            BlenderCycle::decode(1, m.blend_m1a_1, m.blend_m1b_1, m.blend_m2a_1, m.blend_m2b_1),
        ];
        self.other_modes = m;
        self.derivs.stale = true;
    }

    /// Set_Combine (0x3C)
    pub(in crate::core::rdp) fn set_combine(&mut self, w0: u32, w1: u32) {
        let modes = CombineModes::decode(w0, w1);
        self.combiner = [
            CombinerCycle::from_modes(&modes, 0),
            CombinerCycle::from_modes(&modes, 1),
        ];
        self.combine = modes;
        self.derivs.stale = true;
    }

    /// Set_Key_GB (0x2A)
    pub(in crate::core::rdp) fn set_key_gb(&mut self, w0: u32, w1: u32) {
        self.key_width.g = ((w0 >> 12) & 0xfff) as i32;
        self.key_width.b = (w0 & 0xfff) as i32;
        self.key_center.g = ((w1 >> 24) & 0xff) as i32;
        self.key_scale.g = ((w1 >> 16) & 0xff) as i32;
        self.key_center.b = ((w1 >> 8) & 0xff) as i32;
        self.key_scale.b = (w1 & 0xff) as i32;
    }

    /// Set_Key_R (0x2B)
    pub(in crate::core::rdp) fn set_key_r(&mut self, w1: u32) {
        self.key_width.r = ((w1 >> 16) & 0xfff) as i32;
        self.key_center.r = ((w1 >> 8) & 0xff) as i32;
        self.key_scale.r = (w1 & 0xff) as i32;
    }

    /// Set_Convert (0x2C)
    ///
    /// K0-K3 are stored as `2k + 1` for the YUV filter; K4 and K5 feed the
    /// combiner directly.
    pub(in crate::core::rdp) fn set_convert(&mut self, w0: u32, w1: u32) {
        let k0 = ((w0 >> 13) & 0x1ff) as i32;
        let k1 = ((w0 >> 4) & 0x1ff) as i32;
        let k2 = (((w0 & 0xf) << 5) | ((w1 >> 27) & 0x1f)) as i32;
        let k3 = ((w1 >> 18) & 0x1ff) as i32;
        let scaled = |k: i32| (sign(k, 9) << 1) + 1;
        self.k0_tf = scaled(k0);
        self.k1_tf = scaled(k1);
        self.k2_tf = scaled(k2);
        self.k3_tf = scaled(k3);
        self.k4 = ((w1 >> 9) & 0x1ff) as i32;
        self.k5 = (w1 & 0x1ff) as i32;
    }

    /// Set_Scissor (0x2D)
    pub(in crate::core::rdp) fn set_scissor(&mut self, w0: u32, w1: u32) {
        self.clip = Rect {
            xh: ((w0 >> 12) & 0xfff) as i32,
            yh: (w0 & 0xfff) as i32,
            xl: ((w1 >> 12) & 0xfff) as i32,
            yl: (w1 & 0xfff) as i32,
        };
        self.scfield = (w1 >> 25) & 1 != 0;
        self.sckeepodd = (w1 >> 24) & 1 != 0;
    }

    /// Set_Prim_Depth (0x2E)
    pub(in crate::core::rdp) fn set_prim_depth(&mut self, w1: u32) {
        self.primitive_z = (w1 & (0x7fff << 16)) as i32;
        self.primitive_delta_z = (w1 & 0xffff) as i32;
    }

    /// Set_Prim_Color (0x3A), which also carries the LOD limits
    pub(in crate::core::rdp) fn set_prim_color(&mut self, w0: u32, w1: u32) {
        self.min_level = ((w0 >> 8) & 0x1f) as i32;
        self.prim_lod_frac = (w0 & 0xff) as i32;
        self.prim_color = Color::from_rgba32(w1);
    }

    /// Set_Texture_Image (0x3D)
    pub(in crate::core::rdp) fn set_texture_image(&mut self, w0: u32, w1: u32) {
        self.texture_image = ImageDesc::decode(w0, w1);
    }

    /// Set_Color_Image (0x3F)
    pub(in crate::core::rdp) fn set_color_image(&mut self, w0: u32, w1: u32) {
        self.color_image = ImageDesc::decode(w0, w1);
        log::trace!(
            "color image at 0x{:06X}, {} pixels wide, size {}",
            self.color_image.address,
            self.color_image.width,
            self.color_image.size
        );
    }
}

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

//! Pipeline register state
//!
//! Everything the hardware keeps between commands lives in [`Pipeline`]:
//! mode registers, tiles, TMEM, color registers, the span table of the
//! primitive being drawn and the per-pixel intermediates. Each render worker
//! owns a complete copy and replays the same command batch on it.

use std::sync::Arc;

use super::crash::CrashLatch;
use super::types::*;
use crate::core::memory::Rdram;
use crate::core::trace::TraceEntry;

/// Scanline records; one extra entry past the last line is read by LOD
pub(in crate::core::rdp) const SPAN_COUNT: usize = 1025;

/// TMEM size in bytes
pub const TMEM_SIZE: usize = 0x1000;

/// Complete register and working state of one pixel pipeline
#[derive(Clone)]
pub struct Pipeline {
    pub(in crate::core::rdp) rdram: Arc<Rdram>,
    pub(in crate::core::rdp) crash: Arc<CrashLatch>,

    /// Scanline partition this copy renders
    pub(in crate::core::rdp) worker_id: u32,
    pub(in crate::core::rdp) worker_count: u32,

    pub(in crate::core::rdp) other_modes: OtherModes,
    pub(in crate::core::rdp) derivs: ModeDerivs,
    pub(in crate::core::rdp) combine: CombineModes,
    pub(in crate::core::rdp) combiner: [CombinerCycle; 2],
    pub(in crate::core::rdp) blender: [BlenderCycle; 2],

    pub(in crate::core::rdp) tiles: [Tile; 8],
    pub(in crate::core::rdp) tmem: Box<[u8]>,

    pub(in crate::core::rdp) clip: Rect,
    pub(in crate::core::rdp) scfield: bool,
    pub(in crate::core::rdp) sckeepodd: bool,

    pub(in crate::core::rdp) fill_color: u32,
    pub(in crate::core::rdp) fog_color: Color,
    pub(in crate::core::rdp) blend_color: Color,
    pub(in crate::core::rdp) prim_color: Color,
    pub(in crate::core::rdp) env_color: Color,
    pub(in crate::core::rdp) key_width: Color,
    pub(in crate::core::rdp) key_center: Color,
    pub(in crate::core::rdp) key_scale: Color,

    /// YUV conversion coefficients, pre-scaled to `2k + 1`
    pub(in crate::core::rdp) k0_tf: i32,
    pub(in crate::core::rdp) k1_tf: i32,
    pub(in crate::core::rdp) k2_tf: i32,
    pub(in crate::core::rdp) k3_tf: i32,
    pub(in crate::core::rdp) k4: i32,
    pub(in crate::core::rdp) k5: i32,

    pub(in crate::core::rdp) min_level: i32,
    pub(in crate::core::rdp) max_level: i32,
    pub(in crate::core::rdp) prim_lod_frac: i32,
    pub(in crate::core::rdp) primitive_z: i32,
    pub(in crate::core::rdp) primitive_delta_z: i32,

    pub(in crate::core::rdp) texture_image: ImageDesc,
    pub(in crate::core::rdp) color_image: ImageDesc,
    pub(in crate::core::rdp) zb_address: u32,

    pub(in crate::core::rdp) spans: Box<[Span]>,
    pub(in crate::core::rdp) sd: SpanDeltas,
    pub(in crate::core::rdp) cvgbuf: Box<[u8]>,

    // Per-pixel intermediates
    pub(in crate::core::rdp) combined: Color,
    pub(in crate::core::rdp) texel0: Color,
    pub(in crate::core::rdp) texel1: Color,
    pub(in crate::core::rdp) nexttexel: Color,
    pub(in crate::core::rdp) nexttexel1: Color,
    pub(in crate::core::rdp) shade: Color,
    pub(in crate::core::rdp) pixel: Color,
    pub(in crate::core::rdp) blended_pixel: Color,
    pub(in crate::core::rdp) memory: Color,
    pub(in crate::core::rdp) pre_memory: Color,
    pub(in crate::core::rdp) keyalpha: i32,
    pub(in crate::core::rdp) lod_frac: i32,
    pub(in crate::core::rdp) noise: i32,

    // Blender shifters fed by the depth unit
    pub(in crate::core::rdp) blshifta: i32,
    pub(in crate::core::rdp) blshiftb: i32,
    pub(in crate::core::rdp) pastblshifta: i32,
    pub(in crate::core::rdp) pastblshiftb: i32,
    pub(in crate::core::rdp) pastrawdzmem: i32,

    /// Dither generator state, reseeded at the start of every span line
    pub(in crate::core::rdp) seed: u32,
    /// Primitives executed so far; every worker counts all of them
    pub(in crate::core::rdp) primitives: u32,

    /// RDRAM ranges read by texture loads, captured while tracing
    pub(in crate::core::rdp) capture: Option<Vec<TraceEntry>>,
}

impl Pipeline {
    /// Fresh pipeline in the power-on state
    pub fn new(rdram: Arc<Rdram>, crash: Arc<CrashLatch>) -> Self {
        let mut pipeline = Self {
            rdram,
            crash,
            worker_id: 0,
            worker_count: 1,
            other_modes: OtherModes::default(),
            derivs: ModeDerivs {
                rgb_dither: true,
                ..ModeDerivs::default()
            },
            combine: CombineModes::default(),
            combiner: [CombinerCycle::default(); 2],
            blender: [BlenderCycle::default(); 2],
            tiles: [Tile::default(); 8],
            tmem: vec![0; TMEM_SIZE].into_boxed_slice(),
            clip: Rect {
                xh: 0,
                yh: 0,
                xl: 0x2000,
                yl: 0x2000,
            },
            scfield: false,
            sckeepodd: false,
            fill_color: 0,
            fog_color: Color::default(),
            blend_color: Color::default(),
            prim_color: Color::default(),
            env_color: Color::default(),
            key_width: Color::default(),
            key_center: Color::default(),
            key_scale: Color::default(),
            k0_tf: 0,
            k1_tf: 0,
            k2_tf: 0,
            k3_tf: 0,
            k4: 0,
            k5: 0,
            min_level: 0,
            max_level: 0,
            prim_lod_frac: 0,
            primitive_z: 0,
            primitive_delta_z: 0,
            texture_image: ImageDesc::default(),
            color_image: ImageDesc::default(),
            zb_address: 0,
            spans: vec![Span::default(); SPAN_COUNT].into_boxed_slice(),
            sd: SpanDeltas::default(),
            cvgbuf: vec![0; 1024].into_boxed_slice(),
            combined: Color::default(),
            texel0: Color::default(),
            texel1: Color::default(),
            nexttexel: Color::default(),
            nexttexel1: Color::default(),
            shade: Color::default(),
            pixel: Color::default(),
            blended_pixel: Color::default(),
            memory: Color::default(),
            pre_memory: Color::default(),
            keyalpha: 0,
            lod_frac: 0,
            noise: 0,
            blshifta: 0,
            blshiftb: 0,
            pastblshifta: 0,
            pastblshiftb: 0,
            pastrawdzmem: 0,
            seed: 0,
            primitives: 0,
            capture: None,
        };

        pipeline.set_other_modes(0, 0);
        for tile in pipeline.tiles.iter_mut() {
            tile.update_derivs();
            tile.update_clamp_diffs();
        }
        pipeline
    }

    /// Assign the scanline partition rendered by this copy
    pub fn set_worker(&mut self, id: u32, count: u32) {
        self.worker_id = id;
        self.worker_count = count.max(1);
    }

    /// Shared memory this pipeline renders into
    pub fn rdram(&self) -> &Arc<Rdram> {
        &self.rdram
    }

    pub fn other_modes(&self) -> &OtherModes {
        &self.other_modes
    }

    pub fn derivs(&self) -> &ModeDerivs {
        &self.derivs
    }

    pub fn tile(&self, index: usize) -> &Tile {
        &self.tiles[index & 7]
    }

    pub fn color_image(&self) -> &ImageDesc {
        &self.color_image
    }

    pub fn texture_image(&self) -> &ImageDesc {
        &self.texture_image
    }

    pub fn zb_address(&self) -> u32 {
        self.zb_address
    }

    pub fn clip(&self) -> &Rect {
        &self.clip
    }

    /// Raw TMEM bytes
    pub fn tmem(&self) -> &[u8] {
        &self.tmem
    }

    /// TMEM halfword `idx`, in the host-order layout loads write
    #[inline(always)]
    pub fn tmem16(&self, idx: u32) -> u16 {
        let i = ((idx & 0x7ff) << 1) as usize;
        u16::from_le_bytes([self.tmem[i], self.tmem[i + 1]])
    }

    #[inline(always)]
    pub(in crate::core::rdp) fn set_tmem16(&mut self, idx: u32, value: u16) {
        let i = ((idx & 0x7ff) << 1) as usize;
        self.tmem[i..i + 2].copy_from_slice(&value.to_le_bytes());
    }

    /// TMEM byte `idx`
    #[inline(always)]
    pub fn tmem8(&self, idx: u32) -> u8 {
        self.tmem[(idx & 0xfff) as usize]
    }

    /// Palette entry `idx` of the TLUT in upper TMEM
    #[inline(always)]
    pub(in crate::core::rdp) fn tlut(&self, idx: u32) -> u16 {
        self.tmem16(0x400 + (idx & 0x3ff))
    }

    /// Restart the dither generator for scanline `line` of the current primitive
    ///
    /// The sequence depends only on the primitive and the line, so the
    /// output does not change with the worker partition.
    #[inline]
    pub(in crate::core::rdp) fn seed_line(&mut self, line: usize) {
        self.seed = self.primitives.wrapping_mul(0x9e37_79b9) ^ (line as u32).wrapping_mul(0x85eb_ca6b);
    }

    /// 15-bit pseudo random value from the line's generator
    #[inline(always)]
    pub(in crate::core::rdp) fn irand(&mut self) -> i32 {
        self.seed = self.seed.wrapping_mul(0x343fd).wrapping_add(0x269ec3);
        ((self.seed >> 16) & 0x7fff) as i32
    }

    /// Recompute the values derived from other modes and combine modes
    pub(in crate::core::rdp) fn deduce_derivatives(&mut self) {
        let cycle = self.other_modes.cycle_type;
        let one = cycle == CycleType::OneCycle;
        let two = cycle == CycleType::TwoCycle;
        let d = &mut self.derivs;

        d.partial_reject_1cycle = self.blender[0].alpha2 == BlendAlphaInput::InvPixelAlpha
            && self.blender[0].alpha1 == BlendAlphaInput::PixelAlpha;
        d.partial_reject_2cycle = self.blender[1].alpha2 == BlendAlphaInput::InvPixelAlpha
            && self.blender[1].alpha1 == BlendAlphaInput::PixelAlpha;
        d.special_bsel0 = self.blender[0].alpha2 == BlendAlphaInput::MemoryAlpha;
        d.special_bsel1 = self.blender[1].alpha2 == BlendAlphaInput::MemoryAlpha;
        d.real_blender_shifters = (d.special_bsel0 && one) || (d.special_bsel1 && two);
        d.interpixel_blender_shifters = d.special_bsel0 && two;
        d.rgb_alpha_dither =
            (self.other_modes.rgb_dither_sel << 2) | self.other_modes.alpha_dither_sel;
        d.rgb_dither = self.other_modes.rgb_dither_sel != 3;

        let [cc0, cc1] = &self.combiner;
        let texel0_cc0 = cc0.uses_texel0();
        let texel1_cc0 = cc0.uses_texel1();
        let texel0_cc1 = cc1.uses_texel0();
        let texel1_cc1 = cc1.uses_texel1();
        let lod_frac_cc0 = cc0.uses_lod_frac();
        let lod_frac_cc1 = cc1.uses_lod_frac();

        d.one_cycle = if texel1_cc1 {
            OneCycleVariant::Complete
        } else if texel0_cc1 || lod_frac_cc1 {
            OneCycleVariant::NoTexel1
        } else {
            OneCycleVariant::NoTex
        };

        d.two_cycle = if texel1_cc1 {
            TwoCycleVariant::Complete
        } else if texel1_cc0 || texel0_cc1 {
            TwoCycleVariant::NoTexelNext
        } else if texel0_cc0 || lod_frac_cc0 || lod_frac_cc1 {
            TwoCycleVariant::NoTexel1
        } else {
            TwoCycleVariant::NoTex
        };

        let lod_frac_used = (two && (lod_frac_cc0 || lod_frac_cc1)) || (one && lod_frac_cc1);

        let noise_used = (one && cc1.rgb_sub_a == RgbInput::Noise)
            || (two && (cc0.rgb_sub_a == RgbInput::Noise || cc1.rgb_sub_a == RgbInput::Noise))
            || self.other_modes.alpha_dither_sel == 2;
        d.noise = if noise_used {
            NoiseMode::Complete
        } else if d.rgb_alpha_dither != 0xf {
            NoiseMode::DitherOnly
        } else {
            NoiseMode::Nothing
        };

        d.do_lod = self.other_modes.tex_lod_en || lod_frac_used;
    }
}

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

//! RDP type definitions
//!
//! Register layouts decoded from command words, tile descriptors, span
//! records and the selector enums that replace the hardware's input muxes.

/// Image format field values shared by tiles, texture images and color images
pub const FORMAT_RGBA: u32 = 0;
pub const FORMAT_YUV: u32 = 1;
pub const FORMAT_CI: u32 = 2;
pub const FORMAT_IA: u32 = 3;
pub const FORMAT_I: u32 = 4;

/// Pixel size field values
pub const PIXEL_SIZE_4BIT: u32 = 0;
pub const PIXEL_SIZE_8BIT: u32 = 1;
pub const PIXEL_SIZE_16BIT: u32 = 2;
pub const PIXEL_SIZE_32BIT: u32 = 3;

/// Sign-extend the low `bits` bits of `x`
#[inline(always)]
pub(crate) fn sign(x: i32, bits: u32) -> i32 {
    let shift = 32 - bits;
    (x << shift) >> shift
}

/// Sign-extend from bit `bits - 1` without clearing the bits above it
#[inline(always)]
pub(crate) fn signf(x: i32, bits: u32) -> i32 {
    x | (x & (1 << (bits - 1))).wrapping_neg()
}

/// Sign-extend the low 16 bits of `x`
#[inline(always)]
pub(crate) fn sign16(x: i32) -> i32 {
    x as i16 as i32
}

/// Pixel byte count for `pix` pixels of size code `size`
#[inline(always)]
pub(crate) fn pixels_to_bytes(pix: u32, size: u32) -> u32 {
    (pix << size) >> 1
}

/// A pipeline color register or intermediate
///
/// Channels are kept as signed integers because the combiner carries 9-bit
/// and 17-bit intermediates through them.
///
/// # Examples
///
/// ```
/// use rdpx::core::rdp::Color;
///
/// let color = Color::from_rgba32(0x11223344);
/// assert_eq!((color.r, color.g, color.b, color.a), (0x11, 0x22, 0x33, 0x44));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Color {
    pub r: i32,
    pub g: i32,
    pub b: i32,
    pub a: i32,
}

impl Color {
    /// Color with every channel set to `v`
    pub const fn splat(v: i32) -> Self {
        Self {
            r: v,
            g: v,
            b: v,
            a: v,
        }
    }

    /// Unpack an RGBA8888 register value (red in the top byte)
    pub fn from_rgba32(value: u32) -> Self {
        Self {
            r: ((value >> 24) & 0xff) as i32,
            g: ((value >> 16) & 0xff) as i32,
            b: ((value >> 8) & 0xff) as i32,
            a: (value & 0xff) as i32,
        }
    }
}

/// Cycle type of the pipeline (Set_Other_Modes bits 52-53)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CycleType {
    /// One pixel per clock through one combiner/blender cycle
    #[default]
    OneCycle,
    /// Two chained combiner and blender cycles
    TwoCycle,
    /// Raw texel copy, four pixels per clock
    Copy,
    /// Constant fill color, four pixels per clock
    Fill,
}

impl CycleType {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 3 {
            0 => Self::OneCycle,
            1 => Self::TwoCycle,
            2 => Self::Copy,
            _ => Self::Fill,
        }
    }
}

/// Depth comparison mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ZMode {
    #[default]
    Opaque,
    Interpenetrating,
    Transparent,
    Decal,
}

impl ZMode {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 3 {
            0 => Self::Opaque,
            1 => Self::Interpenetrating,
            2 => Self::Transparent,
            _ => Self::Decal,
        }
    }
}

/// How coverage is written back to memory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CvgDest {
    #[default]
    Clamp,
    Wrap,
    Zap,
    Save,
}

impl CvgDest {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 3 {
            0 => Self::Clamp,
            1 => Self::Wrap,
            2 => Self::Zap,
            _ => Self::Save,
        }
    }
}

/// Decoded Set_Other_Modes register
///
/// # Examples
///
/// ```
/// use rdpx::core::rdp::{CycleType, OtherModes};
///
/// let modes = OtherModes::decode(0x2f30_0000, 0x0000_0030);
/// assert_eq!(modes.cycle_type, CycleType::Fill);
/// assert!(modes.z_compare_en);
/// assert!(modes.z_update_en);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OtherModes {
    pub cycle_type: CycleType,
    pub persp_tex_en: bool,
    pub detail_tex_en: bool,
    pub sharpen_tex_en: bool,
    pub tex_lod_en: bool,
    pub en_tlut: bool,
    pub tlut_type: bool,
    pub sample_type: bool,
    pub mid_texel: bool,
    pub bi_lerp0: bool,
    pub bi_lerp1: bool,
    pub convert_one: bool,
    pub key_en: bool,
    pub rgb_dither_sel: u32,
    pub alpha_dither_sel: u32,
    pub blend_m1a_0: u32,
    pub blend_m1a_1: u32,
    pub blend_m1b_0: u32,
    pub blend_m1b_1: u32,
    pub blend_m2a_0: u32,
    pub blend_m2a_1: u32,
    pub blend_m2b_0: u32,
    pub blend_m2b_1: u32,
    pub force_blend: bool,
    pub alpha_cvg_select: bool,
    pub cvg_times_alpha: bool,
    pub z_mode: ZMode,
    pub cvg_dest: CvgDest,
    pub color_on_cvg: bool,
    pub image_read_en: bool,
    pub z_update_en: bool,
    pub z_compare_en: bool,
    pub antialias_en: bool,
    pub z_source_sel: bool,
    pub dither_alpha_en: bool,
    pub alpha_compare_en: bool,
}

impl OtherModes {
    /// Decode the two command words of Set_Other_Modes
    pub fn decode(w0: u32, w1: u32) -> Self {
        let bit = |w: u32, n: u32| (w >> n) & 1 != 0;
        Self {
            cycle_type: CycleType::from_bits(w0 >> 20),
            persp_tex_en: bit(w0, 19),
            detail_tex_en: bit(w0, 18),
            sharpen_tex_en: bit(w0, 17),
            tex_lod_en: bit(w0, 16),
            en_tlut: bit(w0, 15),
            tlut_type: bit(w0, 14),
            sample_type: bit(w0, 13),
            mid_texel: bit(w0, 12),
            bi_lerp0: bit(w0, 11),
            bi_lerp1: bit(w0, 10),
            convert_one: bit(w0, 9),
            key_en: bit(w0, 8),
            rgb_dither_sel: (w0 >> 6) & 3,
            alpha_dither_sel: (w0 >> 4) & 3,
            blend_m1a_0: (w1 >> 30) & 3,
            blend_m1a_1: (w1 >> 28) & 3,
            blend_m1b_0: (w1 >> 26) & 3,
            blend_m1b_1: (w1 >> 24) & 3,
            blend_m2a_0: (w1 >> 22) & 3,
            blend_m2a_1: (w1 >> 20) & 3,
            blend_m2b_0: (w1 >> 18) & 3,
            blend_m2b_1: (w1 >> 16) & 3,
            force_blend: bit(w1, 14),
            alpha_cvg_select: bit(w1, 13),
            cvg_times_alpha: bit(w1, 12),
            z_mode: ZMode::from_bits(w1 >> 10),
            cvg_dest: CvgDest::from_bits(w1 >> 8),
            color_on_cvg: bit(w1, 7),
            image_read_en: bit(w1, 6),
            z_update_en: bit(w1, 5),
            z_compare_en: bit(w1, 4),
            antialias_en: bit(w1, 3),
            z_source_sel: bit(w1, 2),
            dither_alpha_en: bit(w1, 1),
            alpha_compare_en: bit(w1, 0),
        }
    }
}

/// Raw Set_Combine selector codes for both cycles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CombineModes {
    pub sub_a_rgb0: u32,
    pub sub_b_rgb0: u32,
    pub mul_rgb0: u32,
    pub add_rgb0: u32,
    pub sub_a_a0: u32,
    pub sub_b_a0: u32,
    pub mul_a0: u32,
    pub add_a0: u32,
    pub sub_a_rgb1: u32,
    pub sub_b_rgb1: u32,
    pub mul_rgb1: u32,
    pub add_rgb1: u32,
    pub sub_a_a1: u32,
    pub sub_b_a1: u32,
    pub mul_a1: u32,
    pub add_a1: u32,
}

impl CombineModes {
    /// Decode the two command words of Set_Combine
    pub fn decode(w0: u32, w1: u32) -> Self {
        Self {
            sub_a_rgb0: (w0 >> 20) & 0xf,
            mul_rgb0: (w0 >> 15) & 0x1f,
            sub_a_a0: (w0 >> 12) & 7,
            mul_a0: (w0 >> 9) & 7,
            sub_a_rgb1: (w0 >> 5) & 0xf,
            mul_rgb1: w0 & 0x1f,
            sub_b_rgb0: (w1 >> 28) & 0xf,
            sub_b_rgb1: (w1 >> 24) & 0xf,
            sub_a_a1: (w1 >> 21) & 7,
            mul_a1: (w1 >> 18) & 7,
            add_rgb0: (w1 >> 15) & 7,
            sub_b_a0: (w1 >> 12) & 7,
            add_a0: (w1 >> 9) & 7,
            add_rgb1: (w1 >> 6) & 7,
            sub_b_a1: (w1 >> 3) & 7,
            add_a1: w1 & 7,
        }
    }
}

/// Color combiner RGB input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RgbInput {
    Combined,
    Texel0,
    Texel1,
    Prim,
    Shade,
    Env,
    One,
    Noise,
    KeyCenter,
    KeyScale,
    K4,
    K5,
    CombinedAlpha,
    Texel0Alpha,
    Texel1Alpha,
    PrimAlpha,
    ShadeAlpha,
    EnvAlpha,
    LodFrac,
    PrimLodFrac,
    Zero,
}

impl RgbInput {
    /// The six color registers shared by every RGB slot
    fn common(code: u32) -> Option<Self> {
        Some(match code {
            0 => Self::Combined,
            1 => Self::Texel0,
            2 => Self::Texel1,
            3 => Self::Prim,
            4 => Self::Shade,
            5 => Self::Env,
            _ => return None,
        })
    }

    pub fn sub_a(code: u32) -> Self {
        match code & 0xf {
            6 => Self::One,
            7 => Self::Noise,
            c => Self::common(c).unwrap_or(Self::Zero),
        }
    }

    pub fn sub_b(code: u32) -> Self {
        match code & 0xf {
            6 => Self::KeyCenter,
            7 => Self::K4,
            c => Self::common(c).unwrap_or(Self::Zero),
        }
    }

    pub fn mul(code: u32) -> Self {
        match code & 0x1f {
            6 => Self::KeyScale,
            7 => Self::CombinedAlpha,
            8 => Self::Texel0Alpha,
            9 => Self::Texel1Alpha,
            10 => Self::PrimAlpha,
            11 => Self::ShadeAlpha,
            12 => Self::EnvAlpha,
            13 => Self::LodFrac,
            14 => Self::PrimLodFrac,
            15 => Self::K5,
            c => Self::common(c).unwrap_or(Self::Zero),
        }
    }

    pub fn add(code: u32) -> Self {
        match code & 7 {
            6 => Self::One,
            c => Self::common(c).unwrap_or(Self::Zero),
        }
    }
}

/// Alpha combiner input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlphaInput {
    Combined,
    Texel0,
    Texel1,
    Prim,
    Shade,
    Env,
    One,
    LodFrac,
    PrimLodFrac,
    Zero,
}

impl AlphaInput {
    /// Sub A, sub B and add slots
    pub fn sub_add(code: u32) -> Self {
        match code & 7 {
            0 => Self::Combined,
            1 => Self::Texel0,
            2 => Self::Texel1,
            3 => Self::Prim,
            4 => Self::Shade,
            5 => Self::Env,
            6 => Self::One,
            _ => Self::Zero,
        }
    }

    pub fn mul(code: u32) -> Self {
        match code & 7 {
            0 => Self::LodFrac,
            1 => Self::Texel0,
            2 => Self::Texel1,
            3 => Self::Prim,
            4 => Self::Shade,
            5 => Self::Env,
            6 => Self::PrimLodFrac,
            _ => Self::Zero,
        }
    }
}

/// Resolved inputs of one combiner cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombinerCycle {
    pub rgb_sub_a: RgbInput,
    pub rgb_sub_b: RgbInput,
    pub rgb_mul: RgbInput,
    pub rgb_add: RgbInput,
    pub alpha_sub_a: AlphaInput,
    pub alpha_sub_b: AlphaInput,
    pub alpha_mul: AlphaInput,
    pub alpha_add: AlphaInput,
}

impl Default for CombinerCycle {
    /// Every input reads the constant one, as after reset
    fn default() -> Self {
        Self {
            rgb_sub_a: RgbInput::One,
            rgb_sub_b: RgbInput::One,
            rgb_mul: RgbInput::One,
            rgb_add: RgbInput::One,
            alpha_sub_a: AlphaInput::One,
            alpha_sub_b: AlphaInput::One,
            alpha_mul: AlphaInput::One,
            alpha_add: AlphaInput::One,
        }
    }
}

impl CombinerCycle {
    /// Whether any input of this cycle reads texel 0
    pub fn uses_texel0(&self) -> bool {
        self.rgb_mul == RgbInput::Texel0
            || self.rgb_sub_a == RgbInput::Texel0
            || self.rgb_sub_b == RgbInput::Texel0
            || self.rgb_add == RgbInput::Texel0
            || self.alpha_mul == AlphaInput::Texel0
            || self.alpha_sub_a == AlphaInput::Texel0
            || self.alpha_sub_b == AlphaInput::Texel0
            || self.alpha_add == AlphaInput::Texel0
            || self.rgb_mul == RgbInput::Texel0Alpha
    }

    /// Whether any input of this cycle reads texel 1
    pub fn uses_texel1(&self) -> bool {
        self.rgb_mul == RgbInput::Texel1
            || self.rgb_sub_a == RgbInput::Texel1
            || self.rgb_sub_b == RgbInput::Texel1
            || self.rgb_add == RgbInput::Texel1
            || self.alpha_mul == AlphaInput::Texel1
            || self.alpha_sub_a == AlphaInput::Texel1
            || self.alpha_sub_b == AlphaInput::Texel1
            || self.alpha_add == AlphaInput::Texel1
            || self.rgb_mul == RgbInput::Texel1Alpha
    }

    pub fn uses_lod_frac(&self) -> bool {
        self.rgb_mul == RgbInput::LodFrac || self.alpha_mul == AlphaInput::LodFrac
    }
}

/// Blender color input (the "A" muxes)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BlendColorInput {
    #[default]
    Pixel,
    BlendedPixel,
    Memory,
    BlendColor,
    Fog,
}

/// Blender alpha input (the "B" muxes)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BlendAlphaInput {
    #[default]
    PixelAlpha,
    FogAlpha,
    ShadeAlpha,
    InvPixelAlpha,
    MemoryAlpha,
    One,
    Zero,
}

/// Resolved blender inputs of one cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlenderCycle {
    pub color1: BlendColorInput,
    pub alpha1: BlendAlphaInput,
    pub color2: BlendColorInput,
    pub alpha2: BlendAlphaInput,
}

impl BlenderCycle {
    /// Build the selectors of `cycle` from the m1a/m1b/m2a/m2b codes
    pub fn decode(cycle: usize, m1a: u32, m1b: u32, m2a: u32, m2b: u32) -> Self {
        let color = |code: u32| match code & 3 {
            0 if cycle == 0 => BlendColorInput::Pixel,
            0 => BlendColorInput::BlendedPixel,
            1 => BlendColorInput::Memory,
            2 => BlendColorInput::BlendColor,
            _ => BlendColorInput::Fog,
        };
        let alpha1 = match m1b & 3 {
            0 => BlendAlphaInput::PixelAlpha,
            1 => BlendAlphaInput::FogAlpha,
            2 => BlendAlphaInput::ShadeAlpha,
            _ => BlendAlphaInput::Zero,
        };
        let alpha2 = match m2b & 3 {
            0 => BlendAlphaInput::InvPixelAlpha,
            1 => BlendAlphaInput::MemoryAlpha,
            2 => BlendAlphaInput::One,
            _ => BlendAlphaInput::Zero,
        };
        Self {
            color1: color(m1a),
            alpha1,
            color2: color(m2a),
            alpha2,
        }
    }
}

/// 1-cycle span renderer variant, chosen by which texels the combiner reads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OneCycleVariant {
    #[default]
    Complete,
    NoTexel1,
    NoTex,
}

/// 2-cycle span renderer variant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TwoCycleVariant {
    Complete,
    NoTexelNext,
    #[default]
    NoTexel1,
    NoTex,
}

/// Per-pixel dither/noise generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NoiseMode {
    /// Random noise plus dither values
    #[default]
    Complete,
    /// Dither values only
    DitherOnly,
    /// Neither
    Nothing,
}

/// Values derived from other modes and combine modes
///
/// Recomputed lazily: Set_Other_Modes and Set_Combine mark them stale and the
/// edge walker refreshes them before the next primitive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeDerivs {
    pub stale: bool,
    pub do_lod: bool,
    pub partial_reject_1cycle: bool,
    pub partial_reject_2cycle: bool,
    pub special_bsel0: bool,
    pub special_bsel1: bool,
    pub rgb_alpha_dither: u32,
    pub real_blender_shifters: bool,
    pub interpixel_blender_shifters: bool,
    pub one_cycle: OneCycleVariant,
    pub two_cycle: TwoCycleVariant,
    pub noise: NoiseMode,
    pub rgb_dither: bool,
}

/// Values derived from a tile descriptor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileDerivs {
    pub clampdiffs: i32,
    pub clampdifft: i32,
    pub clampens: bool,
    pub clampent: bool,
    pub masksclamped: i32,
    pub masktclamped: i32,
    pub notlutswitch: u32,
    pub tlutswitch: u32,
}

/// One of the eight tile descriptors
///
/// # Examples
///
/// ```
/// use rdpx::core::rdp::Tile;
///
/// let mut tile = Tile::default();
/// tile.sh = 31 << 2;
/// tile.th = 15 << 2;
/// tile.mask_s = 12;
/// tile.update_clamp_diffs();
/// tile.update_derivs();
/// assert_eq!(tile.f.clampdiffs, 31);
/// assert_eq!(tile.f.clampdifft, 15);
/// assert_eq!(tile.f.masksclamped, 10);
/// assert!(tile.f.clampent);
/// assert!(!tile.f.clampens);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tile {
    pub format: u32,
    pub size: u32,
    /// Row stride in 64-bit TMEM words
    pub line: i32,
    /// Base address in 64-bit TMEM words
    pub tmem: i32,
    pub palette: i32,
    pub ct: bool,
    pub mt: bool,
    pub mask_t: i32,
    pub shift_t: i32,
    pub cs: bool,
    pub ms: bool,
    pub mask_s: i32,
    pub shift_s: i32,
    /// Coordinate bounds in 10.2 fixed point
    pub sl: i32,
    pub tl: i32,
    pub sh: i32,
    pub th: i32,
    pub f: TileDerivs,
}

impl Tile {
    pub fn update_clamp_diffs(&mut self) {
        self.f.clampdiffs = ((self.sh >> 2) - (self.sl >> 2)) & 0x3ff;
        self.f.clampdifft = ((self.th >> 2) - (self.tl >> 2)) & 0x3ff;
    }

    pub fn update_derivs(&mut self) {
        self.f.clampens = self.cs || self.mask_s == 0;
        self.f.clampent = self.ct || self.mask_t == 0;
        self.f.masksclamped = self.mask_s.min(10);
        self.f.masktclamped = self.mask_t.min(10);
        self.f.notlutswitch = (self.format << 2) | self.size;
        self.f.tlutswitch = (self.size << 2) | ((self.format + 2) & 3);
    }
}

/// Scissor rectangle in 10.2 fixed point
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub xh: i32,
    pub yh: i32,
    pub xl: i32,
    pub yl: i32,
}

/// Texture or color image descriptor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageDesc {
    pub format: u32,
    pub size: u32,
    pub width: u32,
    pub address: u32,
}

impl ImageDesc {
    /// Decode Set_Texture_Image / Set_Color_Image
    pub fn decode(w0: u32, w1: u32) -> Self {
        Self {
            format: (w0 >> 21) & 7,
            size: (w0 >> 19) & 3,
            width: (w0 & 0x3ff) + 1,
            address: w1 & 0x00ff_ffff,
        }
    }
}

/// Per-scanline record written by the edge walker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    /// Leftmost covered pixel
    pub lx: i32,
    /// Rightmost covered pixel
    pub rx: i32,
    /// Unscissored major edge pixel
    pub unscrx: i32,
    pub validline: bool,
    pub r: i32,
    pub g: i32,
    pub b: i32,
    pub a: i32,
    pub s: i32,
    pub t: i32,
    pub w: i32,
    pub z: i32,
    /// Major edge per sub-scanline, in eighths of a pixel
    pub majorx: [i32; 4],
    /// Minor edge per sub-scanline, in eighths of a pixel
    pub minorx: [i32; 4],
    pub invalyscan: [bool; 4],
}

/// Attribute gradients of the primitive being rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanDeltas {
    pub ds: i32,
    pub dt: i32,
    pub dw: i32,
    pub dr: i32,
    pub dg: i32,
    pub db: i32,
    pub da: i32,
    pub dz: i32,
    pub drdy: i32,
    pub dgdy: i32,
    pub dbdy: i32,
    pub dady: i32,
    pub dzdy: i32,
    pub cdr: i32,
    pub cdg: i32,
    pub cdb: i32,
    pub cda: i32,
    pub cdz: i32,
    pub dsdy: i32,
    pub dtdy: i32,
    pub dwdy: i32,
    pub dzpix: i32,
}

/// Position of the current pixel within its span, used by LOD
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanSigs {
    pub startspan: bool,
    pub endspan: bool,
    pub preendspan: bool,
    pub nextspan: bool,
    pub midspan: bool,
    pub longspan: bool,
    pub onelessthanmid: bool,
}

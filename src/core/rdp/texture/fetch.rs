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

//! TMEM texel fetch
//!
//! TMEM is split into four banks of 16-bit words. Odd rows of a texture are
//! stored with their 32-bit halves swapped, which is why every address below
//! is XORed with a different constant depending on the parity of `t`.

use super::super::tables::tables;
use super::super::types::*;
use super::super::Pipeline;

/// Byte address swizzle for even and odd rows
const BYTE_ADDR_XOR: u32 = 3;
const BYTE_XOR_DWORD_SWAP: u32 = 7;

/// Halfword address swizzle for even and odd rows
const WORD_ADDR_XOR: u32 = 1;
const WORD_XOR_DWORD_SWAP: u32 = 3;

#[inline(always)]
fn byte_xor(t: i32) -> u32 {
    if t & 1 != 0 {
        BYTE_XOR_DWORD_SWAP
    } else {
        BYTE_ADDR_XOR
    }
}

#[inline(always)]
fn word_xor(t: i32) -> u32 {
    if t & 1 != 0 {
        WORD_XOR_DWORD_SWAP
    } else {
        WORD_ADDR_XOR
    }
}

/// Expand an RGBA5551 halfword to 8-bit channels
#[inline(always)]
pub(in crate::core::rdp) fn rgba16_to_color(c: u32) -> Color {
    let rgba = &tables().replicated_rgba;
    Color {
        r: rgba[((c >> 11) & 0x1f) as usize],
        g: rgba[((c >> 6) & 0x1f) as usize],
        b: rgba[((c >> 1) & 0x1f) as usize],
        a: if c & 1 != 0 { 0xff } else { 0 },
    }
}

/// Intensity/alpha halfword as used by the IA16 TLUT type
#[inline(always)]
fn ia16_to_color(c: u32) -> Color {
    let i = ((c >> 8) & 0xff) as i32;
    Color {
        r: i,
        g: i,
        b: i,
        a: (c & 0xff) as i32,
    }
}

/// Halfword formats with no native decoding read as two 8-bit channels
#[inline(always)]
fn raw16_to_color(c: u32) -> Color {
    let hi = ((c >> 8) & 0xff) as i32;
    Color {
        r: hi,
        g: (c & 0xff) as i32,
        b: hi,
        a: if c & 1 != 0 { 0xff } else { 0 },
    }
}

impl Pipeline {
    /// Fetch one texel without palette lookup
    pub(in crate::core::rdp) fn fetch_texel(&self, s: i32, t: i32, tilenum: usize) -> Color {
        let tile = &self.tiles[tilenum];
        let tbase = (tile.line.wrapping_mul(t & 0xff).wrapping_add(tile.tmem)) as u32;
        let s = s as u32;
        let nibble = |taddr: u32| -> u32 {
            let byte = self.tmem8(taddr & 0xfff) as u32;
            if s & 1 != 0 {
                byte & 0xf
            } else {
                byte >> 4
            }
        };
        let addr4 = ((tbase << 4).wrapping_add(s) >> 1) ^ byte_xor(t);
        let addr8 = (tbase << 3).wrapping_add(s) ^ byte_xor(t);
        let addr16 = (tbase << 2).wrapping_add(s) ^ word_xor(t);

        match tile.f.notlutswitch {
            // RGBA4, I4
            0x00 | 0x10 => Color::splat((nibble(addr4) * 0x11) as i32),
            // RGBA8, CI8, I8
            0x01 | 0x09 | 0x11 => Color::splat(self.tmem8(addr8 & 0xfff) as i32),
            // RGBA16
            0x02 => rgba16_to_color(self.tmem16(addr16 & 0x7ff) as u32),
            // RGBA32: red/green in the low half, blue/alpha in the high half
            0x03 => {
                let idx = addr16 & 0x3ff;
                let rg = self.tmem16(idx) as i32;
                let ba = self.tmem16(idx | 0x400) as i32;
                Color {
                    r: rg >> 8,
                    g: rg & 0xff,
                    b: ba >> 8,
                    a: ba & 0xff,
                }
            }
            // YUV4, YUV8
            0x04 | 0x05 => {
                let save = self.tmem8(addr8 & 0x7ff) as i32;
                let u = save - 0x80;
                Color {
                    r: u,
                    g: u,
                    b: save,
                    a: save,
                }
            }
            // YUV16, YUV32: chroma in the low half, luma in the high half
            0x06 | 0x07 => {
                let taddr = addr8 & 0x7ff;
                let taddrlow = ((((tbase << 3).wrapping_add(s)) >> 1) ^ word_xor(t)) & 0x3ff;
                let c = self.tmem16(taddrlow) as i32;
                let y = self.tmem8(taddr | 0x800) as i32;
                Color {
                    r: (c >> 8) - 0x80,
                    g: (c & 0xff) - 0x80,
                    b: y,
                    a: y,
                }
            }
            // CI4
            0x08 => Color::splat(((tile.palette as u32) << 4 | nibble(addr4)) as i32 & 0xff),
            // IA4
            0x0c => {
                let p = nibble(addr4);
                let i = p & 0xe;
                let i = ((i << 4) | (i << 1) | (i >> 2)) & 0xff;
                Color {
                    r: i as i32,
                    g: i as i32,
                    b: i as i32,
                    a: if p & 1 != 0 { 0xff } else { 0 },
                }
            }
            // IA8
            0x0d => {
                let p = self.tmem8(addr8 & 0xfff) as i32;
                let i = (p & 0xf0) | ((p & 0xf0) >> 4);
                Color {
                    r: i,
                    g: i,
                    b: i,
                    a: ((p & 0xf) << 4) | (p & 0xf),
                }
            }
            // IA16
            0x0e => ia16_to_color(self.tmem16(addr16 & 0x7ff) as u32),
            // CI16, CI32, IA32, I16, I32
            0x0a | 0x0b | 0x0f | 0x12 | 0x13 => raw16_to_color(self.tmem16(addr16 & 0x7ff) as u32),
            _ => {
                log::error!(
                    "fetch_texel: unknown texture format {}, size {}, tilenum {}",
                    tile.format,
                    tile.size,
                    tilenum
                );
                Color::default()
            }
        }
    }

    /// Fetch one texel through the TLUT
    pub(in crate::core::rdp) fn fetch_texel_entlut(&self, s: i32, t: i32, tilenum: usize) -> Color {
        let tile = &self.tiles[tilenum];
        let tbase = (tile.line.wrapping_mul(t & 0xff).wrapping_add(tile.tmem)) as u32;
        let tpal = (tile.palette as u32) << 4;
        let s = s as u32;
        let nibble = |byte: u32| if s & 1 != 0 { byte & 0xf } else { byte >> 4 };

        let c = match tile.f.tlutswitch {
            0..=2 => {
                let taddr = ((tbase << 4).wrapping_add(s) >> 1) ^ byte_xor(t);
                let c = nibble(self.tmem8(taddr & 0x7ff) as u32);
                self.tlut(((tpal | c) << 2) ^ WORD_ADDR_XOR)
            }
            3 => {
                let taddr = (tbase << 3).wrapping_add(s) ^ byte_xor(t);
                let c = nibble(self.tmem8(taddr & 0x7ff) as u32);
                self.tlut(((tpal | c) << 2) ^ WORD_ADDR_XOR)
            }
            4..=7 | 11 | 15 => {
                let taddr = (tbase << 3).wrapping_add(s) ^ byte_xor(t);
                let c = self.tmem8(taddr & 0x7ff) as u32;
                self.tlut((c << 2) ^ WORD_ADDR_XOR)
            }
            8..=10 | 12..=14 => {
                let taddr = (tbase << 2).wrapping_add(s) ^ word_xor(t);
                let c = self.tmem16(taddr & 0x3ff) as u32;
                self.tlut(((c >> 6) & !3) ^ WORD_ADDR_XOR)
            }
            _ => {
                log::error!(
                    "fetch_texel_entlut: unknown texture format {}, size {}, tilenum {}",
                    tile.format,
                    tile.size,
                    tilenum
                );
                return Color::default();
            }
        };
        let c = c as u32;

        if self.other_modes.tlut_type {
            ia16_to_color(c)
        } else {
            rgba16_to_color(c)
        }
    }

    /// Fetch the 2x2 footprint `(s0,t0) (s1,t0) (s0,t1) (s1,t1)` for bilinear filtering
    #[inline(always)]
    pub(in crate::core::rdp) fn fetch_texel_quadro(&self, s: [i32; 2], t: [i32; 2], tilenum: usize) -> [Color; 4] {
        let fetch = |s, t| {
            if self.other_modes.en_tlut {
                self.fetch_texel_entlut(s, t, tilenum)
            } else {
                self.fetch_texel(s, t, tilenum)
            }
        };
        [
            fetch(s[0], t[0]),
            fetch(s[1], t[0]),
            fetch(s[0], t[1]),
            fetch(s[1], t[1]),
        ]
    }
}

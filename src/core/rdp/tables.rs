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

//! Fixed-point lookup tables
//!
//! Every table the pixel pipeline consults is built once per process and
//! shared read-only by all workers through [`tables`].
//!
//! | Table                 | Entries  | Used by                               |
//! |-----------------------|----------|---------------------------------------|
//! | `z_com`               | 0x40000  | depth store (18-bit to 14-bit float)  |
//! | `z_complete_dec`      | 0x4000   | depth compare (14-bit float to 18-bit)|
//! | `deltaz_comparator`   | 0x10000  | depth compare (dz magnitude)          |
//! | `tcdiv`               | 0x8000   | perspective divide (shift, 1/w)       |
//! | `bldiv`               | 0x8000   | blender normalising divide            |
//! | `clamp9` / `ext9`     | 0x200    | combiner 9-bit clamp and sign extend  |
//! | `log2`                | 0x100    | LOD tile selection                    |
//! | `replicated_rgba`     | 0x20     | RGBA5551 channel expansion            |
//! | `maskbits`            | 0x10     | texture coordinate masking            |
//! | `cvarray`             | 0x100    | coverage byte decode                  |

use std::sync::OnceLock;

/// 4x4 ordered dither matrix (bayer)
pub const BAYER_MATRIX: [i32; 16] = [0, 4, 1, 5, 4, 0, 5, 1, 3, 7, 2, 6, 7, 3, 6, 2];

/// 4x4 ordered dither matrix (magic square)
pub const MAGIC_MATRIX: [i32; 16] = [0, 6, 1, 7, 4, 2, 5, 3, 3, 5, 2, 4, 7, 1, 6, 0];

const NORM_POINT_TABLE: [i32; 64] = [
    0x4000, 0x3f04, 0x3e10, 0x3d22, 0x3c3c, 0x3b5d, 0x3a83, 0x39b1, 0x38e4, 0x381c, 0x375a, 0x369d,
    0x35e5, 0x3532, 0x3483, 0x33d9, 0x3333, 0x3291, 0x31f4, 0x3159, 0x30c3, 0x3030, 0x2fa1, 0x2f15,
    0x2e8c, 0x2e06, 0x2d83, 0x2d03, 0x2c86, 0x2c0b, 0x2b93, 0x2b1e, 0x2aab, 0x2a3a, 0x29cc, 0x2960,
    0x28f6, 0x288e, 0x2828, 0x27c4, 0x2762, 0x2702, 0x26a4, 0x2648, 0x25ed, 0x2594, 0x253d, 0x24e7,
    0x2492, 0x243f, 0x23ee, 0x239e, 0x234f, 0x2302, 0x22b6, 0x226c, 0x2222, 0x21da, 0x2193, 0x214d,
    0x2108, 0x20c5, 0x2082, 0x2041,
];

const NORM_SLOPE_TABLE: [i32; 64] = [
    0xf03, 0xf0b, 0xf11, 0xf19, 0xf20, 0xf25, 0xf2d, 0xf32, 0xf37, 0xf3d, 0xf42, 0xf47, 0xf4c,
    0xf50, 0xf55, 0xf59, 0xf5d, 0xf62, 0xf64, 0xf69, 0xf6c, 0xf70, 0xf73, 0xf76, 0xf79, 0xf7c,
    0xf7f, 0xf82, 0xf84, 0xf87, 0xf8a, 0xf8c, 0xf8e, 0xf91, 0xf93, 0xf95, 0xf97, 0xf99, 0xf9b,
    0xf9d, 0xf9f, 0xfa1, 0xfa3, 0xfa4, 0xfa6, 0xfa8, 0xfa9, 0xfaa, 0xfac, 0xfae, 0xfaf, 0xfb0,
    0xfb2, 0xfb3, 0xfb5, 0xfb5, 0xfb7, 0xfb8, 0xfb9, 0xfba, 0xfbc, 0xfbc, 0xfbe, 0xfbe,
];

/// (shift, add) per depth exponent
const Z_DEC_TABLE: [(u32, u32); 8] = [
    (6, 0x00000),
    (5, 0x20000),
    (4, 0x30000),
    (3, 0x38000),
    (2, 0x3c000),
    (1, 0x3e000),
    (0, 0x3f000),
    (0, 0x3f800),
];

/// Decoded coverage byte
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoverageDerivative {
    /// Number of covered sub-samples (0-8)
    pub cvg: u8,
    /// Bit 7 of the mask (the sample nearest the pixel center)
    pub cvbit: u8,
    /// Sub-pixel x offset of the first covered sample
    pub xoff: u8,
    /// Sub-pixel y offset of the first covered row
    pub yoff: u8,
}

/// All precomputed pipeline tables
pub struct Tables {
    pub z_com: Box<[u16]>,
    pub z_complete_dec: Box<[u32]>,
    pub deltaz_comparator: Box<[u16]>,
    pub tcdiv: Box<[i32]>,
    pub bldiv: Box<[u8]>,
    pub clamp9: [i32; 0x200],
    pub ext9: [i32; 0x200],
    pub log2: [i32; 0x100],
    pub replicated_rgba: [i32; 32],
    pub maskbits: [i32; 16],
    pub cvarray: [CoverageDerivative; 0x100],
}

static TABLES: OnceLock<Tables> = OnceLock::new();

/// Shared pipeline tables, built on first use
#[inline(always)]
pub fn tables() -> &'static Tables {
    TABLES.get_or_init(Tables::build)
}

impl Tables {
    fn build() -> Self {
        let mut log2 = [0; 0x100];
        for (i, entry) in log2.iter_mut().enumerate().skip(2) {
            *entry = (1..=7).rev().find(|&k| (i >> k) & 1 != 0).unwrap_or(0);
        }

        let mut replicated_rgba = [0; 32];
        for (i, entry) in replicated_rgba.iter_mut().enumerate() {
            let i = i as i32;
            *entry = (i << 3) | ((i >> 2) & 7);
        }

        let mut maskbits = [0x3ff; 16];
        for (i, entry) in maskbits.iter_mut().enumerate().skip(1) {
            *entry = ((0xffffu32 >> (16 - i)) & 0x3ff) as i32;
        }

        let mut clamp9 = [0; 0x200];
        let mut ext9 = [0; 0x200];
        for i in 0..0x200i32 {
            clamp9[i as usize] = match (i >> 7) & 3 {
                0 | 1 => i & 0xff,
                2 => 0xff,
                _ => 0,
            };
            ext9[i as usize] = if (i & 0x180) == 0x180 {
                i | !0x1ff
            } else {
                i & 0x1ff
            };
        }

        Self {
            z_com: build_z_com(),
            z_complete_dec: build_z_complete_dec(),
            deltaz_comparator: build_deltaz_comparator(),
            tcdiv: build_tcdiv(),
            bldiv: build_bldiv(),
            clamp9,
            ext9,
            log2,
            replicated_rgba,
            maskbits,
            cvarray: build_cvarray(),
        }
    }
}

fn build_z_com() -> Box<[u16]> {
    (0u32..0x40000)
        .map(|z| {
            let altmem = match (z >> 11) & 0x7f {
                0x00..=0x3f => (z >> 4) & 0x1ffc,
                0x40..=0x5f => ((z >> 3) & 0x1ffc) | 0x2000,
                0x60..=0x6f => ((z >> 2) & 0x1ffc) | 0x4000,
                0x70..=0x77 => ((z >> 1) & 0x1ffc) | 0x6000,
                0x78..=0x7b => (z & 0x1ffc) | 0x8000,
                0x7c..=0x7d => ((z << 1) & 0x1ffc) | 0xa000,
                0x7e => ((z << 2) & 0x1ffc) | 0xc000,
                _ => ((z << 2) & 0x1ffc) | 0xe000,
            };
            altmem as u16
        })
        .collect()
}

fn build_z_complete_dec() -> Box<[u32]> {
    (0u32..0x4000)
        .map(|i| {
            let (shift, add) = Z_DEC_TABLE[((i >> 11) & 7) as usize];
            (((i & 0x7ff) << shift) + add) & 0x3ffff
        })
        .collect()
}

fn build_deltaz_comparator() -> Box<[u16]> {
    (0u32..0x10000)
        .map(|i| match i {
            0 => 0,
            _ => 1u16 << (31 - i.leading_zeros()),
        })
        .collect()
}

fn build_tcdiv() -> Box<[i32]> {
    (0i32..0x8000)
        .map(|i| {
            let mut k = 1;
            while k <= 14 && ((i << k) & 0x8000) == 0 {
                k += 1;
            }
            let shift = k - 1;
            let mut normout = (i << shift) & 0x3fff;
            let wnorm = (normout & 0xff) << 2;
            normout >>= 8;

            let point = NORM_POINT_TABLE[normout as usize];
            let slope = (NORM_SLOPE_TABLE[normout as usize] | !0x3ff) + 1;
            let rcp = (((slope * wnorm) >> 10) + point) & 0x7fff;
            shift | (rcp << 4)
        })
        .collect()
}

/// Restoring divider of the blender, bit for bit
fn build_bldiv() -> Box<[u8]> {
    (0i32..0x8000)
        .map(|i| {
            let d = (i >> 11) & 0xf;
            let n = i & 0x7ff;
            let invd = !d & 0xf;
            let mut res = 0;
            let mut ps = [0i32; 9];
            ps[0] = (invd + (n >> 8) + 1) & 7;

            for k in 0..8 {
                let nbit = (n >> (7 - k)) & 1;
                let temp = if res & (0x100 >> k) != 0 {
                    invd + (ps[k] << 1) + nbit + 1
                } else {
                    d + (ps[k] << 1) + nbit
                };
                ps[k + 1] = temp & 7;
                if temp & 0x10 != 0 {
                    res |= 1 << (7 - k);
                }
            }
            res as u8
        })
        .collect()
}

/// Spread a coverage byte into the 4x4 sub-sample grid
pub fn decompress_cvmask(x: u8) -> u16 {
    let x = x as u16;
    (x & 1)
        | ((x & 2) << 4)
        | (x & 4)
        | ((x & 8) << 4)
        | ((x & 0x10) << 4)
        | ((x & 0x20) << 8)
        | ((x & 0x40) << 4)
        | ((x & 0x80) << 8)
}

fn build_cvarray() -> [CoverageDerivative; 0x100] {
    const YARRAY: [u8; 16] = [0, 0, 1, 0, 2, 0, 1, 0, 3, 0, 1, 0, 2, 0, 1, 0];
    const XARRAY: [u8; 16] = [0, 3, 2, 2, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0];

    let mut cvarray = [CoverageDerivative::default(); 0x100];
    for (i, entry) in cvarray.iter_mut().enumerate() {
        let mask = decompress_cvmask(i as u8);

        let mut masky = 0usize;
        for k in 0..4 {
            if mask & (0xf000 >> (k << 2)) != 0 {
                masky |= 1 << k;
            }
        }
        let offy = YARRAY[masky];
        let maskx = (mask & (0xf000 >> (offy << 2))) >> ((offy ^ 3) << 2);

        *entry = CoverageDerivative {
            cvg: (i as u8).count_ones() as u8,
            cvbit: ((i >> 7) & 1) as u8,
            xoff: XARRAY[maskx as usize],
            yoff: offy,
        };
    }
    cvarray
}

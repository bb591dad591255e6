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

//! Edge walkers
//!
//! Both walkers step the triangle edges in quarter-scanline sub-rows and
//! record, per scanline, the scissored left/right extents, the four
//! sub-row edge positions used for coverage and the attribute values at
//! the start of the span.
//!
//! Primitive edge data is 44 words: 8 edge words, then shade, texture and
//! depth coefficient blocks. Load commands build a reduced 10-word form.

use super::super::types::*;
use super::depth::normalize_dzpix;
use super::super::Pipeline;

/// Words of edge data for the largest primitive
pub(in crate::core::rdp) const EDGE_WORDS: usize = 44;

/// Attribute order inside [`Attributes`]
const S: usize = 0;
const T: usize = 1;
const W: usize = 2;
const R: usize = 3;
const G: usize = 4;
const B: usize = 5;
const A: usize = 6;
const Z: usize = 7;

/// Start value and gradients of the eight interpolated attributes
#[derive(Debug, Clone, Copy, Default)]
struct Attributes {
    start: [i32; 8],
    dx: [i32; 8],
    de: [i32; 8],
    dy: [i32; 8],
}

/// High 16.16 value built from the integer word and the fraction word
#[inline(always)]
fn hi_pair(int: u32, frac: u32) -> i32 {
    ((int & 0xffff0000) | (frac >> 16)) as i32
}

/// Low 16.16 value built from the integer word and the fraction word
#[inline(always)]
fn lo_pair(int: u32, frac: u32) -> i32 {
    ((int << 16) | (frac & 0xffff)) as i32
}

impl Attributes {
    fn decode(ew: &[u32; EDGE_WORDS]) -> Self {
        let mut a = Self::default();

        // Shade block: 8..24, texture block: 24..40
        let blocks = [(R, G, B, A, 8usize), (S, T, W, usize::MAX, 24)];
        for (x0, x1, x2, x3, base) in blocks {
            let pairs = [
                (&mut a.start, base, base + 4),
                (&mut a.dx, base + 2, base + 6),
                (&mut a.de, base + 8, base + 12),
                (&mut a.dy, base + 10, base + 14),
            ];
            for (dst, int, frac) in pairs {
                dst[x0] = hi_pair(ew[int], ew[frac]);
                dst[x1] = lo_pair(ew[int], ew[frac]);
                dst[x2] = hi_pair(ew[int + 1], ew[frac + 1]);
                if x3 != usize::MAX {
                    dst[x3] = lo_pair(ew[int + 1], ew[frac + 1]);
                }
            }
        }

        a.start[Z] = ew[40] as i32;
        a.dx[Z] = ew[41] as i32;
        a.de[Z] = ew[42] as i32;
        a.dy[Z] = ew[43] as i32;
        a
    }
}

/// Scissored sub-row edge position
///
/// Returns the 13-bit position (in half pixels) and whether the edge was
/// clamped on the right (`over`) or left (`under`) of the clip rectangle.
#[inline(always)]
fn scissor_x(x: i32, clipxhshift: i32, clipxlshift: i32) -> (i32, bool, bool) {
    let stickybit = (((x >> 1) & 0x1fff) > 0) as i32;
    let xsc = ((x >> 13) & 0x1ffe) | stickybit;
    let under = x & 0x8000000 != 0 || (xsc < clipxhshift && x & 0x4000000 == 0);
    let xsc = if under {
        clipxhshift
    } else {
        ((x >> 13) & 0x3ffe) | stickybit
    };
    let over = xsc & 0x2000 != 0 || (xsc & 0x1fff) >= clipxlshift;
    let xsc = if over { clipxlshift } else { xsc };
    (xsc, over, under)
}

/// Whether the walked edges cross on this sub-row
#[inline(always)]
fn edges_cross(left: i32, right: i32) -> bool {
    const MASK: i32 = 0x3fff << 14;
    ((left ^ (1 << 27)) & MASK) < ((right ^ (1 << 27)) & MASK)
}

impl Pipeline {
    /// Walk a triangle or rectangle and render its spans
    pub(in crate::core::rdp) fn edgewalker_for_prims(&mut self, ew: &[u32; EDGE_WORDS]) {
        if self.derivs.stale {
            self.deduce_derivatives();
            self.derivs.stale = false;
        }

        let flip = ew[0] & 0x800000 != 0;
        self.max_level = ((ew[0] >> 19) & 7) as i32;
        let tilenum = ((ew[0] >> 16) & 7) as usize;

        let yl = sign(ew[0] as i32, 14);
        let ym = sign((ew[1] >> 16) as i32, 14);
        let yh = sign(ew[1] as i32, 14);

        let xl = sign(ew[2] as i32, 28);
        let xh = sign(ew[4] as i32, 28);
        let xm = sign(ew[6] as i32, 28);

        let dxldy = sign(ew[3] as i32, 30);
        let dxhdy = sign(ew[5] as i32, 30);
        let dxmdy = sign(ew[7] as i32, 30);

        let attr = Attributes::decode(ew);
        self.set_span_deltas(&attr);

        let sign_dxhdy = ew[5] & 0x80000000 != 0;
        let do_offset = !(sign_dxhdy ^ flip);

        let mut diff = [0i32; 8];
        if do_offset {
            for (i, d) in diff.iter_mut().enumerate() {
                let deh = attr.de[i] & !0x1ff;
                let dyh = attr.dy[i] & !0x1ff;
                *d = deh
                    .wrapping_sub(deh >> 2)
                    .wrapping_sub(dyh)
                    .wrapping_add(dyh >> 2);
            }
        }

        let mut dxh = [0i32; 8];
        if self.other_modes.cycle_type != CycleType::Copy {
            for (i, d) in dxh.iter_mut().enumerate() {
                *d = (attr.dx[i] >> 8) & !1;
            }
        }

        let clip = self.clip;
        let yllimit = if yl & 0x2000 != 0 {
            yl
        } else if yl & 0x1000 != 0 {
            clip.yl
        } else if (yl & 0xfff) < clip.yl {
            yl
        } else {
            clip.yl
        };

        let mut ylfar = yllimit | 3;
        if (yl >> 2) > (ylfar >> 2) {
            ylfar += 4;
        } else if (yllimit >> 2) >= 0 && (yllimit >> 2) < 1023 {
            self.spans[((yllimit >> 2) + 1) as usize].validline = false;
        }

        let yhlimit = if yh & 0x2000 != 0 {
            clip.yh
        } else if yh & 0x1000 != 0 {
            yh
        } else if yh >= clip.yh {
            yh
        } else {
            clip.yh
        };
        let yhclose = yhlimit & !3;

        let clipxlshift = clip.xl << 1;
        let clipxhshift = clip.xh << 1;

        let mut xleft_inc = (dxmdy >> 2) & !1;
        let xright_inc = (dxhdy >> 2) & !1;
        let mut xright = xh & !1;
        let mut xleft = xm & !1;

        let ldflag = if sign_dxhdy ^ flip { 0 } else { 3 };
        let mut values = attr.start;

        // Flipped spans grow left to right: lx is the largest minor edge
        // and rx the smallest major edge. Otherwise the roles swap.
        let (lx_init, rx_init) = if flip { (0, 0xfff) } else { (0xfff, 0) };
        let mut lx_acc = lx_init;
        let mut rx_acc = rx_init;
        let mut allover = true;
        let mut allunder = true;
        let mut allinval = true;

        for k in (yh & !3)..=ylfar {
            if k == ym {
                xleft = xl & !1;
                xleft_inc = (dxldy >> 2) & !1;
            }

            let spix = (k & 3) as usize;

            if k >= yhclose {
                let mut invaly = k < yhlimit || k >= yllimit;
                let j = (k >> 2) as usize;

                if spix == 0 {
                    lx_acc = lx_init;
                    rx_acc = rx_init;
                    allover = true;
                    allunder = true;
                    allinval = true;
                }

                let (xrsc, over, under) = scissor_x(xright, clipxhshift, clipxlshift);
                self.spans[j].majorx[spix] = xrsc & 0x1fff;
                allover &= over;
                allunder &= under;

                let (xlsc, over, under) = scissor_x(xleft, clipxhshift, clipxlshift);
                self.spans[j].minorx[spix] = xlsc & 0x1fff;
                allover &= over;
                allunder &= under;

                invaly |= if flip {
                    edges_cross(xleft, xright)
                } else {
                    edges_cross(xright, xleft)
                };
                self.spans[j].invalyscan[spix] = invaly;
                allinval &= invaly;

                if !invaly {
                    let l = (xlsc >> 3) & 0xfff;
                    let r = (xrsc >> 3) & 0xfff;
                    if flip {
                        lx_acc = lx_acc.max(l);
                        rx_acc = rx_acc.min(r);
                    } else {
                        lx_acc = lx_acc.min(l);
                        rx_acc = rx_acc.max(r);
                    }
                }

                if spix == ldflag {
                    let xfrac = (xright >> 8) & 0xff;
                    let span = &mut self.spans[j];
                    span.unscrx = sign(xright >> 16, 12);
                    let adjust = |i: usize| {
                        ((values[i] & !0x1ff)
                            .wrapping_add(diff[i])
                            .wrapping_sub(xfrac.wrapping_mul(dxh[i])))
                            & !0x3ff
                    };
                    span.s = adjust(S);
                    span.t = adjust(T);
                    span.w = adjust(W);
                    span.r = adjust(R);
                    span.g = adjust(G);
                    span.b = adjust(B);
                    span.a = adjust(A);
                    span.z = adjust(Z);
                }

                if spix == 3 {
                    let field_ok = !self.scfield || !(self.sckeepodd ^ (j & 1 != 0));
                    let worker_ok = self.worker_count == 1 || j as u32 % self.worker_count == self.worker_id;
                    let span = &mut self.spans[j];
                    span.lx = lx_acc;
                    span.rx = rx_acc;
                    span.validline = !allinval && !allover && !allunder && field_ok && worker_ok;
                }
            }

            if spix == 3 {
                for (v, de) in values.iter_mut().zip(attr.de) {
                    *v = v.wrapping_add(de);
                }
            }

            xleft = xleft.wrapping_add(xleft_inc);
            xright = xright.wrapping_add(xright_inc);
        }

        log::trace!(
            "walked primitive lines {}..={} tile {} flip {}",
            yhlimit >> 2,
            yllimit >> 2,
            tilenum,
            flip
        );

        self.render_spans(yhlimit >> 2, yllimit >> 2, tilenum, flip);
    }

    /// Span gradients shared by every scanline of a primitive
    fn set_span_deltas(&mut self, attr: &Attributes) {
        let sd = &mut self.sd;
        sd.ds = attr.dx[S] & !0x1f;
        sd.dt = attr.dx[T] & !0x1f;
        sd.dw = attr.dx[W] & !0x1f;
        sd.dr = attr.dx[R] & !0x1f;
        sd.dg = attr.dx[G] & !0x1f;
        sd.db = attr.dx[B] & !0x1f;
        sd.da = attr.dx[A] & !0x1f;
        sd.dz = attr.dx[Z];

        sd.drdy = sign(attr.dy[R] >> 14, 13);
        sd.dgdy = sign(attr.dy[G] >> 14, 13);
        sd.dbdy = sign(attr.dy[B] >> 14, 13);
        sd.dady = sign(attr.dy[A] >> 14, 13);
        sd.dzdy = sign(attr.dy[Z] >> 10, 22);
        sd.cdr = sign(sd.dr >> 14, 13);
        sd.cdg = sign(sd.dg >> 14, 13);
        sd.cdb = sign(sd.db >> 14, 13);
        sd.cda = sign(sd.da >> 14, 13);
        sd.cdz = sign(sd.dz >> 10, 22);

        sd.dsdy = attr.dy[S] & !0x7fff;
        sd.dtdy = attr.dy[T] & !0x7fff;
        sd.dwdy = attr.dy[W] & !0x7fff;

        let magnitude = |d: i32| {
            let d = (d >> 16) & 0xffff;
            if d & 0x8000 != 0 {
                !d & 0x7fff
            } else {
                d
            }
        };
        let sum = magnitude(attr.dy[Z]) + magnitude(attr.dx[Z]);
        sd.dzpix = normalize_dzpix(sum & 0xffff) & 0xffff;
    }

    /// Walk a Load_Block, Load_Tile or Load_TLUT rectangle into TMEM
    pub(in crate::core::rdp) fn edgewalker_for_loads(&mut self, lew: &[u32; 10], coord_quad: bool, ltlut: bool) {
        self.max_level = 0;
        let tilenum = ((lew[0] >> 16) & 7) as usize;

        let yl = sign(lew[0] as i32, 14);
        let ym = sign((lew[1] >> 16) as i32, 14);
        let yh = sign(lew[1] as i32, 14);

        let xl = sign(lew[2] as i32, 28);
        let xh = sign(lew[3] as i32, 28);
        let xm = sign(lew[4] as i32, 28);

        let s = (lew[5] & 0xffff0000) as i32;
        let mut t = ((lew[5] & 0xffff) << 16) as i32;
        let dsdx = hi_pair(lew[7], lew[6]);
        let dtdx = lo_pair(lew[7], lew[6]);
        let dtde = ((lew[9] & 0xffff) << 16) as i32;

        self.sd.ds = dsdx & !0x1f;
        self.sd.dt = dtdx & !0x1f;
        self.sd.dw = 0;

        let xright = xh & !1;
        let mut xleft = xm & !1;
        let xend = xright >> 16;

        let yllimit = yl;
        let yhlimit = yh;
        let mut lx_acc = 0;
        let mut rx_acc = 0xfff;

        for k in (yh & !3)..=(yl | 3) {
            if k == ym {
                xleft = xl & !1;
            }

            let spix = k & 3;

            if k & !0xfff == 0 {
                let j = (k >> 2) as usize;
                let valid_y = !(k < yhlimit || k >= yllimit);

                if spix == 0 {
                    lx_acc = 0;
                    rx_acc = 0xfff;
                }

                let xrsc = (xright >> 13) & 0x7ffe;
                let xlsc = (xleft >> 13) & 0x7ffe;

                if valid_y {
                    lx_acc = lx_acc.max((xlsc >> 3) & 0xfff);
                    rx_acc = rx_acc.min((xrsc >> 3) & 0xfff);
                }

                let span = &mut self.spans[j];
                if spix == 0 {
                    span.unscrx = xend;
                    span.s = s & !0x3ff;
                    span.t = t & !0x3ff;
                }

                if spix == 3 {
                    span.lx = lx_acc;
                    span.rx = rx_acc;
                }
            }

            if spix == 3 {
                t = t.wrapping_add(dtde);
            }
        }

        self.loading_pipeline(yhlimit >> 2, yllimit >> 2, tilenum, coord_quad, ltlut);
    }
}

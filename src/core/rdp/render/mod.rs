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

//! Span renderers
//!
//! The edge walker fills one [`Span`](super::Span) per scanline; the
//! renderers here then walk each valid span pixel by pixel through the
//! texture unit, combiner, depth test and blender. One renderer exists per
//! cycle type, and the 1-cycle and 2-cycle renderers skip texture work the
//! current combiner does not read.

mod copy;
mod coverage;
mod depth;
mod dither;
mod edgewalker;
mod fill;
mod framebuffer;
mod load;
mod span1;
mod span2;

use depth::dz_compress;
pub(in crate::core::rdp) use edgewalker::EDGE_WORDS;

use super::tables::tables;
use super::texture::TexStep;
use super::types::*;
use super::Pipeline;

/// Per-pixel increments of a primitive, oriented along the walk direction
#[derive(Debug, Clone, Copy, Default)]
pub(in crate::core::rdp) struct SpanStep {
    pub dr: i32,
    pub dg: i32,
    pub db: i32,
    pub da: i32,
    pub dz: i32,
    pub ds: i32,
    pub dt: i32,
    pub dw: i32,
    pub xinc: i32,
    pub dzpix: u32,
    pub dzpixenc: u32,
}

/// Interpolators and addresses of the pixel being rendered
#[derive(Debug, Clone, Copy, Default)]
pub(in crate::core::rdp) struct SpanCursor {
    pub r: i32,
    pub g: i32,
    pub b: i32,
    pub a: i32,
    pub z: i32,
    pub s: i32,
    pub t: i32,
    pub w: i32,
    pub x: i32,
    pub curpixel: i32,
    pub zbcur: i32,
    /// Pixels in the span minus one
    pub length: i32,
    /// Length including the part cut off by the scissor
    pub lodlength: i32,
}

impl SpanCursor {
    /// Integer shade color in 10.2 (plus guard) precision
    #[inline(always)]
    fn shade(&self) -> (i32, i32, i32, i32) {
        (self.r >> 14, self.g >> 14, self.b >> 14, self.a >> 14)
    }

    #[inline(always)]
    fn depth(&self) -> i32 {
        (self.z >> 10) & 0x3fffff
    }

    #[inline(always)]
    fn tex_coords(&self) -> (i32, i32, i32) {
        (self.s >> 16, self.t >> 16, self.w >> 16)
    }

    #[inline(always)]
    fn tex_step(&self, step: &SpanStep) -> TexStep {
        TexStep {
            s: self.s,
            t: self.t,
            w: self.w,
            dsinc: step.ds,
            dtinc: step.dt,
            dwinc: step.dw,
        }
    }

    #[inline(always)]
    fn advance_tex(&mut self, step: &SpanStep) {
        self.s = self.s.wrapping_add(step.ds);
        self.t = self.t.wrapping_add(step.dt);
        self.w = self.w.wrapping_add(step.dw);
    }

    #[inline(always)]
    fn advance(&mut self, step: &SpanStep) {
        self.r = self.r.wrapping_add(step.dr);
        self.g = self.g.wrapping_add(step.dg);
        self.b = self.b.wrapping_add(step.db);
        self.a = self.a.wrapping_add(step.da);
        self.z = self.z.wrapping_add(step.dz);
        self.x += step.xinc;
        self.curpixel = self.curpixel.wrapping_add(step.xinc);
        self.zbcur = self.zbcur.wrapping_add(step.xinc);
    }
}

/// Coverage of one pixel decoded from the coverage buffer
#[derive(Debug, Clone, Copy, Default)]
pub(in crate::core::rdp) struct PixelCoverage {
    pub cvg: u32,
    pub cvbit: u32,
    pub offx: i32,
    pub offy: i32,
}

impl Pipeline {
    /// Dispatch a walked primitive to the renderer of the current cycle type
    pub(in crate::core::rdp) fn render_spans(&mut self, start: i32, end: i32, tilenum: usize, flip: bool) {
        match self.other_modes.cycle_type {
            CycleType::OneCycle => self.render_spans_1cycle(start, end, tilenum, flip),
            CycleType::TwoCycle => self.render_spans_2cycle(start, end, tilenum, flip),
            CycleType::Copy => self.render_spans_copy(start, end, tilenum, flip),
            CycleType::Fill => self.render_spans_fill(start, end, flip),
        }
    }

    /// Increments for a primitive walked left-to-right (`flip`) or right-to-left
    ///
    /// With primitive depth selected the depth gradients are zeroed.
    pub(in crate::core::rdp) fn span_step(&mut self, flip: bool) -> SpanStep {
        let sd = &self.sd;
        let dir = if flip { 1 } else { -1 };
        let mut step = SpanStep {
            dr: sd.dr * dir,
            dg: sd.dg * dir,
            db: sd.db * dir,
            da: sd.da * dir,
            dz: sd.dz * dir,
            ds: sd.ds * dir,
            dt: sd.dt * dir,
            dw: sd.dw * dir,
            xinc: dir,
            dzpix: 0,
            dzpixenc: 0,
        };

        if !self.other_modes.z_source_sel {
            step.dzpix = self.sd.dzpix as u32;
        } else {
            step.dzpix = self.primitive_delta_z as u32;
            step.dz = 0;
            self.sd.cdz = 0;
            self.sd.dzdy = 0;
        }
        step.dzpixenc = dz_compress(step.dzpix);
        step
    }

    /// Set up the cursor for scanline `i` and build its coverage
    ///
    /// The interpolators start at the unscissored edge and are advanced to
    /// the first visible pixel.
    pub(in crate::core::rdp) fn begin_span(&mut self, i: usize, flip: bool, step: &SpanStep) -> SpanCursor {
        let span = self.spans[i];
        let x = span.rx;
        let curpixel = (self.color_image.width as i32).wrapping_mul(i as i32).wrapping_add(x);

        let (length, scdiff) = if flip {
            (span.lx - span.rx, span.rx - span.unscrx)
        } else {
            (span.rx - span.lx, span.unscrx - span.rx)
        };
        self.compute_cvg(i, flip);

        let mut cursor = SpanCursor {
            r: span.r,
            g: span.g,
            b: span.b,
            a: span.a,
            z: if self.other_modes.z_source_sel {
                self.primitive_z
            } else {
                span.z
            },
            s: span.s,
            t: span.t,
            w: span.w,
            x,
            curpixel,
            zbcur: ((self.zb_address >> 1) as i32).wrapping_add(curpixel),
            length,
            lodlength: length + scdiff,
        };

        if scdiff != 0 {
            let scdiff = scdiff & 0xfff;
            let adv = |v: i32, inc: i32| v.wrapping_add(inc.wrapping_mul(scdiff));
            cursor.r = adv(cursor.r, step.dr);
            cursor.g = adv(cursor.g, step.dg);
            cursor.b = adv(cursor.b, step.db);
            cursor.a = adv(cursor.a, step.da);
            cursor.z = adv(cursor.z, step.dz);
            cursor.s = adv(cursor.s, step.ds);
            cursor.t = adv(cursor.t, step.dt);
            cursor.w = adv(cursor.w, step.dw);
            cursor.lodlength = length + scdiff;
        }
        cursor
    }

    /// Decode the coverage buffer entry of pixel `x`
    #[inline(always)]
    pub(in crate::core::rdp) fn pixel_coverage(&self, x: i32) -> PixelCoverage {
        let cv = tables().cvarray[self.cvgbuf[(x & 0x3ff) as usize] as usize];
        PixelCoverage {
            cvg: cv.cvg as u32,
            cvbit: cv.cvbit as u32,
            offx: cv.xoff as i32,
            offy: cv.yoff as i32,
        }
    }

    /// Shade, combine, depth test, blend and write one 1-cycle pixel
    pub(in crate::core::rdp) fn shade_pixel_1cycle(
        &mut self,
        cursor: &SpanCursor,
        y: i32,
        mut cov: PixelCoverage,
        step: &SpanStep,
    ) {
        let sz = self.rgbaz_correct_clip((cov.offx, cov.offy), cursor.shade(), cursor.depth(), cov.cvg);
        let (cdith, adith) = self.dither_noise(cursor.x, y);
        self.combiner_1cycle(adith, &mut cov.cvg);

        let memcvg = self.fbread1(cursor.curpixel as u32);
        let zb = cursor.zbcur as u32;
        let depth = self.z_compare(zb, sz as u32, step.dzpix, step.dzpixenc, &mut cov.cvg, memcvg);
        if !depth.pass {
            return;
        }
        if let Some(rgb) = self.blender_1cycle(cdith, depth.blend_en, depth.prewrap, cov.cvg, cov.cvbit) {
            self.fbwrite(cursor.curpixel as u32, rgb, depth.blend_en, cov.cvg, memcvg);
            if self.other_modes.z_update_en {
                self.z_store(zb, sz as u32, step.dzpixenc);
            }
        }
    }

    /// Shade, combine, depth test, blend and write one 2-cycle pixel
    pub(in crate::core::rdp) fn shade_pixel_2cycle(
        &mut self,
        cursor: &SpanCursor,
        y: i32,
        mut cov: PixelCoverage,
        step: &SpanStep,
    ) {
        let sz = self.rgbaz_correct_clip((cov.offx, cov.offy), cursor.shade(), cursor.depth(), cov.cvg);
        let (cdith, adith) = self.dither_noise(cursor.x, y);
        let acalpha = self.combiner_2cycle(adith, &mut cov.cvg);

        let memcvg = self.fbread2(cursor.curpixel as u32);
        let zb = cursor.zbcur as u32;
        let depth = self.z_compare(zb, sz as u32, step.dzpix, step.dzpixenc, &mut cov.cvg, memcvg);
        if !depth.pass {
            self.memory = self.pre_memory;
            return;
        }
        if let Some(rgb) =
            self.blender_2cycle(cdith, depth.blend_en, depth.prewrap, cov.cvg, cov.cvbit, acalpha)
        {
            self.fbwrite(cursor.curpixel as u32, rgb, depth.blend_en, cov.cvg, memcvg);
            if self.other_modes.z_update_en {
                self.z_store(zb, sz as u32, step.dzpixenc);
            }
        }
    }
}

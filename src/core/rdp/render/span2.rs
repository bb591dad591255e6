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

//! Two-cycle span renderer
//!
//! Both texels of the next pixel are fetched while the current pixel is
//! combined; the combiner shifts them into place between its two cycles.

use super::super::types::*;
use super::super::Pipeline;

impl Pipeline {
    pub(in crate::core::rdp) fn render_spans_2cycle(&mut self, start: i32, end: i32, tilenum: usize, flip: bool) {
        let step = self.span_step(flip);
        let prim_tile = tilenum;
        let mut tile1 = tilenum;
        let mut tile2 = (tilenum + 1) & 7;
        let mut newtile1 = tile1;
        let mut newtile2 = tile2;
        let mut prelodfrac = 0;
        let variant = self.derivs.two_cycle;

        log::trace!(
            "2-cycle spans {}..={} tile {} flip {} ({:?})",
            start,
            end,
            tilenum,
            flip,
            variant
        );

        for i in start..=end {
            let line = i as usize;
            if !self.spans[line].validline {
                continue;
            }
            self.seed_line(line);
            let mut cursor = self.begin_span(line, flip, &step);
            let mut startspan = true;

            for _ in 0..=cursor.length {
                let cov = self.pixel_coverage(cursor.x);

                match variant {
                    TwoCycleVariant::Complete => {
                        let tex = cursor.tex_step(&step);
                        let (news, newt) = self.get_nexttexel0_2cycle(&tex);

                        if !startspan {
                            self.lod_frac = prelodfrac;
                            self.texel0 = self.nexttexel;
                            self.texel1 = self.nexttexel1;
                        } else {
                            let (ss, st, sw) = cursor.tex_coords();
                            let (mut sss, mut sst) = self.tcdiv(ss, st, sw);
                            self.tclod_2cycle_current(
                                &mut sss,
                                &mut sst,
                                (news, newt),
                                &tex,
                                prim_tile,
                                &mut tile1,
                                &mut tile2,
                            );
                            self.texel0 = self.texture_pipeline_cycle(&self.texel0, sss, sst, tile1, 0);
                            self.texel1 = self.texture_pipeline_cycle(&self.texel0, sss, sst, tile2, 1);
                            startspan = false;
                        }

                        cursor.advance_tex(&step);
                        let tex = cursor.tex_step(&step);
                        let (mut news, mut newt) = (news, newt);
                        self.tclod_2cycle_next(
                            &mut news,
                            &mut newt,
                            &tex,
                            prim_tile,
                            &mut newtile1,
                            &mut newtile2,
                            &mut prelodfrac,
                        );
                        self.nexttexel = self.texture_pipeline_cycle(&self.nexttexel, news, newt, newtile1, 0);
                        self.nexttexel1 = self.texture_pipeline_cycle(&self.nexttexel, news, newt, newtile2, 1);
                    }
                    TwoCycleVariant::NoTexelNext => {
                        let tex = cursor.tex_step(&step);
                        let (ss, st, sw) = cursor.tex_coords();
                        let (mut sss, mut sst) = self.tcdiv(ss, st, sw);
                        self.tclod_2cycle_current_simple(&mut sss, &mut sst, &tex, prim_tile, &mut tile1, &mut tile2);
                        self.texel0 = self.texture_pipeline_cycle(&self.texel0, sss, sst, tile1, 0);
                        self.texel1 = self.texture_pipeline_cycle(&self.texel0, sss, sst, tile2, 1);
                        cursor.advance_tex(&step);
                    }
                    TwoCycleVariant::NoTexel1 => {
                        let tex = cursor.tex_step(&step);
                        let (ss, st, sw) = cursor.tex_coords();
                        let (mut sss, mut sst) = self.tcdiv(ss, st, sw);
                        self.tclod_2cycle_current_notexel1(&mut sss, &mut sst, &tex, prim_tile, &mut tile1);
                        self.texel0 = self.texture_pipeline_cycle(&self.texel0, sss, sst, tile1, 0);
                        cursor.advance_tex(&step);
                    }
                    TwoCycleVariant::NoTex => {}
                }

                self.shade_pixel_2cycle(&cursor, i, cov, &step);
                cursor.advance(&step);
            }
        }
    }
}

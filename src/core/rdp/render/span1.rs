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

//! One-cycle span renderer
//!
//! Texel 0 of the next pixel is fetched one pixel ahead (as texel 1) so
//! that LOD can look at neighbouring coordinates, mirroring the hardware
//! pipeline delay.

use super::super::types::*;
use super::super::Pipeline;

impl Pipeline {
    pub(in crate::core::rdp) fn render_spans_1cycle(&mut self, start: i32, end: i32, tilenum: usize, flip: bool) {
        let step = self.span_step(flip);
        let prim_tile = tilenum;
        let mut tile1 = tilenum;
        let mut newtile = tilenum;
        let mut prelodfrac = 0;
        let variant = self.derivs.one_cycle;

        log::trace!(
            "1-cycle spans {}..={} tile {} flip {} ({:?})",
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
            let length = cursor.length;
            let mut sigs = SpanSigs {
                longspan: cursor.lodlength > 7,
                midspan: cursor.lodlength == 7,
                onelessthanmid: cursor.lodlength == 6,
                startspan: true,
                ..SpanSigs::default()
            };

            for j in 0..=length {
                let cov = self.pixel_coverage(cursor.x);
                sigs.endspan = j == length;
                sigs.preendspan = j == length - 1;

                match variant {
                    OneCycleVariant::Complete => {
                        let tex = cursor.tex_step(&step);
                        let (mut news, mut newt) = self.get_texel1_1cycle(&tex, line, &sigs);

                        if !sigs.startspan {
                            self.texel0 = self.texel1;
                            self.lod_frac = prelodfrac;
                        } else {
                            let (ss, st, sw) = cursor.tex_coords();
                            let (mut sss, mut sst) = self.tcdiv(ss, st, sw);
                            self.tclod_1cycle_current(
                                &mut sss,
                                &mut sst,
                                (news, newt),
                                &tex,
                                line,
                                prim_tile,
                                &mut tile1,
                                &sigs,
                            );
                            self.texel0 = self.texture_pipeline_cycle(&self.texel0, sss, sst, tile1, 0);
                            sigs.startspan = false;
                        }

                        sigs.nextspan = sigs.endspan;
                        sigs.endspan = sigs.preendspan;
                        sigs.preendspan = j == length - 2;

                        cursor.advance_tex(&step);
                        let tex = cursor.tex_step(&step);
                        self.tclod_1cycle_next(
                            &mut news,
                            &mut newt,
                            &tex,
                            line,
                            prim_tile,
                            &mut newtile,
                            &sigs,
                            &mut prelodfrac,
                        );
                        self.texel1 = self.texture_pipeline_cycle(&self.texel1, news, newt, newtile, 0);
                    }
                    OneCycleVariant::NoTexel1 => {
                        let tex = cursor.tex_step(&step);
                        let (ss, st, sw) = cursor.tex_coords();
                        let (mut sss, mut sst) = self.tcdiv(ss, st, sw);
                        self.tclod_1cycle_current_simple(&mut sss, &mut sst, &tex, line, prim_tile, &mut tile1, &sigs);
                        self.texel0 = self.texture_pipeline_cycle(&self.texel0, sss, sst, tile1, 0);
                        cursor.advance_tex(&step);
                    }
                    OneCycleVariant::NoTex => {}
                }

                self.shade_pixel_1cycle(&cursor, i, cov, &step);
                cursor.advance(&step);
            }
        }
    }
}

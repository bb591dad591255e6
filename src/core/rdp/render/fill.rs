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

//! Fill cycle renderer

use super::super::crash::CrashWarning;
use super::super::types::*;
use super::super::Pipeline;

impl Pipeline {
    /// Write the fill color over every pixel of spans `start..=end`
    ///
    /// Fill mode cannot read memory. Image read or depth compare crash the
    /// pipeline before anything is written; depth update without a
    /// primitive depth source lets the first line through and then crashes.
    pub(in crate::core::rdp) fn render_spans_fill(&mut self, start: i32, end: i32, flip: bool) {
        if self.color_image.size == PIXEL_SIZE_4BIT {
            self.crash.crash_with_warning(
                CrashWarning::FillCrash,
                "fill cycle into a 4-bit color image, RDP crashed",
            );
            return;
        }

        let modes = self.other_modes;
        let fastkill = modes.image_read_en || modes.z_compare_en;
        let slowkill = modes.z_update_en && !modes.z_source_sel && !fastkill;

        let xinc: i32 = if flip { 1 } else { -1 };
        let width = self.color_image.width as i32;

        for i in start..=end {
            let span = self.spans[i as usize];
            if !span.validline {
                continue;
            }

            let length = if flip { span.lx - span.rx } else { span.rx - span.lx };
            if fastkill && length >= 0 {
                self.crash.crash_with_warning(
                    CrashWarning::FillBitCrash,
                    "fill cycle with image read or depth compare enabled, RDP crashed",
                );
                return;
            }

            let mut curpixel = width.wrapping_mul(i).wrapping_add(span.rx);
            for _ in 0..=length {
                self.fbfill(curpixel as u32);
                curpixel = curpixel.wrapping_add(xinc);
            }

            if slowkill && length >= 0 {
                self.crash.crash_with_warning(
                    CrashWarning::FillBitCrash,
                    "fill cycle with depth update enabled, RDP crashed",
                );
                return;
            }
        }
    }
}

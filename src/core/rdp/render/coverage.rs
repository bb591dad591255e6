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

//! Per-pixel coverage masks
//!
//! Each span stores the major and minor edge of its four sub-scanlines in
//! eighths of a pixel. The coverage buffer packs, for every pixel of the
//! scanline, the eight sample points (two per sub-scanline) covered by the
//! primitive.

use super::super::Pipeline;

/// Samples right of edge position `x` within a pixel
#[inline(always)]
fn rightcvghex(x: i32, fmask: u8) -> u8 {
    let covered = (((x & 7) + 1) >> 1) as u32;
    (0xf0u32 >> covered) as u8 & fmask
}

/// Samples left of edge position `x` within a pixel
#[inline(always)]
fn leftcvghex(x: i32, fmask: u8) -> u8 {
    let covered = (((x & 7) + 1) >> 1) as u32;
    (0x0fu32 >> covered) as u8 & fmask
}

impl Pipeline {
    /// Fill the coverage buffer for `scanline`
    ///
    /// With `flip` the major edge is on the left and pixels run from `rx`
    /// to `lx`; otherwise the minor edge is on the left.
    pub(in crate::core::rdp) fn compute_cvg(&mut self, scanline: usize, flip: bool) {
        let span = self.spans[scanline];
        let (purgestart, purgeend) = if flip { (span.rx, span.lx) } else { (span.lx, span.rx) };
        if purgeend < purgestart {
            return;
        }
        let (purgestart, purgeend) = (purgestart as usize, purgeend as usize);
        let buf = &mut self.cvgbuf;
        buf[purgestart..=purgeend].fill(0xff);

        for i in 0..4 {
            let fmask: u8 = 0xa >> (i & 1);
            let maskshift = ((i as i32 - 2) & 4) as u32;
            let clear = !(fmask << maskshift);

            if span.invalyscan[i] {
                buf[purgestart..=purgeend].iter_mut().for_each(|c| *c &= clear);
                continue;
            }

            let minorcur = span.minorx[i];
            let majorcur = span.majorx[i];
            let minorint = (minorcur >> 3) as usize;
            let majorint = (majorcur >> 3) as usize;

            if flip {
                for c in buf.iter_mut().take(majorint + 1).skip(purgestart) {
                    *c &= clear;
                }
                for c in buf.iter_mut().take(purgeend + 1).skip(minorint) {
                    *c &= clear;
                }
                if minorint > majorint {
                    buf[minorint] |= rightcvghex(minorcur, fmask) << maskshift;
                    buf[majorint] |= leftcvghex(majorcur, fmask) << maskshift;
                } else if minorint == majorint {
                    let same = rightcvghex(minorcur, fmask) & leftcvghex(majorcur, fmask);
                    buf[majorint] |= same << maskshift;
                }
            } else {
                for c in buf.iter_mut().take(minorint + 1).skip(purgestart) {
                    *c &= clear;
                }
                for c in buf.iter_mut().take(purgeend + 1).skip(majorint) {
                    *c &= clear;
                }
                if majorint > minorint {
                    buf[minorint] |= leftcvghex(minorcur, fmask) << maskshift;
                    buf[majorint] |= rightcvghex(majorcur, fmask) << maskshift;
                } else if minorint == majorint {
                    let same = leftcvghex(minorcur, fmask) & rightcvghex(majorcur, fmask);
                    buf[majorint] |= same << maskshift;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_masks_at_pixel_boundaries() {
        assert_eq!(rightcvghex(0, 0xff), 0xf0);
        assert_eq!(leftcvghex(0, 0xff), 0x0f);
        assert_eq!(rightcvghex(7, 0xff), 0x0f);
        assert_eq!(leftcvghex(7, 0xff), 0x00);
        assert_eq!(rightcvghex(3, 0xa), 0x08);
    }
}

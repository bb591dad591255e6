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

use super::*;

#[test]
fn test_pair_write16_sets_hidden() {
    let rdram = Rdram::new(0x100).unwrap();
    rdram.pair_write16(5, 0x1234, 2);

    assert_eq!(rdram.read_idx16(5), 0x1234);
    assert_eq!(rdram.hidden(5), 2);
    assert_eq!(rdram.hidden(4), 0);
}

#[test]
fn test_pair_write8_only_odd_bytes_touch_hidden() {
    let rdram = Rdram::new(0x100).unwrap();

    rdram.pair_write8(8, 0x55, 3);
    assert_eq!(rdram.hidden(4), 0);

    rdram.pair_write8(9, 0x66, 3);
    assert_eq!(rdram.hidden(4), 3);
    assert_eq!(rdram.read_idx16(4), 0x5566);
}

#[test]
fn test_pair_write32_sets_both_halves() {
    let rdram = Rdram::new(0x100).unwrap();
    rdram.pair_write32(3, 0xDEAD_BEEF, 1, 2);

    assert_eq!(rdram.read_idx32(3), 0xDEAD_BEEF);
    assert_eq!(rdram.hidden(6), 1);
    assert_eq!(rdram.hidden(7), 2);
}

#[test]
fn test_plain_writes_keep_hidden() {
    let rdram = Rdram::new(0x100).unwrap();
    rdram.pair_write16(0, 0x0001, 3);
    rdram.write_idx16(0, 0x0002);

    assert_eq!(rdram.pair_read16(0), (0x0002, 3));
}

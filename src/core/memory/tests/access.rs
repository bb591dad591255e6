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
fn test_invalid_sizes_rejected() {
    assert!(Rdram::new(0).is_err());
    assert!(Rdram::new(6).is_err());
    assert!(Rdram::new(Rdram::MAX_SIZE + 4).is_err());
    assert!(Rdram::new(Rdram::MAX_SIZE).is_ok());
}

#[test]
fn test_byte_lanes_are_big_endian() {
    let rdram = Rdram::new(0x100).unwrap();
    rdram.write_idx32(1, 0xAABB_CCDD);

    assert_eq!(rdram.read_addr8(4), 0xAA);
    assert_eq!(rdram.read_addr8(5), 0xBB);
    assert_eq!(rdram.read_addr8(6), 0xCC);
    assert_eq!(rdram.read_addr8(7), 0xDD);
    assert_eq!(rdram.read_idx16(2), 0xAABB);
    assert_eq!(rdram.read_idx16(3), 0xCCDD);
}

#[test]
fn test_subword_writes_preserve_neighbours() {
    let rdram = Rdram::new(0x100).unwrap();
    rdram.write_idx32(0, 0x1122_3344);

    rdram.write_addr8(2, 0xEE);
    assert_eq!(rdram.read_idx32(0), 0x1122_EE44);

    rdram.write_idx16(0, 0xABCD);
    assert_eq!(rdram.read_idx32(0), 0xABCD_EE44);
}

#[test]
fn test_out_of_range_access() {
    let rdram = Rdram::new(0x100).unwrap();

    rdram.write_idx32(0x40, 0xFFFF_FFFF);
    rdram.write_addr8(0x200, 0xFF);
    rdram.pair_write16(0x80, 0xFFFF, 3);

    assert_eq!(rdram.read_idx32(0x40), 0);
    assert_eq!(rdram.read_addr8(0x200), 0);
    assert_eq!(rdram.pair_read16(0x80), (0, 0));
    assert!(rdram.to_words().iter().all(|&w| w == 0));
}

#[test]
fn test_addresses_are_masked() {
    let rdram = Rdram::new(0x100).unwrap();
    rdram.write_idx32(1, 0x0102_0304);

    // Bits above the 24-bit byte address are ignored
    assert_eq!(rdram.read_addr8(0xFF00_0004), 0x01);
    assert_eq!(rdram.read_idx32(0xFFC0_0001), 0x0102_0304);
}

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
use crate::core::config::DpConfig;

const TEXTURE: u32 = 0x2000;

/// Load a 4x2 16-bit texture from [`TEXTURE`] into TMEM through tile 0
fn load_program() -> Vec<[u32; 2]> {
    vec![
        [0x3d00_0000 | (PIXEL_SIZE_16BIT << 19) | 3, TEXTURE],
        [0x3500_0000 | (PIXEL_SIZE_16BIT << 19) | (1 << 9), 0],
        [0x3400_0000, ((3 << 2) << 12) | (1 << 2)],
        sync_full(),
    ]
}

fn write_texture(rdram: &Rdram) {
    for i in 0..4 {
        rdram.write_idx32((TEXTURE >> 2) + i, 0x1111_2222u32.wrapping_mul(i + 1));
    }
}

#[test]
fn test_recording_forces_single_worker() {
    let (mut rdp, _) = rdp(3);
    assert_eq!(rdp.worker_count(), 3);

    rdp.start_trace().unwrap();
    assert!(rdp.is_recording());
    assert_eq!(rdp.worker_count(), 1);
    assert_eq!(rdp.config().num_workers, 1);

    let trace = rdp.stop_trace().unwrap().unwrap();
    assert!(!rdp.is_recording());
    assert_eq!(rdp.worker_count(), 3);
    assert_eq!(rdp.config().num_workers, 3);
    assert_eq!(trace.entries, vec![TraceEntry::Reset]);
}

#[test]
fn test_stop_without_recording() {
    let (mut rdp, _) = rdp(1);
    assert!(rdp.stop_trace().unwrap().is_none());
}

#[test]
fn test_trace_records_commands_in_order() {
    let (mut rdp, _) = rdp(2);
    rdp.start_trace().unwrap();

    let program = fill_program(0x1357_1357);
    submit(&mut rdp, &program);
    let trace = rdp.stop_trace().unwrap().unwrap();

    let recorded: Vec<Vec<u32>> = trace.commands().map(|c| c.to_vec()).collect();
    let expected: Vec<Vec<u32>> = program.iter().map(|c| c.to_vec()).collect();
    assert_eq!(recorded, expected);
}

#[test]
fn test_trace_replays_to_same_image() {
    let (mut rdp, rdram) = rdp(1);
    rdp.start_trace().unwrap();
    submit(&mut rdp, &fill_program(0x1357_1357));
    let trace = rdp.stop_trace().unwrap().unwrap();

    for workers in [1, 2] {
        let (mut replay, replayed) = rdp_with(workers, rdram.size());
        let executed = replay.replay(&trace).unwrap();

        assert_eq!(executed, 6);
        assert_eq!(replayed.to_bytes(), rdram.to_bytes());
    }
}

#[test]
fn test_load_reads_are_captured() {
    let (mut recorder, rdram) = rdp(1);
    write_texture(&rdram);

    recorder.start_trace().unwrap();
    submit(&mut recorder, &load_program());
    let trace = recorder.stop_trace().unwrap().unwrap();
    let tmem = recorder.pipeline().tmem().to_vec();
    assert!(tmem.iter().any(|&b| b != 0));

    // One RDRAM snapshot per texture row, ahead of the Load_Tile
    let load_at = trace
        .entries
        .iter()
        .position(|e| matches!(e, TraceEntry::Command(w) if w[0] >> 24 == 0x34))
        .unwrap();
    let rows: Vec<u32> = trace.entries[..load_at]
        .iter()
        .filter_map(|e| match e {
            TraceEntry::Rdram { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(rows, vec![TEXTURE >> 2, (TEXTURE + 8) >> 2]);

    let (mut replay, _) = rdp(1);
    replay.replay(&trace).unwrap();
    assert_eq!(replay.pipeline().tmem(), &tmem[..]);
}

#[test]
fn test_config_toggles_recording_at_sync_full() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.dpt");

    let (mut rdp, _) = rdp(2);
    let recording = CoreConfig {
        num_workers: 2,
        parallel: true,
        dp: DpConfig {
            trace_record: true,
            trace_path: Some(path.clone()),
        },
    };

    rdp.update_config(recording.clone());
    assert!(!rdp.is_recording());
    rdp.command(&sync_full()).unwrap();
    assert!(rdp.is_recording());
    assert_eq!(rdp.worker_count(), 1);

    submit(&mut rdp, &fill_program(0x2468_2468));

    let mut stopped = recording;
    stopped.dp.trace_record = false;
    rdp.update_config(stopped);
    rdp.command(&sync_full()).unwrap();
    assert!(!rdp.is_recording());
    assert_eq!(rdp.worker_count(), 2);

    // The starting Sync_Full is recorded, the stopping one is not
    let saved = CommandTrace::load(&path).unwrap();
    assert_eq!(saved.command_count(), 1 + 6);
}

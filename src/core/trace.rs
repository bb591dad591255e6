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

//! Command traces
//!
//! A trace is a recording of everything the pipeline consumed while it was
//! active: each executed command, plus the RDRAM words read by texture
//! loads, in execution order. Replaying a trace into a fresh [`Rdp`] with
//! an RDRAM of the recorded size reproduces the frame without the host.
//!
//! # Trace Format
//!
//! Traces are serialized using bincode. The header carries a version
//! number; loading a trace with a different version fails with
//! [`RdpError::UnsupportedTraceVersion`].
//!
//! # Example
//!
//! ```
//! use rdpx::core::trace::{CommandTrace, TraceEntry};
//!
//! let mut trace = CommandTrace::new(0x1000);
//! trace.push(TraceEntry::Command(vec![0x2900_0000, 0]));
//!
//! let bytes = trace.to_bytes().unwrap();
//! let loaded = CommandTrace::from_bytes(&bytes).unwrap();
//! assert_eq!(loaded.entries, trace.entries);
//! ```
//!
//! [`Rdp`]: crate::core::rdp::Rdp

use crate::core::error::{RdpError, Result};
use crate::core::rdp::commands::{command_id, command_info};
use bincode::{config, Decode, Encode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Trace format version
///
/// Incremented whenever the encoding changes incompatibly.
pub const TRACE_VERSION: u32 = 1;

/// Trace header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
#[bincode(encode_bounds = "", decode_bounds = "")]
pub struct TraceHeader {
    /// Version number for compatibility checking
    pub version: u32,

    /// Size of the RDRAM the trace was recorded against
    pub rdram_size: u32,

    /// When recording started
    #[bincode(with_serde)]
    pub created: DateTime<Utc>,
}

/// One recorded event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum TraceEntry {
    /// Complete command words
    Command(Vec<u32>),

    /// RDRAM words starting at word index `index`
    Rdram { index: u32, words: Vec<u32> },

    /// Recording (re)started; the crash latch is cleared on replay
    Reset,
}

/// A recorded command stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct CommandTrace {
    pub header: TraceHeader,
    pub entries: Vec<TraceEntry>,
}

/// Overview of a trace, written by the replay tool as JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceSummary {
    pub version: u32,
    pub rdram_size: u32,
    pub created: DateTime<Utc>,
    pub commands: usize,
    pub rdram_blocks: usize,
    pub rdram_words: usize,
    /// Executed commands per command name
    pub histogram: BTreeMap<String, usize>,
}

impl CommandTrace {
    /// Start an empty trace for an RDRAM of `rdram_size` bytes
    pub fn new(rdram_size: usize) -> Self {
        Self {
            header: TraceHeader {
                version: TRACE_VERSION,
                rdram_size: rdram_size as u32,
                created: Utc::now(),
            },
            entries: vec![TraceEntry::Reset],
        }
    }

    pub fn push(&mut self, entry: TraceEntry) {
        self.entries.push(entry);
    }

    /// Recorded command word slices in order
    pub fn commands(&self) -> impl Iterator<Item = &[u32]> {
        self.entries.iter().filter_map(|entry| match entry {
            TraceEntry::Command(words) => Some(words.as_slice()),
            _ => None,
        })
    }

    pub fn command_count(&self) -> usize {
        self.commands().count()
    }

    /// Encode the trace with bincode
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::encode_to_vec(self, config::standard())?)
    }

    /// Decode a trace and check its version
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (trace, _): (CommandTrace, usize) = bincode::decode_from_slice(bytes, config::standard())?;

        if trace.header.version != TRACE_VERSION {
            return Err(RdpError::UnsupportedTraceVersion {
                version: trace.header.version,
            }
            .into());
        }

        Ok(trace)
    }

    /// Save the trace to a file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Serialization fails
    /// - File cannot be created or written
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let encoded = self.to_bytes()?;
        let mut file = File::create(path)?;
        file.write_all(&encoded)?;
        Ok(())
    }

    /// Load a trace from a file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be opened or read
    /// - Deserialization fails
    /// - Version is incompatible
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        Self::from_bytes(&buffer)
    }

    pub fn summary(&self) -> TraceSummary {
        let mut histogram = BTreeMap::new();
        let mut rdram_blocks = 0;
        let mut rdram_words = 0;

        for entry in &self.entries {
            match entry {
                TraceEntry::Command(words) => {
                    let name = words
                        .first()
                        .map(|&w0| command_info(command_id(w0)).name)
                        .unwrap_or("???");
                    *histogram.entry(name.to_string()).or_insert(0) += 1;
                }
                TraceEntry::Rdram { words, .. } => {
                    rdram_blocks += 1;
                    rdram_words += words.len();
                }
                TraceEntry::Reset => {}
            }
        }

        TraceSummary {
            version: self.header.version,
            rdram_size: self.header.rdram_size,
            created: self.header.created,
            commands: histogram.values().sum(),
            rdram_blocks,
            rdram_words,
            histogram,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::EmulatorError;

    fn sample() -> CommandTrace {
        let mut trace = CommandTrace::new(0x40_0000);
        trace.push(TraceEntry::Command(vec![0x3700_0000, 0xffff_ffff]));
        trace.push(TraceEntry::Rdram {
            index: 0x100,
            words: vec![1, 2, 3],
        });
        trace.push(TraceEntry::Command(vec![0x3600_0000 | (40 << 14) | 40, 0]));
        trace.push(TraceEntry::Command(vec![0x2900_0000, 0]));
        trace
    }

    #[test]
    fn test_new_trace_starts_with_reset() {
        let trace = CommandTrace::new(0x1000);
        assert_eq!(trace.header.version, TRACE_VERSION);
        assert_eq!(trace.header.rdram_size, 0x1000);
        assert_eq!(trace.entries, vec![TraceEntry::Reset]);
    }

    #[test]
    fn test_bytes_roundtrip() {
        let trace = sample();
        let decoded = CommandTrace::from_bytes(&trace.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, trace);
        assert_eq!(decoded.command_count(), 3);
    }

    #[test]
    fn test_version_check() {
        let mut trace = sample();
        trace.header.version = 99;
        let bytes = trace.to_bytes().unwrap();

        let err = CommandTrace::from_bytes(&bytes).unwrap_err();
        assert!(matches!(
            err,
            EmulatorError::Rdp(RdpError::UnsupportedTraceVersion { version: 99 })
        ));
    }

    #[test]
    fn test_garbage_is_trace_error() {
        let err = CommandTrace::from_bytes(&[0xff; 3]).unwrap_err();
        assert!(matches!(err, EmulatorError::Trace(_)));
    }

    #[test]
    fn test_save_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.dpt");

        let trace = sample();
        trace.save(&path).unwrap();
        assert_eq!(CommandTrace::load(&path).unwrap(), trace);
    }

    #[test]
    fn test_summary_counts_commands() {
        let summary = sample().summary();
        assert_eq!(summary.commands, 3);
        assert_eq!(summary.rdram_blocks, 1);
        assert_eq!(summary.rdram_words, 3);
        assert_eq!(summary.histogram["Set_Fill_Color"], 1);
        assert_eq!(summary.histogram["Fill_Rectangle"], 1);
        assert_eq!(summary.histogram["Sync_Full"], 1);
    }
}

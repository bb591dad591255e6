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

/// Emulator error types
use thiserror::Error;

/// Result type for emulator operations
pub type Result<T> = std::result::Result<T, EmulatorError>;

/// Main error type for the emulator
///
/// Only host-facing operations (configuration, trace and RDRAM image I/O,
/// command submission) return errors. The rasterization path never fails:
/// illegal hardware configurations set the crash latch instead.
#[derive(Error, Debug)]
pub enum EmulatorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Trace error: {0}")]
    Trace(String),

    #[error("RDP error: {0}")]
    Rdp(#[from] RdpError),

    #[error("Invalid RDRAM size: {got} bytes (must be a non-zero multiple of 4, at most {max})")]
    InvalidRdramSize { got: usize, max: usize },
}

/// RDP-specific error types
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RdpError {
    #[error("Truncated RDP command {command:#04x}: expected {expected} words, got {got}")]
    TruncatedCommand {
        command: u32,
        expected: usize,
        got: usize,
    },

    #[error("Unsupported trace version: {version}")]
    UnsupportedTraceVersion { version: u32 },
}

impl From<toml::de::Error> for EmulatorError {
    fn from(err: toml::de::Error) -> Self {
        EmulatorError::Config(err.to_string())
    }
}

impl From<bincode::error::EncodeError> for EmulatorError {
    fn from(err: bincode::error::EncodeError) -> Self {
        EmulatorError::Trace(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for EmulatorError {
    fn from(err: bincode::error::DecodeError) -> Self {
        EmulatorError::Trace(err.to_string())
    }
}

impl From<serde_json::Error> for EmulatorError {
    fn from(err: serde_json::Error) -> Self {
        EmulatorError::Trace(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_command_message() {
        let err = RdpError::TruncatedCommand {
            command: 0x24,
            expected: 4,
            got: 2,
        };
        assert_eq!(
            err.to_string(),
            "Truncated RDP command 0x24: expected 4 words, got 2"
        );
    }

    #[test]
    fn test_rdp_error_converts_into_emulator_error() {
        let err: EmulatorError = RdpError::UnsupportedTraceVersion { version: 9 }.into();
        assert!(matches!(
            err,
            EmulatorError::Rdp(RdpError::UnsupportedTraceVersion { version: 9 })
        ));
    }
}

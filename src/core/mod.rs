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

//! Core RDP components
//!
//! - RDRAM model with hidden bits
//! - Pixel pipeline and command front end
//! - Worker pool for scanline-parallel rendering
//! - Command trace recording and replay
//! - Configuration

pub mod config;
pub mod error;
pub mod memory;
pub mod parallel;
pub mod rdp;
pub mod trace;

// Re-export commonly used types
pub use config::CoreConfig;
pub use error::{EmulatorError, RdpError, Result};
pub use memory::Rdram;
pub use parallel::WorkerPool;
pub use rdp::{DpRegisters, DpStatus, Pipeline, Rdp};
pub use trace::CommandTrace;

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

//! Cycle-accurate Nintendo 64 RDP pixel pipeline
//!
//! The crate consumes RDP display-list commands and renders into a shared
//! RDRAM image exactly as the hardware would: edge walking, texture
//! sampling, color combining, blending, dithering, coverage and depth.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use rdpx::core::config::CoreConfig;
//! use rdpx::core::memory::Rdram;
//! use rdpx::core::rdp::Rdp;
//!
//! let rdram = Arc::new(Rdram::new(0x10000).unwrap());
//! let mut rdp = Rdp::new(CoreConfig::single_threaded(), rdram).unwrap();
//!
//! // Set_Fill_Color, then Sync_Full
//! rdp.command(&[0x3700_0000, 0xffff_ffff]).unwrap();
//! rdp.command(&[0x2900_0000, 0]).unwrap();
//! assert!(!rdp.is_crashed());
//! ```

pub mod core;

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

//! Pipeline crash latch
//!
//! Some register combinations hang the real RDP: filling a 4-bit color
//! image, copying into a 32-bit one, loading a 4-bit texture image, or
//! using the fill pipeline with depth or read-modify-write enabled. The
//! emulated pipeline raises a sticky latch instead, after which the
//! command-list fetch stops executing until the host clears it.
//!
//! The latch and the one-time warning flags are shared by every worker.

use log::warn;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Conditions that log a warning the first time they crash the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrashWarning {
    /// Fill cycle into a 4-bit color image
    FillCrash,
    /// Copy cycle into a 32-bit color image
    CopyStrange,
    /// Fill cycle with image read, depth compare or depth update enabled
    FillBitCrash,
}

impl CrashWarning {
    fn index(self) -> usize {
        match self {
            Self::FillCrash => 0,
            Self::CopyStrange => 1,
            Self::FillBitCrash => 2,
        }
    }
}

/// Sticky crash flag plus one-time warning bookkeeping
#[derive(Debug, Default)]
pub struct CrashLatch {
    crashed: AtomicBool,
    warned: [AtomicBool; 3],
    warnings: AtomicU32,
}

impl CrashLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the latch without a diagnostic
    pub fn crash(&self) {
        self.crashed.store(true, Ordering::Relaxed);
    }

    /// Raise the latch and log `message` the first time `kind` occurs
    pub fn crash_with_warning(&self, kind: CrashWarning, message: &str) {
        self.warn_once(kind, message);
        self.crash();
    }

    /// Log `message` the first time `kind` occurs, without crashing
    pub fn warn_once(&self, kind: CrashWarning, message: &str) {
        if !self.warned[kind.index()].swap(true, Ordering::Relaxed) {
            self.warnings.fetch_add(1, Ordering::Relaxed);
            warn!("{}", message);
        }
    }

    pub fn is_crashed(&self) -> bool {
        self.crashed.load(Ordering::Relaxed)
    }

    /// Clear the latch; warnings that were already logged stay suppressed
    pub fn reset(&self) {
        self.crashed.store(false, Ordering::Relaxed);
    }

    /// Whether the warning for `kind` has been logged
    pub fn has_warned(&self, kind: CrashWarning) -> bool {
        self.warned[kind.index()].load(Ordering::Relaxed)
    }

    /// Number of distinct warnings logged so far
    pub fn warnings_emitted(&self) -> u32 {
        self.warnings.load(Ordering::Relaxed)
    }
}

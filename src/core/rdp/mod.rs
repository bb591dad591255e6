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

//! Reality Display Processor pixel pipeline
//!
//! [`Rdp`] is the host-facing front end. It validates submitted commands,
//! executes control commands inline and hands rendering commands to the
//! worker pool in batches. Each worker owns a full [`Pipeline`] copy and
//! replays the batch on it, rendering only the scanlines it owns.
//!
//! # Components
//!
//! - [`commands`]: command table and per-pipeline dispatch
//! - `render`: edge walker, span renderers, depth, coverage, framebuffer
//! - `texture`: tile coordinates, LOD, texel fetch
//! - `combiner` / `blender`: color combiner and blender stages
//! - [`crash`]: the sticky crash latch
//! - [`tables`]: precomputed lookup tables shared by all workers

mod blender;
mod combiner;
pub mod commands;
pub mod crash;
mod render;
mod state;
pub mod tables;
mod texture;
mod types;

pub use crash::{CrashLatch, CrashWarning};
pub use state::{Pipeline, TMEM_SIZE};
pub use types::*;

use crate::core::config::CoreConfig;
use crate::core::error::{RdpError, Result};
use crate::core::memory::Rdram;
use crate::core::parallel::WorkerPool;
use crate::core::trace::{CommandTrace, TraceEntry};
use bitflags::bitflags;
use commands::{command_id, command_info, CMD_SYNC_FULL};
use log::{debug, error, info, trace};
use std::sync::{Arc, Mutex};

/// Rendering commands buffered before a batch is forced out to the workers
pub const BATCH_SIZE: usize = 1024;

/// Maximum number of words fetched from a command list at once
pub const FETCH_CHUNK_WORDS: u32 = 0x10000;

/// DMEM word index mask used by XBUS command fetches
const DMEM_WORD_MASK: u32 = 0x3ff;

bitflags! {
    /// DP status register
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DpStatus: u32 {
        /// Fetch commands from RSP DMEM instead of RDRAM
        const XBUS_DMA = 1 << 0;
        const FREEZE = 1 << 1;
        const FLUSH = 1 << 2;
        const START_GCLK = 1 << 3;
        const TMEM_BUSY = 1 << 4;
        const PIPE_BUSY = 1 << 5;
        const CMD_BUSY = 1 << 6;
        const CBUF_BUSY = 1 << 7;
        const DMA_BUSY = 1 << 8;
        const END_VALID = 1 << 9;
        const START_VALID = 1 << 10;
    }
}

/// DP command-list cursors
///
/// Addresses are byte offsets into RDRAM, or into DMEM when
/// [`DpStatus::XBUS_DMA`] is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DpRegisters {
    pub start: u32,
    pub current: u32,
    pub end: u32,
    pub status: DpStatus,
}

/// Render workers and the pipeline copy each of them owns
struct Workers {
    pool: WorkerPool,
    pipelines: Arc<Vec<Mutex<Pipeline>>>,
}

impl Workers {
    fn spawn(count: usize, seed: &Pipeline) -> Result<Self> {
        let pool = WorkerPool::new(count)?;
        let count = pool.worker_count();
        let pipelines = (0..count)
            .map(|id| {
                let mut pipeline = seed.clone();
                pipeline.set_worker(id as u32, count as u32);
                pipeline.capture = None;
                Mutex::new(pipeline)
            })
            .collect();

        Ok(Self {
            pool,
            pipelines: Arc::new(pipelines),
        })
    }

    /// Register state of the first worker
    fn first_pipeline(&self) -> Option<Pipeline> {
        self.pipelines
            .first()
            .map(|slot| match slot.lock() {
                Ok(guard) => guard.clone(),
                Err(poisoned) => poisoned.into_inner().clone(),
            })
    }
}

/// Host-facing RDP
///
/// # Example
///
/// ```
/// use rdpx::core::config::CoreConfig;
/// use rdpx::core::memory::Rdram;
/// use rdpx::core::rdp::Rdp;
/// use std::sync::Arc;
///
/// let rdram = Arc::new(Rdram::new(0x4000).unwrap());
/// let mut rdp = Rdp::new(CoreConfig::single_threaded(), rdram.clone()).unwrap();
///
/// // 32 pixel wide 16-bit color image at 0x100, fill cycle
/// rdp.command(&[0x3f10_001f, 0x100]).unwrap();
/// rdp.command(&[0x2f30_0000, 0]).unwrap();
/// rdp.command(&[0x2d00_0000, 0x0008_0080]).unwrap();
/// rdp.command(&[0x3700_0000, 0xaaaa_aaaa]).unwrap();
/// rdp.command(&[0x3600_0000 | (32 << 12) | 16, 0]).unwrap();
/// rdp.command(&[0x2900_0000, 0]).unwrap();
///
/// assert_eq!(rdram.read_idx16(0x100 >> 1), 0xaaaa);
/// assert!(!rdp.is_crashed());
/// ```
pub struct Rdp {
    config: CoreConfig,
    pending_config: Option<CoreConfig>,

    rdram: Arc<Rdram>,
    crash: Arc<CrashLatch>,

    /// Dispatcher pipeline: control commands, and everything when inline
    state: Pipeline,
    workers: Option<Workers>,
    batch: Vec<Vec<u32>>,

    trace: Option<CommandTrace>,
    /// Worker count to restore when recording stops
    trace_workers: u32,

    sync_callback: Option<Box<dyn FnMut() + Send>>,
}

impl Rdp {
    /// Create an RDP rendering into `rdram`
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the worker threads cannot be spawned.
    pub fn new(config: CoreConfig, rdram: Arc<Rdram>) -> Result<Self> {
        let crash = Arc::new(CrashLatch::new());
        let state = Pipeline::new(rdram.clone(), crash.clone());

        let mut rdp = Self {
            config: CoreConfig::single_threaded(),
            pending_config: None,
            rdram,
            crash,
            state,
            workers: None,
            batch: Vec::with_capacity(BATCH_SIZE),
            trace: None,
            trace_workers: config.num_workers,
            sync_callback: None,
        };
        rdp.apply_config(config)?;

        Ok(rdp)
    }

    /// Submit one command
    ///
    /// `words` must hold at least the command's table length; extra words
    /// are ignored. Unassigned opcodes are accepted and do nothing.
    ///
    /// # Errors
    ///
    /// Returns [`RdpError::TruncatedCommand`] if the slice is shorter than
    /// the command. Nothing is executed in that case.
    pub fn command(&mut self, words: &[u32]) -> Result<()> {
        let w0 = words.first().copied().unwrap_or(0);
        let id = command_id(w0);
        let expected = command_info(id).words();

        if words.len() < expected {
            return Err(RdpError::TruncatedCommand {
                command: id,
                expected,
                got: words.len(),
            }
            .into());
        }

        self.dispatch(&words[..expected]);
        Ok(())
    }

    /// Execute the command list between the DP cursors
    ///
    /// Words come from `dmem` when [`DpStatus::XBUS_DMA`] is set (a missing
    /// DMEM reads as zeros), otherwise from RDRAM. A command cut off by
    /// the end of the list is dropped. On return START and CURRENT equal END.
    pub fn process_command_list(&mut self, regs: &mut DpRegisters, dmem: Option<&[u32]>) {
        let current = regs.current & !7;
        let end = regs.end & !7;

        regs.status.remove(DpStatus::FREEZE);

        if end <= current {
            return;
        }

        let xbus = regs.status.contains(DpStatus::XBUS_DMA);
        let mut remaining = (end - current) >> 2;
        let mut idx = current >> 2;
        let mut words = Vec::with_capacity(remaining.min(FETCH_CHUNK_WORDS) as usize);

        debug!(
            "DP list {:08X}..{:08X} ({} words, {})",
            current,
            end,
            remaining,
            if xbus { "DMEM" } else { "RDRAM" }
        );

        'fetch: while remaining > 0 {
            let toload = remaining.min(FETCH_CHUNK_WORDS);

            words.clear();
            for _ in 0..toload {
                let word = if xbus {
                    dmem.and_then(|d| d.get((idx & DMEM_WORD_MASK) as usize))
                        .copied()
                        .unwrap_or(0)
                } else {
                    self.rdram.read_idx32(idx)
                };
                words.push(word);
                idx = idx.wrapping_add(1);
            }
            remaining -= toload;

            let mut pos = 0;
            while pos < words.len() {
                if self.crash.is_crashed() {
                    break 'fetch;
                }

                let length = command_info(command_id(words[pos])).words();
                let available = words.len() - pos;

                if available < length {
                    if remaining == 0 {
                        trace!("Dropping partial command at end of DP list");
                        break 'fetch;
                    }
                    // Refetch the partial command at the start of the next chunk
                    idx = idx.wrapping_sub(available as u32);
                    remaining += available as u32;
                    break;
                }

                self.dispatch(&words[pos..pos + length]);
                pos += length;
            }
        }

        regs.current = regs.end;
        regs.start = regs.end;
    }

    /// Run every buffered command on the workers and wait for them
    pub fn flush(&mut self) {
        if self.batch.is_empty() {
            return;
        }

        let batch = Arc::new(std::mem::replace(
            &mut self.batch,
            Vec::with_capacity(BATCH_SIZE),
        ));

        let Some(workers) = &self.workers else {
            for cmd in batch.iter() {
                self.state.execute(cmd);
            }
            return;
        };

        trace!("Flushing {} commands to {} workers", batch.len(), workers.pool.worker_count());

        let pipelines = workers.pipelines.clone();
        workers.pool.run(move |id| {
            let Some(slot) = pipelines.get(id) else {
                return;
            };
            let mut pipeline = match slot.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            for cmd in batch.iter() {
                pipeline.execute(cmd);
            }
        });
    }

    /// Register a function called on every Sync_Full
    pub fn set_sync_callback<F>(&mut self, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.sync_callback = Some(Box::new(callback));
    }

    /// Queue a configuration change, applied at the next Sync_Full
    pub fn update_config(&mut self, config: CoreConfig) {
        self.pending_config = Some(config);
    }

    /// Configuration currently in effect
    ///
    /// While a trace is being recorded `num_workers` reads 1.
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn is_crashed(&self) -> bool {
        self.crash.is_crashed()
    }

    pub fn reset_crash(&self) {
        self.crash.reset();
    }

    /// Shared crash latch
    pub fn crash_latch(&self) -> &Arc<CrashLatch> {
        &self.crash
    }

    /// Depth buffer address from the last Set_Mask_Image
    pub fn zb_address(&self) -> u32 {
        self.state.zb_address()
    }

    pub fn rdram(&self) -> &Arc<Rdram> {
        &self.rdram
    }

    /// Number of render workers, 1 when running inline
    pub fn worker_count(&self) -> usize {
        self.workers
            .as_ref()
            .map_or(1, |workers| workers.pool.worker_count())
    }

    /// Snapshot of the pipeline register state
    ///
    /// Flushes pending work first. In parallel mode this is the state of
    /// the first worker.
    pub fn pipeline(&mut self) -> Pipeline {
        self.flush();
        self.workers
            .as_ref()
            .and_then(Workers::first_pipeline)
            .unwrap_or_else(|| self.state.clone())
    }

    pub fn is_recording(&self) -> bool {
        self.trace.is_some()
    }

    /// Trace recorded so far
    pub fn trace(&self) -> Option<&CommandTrace> {
        self.trace.as_ref()
    }

    /// Start recording executed commands
    ///
    /// Recording runs on a single inline pipeline; the previous worker
    /// count comes back when recording stops.
    pub fn start_trace(&mut self) -> Result<()> {
        if self.trace.is_some() {
            return Ok(());
        }

        self.trace_workers = self.config.num_workers;
        self.config.num_workers = 1;
        self.config.dp.trace_record = true;
        self.rebuild_workers()?;

        self.trace = Some(CommandTrace::new(self.rdram.size()));
        self.state.capture = Some(Vec::new());

        info!("Command trace recording started");
        Ok(())
    }

    /// Stop recording and return the trace
    ///
    /// The trace is also written to `dp.trace_path` when one is configured.
    pub fn stop_trace(&mut self) -> Result<Option<CommandTrace>> {
        let Some(trace) = self.trace.take() else {
            return Ok(None);
        };
        self.state.capture = None;

        self.config.num_workers = self.trace_workers;
        self.config.dp.trace_record = false;
        self.rebuild_workers()?;

        info!("Command trace recording stopped after {} commands", trace.command_count());

        if let Some(path) = &self.config.dp.trace_path {
            trace.save(path)?;
            info!("Command trace written to {}", path.display());
        }

        Ok(Some(trace))
    }

    /// Replay a recorded trace
    ///
    /// RDRAM snapshots are written back before the command that read them.
    /// Returns the number of commands executed.
    pub fn replay(&mut self, trace: &CommandTrace) -> Result<usize> {
        let mut executed = 0;

        for entry in &trace.entries {
            match entry {
                TraceEntry::Reset => self.crash.reset(),
                TraceEntry::Rdram { index, words } => {
                    // Earlier batched commands must not see the snapshot
                    self.flush();
                    for (i, &word) in words.iter().enumerate() {
                        self.rdram.write_idx32(index.wrapping_add(i as u32), word);
                    }
                }
                TraceEntry::Command(words) => {
                    self.command(words)?;
                    executed += 1;
                }
            }
        }

        self.flush();
        Ok(executed)
    }

    fn dispatch(&mut self, cmd: &[u32]) {
        let id = command_id(cmd[0]);
        let info = command_info(id);
        let parallel = self.workers.is_some();

        if info.sync && parallel {
            self.flush();
        }

        if info.single || !parallel {
            self.state.execute(cmd);
        }

        if info.multi && parallel {
            self.batch.push(cmd.to_vec());
            if self.batch.len() >= BATCH_SIZE {
                self.flush();
            }
        }

        if id == CMD_SYNC_FULL {
            self.sync_full();
        }

        if let Some(trace) = self.trace.as_mut() {
            if let Some(captured) = self.state.capture.as_mut() {
                trace.entries.append(captured);
            }
            trace.push(TraceEntry::Command(cmd.to_vec()));
        }
    }

    fn sync_full(&mut self) {
        if let Some(config) = self.pending_config.take() {
            if let Err(err) = self.apply_config(config) {
                error!("Failed to apply configuration: {}", err);
            }
        }

        if let Some(callback) = self.sync_callback.as_mut() {
            callback();
        }
    }

    fn apply_config(&mut self, config: CoreConfig) -> Result<()> {
        let record = config.dp.trace_record;

        if self.trace.is_some() {
            // Keep running inline until recording stops
            self.trace_workers = config.num_workers;
            self.config = CoreConfig {
                num_workers: 1,
                ..config
            };
        } else {
            self.config = config;
        }

        match (record, self.trace.is_some()) {
            (true, false) => self.start_trace(),
            (false, true) => self.stop_trace().map(|_| ()),
            _ => self.rebuild_workers(),
        }
    }

    /// Bring the worker pool in line with the configuration
    fn rebuild_workers(&mut self) -> Result<()> {
        let wanted = self
            .config
            .is_parallel()
            .then(|| self.config.resolved_workers())
            .filter(|&n| n > 1);

        if wanted == self.workers.as_ref().map(|w| w.pool.worker_count()) {
            return Ok(());
        }

        self.flush();

        // New workers continue from the first worker's register state
        let mut seed = match self.workers.take() {
            Some(workers) => {
                let seed = workers.first_pipeline();
                workers.pool.close();
                seed.unwrap_or_else(|| self.state.clone())
            }
            None => self.state.clone(),
        };
        seed.capture = None;

        match wanted {
            Some(count) => {
                self.workers = Some(Workers::spawn(count, &seed)?);
                info!("Rendering with {} workers", count);
            }
            None => {
                let capture = self.state.capture.take();
                seed.set_worker(0, 1);
                seed.capture = capture;
                self.state = seed;
                info!("Rendering inline on one thread");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;

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

use clap::Parser;
use log::{error, info, warn};
use rdpx::core::config::CoreConfig;
use rdpx::core::error::Result;
use rdpx::core::memory::Rdram;
use rdpx::core::rdp::Rdp;
use rdpx::core::trace::{CommandTrace, TraceSummary};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Replay a recorded RDP command trace
#[derive(Parser)]
#[command(name = "rdpx")]
#[command(about = "N64 RDP command trace replayer", long_about = None)]
struct Args {
    /// Path to a command trace recorded with `dp.trace_record`
    trace: PathBuf,

    /// Initial RDRAM image (raw big-endian bytes)
    #[arg(short = 'r', long)]
    rdram: Option<PathBuf>,

    /// Pipeline configuration file (TOML)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Number of render workers (0 = one per core)
    #[arg(short = 'w', long)]
    workers: Option<u32>,

    /// Write the final RDRAM contents here
    #[arg(short = 'o', long)]
    dump: Option<PathBuf>,

    /// Write a JSON replay summary here
    #[arg(short = 's', long)]
    summary: Option<PathBuf>,
}

/// JSON report written by `--summary`
#[derive(Serialize)]
struct Report {
    #[serde(flatten)]
    trace: TraceSummary,
    workers: usize,
    executed: usize,
    crashed: bool,
    elapsed_ms: f64,
}

fn main() -> Result<()> {
    // A missing .env file is not an error
    dotenvy::dotenv().ok();

    // Initialize logger with default level INFO, overridable by RUST_LOG
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    info!("rdpx v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            CoreConfig::load(path)?
        }
        None => CoreConfig::default(),
    };
    config.apply_env()?;
    if let Some(workers) = args.workers {
        config.num_workers = workers;
        config.parallel = workers != 1;
    }
    // Replaying must not record itself
    config.dp.trace_record = false;

    info!("Loading trace from: {}", args.trace.display());
    let trace = CommandTrace::load(&args.trace).map_err(|e| {
        error!("Failed to load trace: {}", e);
        e
    })?;
    let summary = trace.summary();
    info!(
        "Trace recorded {}: {} commands, {} RDRAM blocks",
        summary.created, summary.commands, summary.rdram_blocks
    );

    let image = match &args.rdram {
        Some(path) => {
            info!("Loading RDRAM image from: {}", path.display());
            Some(std::fs::read(path)?)
        }
        None => None,
    };

    let rdram_size = rdram_size(trace.header.rdram_size as usize, image.as_deref());
    let rdram = Arc::new(Rdram::new(rdram_size)?);
    if let Some(bytes) = &image {
        rdram.load_bytes(0, bytes);
    }

    let mut rdp = Rdp::new(config, Arc::clone(&rdram))?;
    let workers = rdp.worker_count();
    info!("Replaying with {} worker(s)", workers);

    let start = Instant::now();
    let executed = rdp.replay(&trace)?;
    let elapsed = start.elapsed();

    if rdp.is_crashed() {
        warn!("RDP crashed during replay; later commands were not rendered");
    }
    info!(
        "Replayed {} commands in {:.2} ms",
        executed,
        elapsed.as_secs_f64() * 1000.0
    );

    if let Some(path) = &args.dump {
        std::fs::write(path, rdram.to_bytes())?;
        info!("RDRAM written to: {}", path.display());
    }

    if let Some(path) = &args.summary {
        let report = Report {
            trace: summary,
            workers,
            executed,
            crashed: rdp.is_crashed(),
            elapsed_ms: elapsed.as_secs_f64() * 1000.0,
        };
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)?;
        info!("Summary written to: {}", path.display());
    }

    Ok(())
}

/// RDRAM size for the replay: the recorded size, grown to fit the image
fn rdram_size(recorded: usize, image: Option<&[u8]>) -> usize {
    let image_len = image.map_or(0, |bytes| (bytes.len() + 3) & !3);
    let size = recorded.max(image_len);
    if size == 0 {
        Rdram::DEFAULT_SIZE
    } else {
        size.min(Rdram::MAX_SIZE)
    }
}

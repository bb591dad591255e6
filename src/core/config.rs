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

//! Core configuration
//!
//! [`CoreConfig`] carries the settings a host may change between frames:
//! the worker count of the scanline-parallel renderer and the command trace
//! recorder. A new configuration handed to [`crate::core::rdp::Rdp::update_config`]
//! takes effect at the next full sync.
//!
//! # Sources
//!
//! Configuration is layered, later sources overriding earlier ones:
//!
//! 1. [`CoreConfig::default`]
//! 2. A TOML file ([`CoreConfig::load`])
//! 3. Environment variables ([`CoreConfig::apply_env`]):
//!    - `RDPX_NUM_WORKERS`: worker thread count, `0` selects one per core
//!    - `RDPX_PARALLEL`: `0`/`false` forces inline execution
//!    - `RDPX_TRACE_RECORD`: `1`/`true` starts recording commands
//!
//! # Example
//!
//! ```
//! use rdpx::core::config::CoreConfig;
//!
//! let config = CoreConfig::from_toml_str("num_workers = 4\n[dp]\ntrace_record = false\n").unwrap();
//! assert_eq!(config.num_workers, 4);
//! assert!(config.is_parallel());
//! ```

use crate::core::error::{EmulatorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable selecting the worker count
pub const ENV_NUM_WORKERS: &str = "RDPX_NUM_WORKERS";

/// Environment variable toggling parallel rendering
pub const ENV_PARALLEL: &str = "RDPX_PARALLEL";

/// Environment variable toggling command trace recording
pub const ENV_TRACE_RECORD: &str = "RDPX_TRACE_RECORD";

/// Command-processor settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DpConfig {
    /// Record every executed command into a [`crate::core::trace::CommandTrace`]
    pub trace_record: bool,

    /// Where a finished trace is written when recording stops
    pub trace_path: Option<PathBuf>,
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Number of render workers (0 = one per available core, 1 = inline)
    pub num_workers: u32,

    /// Allow the batch to be handed to the worker pool
    pub parallel: bool,

    /// Command-processor settings
    pub dp: DpConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            num_workers: 0,
            parallel: true,
            dp: DpConfig::default(),
        }
    }
}

impl CoreConfig {
    /// Inline configuration: a single worker, no thread pool
    pub fn single_threaded() -> Self {
        Self {
            num_workers: 1,
            parallel: false,
            dp: DpConfig::default(),
        }
    }

    /// Parse a configuration from TOML text
    ///
    /// Missing keys keep their default values.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Serialize the configuration as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| EmulatorError::Config(e.to_string()))
    }

    /// Override fields from `RDPX_*` environment variables
    ///
    /// Unset variables leave the field untouched; malformed values are
    /// reported as [`EmulatorError::Config`].
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Override fields from a variable lookup function
    ///
    /// [`CoreConfig::apply_env`] uses the process environment; tests pass a map.
    pub fn apply_vars<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_NUM_WORKERS) {
            self.num_workers = value.trim().parse().map_err(|_| {
                EmulatorError::Config(format!("{}: invalid worker count '{}'", ENV_NUM_WORKERS, value))
            })?;
        }

        if let Some(value) = lookup(ENV_PARALLEL) {
            self.parallel = parse_flag(ENV_PARALLEL, &value)?;
        }

        if let Some(value) = lookup(ENV_TRACE_RECORD) {
            self.dp.trace_record = parse_flag(ENV_TRACE_RECORD, &value)?;
        }

        Ok(())
    }

    /// Worker count with `0` resolved to the available parallelism
    pub fn resolved_workers(&self) -> usize {
        match self.num_workers {
            0 => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            n => n as usize,
        }
    }

    /// Whether commands are batched and replayed on the worker pool
    pub fn is_parallel(&self) -> bool {
        self.parallel && self.num_workers != 1
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(EmulatorError::Config(format!(
            "{}: expected a boolean, got '{}'",
            key, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = CoreConfig::default();
        assert_eq!(config.num_workers, 0);
        assert!(config.parallel);
        assert!(!config.dp.trace_record);
        assert!(config.resolved_workers() >= 1);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = CoreConfig::from_toml_str("num_workers = 3").unwrap();
        assert_eq!(config.num_workers, 3);
        assert!(config.parallel);
        assert_eq!(config.dp, DpConfig::default());
    }

    #[test]
    fn test_single_worker_is_not_parallel() {
        let config = CoreConfig::from_toml_str("num_workers = 1").unwrap();
        assert!(!config.is_parallel());
        assert!(!CoreConfig::single_threaded().is_parallel());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = CoreConfig::from_toml_str("num_workers = \"many\"").unwrap_err();
        assert!(matches!(err, EmulatorError::Config(_)));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_NUM_WORKERS, "6"),
            (ENV_PARALLEL, "off"),
            (ENV_TRACE_RECORD, "1"),
        ]
        .into_iter()
        .collect();

        let mut config = CoreConfig::default();
        config
            .apply_vars(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.num_workers, 6);
        assert!(!config.parallel);
        assert!(config.dp.trace_record);
    }

    #[test]
    fn test_env_rejects_garbage() {
        let mut config = CoreConfig::default();
        let err = config
            .apply_vars(|key| (key == ENV_PARALLEL).then(|| "maybe".to_string()))
            .unwrap_err();
        assert!(matches!(err, EmulatorError::Config(_)));
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = CoreConfig::single_threaded();
        config.dp.trace_record = true;
        config.dp.trace_path = Some(PathBuf::from("frame.dpt"));

        let text = config.to_toml_string().unwrap();
        assert_eq!(CoreConfig::from_toml_str(&text).unwrap(), config);
    }
}

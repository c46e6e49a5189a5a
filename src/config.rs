//! # Server Configuration
//!
//! Settings come from an optional YAML file, then environment overrides.
//!
//! ```yaml
//! bind_address: "0.0.0.0:8080"
//! stack_size: 0x8000
//! max_inflight_bodies: 8
//! ```
//!
//! | Variable              | Overrides             | Format                          |
//! |-----------------------|-----------------------|---------------------------------|
//! | `DEVHTTPD_ADDR`       | `bind_address`        | `host:port`                     |
//! | `DEVHTTPD_STACK_SIZE` | `stack_size`          | decimal (`32768`) or hex (`0x8000`) |
//!
//! Coroutine stacks are sized for the handlers' stack buffers (a 32-byte SSID
//! plus a 64-byte key); `0x8000` leaves ample headroom for the runtime.

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use tracing::{debug, warn};

use crate::form::DEFAULT_POOL_SLOTS;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_STACK_SIZE: usize = 0x8000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpdConfig {
    /// Listen address
    pub bind_address: String,
    /// Coroutine stack size in bytes
    pub stack_size: usize,
    /// Request bodies that may be buffered at once
    pub max_inflight_bodies: usize,
}

impl Default for HttpdConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            stack_size: DEFAULT_STACK_SIZE,
            max_inflight_bodies: DEFAULT_POOL_SLOTS,
        }
    }
}

impl HttpdConfig {
    /// Parse a YAML configuration file. Missing keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: HttpdConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        debug!(path = %path.display(), ?config, "Configuration loaded");
        Ok(config)
    }

    /// Load `path` when given, otherwise start from defaults; then apply
    /// environment overrides.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.max_inflight_bodies > 0,
            "max_inflight_bodies must be at least 1"
        );
        ensure!(self.stack_size > 0, "stack_size must be non-zero");
        Ok(())
    }

    /// Apply `DEVHTTPD_ADDR` / `DEVHTTPD_STACK_SIZE`. Unparsable values are
    /// logged and ignored.
    pub fn apply_env(&mut self) {
        if let Ok(addr) = env::var("DEVHTTPD_ADDR") {
            self.bind_address = addr;
        }
        if let Ok(raw) = env::var("DEVHTTPD_STACK_SIZE") {
            match parse_size(&raw) {
                Some(size) => self.stack_size = size,
                None => warn!(value = %raw, "Ignoring invalid DEVHTTPD_STACK_SIZE"),
            }
        }
    }
}

/// Decimal or `0x`-prefixed hexadecimal byte count.
pub fn parse_size(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

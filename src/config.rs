//! Configuration: a `clap`-derived struct, optionally layered over a
//! JSON file read before CLI overrides apply.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_WIFI_RANGE;

/// Diagnostic verbosity, translated to `RUST_LOG` before `log` init.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Errors only.
    Error,
    /// Errors and warnings.
    Warning,
    /// Errors, warnings and info.
    Info,
    /// Everything, including per-event tracing.
    Debug,
}

impl LogLevel {
    /// The `RUST_LOG` filter string for this level.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warning => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

/// Axis-aligned bounding box used for random device positioning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bounds {
    /// Minimum x coordinate.
    pub x_min: f64,
    /// Maximum x coordinate.
    pub x_max: f64,
    /// Minimum y coordinate.
    pub y_min: f64,
    /// Maximum y coordinate.
    pub y_max: f64,
    /// Minimum z coordinate.
    pub z_min: f64,
    /// Maximum z coordinate.
    pub z_max: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self { x_min: 0.0, x_max: 100.0, y_min: 0.0, y_max: 100.0, z_min: 0.0, z_max: 0.0 }
    }
}

/// Recognized configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Diagnostic verbosity.
    pub loglevel: LogLevel,
    /// Catalog size for `generate-applications`.
    pub application_number: usize,
    /// Device count for `generate-devices`.
    pub device_number: usize,
    /// Wifi range, in meters, used for synthetic link generation and the
    /// link metric's distance normalization.
    pub wifi_range: f64,
    /// Bounding box for random device positioning.
    pub device_positionning: Bounds,
    /// RNG seed; fixed for reproducible routing tables and placement
    /// decisions across runs.
    pub random_seed: u64,
    /// Override every generated application's duration, if non-zero.
    pub app_duration: i64,
    /// Directory results (CSV/archives) are written to.
    pub output_folder: String,
    /// Bypass all feasibility checks ("dry-run" mode).
    pub dry_run: bool,
    /// Enable the batch optimizer (C6) instead of the greedy engine.
    pub batch: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            loglevel: LogLevel::Info,
            application_number: 500,
            device_number: 40,
            wifi_range: DEFAULT_WIFI_RANGE,
            device_positionning: Bounds::default(),
            random_seed: 0,
            app_duration: 0,
            output_folder: "output".to_string(),
            dry_run: false,
            batch: false,
        }
    }
}

impl Config {
    /// Load a config from a JSON file, falling back to defaults for
    /// missing fields.
    pub fn load(path: impl AsRef<std::path::Path>) -> crate::error::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

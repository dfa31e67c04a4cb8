//! Run settings consumed by discovery and the sampling pipeline
//!
//! These are the surface-level run parameters (period, sample count,
//! discovery timeout, progress and IP-device toggles) plus the output
//! options of the exporter. They are fixed for the lifetime of a run.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default period between samples in milliseconds
pub const DEFAULT_PERIOD_MS: u64 = 1;

/// Default number of samples per run
pub const DEFAULT_SAMPLES_COUNT: u64 = 10;

/// Default discovery deadline in milliseconds
pub const DEFAULT_WAIT_DEVICE_TIMEOUT_MS: u64 = 2000;

/// Default delay between discovery polling passes in milliseconds
pub const DEFAULT_DISCOVERY_POLL_INTERVAL_MS: u64 = 1;

/// Default CSV field delimiter
pub const DEFAULT_DELIMITER: u8 = b',';

/// Settings for a single sampling run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSettings {
    /// Period between sample ticks in milliseconds
    pub period_ms: u64,

    /// Number of samples to capture and export
    pub samples_count: u64,

    /// How long discovery may look for the target device, in milliseconds
    pub wait_device_timeout_ms: u64,

    /// Report `written/total` after every exported row
    pub print_progress: bool,

    /// Include IP-attached devices in the device network
    pub enable_ip_devices: bool,

    /// Directory receiving the output file
    pub output_dir: PathBuf,

    /// Field delimiter of the output file
    pub delimiter: u8,

    /// Pause between discovery passes in milliseconds (0 = busy polling)
    pub discovery_poll_interval_ms: u64,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            period_ms: DEFAULT_PERIOD_MS,
            samples_count: DEFAULT_SAMPLES_COUNT,
            wait_device_timeout_ms: DEFAULT_WAIT_DEVICE_TIMEOUT_MS,
            print_progress: false,
            enable_ip_devices: false,
            output_dir: PathBuf::from("."),
            delimiter: DEFAULT_DELIMITER,
            discovery_poll_interval_ms: DEFAULT_DISCOVERY_POLL_INTERVAL_MS,
        }
    }
}

impl RunSettings {
    /// Create settings with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Sampling period
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    /// Discovery deadline
    pub fn wait_device_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_device_timeout_ms)
    }

    /// Pause between discovery passes
    pub fn discovery_poll_interval(&self) -> Duration {
        Duration::from_millis(self.discovery_poll_interval_ms)
    }

    /// Set the sampling period in milliseconds
    pub fn with_period_ms(mut self, period_ms: u64) -> Self {
        self.period_ms = period_ms;
        self
    }

    /// Set the number of samples
    pub fn with_samples_count(mut self, samples_count: u64) -> Self {
        self.samples_count = samples_count;
        self
    }

    /// Set the discovery deadline in milliseconds
    pub fn with_wait_device_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.wait_device_timeout_ms = timeout_ms;
        self
    }

    /// Set the output directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Enable or disable progress reporting
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.print_progress = enabled;
        self
    }
}

//! Configuration management for the photo-booth core

use crate::{
    constants::*,
    guidance::{InputSource, YawCalibration},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Frame acquisition configuration
    pub liveview: LiveViewConfig,

    /// Pose guidance configuration
    pub guidance: GuidanceConfig,
}

/// Frame acquisition tunables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveViewConfig {
    /// Directory watched for the sentinel image
    pub drop_dir: PathBuf,

    /// File name of the sentinel image inside `drop_dir`
    pub sentinel_name: String,

    /// SDK polling interval (ms, >= 16)
    pub sdk_poll_ms: u64,

    /// Sentinel polling interval (ms, >= 33)
    pub file_poll_ms: u64,

    /// SDK stall time before falling back to the sentinel (ms, >= 500)
    pub failover_ms: u64,

    /// Live view is re-enabled this often while a handle is open (ms)
    pub keepalive_ms: u64,

    /// Pause after enabling live view before the first poll (ms)
    pub warmup_ms: u64,

    /// Reconnect attempt interval while no handle is open (ms)
    pub reconnect_ms: u64,

    /// Bounded join on stop (ms)
    pub stop_timeout_ms: u64,

    /// Bounded wait for a still capture (ms)
    pub shoot_timeout_ms: u64,

    /// Frames waiting for dispatch beyond this count are dropped
    pub max_pending_frames: usize,
}

/// Pose guidance tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuidanceConfig {
    /// Evaluation cadence (ms)
    pub rate_ms: u64,

    /// EMA weight of a new sample, in (0, 1]
    pub ema_alpha: f64,

    /// Continuous all-OK time before `ready` (ms)
    pub ready_dwell_ms: u64,

    /// Initial input source ("sdk" or "file")
    pub input_source: InputSource,

    /// Yaw calibration for the SDK live view
    pub yaw_sdk: YawCalibration,

    /// Yaw calibration for file-drop frames
    pub yaw_file: YawCalibration,
}

impl Default for LiveViewConfig {
    fn default() -> Self {
        Self {
            drop_dir: PathBuf::from("lv"),
            sentinel_name: DEFAULT_SENTINEL_NAME.to_string(),
            sdk_poll_ms: DEFAULT_SDK_POLL_MS,
            file_poll_ms: DEFAULT_FILE_POLL_MS,
            failover_ms: DEFAULT_FAILOVER_MS,
            keepalive_ms: DEFAULT_KEEPALIVE_MS,
            warmup_ms: DEFAULT_WARMUP_MS,
            reconnect_ms: DEFAULT_RECONNECT_MS,
            stop_timeout_ms: DEFAULT_STOP_TIMEOUT_MS,
            shoot_timeout_ms: DEFAULT_SHOOT_TIMEOUT_MS,
            max_pending_frames: DEFAULT_MAX_PENDING_FRAMES,
        }
    }
}

impl Default for GuidanceConfig {
    fn default() -> Self {
        Self {
            rate_ms: DEFAULT_RATE_MS,
            ema_alpha: DEFAULT_EMA_ALPHA,
            ready_dwell_ms: DEFAULT_READY_DWELL_MS,
            input_source: InputSource::File,
            yaw_sdk: YawCalibration::MIRRORED,
            yaw_file: YawCalibration::IDENTITY,
        }
    }
}

impl LiveViewConfig {
    /// Full path of the sentinel image
    #[must_use]
    pub fn sentinel_path(&self) -> PathBuf {
        self.drop_dir.join(&self.sentinel_name)
    }

    /// Raise polling and failover intervals to their floors
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.sdk_poll_ms = self.sdk_poll_ms.max(MIN_SDK_POLL_MS);
        self.file_poll_ms = self.file_poll_ms.max(MIN_FILE_POLL_MS);
        self.failover_ms = self.failover_ms.max(MIN_FAILOVER_MS);
        self
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_yaml()?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Serialize to YAML text
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let lv = &self.liveview;
        if lv.sdk_poll_ms < MIN_SDK_POLL_MS {
            return Err(Error::ConfigError(format!(
                "SDK poll interval must be at least {MIN_SDK_POLL_MS} ms"
            )));
        }
        if lv.file_poll_ms < MIN_FILE_POLL_MS {
            return Err(Error::ConfigError(format!(
                "File poll interval must be at least {MIN_FILE_POLL_MS} ms"
            )));
        }
        if lv.failover_ms < MIN_FAILOVER_MS {
            return Err(Error::ConfigError(format!(
                "Failover time must be at least {MIN_FAILOVER_MS} ms"
            )));
        }
        if lv.sentinel_name.trim().is_empty() {
            return Err(Error::ConfigError("Sentinel file name must not be empty".to_string()));
        }
        if lv.max_pending_frames == 0 {
            return Err(Error::ConfigError(
                "Pending frame limit must be greater than 0".to_string(),
            ));
        }

        let g = &self.guidance;
        if !(g.ema_alpha > 0.0 && g.ema_alpha <= 1.0) {
            return Err(Error::ConfigError("EMA alpha must be in (0, 1]".to_string()));
        }
        if g.rate_ms == 0 {
            return Err(Error::ConfigError("Evaluation rate must be greater than 0".to_string()));
        }
        for (name, cal) in [("yaw_sdk", &g.yaw_sdk), ("yaw_file", &g.yaw_file)] {
            if !cal.scale.is_finite() || !cal.offset_deg.is_finite() {
                return Err(Error::ConfigError(format!("{name} calibration must be finite")));
            }
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Photo booth core configuration

# Frame acquisition
liveview:
  drop_dir: "lv"
  sentinel_name: "Disconnected.jpg"
  sdk_poll_ms: 33
  file_poll_ms: 48
  failover_ms: 1000
  keepalive_ms: 2000
  warmup_ms: 150
  reconnect_ms: 3000
  stop_timeout_ms: 1000
  shoot_timeout_ms: 5000
  max_pending_frames: 8

# Pose guidance
guidance:
  rate_ms: 500
  ema_alpha: 0.18181818181818182
  ready_dwell_ms: 800
  input_source: file
  yaw_sdk:
    scale: -1.0
    offset_deg: 0.0
  yaw_file:
    scale: 1.0
    offset_deg: 0.0
"#;

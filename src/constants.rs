//! Constants used throughout the crate

/// Floor for the SDK polling interval (ms)
pub const MIN_SDK_POLL_MS: u64 = 16;

/// Floor for the sentinel-file polling interval (ms)
pub const MIN_FILE_POLL_MS: u64 = 33;

/// Floor for the SDK stall time before falling back to files (ms)
pub const MIN_FAILOVER_MS: u64 = 500;

/// Default live-view timings (ms)
pub const DEFAULT_SDK_POLL_MS: u64 = 33;
pub const DEFAULT_FILE_POLL_MS: u64 = 48;
pub const DEFAULT_FAILOVER_MS: u64 = 1000;
pub const DEFAULT_KEEPALIVE_MS: u64 = 2000;
pub const DEFAULT_WARMUP_MS: u64 = 150;
pub const DEFAULT_RECONNECT_MS: u64 = 3000;
pub const DEFAULT_STOP_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_SHOOT_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_MAX_PENDING_FRAMES: usize = 8;

/// Image the camera software drops when live view is unavailable
pub const DEFAULT_SENTINEL_NAME: &str = "Disconnected.jpg";

/// Guidance evaluation cadence (ms)
pub const DEFAULT_RATE_MS: u64 = 500;

/// EMA weight of a new sample (2 / (N + 1) with N = 10)
pub const DEFAULT_EMA_ALPHA: f64 = 2.0 / 11.0;

/// How long ok_all must hold before auto-capture is ready (ms)
pub const DEFAULT_READY_DWELL_MS: u64 = 800;

/// Shoulder tilt limits (degrees)
pub const SHOULDER_OK: f64 = 3.0;
pub const SHOULDER_ON: f64 = 4.5;
pub const SHOULDER_OFF: f64 = 2.0;

/// Beyond this smoothed angle the shoulder hint names a side (degrees)
pub const SHOULDER_SIDE_DEG: f64 = 2.0;

/// Eye-level offset limits (percent of frame height)
pub const EYE_OK: f64 = 1.5;
pub const EYE_ON: f64 = 2.5;
pub const EYE_OFF: f64 = 0.8;

/// Head yaw limits (degrees)
pub const YAW_OK: f64 = 6.0;
pub const YAW_ON: f64 = 10.0;
pub const YAW_OFF: f64 = 3.0;

/// Recommended head pitch band (degrees) and gate thresholds on the excess
pub const PITCH_LOW: f64 = 3.0;
pub const PITCH_HIGH: f64 = 10.0;
pub const PITCH_ON_DELTA: f64 = 2.0;
pub const PITCH_OFF_DELTA: f64 = 1.0;


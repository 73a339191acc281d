//! Photo-booth core: live-view acquisition with SDK/file failover and pose
//! guidance for auto-capture.
//!
//! The crate is built from two cooperating parts:
//! - [`frame_source::FrameSource`] streams frames from a vendor camera SDK on
//!   a background thread and falls back to a sentinel image on disk whenever
//!   the SDK stops delivering
//! - [`guidance::GuidanceEngine`] turns face and body landmarks into smoothed
//!   posture metrics, hint badges and a dwell-gated "ready" flag
//!
//! Landmark detection itself is not part of the crate; detectors plug in
//! through [`detector::LandmarkDetector`].
//!
//! # Examples
//!
//! ## Running the frame source
//!
//! ```no_run
//! use photobooth_core::{config::LiveViewConfig, frame_source::FrameSource};
//! use std::time::Duration;
//!
//! let mut source = FrameSource::without_camera(LiveViewConfig::default());
//! source.set_status_listener(|mode| println!("source: {mode}"));
//!
//! let streaming = source.start(|frame| {
//!     println!("frame {} ({}x{})", frame.sequence(), frame.width(), frame.height());
//! });
//! println!("SDK streaming: {streaming}");
//!
//! for _ in 0..100 {
//!     source.dispatch_timeout(Duration::from_millis(50));
//! }
//! source.stop();
//! ```
//!
//! ## Evaluating a pose
//!
//! ```no_run
//! use photobooth_core::{
//!     config::GuidanceConfig,
//!     frame::{Frame, FrameOrigin},
//!     guidance::GuidanceEngine,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut engine = GuidanceEngine::new(&GuidanceConfig::default())?;
//! let bytes = std::fs::read("lv/Disconnected.jpg")?;
//! let frame = Frame::decode(&bytes, FrameOrigin::File, 0)?;
//!
//! let out = engine.update(&frame, "3:4", 0, None, None);
//! println!("{} (ready: {})", out.badges.primary, out.metrics.ready);
//! # Ok(())
//! # }
//! ```

/// Call contract for the vendor camera SDK
pub mod bridge;

/// Configuration management
pub mod config;

/// Shared constants
pub mod constants;

/// Landmark detector contract and detection records
pub mod detector;

/// Error types
pub mod error;

/// Decoded frames
pub mod frame;

/// Background acquisition with SDK/file failover
pub mod frame_source;

/// Pose guidance engine
pub mod guidance;

pub use error::{Error, Result};

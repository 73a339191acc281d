//! Helper functions and utilities for tests
#![allow(dead_code)]

use image::{codecs::jpeg::JpegEncoder, Rgb, RgbImage};
use photobooth_core::{
    bridge::CameraBridge,
    config::LiveViewConfig,
    detector::{FaceDetection, HeadAngles, LandmarkDetector, PoseDetection},
    frame::{Frame, FrameOrigin},
    Error, Result,
};
use std::{
    fs,
    path::Path,
    sync::{Arc, Mutex},
    time::{Duration, SystemTime},
};
use tempfile::TempDir;

/// Encode a flat-colour JPEG of the given size
pub fn encode_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([90, 140, 200]));
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, 85)
        .encode_image(&img)
        .expect("JPEG encoding of a test image");
    out
}

/// Blank frame of the given size
pub fn test_frame(width: u32, height: u32) -> Frame {
    Frame::new(RgbImage::new(width, height), FrameOrigin::File, 0)
}

/// Fresh, empty per-test directory, removed when the returned guard drops
pub fn scratch_dir(name: &str) -> TempDir {
    tempfile::Builder::new()
        .prefix(&format!("photobooth-test-{name}-"))
        .tempdir()
        .expect("create scratch dir")
}

/// Write `bytes` to `path` and push its mtime forward so a new signature is guaranteed
pub fn write_with_new_mtime(path: &Path, bytes: &[u8], offset_secs: u64) {
    fs::write(path, bytes).expect("write sentinel");
    let file = fs::File::options().write(true).open(path).expect("open sentinel");
    file.set_modified(SystemTime::now() + Duration::from_secs(offset_secs))
        .expect("set mtime");
}

/// Live-view configuration with fast timings rooted in `drop_dir`
pub fn fast_liveview(drop_dir: &Path) -> LiveViewConfig {
    LiveViewConfig {
        drop_dir: drop_dir.to_path_buf(),
        sdk_poll_ms: 16,
        file_poll_ms: 33,
        failover_ms: 500,
        warmup_ms: 0,
        reconnect_ms: 100,
        stop_timeout_ms: 3000,
        shoot_timeout_ms: 3000,
        ..LiveViewConfig::default()
    }
}

/// A face looking straight into the camera with level eyes
pub fn good_face() -> FaceDetection {
    FaceDetection::default()
        .with_eyes((0.42, 0.40), (0.58, 0.40))
        .with_angles(HeadAngles::new(0.0, 6.0))
}

/// Level shoulders
pub fn good_pose() -> PoseDetection {
    PoseDetection::with_shoulders((0.3, 0.6), (0.7, 0.6))
}

/// Shoulders whose pixel-space line is tilted by `deg` on a square frame
pub fn tilted_pose(deg: f64) -> PoseDetection {
    let dx = 0.4;
    let dy = dx * deg.to_radians().tan();
    PoseDetection::with_shoulders((0.3, 0.6), (0.3 + dx, 0.6 + dy))
}

/// Face detector returning a fixed result
pub struct StubFace(pub Option<FaceDetection>);

impl LandmarkDetector for StubFace {
    type Output = FaceDetection;

    fn process_frame(&mut self, _frame: &Frame, _size: (u32, u32), _ts: u64) -> Result<Option<FaceDetection>> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &str {
        "stub-face"
    }
}

/// Pose detector returning a fixed result
pub struct StubPose(pub Option<PoseDetection>);

impl LandmarkDetector for StubPose {
    type Output = PoseDetection;

    fn process_frame(&mut self, _frame: &Frame, _size: (u32, u32), _ts: u64) -> Result<Option<PoseDetection>> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &str {
        "stub-pose"
    }
}

/// Face detector that always errors
pub struct FailingFace;

impl LandmarkDetector for FailingFace {
    type Output = FaceDetection;

    fn process_frame(&mut self, _frame: &Frame, _size: (u32, u32), _ts: u64) -> Result<Option<FaceDetection>> {
        Err(Error::Detector("inference failed".to_string()))
    }

    fn name(&self) -> &str {
        "failing-face"
    }
}

/// Pose detector that panics
pub struct PanickingPose;

impl LandmarkDetector for PanickingPose {
    type Output = PoseDetection;

    fn process_frame(&mut self, _frame: &Frame, _size: (u32, u32), _ts: u64) -> Result<Option<PoseDetection>> {
        panic!("pose model crashed");
    }

    fn name(&self) -> &str {
        "panicking-pose"
    }
}

/// Shared, test-controlled state of a [`ScriptedBridge`]
#[derive(Debug, Default)]
pub struct BridgeState {
    pub connect_ok: bool,
    pub producing: bool,
    pub connected: bool,
    pub connects: usize,
    pub disconnects: usize,
    pub shots: usize,
    pub streaming_calls: Vec<bool>,
}

/// Camera bridge driven by a shared [`BridgeState`]
pub struct ScriptedBridge {
    state: Arc<Mutex<BridgeState>>,
    jpeg: Vec<u8>,
}

impl ScriptedBridge {
    pub fn new(connect_ok: bool, producing: bool) -> (Self, Arc<Mutex<BridgeState>>) {
        let state = Arc::new(Mutex::new(BridgeState {
            connect_ok,
            producing,
            ..BridgeState::default()
        }));
        let bridge = Self {
            state: Arc::clone(&state),
            jpeg: encode_jpeg(32, 24),
        };
        (bridge, state)
    }

    fn state(&self) -> std::sync::MutexGuard<'_, BridgeState> {
        self.state.lock().expect("bridge state poisoned")
    }
}

impl CameraBridge for ScriptedBridge {
    fn connect(&mut self) -> Result<()> {
        let mut s = self.state();
        s.connects += 1;
        if s.connect_ok {
            s.connected = true;
            Ok(())
        } else {
            Err(Error::BridgeUnavailable("scripted: no camera".to_string()))
        }
    }

    fn is_connected(&self) -> bool {
        self.state().connected
    }

    fn set_streaming(&mut self, enabled: bool) -> Result<()> {
        let mut s = self.state();
        if !s.connected {
            return Err(Error::NoCameraHandle);
        }
        s.streaming_calls.push(enabled);
        Ok(())
    }

    fn buffer_size(&mut self) -> Result<usize> {
        let s = self.state();
        if !s.connected {
            return Err(Error::NoCameraHandle);
        }
        Ok(if s.producing { self.jpeg.len() + 64 } else { 0 })
    }

    fn fetch_frame(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < self.jpeg.len() {
            return Err(Error::Bridge("buffer too small".to_string()));
        }
        buf[..self.jpeg.len()].copy_from_slice(&self.jpeg);
        // Trailing padding, as real live-view buffers carry
        let padded = (self.jpeg.len() + 16).min(buf.len());
        buf[self.jpeg.len()..padded].fill(0);
        Ok(padded)
    }

    fn shoot_one(&mut self) -> Result<()> {
        let mut s = self.state();
        if !s.connected {
            return Err(Error::NoCameraHandle);
        }
        s.shots += 1;
        Ok(())
    }

    fn disconnect(&mut self) {
        let mut s = self.state();
        if s.connected {
            s.connected = false;
            s.disconnects += 1;
        }
    }
}

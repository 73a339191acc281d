//! Pose guidance: smoothed metrics, hysteresis-gated hints and auto-capture
//! readiness.
//!
//! [`GuidanceEngine::update`] is called once per delivered frame. Detector
//! output is turned into raw metrics on every call, but the smoothed metrics,
//! gates and badge texts only advance once per evaluation interval
//! (`rate_ms`, 500 ms by default), so the hints change at most twice a second
//! however fast frames arrive.

/// Badge texts and the priority ladder choosing them
pub mod badges;

/// Auto-capture dwell gate
pub mod dwell;

/// Exponential smoothing of metrics
pub mod ema;

/// Per-axis hysteresis latches
pub mod gates;

/// Raw metric computation
pub mod metrics;

/// Source-dependent yaw calibration
pub mod yaw;

pub use badges::Badges;
pub use metrics::MetricSnapshot;
pub use yaw::{InputSource, YawCalibration};

use crate::{
    config::GuidanceConfig,
    detector::{detect_safely, DetectionPayload, FaceDetection, LandmarkDetector, PoseDetection},
    frame::Frame,
    Error, Result,
};
use dwell::ReadyWindow;
use ema::SmoothedState;
use gates::GateState;
use log::{debug, trace};

/// Everything one `update` call produces
#[derive(Debug, Clone, PartialEq)]
pub struct GuidanceOutput {
    /// This frame's detector output, for landmark overlays
    pub payload: DetectionPayload,
    /// Badge texts from the latest evaluation
    pub badges: Badges,
    /// Smoothed metrics from the latest evaluation, with `ready` for this call
    pub metrics: MetricSnapshot,
}

/// Synchronous pose evaluator. Not shared between threads.
#[derive(Debug, Clone)]
pub struct GuidanceEngine {
    rate_ms: u64,
    source: InputSource,
    yaw_sdk: YawCalibration,
    yaw_file: YawCalibration,
    smoothed: SmoothedState,
    gates: GateState,
    badges: Badges,
    ready: ReadyWindow,
    last_eval_ms: Option<u64>,
}

impl Default for GuidanceEngine {
    fn default() -> Self {
        Self::build(&GuidanceConfig::default(), SmoothedState::default())
    }
}

impl GuidanceEngine {
    /// Create an engine from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if `ema_alpha` is outside (0, 1] or `rate_ms` is 0
    pub fn new(config: &GuidanceConfig) -> Result<Self> {
        let smoothed = SmoothedState::new(config.ema_alpha)?;
        if config.rate_ms == 0 {
            return Err(Error::ConfigError("Evaluation rate must be greater than 0".to_string()));
        }
        Ok(Self::build(config, smoothed))
    }

    fn build(config: &GuidanceConfig, smoothed: SmoothedState) -> Self {
        Self {
            rate_ms: config.rate_ms,
            source: config.input_source,
            yaw_sdk: config.yaw_sdk,
            yaw_file: config.yaw_file,
            smoothed,
            gates: GateState::default(),
            badges: Badges::default(),
            ready: ReadyWindow::new(config.ready_dwell_ms),
            last_eval_ms: None,
        }
    }

    /// Select which yaw calibration applies to following frames
    pub fn set_input_source(&mut self, source: InputSource) {
        if self.source != source {
            debug!("Guidance input source: {} -> {}", self.source, source);
            self.source = source;
        }
    }

    #[must_use]
    pub const fn input_source(&self) -> InputSource {
        self.source
    }

    /// Replace the yaw calibration used for `source`
    pub fn set_yaw_calibration(&mut self, source: InputSource, calibration: YawCalibration) {
        match source {
            InputSource::Sdk => self.yaw_sdk = calibration,
            InputSource::File => self.yaw_file = calibration,
        }
    }

    const fn yaw_calibration(&self) -> &YawCalibration {
        match self.source {
            InputSource::Sdk => &self.yaw_sdk,
            InputSource::File => &self.yaw_file,
        }
    }

    /// Forget all smoothing, gate, badge and readiness state
    pub fn reset(&mut self) {
        self.smoothed.reset();
        self.gates.reset();
        self.badges = Badges::default();
        self.ready.reset();
        self.last_eval_ms = None;
    }

    /// Current gate latches
    #[must_use]
    pub const fn gates(&self) -> &GateState {
        &self.gates
    }

    fn due(&self, timestamp_ms: u64) -> bool {
        match self.last_eval_ms {
            None => true,
            // Clock went backwards: re-anchor on this call
            Some(last) if timestamp_ms < last => true,
            Some(last) => timestamp_ms - last >= self.rate_ms,
        }
    }

    /// Evaluate one frame.
    ///
    /// `ready` holds once the smoothed `ok_all` has stayed set for the dwell
    /// time. Never fails: detector errors count as no detection and a metric
    /// computation failure yields zeroed metrics with `ok_all` false.
    pub fn update(
        &mut self,
        frame: &Frame,
        ratio_hint: &str,
        timestamp_ms: u64,
        face_detector: Option<&mut dyn LandmarkDetector<Output = FaceDetection>>,
        pose_detector: Option<&mut dyn LandmarkDetector<Output = PoseDetection>>,
    ) -> GuidanceOutput {
        let payload = DetectionPayload {
            face: detect_safely(face_detector, frame, timestamp_ms),
            pose: detect_safely(pose_detector, frame, timestamp_ms),
        };
        trace!(
            "update ts={} ratio={} face={} pose={}",
            timestamp_ms,
            ratio_hint,
            payload.face.is_some(),
            payload.pose.is_some()
        );

        let (width, height) = frame.size();
        let raw = match metrics::compute_metrics(&payload, width, height, self.yaw_calibration()) {
            Ok(raw) => raw,
            Err(e) => {
                debug!("Metric computation failed at {} ms: {}", timestamp_ms, e);
                self.ready.reset();
                return GuidanceOutput {
                    payload,
                    badges: self.badges.clone(),
                    metrics: MetricSnapshot::zeroed(),
                };
            }
        };

        if self.due(timestamp_ms) {
            self.last_eval_ms = Some(timestamp_ms);
            let smoothed = self.smoothed.merge(&raw);
            trace!("ok_all level {:.3}", self.smoothed.ok_all_level());
            self.gates.update(&smoothed);
            let badges = badges::decide(&smoothed, &self.gates);
            if badges != self.badges {
                debug!("Badges: {:?}", badges);
            }
            self.badges = badges;
        }

        let mut metrics = self.smoothed.latest().unwrap_or_default();
        metrics.ready = self.ready.update(metrics.ok_all, timestamp_ms);

        GuidanceOutput {
            payload,
            badges: self.badges.clone(),
            metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{detector::HeadAngles, frame::FrameOrigin};
    use image::RgbImage;

    struct Pose(PoseDetection);

    impl LandmarkDetector for Pose {
        type Output = PoseDetection;

        fn process_frame(&mut self, _: &Frame, _: (u32, u32), _: u64) -> Result<Option<PoseDetection>> {
            Ok(Some(self.0.clone()))
        }

        fn name(&self) -> &str {
            "pose"
        }
    }

    struct Face(FaceDetection);

    impl LandmarkDetector for Face {
        type Output = FaceDetection;

        fn process_frame(&mut self, _: &Frame, _: (u32, u32), _: u64) -> Result<Option<FaceDetection>> {
            Ok(Some(self.0.clone()))
        }

        fn name(&self) -> &str {
            "face"
        }
    }

    fn frame() -> Frame {
        Frame::new(RgbImage::new(100, 100), FrameOrigin::File, 0)
    }

    #[test]
    fn test_rejects_bad_config() {
        let config = GuidanceConfig {
            ema_alpha: 0.0,
            ..GuidanceConfig::default()
        };
        assert!(GuidanceEngine::new(&config).is_err());
        let config = GuidanceConfig {
            rate_ms: 0,
            ..GuidanceConfig::default()
        };
        assert!(GuidanceEngine::new(&config).is_err());
    }

    #[test]
    fn test_first_call_evaluates_immediately() {
        let mut engine = GuidanceEngine::default();
        let out = engine.update(&frame(), "3:4", 0, None, None);
        assert_eq!(out.badges.primary, badges::FACE_NOT_IN_FRAME);
        assert!(!out.metrics.ready);
    }

    #[test]
    fn test_source_selects_yaw_calibration() {
        let face = FaceDetection::default()
            .with_eyes((0.4, 0.5), (0.6, 0.5))
            .with_angles(HeadAngles::new(11.0, 5.0));

        let mut engine = GuidanceEngine::default();
        engine.set_input_source(InputSource::Sdk);
        let out = engine.update(&frame(), "3:4", 0, Some(&mut Face(face.clone())), None);
        assert!(out.metrics.yaw_deg < 0.0);

        let mut engine = GuidanceEngine::default();
        engine.set_input_source(InputSource::File);
        let out = engine.update(&frame(), "3:4", 0, Some(&mut Face(face)), None);
        assert!(out.metrics.yaw_deg > 0.0);
    }

    #[test]
    fn test_custom_calibration() {
        let face = FaceDetection::default().with_angles(HeadAngles::new(10.0, 5.0));
        let mut engine = GuidanceEngine::default();
        engine.set_yaw_calibration(
            InputSource::File,
            YawCalibration {
                scale: 1.0,
                offset_deg: -10.0,
            },
        );
        let out = engine.update(&frame(), "3:4", 0, Some(&mut Face(face)), None);
        assert_eq!(out.metrics.yaw_deg, 0.0);
    }

    #[test]
    fn test_metric_failure_returns_zeroed() {
        let mut engine = GuidanceEngine::default();
        let broken = PoseDetection::with_shoulders((f64::INFINITY, 0.5), (0.6, 0.5));
        let out = engine.update(&frame(), "3:4", 0, None, Some(&mut Pose(broken.clone())));
        assert_eq!(out.metrics, MetricSnapshot::zeroed());
        assert!(!out.metrics.ok_all);
        assert_eq!(out.payload.pose, Some(broken));
    }
}

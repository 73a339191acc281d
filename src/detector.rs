//! Landmark detector capability and the detection records it produces.
//!
//! Face and pose detectors are external black boxes. The guidance engine only
//! sees them through [`LandmarkDetector`], and treats an error, an empty
//! result or a panic inside a detector as "nothing detected this tick".

use crate::{frame::Frame, Result};
use log::debug;
use std::{
    collections::BTreeMap,
    panic::{catch_unwind, AssertUnwindSafe},
};

/// Normalized image point, both coordinates in 0..1
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Head rotation reported by a face detector, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeadAngles {
    pub yaw: Option<f64>,
    pub pitch: Option<f64>,
}

impl HeadAngles {
    #[must_use]
    pub const fn new(yaw: f64, pitch: f64) -> Self {
        Self {
            yaw: Some(yaw),
            pitch: Some(pitch),
        }
    }
}

/// Key of the left eye in [`FaceDetection::core`]
pub const EYE_LEFT: &str = "eye_L";
/// Key of the right eye in [`FaceDetection::core`]
pub const EYE_RIGHT: &str = "eye_R";

/// Output of a face landmark detector
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FaceDetection {
    /// Named key points (`eye_L`, `eye_R`, ...)
    pub core: BTreeMap<String, Point2>,
    /// Dense mesh, when the detector provides one
    pub mesh: Vec<Point2>,
    /// Rotation under the `angles` key
    pub angles: Option<HeadAngles>,
    /// Rotation under the `euler` key
    pub euler: Option<HeadAngles>,
    /// Rotation under the `pose` key
    pub pose: Option<HeadAngles>,
}

impl FaceDetection {
    /// Set a named key point
    #[must_use]
    pub fn with_point(mut self, key: &str, point: impl Into<Point2>) -> Self {
        self.core.insert(key.to_string(), point.into());
        self
    }

    /// Set both eye key points
    #[must_use]
    pub fn with_eyes(self, left: impl Into<Point2>, right: impl Into<Point2>) -> Self {
        self.with_point(EYE_LEFT, left).with_point(EYE_RIGHT, right)
    }

    /// Set the rotation reported under `angles`
    #[must_use]
    pub const fn with_angles(mut self, angles: HeadAngles) -> Self {
        self.angles = Some(angles);
        self
    }

    /// Named key point lookup
    #[must_use]
    pub fn point(&self, key: &str) -> Option<Point2> {
        self.core.get(key).copied()
    }

    /// Rotation from the first present of `angles`, `euler`, `pose`
    #[must_use]
    pub fn head_angles(&self) -> Option<HeadAngles> {
        self.angles.or(self.euler).or(self.pose)
    }

    /// Whether any face point was reported
    #[must_use]
    pub fn has_points(&self) -> bool {
        !self.mesh.is_empty() || !self.core.is_empty()
    }
}

/// Output of a body pose detector
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PoseDetection {
    pub shoulder_left: Option<Point2>,
    pub shoulder_right: Option<Point2>,
    /// Extra upper-body points used only for presence
    pub support: Vec<Point2>,
}

impl PoseDetection {
    #[must_use]
    pub fn with_shoulders(left: impl Into<Point2>, right: impl Into<Point2>) -> Self {
        Self {
            shoulder_left: Some(left.into()),
            shoulder_right: Some(right.into()),
            support: Vec::new(),
        }
    }

    /// Both shoulders, if both were found
    #[must_use]
    pub fn shoulders(&self) -> Option<(Point2, Point2)> {
        self.shoulder_left.zip(self.shoulder_right)
    }

    /// Whether the upper body is visible
    #[must_use]
    pub fn has_points(&self) -> bool {
        !self.support.is_empty() || self.shoulders().is_some()
    }
}

/// Everything the detectors found on one frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetectionPayload {
    pub face: Option<FaceDetection>,
    pub pose: Option<PoseDetection>,
}

impl DetectionPayload {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.face.is_none() && self.pose.is_none()
    }
}

/// A landmark detector that can be run on a frame.
///
/// `Ok(None)` means the detector ran and found nothing.
pub trait LandmarkDetector {
    /// Detection record this detector produces
    type Output;

    /// Run detection on `frame`, whose pixel size is `size`
    ///
    /// # Errors
    ///
    /// Implementations return an error when inference fails; callers
    /// treat that the same as no detection
    fn process_frame(&mut self, frame: &Frame, size: (u32, u32), timestamp_ms: u64) -> Result<Option<Self::Output>>;

    /// Detector name for logging
    fn name(&self) -> &str;
}

/// Face detector capability
pub type FaceDetector = dyn LandmarkDetector<Output = FaceDetection>;

/// Pose detector capability
pub type PoseDetector = dyn LandmarkDetector<Output = PoseDetection>;

/// Run a detector, folding errors and panics into `None`
pub fn detect_safely<T>(
    detector: Option<&mut dyn LandmarkDetector<Output = T>>,
    frame: &Frame,
    timestamp_ms: u64,
) -> Option<T> {
    let detector = detector?;
    let size = frame.size();
    match catch_unwind(AssertUnwindSafe(|| detector.process_frame(frame, size, timestamp_ms))) {
        Ok(Ok(found)) => found,
        Ok(Err(e)) => {
            debug!("{} failed at {} ms: {}", detector.name(), timestamp_ms, e);
            None
        }
        Err(_) => {
            debug!("{} panicked at {} ms", detector.name(), timestamp_ms);
            None
        }
    }
}

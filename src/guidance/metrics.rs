//! Per-frame pose metrics and the acceptance limits applied to them.

use super::yaw::YawCalibration;
use crate::{
    constants::{EYE_OK, PITCH_HIGH, PITCH_LOW, SHOULDER_OK, YAW_OK},
    detector::{DetectionPayload, Point2, EYE_LEFT, EYE_RIGHT},
    Error, Result,
};
use std::collections::BTreeMap;

/// Pose metrics for one evaluation.
///
/// Angles are in degrees, `eye_h_pct` is in percent of frame height.
/// A missing axis reports `has_* = false` and its `ok_*` stays true.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MetricSnapshot {
    pub shoulder_deg: f64,
    pub eye_h_pct: f64,
    /// +1 when the left eye sits lower, -1 when the right one does
    pub eye_sign: f64,
    pub yaw_deg: f64,
    pub pitch_deg: f64,
    pub has_face: bool,
    pub has_pose: bool,
    pub has_yaw: bool,
    pub has_pitch: bool,
    pub ok_shoulder: bool,
    pub ok_eye: bool,
    pub ok_yaw: bool,
    pub ok_pitch: bool,
    pub ok_all: bool,
    /// Auto-capture may fire
    pub ready: bool,
}

fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

impl MetricSnapshot {
    /// All values zero and every flag false
    #[must_use]
    pub fn zeroed() -> Self {
        Self::default()
    }

    /// Recompute the `ok_*` flags from the current values
    #[must_use]
    pub fn with_limits(mut self) -> Self {
        self.ok_shoulder = self.shoulder_deg.abs() <= SHOULDER_OK;
        self.ok_eye = self.eye_h_pct <= EYE_OK;
        self.ok_yaw = !self.has_yaw || self.yaw_deg.abs() <= YAW_OK;
        self.ok_pitch = !self.has_pitch || (PITCH_LOW..=PITCH_HIGH).contains(&self.pitch_deg);
        self.ok_all = self.ok_shoulder && self.ok_eye && self.ok_yaw && self.ok_pitch;
        self
    }

    /// Both a face and an upper body were seen.
    ///
    /// `ok_all` alone holds for an empty frame because absent axes pass, so
    /// auto-capture should also require this.
    #[must_use]
    pub const fn has_subject(&self) -> bool {
        self.has_face && self.has_pose
    }

    /// Flat name -> value view, flags as 0.0 / 1.0
    #[must_use]
    pub fn as_map(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("shoulder_deg", self.shoulder_deg),
            ("eye_h_pct", self.eye_h_pct),
            ("eye_sign", self.eye_sign),
            ("yaw_deg", self.yaw_deg),
            ("pitch_deg", self.pitch_deg),
            ("has_face", flag(self.has_face)),
            ("has_pose", flag(self.has_pose)),
            ("has_yaw", flag(self.has_yaw)),
            ("has_pitch", flag(self.has_pitch)),
            ("ok_shoulder", flag(self.ok_shoulder)),
            ("ok_eye", flag(self.ok_eye)),
            ("ok_yaw", flag(self.ok_yaw)),
            ("ok_pitch", flag(self.ok_pitch)),
            ("ok_all", flag(self.ok_all)),
            ("ready", flag(self.ready)),
        ])
    }
}

fn finite_point(p: Point2, what: &str) -> Result<Point2> {
    if p.x.is_finite() && p.y.is_finite() {
        Ok(p)
    } else {
        Err(Error::InvalidInput(format!("non-finite {what} coordinate")))
    }
}

fn finite_angle(v: Option<f64>, what: &str) -> Result<Option<f64>> {
    match v {
        Some(a) if !a.is_finite() => Err(Error::InvalidInput(format!("non-finite {what}"))),
        other => Ok(other),
    }
}

/// Compute raw metrics for one frame of size `width` x `height`.
///
/// # Errors
///
/// Returns an error when a detector reported non-finite values or the frame
/// has no pixels; callers substitute [`MetricSnapshot::zeroed`]
pub fn compute_metrics(
    payload: &DetectionPayload,
    width: u32,
    height: u32,
    yaw_calibration: &YawCalibration,
) -> Result<MetricSnapshot> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidInput(format!("empty frame {width}x{height}")));
    }
    let mut m = MetricSnapshot {
        has_face: payload.face.as_ref().is_some_and(|f| f.has_points()),
        has_pose: payload.pose.as_ref().is_some_and(|p| p.has_points()),
        ..MetricSnapshot::zeroed()
    };

    if let Some((left, right)) = payload.pose.as_ref().and_then(|p| p.shoulders()) {
        let left = finite_point(left, "shoulder")?;
        let right = finite_point(right, "shoulder")?;
        let dx = (right.x - left.x) * f64::from(width);
        let dy = (right.y - left.y) * f64::from(height);
        m.shoulder_deg = dy.atan2(dx).to_degrees();
    }

    if let Some(face) = &payload.face {
        if let (Some(left), Some(right)) = (face.point(EYE_LEFT), face.point(EYE_RIGHT)) {
            let dy = finite_point(left, "eye")?.y - finite_point(right, "eye")?.y;
            m.eye_h_pct = dy.abs() * 100.0;
            m.eye_sign = if dy > 0.0 {
                1.0
            } else if dy < 0.0 {
                -1.0
            } else {
                0.0
            };
        }

        if let Some(angles) = face.head_angles() {
            if let Some(yaw) = finite_angle(angles.yaw, "yaw")? {
                m.yaw_deg = yaw_calibration.apply(yaw);
                m.has_yaw = true;
            }
            if let Some(pitch) = finite_angle(angles.pitch, "pitch")? {
                m.pitch_deg = pitch;
                m.has_pitch = true;
            }
        }
    }

    Ok(m.with_limits())
}

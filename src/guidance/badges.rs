use super::{gates::GateState, metrics::MetricSnapshot};
use crate::constants::{PITCH_LOW, SHOULDER_SIDE_DEG};

pub const RAISE_RIGHT_SHOULDER: &str = "Raise your right shoulder slightly";
pub const RAISE_LEFT_SHOULDER: &str = "Raise your left shoulder slightly";
pub const LEVEL_SHOULDERS: &str = "Level your shoulders";
pub const TILT_HEAD_RIGHT: &str = "Tilt your head slightly to the right";
pub const TILT_HEAD_LEFT: &str = "Tilt your head slightly to the left";
pub const TILT_HEAD_LEVEL: &str = "Tilt your head slightly to level your eyes";
pub const CHIN_UP: &str = "Lift your chin slightly";
pub const CHIN_DOWN: &str = "Lower your chin slightly";
pub const FACE_NOT_IN_FRAME: &str = "Bring your face into the frame and look straight ahead";
pub const STEP_BACK: &str = "Step back a little so your shoulders are visible";
pub const POSE_OK: &str = "OK";
pub const ADJUST_POSE: &str = "Adjust your pose slightly";

/// Hint shown while the head is turned
#[must_use]
pub fn look_forward(yaw_abs_deg: f64) -> String {
    format!("Look straight ahead ({yaw_abs_deg:.1}°)")
}

/// Hint texts for the three badge slots; an empty string hides the slot
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Badges {
    /// Centre slot: yaw, pitch, presence or OK
    pub primary: String,
    /// Left slot: eye level
    pub left: String,
    /// Right slot: shoulder level
    pub right: String,
}

/// Choose badge texts from smoothed metrics and the current gates
#[must_use]
pub fn decide(m: &MetricSnapshot, gates: &GateState) -> Badges {
    let right = if gates.shoulder.is_active() && m.has_pose {
        if m.shoulder_deg > SHOULDER_SIDE_DEG {
            RAISE_RIGHT_SHOULDER
        } else if m.shoulder_deg < -SHOULDER_SIDE_DEG {
            RAISE_LEFT_SHOULDER
        } else {
            LEVEL_SHOULDERS
        }
    } else {
        ""
    };

    let left = if gates.eye.is_active() && m.has_face {
        if m.eye_sign > 0.0 {
            TILT_HEAD_RIGHT
        } else if m.eye_sign < 0.0 {
            TILT_HEAD_LEFT
        } else {
            TILT_HEAD_LEVEL
        }
    } else {
        ""
    };

    let primary = if gates.yaw.is_active() && m.has_face {
        look_forward(m.yaw_deg.abs())
    } else if gates.pitch.is_active() && m.has_face {
        let hint = if m.pitch_deg < PITCH_LOW { CHIN_UP } else { CHIN_DOWN };
        hint.to_string()
    } else if !m.has_face {
        FACE_NOT_IN_FRAME.to_string()
    } else if !m.has_pose {
        STEP_BACK.to_string()
    } else if m.ok_all {
        POSE_OK.to_string()
    } else {
        ADJUST_POSE.to_string()
    };

    Badges {
        primary,
        left: left.to_string(),
        right: right.to_string(),
    }
}

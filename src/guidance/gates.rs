//! Hysteresis latches deciding which corrective hints are shown.

use super::metrics::MetricSnapshot;
use crate::{
    constants::{
        EYE_OFF, EYE_ON, PITCH_HIGH, PITCH_LOW, PITCH_OFF_DELTA, PITCH_ON_DELTA, SHOULDER_OFF, SHOULDER_ON, YAW_OFF,
        YAW_ON,
    },
    Error, Result,
};

/// Boolean latch that turns on above `on` and off below `off`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HysteresisGate {
    on: f64,
    off: f64,
    active: bool,
}

impl HysteresisGate {
    /// # Errors
    ///
    /// Returns an error unless `off <= on`
    pub fn new(on: f64, off: f64) -> Result<Self> {
        if off <= on {
            Ok(Self::latch(on, off))
        } else {
            Err(Error::InvalidInput(format!(
                "gate OFF threshold {off} must not exceed ON threshold {on}"
            )))
        }
    }

    const fn latch(on: f64, off: f64) -> Self {
        Self { on, off, active: false }
    }

    /// Feed a value and return the latched state
    pub fn update(&mut self, value: f64) -> bool {
        if self.active {
            if value < self.off {
                self.active = false;
            }
        } else if value > self.on {
            self.active = true;
        }
        self.active
    }

    pub fn force_off(&mut self) {
        self.active = false;
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }
}

/// Distance of `pitch_deg` outside the recommended band, 0 inside it
#[must_use]
pub fn pitch_excess(pitch_deg: f64) -> f64 {
    if pitch_deg < PITCH_LOW {
        PITCH_LOW - pitch_deg
    } else if pitch_deg > PITCH_HIGH {
        pitch_deg - PITCH_HIGH
    } else {
        0.0
    }
}

/// The four per-axis gates
#[derive(Debug, Clone, PartialEq)]
pub struct GateState {
    pub shoulder: HysteresisGate,
    pub eye: HysteresisGate,
    pub yaw: HysteresisGate,
    pub pitch: HysteresisGate,
}

impl Default for GateState {
    fn default() -> Self {
        Self {
            shoulder: HysteresisGate::latch(SHOULDER_ON, SHOULDER_OFF),
            eye: HysteresisGate::latch(EYE_ON, EYE_OFF),
            yaw: HysteresisGate::latch(YAW_ON, YAW_OFF),
            pitch: HysteresisGate::latch(PITCH_ON_DELTA, PITCH_OFF_DELTA),
        }
    }
}

impl GateState {
    /// Advance every gate with a smoothed snapshot.
    ///
    /// Yaw and pitch drop to OFF whenever the axis was not detected.
    pub fn update(&mut self, m: &MetricSnapshot) {
        self.shoulder.update(m.shoulder_deg.abs());
        self.eye.update(m.eye_h_pct);

        if m.has_yaw {
            self.yaw.update(m.yaw_deg.abs());
        } else {
            self.yaw.force_off();
        }

        if m.has_pitch {
            self.pitch.update(pitch_excess(m.pitch_deg));
        } else {
            self.pitch.force_off();
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

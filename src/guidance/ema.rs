use super::metrics::MetricSnapshot;
use crate::{constants::DEFAULT_EMA_ALPHA, Error, Result};

/// A smoothed flag at or above this level reads as set
pub const FLAG_ON: f64 = 0.5;

/// Exponential smoothing of one value with a cold start at zero.
///
/// Every sample moves the running value by `alpha * (sample - value)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialSmoother {
    alpha: f64,
    value: f64,
}

impl ExponentialSmoother {
    /// # Errors
    ///
    /// Returns an error if `alpha` is outside (0, 1]
    pub fn new(alpha: f64) -> Result<Self> {
        if alpha > 0.0 && alpha <= 1.0 {
            Ok(Self::cold(alpha))
        } else {
            Err(Error::ConfigError(format!("EMA alpha must be in (0, 1], got {alpha}")))
        }
    }

    const fn cold(alpha: f64) -> Self {
        Self { alpha, value: 0.0 }
    }

    pub fn apply(&mut self, sample: f64) -> f64 {
        self.value += self.alpha * (sample - self.value);
        self.value
    }

    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = 0.0;
    }
}

const fn level(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

fn apply_all<const N: usize>(smoothers: &mut [ExponentialSmoother; N], samples: [f64; N]) -> [f64; N] {
    let mut out = [0.0; N];
    for ((smoother, sample), slot) in smoothers.iter_mut().zip(samples).zip(&mut out) {
        *slot = smoother.apply(sample);
    }
    out
}

/// Index of `ok_all` among the smoothed flags
const OK_ALL: usize = 8;

/// Smoothed pose metrics kept between evaluations.
///
/// Every field is averaged: the five continuous values as they are, presence
/// and `ok_*` flags as 0/1 samples read back as set at [`FLAG_ON`]. A cold or
/// freshly reset store therefore needs a few consistent evaluations before a
/// subject counts as present or a pose as acceptable.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedState {
    values: [ExponentialSmoother; 5],
    flags: [ExponentialSmoother; 9],
    latest: Option<MetricSnapshot>,
}

impl Default for SmoothedState {
    fn default() -> Self {
        Self::with_smoother(ExponentialSmoother::cold(DEFAULT_EMA_ALPHA))
    }
}

impl SmoothedState {
    /// # Errors
    ///
    /// Returns an error if `alpha` is outside (0, 1]
    pub fn new(alpha: f64) -> Result<Self> {
        ExponentialSmoother::new(alpha).map(Self::with_smoother)
    }

    const fn with_smoother(smoother: ExponentialSmoother) -> Self {
        Self {
            values: [smoother; 5],
            flags: [smoother; 9],
            latest: None,
        }
    }

    /// Fold one raw sample in and return the new smoothed snapshot
    pub fn merge(&mut self, raw: &MetricSnapshot) -> MetricSnapshot {
        let [shoulder_deg, eye_h_pct, eye_sign, yaw_deg, pitch_deg] = apply_all(
            &mut self.values,
            [raw.shoulder_deg, raw.eye_h_pct, raw.eye_sign, raw.yaw_deg, raw.pitch_deg],
        );
        let flags = [
            raw.has_face,
            raw.has_pose,
            raw.has_yaw,
            raw.has_pitch,
            raw.ok_shoulder,
            raw.ok_eye,
            raw.ok_yaw,
            raw.ok_pitch,
            raw.ok_all,
        ];
        let [has_face, has_pose, has_yaw, has_pitch, ok_shoulder, ok_eye, ok_yaw, ok_pitch, ok_all] =
            apply_all(&mut self.flags, flags.map(level)).map(|v| v >= FLAG_ON);

        let smoothed = MetricSnapshot {
            shoulder_deg,
            eye_h_pct,
            eye_sign,
            yaw_deg,
            pitch_deg,
            has_face,
            has_pose,
            has_yaw,
            has_pitch,
            ok_shoulder,
            ok_eye,
            ok_yaw,
            ok_pitch,
            ok_all,
            ready: false,
        };
        self.latest = Some(smoothed);
        smoothed
    }

    /// Smoothed fraction of recent evaluations with every axis acceptable
    #[must_use]
    pub const fn ok_all_level(&self) -> f64 {
        self.flags[OK_ALL].value()
    }

    /// Latest smoothed snapshot, `None` before the first merge
    #[must_use]
    pub const fn latest(&self) -> Option<MetricSnapshot> {
        self.latest
    }

    pub fn reset(&mut self) {
        for smoother in self.values.iter_mut().chain(self.flags.iter_mut()) {
            smoother.reset();
        }
        self.latest = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cold_start_from_zero() {
        let mut ema = ExponentialSmoother::new(2.0 / 11.0).unwrap();
        let v = ema.apply(10.0);
        assert!((v - 20.0 / 11.0).abs() < 1e-12);
        let v = ema.apply(10.0);
        assert!((v - (20.0 / 11.0 + 2.0 / 11.0 * (10.0 - 20.0 / 11.0))).abs() < 1e-12);
    }

    #[test]
    fn test_converges_to_constant() {
        let mut ema = ExponentialSmoother::new(0.5).unwrap();
        for _ in 0..60 {
            ema.apply(42.0);
        }
        assert!((ema.value() - 42.0).abs() < 1e-9);
        ema.reset();
        assert_eq!(ema.value(), 0.0);
    }

    #[test]
    fn test_rejects_alpha_outside_unit_interval() {
        for alpha in [0.0, -0.1, 1.5, f64::NAN] {
            assert!(matches!(ExponentialSmoother::new(alpha), Err(Error::ConfigError(_))));
            assert!(SmoothedState::new(alpha).is_err());
        }
        assert!(ExponentialSmoother::new(1.0).is_ok());
    }

    #[test]
    fn test_default_uses_default_alpha() {
        assert_eq!(SmoothedState::default(), SmoothedState::new(DEFAULT_EMA_ALPHA).unwrap());
    }

    #[test]
    fn test_flags_need_consistent_evaluations() {
        let mut state = SmoothedState::new(2.0 / 11.0).unwrap();
        assert!(state.latest().is_none());

        let present = MetricSnapshot {
            has_face: true,
            has_pose: true,
            ..MetricSnapshot::zeroed()
        }
        .with_limits();
        assert!(present.ok_all);

        // 1 - (9/11)^n crosses 0.5 on the fourth merge
        for _ in 0..3 {
            let s = state.merge(&present);
            assert!(!s.has_face && !s.has_pose && !s.ok_all);
        }
        let s = state.merge(&present);
        assert!(s.has_face && s.has_pose && s.ok_all);
        assert!((state.ok_all_level() - (1.0 - (9.0f64 / 11.0).powi(4))).abs() < 1e-12);
        assert_eq!(state.latest(), Some(s));

        state.reset();
        assert!(state.latest().is_none());
        assert_eq!(state.ok_all_level(), 0.0);
    }

    #[test]
    fn test_out_of_limit_pose_never_reads_ok() {
        let mut state = SmoothedState::new(2.0 / 11.0).unwrap();
        let tilted = MetricSnapshot {
            shoulder_deg: 5.0,
            has_face: true,
            has_pose: true,
            ..MetricSnapshot::zeroed()
        }
        .with_limits();
        assert!(!tilted.ok_all);

        for _ in 0..30 {
            let s = state.merge(&tilted);
            // The smoothed angle passes through the OK band, the flag does not
            assert!(!s.ok_shoulder && !s.ok_all);
        }
        assert_eq!(state.ok_all_level(), 0.0);
    }
}

//! PID engine.
//!
//! A positional PID controller whose integrator is protected two ways:
//! - a soft symmetric clamp (`integral_limit`) bounding unwinding time
//! - conditional integration against the real output limits: the integrator
//!   only accepts a new value when the output is unsaturated or the error is
//!   already pulling the output off the rail it is pinned to
//!
//! The state is owned by exactly one control loop. `integral` and
//! `last_error` persist across ticks; all other fields may be written by an
//! operator between ticks.

use lc_core::{clamp_ordered, ordered_bounds};
use serde::{Deserialize, Serialize};

/// Default symmetric bound on the integral accumulator.
pub const DEFAULT_INTEGRAL_LIMIT: f64 = 1000.0;

/// Controller operating mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlMode {
    /// Output computed by the PID engine.
    Auto,
    /// Output taken from the operator-set manual value.
    #[default]
    Manual,
}

impl ControlMode {
    pub fn is_auto(self) -> bool {
        matches!(self, Self::Auto)
    }
}

/// Proportional, integral and derivative gains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl PidGains {
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }
}

/// PID controller state and operator-facing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PidState {
    pub gains: PidGains,
    pub setpoint: f64,
    /// Last process value fed to the engine.
    pub process_value: f64,
    /// Integral accumulator (error integrated over seconds).
    pub integral: f64,
    pub last_error: f64,
    /// Last computed, clamped output.
    pub output: f64,
    /// Operator output used in manual mode and by the ToManual fail action.
    pub manual_output: f64,
    pub mode: ControlMode,
    /// Soft bound applied to the integral accumulator, `±integral_limit`.
    pub integral_limit: f64,
}

impl Default for PidState {
    fn default() -> Self {
        Self {
            gains: PidGains::default(),
            setpoint: 0.0,
            process_value: 0.0,
            integral: 0.0,
            last_error: 0.0,
            output: 0.0,
            manual_output: 0.0,
            mode: ControlMode::Manual,
            integral_limit: DEFAULT_INTEGRAL_LIMIT,
        }
    }
}

impl PidState {
    /// Create a controller state with the given gains and setpoint.
    pub fn new(gains: PidGains, setpoint: f64) -> Self {
        Self {
            gains,
            setpoint,
            ..Self::default()
        }
    }

    /// Clear the integrator and derivative memory.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_error = 0.0;
    }

    /// Run one PID step against `process_value` and return the new output.
    ///
    /// `out_min`/`out_max` are the real actuator limits; an inverted pair is
    /// swapped. A `dt` that is not a finite positive number disables the
    /// derivative term for this step and leaves `integral` and `last_error`
    /// untouched.
    ///
    /// Non-finite intermediate values never reach `integral` or
    /// `last_error`; when the final output is not finite the previous output
    /// is kept and returned.
    pub fn compute(&mut self, dt: f64, out_min: f64, out_max: f64) -> f64 {
        let (lo, hi) = ordered_bounds(out_min, out_max);
        let PidGains { kp, ki, kd } = self.gains;

        // e = sp - pv (positive error means PV is below setpoint)
        let error = self.setpoint - self.process_value;
        let dt_ok = dt.is_finite() && dt > 0.0;

        let proportional = kp * error;
        let derivative = if dt_ok {
            kd * (error - self.last_error) / dt
        } else {
            0.0
        };

        let limit = self.effective_integral_limit();
        let candidate = if dt_ok && error.is_finite() {
            clamp_ordered(self.integral + error * dt, -limit, limit)
        } else {
            self.integral
        };

        let unsaturated = proportional + ki * candidate + derivative;
        let accept = if !candidate.is_finite() || !unsaturated.is_finite() {
            false
        } else if unsaturated > hi {
            error < 0.0
        } else if unsaturated < lo {
            error > 0.0
        } else {
            true
        };
        if accept {
            self.integral = candidate;
        }

        let output = clamp_ordered(proportional + ki * self.integral + derivative, lo, hi);
        if output.is_finite() {
            self.output = output;
        } else {
            tracing::warn!(
                output,
                error,
                dt,
                "PID output is not finite, holding last good output"
            );
        }
        if dt_ok && error.is_finite() {
            self.last_error = error;
        }

        self.output
    }

    fn effective_integral_limit(&self) -> f64 {
        let limit = self.integral_limit.abs();
        if limit.is_nan() {
            DEFAULT_INTEGRAL_LIMIT
        } else {
            limit
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auto_pid(kp: f64, ki: f64, kd: f64, setpoint: f64) -> PidState {
        PidState {
            mode: ControlMode::Auto,
            ..PidState::new(PidGains::new(kp, ki, kd), setpoint)
        }
    }

    #[test]
    fn defaults_are_zeroed_and_manual() {
        let pid = PidState::default();
        assert_eq!(pid.mode, ControlMode::Manual);
        assert_eq!(pid.integral, 0.0);
        assert_eq!(pid.output, 0.0);
        assert_eq!(pid.integral_limit, DEFAULT_INTEGRAL_LIMIT);
    }

    #[test]
    fn first_tick_matches_hand_calculation() {
        let mut pid = auto_pid(1.0, 1.0, 0.0, 70.0);
        pid.process_value = 50.0;

        let out = pid.compute(0.1, 0.0, 100.0);
        // P = 20, I = 1 * (20 * 0.1) = 2
        assert!((out - 22.0).abs() < 1e-12);
        assert!((pid.integral - 2.0).abs() < 1e-12);
        assert_eq!(pid.last_error, 20.0);
    }

    #[test]
    fn proportional_only() {
        let mut pid = auto_pid(2.0, 0.0, 0.0, 10.0);
        pid.process_value = 7.5;
        let out = pid.compute(1.0, -100.0, 100.0);
        assert!((out - 5.0).abs() < 1e-12);
    }

    #[test]
    fn derivative_uses_error_change_over_dt() {
        let mut pid = auto_pid(0.0, 0.0, 1.0, 10.0);
        pid.process_value = 10.0;
        pid.compute(0.5, -100.0, 100.0);

        pid.process_value = 9.0;
        let out = pid.compute(0.5, -100.0, 100.0);
        // error went 0 -> 1 over 0.5 s
        assert!((out - 2.0).abs() < 1e-12);
    }

    #[test]
    fn zero_dt_skips_integral_and_derivative() {
        let mut pid = auto_pid(1.0, 1.0, 5.0, 10.0);
        pid.process_value = 0.0;
        let out = pid.compute(0.0, -100.0, 100.0);
        assert_eq!(pid.integral, 0.0);
        assert!((out - 10.0).abs() < 1e-12);
    }

    #[test]
    fn non_finite_dt_leaves_memory_untouched() {
        for dt in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN, -0.1] {
            let mut pid = auto_pid(1.0, 1.0, 5.0, 70.0);
            pid.process_value = 50.0;
            pid.compute(0.1, 0.0, 100.0);
            let integral = pid.integral;
            let last_error = pid.last_error;

            pid.process_value = 40.0;
            let out = pid.compute(dt, 0.0, 100.0);
            assert_eq!(pid.integral, integral, "dt = {dt}");
            assert_eq!(pid.last_error, last_error, "dt = {dt}");
            // P + I only, no derivative kick
            assert!((out - (30.0 + integral)).abs() < 1e-12, "dt = {dt}");
        }
    }

    #[test]
    fn output_is_clamped_to_limits() {
        let mut pid = auto_pid(10.0, 0.0, 0.0, 100.0);
        pid.process_value = 0.0;
        assert_eq!(pid.compute(0.1, 0.0, 100.0), 100.0);

        pid.setpoint = -100.0;
        assert_eq!(pid.compute(0.1, 0.0, 100.0), 0.0);
    }

    #[test]
    fn inverted_limits_are_swapped() {
        let mut pid = auto_pid(10.0, 0.0, 0.0, 100.0);
        assert_eq!(pid.compute(0.1, 100.0, 0.0), 100.0);
    }

    #[test]
    fn no_windup_while_saturated_high() {
        let mut pid = auto_pid(1.0, 1.0, 0.0, 1000.0);
        pid.process_value = 0.0;

        let mut previous = pid.integral;
        for _ in 0..50 {
            let out = pid.compute(0.1, 0.0, 100.0);
            assert_eq!(out, 100.0);
            assert!(pid.integral <= previous);
            previous = pid.integral;
        }
        assert_eq!(pid.integral, 0.0);
    }

    #[test]
    fn integral_unwinds_when_error_reverses_at_high_rail() {
        let mut pid = auto_pid(1.0, 1.0, 0.0, 50.0);
        pid.integral = 200.0;
        pid.process_value = 60.0;

        // u = -10 + 200 - 1 > 100 but error < 0, so integration continues
        pid.compute(0.1, 0.0, 100.0);
        assert!((pid.integral - 199.0).abs() < 1e-12);
    }

    #[test]
    fn integral_unwinds_when_error_reverses_at_low_rail() {
        let mut pid = auto_pid(1.0, 1.0, 0.0, 50.0);
        pid.integral = -200.0;
        pid.process_value = 40.0;

        pid.compute(0.1, 0.0, 100.0);
        assert!((pid.integral + 199.0).abs() < 1e-12);
    }

    #[test]
    fn integral_soft_limit_applies_without_saturation() {
        let mut pid = auto_pid(0.0, 0.0, 0.0, 10.0);
        pid.integral_limit = 5.0;
        pid.process_value = 0.0;
        for _ in 0..10 {
            pid.compute(1.0, -1e9, 1e9);
        }
        assert_eq!(pid.integral, 5.0);
    }

    #[test]
    fn nan_process_value_does_not_poison_state() {
        let mut pid = auto_pid(1.0, 1.0, 1.0, 70.0);
        pid.process_value = 50.0;
        let good = pid.compute(0.1, 0.0, 100.0);
        let integral = pid.integral;
        let last_error = pid.last_error;

        pid.process_value = f64::NAN;
        let out = pid.compute(0.1, 0.0, 100.0);
        assert_eq!(out, good);
        assert_eq!(pid.integral, integral);
        assert_eq!(pid.last_error, last_error);
    }

    #[test]
    fn non_finite_gain_keeps_last_good_output() {
        let mut pid = auto_pid(1.0, 0.0, 0.0, 70.0);
        pid.process_value = 50.0;
        let good = pid.compute(0.1, 0.0, 100.0);

        pid.gains.kp = f64::INFINITY;
        pid.gains.ki = f64::NAN;
        let out = pid.compute(0.1, 0.0, 100.0);
        assert_eq!(out, good);
        assert!(pid.integral.is_finite());
    }

    #[test]
    fn reset_clears_memory() {
        let mut pid = auto_pid(1.0, 1.0, 0.0, 70.0);
        pid.process_value = 50.0;
        pid.compute(0.1, 0.0, 100.0);
        pid.reset();
        assert_eq!(pid.integral, 0.0);
        assert_eq!(pid.last_error, 0.0);
    }
}

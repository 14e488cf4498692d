//! Configuration port: the thread-safe handle to one control loop.
//!
//! Operator writes (setpoint, mode, gains, limits) and the scheduler's tick
//! take the same lock, so a write lands either before or after a tick, never
//! in the middle of one. A poisoned lock is recovered rather than propagated:
//! the loop must keep running.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lc_core::ensure_finite;

use crate::alarm::AlarmLimits;
use crate::control_loop::{ControlLoop, TickRecord};
use crate::error::{ControlError, ControlResult};
use crate::output::Actuator;
use crate::pid::{ControlMode, PidGains};
use crate::process::Acquisition;
use crate::report::StatusSink;
use crate::safety::SafetyPolicy;

/// Shared, cloneable handle to a [`ControlLoop`].
#[derive(Debug, Clone, Default)]
pub struct LoopHandle {
    inner: Arc<Mutex<ControlLoop>>,
}

impl LoopHandle {
    pub fn new(control_loop: ControlLoop) -> Self {
        Self {
            inner: Arc::new(Mutex::new(control_loop)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ControlLoop> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the loop.
    pub fn with<R>(&self, f: impl FnOnce(&mut ControlLoop) -> R) -> R {
        f(&mut self.lock())
    }

    /// Copy of the current loop record.
    pub fn snapshot(&self) -> ControlLoop {
        self.lock().clone()
    }

    /// Run one tick under the lock.
    pub fn tick<A, V, S>(
        &self,
        dt: f64,
        acquisition: &mut A,
        actuator: &mut V,
        sink: &mut S,
    ) -> TickRecord
    where
        A: Acquisition + ?Sized,
        V: Actuator + ?Sized,
        S: StatusSink + ?Sized,
    {
        self.lock().tick(dt, acquisition, actuator, sink)
    }

    pub fn set_setpoint(&self, setpoint: f64) -> ControlResult<()> {
        let setpoint = ensure_finite(setpoint, "setpoint")?;
        self.lock().pid.setpoint = setpoint;
        Ok(())
    }

    /// Switch between automatic and manual control.
    ///
    /// The integrator is kept; switching back to auto resumes from it.
    pub fn set_mode(&self, mode: ControlMode) {
        let mut guard = self.lock();
        if guard.pid.mode != mode {
            tracing::info!(
                control_loop = %guard.name,
                from = ?guard.pid.mode,
                to = ?mode,
                "mode change"
            );
        }
        guard.pid.mode = mode;
    }

    pub fn set_gains(&self, gains: PidGains) -> ControlResult<()> {
        ensure_finite(gains.kp, "kp")?;
        ensure_finite(gains.ki, "ki")?;
        ensure_finite(gains.kd, "kd")?;
        self.lock().pid.gains = gains;
        Ok(())
    }

    pub fn set_manual_output(&self, manual_output: f64) -> ControlResult<()> {
        let manual_output = ensure_finite(manual_output, "manual_output")?;
        self.lock().pid.manual_output = manual_output;
        Ok(())
    }

    pub fn set_integral_limit(&self, limit: f64) -> ControlResult<()> {
        let limit = ensure_finite(limit, "integral_limit")?;
        if limit <= 0.0 {
            return Err(ControlError::InvalidArg {
                what: "integral_limit must be positive",
            });
        }
        self.lock().pid.integral_limit = limit;
        Ok(())
    }

    /// Replace thresholds, hysteresis and priorities.
    ///
    /// Current alarm flags are kept and re-evaluated on the next good tick.
    /// Thresholds must be finite and hysteresis finite and non-negative.
    pub fn set_alarm_limits(&self, limits: AlarmLimits) -> ControlResult<()> {
        ensure_finite(limits.low, "low")?;
        ensure_finite(limits.low_low, "low_low")?;
        ensure_finite(limits.high, "high")?;
        ensure_finite(limits.high_high, "high_high")?;
        if ensure_finite(limits.hysteresis, "hysteresis")? < 0.0 {
            return Err(ControlError::InvalidArg {
                what: "hysteresis must be non-negative",
            });
        }
        self.lock().sensor.limits = limits;
        Ok(())
    }

    /// Replace the valve output limits and clamp switch. An inverted pair is
    /// accepted and swapped wherever it is used.
    pub fn set_valve_limits(
        &self,
        out_min: f64,
        out_max: f64,
        clamp_enable: bool,
    ) -> ControlResult<()> {
        let out_min = ensure_finite(out_min, "out_min")?;
        let out_max = ensure_finite(out_max, "out_max")?;
        let mut guard = self.lock();
        guard.valve.out_min = out_min;
        guard.valve.out_max = out_max;
        guard.valve.clamp_enable = clamp_enable;
        Ok(())
    }

    pub fn set_safety_policy(&self, policy: SafetyPolicy) -> ControlResult<()> {
        ensure_finite(policy.safe_output_high_high, "safe_output_high_high")?;
        ensure_finite(policy.safe_output_low_low, "safe_output_low_low")?;
        self.lock().valve.policy = policy;
        Ok(())
    }
}

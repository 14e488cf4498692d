//! The control loop record and its per-period tick.
//!
//! One tick runs strictly in order:
//!
//! ```text
//! AcquirePV -> ComputeControl -> EvaluateAlarms -> (Annotate if changed)
//!           -> ApplySafety -> Clamp -> Dispatch -> Readback
//! ```
//!
//! Only the data fields persist between ticks. A tick never blocks, never
//! returns an error and never panics: bad readings fall back to manual
//! output, misconfigured limits are repaired, and non-finite numbers are
//! kept out of the persistent state.

use serde::{Deserialize, Serialize};

use crate::alarm::AlarmState;
use crate::output::{Actuator, Valve};
use crate::pid::{ControlMode, PidState};
use crate::process::{Acquisition, Quality, Sensor};
use crate::report::{AlarmReport, SensorFaultReport, StatusSink};
use crate::safety::{self, OverrideApplied};

/// A complete single control loop: controller, sensor and valve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlLoop {
    pub name: String,
    pub pid: PidState,
    pub sensor: Sensor,
    pub valve: Valve,
    /// Set once a sensor fault has been reported, cleared on the next good reading.
    pub fault_reported: bool,
}

/// Summary of one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    pub pv: f64,
    pub pv_good: bool,
    pub mode: ControlMode,
    /// Command before the safety override and clamp.
    pub control_output: f64,
    /// Command actually dispatched.
    pub command: f64,
    pub actual_position: f64,
    pub alarms: AlarmState,
    pub alarms_changed: bool,
    pub override_applied: Option<OverrideApplied>,
}

impl ControlLoop {
    pub fn new(name: impl Into<String>, pid: PidState, sensor: Sensor, valve: Valve) -> Self {
        Self {
            name: name.into(),
            pid,
            sensor,
            valve,
            fault_reported: false,
        }
    }

    /// Run one control period. `dt` is the elapsed time since the previous
    /// tick in seconds.
    pub fn tick<A, V, S>(
        &mut self,
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
        // AcquirePV
        self.sensor.acquire(acquisition);
        let pv = self.sensor.point.value;
        let pv_good = self.sensor.point.is_good();

        // ComputeControl
        let mut command = if pv_good && self.pid.mode.is_auto() {
            self.pid.process_value = pv;
            self.pid.compute(dt, self.valve.out_min, self.valve.out_max)
        } else {
            self.pid.manual_output
        };
        let control_output = command;

        // EvaluateAlarms / Annotate
        let alarms_changed = if pv_good {
            self.evaluate_alarms(pv, sink)
        } else {
            self.report_sensor_fault(sink);
            false
        };

        // ApplySafety
        let override_applied = safety::apply_override(
            &self.sensor.state,
            &self.valve.policy,
            self.pid.manual_output,
            &mut self.pid.mode,
            &mut command,
        );
        if let Some(applied) = override_applied {
            tracing::debug!(
                control_loop = %self.name,
                alarm = ?applied.alarm,
                action = ?applied.action,
                "safety override active"
            );
        }

        // Clamp / Dispatch / Readback
        let command = self.valve.dispatch(command, actuator);

        tracing::trace!(
            control_loop = %self.name,
            pv,
            pv_good,
            command,
            actual = self.valve.actual_position,
            "tick"
        );

        TickRecord {
            pv,
            pv_good,
            mode: self.pid.mode,
            control_output,
            command,
            actual_position: self.valve.actual_position,
            alarms: self.sensor.state,
            alarms_changed,
            override_applied,
        }
    }

    fn evaluate_alarms<S: StatusSink + ?Sized>(&mut self, pv: f64, sink: &mut S) -> bool {
        let changed = self.sensor.state.evaluate(pv, &self.sensor.limits);
        let recovered = std::mem::take(&mut self.fault_reported);
        if recovered {
            tracing::info!(control_loop = %self.name, pv, "sensor reading restored");
        }
        if changed || recovered {
            let report =
                AlarmReport::new(&self.sensor.name, pv, &self.sensor.state, &self.sensor.limits);
            sink.alarm_changed(&report);
        }
        changed
    }

    fn report_sensor_fault<S: StatusSink + ?Sized>(&mut self, sink: &mut S) {
        if self.fault_reported {
            return;
        }
        if let Quality::Bad(reason) = &self.sensor.point.quality {
            let report = SensorFaultReport::new(
                &self.sensor.name,
                self.sensor.point.value,
                reason,
                &self.sensor.limits,
            );
            sink.sensor_fault(&report);
            self.fault_reported = true;
        }
    }
}

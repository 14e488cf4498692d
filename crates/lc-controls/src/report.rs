//! Status reporting towards the outside world.
//!
//! The loop has no network surface of its own. Whatever exposes alarm
//! status remotely implements [`StatusSink`]; the loop calls it only when
//! something changed, never on every tick.

use serde::{Deserialize, Serialize};

use crate::alarm::{AlarmLimits, AlarmState};
use crate::annotate::{self, AlarmClass};
use crate::process::AcquisitionError;

/// Alarm status published after the flags changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmReport {
    pub sensor: String,
    pub pv: f64,
    pub state: AlarmState,
    pub active: bool,
    pub class: AlarmClass,
    pub severity: u16,
    pub message: String,
}

impl AlarmReport {
    pub fn new(sensor: &str, pv: f64, state: &AlarmState, limits: &AlarmLimits) -> Self {
        Self {
            sensor: sensor.to_string(),
            pv,
            state: *state,
            active: annotate::is_active(state),
            class: AlarmClass::of(state),
            severity: annotate::severity(state, limits),
            message: annotate::message(state, limits, pv, sensor),
        }
    }
}

/// Published once when acquisition starts failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorFaultReport {
    pub sensor: String,
    /// Last good value still held by the loop.
    pub last_value: f64,
    pub reason: AcquisitionError,
    pub severity: u16,
    pub message: String,
}

impl SensorFaultReport {
    pub fn new(
        sensor: &str,
        last_value: f64,
        reason: &AcquisitionError,
        limits: &AlarmLimits,
    ) -> Self {
        Self {
            sensor: sensor.to_string(),
            last_value,
            reason: reason.clone(),
            severity: annotate::clamp_priority(limits.priorities.sensor_fault),
            message: format!("SENSOR FAULT: Sensor:{sensor} {reason} (last PV={last_value:.1})"),
        }
    }
}

/// Either kind of report, for sinks that keep a log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatusReport {
    Alarm(AlarmReport),
    SensorFault(SensorFaultReport),
}

/// Consumer of status changes.
pub trait StatusSink {
    fn alarm_changed(&mut self, report: &AlarmReport);

    fn sensor_fault(&mut self, report: &SensorFaultReport);
}

impl<T: StatusSink + ?Sized> StatusSink for Box<T> {
    fn alarm_changed(&mut self, report: &AlarmReport) {
        (**self).alarm_changed(report)
    }

    fn sensor_fault(&mut self, report: &SensorFaultReport) {
        (**self).sensor_fault(report)
    }
}

impl StatusSink for Vec<StatusReport> {
    fn alarm_changed(&mut self, report: &AlarmReport) {
        self.push(StatusReport::Alarm(report.clone()));
    }

    fn sensor_fault(&mut self, report: &SensorFaultReport) {
        self.push(StatusReport::SensorFault(report.clone()));
    }
}

/// Sink that turns reports into `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl StatusSink for TracingSink {
    fn alarm_changed(&mut self, report: &AlarmReport) {
        if report.active {
            tracing::warn!(
                sensor = %report.sensor,
                class = %report.class,
                severity = report.severity,
                pv = report.pv,
                "{}",
                report.message
            );
        } else {
            tracing::info!(
                sensor = %report.sensor,
                severity = report.severity,
                pv = report.pv,
                "{}",
                report.message
            );
        }
    }

    fn sensor_fault(&mut self, report: &SensorFaultReport) {
        tracing::warn!(
            sensor = %report.sensor,
            reason = %report.reason,
            severity = report.severity,
            "{}",
            report.message
        );
    }
}

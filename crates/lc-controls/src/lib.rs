//! Single-loop process control core for loopctl.
//!
//! One [`ControlLoop`] reads a process value, computes a corrective output
//! with a PID engine, evaluates four hysteretic alarm thresholds, applies a
//! safety override when a critical alarm is active and sends a bounded
//! command to an actuator. [`ControlLoop::tick`] runs that pipeline once per
//! control period.
//!
//! # Architecture
//!
//! - [`pid`]: PID engine with conditional-integration anti-windup
//! - [`alarm`]: HighHigh/High/Low/LowLow flags with hysteresis
//! - [`annotate`]: severity and message derived from the flags
//! - [`safety`]: Hold / ToManual / ToSafe fail actions
//! - [`output`]: clamp, dispatch and read-back against the valve limits
//! - [`control_loop`]: the tick orchestrator
//! - [`port`]: thread-safe configuration port
//! - [`sampled`]: measured-`dt` scheduling on a dedicated thread
//!
//! Acquisition, actuation and status reporting are collaborators supplied
//! by the caller through the [`Acquisition`], [`Actuator`] and
//! [`StatusSink`] traits. Loops share no state with each other.

pub mod alarm;
pub mod annotate;
pub mod control_loop;
pub mod error;
pub mod output;
pub mod pid;
pub mod port;
pub mod process;
pub mod report;
pub mod safety;
pub mod sampled;

pub use alarm::{AlarmLimits, AlarmPriorities, AlarmState};
pub use annotate::AlarmClass;
pub use control_loop::{ControlLoop, TickRecord};
pub use error::{ControlError, ControlResult};
pub use output::{Actuator, OpenLoopActuator, Valve, finalize};
pub use pid::{ControlMode, PidGains, PidState};
pub use port::LoopHandle;
pub use process::{Acquisition, AcquisitionError, ProcessPoint, Quality, Sensor};
pub use report::{AlarmReport, SensorFaultReport, StatusReport, StatusSink, TracingSink};
pub use safety::{CriticalAlarm, FailAction, OverrideApplied, SafetyPolicy, apply_override};
pub use sampled::{LoopIo, LoopRunner, SampleConfig, TickClock};

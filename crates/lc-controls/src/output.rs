//! Output stage: clamp, dispatch, read back.
//!
//! The valve record holds the physical output limits and the safety policy.
//! Each tick the final command is optionally clamped into `[out_min,
//! out_max]`, sent to the actuator and the actuator's reported position is
//! read back. Actuators without position feedback report NaN, in which case
//! the dispatched command stands in for the actual position.

use lc_core::clamp_ordered;
use serde::{Deserialize, Serialize};

use crate::safety::SafetyPolicy;

/// Physical actuator driven by the loop.
pub trait Actuator {
    /// Fire-and-forget command.
    fn send(&mut self, command: f64);

    /// Actual position, NaN when no feedback is available.
    fn readback(&mut self) -> f64;
}

impl<T: Actuator + ?Sized> Actuator for Box<T> {
    fn send(&mut self, command: f64) {
        (**self).send(command)
    }

    fn readback(&mut self) -> f64 {
        (**self).readback()
    }
}

/// Actuator without position feedback. Remembers the last command sent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OpenLoopActuator {
    pub last_command: Option<f64>,
}

impl Actuator for OpenLoopActuator {
    fn send(&mut self, command: f64) {
        self.last_command = Some(command);
    }

    fn readback(&mut self) -> f64 {
        f64::NAN
    }
}

/// Clamp `command` into `[out_min, out_max]` when `clamp_enable` is set.
///
/// An inverted pair is swapped. Idempotent for fixed limits.
pub fn finalize(command: f64, clamp_enable: bool, out_min: f64, out_max: f64) -> f64 {
    if clamp_enable {
        clamp_ordered(command, out_min, out_max)
    } else {
        command
    }
}

/// Control valve record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Valve {
    pub clamp_enable: bool,
    /// Physical output limits, also used as the PID saturation limits.
    pub out_min: f64,
    pub out_max: f64,
    /// Last command dispatched to the actuator.
    pub command: f64,
    /// Last position read back (or the command when no feedback exists).
    pub actual_position: f64,
    pub policy: SafetyPolicy,
}

impl Default for Valve {
    fn default() -> Self {
        Self {
            clamp_enable: false,
            out_min: 0.0,
            out_max: 100.0,
            command: 0.0,
            actual_position: 0.0,
            policy: SafetyPolicy::default(),
        }
    }
}

impl Valve {
    /// Finalize `command` against this valve's limits.
    pub fn finalize(&self, command: f64) -> f64 {
        finalize(command, self.clamp_enable, self.out_min, self.out_max)
    }

    /// Finalize, send and read back. Returns the dispatched command.
    ///
    /// A non-finite command is never sent; the previous command is repeated.
    pub fn dispatch<A: Actuator + ?Sized>(&mut self, command: f64, actuator: &mut A) -> f64 {
        let mut command = self.finalize(command);
        if !command.is_finite() {
            tracing::warn!(
                command,
                last = self.command,
                "non-finite valve command, repeating last command"
            );
            command = self.command;
        }

        self.command = command;
        actuator.send(command);

        let position = actuator.readback();
        self.actual_position = if position.is_nan() { command } else { position };
        command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FeedbackActuator {
        sent: Vec<f64>,
        position: f64,
    }

    impl Actuator for FeedbackActuator {
        fn send(&mut self, command: f64) {
            self.sent.push(command);
        }

        fn readback(&mut self) -> f64 {
            self.position
        }
    }

    #[test]
    fn finalize_clamps_only_when_enabled() {
        assert_eq!(finalize(150.0, true, 0.0, 100.0), 100.0);
        assert_eq!(finalize(-5.0, true, 0.0, 100.0), 0.0);
        assert_eq!(finalize(150.0, false, 0.0, 100.0), 150.0);
    }

    #[test]
    fn finalize_swaps_inverted_limits() {
        assert_eq!(finalize(150.0, true, 100.0, 0.0), 100.0);
    }

    #[test]
    fn finalize_is_idempotent() {
        for cmd in [-50.0, 0.0, 37.5, 100.0, 250.0] {
            let once = finalize(cmd, true, 10.0, 90.0);
            assert_eq!(finalize(once, true, 10.0, 90.0), once);
        }
    }

    #[test]
    fn dispatch_without_feedback_uses_command_as_position() {
        let mut valve = Valve {
            clamp_enable: true,
            ..Valve::default()
        };
        let mut act = OpenLoopActuator::default();
        let sent = valve.dispatch(120.0, &mut act);
        assert_eq!(sent, 100.0);
        assert_eq!(act.last_command, Some(100.0));
        assert_eq!(valve.command, 100.0);
        assert_eq!(valve.actual_position, 100.0);
    }

    #[test]
    fn dispatch_stores_reported_position() {
        let mut valve = Valve::default();
        let mut act = FeedbackActuator {
            sent: Vec::new(),
            position: 33.0,
        };
        valve.dispatch(40.0, &mut act);
        assert_eq!(act.sent, vec![40.0]);
        assert_eq!(valve.command, 40.0);
        assert_eq!(valve.actual_position, 33.0);
    }

    #[test]
    fn dispatch_repeats_last_command_when_not_finite() {
        let mut valve = Valve::default();
        let mut act = OpenLoopActuator::default();
        valve.dispatch(25.0, &mut act);
        let sent = valve.dispatch(f64::NAN, &mut act);
        assert_eq!(sent, 25.0);
        assert_eq!(act.last_command, Some(25.0));
    }
}

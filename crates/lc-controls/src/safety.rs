//! Safety override applied when a critical alarm is active.
//!
//! HighHigh is checked first and, when active, strictly preempts LowLow:
//! with both flags set (only possible with inverted or overlapping limits)
//! only the HighHigh action runs.

use serde::{Deserialize, Serialize};

use crate::alarm::AlarmState;
use crate::pid::ControlMode;

/// Valve behaviour while a critical alarm is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailAction {
    /// Keep whatever the PID/manual path produced.
    #[default]
    Hold,
    /// Switch the loop to manual (persistently) and use the manual output.
    ToManual,
    /// Drive the valve to the configured safe output.
    ToSafe,
}

/// Fail actions and safe outputs for the two critical alarms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SafetyPolicy {
    pub on_high_high: FailAction,
    pub on_low_low: FailAction,
    pub safe_output_high_high: f64,
    pub safe_output_low_low: f64,
}

/// Critical alarm that triggered an override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CriticalAlarm {
    HighHigh,
    LowLow,
}

/// Record of the override that ran this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideApplied {
    pub alarm: CriticalAlarm,
    pub action: FailAction,
}

impl SafetyPolicy {
    /// Action and safe output configured for `alarm`.
    pub fn for_alarm(&self, alarm: CriticalAlarm) -> (FailAction, f64) {
        match alarm {
            CriticalAlarm::HighHigh => (self.on_high_high, self.safe_output_high_high),
            CriticalAlarm::LowLow => (self.on_low_low, self.safe_output_low_low),
        }
    }
}

/// Apply the configured fail action for the active critical alarm.
///
/// `ToManual` changes `mode` for subsequent ticks as well, so the operator
/// sees the loop dropped to manual. Returns `None` when neither critical
/// flag is set, leaving `mode` and `command` untouched.
pub fn apply_override(
    state: &AlarmState,
    policy: &SafetyPolicy,
    manual_output: f64,
    mode: &mut ControlMode,
    command: &mut f64,
) -> Option<OverrideApplied> {
    let alarm = if state.high_high {
        CriticalAlarm::HighHigh
    } else if state.low_low {
        CriticalAlarm::LowLow
    } else {
        return None;
    };

    let (action, safe_output) = policy.for_alarm(alarm);
    match action {
        FailAction::Hold => {}
        FailAction::ToManual => {
            *mode = ControlMode::Manual;
            *command = manual_output;
        }
        FailAction::ToSafe => *command = safe_output,
    }

    Some(OverrideApplied { alarm, action })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(on_high_high: FailAction, on_low_low: FailAction) -> SafetyPolicy {
        SafetyPolicy {
            on_high_high,
            on_low_low,
            safe_output_high_high: 0.0,
            safe_output_low_low: 100.0,
        }
    }

    fn high_high() -> AlarmState {
        AlarmState {
            high_high: true,
            high: true,
            ..AlarmState::default()
        }
    }

    fn low_low() -> AlarmState {
        AlarmState {
            low_low: true,
            low: true,
            ..AlarmState::default()
        }
    }

    #[test]
    fn no_critical_alarm_leaves_everything() {
        let mut mode = ControlMode::Auto;
        let mut cmd = 42.0;
        let st = AlarmState {
            high: true,
            low: true,
            ..AlarmState::default()
        };
        let applied = apply_override(
            &st,
            &policy(FailAction::ToSafe, FailAction::ToSafe),
            10.0,
            &mut mode,
            &mut cmd,
        );
        assert!(applied.is_none());
        assert_eq!(mode, ControlMode::Auto);
        assert_eq!(cmd, 42.0);
    }

    #[test]
    fn hold_keeps_command() {
        let mut mode = ControlMode::Auto;
        let mut cmd = 42.0;
        let applied = apply_override(
            &high_high(),
            &policy(FailAction::Hold, FailAction::Hold),
            10.0,
            &mut mode,
            &mut cmd,
        );
        assert_eq!(
            applied,
            Some(OverrideApplied {
                alarm: CriticalAlarm::HighHigh,
                action: FailAction::Hold,
            })
        );
        assert_eq!(cmd, 42.0);
        assert_eq!(mode, ControlMode::Auto);
    }

    #[test]
    fn to_manual_switches_mode_and_uses_manual_output() {
        let mut mode = ControlMode::Auto;
        let mut cmd = 42.0;
        apply_override(
            &low_low(),
            &policy(FailAction::Hold, FailAction::ToManual),
            10.0,
            &mut mode,
            &mut cmd,
        );
        assert_eq!(mode, ControlMode::Manual);
        assert_eq!(cmd, 10.0);
    }

    #[test]
    fn to_safe_uses_alarm_specific_output() {
        let mut mode = ControlMode::Auto;
        let mut cmd = 42.0;
        apply_override(
            &high_high(),
            &policy(FailAction::ToSafe, FailAction::ToSafe),
            10.0,
            &mut mode,
            &mut cmd,
        );
        assert_eq!(cmd, 0.0);
        assert_eq!(mode, ControlMode::Auto);

        let mut cmd = 42.0;
        apply_override(
            &low_low(),
            &policy(FailAction::ToSafe, FailAction::ToSafe),
            10.0,
            &mut mode,
            &mut cmd,
        );
        assert_eq!(cmd, 100.0);
    }

    #[test]
    fn high_high_preempts_low_low() {
        let st = AlarmState {
            high_high: true,
            low_low: true,
            ..AlarmState::default()
        };
        let mut mode = ControlMode::Auto;
        let mut cmd = 42.0;
        let applied = apply_override(
            &st,
            &policy(FailAction::Hold, FailAction::ToSafe),
            10.0,
            &mut mode,
            &mut cmd,
        );
        assert_eq!(applied.map(|a| a.alarm), Some(CriticalAlarm::HighHigh));
        assert_eq!(cmd, 42.0, "LowLow action must not run");
    }
}

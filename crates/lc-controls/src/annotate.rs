//! Alarm annotation: severity rank and operator message.
//!
//! Both are pure functions of the current flags. When several flags are
//! active the winner is picked in the order HighHigh > LowLow > High > Low,
//! so a critical limit always outranks an advisory one regardless of
//! direction.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::alarm::{AlarmLimits, AlarmState, PRIORITY_MAX, PRIORITY_MIN};

/// The single alarm class that describes a set of flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlarmClass {
    HighHigh,
    LowLow,
    High,
    Low,
    Normal,
}

impl AlarmClass {
    /// Highest-priority active class, or `Normal`.
    pub fn of(state: &AlarmState) -> Self {
        if state.high_high {
            Self::HighHigh
        } else if state.low_low {
            Self::LowLow
        } else if state.high {
            Self::High
        } else if state.low {
            Self::Low
        } else {
            Self::Normal
        }
    }

    /// Short tag used in messages.
    pub fn code(self) -> &'static str {
        match self {
            Self::HighHigh => "HH",
            Self::LowLow => "LL",
            Self::High => "H",
            Self::Low => "L",
            Self::Normal => "Normal",
        }
    }

    /// Configured threshold for this class, `None` for `Normal`.
    pub fn threshold(self, limits: &AlarmLimits) -> Option<f64> {
        match self {
            Self::HighHigh => Some(limits.high_high),
            Self::LowLow => Some(limits.low_low),
            Self::High => Some(limits.high),
            Self::Low => Some(limits.low),
            Self::Normal => None,
        }
    }

    /// Configured priority for this class.
    pub fn priority(self, limits: &AlarmLimits) -> u16 {
        let p = &limits.priorities;
        match self {
            Self::HighHigh => p.high_high,
            Self::LowLow => p.low_low,
            Self::High => p.high,
            Self::Low => p.low,
            Self::Normal => p.normal,
        }
    }

    fn is_high_side(self) -> bool {
        matches!(self, Self::HighHigh | Self::High)
    }
}

impl fmt::Display for AlarmClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Clamp a configured priority into `[1, 1000]`.
pub fn clamp_priority(priority: u16) -> u16 {
    priority.clamp(PRIORITY_MIN, PRIORITY_MAX)
}

/// Severity of the current flags: the winning class's priority, clamped.
pub fn severity(state: &AlarmState, limits: &AlarmLimits) -> u16 {
    clamp_priority(AlarmClass::of(state).priority(limits))
}

/// Operator message naming the alarm class, sensor, PV and threshold.
pub fn message(state: &AlarmState, limits: &AlarmLimits, pv: f64, name: &str) -> String {
    let class = AlarmClass::of(state);
    match class.threshold(limits) {
        Some(threshold) => {
            let op = if class.is_high_side() { ">=" } else { "<=" };
            format!(
                "ALARM {class}: Sensor:{name} PV={pv:.1} {op} {class}={threshold:.1}"
            )
        }
        None => format!("Normal: Sensor:{name} PV={pv:.1}"),
    }
}

/// True if any flag is active.
pub fn is_active(state: &AlarmState) -> bool {
    state.is_active()
}

//! Four-level hysteretic alarm evaluation.
//!
//! Each threshold (HighHigh, High, Low, LowLow) owns an independent flag.
//! A flag activates on the threshold itself and deactivates only after the
//! process value has moved `hysteresis` back inside it. Flags are not
//! exclusive: `high` and `high_high` are routinely active together.

use serde::{Deserialize, Serialize};

/// Lowest and highest valid alarm priority.
pub const PRIORITY_MIN: u16 = 1;
pub const PRIORITY_MAX: u16 = 1000;

/// Configured priority for each alarm class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmPriorities {
    pub low: u16,
    pub high: u16,
    pub low_low: u16,
    pub high_high: u16,
    pub normal: u16,
    /// Priority reported with a sensor fault (bad acquisition).
    pub sensor_fault: u16,
}

impl Default for AlarmPriorities {
    fn default() -> Self {
        Self {
            low: 500,
            high: 500,
            low_low: 1000,
            high_high: 1000,
            normal: 1,
            sensor_fault: 1000,
        }
    }
}

/// Alarm thresholds and their hysteresis.
///
/// Conceptually `low_low <= low <= high <= high_high`. This is not
/// enforced; an inverted set evaluates without error, just not usefully.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmLimits {
    pub low: f64,
    pub low_low: f64,
    pub high: f64,
    pub high_high: f64,
    /// Deadband applied on the deactivating edge only.
    pub hysteresis: f64,
    pub priorities: AlarmPriorities,
}

impl Default for AlarmLimits {
    fn default() -> Self {
        Self {
            low: 0.0,
            low_low: 0.0,
            high: 100.0,
            high_high: 100.0,
            hysteresis: 1.0,
            priorities: AlarmPriorities::default(),
        }
    }
}

impl AlarmLimits {
    /// Hysteresis as used by the evaluator: negative or non-finite values act as zero.
    pub fn effective_hysteresis(&self) -> f64 {
        if self.hysteresis.is_finite() {
            self.hysteresis.max(0.0)
        } else {
            0.0
        }
    }
}

/// Current alarm flags, one per threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmState {
    pub low: bool,
    pub high: bool,
    pub low_low: bool,
    pub high_high: bool,
}

impl AlarmState {
    /// Update all four flags from `pv`. Returns `true` if any flag changed.
    ///
    /// A NaN `pv` leaves the flags as they were.
    pub fn evaluate(&mut self, pv: f64, limits: &AlarmLimits) -> bool {
        if pv.is_nan() {
            return false;
        }
        let before = *self;
        let h = limits.effective_hysteresis();

        self.high_high = rising(self.high_high, pv, limits.high_high, h);
        self.high = rising(self.high, pv, limits.high, h);
        self.low_low = falling(self.low_low, pv, limits.low_low, h);
        self.low = falling(self.low, pv, limits.low, h);

        *self != before
    }

    /// True if any of the four flags is set.
    pub fn is_active(&self) -> bool {
        self.high_high || self.low_low || self.high || self.low
    }

    /// True if a critical (interlock) flag is set.
    pub fn is_critical(&self) -> bool {
        self.high_high || self.low_low
    }
}

/// Free-function form of [`AlarmState::evaluate`].
pub fn evaluate(pv: f64, limits: &AlarmLimits, state: &mut AlarmState) -> bool {
    state.evaluate(pv, limits)
}

// High-side flag: on at `pv >= limit`, off only once `pv <= limit - h`.
fn rising(active: bool, pv: f64, limit: f64, h: f64) -> bool {
    if active {
        let released = pv <= limit - h;
        !released
    } else {
        pv >= limit
    }
}

// Low-side flag: on at `pv <= limit`, off only once `pv >= limit + h`.
fn falling(active: bool, pv: f64, limit: f64, h: f64) -> bool {
    if active {
        let released = pv >= limit + h;
        !released
    } else {
        pv <= limit
    }
}

//! Project schema definitions.
//!
//! A project file lists independent control loops. Every section has
//! defaults, so a minimal loop only needs a name:
//!
//! ```yaml
//! version: 1
//! name: reactor-cell
//! loops:
//!   - name: TRCA1
//!     period_ms: 1000
//!     pid: { kp: 1.0, ki: 1.0, setpoint: 70.0, mode: auto }
//!     sensor:
//!       name: T1
//!       limits: { low_low: 10.0, low: 20.0, high: 80.0, high_high: 90.0, hysteresis: 2.0 }
//!     valve: { clamp_enable: true, on_high_high: to_safe, safe_output_high_high: 0.0 }
//! ```

use serde::{Deserialize, Serialize};

pub const LATEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub loops: Vec<LoopDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoopDef {
    pub name: String,
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,
    #[serde(default)]
    pub pid: PidDef,
    #[serde(default)]
    pub sensor: SensorDef,
    #[serde(default)]
    pub valve: ValveDef,
}

fn default_period_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModeDef {
    Auto,
    #[default]
    Manual,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PidDef {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub setpoint: f64,
    pub manual_output: f64,
    pub mode: ModeDef,
    pub integral_limit: f64,
}

impl Default for PidDef {
    fn default() -> Self {
        Self {
            kp: 0.0,
            ki: 0.0,
            kd: 0.0,
            setpoint: 0.0,
            manual_output: 0.0,
            mode: ModeDef::Manual,
            integral_limit: lc_controls::pid::DEFAULT_INTEGRAL_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SensorDef {
    pub name: String,
    pub limits: AlarmLimitsDef,
    pub priorities: AlarmPrioritiesDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlarmLimitsDef {
    pub low: f64,
    pub low_low: f64,
    pub high: f64,
    pub high_high: f64,
    pub hysteresis: f64,
}

impl Default for AlarmLimitsDef {
    fn default() -> Self {
        Self {
            low: 0.0,
            low_low: 0.0,
            high: 100.0,
            high_high: 100.0,
            hysteresis: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlarmPrioritiesDef {
    pub low: u16,
    pub high: u16,
    pub low_low: u16,
    pub high_high: u16,
    pub normal: u16,
    pub sensor_fault: u16,
}

impl Default for AlarmPrioritiesDef {
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

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailActionDef {
    #[default]
    Hold,
    ToManual,
    ToSafe,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValveDef {
    pub clamp_enable: bool,
    pub out_min: f64,
    pub out_max: f64,
    pub on_high_high: FailActionDef,
    pub on_low_low: FailActionDef,
    pub safe_output_high_high: f64,
    pub safe_output_low_low: f64,
}

impl Default for ValveDef {
    fn default() -> Self {
        Self {
            clamp_enable: false,
            out_min: 0.0,
            out_max: 100.0,
            on_high_high: FailActionDef::Hold,
            on_low_low: FailActionDef::Hold,
            safe_output_high_high: 0.0,
            safe_output_low_low: 0.0,
        }
    }
}

impl Project {
    /// Find a loop by name.
    pub fn find_loop(&self, name: &str) -> Option<&LoopDef> {
        self.loops.iter().find(|l| l.name == name)
    }
}

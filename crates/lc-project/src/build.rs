//! Conversion from project definitions to runtime loop records.

use lc_controls::{
    AlarmLimits, AlarmPriorities, ControlLoop, ControlMode, ControlResult, FailAction, PidGains,
    PidState, SafetyPolicy, SampleConfig, Sensor, Valve,
};

use crate::schema::{
    AlarmLimitsDef, AlarmPrioritiesDef, FailActionDef, LoopDef, ModeDef, PidDef, SensorDef,
    ValveDef,
};

impl From<ModeDef> for ControlMode {
    fn from(mode: ModeDef) -> Self {
        match mode {
            ModeDef::Auto => ControlMode::Auto,
            ModeDef::Manual => ControlMode::Manual,
        }
    }
}

impl From<FailActionDef> for FailAction {
    fn from(action: FailActionDef) -> Self {
        match action {
            FailActionDef::Hold => FailAction::Hold,
            FailActionDef::ToManual => FailAction::ToManual,
            FailActionDef::ToSafe => FailAction::ToSafe,
        }
    }
}

impl From<&AlarmPrioritiesDef> for AlarmPriorities {
    fn from(p: &AlarmPrioritiesDef) -> Self {
        AlarmPriorities {
            low: p.low,
            high: p.high,
            low_low: p.low_low,
            high_high: p.high_high,
            normal: p.normal,
            sensor_fault: p.sensor_fault,
        }
    }
}

impl AlarmLimitsDef {
    pub fn build(&self, priorities: &AlarmPrioritiesDef) -> AlarmLimits {
        AlarmLimits {
            low: self.low,
            low_low: self.low_low,
            high: self.high,
            high_high: self.high_high,
            hysteresis: self.hysteresis,
            priorities: priorities.into(),
        }
    }
}

impl PidDef {
    pub fn build(&self) -> PidState {
        PidState {
            mode: self.mode.into(),
            manual_output: self.manual_output,
            integral_limit: self.integral_limit,
            ..PidState::new(PidGains::new(self.kp, self.ki, self.kd), self.setpoint)
        }
    }
}

impl SensorDef {
    /// Build the sensor record. An unnamed sensor takes the loop's name.
    pub fn build(&self, loop_name: &str) -> Sensor {
        let name = if self.name.is_empty() {
            loop_name
        } else {
            self.name.as_str()
        };
        Sensor::new(name, self.limits.build(&self.priorities))
    }
}

impl ValveDef {
    pub fn build(&self) -> Valve {
        Valve {
            clamp_enable: self.clamp_enable,
            out_min: self.out_min,
            out_max: self.out_max,
            policy: SafetyPolicy {
                on_high_high: self.on_high_high.into(),
                on_low_low: self.on_low_low.into(),
                safe_output_high_high: self.safe_output_high_high,
                safe_output_low_low: self.safe_output_low_low,
            },
            ..Valve::default()
        }
    }
}

impl LoopDef {
    /// Build a fresh loop record: zeroed PID memory, alarms inactive, no
    /// sample acquired yet.
    pub fn build(&self) -> ControlLoop {
        ControlLoop::new(
            self.name.clone(),
            self.pid.build(),
            self.sensor.build(&self.name),
            self.valve.build(),
        )
    }

    /// Scheduling configuration for this loop's period.
    pub fn sample_config(&self) -> ControlResult<SampleConfig> {
        SampleConfig::from_millis(self.period_ms)
    }

    /// Nominal period in seconds.
    pub fn period_secs(&self) -> f64 {
        self.period_ms as f64 / 1000.0
    }
}

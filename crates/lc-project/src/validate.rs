//! Project validation logic.

use crate::schema::{
    AlarmLimitsDef, AlarmPrioritiesDef, LATEST_VERSION, LoopDef, PidDef, Project, ValveDef,
};
use lc_controls::alarm::{PRIORITY_MAX, PRIORITY_MIN};
use std::collections::HashSet;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    let mut loop_names = HashSet::new();
    for lp in &project.loops {
        if lp.name.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "loop name".to_string(),
                value: format!("'{}'", lp.name),
                reason: "must not be empty".to_string(),
            });
        }
        if !loop_names.insert(&lp.name) {
            return Err(ValidationError::DuplicateId {
                id: lp.name.clone(),
                context: "loops".to_string(),
            });
        }
        validate_loop(lp)?;
    }

    Ok(())
}

fn validate_loop(lp: &LoopDef) -> Result<(), ValidationError> {
    if lp.period_ms == 0 {
        return Err(ValidationError::InvalidValue {
            field: format!("loop '{}' period_ms", lp.name),
            value: "0".to_string(),
            reason: "must be positive".to_string(),
        });
    }

    validate_pid(&lp.pid, &lp.name)?;
    validate_limits(&lp.sensor.limits, &lp.name)?;
    validate_priorities(&lp.sensor.priorities, &lp.name)?;
    validate_valve(&lp.valve, &lp.name)?;
    Ok(())
}

fn validate_pid(pid: &PidDef, loop_name: &str) -> Result<(), ValidationError> {
    validate_finite("pid.kp", pid.kp, loop_name)?;
    validate_finite("pid.ki", pid.ki, loop_name)?;
    validate_finite("pid.kd", pid.kd, loop_name)?;
    validate_finite("pid.setpoint", pid.setpoint, loop_name)?;
    validate_finite("pid.manual_output", pid.manual_output, loop_name)?;
    validate_positive_finite("pid.integral_limit", pid.integral_limit, loop_name)
}

// Inverted pairs are fine here; the evaluator and clamp order them at use.
fn validate_limits(limits: &AlarmLimitsDef, loop_name: &str) -> Result<(), ValidationError> {
    validate_finite("sensor.limits.low", limits.low, loop_name)?;
    validate_finite("sensor.limits.low_low", limits.low_low, loop_name)?;
    validate_finite("sensor.limits.high", limits.high, loop_name)?;
    validate_finite("sensor.limits.high_high", limits.high_high, loop_name)?;
    validate_non_negative_finite("sensor.limits.hysteresis", limits.hysteresis, loop_name)
}

fn validate_priorities(p: &AlarmPrioritiesDef, loop_name: &str) -> Result<(), ValidationError> {
    for (field, value) in [
        ("sensor.priorities.low", p.low),
        ("sensor.priorities.high", p.high),
        ("sensor.priorities.low_low", p.low_low),
        ("sensor.priorities.high_high", p.high_high),
        ("sensor.priorities.normal", p.normal),
        ("sensor.priorities.sensor_fault", p.sensor_fault),
    ] {
        if !(PRIORITY_MIN..=PRIORITY_MAX).contains(&value) {
            return Err(ValidationError::InvalidValue {
                field: format!("loop '{}' {}", loop_name, field),
                value: value.to_string(),
                reason: format!("must be in [{PRIORITY_MIN}, {PRIORITY_MAX}]"),
            });
        }
    }
    Ok(())
}

fn validate_valve(valve: &ValveDef, loop_name: &str) -> Result<(), ValidationError> {
    validate_finite("valve.out_min", valve.out_min, loop_name)?;
    validate_finite("valve.out_max", valve.out_max, loop_name)?;
    validate_finite("valve.safe_output_high_high", valve.safe_output_high_high, loop_name)?;
    validate_finite("valve.safe_output_low_low", valve.safe_output_low_low, loop_name)
}

fn validate_finite(field: &str, value: f64, loop_name: &str) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::InvalidValue {
            field: format!("loop '{}' {}", loop_name, field),
            value: value.to_string(),
            reason: "must be finite".to_string(),
        });
    }
    Ok(())
}

fn validate_positive_finite(
    field: &str,
    value: f64,
    loop_name: &str,
) -> Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: format!("loop '{}' {}", loop_name, field),
            value: value.to_string(),
            reason: "must be positive and finite".to_string(),
        });
    }
    Ok(())
}

fn validate_non_negative_finite(
    field: &str,
    value: f64,
    loop_name: &str,
) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::InvalidValue {
            field: format!("loop '{}' {}", loop_name, field),
            value: value.to_string(),
            reason: "must be non-negative and finite".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FailActionDef;

    fn project() -> Project {
        Project {
            version: LATEST_VERSION,
            name: "cell".to_string(),
            loops: vec![LoopDef {
                name: "TRCA1".to_string(),
                period_ms: 500,
                pid: PidDef::default(),
                sensor: Default::default(),
                valve: ValveDef {
                    on_high_high: FailActionDef::ToSafe,
                    ..ValveDef::default()
                },
            }],
        }
    }

    #[test]
    fn defaults_are_valid() {
        validate_project(&project()).unwrap();
    }

    #[test]
    fn rejects_future_version() {
        let mut p = project();
        p.version = LATEST_VERSION + 1;
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_and_empty_names() {
        let mut p = project();
        p.loops.push(p.loops[0].clone());
        assert!(matches!(validate_project(&p), Err(ValidationError::DuplicateId { .. })));

        let mut p = project();
        p.loops[0].name = "  ".to_string();
        assert!(matches!(validate_project(&p), Err(ValidationError::InvalidValue { .. })));
    }

    #[test]
    fn rejects_bad_numbers() {
        let mut p = project();
        p.loops[0].pid.kp = f64::NAN;
        assert!(validate_project(&p).is_err());

        let mut p = project();
        p.loops[0].sensor.limits.hysteresis = -0.5;
        assert!(validate_project(&p).is_err());

        let mut p = project();
        p.loops[0].pid.integral_limit = 0.0;
        assert!(validate_project(&p).is_err());

        let mut p = project();
        p.loops[0].period_ms = 0;
        assert!(validate_project(&p).is_err());

        let mut p = project();
        p.loops[0].sensor.priorities.high = 1001;
        assert!(validate_project(&p).is_err());

        let mut p = project();
        p.loops[0].sensor.priorities.normal = 0;
        assert!(validate_project(&p).is_err());
    }

    #[test]
    fn accepts_inverted_limits() {
        let mut p = project();
        p.loops[0].sensor.limits.high = 10.0;
        p.loops[0].sensor.limits.low = 90.0;
        p.loops[0].valve.out_min = 100.0;
        p.loops[0].valve.out_max = 0.0;
        validate_project(&p).unwrap();
    }
}

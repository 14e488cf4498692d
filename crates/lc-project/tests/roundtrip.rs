use lc_project::schema::*;
use lc_project::{
    ProjectError, ValidationError, load_json, load_yaml, save_json, save_yaml, validate_project,
};

fn reactor() -> Project {
    Project {
        version: LATEST_VERSION,
        name: "Reactor".to_string(),
        loops: vec![LoopDef {
            name: "TRCA1".to_string(),
            period_ms: 1000,
            pid: PidDef {
                kp: 1.0,
                ki: 1.0,
                setpoint: 70.0,
                manual_output: 25.0,
                mode: ModeDef::Auto,
                ..PidDef::default()
            },
            sensor: SensorDef {
                name: "T1".to_string(),
                limits: AlarmLimitsDef {
                    low_low: 10.0,
                    low: 20.0,
                    high: 80.0,
                    high_high: 90.0,
                    hysteresis: 2.0,
                },
                priorities: AlarmPrioritiesDef::default(),
            },
            valve: ValveDef {
                clamp_enable: true,
                on_high_high: FailActionDef::ToSafe,
                on_low_low: FailActionDef::ToManual,
                ..ValveDef::default()
            },
        }],
    }
}

#[test]
fn roundtrip_yaml_empty_project() {
    let project = Project {
        version: LATEST_VERSION,
        name: "Empty Project".to_string(),
        loops: vec![],
    };

    validate_project(&project).unwrap();

    let path = std::env::temp_dir().join("lc_project_roundtrip_empty.yaml");
    save_yaml(&path, &project).unwrap();
    let loaded = load_yaml(&path).unwrap();

    assert_eq!(project, loaded);
}

#[test]
fn roundtrip_yaml_reactor() {
    let project = reactor();
    let path = std::env::temp_dir().join("lc_project_roundtrip_reactor.yaml");
    save_yaml(&path, &project).unwrap();
    assert_eq!(project, load_yaml(&path).unwrap());
}

#[test]
fn roundtrip_json_reactor() {
    let project = reactor();
    let path = std::env::temp_dir().join("lc_project_roundtrip_reactor.json");
    save_json(&path, &project).unwrap();
    assert_eq!(project, load_json(&path).unwrap());
}

#[test]
fn enums_serialize_snake_case() {
    let yaml = serde_yaml::to_string(&reactor()).unwrap();
    assert!(yaml.contains("mode: auto"));
    assert!(yaml.contains("on_high_high: to_safe"));
    assert!(yaml.contains("on_low_low: to_manual"));
}

#[test]
fn minimal_loop_takes_defaults() {
    let yaml = "version: 1\nname: bare\nloops:\n  - name: L1\n";
    let project: Project = serde_yaml::from_str(yaml).unwrap();
    validate_project(&project).unwrap();

    let lp = &project.loops[0];
    assert_eq!(lp.period_ms, 1000);
    assert_eq!(lp.pid.mode, ModeDef::Manual);
    assert_eq!(lp.sensor.limits, AlarmLimitsDef::default());
    assert_eq!(lp.sensor.priorities.normal, 1);
    assert_eq!(lp.valve.on_high_high, FailActionDef::Hold);
}

#[test]
fn save_refuses_invalid_project() {
    let mut project = reactor();
    project.loops[0].sensor.limits.hysteresis = -1.0;
    let path = std::env::temp_dir().join("lc_project_invalid.yaml");
    assert!(matches!(
        save_yaml(&path, &project),
        Err(ProjectError::Validation(ValidationError::InvalidValue { .. }))
    ));
}

#[test]
fn select_loop_by_name_or_first() {
    let project = reactor();
    assert_eq!(project.select_loop(None).unwrap().name, "TRCA1");
    assert_eq!(project.select_loop(Some("TRCA1")).unwrap().name, "TRCA1");
    assert!(matches!(
        project.select_loop(Some("FRC9")),
        Err(ProjectError::UnknownLoop { .. })
    ));
}

mod error;
mod trace;

use clap::{Parser, Subcommand};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use lc_controls::{
    ControlLoop, LoopHandle, LoopIo, LoopRunner, OpenLoopActuator, TickRecord, TracingSink,
};
use lc_project::LoopDef;

use crate::error::{CliError, CliResult};
use crate::trace::ReplayAcquisition;

#[derive(Parser)]
#[command(name = "lc-cli")]
#[command(about = "loopctl CLI - single-loop process controller", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate project file syntax and structure
    Validate {
        /// Path to the project file (YAML, or JSON with a .json extension)
        project_path: PathBuf,
    },
    /// Replay a process-value trace through a loop with a fixed time step
    Run {
        /// Path to the project file
        project_path: PathBuf,
        /// Trace file, one process value per line
        #[arg(long)]
        trace: PathBuf,
        /// Loop to run (defaults to the first loop)
        #[arg(long = "loop")]
        loop_name: Option<String>,
        /// Time step in seconds (defaults to the loop period)
        #[arg(long)]
        dt: Option<f64>,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replay a trace in real time at the loop period, with measured time steps
    Schedule {
        /// Path to the project file
        project_path: PathBuf,
        /// Trace file, one process value per line
        #[arg(long)]
        trace: PathBuf,
        /// Loop to run (defaults to the first loop)
        #[arg(long = "loop")]
        loop_name: Option<String>,
        /// Number of ticks (defaults to the trace length)
        #[arg(long)]
        ticks: Option<u64>,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Run {
            project_path,
            trace,
            loop_name,
            dt,
            output,
        } => cmd_run(
            &project_path,
            &trace,
            loop_name.as_deref(),
            dt,
            output.as_deref(),
        ),
        Commands::Schedule {
            project_path,
            trace,
            loop_name,
            ticks,
        } => cmd_schedule(&project_path, &trace, loop_name.as_deref(), ticks),
    }
}

fn cmd_validate(project_path: &Path) -> CliResult<()> {
    println!("Validating project: {}", project_path.display());
    let project = lc_project::load(project_path)?;
    println!("✓ Project is valid");

    if project.loops.is_empty() {
        println!("No loops found in project");
    } else {
        println!("Loops in project '{}':", project.name);
        for lp in &project.loops {
            println!(
                "  {} - sensor {} ({} ms, {:?}, setpoint {})",
                lp.name,
                if lp.sensor.name.is_empty() { &lp.name } else { &lp.sensor.name },
                lp.period_ms,
                lp.pid.mode,
                lp.pid.setpoint
            );
        }
    }
    Ok(())
}

fn load_loop(project_path: &Path, loop_name: Option<&str>) -> CliResult<LoopDef> {
    let project = lc_project::load(project_path)?;
    Ok(project.select_loop(loop_name)?.clone())
}

fn cmd_run(
    project_path: &Path,
    trace_path: &Path,
    loop_name: Option<&str>,
    dt: Option<f64>,
    output: Option<&Path>,
) -> CliResult<()> {
    let def = load_loop(project_path, loop_name)?;
    let dt = dt.unwrap_or_else(|| def.period_secs());
    if !dt.is_finite() || dt <= 0.0 {
        return Err(CliError::InvalidInput(format!(
            "dt must be positive and finite, got {dt}"
        )));
    }

    let mut acquisition = ReplayAcquisition::load(trace_path)?;
    if acquisition.is_empty() {
        return Err(CliError::InvalidInput(format!(
            "trace {} has no samples",
            trace_path.display()
        )));
    }
    let samples = acquisition.len();
    let mut control_loop = def.build();
    let mut actuator = OpenLoopActuator::default();
    let mut sink = TracingSink;

    tracing::info!(control_loop = %def.name, samples, dt, "replaying trace");

    let mut out: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(std::fs::File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    writeln!(out, "{CSV_HEADER}")?;
    for tick in 0..samples {
        let record = control_loop.tick(dt, &mut acquisition, &mut actuator, &mut sink);
        writeln!(out, "{}", csv_row(tick, tick as f64 * dt, &record))?;
    }
    out.flush()?;
    drop(out);

    if let Some(path) = output {
        println!("✓ Wrote {} ticks to {}", samples, path.display());
    }
    Ok(())
}

fn cmd_schedule(
    project_path: &Path,
    trace_path: &Path,
    loop_name: Option<&str>,
    ticks: Option<u64>,
) -> CliResult<()> {
    let def = load_loop(project_path, loop_name)?;
    let acquisition = ReplayAcquisition::load(trace_path)?;
    let ticks = ticks.unwrap_or(acquisition.len() as u64);
    if ticks == 0 {
        return Err(CliError::InvalidInput("nothing to run: zero ticks".to_string()));
    }

    let config = def.sample_config()?.with_max_ticks(ticks);
    println!(
        "Scheduling loop {} for {} ticks at {} ms",
        def.name, ticks, def.period_ms
    );

    let handle = LoopHandle::new(def.build());
    let io = LoopIo::new(acquisition, OpenLoopActuator::default(), TracingSink);
    let runner = LoopRunner::spawn(handle.clone(), io, config)?;
    runner.join()?;

    print_summary(&handle.snapshot());
    Ok(())
}

fn print_summary(lp: &ControlLoop) {
    println!("\nLoop {} after run:", lp.name);
    println!("  Mode:     {:?}", lp.pid.mode);
    println!(
        "  PV:       {:.3} ({})",
        lp.sensor.point.value,
        if lp.sensor.point.is_good() { "good" } else { "bad" }
    );
    println!("  Output:   {:.3}", lp.pid.output);
    println!("  Command:  {:.3}", lp.valve.command);
    println!("  Integral: {:.3}", lp.pid.integral);
    let alarms = &lp.sensor.state;
    println!(
        "  Alarms:   HH={} H={} L={} LL={}",
        alarms.high_high, alarms.high, alarms.low, alarms.low_low
    );
}

const CSV_HEADER: &str = "tick,time_s,pv,pv_good,mode,control_output,command,actual_position,\
high_high,high,low,low_low,override";

fn csv_row(tick: usize, time_s: f64, record: &TickRecord) -> String {
    let overridden = record
        .override_applied
        .map(|o| format!("{:?}:{:?}", o.alarm, o.action))
        .unwrap_or_default();
    format!(
        "{},{},{},{},{:?},{},{},{},{},{},{},{},{}",
        tick,
        time_s,
        record.pv,
        record.pv_good,
        record.mode,
        record.control_output,
        record.command,
        record.actual_position,
        u8::from(record.alarms.high_high),
        u8::from(record.alarms.high),
        u8::from(record.alarms.low),
        u8::from(record.alarms.low_low),
        overridden
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use lc_controls::{AlarmState, ControlMode, CriticalAlarm, FailAction, OverrideApplied};

    #[test]
    fn csv_row_matches_header() {
        let record = TickRecord {
            pv: 95.0,
            pv_good: true,
            mode: ControlMode::Auto,
            control_output: 100.0,
            command: 0.0,
            actual_position: 0.0,
            alarms: AlarmState {
                high: true,
                high_high: true,
                ..AlarmState::default()
            },
            alarms_changed: true,
            override_applied: Some(OverrideApplied {
                alarm: CriticalAlarm::HighHigh,
                action: FailAction::ToSafe,
            }),
        };
        let row = csv_row(3, 0.3, &record);
        assert_eq!(row.split(',').count(), CSV_HEADER.split(',').count());
        assert_eq!(row, "3,0.3,95,true,Auto,100,0,0,1,1,0,0,HighHigh:ToSafe");
    }

    #[test]
    fn demo_trace_replays_through_demo_loop() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos");
        let def = load_loop(&root.join("reactor_cell.yaml"), Some("TRCA1")).unwrap();
        let mut acq = ReplayAcquisition::load(&root.join("trca1_trace.txt")).unwrap();
        let mut lp = def.build();
        let mut act = OpenLoopActuator::default();
        let mut sink: Vec<lc_controls::StatusReport> = Vec::new();

        let records: Vec<TickRecord> = (0..acq.len())
            .map(|_| lp.tick(1.0, &mut acq, &mut act, &mut sink))
            .collect();

        assert!(records.iter().all(|r| (0.0..=100.0).contains(&r.command)));
        assert!(records.iter().any(|r| r.alarms.high_high));
        assert!(records.iter().any(|r| !r.pv_good));
        assert!(records
            .iter()
            .filter(|r| r.alarms.high_high)
            .all(|r| r.command == 0.0));
    }
}

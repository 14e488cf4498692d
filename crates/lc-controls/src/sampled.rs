//! Periodic execution of a control loop.
//!
//! The loop is sampled at a fixed nominal period, but the PID integral and
//! derivative terms use the *measured* time between ticks: a scheduler that
//! wakes late must not silently skew them.
//!
//! [`LoopRunner`] drives one loop on its own thread against absolute
//! deadlines. Deadlines missed by a slow tick are skipped, not replayed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::{ControlError, ControlResult};
use crate::output::Actuator;
use crate::port::LoopHandle;
use crate::process::Acquisition;
use crate::report::StatusSink;

/// Scheduling configuration for one loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleConfig {
    /// Nominal tick period.
    pub period: Duration,
    /// Stop by itself after this many ticks.
    pub max_ticks: Option<u64>,
}

impl SampleConfig {
    /// Create a sample configuration.
    ///
    /// # Errors
    ///
    /// Returns error if `period` is zero.
    pub fn new(period: Duration) -> ControlResult<Self> {
        if period.is_zero() {
            return Err(ControlError::InvalidArg {
                what: "sample period must be positive",
            });
        }
        Ok(Self {
            period,
            max_ticks: None,
        })
    }

    /// Create a sample configuration from a period in milliseconds.
    pub fn from_millis(period_ms: u64) -> ControlResult<Self> {
        Self::new(Duration::from_millis(period_ms))
    }

    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    /// Get the sample frequency in Hz.
    pub fn frequency(&self) -> f64 {
        1.0 / self.period.as_secs_f64()
    }
}

/// Measures the elapsed time between consecutive ticks.
#[derive(Debug, Clone)]
pub struct TickClock {
    period: Duration,
    last: Option<Instant>,
}

impl TickClock {
    pub fn new(period: Duration) -> Self {
        Self { period, last: None }
    }

    /// Seconds since the previous call, or the nominal period on the first call.
    pub fn dt(&mut self, now: Instant) -> f64 {
        let dt = match self.last {
            Some(prev) => now.saturating_duration_since(prev),
            None => self.period,
        };
        self.last = Some(now);
        dt.as_secs_f64()
    }

    /// Forget the previous tick, e.g. after the loop was paused.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Collaborators owned by a running loop.
pub struct LoopIo {
    pub acquisition: Box<dyn Acquisition + Send>,
    pub actuator: Box<dyn Actuator + Send>,
    pub sink: Box<dyn StatusSink + Send>,
}

impl LoopIo {
    pub fn new(
        acquisition: impl Acquisition + Send + 'static,
        actuator: impl Actuator + Send + 'static,
        sink: impl StatusSink + Send + 'static,
    ) -> Self {
        Self {
            acquisition: Box::new(acquisition),
            actuator: Box::new(actuator),
            sink: Box::new(sink),
        }
    }
}

/// A loop ticking on a dedicated thread.
pub struct LoopRunner {
    stop: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    thread: Option<JoinHandle<LoopIo>>,
}

impl LoopRunner {
    /// Start ticking `handle` with the given collaborators.
    pub fn spawn(handle: LoopHandle, io: LoopIo, config: SampleConfig) -> ControlResult<Self> {
        if config.period.is_zero() {
            return Err(ControlError::InvalidArg {
                what: "sample period must be positive",
            });
        }

        let stop = Arc::new(AtomicBool::new(false));
        let ticks = Arc::new(AtomicU64::new(0));
        let name = handle.with(|lp| lp.name.clone());

        let thread = thread::Builder::new()
            .name(format!("loop-{name}"))
            .spawn({
                let stop = Arc::clone(&stop);
                let ticks = Arc::clone(&ticks);
                move || run(handle, io, config, &stop, &ticks)
            })
            .map_err(|err| ControlError::Scheduler {
                what: format!("failed to spawn loop thread: {err}"),
            })?;

        tracing::info!(
            control_loop = %name,
            period_ms = config.period.as_millis() as u64,
            "loop started"
        );

        Ok(Self {
            stop,
            ticks,
            thread: Some(thread),
        })
    }

    /// Number of ticks executed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Signal the thread to stop after the current tick and wait for it.
    /// Returns the collaborators.
    pub fn stop(mut self) -> ControlResult<LoopIo> {
        self.stop.store(true, Ordering::Release);
        self.join_thread()
    }

    /// Wait for the thread to finish by itself (after `max_ticks`).
    pub fn join(mut self) -> ControlResult<LoopIo> {
        self.join_thread()
    }

    fn join_thread(&mut self) -> ControlResult<LoopIo> {
        let thread = self.thread.take().ok_or_else(|| ControlError::Scheduler {
            what: "loop thread already joined".to_string(),
        })?;
        thread.thread().unpark();
        thread.join().map_err(|_| ControlError::Scheduler {
            what: "loop thread panicked".to_string(),
        })
    }
}

impl Drop for LoopRunner {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.stop.store(true, Ordering::Release);
            thread.thread().unpark();
            let _ = thread.join();
        }
    }
}

fn run(
    handle: LoopHandle,
    mut io: LoopIo,
    config: SampleConfig,
    stop: &AtomicBool,
    ticks: &AtomicU64,
) -> LoopIo {
    let mut clock = TickClock::new(config.period);
    let mut deadline = Instant::now();

    while !stop.load(Ordering::Acquire) {
        let dt = clock.dt(Instant::now());
        handle.tick(dt, &mut io.acquisition, &mut io.actuator, &mut io.sink);
        let done = ticks.fetch_add(1, Ordering::AcqRel) + 1;
        if config.max_ticks.is_some_and(|max| done >= max) {
            break;
        }

        deadline += config.period;
        let now = Instant::now();
        if deadline <= now {
            let behind = now.duration_since(deadline);
            let skipped = behind.as_nanos() / config.period.as_nanos() + 1;
            tracing::warn!(
                behind_ms = behind.as_millis() as u64,
                skipped = skipped as u64,
                "tick overrun, skipping missed deadlines"
            );
            deadline += config.period * skipped as u32;
        }

        while !stop.load(Ordering::Acquire) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::park_timeout(deadline - now);
        }
    }

    io
}

//! The stopwatch engine: elapsed-time accumulation with laps.

use crate::common::ScheduleHandle;
use crate::events::{EventBus, Politeness, Surface};
use crate::format::TimeParts;
use crate::time::{lock, Scheduler};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, trace};

/// The stopwatch's timing data. Owned by one [`StopwatchEngine`].
#[derive(Debug, Default)]
pub struct StopwatchState {
    pub lap_times: Vec<TimeParts>,
    pub accumulated_elapsed_ms: u64,
    /// Scheduler time from which elapsed time is measured while running.
    pub reference_start: Duration,
    pub running: bool,
    frame: Option<ScheduleHandle>,
}

/// Which stopwatch controls are usable, and what the start control says.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopwatchControls {
    pub start_enabled: bool,
    pub start_label: &'static str,
    pub lap_enabled: bool,
    pub stop_enabled: bool,
    pub clear_enabled: bool,
}

struct Shared {
    state: Mutex<StopwatchState>,
    scheduler: Arc<dyn Scheduler>,
    bus: EventBus,
    frame_period: Duration,
}

impl Shared {
    fn refresh(&self, state: &mut StopwatchState) {
        let now = self.scheduler.now();
        state.accumulated_elapsed_ms = now.saturating_sub(state.reference_start).as_millis() as u64;
    }

    fn update_frame(&self) {
        let mut state = lock(&self.state);
        if !state.running {
            return;
        }
        self.refresh(&mut state);
        trace!(elapsed_ms = state.accumulated_elapsed_ms, "Stopwatch frame.");
        self.bus.show(
            Surface::Elapsed,
            TimeParts::from_millis(state.accumulated_elapsed_ms).to_string(),
        );
    }
}

/// Drives the stopwatch from a recurring frame callback.
///
/// The engine is a cheap handle; clones control the same stopwatch. Calls that
/// are not valid in the current state are ignored.
#[derive(Clone)]
pub struct StopwatchEngine {
    shared: Arc<Shared>,
}

impl StopwatchEngine {
    pub fn new(scheduler: Arc<dyn Scheduler>, bus: EventBus, frame_period: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(StopwatchState::default()),
                scheduler,
                bus,
                frame_period,
            }),
        }
    }

    /// Starts or resumes timing from the accumulated elapsed time.
    pub fn start(&self) {
        let shared = &self.shared;
        let mut state = lock(&shared.state);
        if state.running {
            debug!("Stopwatch start ignored: already running.");
            return;
        }
        let resuming = state.accumulated_elapsed_ms > 0;
        state.reference_start = shared
            .scheduler
            .now()
            .saturating_sub(Duration::from_millis(state.accumulated_elapsed_ms));
        state.running = true;

        if let Some(stale) = state.frame.take() {
            shared.scheduler.cancel(stale);
        }
        let weak = Arc::downgrade(shared);
        state.frame = Some(shared.scheduler.schedule_repeating(
            shared.frame_period,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.update_frame();
                }
            }),
        ));
        drop(state);

        shared.update_frame();
        if resuming {
            info!("Stopwatch resumed.");
            shared.bus.announce("Stopwatch resumed", Politeness::Polite);
        } else {
            info!("Stopwatch started.");
            shared.bus.announce("Stopwatch started", Politeness::Polite);
        }
    }

    /// Records the current elapsed time as a lap. Ignored while stopped.
    pub fn record_lap(&self) -> Option<TimeParts> {
        let shared = &self.shared;
        let mut state = lock(&shared.state);
        if !state.running {
            debug!("Lap ignored: stopwatch is not running.");
            return None;
        }
        shared.refresh(&mut state);
        let lap = TimeParts::from_millis(state.accumulated_elapsed_ms);
        state.lap_times.push(lap.clone());
        let number = state.lap_times.len();
        drop(state);

        let text = lap.to_string();
        info!(lap = number, "Lap recorded at {}.", text);
        shared.bus.append(
            Surface::LapList,
            text.clone(),
            format!("Lap time {}: {}", number, text),
        );
        shared
            .bus
            .announce(format!("Lap time recorded: {}", text), Politeness::Polite);
        Some(lap)
    }

    /// Pauses timing. The elapsed time is frozen until the next start.
    pub fn stop(&self) {
        let shared = &self.shared;
        let mut state = lock(&shared.state);
        if !state.running {
            debug!("Stopwatch stop ignored: not running.");
            return;
        }
        shared.refresh(&mut state);
        if let Some(frame) = state.frame.take() {
            shared.scheduler.cancel(frame);
        }
        state.running = false;
        let elapsed = TimeParts::from_millis(state.accumulated_elapsed_ms);
        drop(state);

        info!("Stopwatch stopped at {}.", elapsed);
        shared.bus.show(Surface::Elapsed, elapsed.to_string());
        shared.bus.announce("Stopwatch stopped", Politeness::Polite);
    }

    /// Resets elapsed time and laps. Ignored while running.
    pub fn clear(&self) {
        let shared = &self.shared;
        let mut state = lock(&shared.state);
        if state.running {
            debug!("Stopwatch clear ignored: still running.");
            return;
        }
        state.accumulated_elapsed_ms = 0;
        state.reference_start = Duration::ZERO;
        state.lap_times.clear();
        drop(state);

        info!("Stopwatch cleared.");
        shared
            .bus
            .show(Surface::Elapsed, TimeParts::from_millis(0).to_string());
        shared.bus.reset(Surface::LapList);
        shared
            .bus
            .announce("Stopwatch cleared and reset", Politeness::Polite);
    }

    /// Cancels the frame callback without touching the recorded time.
    pub(crate) fn shutdown(&self) {
        let shared = &self.shared;
        let mut state = lock(&shared.state);
        if let Some(frame) = state.frame.take() {
            shared.scheduler.cancel(frame);
        }
        if state.running {
            shared.refresh(&mut state);
            state.running = false;
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.shared.state).running
    }

    /// Elapsed milliseconds as of the last frame, stop or lap.
    pub fn elapsed_ms(&self) -> u64 {
        lock(&self.shared.state).accumulated_elapsed_ms
    }

    pub fn laps(&self) -> Vec<TimeParts> {
        lock(&self.shared.state).lap_times.clone()
    }

    pub fn controls(&self) -> StopwatchControls {
        let state = lock(&self.shared.state);
        let has_time = state.accumulated_elapsed_ms > 0 || !state.lap_times.is_empty();
        StopwatchControls {
            start_enabled: !state.running,
            start_label: if !state.running && has_time { "Resume" } else { "Start" },
            lap_enabled: state.running,
            stop_enabled: state.running,
            clear_enabled: !state.running && has_time,
        }
    }
}

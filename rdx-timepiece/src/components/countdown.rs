//! The countdown engine: a remaining-seconds counter driven by a fixed tick.

use crate::common::ScheduleHandle;
use crate::config::CountdownConfig;
use crate::events::{AlertEvent, EventBus, Politeness, Surface, ALARM_TONES};
use crate::format::format_mm_ss;
use crate::time::{lock, Scheduler};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

/// Text shown on the countdown surface when no session is active.
pub const IDLE_TEXT: &str = "Timer";
/// Text shown on the countdown surface once the countdown has run out.
pub const FINISHED_TEXT: &str = "Finished";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CountdownError {
    #[error("Please enter valid time!")]
    InvalidDuration { minutes: u32, seconds: u32 },
}

/// Lifecycle phase of the countdown. Exactly one holds at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountdownPhase {
    #[default]
    Idle,
    Running,
    Paused,
    Finished,
}

/// The countdown's timing data. Owned by one [`CountdownEngine`].
#[derive(Debug, Default)]
pub struct CountdownState {
    pub phase: CountdownPhase,
    pub remaining_seconds: u64,
    pub paused_remaining_seconds: u64,
    tick: Option<ScheduleHandle>,
    urgency_reset: Option<ScheduleHandle>,
}

/// Which countdown controls are usable, and what the start control says.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownControls {
    pub start_enabled: bool,
    pub start_label: &'static str,
    pub stop_enabled: bool,
    pub clear_enabled: bool,
}

struct Shared {
    state: Mutex<CountdownState>,
    scheduler: Arc<dyn Scheduler>,
    bus: EventBus,
    timing: CountdownConfig,
}

/// Drives the countdown from a fixed-period tick.
///
/// The engine is the single source of truth for the remaining time; the
/// countdown surface is only ever written. Clones control the same countdown.
#[derive(Clone)]
pub struct CountdownEngine {
    shared: Arc<Shared>,
}

impl CountdownEngine {
    pub fn new(scheduler: Arc<dyn Scheduler>, bus: EventBus, timing: CountdownConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(CountdownState::default()),
                scheduler,
                bus,
                timing,
            }),
        }
    }

    /// Resumes a paused session, or starts a fresh one of `minutes:seconds`.
    ///
    /// Only a pause with seconds left is resumable, and the arguments are
    /// ignored when resuming. A countdown paused at `00:00` starts fresh. A
    /// fresh start with a zero total is rejected: the rejection is shown on
    /// the countdown surface for the error display time and announced, and
    /// the engine is left Idle.
    pub fn start(&self, minutes: u32, seconds: u32) -> Result<(), CountdownError> {
        let shared = &self.shared;
        let mut state = lock(&shared.state);
        let announcement = match state.phase {
            CountdownPhase::Running => {
                debug!("Countdown start ignored: already running.");
                return Ok(());
            }
            CountdownPhase::Paused if state.paused_remaining_seconds > 0 => {
                state.remaining_seconds = state.paused_remaining_seconds;
                info!(remaining = state.remaining_seconds, "Countdown resumed.");
                "Countdown timer resumed".to_string()
            }
            CountdownPhase::Idle | CountdownPhase::Paused | CountdownPhase::Finished => {
                let total = u64::from(minutes) * 60 + u64::from(seconds);
                if total == 0 {
                    let error = CountdownError::InvalidDuration { minutes, seconds };
                    state.phase = CountdownPhase::Idle;
                    state.paused_remaining_seconds = 0;
                    reject(shared, &mut state, &error);
                    return Err(error);
                }
                state.remaining_seconds = total;
                state.paused_remaining_seconds = 0;
                info!(total, "Countdown started.");
                format!(
                    "Countdown timer started for {} minutes and {} seconds",
                    total / 60,
                    total % 60
                )
            }
        };

        state.phase = CountdownPhase::Running;
        if let Some(stale) = state.tick.take() {
            shared.scheduler.cancel(stale);
        }
        let weak = Arc::downgrade(shared);
        state.tick = Some(shared.scheduler.schedule_repeating(
            shared.timing.tick_period(),
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    tick(&shared);
                }
            }),
        ));
        let remaining = state.remaining_seconds;
        drop(state);

        shared.bus.show(Surface::Countdown, format_mm_ss(remaining));
        shared.bus.urgency(Surface::Countdown, Politeness::Polite);
        shared.bus.announce(announcement, Politeness::Polite);
        Ok(())
    }

    /// Pauses a running countdown, capturing the remaining seconds.
    pub fn stop(&self) {
        let shared = &self.shared;
        let mut state = lock(&shared.state);
        if state.phase != CountdownPhase::Running {
            debug!("Countdown stop ignored: not running.");
            return;
        }
        if let Some(tick) = state.tick.take() {
            shared.scheduler.cancel(tick);
        }
        state.paused_remaining_seconds = state.remaining_seconds;
        state.phase = CountdownPhase::Paused;
        info!(remaining = state.remaining_seconds, "Countdown paused.");
        drop(state);

        shared.bus.urgency(Surface::Countdown, Politeness::Polite);
        shared
            .bus
            .announce("Countdown timer paused", Politeness::Polite);
    }

    /// Cancels any pending work and returns to idle.
    pub fn clear(&self) {
        let shared = &self.shared;
        let mut state = lock(&shared.state);
        cancel_pending(shared, &mut state);
        state.remaining_seconds = 0;
        state.paused_remaining_seconds = 0;
        state.phase = CountdownPhase::Idle;
        drop(state);

        info!("Countdown cleared.");
        shared.bus.show(Surface::Countdown, IDLE_TEXT);
        shared.bus.urgency(Surface::Countdown, Politeness::Polite);
        shared.bus.announce("Timer inputs cleared", Politeness::Polite);
    }

    /// Cancels the tick and any pending urgency reset, keeping the counters.
    pub(crate) fn shutdown(&self) {
        let shared = &self.shared;
        let mut state = lock(&shared.state);
        cancel_pending(shared, &mut state);
        if state.phase == CountdownPhase::Running {
            state.paused_remaining_seconds = state.remaining_seconds;
            state.phase = CountdownPhase::Paused;
        }
    }

    pub fn phase(&self) -> CountdownPhase {
        lock(&self.shared.state).phase
    }

    pub fn is_running(&self) -> bool {
        self.phase() == CountdownPhase::Running
    }

    pub fn remaining_seconds(&self) -> u64 {
        lock(&self.shared.state).remaining_seconds
    }

    pub fn paused_remaining_seconds(&self) -> u64 {
        lock(&self.shared.state).paused_remaining_seconds
    }

    /// Whether `start` would resume a paused session rather than start fresh.
    pub fn is_resumable(&self) -> bool {
        let state = lock(&self.shared.state);
        state.phase == CountdownPhase::Paused && state.paused_remaining_seconds > 0
    }

    /// Control gating given whether the inputs currently hold a nonzero time.
    pub fn controls(&self, has_time_set: bool) -> CountdownControls {
        let phase = self.phase();
        let running = phase == CountdownPhase::Running;
        let paused = phase == CountdownPhase::Paused;
        let resumable = self.is_resumable();
        CountdownControls {
            start_enabled: (has_time_set || resumable) && !running,
            start_label: if resumable { "Resume" } else { "Start" },
            stop_enabled: running,
            clear_enabled: has_time_set || running || paused,
        }
    }
}

fn tick(shared: &Arc<Shared>) {
    let mut state = lock(&shared.state);
    if state.phase != CountdownPhase::Running {
        return;
    }
    match state.remaining_seconds.checked_sub(1) {
        Some(remaining) => {
            state.remaining_seconds = remaining;
            drop(state);
            trace!(remaining, "Countdown tick.");
            shared.bus.show(Surface::Countdown, format_mm_ss(remaining));
        }
        None => {
            if let Some(tick) = state.tick.take() {
                shared.scheduler.cancel(tick);
            }
            state.phase = CountdownPhase::Finished;
            state.paused_remaining_seconds = 0;
            schedule_urgency_reset(shared, &mut state, shared.timing.urgency_reset(), false);
            drop(state);

            info!("Countdown finished.");
            shared.bus.show(Surface::Countdown, FINISHED_TEXT);
            shared.bus.urgency(Surface::Countdown, Politeness::Assertive);
            shared.bus.alert(AlertEvent::Alarm {
                tones: &ALARM_TONES,
            });
            shared.bus.announce(
                "Time is over! Countdown timer has finished.",
                Politeness::Polite,
            );
        }
    }
}

fn reject(shared: &Arc<Shared>, state: &mut CountdownState, error: &CountdownError) {
    warn!("Countdown start rejected: {:?}", error);
    let message = error.to_string();
    schedule_urgency_reset(shared, state, shared.timing.error_display(), true);
    shared.bus.show(Surface::Countdown, message.clone());
    shared.bus.urgency(Surface::Countdown, Politeness::Assertive);
    shared.bus.announce(message, Politeness::Assertive);
}

/// Drops the countdown surface back to polite urgency after `delay`. With
/// `restore_text`, a surface with no running or paused session gets its
/// placeholder back.
fn schedule_urgency_reset(
    shared: &Arc<Shared>,
    state: &mut CountdownState,
    delay: Duration,
    restore_text: bool,
) {
    if let Some(pending) = state.urgency_reset.take() {
        shared.scheduler.cancel(pending);
    }
    let weak = Arc::downgrade(shared);
    state.urgency_reset = Some(shared.scheduler.schedule_once(
        delay,
        Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                reset_urgency(&shared, restore_text);
            }
        }),
    ));
}

fn reset_urgency(shared: &Arc<Shared>, restore_text: bool) {
    let mut state = lock(&shared.state);
    state.urgency_reset = None;
    let inactive = matches!(state.phase, CountdownPhase::Idle | CountdownPhase::Finished);
    drop(state);

    shared.bus.urgency(Surface::Countdown, Politeness::Polite);
    if restore_text && inactive {
        shared.bus.show(Surface::Countdown, IDLE_TEXT);
    }
}

fn cancel_pending(shared: &Arc<Shared>, state: &mut CountdownState) {
    if let Some(tick) = state.tick.take() {
        shared.scheduler.cancel(tick);
    }
    if let Some(pending) = state.urgency_reset.take() {
        shared.scheduler.cancel(pending);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{drain, DisplayEvent};
    use crate::time::ManualScheduler;
    use pretty_assertions::assert_eq;

    const SECOND: Duration = Duration::from_secs(1);

    fn countdown() -> (ManualScheduler, EventBus, CountdownEngine) {
        let scheduler = ManualScheduler::new();
        let bus = EventBus::new();
        let engine = CountdownEngine::new(
            Arc::new(scheduler.clone()),
            bus.clone(),
            CountdownConfig::default(),
        );
        (scheduler, bus, engine)
    }

    fn countdown_texts(events: Vec<DisplayEvent>) -> Vec<String> {
        events
            .into_iter()
            .filter_map(|event| match event {
                DisplayEvent::Show {
                    surface: Surface::Countdown,
                    text,
                } => Some(text),
                _ => None,
            })
            .collect()
    }

    fn alarms(events: Vec<AlertEvent>) -> usize {
        events
            .iter()
            .filter(|event| matches!(event, AlertEvent::Alarm { .. }))
            .count()
    }

    #[test]
    fn test_ticks_decrement_remaining() {
        for (minutes, seconds) in [(0, 5), (1, 0), (2, 30)] {
            let (scheduler, bus, cd) = countdown();
            let mut display = bus.subscribe_display_events();
            let total = u64::from(minutes) * 60 + u64::from(seconds);

            cd.start(minutes, seconds).unwrap();
            for n in 1..=total {
                scheduler.advance(SECOND);
                assert_eq!(cd.remaining_seconds(), total - n);
            }
            let last = countdown_texts(drain(&mut display)).pop().unwrap();
            assert_eq!(last, "00:00");
            assert_eq!(cd.phase(), CountdownPhase::Running);
        }
    }

    #[test]
    fn test_display_matches_remaining() {
        let (scheduler, bus, cd) = countdown();
        let mut display = bus.subscribe_display_events();
        cd.start(1, 5).unwrap();
        scheduler.advance(SECOND * 3);

        assert_eq!(
            countdown_texts(drain(&mut display)),
            vec!["01:05", "01:04", "01:03", "01:02"]
        );
    }

    #[test]
    fn test_finishes_exactly_once() {
        for (minutes, seconds) in [(0, 3), (1, 2)] {
            let (scheduler, bus, cd) = countdown();
            let mut alerts = bus.subscribe_alert_events();
            let mut display = bus.subscribe_display_events();
            let total: u32 = minutes * 60 + seconds;

            cd.start(minutes, seconds).unwrap();
            scheduler.advance(SECOND * total);
            assert_eq!(cd.phase(), CountdownPhase::Running);
            assert_eq!(alarms(drain(&mut alerts)), 0);

            scheduler.advance(SECOND);
            assert_eq!(cd.phase(), CountdownPhase::Finished);
            assert_eq!(alarms(drain(&mut alerts)), 1);
            assert_eq!(
                countdown_texts(drain(&mut display)).pop().as_deref(),
                Some(FINISHED_TEXT)
            );

            // Only the urgency reset remains, then nothing.
            assert_eq!(scheduler.pending(), 1);
            scheduler.advance(SECOND * 10);
            assert_eq!(scheduler.pending(), 0);
            assert_eq!(alarms(drain(&mut alerts)), 0);
            assert_eq!(cd.phase(), CountdownPhase::Finished);
            assert!(drain(&mut display).contains(&DisplayEvent::Urgency {
                surface: Surface::Countdown,
                level: Politeness::Polite,
            }));
        }
    }

    #[test]
    fn test_paused_at_zero_starts_fresh() {
        let (scheduler, bus, cd) = countdown();
        let mut alerts = bus.subscribe_alert_events();

        cd.start(0, 3).unwrap();
        scheduler.advance(SECOND * 3);
        cd.stop();
        assert_eq!(cd.phase(), CountdownPhase::Paused);
        assert_eq!(cd.paused_remaining_seconds(), 0);
        assert!(!cd.is_resumable());
        assert_eq!(cd.controls(true).start_label, "Start");
        assert!(!cd.controls(false).start_enabled);

        cd.start(0, 3).unwrap();
        assert_eq!(cd.remaining_seconds(), 3);
        scheduler.advance(SECOND);
        assert_eq!(cd.phase(), CountdownPhase::Running);
        assert_eq!(cd.remaining_seconds(), 2);
        assert_eq!(alarms(drain(&mut alerts)), 0);
    }

    #[test]
    fn test_rejection_after_finish_clears_message() {
        let (scheduler, bus, cd) = countdown();
        cd.start(0, 1).unwrap();
        scheduler.advance(SECOND * 2);
        assert_eq!(cd.phase(), CountdownPhase::Finished);
        scheduler.advance(SECOND * 2);

        let mut display = bus.subscribe_display_events();
        assert!(cd.start(0, 0).is_err());
        assert_eq!(cd.phase(), CountdownPhase::Idle);
        scheduler.advance(SECOND * 10);

        assert_eq!(
            countdown_texts(drain(&mut display)),
            vec!["Please enter valid time!", IDLE_TEXT]
        );
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_pause_resume_round_trip() {
        let (scheduler, bus, cd) = countdown();
        let mut announcements = bus.subscribe_announcements();
        cd.start(0, 10).unwrap();
        scheduler.advance(SECOND * 4);
        cd.stop();
        assert_eq!(cd.phase(), CountdownPhase::Paused);
        assert_eq!(cd.paused_remaining_seconds(), 6);

        scheduler.advance(SECOND * 30);
        assert_eq!(cd.remaining_seconds(), 6);

        // The arguments are ignored when resuming.
        cd.start(5, 0).unwrap();
        assert_eq!(cd.phase(), CountdownPhase::Running);
        assert_eq!(cd.remaining_seconds(), 6);
        scheduler.advance(SECOND);
        assert_eq!(cd.remaining_seconds(), 5);

        let messages: Vec<String> = drain(&mut announcements)
            .into_iter()
            .map(|a| a.message)
            .collect();
        assert_eq!(
            messages,
            vec![
                "Countdown timer started for 0 minutes and 10 seconds",
                "Countdown timer paused",
                "Countdown timer resumed",
            ]
        );
    }

    #[test]
    fn test_zero_duration_is_rejected() {
        let (scheduler, bus, cd) = countdown();
        let mut display = bus.subscribe_display_events();
        let mut announcements = bus.subscribe_announcements();

        let result = cd.start(0, 0);
        assert_eq!(
            result,
            Err(CountdownError::InvalidDuration {
                minutes: 0,
                seconds: 0
            })
        );
        assert_eq!(cd.phase(), CountdownPhase::Idle);
        assert_eq!(cd.remaining_seconds(), 0);

        let announced = drain(&mut announcements);
        assert_eq!(announced[0].message, "Please enter valid time!");
        assert_eq!(announced[0].politeness, Politeness::Assertive);

        scheduler.advance(SECOND * 3);
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(
            countdown_texts(drain(&mut display)),
            vec!["Please enter valid time!", IDLE_TEXT]
        );
    }

    #[test]
    fn test_clear_cancels_everything() {
        let (scheduler, _bus, cd) = countdown();
        cd.start(0, 30).unwrap();
        scheduler.advance(SECOND * 2);
        cd.stop();
        cd.clear();
        assert_eq!(cd.phase(), CountdownPhase::Idle);
        assert_eq!(cd.paused_remaining_seconds(), 0);
        assert_eq!(scheduler.pending(), 0);

        // A fresh start uses the new arguments.
        cd.start(0, 7).unwrap();
        assert_eq!(cd.remaining_seconds(), 7);
        cd.clear();
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(cd.remaining_seconds(), 0);
    }

    #[test]
    fn test_restart_after_finish() {
        let (scheduler, _bus, cd) = countdown();
        cd.start(0, 1).unwrap();
        scheduler.advance(SECOND * 2);
        assert_eq!(cd.phase(), CountdownPhase::Finished);

        cd.start(0, 2).unwrap();
        assert_eq!(cd.phase(), CountdownPhase::Running);
        assert_eq!(cd.remaining_seconds(), 2);
    }

    #[test]
    fn test_stop_and_double_start_are_ignored() {
        let (scheduler, _bus, cd) = countdown();
        cd.stop();
        assert_eq!(cd.phase(), CountdownPhase::Idle);

        cd.start(0, 5).unwrap();
        cd.start(0, 9).unwrap();
        assert_eq!(cd.remaining_seconds(), 5);
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn test_controls() {
        let (scheduler, _bus, cd) = countdown();
        let idle = cd.controls(false);
        assert!(!idle.start_enabled && !idle.stop_enabled && !idle.clear_enabled);
        assert!(cd.controls(true).start_enabled);

        cd.start(0, 5).unwrap();
        let running = cd.controls(true);
        assert!(!running.start_enabled && running.stop_enabled && running.clear_enabled);

        scheduler.advance(SECOND);
        cd.stop();
        let paused = cd.controls(false);
        assert!(paused.start_enabled && paused.clear_enabled);
        assert_eq!(paused.start_label, "Resume");
    }
}

//! The engine that composes the widget's components.

use crate::common::Mode;
use crate::components::clock_face::ClockFace;
use crate::components::countdown::{CountdownControls, CountdownEngine, CountdownError, IDLE_TEXT};
use crate::components::inputs::{parse_field, Field, TimerInputs};
use crate::components::stopwatch::{StopwatchControls, StopwatchEngine};
use crate::config::{PresetConfig, TimepieceConfig};
use crate::events::{AlertEvent, Announcement, DisplayEvent, EventBus, Politeness, Surface};
use crate::format::TimeParts;
use crate::time::{lock, Scheduler, TokioScheduler};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{info, warn};

/// The main Timepiece engine.
///
/// This struct is the central point of control. It owns the three components
/// (clock face, stopwatch, countdown), the countdown inputs, and the mode
/// coordinator, and wires them all to one scheduler and one event bus. The
/// engine is designed to be cloned and shared across tasks; every clone is a
/// handle to the same widget.
#[derive(Clone)]
pub struct TimepieceEngine {
    config: Arc<TimepieceConfig>,
    bus: EventBus,
    scheduler: Arc<dyn Scheduler>,
    clock_face: ClockFace,
    stopwatch: StopwatchEngine,
    countdown: CountdownEngine,
    inputs: Arc<Mutex<TimerInputs>>,
    mode: Arc<Mutex<Mode>>,
}

// Core implementation block for lifecycle and composition.
impl TimepieceEngine {
    /// Creates a new `TimepieceEngine` over the given scheduler.
    pub fn new(config: TimepieceConfig, scheduler: Arc<dyn Scheduler>) -> Self {
        let bus = EventBus::new();
        let clock_face = ClockFace::new(scheduler.clone(), bus.clone(), &config.clock);
        let stopwatch = StopwatchEngine::new(
            scheduler.clone(),
            bus.clone(),
            config.resolution.frame_period(),
        );
        let countdown = CountdownEngine::new(scheduler.clone(), bus.clone(), config.countdown.clone());
        let mode = Arc::new(Mutex::new(config.start_mode));
        Self {
            config: Arc::new(config),
            bus,
            scheduler,
            clock_face,
            stopwatch,
            countdown,
            inputs: Arc::new(Mutex::new(TimerInputs::default())),
            mode,
        }
    }

    /// Creates an engine scheduled on the current tokio runtime.
    pub fn with_tokio(config: TimepieceConfig) -> Self {
        Self::new(config, Arc::new(TokioScheduler::new()))
    }

    /// Publishes the initial contents of every surface and starts the clock.
    pub fn open(&self) {
        let mode = self.mode();
        info!(%mode, "Opening timepiece.");
        self.bus
            .show(Surface::Elapsed, TimeParts::from_millis(0).to_string());
        self.bus.show(Surface::Countdown, IDLE_TEXT);
        self.bus
            .show(Surface::TimerPreview, lock(&self.inputs).preview());
        self.bus.alert(AlertEvent::ModeChanged { mode });
        self.clock_face.start();
    }

    /// Cancels every scheduled callback. Recorded times are kept.
    pub fn shutdown(&self) {
        self.clock_face.stop();
        self.stopwatch.shutdown();
        self.countdown.shutdown();
        self.bus.alert(AlertEvent::EngineShutdown);
        info!("Timepiece has shut down.");
    }

    /// Runs the widget until a shutdown signal is received.
    ///
    /// This method will:
    /// 1. Publish the initial surfaces and start the clock face.
    /// 2. Wait for a Ctrl+C signal.
    /// 3. Cancel every scheduled callback.
    pub async fn run(&self) -> anyhow::Result<()> {
        info!("TimepieceEngine starting up...");
        self.open();
        self.bus.alert(AlertEvent::EngineStarted);
        info!("Engine running. Press Ctrl+C to shut down.");
        tokio::signal::ctrl_c().await?;
        info!("Shutdown signal received.");
        self.shutdown();
        Ok(())
    }
}

// Mode coordinator.
impl TimepieceEngine {
    pub fn mode(&self) -> Mode {
        *lock(&self.mode)
    }

    /// Whether `mode`'s surfaces are the visible ones.
    pub fn is_visible(&self, mode: Mode) -> bool {
        self.mode() == mode
    }

    /// Makes exactly one mode visible and announces it. The state of the
    /// hidden engines is left untouched.
    pub fn switch_mode(&self, mode: Mode) {
        *lock(&self.mode) = mode;
        info!(%mode, "Mode switched.");
        self.bus.alert(AlertEvent::ModeChanged { mode });
        let message = match mode {
            Mode::RealTimeClock => {
                "Real-time clock mode activated. Current time and date are displayed."
            }
            Mode::Stopwatch => {
                "Stopwatch mode activated. Use Start button to begin timing, Lap to record split times."
            }
            Mode::CountdownTimer => {
                "Countdown timer mode activated. Set time using presets or custom input, then press Start."
            }
        };
        self.bus.announce(message, Politeness::Polite);
    }
}

// Countdown inputs.
impl TimepieceEngine {
    pub fn inputs(&self) -> TimerInputs {
        *lock(&self.inputs)
    }

    pub fn presets(&self) -> &[PresetConfig] {
        &self.config.presets
    }

    /// Sets a field from free-form text, validating and clamping it.
    pub fn set_input(&self, field: Field, text: &str) -> u32 {
        let value = parse_field(text);
        let mut inputs = lock(&self.inputs);
        inputs.set(field, value);
        self.bus.show(Surface::TimerPreview, inputs.preview());
        value
    }

    /// Steps a field by `delta` and announces the new value.
    pub fn adjust_input(&self, field: Field, delta: i32) -> u32 {
        let mut inputs = lock(&self.inputs);
        let value = inputs.adjust(field, delta);
        self.bus.show(Surface::TimerPreview, inputs.preview());
        drop(inputs);
        self.bus
            .announce(format!("{} set to {}", field, value), Politeness::Polite);
        value
    }

    /// Loads the preset at `index`. Returns `None` for an unknown index.
    pub fn apply_preset(&self, index: usize) -> Option<&PresetConfig> {
        let preset = self.config.presets.get(index)?;
        let mut inputs = lock(&self.inputs);
        inputs.apply_preset(preset);
        self.bus.show(Surface::TimerPreview, inputs.preview());
        let (minutes, seconds) = (inputs.minutes(), inputs.seconds());
        drop(inputs);
        self.bus.announce(
            format!(
                "Timer preset selected: {} minutes and {} seconds",
                minutes, seconds
            ),
            Politeness::Polite,
        );
        Some(preset)
    }

    /// Starts or resumes the countdown from the current inputs.
    pub fn start_countdown(&self) -> Result<(), CountdownError> {
        let inputs = self.inputs();
        self.countdown
            .start(inputs.minutes(), inputs.seconds())
            .inspect_err(|error| warn!("Countdown not started: {}", error))
    }

    /// Clears the countdown and zeroes its inputs.
    pub fn clear_countdown(&self) {
        self.countdown.clear();
        let mut inputs = lock(&self.inputs);
        *inputs = TimerInputs::default();
        self.bus.show(Surface::TimerPreview, inputs.preview());
    }
}

// Accessors and subscriptions.
impl TimepieceEngine {
    pub fn config(&self) -> &TimepieceConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &Arc<dyn Scheduler> {
        &self.scheduler
    }

    pub fn clock_face(&self) -> &ClockFace {
        &self.clock_face
    }

    pub fn stopwatch(&self) -> &StopwatchEngine {
        &self.stopwatch
    }

    pub fn countdown(&self) -> &CountdownEngine {
        &self.countdown
    }

    pub fn stopwatch_controls(&self) -> StopwatchControls {
        self.stopwatch.controls()
    }

    pub fn countdown_controls(&self) -> CountdownControls {
        self.countdown.controls(self.inputs().has_time_set())
    }

    /// Subscribes to the `DisplayEvent` stream.
    pub fn subscribe_display_events(&self) -> broadcast::Receiver<DisplayEvent> {
        self.bus.subscribe_display_events()
    }

    /// Subscribes to the `Announcement` stream.
    pub fn subscribe_announcements(&self) -> broadcast::Receiver<Announcement> {
        self.bus.subscribe_announcements()
    }

    /// Subscribes to the `AlertEvent` stream.
    pub fn subscribe_alert_events(&self) -> broadcast::Receiver<AlertEvent> {
        self.bus.subscribe_alert_events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::countdown::CountdownPhase;
    use crate::events::drain;
    use crate::time::ManualScheduler;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn engine() -> (ManualScheduler, TimepieceEngine) {
        let scheduler = ManualScheduler::new();
        let engine = TimepieceEngine::new(TimepieceConfig::default(), Arc::new(scheduler.clone()));
        (scheduler, engine)
    }

    #[test]
    fn test_switch_mode_changes_visibility_only() {
        let (scheduler, engine) = engine();
        let mut alerts = engine.subscribe_alert_events();
        let mut announcements = engine.subscribe_announcements();

        engine.switch_mode(Mode::Stopwatch);
        engine.stopwatch().start();
        scheduler.advance(Duration::from_millis(500));
        engine.switch_mode(Mode::CountdownTimer);

        assert!(engine.is_visible(Mode::CountdownTimer));
        assert!(!engine.is_visible(Mode::Stopwatch));
        assert!(engine.stopwatch().is_running());
        assert_eq!(
            drain(&mut alerts),
            vec![
                AlertEvent::ModeChanged { mode: Mode::Stopwatch },
                AlertEvent::ModeChanged { mode: Mode::CountdownTimer },
            ]
        );
        assert!(drain(&mut announcements)
            .iter()
            .any(|a| a.message.starts_with("Countdown timer mode activated.")));
    }

    #[test]
    fn test_countdown_uses_inputs() {
        let (scheduler, engine) = engine();
        engine.set_input(Field::Minutes, "1");
        engine.set_input(Field::Seconds, "75");
        assert_eq!(engine.inputs(), TimerInputs::new(1, 59));

        engine.start_countdown().unwrap();
        assert_eq!(engine.countdown().remaining_seconds(), 119);
        scheduler.advance(Duration::from_secs(19));
        assert_eq!(engine.countdown().remaining_seconds(), 100);
    }

    #[test]
    fn test_start_countdown_without_time_fails() {
        let (_scheduler, engine) = engine();
        assert!(matches!(
            engine.start_countdown(),
            Err(CountdownError::InvalidDuration { .. })
        ));
        assert_eq!(engine.countdown().phase(), CountdownPhase::Idle);
    }

    #[test]
    fn test_presets_and_adjustments_announce() {
        let (_scheduler, engine) = engine();
        let mut announcements = engine.subscribe_announcements();

        let preset = engine.apply_preset(4).cloned();
        assert_eq!(preset.map(|p| p.label), Some("30 sec".to_string()));
        assert_eq!(engine.adjust_input(Field::Minutes, 1), 1);
        assert!(engine.apply_preset(99).is_none());

        let messages: Vec<String> = drain(&mut announcements)
            .into_iter()
            .map(|a| a.message)
            .collect();
        assert_eq!(
            messages,
            vec![
                "Timer preset selected: 0 minutes and 30 seconds",
                "minutes set to 1",
            ]
        );
        assert_eq!(engine.inputs().preview(), "01:30");
    }

    #[test]
    fn test_clear_countdown_resets_inputs() {
        let (_scheduler, engine) = engine();
        engine.apply_preset(0);
        engine.start_countdown().unwrap();
        engine.clear_countdown();
        assert_eq!(engine.inputs(), TimerInputs::default());
        assert_eq!(engine.countdown().phase(), CountdownPhase::Idle);
        assert!(!engine.countdown_controls().clear_enabled);
    }

    #[test]
    fn test_shutdown_cancels_all_callbacks() {
        let (scheduler, engine) = engine();
        engine.open();
        engine.stopwatch().start();
        engine.apply_preset(1);
        engine.start_countdown().unwrap();
        assert_eq!(scheduler.pending(), 3);

        engine.shutdown();
        assert_eq!(scheduler.pending(), 0);
        assert!(!engine.stopwatch().is_running());
        assert_eq!(engine.countdown().phase(), CountdownPhase::Paused);
    }
}

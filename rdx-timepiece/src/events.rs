//! Defines all public event types broadcast by the widget.
//!
//! The engines never render anything themselves. Every visible change is
//! published on the [`EventBus`] and a front end subscribes to the streams it
//! cares about: display updates, screen-reader announcements, and alerts.

use crate::common::Mode;
use std::time::Duration;
use tokio::sync::broadcast;

/// A named display area of the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    /// The real-time clock's time of day.
    Time,
    /// The real-time clock's calendar date.
    Date,
    /// The greeting shown under the clock.
    Greeting,
    /// The label of the 12/24-hour format toggle.
    FormatToggle,
    /// The stopwatch's running elapsed time.
    Elapsed,
    /// The stopwatch's list of recorded laps.
    LapList,
    /// The countdown's remaining time or status text.
    Countdown,
    /// The `MM:SS` preview of the countdown inputs.
    TimerPreview,
}

/// How urgently a screen reader should deliver a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Politeness {
    #[default]
    Polite,
    Assertive,
}

/// Updates pushed to display surfaces. The display is a write-only projection
/// of engine state; nothing ever reads it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    /// Replace the surface's text.
    Show { surface: Surface, text: String },
    /// Append an entry to a list surface.
    Append {
        surface: Surface,
        text: String,
        label: String,
    },
    /// Remove all content from a surface.
    Reset { surface: Surface },
    /// Change the live-region urgency of a surface.
    Urgency { surface: Surface, level: Politeness },
}

/// A human-readable status message for assistive technology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub message: String,
    pub politeness: Politeness,
}

/// Oscillator shape of an alarm tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Sawtooth,
}

/// One tone of the alarm pattern, offset from the moment the alarm fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tone {
    pub frequency_hz: u32,
    pub waveform: Waveform,
    pub start: Duration,
    pub duration: Duration,
}

const fn beep(start_ms: u64) -> Tone {
    Tone {
        frequency_hz: 1000,
        waveform: Waveform::Sine,
        start: Duration::from_millis(start_ms),
        duration: Duration::from_millis(100),
    }
}

/// Rapid beeps to grab attention, then a sustained sawtooth tone.
pub const ALARM_TONES: [Tone; 6] = [
    beep(0),
    beep(200),
    beep(400),
    beep(600),
    beep(800),
    Tone {
        frequency_hz: 440,
        waveform: Waveform::Sawtooth,
        start: Duration::from_millis(1200),
        duration: Duration::from_millis(2000),
    },
];

/// Events that concern the widget as a whole rather than one surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertEvent {
    /// Fired exactly once each time a countdown reaches its end.
    Alarm { tones: &'static [Tone] },
    /// Fired when the mode coordinator makes another surface visible.
    ModeChanged { mode: Mode },
    /// Fired once when the engine's `run` loop begins.
    EngineStarted,
    /// Fired once when the engine has cancelled all of its callbacks.
    EngineShutdown,
}

/// The set of broadcast channels the engines publish on.
///
/// Cloning the bus is cheap and every clone publishes to the same subscribers.
/// Sending never fails loudly: with no subscriber the event is dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    display_sender: broadcast::Sender<DisplayEvent>,
    announcement_sender: broadcast::Sender<Announcement>,
    alert_sender: broadcast::Sender<AlertEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        const CHANNEL_CAPACITY: usize = 256;
        let (display_sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (announcement_sender, _) = broadcast::channel(64);
        let (alert_sender, _) = broadcast::channel(64);
        Self {
            display_sender,
            announcement_sender,
            alert_sender,
        }
    }

    pub fn show(&self, surface: Surface, text: impl Into<String>) {
        self.display_sender
            .send(DisplayEvent::Show {
                surface,
                text: text.into(),
            })
            .ok();
    }

    pub fn append(&self, surface: Surface, text: impl Into<String>, label: impl Into<String>) {
        self.display_sender
            .send(DisplayEvent::Append {
                surface,
                text: text.into(),
                label: label.into(),
            })
            .ok();
    }

    pub fn reset(&self, surface: Surface) {
        self.display_sender.send(DisplayEvent::Reset { surface }).ok();
    }

    pub fn urgency(&self, surface: Surface, level: Politeness) {
        self.display_sender
            .send(DisplayEvent::Urgency { surface, level })
            .ok();
    }

    pub fn announce(&self, message: impl Into<String>, politeness: Politeness) {
        self.announcement_sender
            .send(Announcement {
                message: message.into(),
                politeness,
            })
            .ok();
    }

    pub fn alert(&self, event: AlertEvent) {
        self.alert_sender.send(event).ok();
    }

    /// Subscribes to the `DisplayEvent` stream.
    pub fn subscribe_display_events(&self) -> broadcast::Receiver<DisplayEvent> {
        self.display_sender.subscribe()
    }

    /// Subscribes to the `Announcement` stream.
    pub fn subscribe_announcements(&self) -> broadcast::Receiver<Announcement> {
        self.announcement_sender.subscribe()
    }

    /// Subscribes to the `AlertEvent` stream.
    pub fn subscribe_alert_events(&self) -> broadcast::Receiver<AlertEvent> {
        self.alert_sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Drains everything currently buffered in a receiver without waiting.
///
/// Lagged receivers skip the lost events and keep draining.
pub fn drain<T: Clone>(rx: &mut broadcast::Receiver<T>) -> Vec<T> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn alarm_pattern_ends_with_sustained_tone() {
        let last = ALARM_TONES[ALARM_TONES.len() - 1];
        assert_eq!(last.waveform, Waveform::Sawtooth);
        assert_eq!(last.start, Duration::from_millis(1200));
        assert_eq!(
            ALARM_TONES.iter().filter(|t| t.waveform == Waveform::Sine).count(),
            5
        );
    }

    #[test]
    fn bus_delivers_to_every_subscriber() {
        let bus = EventBus::new();
        let mut first = bus.subscribe_announcements();
        let mut second = bus.clone().subscribe_announcements();

        bus.announce("Stopwatch started", Politeness::Polite);

        let expected = vec![Announcement {
            message: "Stopwatch started".to_string(),
            politeness: Politeness::Polite,
        }];
        assert_eq!(drain(&mut first), expected);
        assert_eq!(drain(&mut second), expected);
    }

    #[test]
    fn sending_without_subscribers_is_silent() {
        let bus = EventBus::new();
        bus.show(Surface::Elapsed, "00:00´00´´000");
        bus.alert(AlertEvent::EngineStarted);
        let mut rx = bus.subscribe_display_events();
        assert!(drain(&mut rx).is_empty());
    }
}

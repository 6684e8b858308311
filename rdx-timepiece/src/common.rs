//! Contains common, primitive types shared by every part of the widget.
//!
//! This module defines the identifiers used to address scheduled callbacks and
//! the widget's display modes. Using distinct types improves type safety and
//! keeps the engines decoupled from the front end that drives them.

use serde::Deserialize;
use slotmap::new_key_type;
use std::fmt;
use std::str::FromStr;

new_key_type! {
    /// Uniquely and safely identifies a callback registered with a `Scheduler`.
    ///
    /// The handle is returned at schedule time and is the only way to cancel
    /// the callback. It is never reused, so a stale handle cancels nothing.
    pub struct ScheduleHandle;
}

/// One of the three mutually exclusive display modes of the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    RealTimeClock,
    Stopwatch,
    CountdownTimer,
}

impl Mode {
    /// All modes, in the order the selector lists them.
    pub const ALL: [Mode; 3] = [Mode::RealTimeClock, Mode::Stopwatch, Mode::CountdownTimer];

    /// The identifier used by the mode selector.
    pub fn id(self) -> &'static str {
        match self {
            Mode::RealTimeClock => "real-time-clock",
            Mode::Stopwatch => "stopwatch",
            Mode::CountdownTimer => "countdown-timer",
        }
    }

    /// A human-readable label for menus and prompts.
    pub fn label(self) -> &'static str {
        match self {
            Mode::RealTimeClock => "Real-time Clock",
            Mode::Stopwatch => "Stopwatch",
            Mode::CountdownTimer => "Countdown Timer",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Error returned when a mode identifier is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mode '{0}'")]
pub struct UnknownMode(pub String);

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "real-time-clock" | "clock" => Ok(Mode::RealTimeClock),
            "stopwatch" => Ok(Mode::Stopwatch),
            "countdown-timer" | "countdown" | "timer" => Ok(Mode::CountdownTimer),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn mode_parses_ids_and_aliases() {
        assert_eq!("real-time-clock".parse::<Mode>(), Ok(Mode::RealTimeClock));
        assert_eq!("clock".parse::<Mode>(), Ok(Mode::RealTimeClock));
        assert_eq!(" Stopwatch ".parse::<Mode>(), Ok(Mode::Stopwatch));
        assert_eq!("countdown".parse::<Mode>(), Ok(Mode::CountdownTimer));
        assert_eq!(
            "alarm".parse::<Mode>(),
            Err(UnknownMode("alarm".to_string()))
        );
    }

    #[test]
    fn mode_ids_round_trip_through_display() {
        for mode in Mode::ALL {
            assert_eq!(mode.to_string().parse::<Mode>(), Ok(mode));
        }
    }
}

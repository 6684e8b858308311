//! Defines all configuration structures for the widget.
//!
//! These structs are deserialized with `serde`, usually through
//! [`TimepieceConfig::load`], which layers an optional TOML file under
//! `TIMEPIECE__*` environment variables. Every field has a default, so an
//! empty file is a valid configuration.

use crate::common::Mode;
use anyhow::Context;
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// The top-level configuration for the `TimepieceEngine`.
#[derive(Debug, Clone, Deserialize)]
pub struct TimepieceConfig {
    /// How often the stopwatch display is refreshed while running.
    #[serde(default = "default_resolution")]
    pub resolution: ClockResolution,

    /// Countdown timing.
    #[serde(default)]
    pub countdown: CountdownConfig,

    /// Real-time clock presentation.
    #[serde(default)]
    pub clock: ClockConfig,

    /// The countdown presets offered to the user, in display order.
    #[serde(default = "default_presets")]
    pub presets: Vec<PresetConfig>,

    /// The mode that is visible at startup.
    #[serde(default = "default_start_mode")]
    pub start_mode: Mode,
}

/// Fastest frame rate a custom resolution may ask for.
pub const MAX_TICKS_PER_SECOND: u64 = 1000;

/// Defines the refresh rate of the stopwatch's frame updates.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockResolution {
    /// ~60 frames per second, a typical display refresh rate.
    High,
    /// ~30 frames per second.
    Medium,
    /// ~1 frame per second.
    Low,
    /// A user-defined speed in frames per second.
    Custom { ticks_per_second: u64 },
}

impl ClockResolution {
    pub fn ticks_per_second(&self) -> u64 {
        match self {
            ClockResolution::High => 60,
            ClockResolution::Medium => 30,
            ClockResolution::Low => 1,
            ClockResolution::Custom { ticks_per_second } => {
                (*ticks_per_second).clamp(1, MAX_TICKS_PER_SECOND)
            }
        }
    }

    /// The period between two frame updates.
    pub fn frame_period(&self) -> Duration {
        Duration::from_millis(1000) / self.ticks_per_second() as u32
    }
}

/// Timing settings of the countdown.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CountdownConfig {
    /// Period of one countdown tick.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// How long a validation error stays highlighted.
    #[serde(default = "default_error_display_ms")]
    pub error_display_ms: u64,
    /// Delay before the "Finished" display drops back to polite urgency.
    #[serde(default = "default_urgency_reset_ms")]
    pub urgency_reset_ms: u64,
}

impl CountdownConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    pub fn error_display(&self) -> Duration {
        Duration::from_millis(self.error_display_ms)
    }

    pub fn urgency_reset(&self) -> Duration {
        Duration::from_millis(self.urgency_reset_ms)
    }
}

/// Whether the real-time clock shows 12-hour or 24-hour time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum HourFormat {
    #[serde(rename = "12h")]
    Twelve,
    #[serde(rename = "24h")]
    TwentyFour,
}

/// Presentation settings of the real-time clock.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClockConfig {
    #[serde(default = "default_hour_format")]
    pub hour_format: HourFormat,

    /// An IANA Time Zone Database name (e.g., "Europe/Helsinki"). The host's
    /// local time is used when absent.
    #[serde(default)]
    pub timezone: Option<Tz>,
}

/// A one-click countdown duration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PresetConfig {
    pub label: String,
    #[serde(default)]
    pub minutes: u32,
    #[serde(default)]
    pub seconds: u32,
}

impl PresetConfig {
    pub fn new(label: &str, minutes: u32, seconds: u32) -> Self {
        Self {
            label: label.to_string(),
            minutes,
            seconds,
        }
    }
}

impl TimepieceConfig {
    /// Loads the configuration from an optional TOML file, then applies
    /// `TIMEPIECE__*` environment overrides (e.g. `TIMEPIECE__COUNTDOWN__TICK_MS`).
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder
            .add_source(config::Environment::with_prefix("TIMEPIECE").separator("__"))
            .build()
            .context("failed to assemble timepiece configuration")?
            .try_deserialize()
            .context("invalid timepiece configuration")
    }

    /// Parses a configuration from TOML text.
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()
            .context("failed to parse timepiece configuration")?
            .try_deserialize()
            .context("invalid timepiece configuration")
    }
}

// --- Default value functions for serde ---

fn default_resolution() -> ClockResolution {
    ClockResolution::High
}

fn default_tick_ms() -> u64 {
    1000
}

fn default_error_display_ms() -> u64 {
    3000
}

fn default_urgency_reset_ms() -> u64 {
    1000
}

fn default_hour_format() -> HourFormat {
    HourFormat::Twelve
}

fn default_presets() -> Vec<PresetConfig> {
    vec![
        PresetConfig::new("5 min", 5, 0),
        PresetConfig::new("10 min", 10, 0),
        PresetConfig::new("15 min", 15, 0),
        PresetConfig::new("30 min", 30, 0),
        PresetConfig::new("30 sec", 0, 30),
    ]
}

fn default_start_mode() -> Mode {
    Mode::RealTimeClock
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            error_display_ms: default_error_display_ms(),
            urgency_reset_ms: default_urgency_reset_ms(),
        }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            hour_format: default_hour_format(),
            timezone: None,
        }
    }
}

impl Default for TimepieceConfig {
    fn default() -> Self {
        Self {
            resolution: default_resolution(),
            countdown: CountdownConfig::default(),
            clock: ClockConfig::default(),
            presets: default_presets(),
            start_mode: default_start_mode(),
        }
    }
}

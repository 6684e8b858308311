//! The countdown's minutes/seconds inputs and presets.

use crate::config::PresetConfig;
use crate::format::format_mm_ss;
use std::fmt;
use std::str::FromStr;

/// Largest value either input field accepts.
pub const MAX_FIELD_VALUE: u32 = 59;

/// One of the two countdown input fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Minutes,
    Seconds,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Minutes => "minutes",
            Field::Seconds => "seconds",
        })
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "m" | "min" | "minutes" => Ok(Field::Minutes),
            "s" | "sec" | "seconds" => Ok(Field::Seconds),
            other => Err(format!("unknown field '{}'", other)),
        }
    }
}

/// Interprets free-form field text: blank or non-numeric text is 0, negative
/// values clamp to 0 and large values clamp to 59.
pub fn parse_field(text: &str) -> u32 {
    let text = text.trim();
    let digits_end = text
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map_or(text.len(), |(i, _)| i);
    match text[..digits_end].parse::<i64>() {
        Ok(value) => value.clamp(0, i64::from(MAX_FIELD_VALUE)) as u32,
        Err(_) => 0,
    }
}

/// Validated countdown inputs. Both fields always hold `0..=59`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerInputs {
    minutes: u32,
    seconds: u32,
}

impl TimerInputs {
    pub fn new(minutes: u32, seconds: u32) -> Self {
        Self {
            minutes: minutes.min(MAX_FIELD_VALUE),
            seconds: seconds.min(MAX_FIELD_VALUE),
        }
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    pub fn get(&self, field: Field) -> u32 {
        match field {
            Field::Minutes => self.minutes,
            Field::Seconds => self.seconds,
        }
    }

    pub fn set(&mut self, field: Field, value: u32) -> u32 {
        let value = value.min(MAX_FIELD_VALUE);
        match field {
            Field::Minutes => self.minutes = value,
            Field::Seconds => self.seconds = value,
        }
        value
    }

    /// Steps a field up or down, clamping at both ends. Returns the new value.
    pub fn adjust(&mut self, field: Field, delta: i32) -> u32 {
        let current = i64::from(self.get(field));
        let next = (current + i64::from(delta)).clamp(0, i64::from(MAX_FIELD_VALUE));
        self.set(field, next as u32)
    }

    pub fn apply_preset(&mut self, preset: &PresetConfig) {
        *self = Self::new(preset.minutes, preset.seconds);
    }

    pub fn has_time_set(&self) -> bool {
        self.minutes > 0 || self.seconds > 0
    }

    /// The inputs as `MM:SS`.
    pub fn preview(&self) -> String {
        format_mm_ss(u64::from(self.minutes) * 60 + u64::from(self.seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_field() {
        assert_eq!(parse_field(""), 0);
        assert_eq!(parse_field("abc"), 0);
        assert_eq!(parse_field("7"), 7);
        assert_eq!(parse_field(" 42 "), 42);
        assert_eq!(parse_field("75"), 59);
        assert_eq!(parse_field("-3"), 0);
        assert_eq!(parse_field("12abc"), 12);
    }

    #[test]
    fn test_adjust_clamps() {
        let mut inputs = TimerInputs::default();
        assert_eq!(inputs.adjust(Field::Minutes, -1), 0);
        assert_eq!(inputs.adjust(Field::Minutes, 1), 1);
        inputs.set(Field::Seconds, 59);
        assert_eq!(inputs.adjust(Field::Seconds, 1), 59);
        assert_eq!(inputs.preview(), "01:59");
    }

    #[test]
    fn test_presets_and_preview() {
        let mut inputs = TimerInputs::default();
        assert!(!inputs.has_time_set());
        inputs.apply_preset(&PresetConfig::new("30 sec", 0, 30));
        assert_eq!(inputs, TimerInputs::new(0, 30));
        assert_eq!(inputs.preview(), "00:30");
        assert!(inputs.has_time_set());

        inputs.apply_preset(&PresetConfig::new("90 min", 90, 0));
        assert_eq!(inputs.minutes(), 59);
    }

    #[test]
    fn test_field_names() {
        assert_eq!("min".parse::<Field>(), Ok(Field::Minutes));
        assert_eq!("S".parse::<Field>(), Ok(Field::Seconds));
        assert_eq!(Field::Minutes.to_string(), "minutes");
        assert!("hours".parse::<Field>().is_err());
    }
}

//! Pure formatting helpers shared by the stopwatch and the countdown.

use std::fmt;

/// Zero-pads `value` to at least `width` digits. Wider values are kept whole.
pub fn zero_pad(value: u64, width: usize) -> String {
    format!("{:0width$}", value, width = width)
}

/// Formats the sub-second part of a millisecond duration as three digits.
///
/// Only the `0..=999` remainder is rendered, never the raw duration.
pub fn millis_field(total_ms: u64) -> String {
    zero_pad(total_ms % 1000, 3)
}

/// Format whole seconds as "MM:SS" (for the countdown and the input preview).
pub fn format_mm_ss(total_secs: u64) -> String {
    format!("{}:{}", zero_pad(total_secs / 60, 2), zero_pad(total_secs % 60, 2))
}

/// A millisecond duration decomposed into zero-padded display components.
///
/// This is also the shape of a recorded lap: once built, the strings never
/// change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeParts {
    pub hours: String,
    pub minutes: String,
    pub seconds: String,
    pub milliseconds: String,
}

impl TimeParts {
    pub fn from_millis(total_ms: u64) -> Self {
        let total_secs = total_ms / 1000;
        Self {
            hours: zero_pad(total_secs / 3600, 2),
            minutes: zero_pad((total_secs / 60) % 60, 2),
            seconds: zero_pad(total_secs % 60, 2),
            milliseconds: millis_field(total_ms),
        }
    }
}

/// Renders as `HH:MM´SS´´MMM`, the stopwatch's display format.
impl fmt::Display for TimeParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}´{}´´{}",
            self.hours, self.minutes, self.seconds, self.milliseconds
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_zero_pad() {
        assert_eq!(zero_pad(7, 2), "07");
        assert_eq!(zero_pad(0, 2), "00");
        assert_eq!(zero_pad(42, 3), "042");
        assert_eq!(zero_pad(123, 2), "123");
    }

    #[test]
    fn test_millis_field_truncates_to_sub_second() {
        assert_eq!(millis_field(1234), "234");
        assert_eq!(millis_field(5), "005");
        assert_eq!(millis_field(61_000), "000");
    }

    #[test]
    fn test_format_mm_ss() {
        assert_eq!(format_mm_ss(0), "00:00");
        assert_eq!(format_mm_ss(65), "01:05");
        assert_eq!(format_mm_ss(59 * 60 + 59), "59:59");
        assert_eq!(format_mm_ss(3600), "60:00");
    }

    #[test]
    fn test_time_parts_decomposition() {
        let parts = TimeParts::from_millis(61_234);
        assert_eq!(parts.hours, "00");
        assert_eq!(parts.minutes, "01");
        assert_eq!(parts.seconds, "01");
        assert_eq!(parts.milliseconds, "234");
        assert_eq!(parts.to_string(), "00:01´01´´234");
    }

    #[test]
    fn test_time_parts_rolls_over_hours() {
        let parts = TimeParts::from_millis(3_661_007);
        assert_eq!(parts.to_string(), "01:01´01´´007");
        assert_eq!(TimeParts::from_millis(0).to_string(), "00:00´00´´000");
    }
}

//! Greeting text shown under the real-time clock.

/// Greetings for exact `HH:MM` wall-clock minutes. These win over the
/// time-of-day greetings below.
const SPECIAL_GREETINGS: &[(u32, u32, &str)] = &[
    (0, 0, "It's midnight!"),
    (1, 11, "Angel numbers<3"),
    (2, 22, "Angel numbers<3"),
    (3, 33, "Angel numbers<3"),
    (4, 3, "The clock is forbidden!"),
    (4, 4, "Clock is not found."),
    (4, 20, "It's a global Amsterdam time..."),
    (4, 44, "Angel numbers<3"),
    (5, 55, "Angel numbers<3"),
    (11, 11, "Angel numbers<3"),
    (12, 12, "Angel numbers<3"),
    (13, 13, "Angel numbers<3"),
    (14, 14, "Angel numbers<3"),
    (15, 15, "Angel numbers<3"),
    (16, 16, "Angel numbers<3"),
    (17, 17, "Angel numbers<3"),
    (18, 18, "Angel numbers<3"),
    (19, 19, "Angel numbers<3"),
    (20, 20, "Angel numbers<3"),
    (21, 21, "Angel numbers<3"),
    (22, 22, "Angel numbers<3"),
    (23, 23, "Angel numbers<3"),
];

/// Half-open hour ranges and their greeting.
const DAY_GREETINGS: &[(u32, u32, &str)] = &[
    (0, 5, "Good Night!"),
    (5, 11, "Good Morning!"),
    (11, 17, "Good Day!"),
    (17, 24, "Good Evening!"),
];

/// Looks up the greeting for a wall-clock time (`hour` in `0..24`).
pub fn greeting_for(hour: u32, minute: u32) -> &'static str {
    SPECIAL_GREETINGS
        .iter()
        .find(|(h, m, _)| *h == hour && *m == minute)
        .or_else(|| {
            DAY_GREETINGS
                .iter()
                .find(|(start, end, _)| (*start..*end).contains(&hour))
        })
        .map(|(_, _, message)| *message)
        .unwrap_or("Good Night!")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn special_minutes_take_precedence() {
        assert_eq!(greeting_for(0, 0), "It's midnight!");
        assert_eq!(greeting_for(4, 20), "It's a global Amsterdam time...");
        assert_eq!(greeting_for(11, 11), "Angel numbers<3");
        assert_eq!(greeting_for(4, 4), "Clock is not found.");
    }

    #[test]
    fn ranges_cover_the_whole_day() {
        assert_eq!(greeting_for(0, 1), "Good Night!");
        assert_eq!(greeting_for(4, 59), "Good Night!");
        assert_eq!(greeting_for(5, 0), "Good Morning!");
        assert_eq!(greeting_for(10, 59), "Good Morning!");
        assert_eq!(greeting_for(11, 0), "Good Day!");
        assert_eq!(greeting_for(17, 0), "Good Evening!");
        assert_eq!(greeting_for(23, 59), "Good Evening!");
    }
}

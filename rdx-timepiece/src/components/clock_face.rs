//! The real-time clock: time of day, date and greeting, refreshed every second.

use crate::common::ScheduleHandle;
use crate::config::{ClockConfig, HourFormat};
use crate::events::{EventBus, Politeness, Surface};
use crate::greeting::greeting_for;
use crate::time::{lock, Scheduler};
use chrono::{Datelike, Local, NaiveDateTime, Timelike, Utc};
use chrono_tz::Tz;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

/// One rendering of the clock's three surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockReading {
    pub time: String,
    pub date: String,
    pub greeting: &'static str,
}

impl ClockReading {
    pub fn at(now: NaiveDateTime, format: HourFormat) -> Self {
        let hours = now.hour();
        let time = match format {
            HourFormat::Twelve => {
                let period = if hours >= 12 { "PM" } else { "AM" };
                let display_hours = match hours {
                    0 => 12,
                    h if h > 12 => h - 12,
                    h => h,
                };
                format!(
                    "{:02}:{:02}:{:02} {}",
                    display_hours,
                    now.minute(),
                    now.second(),
                    period
                )
            }
            HourFormat::TwentyFour => {
                format!("{:02}:{:02}:{:02}", hours, now.minute(), now.second())
            }
        };
        Self {
            time,
            date: format!("{}/{:02}/{}", now.day(), now.month(), now.year()),
            greeting: greeting_for(hours, now.minute()),
        }
    }
}

/// Label of the format toggle for the format currently shown.
pub fn format_label(format: HourFormat) -> &'static str {
    match format {
        HourFormat::Twelve => "12H (AM/PM)",
        HourFormat::TwentyFour => "24H",
    }
}

#[derive(Debug)]
struct ClockFaceState {
    hour_format: HourFormat,
    tick: Option<ScheduleHandle>,
}

struct Shared {
    state: Mutex<ClockFaceState>,
    scheduler: Arc<dyn Scheduler>,
    bus: EventBus,
    timezone: Option<Tz>,
}

impl Shared {
    fn local_now(&self) -> NaiveDateTime {
        match self.timezone {
            Some(tz) => Utc::now().with_timezone(&tz).naive_local(),
            None => Local::now().naive_local(),
        }
    }

    fn refresh(&self) {
        let format = lock(&self.state).hour_format;
        let reading = ClockReading::at(self.local_now(), format);
        self.bus.show(Surface::Time, reading.time);
        self.bus.show(Surface::Date, reading.date);
        self.bus.show(Surface::Greeting, reading.greeting);
    }
}

/// Keeps the clock surfaces current while started.
#[derive(Clone)]
pub struct ClockFace {
    shared: Arc<Shared>,
}

impl ClockFace {
    pub fn new(scheduler: Arc<dyn Scheduler>, bus: EventBus, config: &ClockConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(ClockFaceState {
                    hour_format: config.hour_format,
                    tick: None,
                }),
                scheduler,
                bus,
                timezone: config.timezone,
            }),
        }
    }

    /// Renders immediately, then once per second.
    pub fn start(&self) {
        let shared = &self.shared;
        let mut state = lock(&shared.state);
        if state.tick.is_some() {
            debug!("Clock face already ticking.");
            return;
        }
        let weak = Arc::downgrade(shared);
        state.tick = Some(shared.scheduler.schedule_repeating(
            Duration::from_secs(1),
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.refresh();
                }
            }),
        ));
        let label = format_label(state.hour_format);
        drop(state);

        shared.bus.show(Surface::FormatToggle, label);
        shared.refresh();
    }

    pub fn stop(&self) {
        let shared = &self.shared;
        if let Some(tick) = lock(&shared.state).tick.take() {
            shared.scheduler.cancel(tick);
        }
    }

    /// Switches between 12-hour and 24-hour display and re-renders.
    pub fn toggle_format(&self) -> HourFormat {
        let shared = &self.shared;
        let format = {
            let mut state = lock(&shared.state);
            state.hour_format = match state.hour_format {
                HourFormat::Twelve => HourFormat::TwentyFour,
                HourFormat::TwentyFour => HourFormat::Twelve,
            };
            state.hour_format
        };
        info!(?format, "Clock format toggled.");

        shared.bus.show(Surface::FormatToggle, format_label(format));
        let message = match format {
            HourFormat::Twelve => "Switched to 12-hour format with AM/PM",
            HourFormat::TwentyFour => "Switched to 24-hour format",
        };
        shared.bus.announce(message, Politeness::Polite);
        shared.refresh();
        format
    }

    pub fn hour_format(&self) -> HourFormat {
        lock(&self.shared.state).hour_format
    }

    /// The clock as it reads right now.
    pub fn reading(&self) -> ClockReading {
        ClockReading::at(self.shared.local_now(), self.hour_format())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{drain, DisplayEvent};
    use crate::time::ManualScheduler;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .and_then(|d| d.and_hms_opt(h, m, s))
            .unwrap()
    }

    #[test]
    fn test_twelve_hour_rendering() {
        let reading = ClockReading::at(at(0, 5, 9), HourFormat::Twelve);
        assert_eq!(reading.time, "12:05:09 AM");
        assert_eq!(ClockReading::at(at(12, 0, 0), HourFormat::Twelve).time, "12:00:00 PM");
        assert_eq!(ClockReading::at(at(15, 30, 1), HourFormat::Twelve).time, "03:30:01 PM");
        assert_eq!(ClockReading::at(at(9, 1, 2), HourFormat::Twelve).time, "09:01:02 AM");
    }

    #[test]
    fn test_twenty_four_hour_rendering() {
        let reading = ClockReading::at(at(15, 30, 1), HourFormat::TwentyFour);
        assert_eq!(reading.time, "15:30:01");
        assert_eq!(reading.date, "7/03/2024");
        assert_eq!(reading.greeting, "Good Day!");
    }

    #[test]
    fn test_start_renders_and_ticks() {
        let scheduler = ManualScheduler::new();
        let bus = EventBus::new();
        let mut display = bus.subscribe_display_events();
        let face = ClockFace::new(Arc::new(scheduler.clone()), bus.clone(), &ClockConfig::default());

        face.start();
        face.start();
        scheduler.advance(Duration::from_secs(2));

        let times = drain(&mut display)
            .into_iter()
            .filter(|event| matches!(event, DisplayEvent::Show { surface: Surface::Time, .. }))
            .count();
        assert_eq!(times, 3);

        face.stop();
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_toggle_announces() {
        let scheduler = ManualScheduler::new();
        let bus = EventBus::new();
        let mut announcements = bus.subscribe_announcements();
        let face = ClockFace::new(Arc::new(scheduler), bus.clone(), &ClockConfig::default());

        assert_eq!(face.toggle_format(), HourFormat::TwentyFour);
        assert_eq!(face.toggle_format(), HourFormat::Twelve);
        let messages: Vec<String> = drain(&mut announcements)
            .into_iter()
            .map(|a| a.message)
            .collect();
        assert_eq!(
            messages,
            vec![
                "Switched to 24-hour format",
                "Switched to 12-hour format with AM/PM"
            ]
        );
    }
}

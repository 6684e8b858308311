//! # Timepiece
//!
//! The core of a three-mode time widget: a real-time clock with greetings, a
//! stopwatch with laps, and a countdown timer with presets.
//!
//! Timepiece owns the state and timing of the widget and nothing else. It
//! never renders; every visible change is published as an event for a front
//! end to draw.
//!
//! ## Core Concepts
//!
//! - **Scheduler**: the single source of time. Engines ask it to run their
//!   frame or tick callbacks and cancel them through the returned handle. The
//!   `TokioScheduler` is used in production, the `ManualScheduler` in tests.
//! - **Engines**: the `StopwatchEngine` and `CountdownEngine` are independent
//!   state machines. Calls that do not fit the current state are ignored.
//! - **Event-Driven**: display updates, announcements and alerts are broadcast
//!   on an `EventBus`. Front ends subscribe to the streams they need.
//! - **Configuration-Driven**: frame rate, tick period, clock format and
//!   presets come from a `TimepieceConfig`, often loaded from a TOML file.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use timepiece::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // 1. Create the engine on the current tokio runtime.
//!     let engine = TimepieceEngine::with_tokio(TimepieceConfig::default());
//!
//!     // 2. Subscribe to an event stream before starting anything.
//!     let mut announcements = engine.subscribe_announcements();
//!     tokio::spawn(async move {
//!         while let Ok(announcement) = announcements.recv().await {
//!             println!("{}", announcement.message);
//!         }
//!     });
//!
//!     // 3. Drive the widget.
//!     engine.switch_mode(Mode::Stopwatch);
//!     engine.stopwatch().start();
//!
//!     // 4. Run until Ctrl+C.
//!     engine.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub const ENGINE_NAME: &str = "Timepiece";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Declare all the modules in the crate.
pub mod common;
pub mod components;
pub mod config;
pub mod engine;
pub mod events;
pub mod format;
pub mod greeting;
pub mod shortcuts;
pub mod time;

/// A prelude module for easy importing of the most common Timepiece types.
pub mod prelude {
    pub use crate::common::{Mode, ScheduleHandle};
    pub use crate::components::countdown::{CountdownError, CountdownPhase};
    pub use crate::components::inputs::{Field, TimerInputs};
    pub use crate::config::{ClockResolution, HourFormat, TimepieceConfig};
    pub use crate::engine::TimepieceEngine;
    pub use crate::events::{AlertEvent, Announcement, DisplayEvent, Politeness, Surface};
    pub use crate::shortcuts::Key;
    pub use crate::time::{ManualScheduler, Scheduler, TokioScheduler};
}

//! Contains the building blocks the engine composes.
//!
//! Each component owns its own state and schedules its own callbacks through
//! the shared `Scheduler`. The `TimepieceEngine` wires them to one event bus
//! and decides which of them is visible.

pub mod clock_face;
pub mod countdown;
pub mod inputs;
pub mod stopwatch;

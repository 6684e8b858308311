//! Keyboard shortcuts, routed to the same entry points as the controls.

use crate::common::Mode;
use crate::components::countdown::CountdownError;
use crate::components::inputs::Field;
use crate::engine::TimepieceEngine;
use tracing::debug;

/// A key the widget reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Pauses whatever is running, in any mode.
    Escape,
    /// Starts or stops the engine of the visible mode.
    Space,
    /// Increments the focused countdown input.
    ArrowUp(Field),
    /// Decrements the focused countdown input.
    ArrowDown(Field),
}

impl TimepieceEngine {
    /// Dispatches a key press. Space only presses controls that are enabled,
    /// so with no time set it does nothing in countdown mode.
    pub fn handle_key(&self, key: Key) -> Result<(), CountdownError> {
        debug!(?key, "Key pressed.");
        match key {
            Key::Escape => {
                if self.countdown().is_running() {
                    self.countdown().stop();
                }
                if self.stopwatch().is_running() {
                    self.stopwatch().stop();
                }
            }
            Key::Space => match self.mode() {
                Mode::Stopwatch => {
                    let controls = self.stopwatch_controls();
                    if controls.start_enabled {
                        self.stopwatch().start();
                    } else if controls.stop_enabled {
                        self.stopwatch().stop();
                    }
                }
                Mode::CountdownTimer => {
                    let controls = self.countdown_controls();
                    if controls.start_enabled {
                        return self.start_countdown();
                    } else if controls.stop_enabled {
                        self.countdown().stop();
                    }
                }
                Mode::RealTimeClock => {}
            },
            Key::ArrowUp(field) => {
                self.adjust_input(field, 1);
            }
            Key::ArrowDown(field) => {
                self.adjust_input(field, -1);
            }
        }
        Ok(())
    }
}

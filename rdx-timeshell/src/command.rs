//! Parsing of shell input lines into commands.

use anyhow::{anyhow, bail, Result};
use timepiece::prelude::*;

/// One line of shell input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Mode(Mode),
    /// Start, Stop, Lap and Clear act on the visible mode.
    Start,
    Stop,
    Lap,
    Clear,
    Set(Field, String),
    Adjust(Field, i32),
    Preset(usize),
    Presets,
    Format,
    Key(Key),
    Status,
    Laps,
    Show,
    Watch(bool),
    Help,
    Exit,
    Empty,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self> {
        let args: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, rest)) = args.split_first() else {
            return Ok(Command::Empty);
        };
        let command = match (command, rest) {
            ("mode", [mode]) => Command::Mode(mode.parse()?),
            ("mode", _) => bail!("Usage: mode <clock|stopwatch|countdown>"),
            ("start", []) => Command::Start,
            ("stop", []) => Command::Stop,
            ("lap", []) => Command::Lap,
            ("clear", []) => Command::Clear,
            ("set", [field, value]) => Command::Set(field_arg(field)?, value.to_string()),
            ("set", _) => bail!("Usage: set <min|sec> <VALUE>"),
            ("adjust", [field, delta]) => {
                let delta = delta
                    .parse::<i32>()
                    .map_err(|_| anyhow!("'{}' is not a whole number.", delta))?;
                Command::Adjust(field_arg(field)?, delta)
            }
            ("adjust", _) => bail!("Usage: adjust <min|sec> <+N|-N>"),
            ("preset", [index]) => Command::Preset(
                index
                    .parse::<usize>()
                    .map_err(|_| anyhow!("Preset must be a number (e.g., '0', '1')."))?,
            ),
            ("preset", _) => bail!("Usage: preset <INDEX>"),
            ("presets", []) => Command::Presets,
            ("format", []) => Command::Format,
            ("key", [name, field @ ..]) => Command::Key(key_arg(name, field)?),
            ("key", _) => bail!("Usage: key <space|esc|up|down> [min|sec]"),
            ("status", []) => Command::Status,
            ("laps", []) => Command::Laps,
            ("show", []) => Command::Show,
            ("watch", ["on"]) => Command::Watch(true),
            ("watch", ["off"]) => Command::Watch(false),
            ("watch", _) => bail!("Usage: watch <on|off>"),
            ("help", _) => Command::Help,
            ("exit" | "quit", []) => Command::Exit,
            _ => bail!("Unknown command: '{}'. Type 'help'.", line.trim()),
        };
        Ok(command)
    }
}

fn field_arg(text: &str) -> Result<Field> {
    text.parse::<Field>()
        .map_err(|_| anyhow!("'{}' is not a field. Use 'min' or 'sec'.", text))
}

fn key_arg(name: &str, field: &[&str]) -> Result<Key> {
    let key = match (name, field) {
        ("space", []) => Key::Space,
        ("esc" | "escape", []) => Key::Escape,
        ("up", [field]) => Key::ArrowUp(field_arg(field)?),
        ("down", [field]) => Key::ArrowDown(field_arg(field)?),
        ("up" | "down", _) => bail!("Arrow keys need a field: key {} <min|sec>", name),
        _ => bail!("Unknown key: '{}'.", name),
    };
    Ok(key)
}

pub const HELP: &[(&str, &str)] = &[
    ("mode <M>", "Shows clock, stopwatch or countdown."),
    ("start | stop", "Starts or pauses the visible timer."),
    ("lap", "Records a stopwatch lap."),
    ("clear", "Resets the visible timer."),
    ("set <F> <V>", "Sets a countdown field (min or sec)."),
    ("adjust <F> <N>", "Steps a countdown field by N."),
    ("preset <I> | presets", "Applies or lists countdown presets."),
    ("format", "Toggles 12/24-hour clock format."),
    ("key <K> [F]", "Presses space, esc, up or down."),
    ("status | laps | show", "Prints engine state, laps, or surfaces."),
    ("watch on|off", "Streams display updates as they happen."),
    ("exit", "Quits the shell."),
];

mod command;

use anyhow::Result;
use colored::Colorize;
use command::{Command, HELP};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::Editor;
use rustyline_derive::{Completer, Helper, Hinter, Validator};
use std::borrow::Cow;
use std::collections::HashMap;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use timepiece::events::{DisplayEvent, Tone};
use timepiece::prelude::*;
use timepiece::{ENGINE_NAME, VERSION as LIB_VERSION};
use tracing::info;
use tracing_subscriber::EnvFilter;

const SHELL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Surfaces in the order `show` prints them.
const SURFACES: [(Surface, &str); 8] = [
    (Surface::Time, "time"),
    (Surface::Date, "date"),
    (Surface::Greeting, "greeting"),
    (Surface::FormatToggle, "format"),
    (Surface::Elapsed, "elapsed"),
    (Surface::LapList, "laps"),
    (Surface::Countdown, "countdown"),
    (Surface::TimerPreview, "preview"),
];

/// A custom helper struct for rustyline that enables syntax highlighting.
#[derive(Completer, Helper, Hinter, Validator)]
struct ShellHighlighter;

impl Highlighter for ShellHighlighter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if let Some((command, rest)) = line.split_once(' ') {
            Cow::Owned(format!("{} {}", command.yellow().bold(), rest.yellow()))
        } else {
            Cow::Owned(line.yellow().bold().to_string())
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

/// The shell's copy of what each surface currently shows.
#[derive(Default)]
struct SurfaceBoard {
    text: HashMap<Surface, String>,
    lists: HashMap<Surface, Vec<String>>,
}

impl SurfaceBoard {
    fn apply(&mut self, event: &DisplayEvent) {
        match event {
            DisplayEvent::Show { surface, text } => {
                self.text.insert(*surface, text.clone());
            }
            DisplayEvent::Append { surface, label, .. } => {
                self.lists.entry(*surface).or_default().push(label.clone());
            }
            DisplayEvent::Reset { surface } => {
                self.text.remove(surface);
                self.lists.remove(surface);
            }
            DisplayEvent::Urgency { .. } => {}
        }
    }
}

fn board(board: &Mutex<SurfaceBoard>) -> MutexGuard<'_, SurfaceBoard> {
    board.lock().unwrap_or_else(PoisonError::into_inner)
}

fn print_banner() {
    if env::var("QUIET_MODE").is_ok() {
        return;
    }
    let rule = "-".repeat(79);
    println!("{}", format!("  {} :: clock / stopwatch / countdown", ENGINE_NAME).cyan().bold());
    println!("{}", rule.dimmed());
    println!(
        "          Shell   v{:<8} Library   v{:<8}",
        SHELL_VERSION, LIB_VERSION
    );
    let license_blurb = "
    This software is provided 'as is', without warranty of any kind.
    Distributed under the MIT OR Apache-2.0 license. Use at your own risk.
    ";
    println!("{}", license_blurb.dimmed());
    println!("{}", rule.dimmed());
}

/// Spawns several tasks, each subscribing to a different event stream from the engine.
fn spawn_event_listeners(
    engine: &TimepieceEngine,
    surfaces: Arc<Mutex<SurfaceBoard>>,
    is_watching: Arc<AtomicBool>,
) {
    // Display listener: always records, prints only while watching.
    let mut display_rx = engine.subscribe_display_events();
    tokio::spawn(async move {
        while let Ok(event) = display_rx.recv().await {
            board(&surfaces).apply(&event);
            if !is_watching.load(Ordering::Relaxed) {
                continue;
            }
            match &event {
                // Frame-rate redraws would drown the prompt.
                DisplayEvent::Show {
                    surface: Surface::Elapsed,
                    ..
                } => {}
                DisplayEvent::Show { surface, text } => {
                    println!("<-- [DISPLAY] {:?}: {}", surface, text)
                }
                other => println!("<-- [DISPLAY] {:?}", other),
            }
        }
    });

    let mut announcement_rx = engine.subscribe_announcements();
    tokio::spawn(async move {
        while let Ok(announcement) = announcement_rx.recv().await {
            let message = match announcement.politeness {
                Politeness::Polite => announcement.message.green(),
                Politeness::Assertive => announcement.message.red().bold(),
            };
            println!("<-- {}", message);
        }
    });

    let mut alert_rx = engine.subscribe_alert_events();
    tokio::spawn(async move {
        while let Ok(event) = alert_rx.recv().await {
            match event {
                AlertEvent::Alarm { tones } => {
                    tokio::spawn(ring(tones));
                }
                other => info!("[ALERT] => {:?}", other),
            }
        }
    });
}

/// Plays the alarm pattern on the terminal bell.
async fn ring(tones: &'static [Tone]) {
    let origin = tokio::time::Instant::now();
    for tone in tones {
        tokio::time::sleep_until(origin + tone.start).await;
        print!("\x07");
        let _ = std::io::stdout().flush();
    }
    println!("{}", "<-- [ALARM] Time is over!".red().bold());
}

fn print_status(engine: &TimepieceEngine) {
    let stopwatch = engine.stopwatch_controls();
    let countdown = engine.countdown_controls();
    println!("Mode:       {}", engine.mode().label().cyan());
    println!(
        "Clock:      {}  ({:?})",
        engine.clock_face().reading().time,
        engine.clock_face().hour_format()
    );
    println!(
        "Stopwatch:  {} ms, running: {}, laps: {}  [{} | lap: {} | stop: {} | clear: {}]",
        engine.stopwatch().elapsed_ms(),
        engine.stopwatch().is_running(),
        engine.stopwatch().laps().len(),
        stopwatch.start_label,
        stopwatch.lap_enabled,
        stopwatch.stop_enabled,
        stopwatch.clear_enabled,
    );
    println!(
        "Countdown:  {:?}, {} s left, inputs {}  [{}: {} | stop: {} | clear: {}]",
        engine.countdown().phase(),
        engine.countdown().remaining_seconds(),
        engine.inputs().preview(),
        countdown.start_label,
        countdown.start_enabled,
        countdown.stop_enabled,
        countdown.clear_enabled,
    );
}

/// Executes one parsed command. Returns `false` when the shell should exit.
fn execute(
    engine: &TimepieceEngine,
    command: Command,
    surfaces: &Mutex<SurfaceBoard>,
    is_watching: &AtomicBool,
) -> bool {
    match command {
        Command::Mode(mode) => engine.switch_mode(mode),
        Command::Start => match engine.mode() {
            Mode::Stopwatch => engine.stopwatch().start(),
            Mode::CountdownTimer => {
                if let Err(error) = engine.start_countdown() {
                    println!("Error: {}", error);
                }
            }
            Mode::RealTimeClock => println!("Nothing to start in clock mode."),
        },
        Command::Stop => match engine.mode() {
            Mode::Stopwatch => engine.stopwatch().stop(),
            Mode::CountdownTimer => engine.countdown().stop(),
            Mode::RealTimeClock => println!("Nothing to stop in clock mode."),
        },
        Command::Lap => {
            if engine.stopwatch().record_lap().is_none() {
                println!("--> The stopwatch is not running.");
            }
        }
        Command::Clear => match engine.mode() {
            Mode::Stopwatch => engine.stopwatch().clear(),
            Mode::CountdownTimer => engine.clear_countdown(),
            Mode::RealTimeClock => println!("Nothing to clear in clock mode."),
        },
        Command::Set(field, value) => {
            let value = engine.set_input(field, &value);
            println!("--> {} = {}", field, value);
        }
        Command::Adjust(field, delta) => {
            engine.adjust_input(field, delta);
        }
        Command::Preset(index) => {
            if engine.apply_preset(index).is_none() {
                println!("Error: No preset #{}. Use 'presets' to list them.", index);
            }
        }
        Command::Presets => {
            println!("Presets:");
            for (index, preset) in engine.presets().iter().enumerate() {
                println!(
                    "  #{}: {:<10} {:02}:{:02}",
                    index, preset.label, preset.minutes, preset.seconds
                );
            }
        }
        Command::Format => {
            engine.clock_face().toggle_format();
        }
        Command::Key(key) => {
            if let Err(error) = engine.handle_key(key) {
                println!("Error: {}", error);
            }
        }
        Command::Status => print_status(engine),
        Command::Laps => {
            let laps = engine.stopwatch().laps();
            if laps.is_empty() {
                println!("No laps recorded.");
            }
            for (number, lap) in laps.iter().enumerate() {
                println!("  Lap {:>2}: {}", number + 1, lap);
            }
        }
        Command::Show => {
            let surfaces = board(surfaces);
            for (surface, name) in SURFACES {
                if let Some(text) = surfaces.text.get(&surface) {
                    println!("  {:<10} {}", name.dimmed(), text);
                }
                for entry in surfaces.lists.get(&surface).into_iter().flatten() {
                    println!("  {:<10} {}", name.dimmed(), entry);
                }
            }
        }
        Command::Watch(on) => {
            is_watching.store(on, Ordering::Relaxed);
            let state = if on { "Started" } else { "Stopped" };
            println!("--> {} streaming display updates.", state);
        }
        Command::Help => {
            println!("Available commands:");
            for (usage, description) in HELP {
                println!("  {:<22}- {}", usage, description);
            }
        }
        Command::Exit => return false,
        Command::Empty => {}
    }
    true
}

#[tokio::main]
async fn main() -> Result<()> {
    print_banner();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let path = env::args().nth(1).map(PathBuf::from);
    let config = TimepieceConfig::load(path.as_deref())?;
    let engine = TimepieceEngine::with_tokio(config);

    let surfaces = Arc::new(Mutex::new(SurfaceBoard::default()));
    let is_watching = Arc::new(AtomicBool::new(false));
    spawn_event_listeners(&engine, surfaces.clone(), is_watching.clone());

    info!("Opening {}...", ENGINE_NAME.cyan());
    engine.open();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut rl = Editor::new()?;
    rl.set_helper(Some(ShellHighlighter));

    println!(
        "{} is running. Type 'help' for commands or 'exit' to quit.",
        ENGINE_NAME.cyan()
    );

    loop {
        let prompt = format!("{}", ">> ".cyan().bold());
        match rl.readline(&prompt) {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                match Command::parse(&line) {
                    Ok(command) => {
                        if !execute(&engine, command, &surfaces, &is_watching) {
                            break;
                        }
                    }
                    Err(error) => println!("{}", error),
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(error) => {
                println!("Error: {}", error);
                break;
            }
        }
    }

    println!("Exiting timeshell...");
    engine.shutdown();
    Ok(())
}

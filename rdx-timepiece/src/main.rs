use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;
use timepiece::events::DisplayEvent;
use timepiece::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize structured logging. RUST_LOG overrides the default level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // 2. Load the configuration, from a file if one was given.
    let path = std::env::args().nth(1).map(PathBuf::from);
    let config = TimepieceConfig::load(path.as_deref())?;
    info!(resolution = ?config.resolution, start_mode = %config.start_mode, "Configuration loaded.");

    // 3. Create the TimepieceEngine instance.
    let engine = TimepieceEngine::with_tokio(config);

    // 4. Spawn concurrent tasks to listen to the different event streams.
    spawn_event_listeners(&engine);

    // 5. Drive the widget through a short scripted session.
    let script = engine.clone();
    tokio::spawn(async move {
        run_demo_script(&script).await;
    });

    // 6. Run the engine.
    engine.run().await?;

    Ok(())
}

/// Spawns several tasks, each subscribing to a different event stream from the engine.
fn spawn_event_listeners(engine: &TimepieceEngine) {
    let mut display_rx = engine.subscribe_display_events();
    tokio::spawn(async move {
        while let Ok(event) = display_rx.recv().await {
            match event {
                // The stopwatch redraws every frame; only log the slower surfaces.
                DisplayEvent::Show {
                    surface: Surface::Elapsed,
                    ..
                } => {}
                other => info!("[DISPLAY] => {:?}", other),
            }
        }
    });

    let mut announcement_rx = engine.subscribe_announcements();
    tokio::spawn(async move {
        while let Ok(announcement) = announcement_rx.recv().await {
            let message = match announcement.politeness {
                Politeness::Polite => announcement.message.cyan(),
                Politeness::Assertive => announcement.message.red().bold(),
            };
            info!("[ANNOUNCE] => {}", message);
        }
    });

    let mut alert_rx = engine.subscribe_alert_events();
    tokio::spawn(async move {
        while let Ok(event) = alert_rx.recv().await {
            info!("[ALERT] => {:?}", event);
        }
    });
}

/// Exercises each mode once so every event stream has something to show.
async fn run_demo_script(engine: &TimepieceEngine) {
    tokio::time::sleep(Duration::from_secs(2)).await;
    engine.clock_face().toggle_format();

    engine.switch_mode(Mode::Stopwatch);
    engine.stopwatch().start();
    for _ in 0..3 {
        tokio::time::sleep(Duration::from_millis(750)).await;
        if let Some(lap) = engine.stopwatch().record_lap() {
            info!("[DEMO] Lap recorded at {}", lap.to_string().green());
        }
    }
    engine.stopwatch().stop();

    // Starting with empty inputs is rejected and shown on the countdown.
    engine.switch_mode(Mode::CountdownTimer);
    if let Err(error) = engine.start_countdown() {
        info!("[DEMO] Countdown rejected as expected: {}", error);
    }
    engine.set_input(Field::Seconds, "3");
    if let Err(error) = engine.start_countdown() {
        info!("[DEMO] Countdown failed to start: {}", error);
    }
}

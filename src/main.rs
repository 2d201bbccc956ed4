use log::{LevelFilter, debug, error, info};
use std::collections::HashSet;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tapsync::config::{self, CONFIG_INI_PATH};
use tapsync::core::feedback::LogSink;
use tapsync::{
    Engine, EngineHandle, GestureType, MonotonicClock, NoteView, Resolution, TransportMode,
};

const POLL_INTERVAL: Duration = Duration::from_millis(5);
const SWIPE_LENGTH: f64 = 200.0;

fn main() -> Result<(), Box<dyn Error>> {
    // --- Logging Setup ---
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .filter_module("tapsync::core::transport", LevelFilter::Info)
        .filter_module("tapsync::core::feedback", LevelFilter::Info)
        .init();

    info!("tapsync starting...");

    if let Err(e) = config::load(Path::new(CONFIG_INI_PATH)) {
        error!("Failed to load configuration: {}", e);
        return Err(e.into());
    }
    let config = config::get();
    let (level, style) = (config.start_level, config.style);

    let seed = chrono::Local::now().timestamp_millis().unsigned_abs();
    let clock = Arc::new(MonotonicClock::new());
    let engine = Engine::spawn(config, clock, Box::new(LogSink), seed, TransportMode::Realtime)?;
    engine.start_game(level, style)?;

    if let Err(e) = autoplay(&engine) {
        error!("Autoplay aborted: {}", e);
        return Err(e.into());
    }

    match engine.result()? {
        Some(result) => println!("{}", serde_json::to_string_pretty(&result)?),
        None => error!("Session ended without a result."),
    }

    engine.shutdown()?;
    info!("tapsync exited gracefully.");
    Ok(())
}

/// Plays the running session: performs each note's gesture as it reaches the
/// target zone, until the session ends. Double taps are left to expire: their
/// first tap would be judged as a plain tap.
fn autoplay(engine: &EngineHandle) -> tapsync::Result<()> {
    let mut played: HashSet<u64> = HashSet::new();
    loop {
        let snapshot = engine.snapshot()?;
        if snapshot.game_over {
            return Ok(());
        }

        for note in &snapshot.notes {
            if !should_play(note, snapshot.travel_time_ms) || !played.insert(note.id) {
                continue;
            }
            debug!("Autoplay: note {} ({}) at age {:.0}ms", note.id, note.gesture, note.age_ms);
            perform(engine, note.gesture)?;
        }

        thread::sleep(POLL_INTERVAL);
    }
}

fn should_play(note: &NoteView, travel_time_ms: f64) -> bool {
    note.resolution == Resolution::Pending
        && note.gesture != GestureType::DoubleTap
        && note.age_ms >= travel_time_ms
}

fn perform(engine: &EngineHandle, gesture: GestureType) -> tapsync::Result<()> {
    let (dx, dy) = match gesture {
        GestureType::Tap | GestureType::DoubleTap => (0.0, 0.0),
        GestureType::SwipeLeft => (-SWIPE_LENGTH, 0.0),
        GestureType::SwipeRight => (SWIPE_LENGTH, 0.0),
        GestureType::SwipeUp => (0.0, -SWIPE_LENGTH),
        GestureType::SwipeDown => (0.0, SWIPE_LENGTH),
    };
    engine.press_start(0.0, 0.0)?;
    engine.press_end(dx, dy)
}

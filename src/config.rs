use crate::error::{Error, Result};
use crate::game::note::GestureType;
use crate::game::style::MusicStyle;
use configparser::ini::Ini;
use log::{info, warn};
use once_cell::sync::Lazy;
use std::fmt::Display;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

pub const CONFIG_INI_PATH: &str = "save/tapsync.ini";

// Session
pub const SESSION_DURATION_MS: f64 = 45_000.0;
pub const TAP_TOLERANCE_MS: f64 = 200.0;
pub const NOTE_TRAVEL_TIME_MS: f64 = 3_500.0;
pub const MISS_GRACE_MS: f64 = 200.0;
pub const CLEANUP_AFTER_TRAVEL_MS: f64 = 1_000.0;
pub const SWEEP_PERIOD_MS: u64 = 50;

// Judgment
pub const PERFECT_WINDOW_MS: f64 = 50.0;
pub const GOOD_WINDOW_MS: f64 = 100.0;
pub const PERFECT_POINTS: u64 = 100;
pub const GOOD_POINTS: u64 = 50;
pub const LATE_POINTS: u64 = 25;
pub const COMBO_STEP: u32 = 5;

// Tempo
pub const TICKS_PER_BEAT: u32 = 2; // eighth notes

// Levels
pub const SPAWN_INTERVALS: [u32; 3] = [8, 6, 4];
const LEVEL_1_GESTURES: [GestureType; 1] = [GestureType::Tap];
const LEVEL_2_GESTURES: [GestureType; 3] = [
    GestureType::Tap,
    GestureType::SwipeLeft,
    GestureType::SwipeRight,
];

// Input
pub const TAP_MAX_DISTANCE: f64 = 50.0;
pub const DOUBLE_TAP_WINDOW_MS: f64 = 300.0;

/// Gestures the spawner may draw from at `level`. Level 0 counts as level 1.
pub fn gestures_for_level(level: u32) -> &'static [GestureType] {
    match level {
        0 | 1 => &LEVEL_1_GESTURES,
        2 => &LEVEL_2_GESTURES,
        _ => &GestureType::ALL,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleChoice {
    Fixed(MusicStyle),
    Random,
}

impl Default for StyleChoice {
    fn default() -> Self {
        StyleChoice::Fixed(MusicStyle::default())
    }
}

impl FromStr for StyleChoice {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("random") {
            return Ok(StyleChoice::Random);
        }
        s.parse::<MusicStyle>().map(StyleChoice::Fixed)
    }
}

impl std::fmt::Display for StyleChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StyleChoice::Fixed(style) => write!(f, "{}", style),
            StyleChoice::Random => f.write_str("random"),
        }
    }
}

/// Everything the INI file can set. Session-independent.
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub session_duration_ms: f64,
    pub tap_tolerance_ms: f64,
    pub travel_time_ms: f64,
    pub miss_grace_ms: f64,
    pub cleanup_after_travel_ms: f64,
    pub sweep_period_ms: u64,
    pub ticks_per_beat: u32,
    pub style: StyleChoice,
    pub start_level: u32,
    pub spawn_intervals: Vec<u32>,
    pub tap_max_distance: f64,
    pub double_tap_window_ms: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            session_duration_ms: SESSION_DURATION_MS,
            tap_tolerance_ms: TAP_TOLERANCE_MS,
            travel_time_ms: NOTE_TRAVEL_TIME_MS,
            miss_grace_ms: MISS_GRACE_MS,
            cleanup_after_travel_ms: CLEANUP_AFTER_TRAVEL_MS,
            sweep_period_ms: SWEEP_PERIOD_MS,
            ticks_per_beat: TICKS_PER_BEAT,
            style: StyleChoice::default(),
            start_level: 1,
            spawn_intervals: SPAWN_INTERVALS.to_vec(),
            tap_max_distance: TAP_MAX_DISTANCE,
            double_tap_window_ms: DOUBLE_TAP_WINDOW_MS,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("DurationMs", self.session_duration_ms),
            ("TapToleranceMs", self.tap_tolerance_ms),
            ("TravelTimeMs", self.travel_time_ms),
            ("CleanupAfterMs", self.cleanup_after_travel_ms),
            ("TapDistance", self.tap_max_distance),
        ];
        for (key, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::Config(format!(
                    "{} must be a positive number, got {}",
                    key, value
                )));
            }
        }
        if !self.miss_grace_ms.is_finite() || self.miss_grace_ms < 0.0 {
            return Err(Error::Config(format!(
                "MissGraceMs must not be negative, got {}",
                self.miss_grace_ms
            )));
        }
        if !self.double_tap_window_ms.is_finite() || self.double_tap_window_ms < 0.0 {
            return Err(Error::Config(format!(
                "DoubleTapWindowMs must not be negative, got {}",
                self.double_tap_window_ms
            )));
        }
        if self.cleanup_after_travel_ms <= self.miss_grace_ms {
            return Err(Error::Config(format!(
                "CleanupAfterMs ({}) must exceed MissGraceMs ({})",
                self.cleanup_after_travel_ms, self.miss_grace_ms
            )));
        }
        if self.sweep_period_ms == 0 {
            return Err(Error::Config("SweepPeriodMs must be at least 1".to_string()));
        }
        if self.ticks_per_beat == 0 {
            return Err(Error::Config("TicksPerBeat must be at least 1".to_string()));
        }
        if self.spawn_intervals.is_empty() || self.spawn_intervals.contains(&0) {
            return Err(Error::Config(format!(
                "SpawnIntervals must list positive tick counts, got {:?}",
                self.spawn_intervals
            )));
        }
        Ok(())
    }

    /// Spawn interval in ticks for `level`; the last entry covers every higher level.
    pub fn spawn_interval_for_level(&self, level: u32) -> u32 {
        let idx = (level.max(1) - 1) as usize;
        self.spawn_intervals
            .get(idx)
            .or_else(|| self.spawn_intervals.last())
            .copied()
            .unwrap_or(SPAWN_INTERVALS[SPAWN_INTERVALS.len() - 1])
    }

    /// Freezes the values one session runs with.
    pub fn session_config(&self, level: u32, style: MusicStyle) -> SessionConfig {
        let level = level.max(1);
        SessionConfig {
            level,
            style,
            duration_ms: self.session_duration_ms,
            tap_tolerance_ms: self.tap_tolerance_ms,
            travel_time_ms: self.travel_time_ms,
            miss_grace_ms: self.miss_grace_ms,
            cleanup_age_ms: self.travel_time_ms + self.cleanup_after_travel_ms,
            sweep_period_ms: self.sweep_period_ms,
            ticks_per_beat: self.ticks_per_beat,
            spawn_interval: self.spawn_interval_for_level(level),
            tap_max_distance: self.tap_max_distance,
            double_tap_window_ms: self.double_tap_window_ms,
        }
    }
}

/// Immutable per-session parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub level: u32,
    pub style: MusicStyle,
    pub duration_ms: f64,
    pub tap_tolerance_ms: f64,
    pub travel_time_ms: f64,
    pub miss_grace_ms: f64,
    /// Age past which any note is evicted from the live set.
    pub cleanup_age_ms: f64,
    pub sweep_period_ms: u64,
    pub ticks_per_beat: u32,
    pub spawn_interval: u32,
    pub tap_max_distance: f64,
    pub double_tap_window_ms: f64,
}

impl SessionConfig {
    #[inline(always)]
    pub fn miss_threshold_ms(&self) -> f64 {
        self.travel_time_ms + self.miss_grace_ms
    }

    /// Milliseconds between scheduler ticks at this session's tempo.
    pub fn tick_period_ms(&self) -> f64 {
        60_000.0 / self.style.bpm() / self.ticks_per_beat as f64
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        GameConfig::default().session_config(1, MusicStyle::default())
    }
}

// --- INI loading ---

static CONFIG: Lazy<Mutex<GameConfig>> = Lazy::new(|| Mutex::new(GameConfig::default()));

fn write_default_file(path: &Path) -> Result<()> {
    info!("Config file not found, creating defaults at '{}'.", path.display());
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }

    let defaults = GameConfig::default();
    let intervals = defaults
        .spawn_intervals
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",");

    let mut conf = Ini::new();
    conf.set("Session", "DurationMs", Some(defaults.session_duration_ms.to_string()));
    conf.set("Session", "TapToleranceMs", Some(defaults.tap_tolerance_ms.to_string()));
    conf.set("Session", "TravelTimeMs", Some(defaults.travel_time_ms.to_string()));
    conf.set("Session", "MissGraceMs", Some(defaults.miss_grace_ms.to_string()));
    conf.set("Session", "CleanupAfterMs", Some(defaults.cleanup_after_travel_ms.to_string()));
    conf.set("Session", "SweepPeriodMs", Some(defaults.sweep_period_ms.to_string()));
    conf.set("Tempo", "TicksPerBeat", Some(defaults.ticks_per_beat.to_string()));
    conf.set("Tempo", "Style", Some(defaults.style.to_string()));
    conf.set("Levels", "StartLevel", Some(defaults.start_level.to_string()));
    conf.set("Levels", "SpawnIntervals", Some(intervals));
    conf.set("Input", "TapDistance", Some(defaults.tap_max_distance.to_string()));
    conf.set("Input", "DoubleTapWindowMs", Some(defaults.double_tap_window_ms.to_string()));
    conf.write(path)?;
    Ok(())
}

fn read_value<T>(conf: &Ini, section: &str, key: &str, default: T) -> T
where
    T: FromStr + Display,
{
    match conf.get(section, key) {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                warn!("[{}] {} = '{}' is invalid, using {}.", section, key, raw, default);
                default
            }
        },
        None => default,
    }
}

fn parse_intervals(raw: &str) -> std::result::Result<Vec<u32>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u32>().map_err(|_| format!("'{}' is not a tick count", s)))
        .collect()
}

/// Parses a config from INI text. Unknown or malformed values fall back to defaults.
pub fn parse(conf: &Ini) -> Result<GameConfig> {
    let d = GameConfig::default();

    let spawn_intervals = match conf.get("Levels", "SpawnIntervals") {
        Some(raw) => match parse_intervals(&raw) {
            Ok(v) if !v.is_empty() => v,
            Ok(_) => d.spawn_intervals.clone(),
            Err(e) => {
                warn!("[Levels] SpawnIntervals: {}, using defaults.", e);
                d.spawn_intervals.clone()
            }
        },
        None => d.spawn_intervals.clone(),
    };

    let config = GameConfig {
        session_duration_ms: read_value(conf, "Session", "DurationMs", d.session_duration_ms),
        tap_tolerance_ms: read_value(conf, "Session", "TapToleranceMs", d.tap_tolerance_ms),
        travel_time_ms: read_value(conf, "Session", "TravelTimeMs", d.travel_time_ms),
        miss_grace_ms: read_value(conf, "Session", "MissGraceMs", d.miss_grace_ms),
        cleanup_after_travel_ms: read_value(
            conf,
            "Session",
            "CleanupAfterMs",
            d.cleanup_after_travel_ms,
        ),
        sweep_period_ms: read_value(conf, "Session", "SweepPeriodMs", d.sweep_period_ms),
        ticks_per_beat: read_value(conf, "Tempo", "TicksPerBeat", d.ticks_per_beat),
        style: read_value(conf, "Tempo", "Style", d.style),
        start_level: read_value(conf, "Levels", "StartLevel", d.start_level),
        spawn_intervals,
        tap_max_distance: read_value(conf, "Input", "TapDistance", d.tap_max_distance),
        double_tap_window_ms: read_value(
            conf,
            "Input",
            "DoubleTapWindowMs",
            d.double_tap_window_ms,
        ),
    };
    config.validate()?;
    Ok(config)
}

/// Loads `path` (creating it with defaults if absent) and installs the result
/// as the global config.
pub fn load(path: &Path) -> Result<GameConfig> {
    if !path.exists() {
        if let Err(e) = write_default_file(path) {
            warn!("Failed to create default config file: {}", e);
        }
    }

    let mut conf = Ini::new();
    let config = match conf.load(path) {
        Ok(_) => parse(&conf)?,
        Err(e) => {
            warn!("Failed to load '{}' ({}), using defaults.", path.display(), e);
            GameConfig::default()
        }
    };

    info!(
        "Config loaded: duration {}ms, tolerance {}ms, travel {}ms, style {}, level {}",
        config.session_duration_ms,
        config.tap_tolerance_ms,
        config.travel_time_ms,
        config.style,
        config.start_level
    );
    *CONFIG.lock().map_err(|_| Error::Poisoned("config"))? = config.clone();
    Ok(config)
}

/// Returns a copy of the currently installed config.
pub fn get() -> GameConfig {
    match CONFIG.lock() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

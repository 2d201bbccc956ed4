use crate::config::SessionConfig;
use crate::core::feedback::Feedback;
use crate::game::gesture::GestureClassifier;
use crate::game::judgment::{self, Judgment};
use crate::game::note::Note;
use crate::game::scores;
use crate::game::spawner::Spawner;
use crate::game::style::beat_cue;
use crate::game::sweep;
use log::{debug, info, warn};
use rand::Rng;
use rand::rngs::StdRng;
use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Playing,
    Ended,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EndReason {
    /// The configured session duration elapsed.
    Duration,
    Stopped,
}

/// The aggregate game record. Only the spawner, the matcher and the sweeper
/// write to score, combo and notes.
#[derive(Clone, Debug)]
pub struct Session {
    pub(crate) config: SessionConfig,
    pub(crate) phase: Phase,
    pub(crate) end_reason: Option<EndReason>,
    pub(crate) started_at: f64,
    pub(crate) ended_at: Option<f64>,
    pub(crate) ticks: u64,

    pub(crate) score: u64,
    pub(crate) combo: u32,
    pub(crate) max_combo: u32,
    pub(crate) perfect_hits: u32,
    pub(crate) good_hits: u32,
    pub(crate) missed_hits: u32,

    pub(crate) notes: Vec<Note>,
    pub(crate) last_judgment: Option<Judgment>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            phase: Phase::Idle,
            end_reason: None,
            started_at: 0.0,
            ended_at: None,
            ticks: 0,
            score: 0,
            combo: 0,
            max_combo: 0,
            perfect_hits: 0,
            good_hits: 0,
            missed_hits: 0,
            notes: Vec::new(),
            last_judgment: None,
        }
    }

    /// `Idle -> Playing`. Returns false from any other phase.
    pub(crate) fn begin(&mut self, now: f64) -> bool {
        if self.phase != Phase::Idle {
            return false;
        }
        *self = Session::new(self.config.clone());
        self.phase = Phase::Playing;
        self.started_at = now;
        true
    }

    /// `Playing -> Ended`. Returns false if the session was not playing.
    pub(crate) fn finish(&mut self, reason: EndReason, now: f64) -> bool {
        if self.phase != Phase::Playing {
            return false;
        }
        self.phase = Phase::Ended;
        self.end_reason = Some(reason);
        self.ended_at = Some(now);
        true
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
    pub fn phase(&self) -> Phase {
        self.phase
    }
    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Playing
    }
    pub fn is_over(&self) -> bool {
        self.phase == Phase::Ended
    }
    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }
    pub fn started_at(&self) -> f64 {
        self.started_at
    }
    pub fn ended_at(&self) -> Option<f64> {
        self.ended_at
    }
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
    pub fn score(&self) -> u64 {
        self.score
    }
    pub fn combo(&self) -> u32 {
        self.combo
    }
    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }
    pub fn perfect_hits(&self) -> u32 {
        self.perfect_hits
    }
    pub fn good_hits(&self) -> u32 {
        self.good_hits
    }
    pub fn missed_hits(&self) -> u32 {
        self.missed_hits
    }
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }
    pub fn last_judgment(&self) -> Option<&Judgment> {
        self.last_judgment.as_ref()
    }

    pub fn accuracy(&self) -> u32 {
        scores::accuracy(self.perfect_hits, self.good_hits, self.missed_hits)
    }

    /// Milliseconds since start, frozen at the end time once the session ends.
    pub fn elapsed(&self, now: f64) -> f64 {
        match self.phase {
            Phase::Idle => 0.0,
            Phase::Playing => (now - self.started_at).max(0.0),
            Phase::Ended => (self.ended_at.unwrap_or(now) - self.started_at).max(0.0),
        }
    }
}

/// Everything that can happen to a session.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum GameEvent {
    Tick { tick: u64, now: f64 },
    PressStart { x: f64, y: f64 },
    PressEnd { x: f64, y: f64, now: f64 },
    Sweep { now: f64 },
    Stop { now: f64 },
}

/// One session together with the spawner and classifier that feed it.
/// `handle` is the only way events reach the session.
pub struct Game<R: Rng = StdRng> {
    session: Session,
    spawner: Spawner<R>,
    classifier: GestureClassifier,
}

impl Game<StdRng> {
    pub fn seeded(config: SessionConfig, seed: u64) -> Self {
        let spawner = Spawner::seeded(seed, config.level, config.spawn_interval);
        Self::with_spawner(config, spawner)
    }
}

impl<R: Rng> Game<R> {
    pub fn new(config: SessionConfig, rng: R) -> Self {
        let spawner = Spawner::new(rng, config.level, config.spawn_interval);
        Self::with_spawner(config, spawner)
    }

    fn with_spawner(config: SessionConfig, spawner: Spawner<R>) -> Self {
        let classifier =
            GestureClassifier::new(config.tap_max_distance, config.double_tap_window_ms);
        Self {
            session: Session::new(config),
            spawner,
            classifier,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn start(&mut self, now: f64) -> bool {
        if !self.session.begin(now) {
            warn!("Ignoring start: session is {:?}", self.session.phase);
            return false;
        }
        self.classifier.reset();
        info!(
            "Session started: level {}, style {} ({} BPM), {}s",
            self.session.config.level,
            self.session.config.style,
            self.session.config.style.bpm(),
            self.session.config.duration_ms / 1000.0
        );
        true
    }

    /// Applies one event and returns the feedback it produced. Events outside
    /// `Playing` change nothing.
    pub fn handle(&mut self, event: GameEvent) -> Vec<Feedback> {
        if !self.session.is_playing() {
            debug!("Dropping {:?} while {:?}", event, self.session.phase);
            return Vec::new();
        }

        match event {
            GameEvent::Tick { tick, now } => self.on_tick(tick, now),
            GameEvent::PressStart { x, y } => {
                self.classifier.press_start(x, y);
                Vec::new()
            }
            GameEvent::PressEnd { x, y, now } => {
                let gesture = self.classifier.press_end(x, y, now);
                match judgment::judge_input(&mut self.session, gesture, now) {
                    Judgment::Hit { grade, .. } => vec![Feedback::Hit(grade)],
                    Judgment::Miss { cause, .. } => vec![Feedback::Miss(cause)],
                }
            }
            GameEvent::Sweep { now } => {
                let report = sweep::sweep(&mut self.session, now);
                if report.newly_missed > 0 {
                    vec![Feedback::Expired(report.newly_missed)]
                } else {
                    Vec::new()
                }
            }
            GameEvent::Stop { now } => self.end(EndReason::Stopped, now),
        }
    }

    fn on_tick(&mut self, tick: u64, now: f64) -> Vec<Feedback> {
        self.session.ticks = self.session.ticks.max(tick + 1);

        if now - self.session.started_at >= self.session.config.duration_ms {
            return self.end(EndReason::Duration, now);
        }

        if let Some(note) = self.spawner.on_tick(tick, now) {
            debug!("Spawned note {} ({}) at {:.0}ms", note.id, note.gesture, now);
            self.session.notes.push(note);
        }
        vec![Feedback::Beat(beat_cue(tick, self.session.config.ticks_per_beat))]
    }

    fn end(&mut self, reason: EndReason, now: f64) -> Vec<Feedback> {
        if !self.session.finish(reason, now) {
            return Vec::new();
        }
        info!(
            "Session ended ({:?}): score {}, max combo {}, accuracy {}%",
            reason,
            self.session.score,
            self.session.max_combo,
            self.session.accuracy()
        );
        vec![Feedback::SessionEnded(reason)]
    }
}

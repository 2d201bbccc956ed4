use crate::game::judgment::Judgment;
use crate::game::note::{GestureType, Note, Resolution};
use crate::game::session::{EndReason, Phase, Session};
use crate::game::style::MusicStyle;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteView {
    pub id: u64,
    pub gesture: GestureType,
    pub resolution: Resolution,
    pub age_ms: f64,
    /// 0 at spawn, 1 at the target zone. Clamped.
    pub progress: f64,
    /// Time since the note was hit or missed, for fading it out.
    pub since_resolved_ms: Option<f64>,
}

impl NoteView {
    fn from_note(note: &Note, now: f64, travel_time_ms: f64) -> Self {
        let age_ms = note.age(now);
        let progress = if travel_time_ms > 0.0 {
            (age_ms / travel_time_ms).clamp(0.0, 1.0)
        } else {
            1.0
        };
        Self {
            id: note.id,
            gesture: note.gesture,
            resolution: note.resolution(),
            age_ms,
            progress,
            since_resolved_ms: note.resolved_at().map(|at| (now - at).max(0.0)),
        }
    }
}

/// Read-only view of a session for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub is_playing: bool,
    pub game_over: bool,
    pub end_reason: Option<EndReason>,
    pub level: u32,
    pub style: MusicStyle,
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub perfect_hits: u32,
    pub good_hits: u32,
    pub missed_hits: u32,
    pub accuracy: u32,
    pub elapsed_ms: f64,
    pub remaining_ms: f64,
    pub travel_time_ms: f64,
    pub notes: Vec<NoteView>,
    pub last_judgment: Option<Judgment>,
}

impl SessionSnapshot {
    pub fn capture(session: &Session, now: f64) -> Self {
        let config = session.config();
        let elapsed_ms = session.elapsed(now);
        let remaining_ms = match session.phase() {
            Phase::Playing => (config.duration_ms - elapsed_ms).max(0.0),
            Phase::Idle => config.duration_ms,
            Phase::Ended => 0.0,
        };
        // Ended sessions keep showing the notes as they were at the end.
        let view_time = session.ended_at().unwrap_or(now);

        Self {
            phase: session.phase(),
            is_playing: session.is_playing(),
            game_over: session.is_over(),
            end_reason: session.end_reason(),
            level: config.level,
            style: config.style,
            score: session.score(),
            combo: session.combo(),
            max_combo: session.max_combo(),
            perfect_hits: session.perfect_hits(),
            good_hits: session.good_hits(),
            missed_hits: session.missed_hits(),
            accuracy: session.accuracy(),
            elapsed_ms,
            remaining_ms,
            travel_time_ms: config.travel_time_ms,
            notes: session
                .notes()
                .iter()
                .map(|n| NoteView::from_note(n, view_time, config.travel_time_ms))
                .collect(),
            last_judgment: session.last_judgment().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::game::session::{Game, GameEvent};

    #[test]
    fn idle_snapshot_shows_full_time_remaining() {
        let session = Session::new(SessionConfig::default());
        let snap = SessionSnapshot::capture(&session, 1234.0);
        assert_eq!(snap.phase, Phase::Idle);
        assert!(!snap.is_playing && !snap.game_over);
        assert_eq!(snap.remaining_ms, 45_000.0);
        assert_eq!(snap.accuracy, 100);
    }

    #[test]
    fn note_progress_is_clamped() {
        let mut game = Game::seeded(SessionConfig::default(), 1);
        game.start(0.0);
        game.handle(GameEvent::Tick { tick: 0, now: 0.0 });

        let snap = SessionSnapshot::capture(game.session(), 1750.0);
        assert_eq!(snap.notes.len(), 1);
        assert!((snap.notes[0].progress - 0.5).abs() < 1e-9);
        assert_eq!(snap.remaining_ms, 45_000.0 - 1750.0);

        let snap = SessionSnapshot::capture(game.session(), 4000.0);
        assert_eq!(snap.notes[0].progress, 1.0);
    }

    #[test]
    fn resolved_notes_report_time_since_resolution() {
        let mut game = Game::seeded(SessionConfig::default(), 1);
        game.start(0.0);
        game.handle(GameEvent::Tick { tick: 0, now: 0.0 });

        let snap = SessionSnapshot::capture(game.session(), 3000.0);
        assert_eq!(snap.notes[0].since_resolved_ms, None);

        game.handle(GameEvent::PressStart { x: 0.0, y: 0.0 });
        game.handle(GameEvent::PressEnd { x: 0.0, y: 0.0, now: 3520.0 });
        let snap = SessionSnapshot::capture(game.session(), 3820.0);
        assert_eq!(snap.notes[0].resolution, Resolution::Hit);
        assert_eq!(snap.notes[0].since_resolved_ms, Some(300.0));
    }

    #[test]
    fn ended_snapshot_is_frozen() {
        let mut game = Game::seeded(SessionConfig::default(), 1);
        game.start(0.0);
        game.handle(GameEvent::Tick { tick: 0, now: 0.0 });
        game.handle(GameEvent::Stop { now: 1000.0 });

        let a = SessionSnapshot::capture(game.session(), 2000.0);
        let b = SessionSnapshot::capture(game.session(), 9000.0);
        assert_eq!(a, b);
        assert!(a.game_over);
        assert_eq!(a.elapsed_ms, 1000.0);
        assert_eq!(a.end_reason, Some(EndReason::Stopped));
    }

    #[test]
    fn serializes_to_json() {
        let session = Session::new(SessionConfig::default());
        let snap = SessionSnapshot::capture(&session, 0.0);
        let json = serde_json::to_value(snap).expect("serializes");
        assert_eq!(json["phase"], "idle");
        assert_eq!(json["style"], "classic");
        assert_eq!(json["notes"].as_array().map(Vec::len), Some(0));
    }
}

use crate::game::session::{EndReason, Session};
use crate::game::style::MusicStyle;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;

// --- Rank Definitions ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Rank {
    S,
    A,
    B,
    C,
    D,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Rank::S => "S",
            Rank::A => "A",
            Rank::B => "B",
            Rank::C => "C",
            Rank::D => "D",
        };
        f.write_str(letter)
    }
}

/// Percentage of judged notes that were hit, rounded to the nearest integer.
/// 100 when nothing has been judged yet.
pub fn accuracy(perfect_hits: u32, good_hits: u32, missed_hits: u32) -> u32 {
    let hits = u64::from(perfect_hits) + u64::from(good_hits);
    let judged = hits + u64::from(missed_hits);
    if judged == 0 {
        return 100;
    }
    (100.0 * hits as f64 / judged as f64).round() as u32
}

pub fn accuracy_to_rank(accuracy: u32) -> Rank {
    if accuracy >= 95 { Rank::S }
    else if accuracy >= 85 { Rank::A }
    else if accuracy >= 70 { Rank::B }
    else if accuracy >= 50 { Rank::C }
    else { Rank::D }
}

/// Final tally of an ended session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionResult {
    pub score: u64,
    pub max_combo: u32,
    pub perfect_hits: u32,
    pub good_hits: u32,
    pub missed_hits: u32,
    pub accuracy: u32,
    pub rank: Rank,
    pub level: u32,
    pub style: MusicStyle,
    pub end_reason: Option<EndReason>,
    pub duration_ms: f64,
    /// RFC 3339 wall-clock time the result was taken.
    pub finished_at: String,
}

impl SessionResult {
    pub fn from_session(session: &Session, finished_at: DateTime<Local>) -> Self {
        let accuracy = session.accuracy();
        let duration_ms = session
            .ended_at()
            .map_or(0.0, |end| (end - session.started_at()).max(0.0));
        Self {
            score: session.score(),
            max_combo: session.max_combo(),
            perfect_hits: session.perfect_hits(),
            good_hits: session.good_hits(),
            missed_hits: session.missed_hits(),
            accuracy,
            rank: accuracy_to_rank(accuracy),
            level: session.config().level,
            style: session.config().style,
            end_reason: session.end_reason(),
            duration_ms,
            finished_at: finished_at.to_rfc3339(),
        }
    }
}

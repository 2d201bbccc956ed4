use crate::config::{
    COMBO_STEP, GOOD_POINTS, GOOD_WINDOW_MS, LATE_POINTS, PERFECT_POINTS, PERFECT_WINDOW_MS,
};
use crate::game::note::{GestureType, Note, Resolution};
use crate::game::session::Session;
use log::{debug, info};
use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimingGrade {
    Perfect,
    Good,
}

impl TimingGrade {
    pub fn from_timing_diff(timing_diff_ms: f64) -> Self {
        if timing_diff_ms < PERFECT_WINDOW_MS {
            TimingGrade::Perfect
        } else {
            TimingGrade::Good
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "cause", rename_all = "kebab-case")]
pub enum MissCause {
    /// No pending note of the performed gesture is live.
    NoCandidate,
    /// The closest matching note is outside the tolerance window. It stays pending.
    OutsideTolerance { note_id: u64, timing_diff_ms: f64 },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Judgment {
    Hit {
        note_id: u64,
        gesture: GestureType,
        grade: TimingGrade,
        timing_diff_ms: f64,
        points: u64,
        combo: u32,
    },
    Miss {
        gesture: GestureType,
        cause: MissCause,
    },
}

impl Judgment {
    pub fn is_hit(&self) -> bool {
        matches!(self, Judgment::Hit { .. })
    }
}

/// Points before the combo multiplier.
pub fn base_points_for(timing_diff_ms: f64) -> u64 {
    if timing_diff_ms < PERFECT_WINDOW_MS {
        PERFECT_POINTS
    } else if timing_diff_ms < GOOD_WINDOW_MS {
        GOOD_POINTS
    } else {
        LATE_POINTS
    }
}

/// Multiplier for a hit that brings the combo to `combo`.
pub fn combo_multiplier(combo: u32) -> u64 {
    u64::from(combo / COMBO_STEP) + 1
}

/// Distance between a note's arrival at the target and `now`.
#[inline(always)]
pub fn timing_diff(note: &Note, now: f64, travel_time_ms: f64) -> f64 {
    (note.age(now) - travel_time_ms).abs()
}

/// Index and timing difference of the pending `gesture` note closest to its
/// target arrival. Ties keep the earliest-spawned note.
pub fn closest_pending(
    notes: &[Note],
    gesture: GestureType,
    now: f64,
    travel_time_ms: f64,
) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, note) in notes.iter().enumerate() {
        if note.gesture != gesture || !note.is_pending() {
            continue;
        }
        let diff = timing_diff(note, now, travel_time_ms);
        match best {
            Some((_, best_diff)) if diff >= best_diff => {}
            _ => best = Some((idx, diff)),
        }
    }
    best
}

/// Judges one classified gesture against the live notes. Never fails: both
/// "nothing to hit" and "too far off" are misses that reset the combo and
/// leave score, counters and notes alone.
pub fn judge_input(session: &mut Session, gesture: GestureType, now: f64) -> Judgment {
    let travel = session.config.travel_time_ms;
    let tolerance = session.config.tap_tolerance_ms;

    let judgment = match closest_pending(&session.notes, gesture, now, travel) {
        None => {
            session.combo = 0;
            info!("MISS ({}): no pending note of that gesture", gesture);
            Judgment::Miss {
                gesture,
                cause: MissCause::NoCandidate,
            }
        }
        Some((idx, diff)) if diff <= tolerance => {
            let grade = TimingGrade::from_timing_diff(diff);
            let combo = session.combo.saturating_add(1);
            let points = base_points_for(diff) * combo_multiplier(combo);

            session.score = session.score.saturating_add(points);
            session.combo = combo;
            session.max_combo = session.max_combo.max(combo);
            match grade {
                TimingGrade::Perfect => {
                    session.perfect_hits = session.perfect_hits.saturating_add(1)
                }
                TimingGrade::Good => session.good_hits = session.good_hits.saturating_add(1),
            }

            let note = &mut session.notes[idx];
            note.resolve(Resolution::Hit, now);
            info!(
                "HIT: note {} ({}), timing {:.1}ms, {:?}, +{} pts, combo {}",
                note.id, gesture, diff, grade, points, combo
            );
            Judgment::Hit {
                note_id: note.id,
                gesture,
                grade,
                timing_diff_ms: diff,
                points,
                combo,
            }
        }
        Some((idx, diff)) => {
            session.combo = 0;
            let note_id = session.notes[idx].id;
            info!(
                "MISS ({}): closest note {} is {:.1}ms off (tolerance {:.0}ms)",
                gesture, note_id, diff, tolerance
            );
            Judgment::Miss {
                gesture,
                cause: MissCause::OutsideTolerance {
                    note_id,
                    timing_diff_ms: diff,
                },
            }
        }
    };

    debug!(
        "Score {}, combo {}/{}, perfect {}, good {}",
        session.score, session.combo, session.max_combo, session.perfect_hits, session.good_hits
    );
    session.last_judgment = Some(judgment.clone());
    judgment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;

    fn playing_session() -> Session {
        let mut session = Session::new(SessionConfig::default());
        session.begin(0.0);
        session
    }

    fn push(session: &mut Session, id: u64, spawn_time: f64, gesture: GestureType) {
        session.notes.push(Note::new(id, spawn_time, gesture));
    }

    #[test]
    fn base_points_by_window() {
        assert_eq!(base_points_for(0.0), 100);
        assert_eq!(base_points_for(49.9), 100);
        assert_eq!(base_points_for(50.0), 50);
        assert_eq!(base_points_for(99.9), 50);
        assert_eq!(base_points_for(100.0), 25);
        assert_eq!(base_points_for(200.0), 25);
    }

    #[test]
    fn multiplier_steps_every_five() {
        assert_eq!(combo_multiplier(1), 1);
        assert_eq!(combo_multiplier(4), 1);
        assert_eq!(combo_multiplier(5), 2);
        assert_eq!(combo_multiplier(9), 2);
        assert_eq!(combo_multiplier(10), 3);
    }

    #[test]
    fn closest_pending_prefers_first_on_ties() {
        let notes = vec![
            Note::new(0, 0.0, GestureType::Tap),
            Note::new(1, 200.0, GestureType::Tap),
        ];
        // At t=3600 both notes are 100ms from their target.
        assert_eq!(closest_pending(&notes, GestureType::Tap, 3600.0, 3500.0), Some((0, 100.0)));
    }

    #[test]
    fn closest_pending_skips_other_gestures_and_resolved_notes() {
        let mut notes = vec![
            Note::new(0, 0.0, GestureType::Tap),
            Note::new(1, 0.0, GestureType::SwipeUp),
            Note::new(2, 300.0, GestureType::Tap),
        ];
        notes[0].resolve(Resolution::Hit, 3500.0);
        assert_eq!(closest_pending(&notes, GestureType::Tap, 3500.0, 3500.0), Some((2, 300.0)));
        assert_eq!(closest_pending(&notes, GestureType::SwipeDown, 3500.0, 3500.0), None);
    }

    #[test]
    fn hit_marks_note_and_scores() {
        let mut session = playing_session();
        push(&mut session, 0, 0.0, GestureType::Tap);
        let judgment = judge_input(&mut session, GestureType::Tap, 3530.0);
        assert!(judgment.is_hit());
        assert_eq!(session.score, 100);
        assert_eq!(session.combo, 1);
        assert_eq!(session.perfect_hits, 1);
        assert_eq!(session.notes[0].resolution(), Resolution::Hit);
        assert_eq!(session.last_judgment, Some(judgment));
    }

    #[test]
    fn wrong_gesture_is_a_no_candidate_miss() {
        let mut session = playing_session();
        push(&mut session, 0, 0.0, GestureType::SwipeLeft);
        session.combo = 3;
        session.max_combo = 3;
        let judgment = judge_input(&mut session, GestureType::SwipeRight, 3500.0);
        assert_eq!(
            judgment,
            Judgment::Miss {
                gesture: GestureType::SwipeRight,
                cause: MissCause::NoCandidate
            }
        );
        assert_eq!(session.combo, 0);
        assert_eq!(session.max_combo, 3);
        assert!(session.notes[0].is_pending());
    }

    #[test]
    fn early_tap_leaves_note_for_a_later_attempt() {
        let mut session = playing_session();
        push(&mut session, 0, 0.0, GestureType::Tap);
        let early = judge_input(&mut session, GestureType::Tap, 3000.0);
        assert!(matches!(
            early,
            Judgment::Miss {
                cause: MissCause::OutsideTolerance { note_id: 0, .. },
                ..
            }
        ));
        assert!(session.notes[0].is_pending());

        let on_time = judge_input(&mut session, GestureType::Tap, 3480.0);
        assert!(on_time.is_hit());
        assert_eq!(session.good_hits + session.perfect_hits, 1);
    }

    #[test]
    fn tolerance_edge_is_inclusive() {
        let mut session = playing_session();
        push(&mut session, 0, 0.0, GestureType::DoubleTap);
        let judgment = judge_input(&mut session, GestureType::DoubleTap, 3700.0);
        assert!(matches!(
            judgment,
            Judgment::Hit {
                grade: TimingGrade::Good,
                points: 25,
                ..
            }
        ));
    }

    #[test]
    fn matcher_never_counts_misses() {
        let mut session = playing_session();
        judge_input(&mut session, GestureType::Tap, 100.0);
        push(&mut session, 0, 0.0, GestureType::Tap);
        judge_input(&mut session, GestureType::Tap, 9000.0);
        assert_eq!(session.missed_hits, 0);
        assert_eq!(session.score, 0);
    }
}

use crate::game::note::Resolution;
use crate::game::session::Session;
use log::{debug, info};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Pending notes that crossed the miss threshold in this pass.
    pub newly_missed: u32,
    /// Notes of any resolution dropped from the live set.
    pub evicted: usize,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.newly_missed == 0 && self.evicted == 0
    }
}

/// Expires pending notes that were never hit and evicts old notes.
///
/// All notes that cross the miss threshold in one pass are counted, but the
/// combo is reset once. Eviction runs after the miss pass, so a pending note
/// is always counted as missed before it can disappear.
pub fn sweep(session: &mut Session, now: f64) -> SweepReport {
    let miss_threshold = session.config.miss_threshold_ms();
    let cleanup_age = session.config.cleanup_age_ms;

    let mut newly_missed: u32 = 0;
    for note in session.notes.iter_mut().filter(|n| n.is_pending()) {
        if note.age(now) > miss_threshold && note.resolve(Resolution::Missed, now) {
            newly_missed += 1;
            info!("MISSED: note {} ({}) expired", note.id, note.gesture);
        }
    }

    if newly_missed > 0 {
        session.missed_hits = session.missed_hits.saturating_add(newly_missed);
        session.combo = 0;
    }

    let before = session.notes.len();
    session.notes.retain(|note| note.age(now) <= cleanup_age);
    let evicted = before - session.notes.len();

    let report = SweepReport {
        newly_missed,
        evicted,
    };
    if !report.is_empty() {
        debug!(
            "Sweep at {:.0}ms: {} missed, {} evicted, {} live",
            now,
            newly_missed,
            evicted,
            session.notes.len()
        );
    }
    report
}

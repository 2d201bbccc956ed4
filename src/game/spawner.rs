use crate::config::gestures_for_level;
use crate::game::note::{GestureType, Note};
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

/// Emits a note every `interval` ticks with a gesture drawn uniformly from
/// the set unlocked at `level`. Note ids count up from zero.
pub struct Spawner<R: Rng = StdRng> {
    rng: R,
    interval: u32,
    gestures: &'static [GestureType],
    next_id: u64,
}

impl Spawner<StdRng> {
    pub fn seeded(seed: u64, level: u32, interval: u32) -> Self {
        Self::new(StdRng::seed_from_u64(seed), level, interval)
    }
}

impl<R: Rng> Spawner<R> {
    pub fn new(rng: R, level: u32, interval: u32) -> Self {
        Self {
            rng,
            interval: interval.max(1),
            gestures: gestures_for_level(level),
            next_id: 0,
        }
    }

    pub fn on_tick(&mut self, tick: u64, now: f64) -> Option<Note> {
        if tick % u64::from(self.interval) != 0 {
            return None;
        }
        let gesture = *self.gestures.choose(&mut self.rng).unwrap_or(&GestureType::Tap);
        let note = Note::new(self.next_id, now, gesture);
        self.next_id += 1;
        Some(note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::note::Resolution;

    #[test]
    fn spawns_only_on_interval_ticks() {
        let mut spawner = Spawner::seeded(1, 1, 8);
        let spawned: Vec<u64> = (0..33)
            .filter_map(|tick| spawner.on_tick(tick, tick as f64 * 300.0).map(|_| tick))
            .collect();
        assert_eq!(spawned, vec![0, 8, 16, 24, 32]);
    }

    #[test]
    fn ids_increase_and_notes_start_pending() {
        let mut spawner = Spawner::seeded(1, 3, 4);
        let notes: Vec<Note> = (0..16).filter_map(|t| spawner.on_tick(t, t as f64)).collect();
        let ids: Vec<u64> = notes.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert!(notes.iter().all(|n| n.resolution() == Resolution::Pending));
        assert_eq!(notes[1].spawn_time, 4.0);
    }

    #[test]
    fn level_one_spawns_only_taps() {
        let mut spawner = Spawner::seeded(99, 1, 1);
        assert!(
            (0..200)
                .filter_map(|t| spawner.on_tick(t, 0.0))
                .all(|n| n.gesture == GestureType::Tap)
        );
    }

    #[test]
    fn level_two_adds_horizontal_swipes() {
        let mut spawner = Spawner::seeded(5, 2, 1);
        let gestures: Vec<GestureType> =
            (0..300).filter_map(|t| spawner.on_tick(t, 0.0)).map(|n| n.gesture).collect();
        assert!(gestures.iter().all(|g| matches!(
            g,
            GestureType::Tap | GestureType::SwipeLeft | GestureType::SwipeRight
        )));
        assert!(gestures.contains(&GestureType::SwipeLeft));
        assert!(gestures.contains(&GestureType::SwipeRight));
    }

    #[test]
    fn high_levels_reach_every_gesture() {
        let mut spawner = Spawner::seeded(11, 5, 1);
        let gestures: Vec<GestureType> =
            (0..600).filter_map(|t| spawner.on_tick(t, 0.0)).map(|n| n.gesture).collect();
        for gesture in GestureType::ALL {
            assert!(gestures.contains(&gesture), "{} never spawned", gesture);
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Spawner::seeded(42, 3, 1);
        let mut b = Spawner::seeded(42, 3, 1);
        for t in 0..64 {
            assert_eq!(a.on_tick(t, 0.0), b.on_tick(t, 0.0));
        }
    }
}

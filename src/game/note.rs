use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// The gesture a note asks the player to perform.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GestureType {
    Tap,
    DoubleTap,
    SwipeLeft,
    SwipeRight,
    SwipeUp,
    SwipeDown,
}

impl GestureType {
    pub const ALL: [GestureType; 6] = [
        GestureType::Tap,
        GestureType::DoubleTap,
        GestureType::SwipeLeft,
        GestureType::SwipeRight,
        GestureType::SwipeUp,
        GestureType::SwipeDown,
    ];

    #[inline(always)]
    pub const fn is_swipe(self) -> bool {
        matches!(
            self,
            GestureType::SwipeLeft
                | GestureType::SwipeRight
                | GestureType::SwipeUp
                | GestureType::SwipeDown
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            GestureType::Tap => "tap",
            GestureType::DoubleTap => "double-tap",
            GestureType::SwipeLeft => "swipe-left",
            GestureType::SwipeRight => "swipe-right",
            GestureType::SwipeUp => "swipe-up",
            GestureType::SwipeDown => "swipe-down",
        }
    }
}

impl fmt::Display for GestureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GestureType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        GestureType::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("Unknown gesture '{}'", trimmed))
    }
}

/// Terminal state of a note. `Pending` is the only non-terminal value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Pending,
    Hit,
    Missed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Note {
    pub id: u64,
    /// Milliseconds on the session clock.
    pub spawn_time: f64,
    pub gesture: GestureType,
    resolution: Resolution,
    resolved_at: Option<f64>,
}

impl Note {
    pub fn new(id: u64, spawn_time: f64, gesture: GestureType) -> Self {
        Self {
            id,
            spawn_time,
            gesture,
            resolution: Resolution::Pending,
            resolved_at: None,
        }
    }

    #[inline(always)]
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    #[inline(always)]
    pub fn is_pending(&self) -> bool {
        self.resolution == Resolution::Pending
    }

    pub fn resolved_at(&self) -> Option<f64> {
        self.resolved_at
    }

    #[inline(always)]
    pub fn age(&self, now: f64) -> f64 {
        now - self.spawn_time
    }

    /// Moves a pending note to `Hit` or `Missed`. Returns false, leaving the
    /// note untouched, if it was already resolved or `to` is `Pending`.
    pub fn resolve(&mut self, to: Resolution, now: f64) -> bool {
        if !self.is_pending() || to == Resolution::Pending {
            return false;
        }
        self.resolution = to;
        self.resolved_at = Some(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_is_terminal() {
        let mut note = Note::new(0, 0.0, GestureType::Tap);
        assert!(note.resolve(Resolution::Hit, 3500.0));
        assert!(!note.resolve(Resolution::Missed, 3800.0));
        assert_eq!(note.resolution(), Resolution::Hit);
        assert_eq!(note.resolved_at(), Some(3500.0));
    }

    #[test]
    fn cannot_resolve_back_to_pending() {
        let mut note = Note::new(3, 10.0, GestureType::SwipeUp);
        assert!(!note.resolve(Resolution::Pending, 20.0));
        assert!(note.is_pending());
        assert_eq!(note.resolved_at(), None);
    }

    #[test]
    fn gesture_names_round_trip_through_from_str() {
        for gesture in GestureType::ALL {
            assert_eq!(gesture.as_str().parse::<GestureType>(), Ok(gesture));
        }
        assert!("swipe-diagonal".parse::<GestureType>().is_err());
    }

    #[test]
    fn only_directional_gestures_are_swipes() {
        assert!(!GestureType::Tap.is_swipe());
        assert!(!GestureType::DoubleTap.is_swipe());
        assert!(GestureType::SwipeLeft.is_swipe());
        assert!(GestureType::SwipeDown.is_swipe());
    }
}

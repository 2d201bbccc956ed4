use crate::config::{DOUBLE_TAP_WINDOW_MS, TAP_MAX_DISTANCE};
use crate::game::note::GestureType;
use log::debug;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PressPoint {
    pub x: f64,
    pub y: f64,
}

/// Turns press/release pairs into gestures. Remembers the pending press point
/// and the time of the last tap-family release.
#[derive(Clone, Debug)]
pub struct GestureClassifier {
    tap_max_distance: f64,
    double_tap_window_ms: f64,
    press: Option<PressPoint>,
    last_tap_at: Option<f64>,
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new(TAP_MAX_DISTANCE, DOUBLE_TAP_WINDOW_MS)
    }
}

impl GestureClassifier {
    pub fn new(tap_max_distance: f64, double_tap_window_ms: f64) -> Self {
        Self {
            tap_max_distance,
            double_tap_window_ms,
            press: None,
            last_tap_at: None,
        }
    }

    pub fn press_start(&mut self, x: f64, y: f64) {
        self.press = Some(PressPoint { x, y });
    }

    /// Classifies the release at `(x, y)` against the stored press point.
    /// Always yields a gesture.
    pub fn press_end(&mut self, x: f64, y: f64, now: f64) -> GestureType {
        let Some(start) = self.press.take() else {
            self.last_tap_at = Some(now);
            return GestureType::Tap;
        };

        let dx = x - start.x;
        let dy = y - start.y;
        let distance = dx.hypot(dy);

        if distance < self.tap_max_distance {
            let is_double = self
                .last_tap_at
                .is_some_and(|prev| now - prev < self.double_tap_window_ms);
            self.last_tap_at = Some(now);
            return if is_double {
                GestureType::DoubleTap
            } else {
                GestureType::Tap
            };
        }

        let gesture = swipe_direction(dx, dy);
        debug!(
            "Swipe dx={:.1} dy={:.1} angle={:.1} -> {}",
            dx,
            dy,
            dy.atan2(dx).to_degrees(),
            gesture
        );
        gesture
    }

    /// Forgets any half-finished press and the double-tap history.
    pub fn reset(&mut self) {
        self.press = None;
        self.last_tap_at = None;
    }
}

/// Buckets a displacement by angle. Screen Y grows downward, so positive `dy`
/// is a downward swipe.
pub fn swipe_direction(dx: f64, dy: f64) -> GestureType {
    let angle = dy.atan2(dx).to_degrees();
    if angle.abs() < 45.0 {
        GestureType::SwipeRight
    } else if angle.abs() >= 135.0 {
        GestureType::SwipeLeft
    } else if angle > 0.0 {
        GestureType::SwipeDown
    } else {
        GestureType::SwipeUp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(
        c: &mut GestureClassifier,
        from: (f64, f64),
        to: (f64, f64),
        now: f64,
    ) -> GestureType {
        c.press_start(from.0, from.1);
        c.press_end(to.0, to.1, now)
    }

    #[test]
    fn short_press_is_a_tap() {
        let mut c = GestureClassifier::default();
        assert_eq!(classify(&mut c, (100.0, 100.0), (120.0, 130.0), 0.0), GestureType::Tap);
    }

    #[test]
    fn second_tap_inside_window_is_double() {
        let mut c = GestureClassifier::default();
        assert_eq!(classify(&mut c, (0.0, 0.0), (0.0, 0.0), 1000.0), GestureType::Tap);
        assert_eq!(classify(&mut c, (0.0, 0.0), (1.0, 1.0), 1299.0), GestureType::DoubleTap);
        // The double tap itself refreshes the window.
        assert_eq!(classify(&mut c, (0.0, 0.0), (1.0, 1.0), 1500.0), GestureType::DoubleTap);
        assert_eq!(classify(&mut c, (0.0, 0.0), (1.0, 1.0), 1800.0), GestureType::Tap);
    }

    #[test]
    fn swipes_do_not_refresh_the_double_tap_window() {
        let mut c = GestureClassifier::default();
        classify(&mut c, (0.0, 0.0), (0.0, 0.0), 0.0);
        assert_eq!(classify(&mut c, (0.0, 0.0), (200.0, 0.0), 100.0), GestureType::SwipeRight);
        assert_eq!(classify(&mut c, (0.0, 0.0), (0.0, 0.0), 250.0), GestureType::DoubleTap);
    }

    #[test]
    fn swipe_directions_follow_screen_axes() {
        let mut c = GestureClassifier::default();
        assert_eq!(classify(&mut c, (0.0, 0.0), (100.0, 10.0), 0.0), GestureType::SwipeRight);
        assert_eq!(classify(&mut c, (0.0, 0.0), (-100.0, 10.0), 0.0), GestureType::SwipeLeft);
        assert_eq!(classify(&mut c, (0.0, 0.0), (10.0, 100.0), 0.0), GestureType::SwipeDown);
        assert_eq!(classify(&mut c, (0.0, 0.0), (10.0, -100.0), 0.0), GestureType::SwipeUp);
    }

    #[test]
    fn boundary_angles() {
        assert_eq!(swipe_direction(100.0, 100.0), GestureType::SwipeDown); // 45
        assert_eq!(swipe_direction(100.0, -100.0), GestureType::SwipeUp); // -45
        assert_eq!(swipe_direction(-100.0, 100.0), GestureType::SwipeLeft); // 135
        assert_eq!(swipe_direction(-100.0, -100.0), GestureType::SwipeLeft); // -135
        assert_eq!(swipe_direction(-100.0, 0.0), GestureType::SwipeLeft); // 180
    }

    #[test]
    fn exactly_threshold_distance_is_a_swipe() {
        let mut c = GestureClassifier::default();
        assert_eq!(classify(&mut c, (0.0, 0.0), (50.0, 0.0), 0.0), GestureType::SwipeRight);
        assert_eq!(classify(&mut c, (0.0, 0.0), (30.0, 39.9), 10.0), GestureType::Tap);
    }

    #[test]
    fn release_without_press_defaults_to_tap() {
        let mut c = GestureClassifier::default();
        assert_eq!(c.press_end(500.0, 500.0, 0.0), GestureType::Tap);
        // A second bare release is still a plain tap, but a real press after it doubles.
        assert_eq!(c.press_end(500.0, 500.0, 100.0), GestureType::Tap);
        assert_eq!(classify(&mut c, (0.0, 0.0), (0.0, 0.0), 200.0), GestureType::DoubleTap);
    }

    #[test]
    fn press_point_is_consumed_by_release() {
        let mut c = GestureClassifier::default();
        c.press_start(0.0, 0.0);
        assert_eq!(c.press_end(300.0, 0.0, 0.0), GestureType::SwipeRight);
        assert_eq!(c.press_end(900.0, 0.0, 1000.0), GestureType::Tap);
    }
}

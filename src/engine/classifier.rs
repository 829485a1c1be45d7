// Wand — Gesture Classifier
//
// Threshold + dominant-axis rule over the smoothed X/Y values.  Z is read by
// the sensor but deliberately takes no part in the decision.

use crate::config::GESTURE_THRESHOLD;
use crate::engine::sampler::SmoothedAxes;
use crate::events::{Axis, GestureCode};

/// Axis with the larger magnitude.  X is scanned first and Y must beat it
/// strictly, so a tie goes to X.
pub fn dominant_axis(axes: SmoothedAxes) -> Axis {
    if axes.y.abs() > axes.x.abs() {
        Axis::Y
    } else {
        Axis::X
    }
}

/// Gesture for the given reading, ignoring lockout.
pub fn gesture_for(axes: SmoothedAxes) -> Option<GestureCode> {
    if axes.x.abs() <= GESTURE_THRESHOLD && axes.y.abs() <= GESTURE_THRESHOLD {
        return None;
    }
    let code = match dominant_axis(axes) {
        Axis::X if axes.x > 0 => GestureCode::Left,
        Axis::X => GestureCode::Right,
        Axis::Y if axes.y > 0 => GestureCode::Down,
        _ => GestureCode::Up,
    };
    Some(code)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GestureClassifier {
    locked_out: bool,
}

impl GestureClassifier {
    pub const fn new() -> Self {
        Self { locked_out: false }
    }

    pub fn is_locked_out(&self) -> bool {
        self.locked_out
    }

    /// Classify and, on a hit, enter lockout.  The caller owns the timer that
    /// ends the lockout via [`Self::unlock`].
    pub fn classify(&mut self, axes: SmoothedAxes) -> Option<GestureCode> {
        let code = gesture_for(axes)?;
        if self.locked_out {
            return None;
        }
        self.locked_out = true;
        Some(code)
    }

    pub fn unlock(&mut self) {
        self.locked_out = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axes(x: i32, y: i32) -> SmoothedAxes {
        SmoothedAxes { x, y }
    }

    #[test]
    fn below_or_at_threshold_is_quiet() {
        assert_eq!(gesture_for(axes(0, 0)), None);
        assert_eq!(gesture_for(axes(15, -15)), None);
        assert_eq!(gesture_for(axes(-15, 15)), None);
    }

    #[test]
    fn direction_codes() {
        assert_eq!(gesture_for(axes(16, 0)), Some(GestureCode::Left));
        assert_eq!(gesture_for(axes(-16, 3)), Some(GestureCode::Right));
        assert_eq!(gesture_for(axes(2, 30)), Some(GestureCode::Down));
        assert_eq!(gesture_for(axes(-20, -30)), Some(GestureCode::Up));
        assert_eq!(GestureCode::Left.as_byte(), 0x4C);
        assert_eq!(GestureCode::Up.as_byte(), 0x55);
    }

    #[test]
    fn tie_goes_to_x() {
        assert_eq!(dominant_axis(axes(20, 20)), Axis::X);
        assert_eq!(gesture_for(axes(20, -20)), Some(GestureCode::Left));
        assert_eq!(gesture_for(axes(-20, 20)), Some(GestureCode::Right));
    }

    #[test]
    fn one_axis_over_threshold_is_enough() {
        assert_eq!(gesture_for(axes(-16, 14)), Some(GestureCode::Right));
        assert_eq!(gesture_for(axes(9, 16)), Some(GestureCode::Down));
    }

    #[test]
    fn lockout_suppresses_until_unlocked() {
        let mut c = GestureClassifier::new();
        assert_eq!(c.classify(axes(30, 0)), Some(GestureCode::Left));
        assert!(c.is_locked_out());
        assert_eq!(c.classify(axes(0, -30)), None);

        c.unlock();
        assert_eq!(c.classify(axes(0, -30)), Some(GestureCode::Up));
    }

    #[test]
    fn quiet_reading_does_not_lock() {
        let mut c = GestureClassifier::new();
        assert_eq!(c.classify(axes(3, 3)), None);
        assert!(!c.is_locked_out());
    }
}

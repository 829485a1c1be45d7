// Wand — Axis Sampler
//
// Per-axis history of the last AXIS_HISTORY_LEN samples.  Every tick all slots
// decay by 9/10 before the newest reading overwrites the oldest slot, so the
// slot mean behaves like an exponentially weighted low-pass filter.
//
// Rounding: decay is `v * 9 / 10` in integer arithmetic, truncating toward
// zero (e.g. 15 → 13, -15 → -13).  The mean is the slot sum divided by the
// slot count, also truncating toward zero.

use crate::config::{AXIS_HISTORY_LEN, DECAY_DENOMINATOR, DECAY_NUMERATOR};
use crate::events::RawSample;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisHistory {
    slots: [i16; AXIS_HISTORY_LEN],
    cursor: usize,
}

impl AxisHistory {
    pub const fn new() -> Self {
        Self {
            slots: [0; AXIS_HISTORY_LEN],
            cursor: 0,
        }
    }

    pub fn slots(&self) -> &[i16; AXIS_HISTORY_LEN] {
        &self.slots
    }

    /// Slot the next sample will be written to.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Decay every slot, store `raw` at the cursor and advance it.
    pub fn push(&mut self, raw: i16) {
        for slot in self.slots.iter_mut() {
            *slot = decay(*slot);
        }
        self.slots[self.cursor] = raw;
        self.cursor = (self.cursor + 1) % AXIS_HISTORY_LEN;
    }

    pub fn mean(&self) -> i32 {
        let sum: i32 = self.slots.iter().map(|&v| i32::from(v)).sum();
        sum / AXIS_HISTORY_LEN as i32
    }
}

impl Default for AxisHistory {
    fn default() -> Self {
        Self::new()
    }
}

fn decay(value: i16) -> i16 {
    // |value| ≤ i16::MAX, so the i32 product cannot overflow and the result
    // shrinks back into i16 range.
    (i32::from(value) * DECAY_NUMERATOR / DECAY_DENOMINATOR) as i16
}

/// Smoothed X/Y at the current tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SmoothedAxes {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AxisSampler {
    x: AxisHistory,
    y: AxisHistory,
}

impl AxisSampler {
    pub const fn new() -> Self {
        Self {
            x: AxisHistory::new(),
            y: AxisHistory::new(),
        }
    }

    pub fn sample_tick(&mut self, raw: RawSample) -> SmoothedAxes {
        self.x.push(raw.x);
        self.y.push(raw.y);
        SmoothedAxes {
            x: self.x.mean(),
            y: self.y.mean(),
        }
    }

    pub fn x(&self) -> &AxisHistory {
        &self.x
    }

    pub fn y(&self) -> &AxisHistory {
        &self.y
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(x: i16, y: i16) -> RawSample {
        RawSample { x, y }
    }

    #[test]
    fn decay_truncates_toward_zero() {
        assert_eq!(decay(20), 18);
        assert_eq!(decay(15), 13);
        assert_eq!(decay(-15), -13);
        assert_eq!(decay(1), 0);
        assert_eq!(decay(-1), 0);
        assert_eq!(decay(i16::MIN), -29491);
    }

    #[test]
    fn untouched_slots_decay_by_nine_tenths() {
        let mut h = AxisHistory::new();
        let readings = [100, -80, 57, 33, -128, 127, 4, 90, -7, 61, 12, 0, -45, 77, 23, 8, 99, -66];

        for &raw in readings.iter() {
            let before = *h.slots();
            let written = h.cursor();
            h.push(raw);
            for (i, (&old, &new)) in before.iter().zip(h.slots().iter()).enumerate() {
                if i == written {
                    assert_eq!(new, raw);
                } else {
                    assert_eq!(new, decay(old), "slot {i}");
                }
            }
        }
    }

    #[test]
    fn cursor_wraps_after_full_history() {
        let mut h = AxisHistory::new();
        for _ in 0..AXIS_HISTORY_LEN {
            h.push(10);
        }
        assert_eq!(h.cursor(), 0);
        h.push(10);
        assert_eq!(h.cursor(), 1);
    }

    #[test]
    fn mean_includes_zero_filled_slots() {
        let mut s = AxisSampler::new();
        let out = s.sample_tick(sample(64, -64));
        assert_eq!(out, SmoothedAxes { x: 4, y: -4 });
    }

    #[test]
    fn sustained_reading_settles_at_decayed_mean() {
        let mut s = AxisSampler::new();
        let mut out = SmoothedAxes::default();
        for _ in 0..AXIS_HISTORY_LEN * 3 {
            out = s.sample_tick(sample(20, 40));
        }
        // 20 → 18, 16, 14, 12, 10, 9, … 1, 0 sums to 135.
        assert_eq!(out.x, 135 / 16);
        // 40 decays to a slot sum of 293.
        assert_eq!(out.y, 293 / 16);
    }

    #[test]
    fn reset_clears_history() {
        let mut s = AxisSampler::new();
        s.sample_tick(sample(50, 50));
        s.reset();
        assert_eq!(s, AxisSampler::new());
    }
}

// Wand — One-shot Software Timers
//
// Tick-driven timer queue.  The dispatch loop calls `advance()` once per tick
// and then drains `pop_due()`; each due entry is delivered exactly once and
// removed.  Handles are never reused, so cancelling a stale handle is a no-op
// rather than hitting an unrelated timer.

use heapless::Vec;

use crate::config::TIMER_QUEUE_CAPACITY;
use crate::error::{WandError, WandResult};
use crate::events::TimerEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle(u32);

#[derive(Debug, Clone, Copy)]
struct Entry {
    handle: TimerHandle,
    due: u64,
    event: TimerEvent,
}

pub struct TimerQueue {
    now: u64,
    next_handle: u32,
    pending: Vec<Entry, TIMER_QUEUE_CAPACITY>,
}

impl TimerQueue {
    pub const fn new() -> Self {
        Self {
            now: 0,
            next_handle: 0,
            pending: Vec::new(),
        }
    }

    /// Ticks elapsed since the queue was created.
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|e| e.handle == handle)
    }

    /// Fire `event` after `delay_ticks`.  A zero delay still waits one tick so
    /// a callback can never re-enter itself within the same dispatch pass.
    pub fn schedule(&mut self, delay_ticks: u32, event: TimerEvent) -> WandResult<TimerHandle> {
        let handle = TimerHandle(self.next_handle);
        let entry = Entry {
            handle,
            due: self.now + u64::from(delay_ticks.max(1)),
            event,
        };
        self.pending
            .push(entry)
            .map_err(|_| WandError::TimerQueueFull {
                capacity: TIMER_QUEUE_CAPACITY,
            })?;
        self.next_handle = self.next_handle.wrapping_add(1);
        Ok(handle)
    }

    pub fn cancel(&mut self, handle: TimerHandle) {
        if let Some(pos) = self.pending.iter().position(|e| e.handle == handle) {
            self.pending.remove(pos);
        }
    }

    pub fn advance(&mut self) {
        self.now += 1;
    }

    /// Next expired timer, earliest due first; ties resolve in scheduling
    /// order.
    pub fn pop_due(&mut self) -> Option<(TimerHandle, TimerEvent)> {
        let pos = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= self.now)
            .min_by_key(|(_, e)| e.due)
            .map(|(pos, _)| pos)?;
        // `remove` keeps the remaining entries in scheduling order.
        let entry = self.pending.remove(pos);
        Some((entry.handle, entry.event))
    }
}

impl Default for TimerQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_after_delay_and_only_once() {
        let mut q = TimerQueue::new();
        let h = q.schedule(3, TimerEvent::MotorOn).unwrap();

        for _ in 0..2 {
            q.advance();
            assert_eq!(q.pop_due(), None);
        }
        q.advance();
        assert_eq!(q.pop_due(), Some((h, TimerEvent::MotorOn)));
        assert_eq!(q.pop_due(), None);
        assert_eq!(q.pending(), 0);
    }

    #[test]
    fn zero_delay_waits_one_tick() {
        let mut q = TimerQueue::new();
        q.schedule(0, TimerEvent::AdvDataUpdate).unwrap();
        assert_eq!(q.pop_due(), None);
        q.advance();
        assert!(q.pop_due().is_some());
    }

    #[test]
    fn same_tick_fires_in_scheduling_order() {
        let mut q = TimerQueue::new();
        q.schedule(2, TimerEvent::GestureLockout).unwrap();
        q.advance();
        q.schedule(1, TimerEvent::AdvDataUpdate).unwrap();
        q.advance();

        assert_eq!(q.pop_due().map(|(_, e)| e), Some(TimerEvent::GestureLockout));
        assert_eq!(q.pop_due().map(|(_, e)| e), Some(TimerEvent::AdvDataUpdate));
    }

    #[test]
    fn cancel_is_idempotent_and_ignores_fired_handles() {
        let mut q = TimerQueue::new();
        let fired = q.schedule(1, TimerEvent::GestureLockout).unwrap();
        let other = q.schedule(5, TimerEvent::GestureDisplayReset).unwrap();
        q.advance();
        assert!(q.pop_due().is_some());

        q.cancel(fired);
        assert!(q.is_pending(other));

        q.cancel(other);
        q.cancel(other);
        assert_eq!(q.pending(), 0);
    }

    #[test]
    fn full_queue_is_reported() {
        let mut q = TimerQueue::new();
        for _ in 0..TIMER_QUEUE_CAPACITY {
            q.schedule(10, TimerEvent::AdvDataUpdate).unwrap();
        }
        assert_eq!(
            q.schedule(10, TimerEvent::AdvDataUpdate),
            Err(WandError::TimerQueueFull {
                capacity: TIMER_QUEUE_CAPACITY
            })
        );
    }
}

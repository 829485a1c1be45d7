// Wand — Power Lifecycle
//
//   Asleep ──wake──▶ AwakeSampling ──motor timer──▶ AwakeIdleCountdown
//      ▲                                                   │
//      └──────────────── display-reset timeout ────────────┘

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    /// Motor buzzing after a wake; publishing not yet resumed.
    AwakeSampling,
    /// Publishing; the display-reset timer decides when to sleep.
    AwakeIdleCountdown,
    Asleep,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerLifecycle {
    state: PowerState,
    just_woke: bool,
}

impl PowerLifecycle {
    /// Boot behaves like the end of a wake: publishing starts straight away
    /// and the first tick arms the sleep countdown.
    pub const fn new() -> Self {
        Self {
            state: PowerState::AwakeIdleCountdown,
            just_woke: true,
        }
    }

    pub fn state(&self) -> PowerState {
        self.state
    }

    pub fn is_asleep(&self) -> bool {
        self.state == PowerState::Asleep
    }

    /// Returns `false` when already awake; the wake is then ignored.
    pub fn wake(&mut self) -> bool {
        if self.state != PowerState::Asleep {
            return false;
        }
        self.state = PowerState::AwakeSampling;
        true
    }

    pub fn motor_done(&mut self) {
        self.state = PowerState::AwakeIdleCountdown;
        self.just_woke = true;
    }

    pub fn sleep(&mut self) {
        self.state = PowerState::Asleep;
        self.just_woke = false;
    }

    /// One-shot: true on the first call after boot or a completed wake.
    pub fn take_just_woke(&mut self) -> bool {
        core::mem::take(&mut self.just_woke)
    }
}

impl Default for PowerLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boot_is_counting_down_with_wake_flag() {
        let mut l = PowerLifecycle::new();
        assert_eq!(l.state(), PowerState::AwakeIdleCountdown);
        assert!(l.take_just_woke());
        assert!(!l.take_just_woke());
    }

    #[test]
    fn full_cycle() {
        let mut l = PowerLifecycle::new();
        l.take_just_woke();

        l.sleep();
        assert!(l.is_asleep());
        assert!(!l.take_just_woke());

        assert!(l.wake());
        assert_eq!(l.state(), PowerState::AwakeSampling);
        assert!(!l.take_just_woke());

        l.motor_done();
        assert_eq!(l.state(), PowerState::AwakeIdleCountdown);
        assert!(l.take_just_woke());
    }

    #[test]
    fn wake_while_awake_is_ignored() {
        let mut l = PowerLifecycle::new();
        assert!(!l.wake());
        assert_eq!(l.state(), PowerState::AwakeIdleCountdown);
    }
}

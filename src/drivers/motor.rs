// Wand — Vibration Motor Driver
//
// Simple GPIO-driven vibration motor.  Timing is owned by the engine's motor
// timer, so this never blocks.

use embedded_hal::digital::OutputPin;

pub struct MotorDriver<P> {
    pin: P,
    active: bool,
}

impl<P: OutputPin> MotorDriver<P> {
    pub fn new(mut pin: P) -> Self {
        if let Err(e) = pin.set_low() {
            log::warn!("Motor pin init failed: {:?}", e);
        }
        Self { pin, active: false }
    }

    pub fn set(&mut self, active: bool) {
        let result = if active {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        match result {
            Ok(()) => self.active = active,
            Err(e) => log::warn!("Motor pin write failed: {:?}", e),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

// Wand — Power Control
//
// Extended sleep is ESP-IDF light sleep with a GPIO wake on the accelerometer
// interrupt line.  The engine only *requests* sleep; the dispatch loop enters
// it after the current event has run to completion.

use embedded_hal::digital::OutputPin;

use crate::config::PIN_ACCEL_INT;
use crate::drivers::motor::MotorDriver;
use crate::hal::PowerControl;

pub struct EspPower<P> {
    motor: MotorDriver<P>,
    sleep_requested: bool,
    wake_events: u32,
}

impl<P: OutputPin> EspPower<P> {
    pub fn new(motor: MotorDriver<P>) -> Self {
        Self {
            motor,
            sleep_requested: false,
            wake_events: 0,
        }
    }

    /// Consume a pending sleep request.
    pub fn take_sleep_request(&mut self) -> bool {
        core::mem::take(&mut self.sleep_requested)
    }

    pub fn wake_events(&self) -> u32 {
        self.wake_events
    }

    /// Enter light sleep once.  Returns after any wake source; only a GPIO
    /// wake counts as a wake event.
    pub fn light_sleep(&mut self) {
        unsafe {
            let ret = esp_idf_sys::esp_light_sleep_start();
            if ret != esp_idf_sys::ESP_OK {
                log::warn!("Light sleep rejected ({})", ret);
                return;
            }
            let cause = esp_idf_sys::esp_sleep_get_wakeup_cause();
            if cause == esp_idf_sys::esp_sleep_source_t_ESP_SLEEP_WAKEUP_GPIO {
                self.wake_events = self.wake_events.wrapping_add(1);
                // Level-triggered; leave it armed and the line holds us awake.
                esp_idf_sys::gpio_wakeup_disable(PIN_ACCEL_INT);
            }
        }
    }
}

impl<P: OutputPin> PowerControl for EspPower<P> {
    fn set_motor(&mut self, active: bool) {
        self.motor.set(active);
    }

    fn enter_extended_sleep(&mut self) {
        log::info!("Sleep requested");
        self.sleep_requested = true;
    }

    fn arm_external_wakeup(&mut self) {
        unsafe {
            let ret = esp_idf_sys::gpio_wakeup_enable(
                PIN_ACCEL_INT,
                esp_idf_sys::gpio_int_type_t_GPIO_INTR_LOW_LEVEL,
            );
            if ret != esp_idf_sys::ESP_OK {
                log::error!("GPIO{} wakeup enable failed ({})", PIN_ACCEL_INT, ret);
            }
            let ret = esp_idf_sys::esp_sleep_enable_gpio_wakeup();
            if ret != esp_idf_sys::ESP_OK {
                log::error!("GPIO wake source enable failed ({})", ret);
            }
        }
    }

    fn reset_wakeup_event_counter(&mut self) {
        self.wake_events = 0;
    }
}

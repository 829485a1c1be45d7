// Wand — Hardware & System Configuration
// Target: Seeed Studio Xiao ESP32-C3 (RISC-V) + LIS3DH accelerometer

use crate::events::ConnectionParams;

// ---------------------------------------------------------------------------
// GPIO Pin Definitions (Xiao ESP32-C3 pinout)
// ---------------------------------------------------------------------------
pub const PIN_ACCEL_INT: i32 = 3; // D1/A1 — LIS3DH INT2 (active LOW), wake source
pub const PIN_MOTOR: i32 = 4;     // D2/A2 — Vibration motor control
pub const PIN_I2C_SDA: i32 = 6;   // D4    — I2C data line
pub const PIN_I2C_SCL: i32 = 7;   // D5    — I2C clock line

// ---------------------------------------------------------------------------
// I2C Bus
// ---------------------------------------------------------------------------
pub const I2C_ADDR_LIS3DH: u8 = 0x18;
pub const I2C_BAUDRATE_KHZ: u32 = 400;
pub const I2C_TIMEOUT_TICKS: u32 = 1000; // FreeRTOS ticks

// ---------------------------------------------------------------------------
// Timing (all delays are in dispatch ticks)
// ---------------------------------------------------------------------------
pub const TICK_MS: u64 = 10;
pub const ADV_DATA_UPDATE_TICKS: u32 = 1;             // 10 ms publish period
pub const GESTURE_LOCKOUT_TICKS: u32 = 50;            // 0.5 s between gestures
pub const GESTURE_DISPLAY_RESET_TICKS: u32 = 300;     // 3 s idle → clear + sleep
pub const MOTOR_ON_TICKS: u32 = 100;                  // 1 s wake buzz
pub const PARAM_UPDATE_REQUEST_TICKS: u32 = 1000;     // 10 s after connect

/// Pending one-shot timers the queue can hold at once. Every timer kind has at
/// most one outstanding instance, so five would do.
pub const TIMER_QUEUE_CAPACITY: usize = 8;

// ---------------------------------------------------------------------------
// Gesture detection
// ---------------------------------------------------------------------------
pub const AXIS_HISTORY_LEN: usize = 16;
pub const GESTURE_THRESHOLD: i32 = 15;  // counts at 8-bit resolution
pub const DECAY_NUMERATOR: i32 = 9;     // 0.9 decay as 9/10
pub const DECAY_DENOMINATOR: i32 = 10;

// ---------------------------------------------------------------------------
// Advertising
// ---------------------------------------------------------------------------
pub const ADV_DATA_MAX_LEN: usize = 31;
pub const SCAN_RSP_DATA_MAX_LEN: usize = 31;
/// Bytes kept free for the Flags AD structure on connectable advertising.
pub const ADV_FLAGS_RESERVED_LEN: usize = 3;
pub const AD_TYPE_MANUFACTURER_SPECIFIC: u8 = 0xFF;
pub const MSD_DATA_NUM_BYTES: usize = 5;
pub const ADVERTISE_CONNECTABLE: bool = true;

/// Complete Local Name "Wand".
pub const USER_ADVERTISE_DATA: &[u8] = &[0x05, 0x09, b'W', b'a', b'n', b'd'];
pub const USER_SCAN_RESPONSE_DATA: &[u8] = &[];

// ---------------------------------------------------------------------------
// Preferred connection parameters
// ---------------------------------------------------------------------------
pub const PREFERRED_CONNECTION: PreferredConnection = PreferredConnection {
    interval_min: 8,   // 10 ms  (1.25 ms units)
    interval_max: 16,  // 20 ms
    latency: 0,
    supervision_timeout: 125, // 1.25 s (10 ms units)
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreferredConnection {
    pub interval_min: u16,
    pub interval_max: u16,
    pub latency: u16,
    pub supervision_timeout: u16,
}

impl PreferredConnection {
    /// Whether a negotiated parameter set already satisfies the preference.
    pub fn accepts(&self, params: &ConnectionParams) -> bool {
        params.interval >= self.interval_min
            && params.interval <= self.interval_max
            && params.latency == self.latency
            && params.supervision_timeout == self.supervision_timeout
    }
}

// ---------------------------------------------------------------------------
// Task Stack Sizes (bytes)
// ---------------------------------------------------------------------------
pub const STACK_DISPATCH: usize = 8192;

// Wand — System Events & Data Types

// ---------------------------------------------------------------------------
// Accelerometer axes
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// One raw reading of the two classified axes, in 8-bit resolution counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawSample {
    pub x: i16,
    pub y: i16,
}

// ---------------------------------------------------------------------------
// Gesture Classification
// ---------------------------------------------------------------------------

/// Directional gesture, encoded on the air as a single ASCII letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GestureCode {
    /// X axis, positive.
    Left = 0x4C,
    /// X axis, negative.
    Right = 0x52,
    /// Y axis, positive.
    Down = 0x44,
    /// Y axis, negative.
    Up = 0x55,
}

impl GestureCode {
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x4C => Some(Self::Left),
            0x52 => Some(Self::Right),
            0x44 => Some(Self::Down),
            0x55 => Some(Self::Up),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Timer callbacks
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Periodic advertising payload refresh.
    AdvDataUpdate,
    /// End of the post-gesture lockout window.
    GestureLockout,
    /// No gesture for the display window; clear the payload.
    GestureDisplayReset,
    /// Wake buzz finished.
    MotorOn,
    /// Ask the central for the preferred connection parameters.
    ParamUpdateRequest,
}

// ---------------------------------------------------------------------------
// BLE stack notifications
// ---------------------------------------------------------------------------
pub type ConnectionId = u16;

/// Negotiated link parameters: interval in 1.25 ms units, supervision timeout
/// in 10 ms units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionParams {
    pub interval: u16,
    pub latency: u16,
    pub supervision_timeout: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertiseStatus {
    Completed,
    Canceled,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BleEvent {
    Connected {
        conidx: ConnectionId,
        params: ConnectionParams,
    },
    /// The stack reported a connection indication without a usable link.
    ConnectionFailed,
    Disconnected {
        conidx: ConnectionId,
        reason: u8,
    },
    AdvertiseComplete(AdvertiseStatus),
    ParamsUpdated(ConnectionParams),
}

// ---------------------------------------------------------------------------
// Dispatch loop input: everything that may mutate engine state
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WandEvent {
    /// One dispatch tick elapsed.
    Tick,
    Ble(BleEvent),
    /// External wakeup interrupt (accelerometer motion while asleep).
    Wake,
}

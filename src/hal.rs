// Wand — Collaborator Interfaces
//
// The engine reaches hardware and the BLE stack only through these traits.
// Everything is bundled into a `Board` that is passed `&mut` into each engine
// operation.

use heapless::Vec;

use crate::config::{ADV_DATA_MAX_LEN, SCAN_RSP_DATA_MAX_LEN};
use crate::events::{Axis, ConnectionId};
use crate::timer::TimerQueue;

/// Accelerometer reached over the polled bus.
pub trait AxisSource {
    type Error: core::fmt::Debug;

    fn init(&mut self) -> Result<(), Self::Error>;

    /// Signed reading in 8-bit resolution counts (±128 full scale).
    fn read_axis(&mut self, axis: Axis) -> Result<i16, Self::Error>;

    /// Low-power mode that raises the wake interrupt on motion.
    fn enter_low_power_interrupt_mode(&mut self) -> Result<(), Self::Error>;
}

/// Outgoing undirected advertising command, as the stack will transmit it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvertiseCommand {
    pub adv_data: Vec<u8, ADV_DATA_MAX_LEN>,
    pub scan_rsp_data: Vec<u8, SCAN_RSP_DATA_MAX_LEN>,
    /// Connectable advertising needs room for the Flags structure the stack
    /// prepends.
    pub connectable: bool,
}

pub trait BleStack {
    /// Fresh command built from the base advertising configuration.
    fn active_advertise_command(&mut self) -> AdvertiseCommand;

    fn start_undirected_advertising(&mut self, cmd: &AdvertiseCommand);

    fn stop_advertising(&mut self);

    fn update_live_advertising_data(&mut self, adv_data: &[u8], scan_rsp_data: &[u8]);

    fn start_connection_param_update(&mut self, conidx: ConnectionId);
}

pub trait PowerControl {
    fn set_motor(&mut self, active: bool);

    fn enter_extended_sleep(&mut self);

    fn arm_external_wakeup(&mut self);

    /// Clear wake events latched before sleep entry; the platform does not do
    /// this on the external-wakeup path.
    fn reset_wakeup_event_counter(&mut self);
}

pub struct Board<S, B, P> {
    pub sensor: S,
    pub ble: B,
    pub power: P,
    pub timers: TimerQueue,
}

impl<S, B, P> Board<S, B, P>
where
    S: AxisSource,
    B: BleStack,
    P: PowerControl,
{
    pub fn new(sensor: S, ble: B, power: P) -> Self {
        Self {
            sensor,
            ble,
            power,
            timers: TimerQueue::new(),
        }
    }
}

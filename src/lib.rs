// Wand — Gesture Advertising Peripheral
//
// Samples a 3-axis accelerometer, turns wand motion into directional gesture
// codes, and carries the recent gesture history in the manufacturer-specific
// data of its BLE advertisement.  The device sleeps after a few idle seconds
// and wakes on accelerometer motion with a short motor buzz.
//
// Everything except `platform` is target-independent and tested on the host.

pub mod config;
pub mod drivers;
pub mod engine;
pub mod error;
pub mod events;
pub mod hal;
pub mod tasks;
pub mod timer;

#[cfg(target_os = "espidf")]
pub mod platform;

pub use engine::GestureEngine;
pub use error::{WandError, WandResult};
pub use tasks::dispatch::Dispatcher;

// Wand — ESP32-C3 Platform Bring-up
//
// Owns the peripherals, builds the board, and runs the dispatch loop on its
// own FreeRTOS task:
//   1. Drain BLE notifications forwarded by the stack callbacks.
//   2. Advance the timer queue by one tick.
//   3. If the engine asked for sleep, light-sleep until the accelerometer
//      interrupt fires, then deliver the wake.

pub mod ble;
pub mod bus;
pub mod power;

use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use esp_idf_hal::gpio::PinDriver;
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::prelude::*;
use esp_idf_svc::nvs::EspDefaultNvsPartition;

use crate::config::*;
use crate::drivers::accel::Lis3dh;
use crate::drivers::motor::MotorDriver;
use crate::events::WandEvent;
use crate::hal::{AxisSource, BleStack, Board, PowerControl};
use crate::tasks::dispatch::Dispatcher;

use self::ble::EspBle;
use self::bus::TimedI2c;
use self::power::EspPower;

pub fn run() -> anyhow::Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log::info!("Wand firmware starting");

    let peripherals = Peripherals::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    let dispatch = thread::Builder::new()
        .name("dispatch".into())
        .stack_size(STACK_DISPATCH)
        .spawn(move || -> anyhow::Result<()> {
            // ---- Accelerometer ------------------------------------------------
            let i2c_config = I2cConfig::new().baudrate(I2C_BAUDRATE_KHZ.kHz().into());
            let i2c = I2cDriver::new(
                peripherals.i2c0,
                peripherals.pins.gpio6, // SDA
                peripherals.pins.gpio7, // SCL
                &i2c_config,
            )?;
            let mut accel = Lis3dh::new(TimedI2c::new(i2c), I2C_ADDR_LIS3DH);
            if !accel.is_connected() {
                log::error!("LIS3DH not found at 0x{:02X}", I2C_ADDR_LIS3DH);
                // Continue anyway so the radio side can still be debugged.
            }

            // ---- Motor + power ------------------------------------------------
            let motor = MotorDriver::new(PinDriver::output(peripherals.pins.gpio4)?);
            let power = EspPower::new(motor);

            // ---- BLE ----------------------------------------------------------
            let (ble_tx, ble_rx) = mpsc::channel();
            let ble = EspBle::new(peripherals.modem, nvs, ble_tx)?;

            let mut dispatcher = Dispatcher::new(Board::new(accel, ble, power));
            dispatcher.start()?;
            log::info!("Dispatch loop running ({} ms tick)", TICK_MS);

            let interval = Duration::from_millis(TICK_MS);
            loop {
                let tick_start = Instant::now();

                while let Ok(event) = ble_rx.try_recv() {
                    deliver(&mut dispatcher, WandEvent::Ble(event));
                }
                deliver(&mut dispatcher, WandEvent::Tick);

                if dispatcher.board_mut().power.take_sleep_request() {
                    let power = &mut dispatcher.board_mut().power;
                    while power.wake_events() == 0 {
                        power.light_sleep();
                    }
                    log::info!("Woken by GPIO{}", PIN_ACCEL_INT);
                    deliver(&mut dispatcher, WandEvent::Wake);
                    continue;
                }

                let elapsed = tick_start.elapsed();
                if elapsed < interval {
                    thread::sleep(interval - elapsed);
                }
            }
        })?;

    dispatch
        .join()
        .map_err(|_| anyhow::anyhow!("dispatch task panicked"))?
}

fn deliver<S, B, P>(dispatcher: &mut Dispatcher<S, B, P>, event: WandEvent)
where
    S: AxisSource,
    B: BleStack,
    P: PowerControl,
{
    if let Err(e) = dispatcher.handle(event) {
        log::error!("Event {:?} failed: {}", event, e);
    }
}

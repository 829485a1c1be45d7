// Wand — Firmware Entry Point
//
// Boot sequence:
//   1. Link runtime patches and start the ESP logger.
//   2. Bring up the accelerometer, motor and BLE stack.
//   3. Start advertising and run the dispatch loop until power-off.

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    wand::platform::run()
}

#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    anyhow::bail!("the wand firmware only runs on ESP-IDF; run `cargo test` for the host build")
}

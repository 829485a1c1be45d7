fn main() {
    // The engine library and its tests build on the host; only the firmware
    // image needs the ESP-IDF link environment.
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }
}

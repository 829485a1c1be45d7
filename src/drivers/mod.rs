pub mod accel;
pub mod motor;

pub mod config;
pub mod geometry;
pub mod imu;
pub mod io;
pub mod optical;
pub mod sim;
pub mod system;
pub mod tracking;

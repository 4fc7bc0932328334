use serde::{Deserialize, Serialize};

pub mod config;
pub mod decoder;
pub mod error;
pub mod forwarder;
pub mod line_framer;
pub mod serial_port;
pub mod supervisor;

/// One sensor reading reported by the greenhouse controller.
///
/// Missing fields are decoded as `0.0`.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Measurement {
    /// Air temperature in Celsius.
    pub air_temperature: f64,
    /// Relative humidity in percentage.
    pub humidity: f64,
    /// Water level in percentage.
    pub water_level: f64,
}

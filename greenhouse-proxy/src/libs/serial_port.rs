//! Arduino serial port discovery.

use std::io::Error as IoError;

use log::{error, info};
use tokio::io::AsyncRead;
use tokio_serial::{SerialPortBuilderExt, SerialStream};

use super::error::Error;

/// Opens one serial device. Implemented by [`SerialOpener`] for real hardware.
pub trait PortOpener {
    type Port: AsyncRead + Send + Unpin;

    fn open(&self, path: &str, baud_rate: u32) -> Result<Self::Port, IoError>;
}

/// Opens native serial ports with the default 8N1 framing.
pub struct SerialOpener;

/// Number of numbered device paths to scan.
const CANDIDATE_COUNT: usize = 10;

impl PortOpener for SerialOpener {
    type Port = SerialStream;

    fn open(&self, path: &str, baud_rate: u32) -> Result<SerialStream, IoError> {
        let port = tokio_serial::new(path, baud_rate).open_native_async()?;
        Ok(port)
    }
}

/// Device paths to scan. A configured `dev_path` replaces the numbered candidates.
pub fn candidates(dev_path: &str) -> Vec<String> {
    if !dev_path.is_empty() {
        return vec![dev_path.to_string()];
    }
    (0..CANDIDATE_COUNT)
        .map(|i| match cfg!(windows) {
            false => format!("/dev/ttyUSB{}", i),
            true => format!(r"\\.\COM{}", i),
        })
        .collect()
}

/// Try `candidates` in order and return the first port that opens.
pub fn locate<O: PortOpener>(
    opener: &O,
    candidates: &[String],
    baud_rate: u32,
) -> Result<(String, O::Port), Error> {
    const FN_NAME: &'static str = "locate";

    for path in candidates {
        info!("[{}] attempting to open port {}", FN_NAME, path);
        match opener.open(path.as_str(), baud_rate) {
            Err(e) => error!("[{}] could not open port {}: {}", FN_NAME, path, e),
            Ok(port) => {
                info!("[{}] now using port {}", FN_NAME, path);
                return Ok((path.clone(), port));
            }
        }
    }
    Err(Error::DeviceNotFound {
        tried: candidates.len(),
    })
}

//! Supervisor drives the relay:
//! - Search the serial device and wait for the Arduino to reset.
//! - Read records, decode and forward them one by one.
//! - Drop the port and search again when the link stalls.

use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::{io::AsyncRead, time};

use super::{
    decoder,
    error::Error,
    forwarder::Uplink,
    line_framer::LineFramer,
    serial_port::{self, PortOpener},
};

pub struct Options {
    /// Device paths in scan order.
    pub candidates: Vec<String>,
    pub baud_rate: u32,
    /// `None` waits forever for serial data.
    pub read_timeout: Option<Duration>,
    /// Consecutive failed scans before [`Supervisor::run()`] gives up. 0 to scan forever.
    pub max_search: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// No port is open.
    Searching,
    /// A port is open and records are read from it.
    Connected,
    /// Too many consecutive empty or unreadable reads. The port is about to be dropped.
    Stalled,
}

pub struct Supervisor<O, U> {
    opts: Options,
    opener: O,
    uplink: U,
    state: ConnectionState,
}

/// Time for the Arduino to reboot after the port is opened.
const SETTLE_MS: u64 = 1000;
const SEARCH_DELAY_MS: u64 = 1000;
const MAX_SEARCH_DELAY_MS: u64 = 30_000;

impl<O: PortOpener, U: Uplink> Supervisor<O, U> {
    pub fn new(opts: Options, opener: O, uplink: U) -> Self {
        Supervisor {
            opts,
            opener,
            uplink,
            state: ConnectionState::Searching,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Relay records until the device search is exhausted. Never returns `Ok` otherwise.
    pub async fn run(&mut self) -> Result<(), Error> {
        const FN_NAME: &'static str = "run";

        loop {
            let (path, port) = self.search().await?;
            let mut framer = LineFramer::new(port, self.opts.read_timeout);
            info!("[{}] starting to read from port {}", FN_NAME, path);
            self.serve(&mut framer).await;
            warn!(
                "[{}] port {} stalled after {} empty lines, reconnecting",
                FN_NAME,
                path,
                framer.empty_lines()
            );
        }
    }

    /// Scan the candidates until a port opens, backing off between scans.
    ///
    /// Returns [`Error::DeviceNotFound`] after `max_search` failed scans.
    pub async fn search(&mut self) -> Result<(String, O::Port), Error> {
        const FN_NAME: &'static str = "search";

        self.set_state(ConnectionState::Searching);
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match serial_port::locate(&self.opener, &self.opts.candidates, self.opts.baud_rate) {
                Err(e) => {
                    if self.opts.max_search > 0 && attempt >= self.opts.max_search {
                        error!("[{}] give up after {} scans: {}", FN_NAME, attempt, e);
                        return Err(e);
                    }
                    let delay = search_delay(attempt);
                    warn!("[{}] {}, scan again in {} ms", FN_NAME, e, delay);
                    time::sleep(Duration::from_millis(delay)).await;
                }
                Ok((path, port)) => {
                    info!("[{}] waiting for arduino reset", FN_NAME);
                    time::sleep(Duration::from_millis(SETTLE_MS)).await;
                    self.set_state(ConnectionState::Connected);
                    return Ok((path, port));
                }
            }
        }
    }

    /// Read and forward records until the framer reports a stall.
    ///
    /// Only the first of consecutive read failures is logged as a warning.
    pub async fn serve<R: AsyncRead + Unpin>(&mut self, framer: &mut LineFramer<R>) {
        const FN_NAME: &'static str = "serve";

        let mut failing = false;
        loop {
            match framer.next_record().await {
                Err(Error::EmptyRecord) => debug!("[{}] got empty line", FN_NAME),
                Err(e) => {
                    match failing {
                        false => warn!("[{}] {}", FN_NAME, e),
                        true => debug!("[{}] {}", FN_NAME, e),
                    }
                    failing = true;
                }
                Ok(line) => {
                    failing = false;
                    match decoder::decode(line.as_slice()) {
                        Err(e) => warn!("[{}] {}", FN_NAME, e),
                        Ok(m) => {
                            framer.mark_alive();
                            info!(
                                "[{}] air temperature: {:.1} C, humidity: {:.1}%, water level: {:.1}%",
                                FN_NAME, m.air_temperature, m.humidity, m.water_level
                            );
                            if let Err(e) = self.uplink.send(&m).await {
                                error!("[{}] could not send measurement: {}", FN_NAME, e);
                            }
                        }
                    }
                }
            }
            if framer.is_stalled() {
                self.set_state(ConnectionState::Stalled);
                return;
            }
        }
    }

    fn set_state(&mut self, state: ConnectionState) {
        const FN_NAME: &'static str = "set_state";

        if self.state != state {
            info!("[{}] {:?} -> {:?}", FN_NAME, self.state, state);
            self.state = state;
        }
    }
}

/// Delay before the next scan: 1s doubling per failed scan, up to 30s.
fn search_delay(attempt: u32) -> u64 {
    let shift = attempt.saturating_sub(1).min(16);
    SEARCH_DELAY_MS
        .saturating_mul(1 << shift)
        .min(MAX_SEARCH_DELAY_MS)
}

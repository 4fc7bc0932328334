use std::{
    collections::VecDeque,
    io::{Error as IoError, ErrorKind},
    pin::Pin,
    task::{Context, Poll},
};

use async_trait::async_trait;
use logtest::Logger;
use tokio::io::{AsyncRead, ReadBuf};

use greenhouse_proxy::libs::{
    Measurement,
    error::Error,
    forwarder::Uplink,
    line_framer::LineFramer,
    serial_port::PortOpener,
    supervisor::{ConnectionState, Options, Supervisor},
};

const SAMPLE: &str = r#"{"air_temperature":21.5,"humidity":60.2,"water_level":30.0}"#;

/// Yields the scripted chunks and errors, then end of stream forever.
struct ScriptedReader {
    chunks: VecDeque<Result<Vec<u8>, ErrorKind>>,
}

impl AsyncRead for ScriptedReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.chunks.pop_front() {
            None => Poll::Ready(Ok(())),
            Some(Err(kind)) => Poll::Ready(Err(IoError::from(kind))),
            Some(Ok(chunk)) => {
                buf.put_slice(&chunk);
                Poll::Ready(Ok(()))
            }
        }
    }
}

struct NoPort;

impl PortOpener for NoPort {
    type Port = ScriptedReader;

    fn open(&self, _path: &str, _baud_rate: u32) -> Result<Self::Port, IoError> {
        Err(IoError::from(ErrorKind::NotFound))
    }
}

struct Discard;

#[async_trait]
impl Uplink for Discard {
    async fn send(&self, _measurement: &Measurement) -> Result<(), Error> {
        Ok(())
    }
}

// One test per binary: the logger is process wide.
#[tokio::test]
async fn repeated_read_failures_warn_once() {
    let mut logger = Logger::start();
    let opts = Options {
        candidates: vec![],
        baud_rate: 9600,
        read_timeout: None,
        max_search: 1,
    };
    let mut supervisor = Supervisor::new(opts, NoPort, Discard);
    let reader = ScriptedReader {
        chunks: vec![
            Err(ErrorKind::BrokenPipe),
            Err(ErrorKind::BrokenPipe),
            Ok(format!("{}\n", SAMPLE).into_bytes()),
            Err(ErrorKind::BrokenPipe),
        ]
        .into(),
    };
    let mut framer = LineFramer::new(reader, None);

    // The record resets the counter, then one failure and 100 ends of stream reach the stall.
    supervisor.serve(&mut framer).await;
    assert_eq!(supervisor.state(), ConnectionState::Stalled);

    let mut warnings = vec![];
    while let Some(record) = logger.pop() {
        if record.level() == log::Level::Warn && record.args().starts_with("[serve]") {
            warnings.push(record.args().to_string());
        }
    }
    // The first failure of each run of failures; the accepted record starts a new run.
    assert_eq!(warnings.len(), 2, "{:?}", warnings);
    assert!(warnings.iter().all(|w| w.contains("read serial line error")));
}

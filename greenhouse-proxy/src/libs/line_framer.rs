//! Splits the serial byte stream into newline-terminated records and counts consecutive empty or
//! unreadable reads to detect a dead link.

use std::{
    io::{Error as IoError, ErrorKind},
    time::Duration,
};

use tokio::{
    io::{AsyncRead, AsyncReadExt},
    time,
};

use super::error::Error;

pub struct LineFramer<R> {
    reader: R,
    buff: Vec<u8>,
    read_timeout: Option<Duration>,
    /// Consecutive empty lines and read errors.
    empty_lines: u32,
}

/// The link is stalled when the counter exceeds this value.
pub const MAX_EMPTY_LINES: u32 = 100;

/// Lines longer than this without a terminator are dropped.
const MAX_LINE_LEN: usize = 1024;
const READ_CHUNK_SIZE: usize = 64;

impl<R: AsyncRead + Unpin> LineFramer<R> {
    /// Wrap an opened port. `read_timeout` of `None` waits forever for data.
    pub fn new(reader: R, read_timeout: Option<Duration>) -> Self {
        LineFramer {
            reader,
            buff: Vec::with_capacity(MAX_LINE_LEN),
            read_timeout,
            empty_lines: 0,
        }
    }

    /// Read the next record without the line terminator.
    ///
    /// Returns [`Error::EmptyRecord`] for degenerate lines and [`Error::ReadFailure`] for transport
    /// errors, both of which advance the stall counter. The framer stays usable after errors.
    pub async fn next_record(&mut self) -> Result<Vec<u8>, Error> {
        let line = match self.read_line().await {
            Err(e) => {
                self.empty_lines += 1;
                return Err(Error::ReadFailure(e));
            }
            Ok(line) => line,
        };
        let line = strip_terminator(line);
        if line.len() < 2 || line.trim_ascii().is_empty() {
            self.empty_lines += 1;
            return Err(Error::EmptyRecord);
        }
        Ok(line)
    }

    pub fn empty_lines(&self) -> u32 {
        self.empty_lines
    }

    pub fn is_stalled(&self) -> bool {
        self.empty_lines > MAX_EMPTY_LINES
    }

    /// Reset the stall counter after a record has been accepted.
    pub fn mark_alive(&mut self) {
        self.empty_lines = 0;
    }

    /// Read until `\n`, keeping bytes after the terminator for the next call.
    async fn read_line(&mut self) -> Result<Vec<u8>, IoError> {
        loop {
            if let Some(pos) = self.buff.iter().position(|b| *b == b'\n') {
                return Ok(self.buff.drain(..=pos).collect());
            }
            if self.buff.len() > MAX_LINE_LEN {
                self.buff.clear();
                return Err(IoError::new(
                    ErrorKind::InvalidData,
                    format!("no line terminator in {} bytes", MAX_LINE_LEN),
                ));
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let size = match self.read_timeout {
                None => self.reader.read(&mut chunk).await?,
                Some(timeout) => match time::timeout(timeout, self.reader.read(&mut chunk)).await {
                    Err(_) => {
                        return Err(IoError::new(
                            ErrorKind::TimedOut,
                            format!("no data in {} ms", timeout.as_millis()),
                        ));
                    }
                    Ok(size) => size?,
                },
            };
            if size == 0 {
                return Err(IoError::from(ErrorKind::UnexpectedEof));
            }
            self.buff.extend_from_slice(&chunk[..size]);
        }
    }
}

/// Remove the trailing `\n` or `\r\n`.
fn strip_terminator(mut line: Vec<u8>) -> Vec<u8> {
    if line.last() == Some(&b'\n') {
        line.pop();
    }
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    line
}

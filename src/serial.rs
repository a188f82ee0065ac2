// src/serial.rs
//! Exclusive, non-blocking NMEA line sources over serial ports

use crate::error::{CalError, Result};
use std::pin::Pin;
use std::task::Poll;
use tokio::io::{AsyncRead, ReadBuf};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

/// Far beyond any legal NMEA sentence; pending bytes past this without a
/// terminator are line noise (wrong baud rate) and get discarded.
const MAX_PENDING_BYTES: usize = 1024;

/// Byte accumulator that carries partial sentences across reads.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append freshly read bytes.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
        if self.pending.len() > MAX_PENDING_BYTES && !self.pending.contains(&b'\n') {
            self.pending.clear();
        }
    }

    /// Take the next complete line, with the terminator (and a trailing
    /// '\r') stripped. None while no full line is buffered.
    pub fn next_line(&mut self) -> Option<String> {
        let end = self.pending.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.pending.drain(..=end).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}

/// One serial device owned exclusively for the life of the recorder.
#[derive(Debug)]
pub struct NmeaLineSource {
    path: String,
    stream: Option<SerialStream>,
    buffer: LineBuffer,
}

impl NmeaLineSource {
    /// Open the device and claim exclusive access.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let stream = tokio_serial::new(path, baud_rate)
            .open_native_async()
            .map_err(|e| CalError::DeviceUnavailable {
                path: path.to_string(),
                reason: e.to_string(),
            })?;

        #[cfg(unix)]
        let stream = {
            let mut stream = stream;
            stream
                .set_exclusive(true)
                .map_err(|e| CalError::DeviceUnavailable {
                    path: path.to_string(),
                    reason: format!("exclusive access denied: {}", e),
                })?;
            stream
        };

        Ok(Self {
            path: path.to_string(),
            stream: Some(stream),
            buffer: LineBuffer::new(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Return the next complete sentence, reading whatever bytes are
    /// already available without waiting. None means no full line yet.
    pub async fn read_line(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(line) = self.buffer.next_line() {
                return Ok(Some(line));
            }
            let stream = match self.stream.as_mut() {
                Some(stream) => stream,
                None => return Ok(None),
            };
            let mut chunk = [0u8; 512];
            match read_available(stream, &mut chunk).await? {
                Some(n) if n > 0 => self.buffer.extend(&chunk[..n]),
                _ => return Ok(None),
            }
        }
    }

    /// Release the device; safe to call more than once.
    pub fn close(&mut self) {
        self.stream = None;
    }
}

/// Poll the stream exactly once: resolves immediately with None when no
/// bytes are ready instead of suspending.
async fn read_available(
    stream: &mut SerialStream,
    buf: &mut [u8],
) -> std::io::Result<Option<usize>> {
    let mut read_buf = ReadBuf::new(buf);
    std::future::poll_fn(|cx| match Pin::new(&mut *stream).poll_read(cx, &mut read_buf) {
        Poll::Ready(Ok(())) => Poll::Ready(Ok(Some(read_buf.filled().len()))),
        Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
        Poll::Pending => Poll::Ready(Ok(None)),
    })
    .await
}

use crate::types::OrientationSample;
use thiserror::Error;

/// Sample records are separated by this byte.
const DELIMITER: u8 = b'\n';

/// Longest line accepted before the decoder gives up on it.
pub const MAX_LINE_LEN: usize = 4096;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Sample line is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("Malformed sample: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Sample line exceeds {MAX_LINE_LEN} bytes ({0} buffered)")]
    LineTooLong(usize),
}

/// Streaming decoder for the orientation sample stream.
///
/// The stream is newline-delimited JSON, one object per reading:
/// `{"alpha": 12.5, "beta": -3.0, "gamma": 40.1}`. Axes the sensor could not
/// report are `null` or left out. Feed raw bytes via `push_data`, then drain
/// decoded samples via `next_sample`.
///
/// A line longer than `MAX_LINE_LEN` is reported once and then skipped up to
/// its terminating newline.
pub struct SampleDecoder {
    buffer: Vec<u8>,
    /// Bytes at the front of `buffer` already known to hold no delimiter.
    scanned: usize,
    /// Dropping the rest of an oversized line.
    discarding: bool,
}

impl Default for SampleDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleDecoder {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(MAX_LINE_LEN),
            scanned: 0,
            discarding: false,
        }
    }

    /// Append received bytes to the internal buffer.
    pub fn push_data(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to decode the next complete line from the buffer.
    /// Returns `None` if no complete line is available yet.
    pub fn next_sample(&mut self) -> Option<Result<OrientationSample, ProtocolError>> {
        loop {
            let Some(offset) = self.buffer[self.scanned..]
                .iter()
                .position(|&b| b == DELIMITER)
            else {
                self.scanned = self.buffer.len();
                return self.check_overflow();
            };

            let end = self.scanned + offset;
            let line: Vec<u8> = self.buffer.drain(..=end).collect();
            self.scanned = 0;

            // Tail of an oversized line.
            if std::mem::take(&mut self.discarding) {
                continue;
            }

            let line = &line[..end];
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            return Some(parse_line(line));
        }
    }

    fn check_overflow(&mut self) -> Option<Result<OrientationSample, ProtocolError>> {
        if self.buffer.len() <= MAX_LINE_LEN {
            return None;
        }
        let buffered = self.buffer.len();
        self.buffer.clear();
        self.scanned = 0;
        if self.discarding {
            return None;
        }
        self.discarding = true;
        Some(Err(ProtocolError::LineTooLong(buffered)))
    }
}

fn parse_line(line: &[u8]) -> Result<OrientationSample, ProtocolError> {
    let text = std::str::from_utf8(line)?;
    Ok(serde_json::from_str(text.trim())?)
}

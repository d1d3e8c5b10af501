//! Delimiter framing
//!
//! SW16 frames are self-delimited: every frame ends with a reserved delimiter
//! byte. [`DelimiterFramer`] plugs into `tokio_util::codec::Framed` and yields
//! frame bodies with the delimiter stripped.

use bytes::{Bytes, BytesMut};
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

/// Reserved frame delimiter byte
pub const FRAME_DELIMITER: u8 = 0xDD;

/// Longest body accepted before the delimiter must appear
pub const MAX_FRAME_LEN: usize = 1024;

/// Framing errors
#[derive(Error, Debug)]
pub enum FrameError {
    /// I/O error from the underlying stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No delimiter within the length limit
    #[error("no frame delimiter within {limit} bytes")]
    Oversized {
        /// Length limit that was exceeded
        limit: usize,
    },

    /// Stream ended in the middle of a frame
    #[error("connection closed with {buffered} bytes of an unterminated frame")]
    Incomplete {
        /// Bytes buffered when the stream ended
        buffered: usize,
    },
}

/// Splits a byte stream into delimiter-terminated frames
#[derive(Debug, Clone)]
pub struct DelimiterFramer {
    delimiter: u8,
    max_length: usize,
    // Bytes already searched for the delimiter.
    scanned: usize,
}

impl DelimiterFramer {
    /// Create a framer for the SW16 delimiter
    pub fn new() -> Self {
        Self::with_delimiter(FRAME_DELIMITER)
    }

    /// Create a framer for an arbitrary delimiter byte
    pub fn with_delimiter(delimiter: u8) -> Self {
        Self {
            delimiter,
            max_length: MAX_FRAME_LEN,
            scanned: 0,
        }
    }

    /// Set the maximum body length
    #[must_use]
    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }
}

impl Default for DelimiterFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for DelimiterFramer {
    type Item = BytesMut;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<BytesMut>, FrameError> {
        let start = self.scanned.min(src.len());
        let found = src[start..]
            .iter()
            .position(|&b| b == self.delimiter)
            .map(|offset| start + offset);

        match found {
            Some(index) if index > self.max_length => Err(FrameError::Oversized {
                limit: self.max_length,
            }),
            Some(index) => {
                self.scanned = 0;
                let mut frame = src.split_to(index + 1);
                frame.truncate(index);
                Ok(Some(frame))
            }
            None if src.len() > self.max_length => Err(FrameError::Oversized {
                limit: self.max_length,
            }),
            None => {
                self.scanned = src.len();
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<BytesMut>, FrameError> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => Err(FrameError::Incomplete { buffered: src.len() }),
        }
    }
}

impl Encoder<Bytes> for DelimiterFramer {
    type Error = FrameError;

    // Outgoing frames come fully encoded from the frame codec.
    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), FrameError> {
        dst.extend_from_slice(&item);
        Ok(())
    }
}

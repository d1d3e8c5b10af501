//! HLK-SW16 frame layout
//!
//! Request (20 bytes):
//!
//! ```text
//! AA | cmd[17] (opcode, zero padded) | 0B | DD
//! ```
//!
//! Status response body (19 bytes, delimiter stripped):
//!
//! ```text
//! CC | payload[17] | sum8(payload)
//! ```

use super::checksum::verify_sum8;
use super::codec::FrameCodec;
use super::framing::FRAME_DELIMITER;
use bytes::{BufMut, Bytes, BytesMut};

/// Request frame header
pub const REQUEST_HEADER: u8 = 0xAA;

/// Response frame header
pub const RESPONSE_HEADER: u8 = 0xCC;

/// Fixed verify byte preceding the request delimiter
pub const REQUEST_VERIFY: u8 = 0x0B;

/// Command field width in request frames
pub const COMMAND_LEN: usize = 17;

/// Length of a response body without the delimiter
pub const RESPONSE_BODY_LEN: usize = 19;

/// Codec for the HLK-SW16 16-channel relay board
#[derive(Debug, Clone, Copy, Default)]
pub struct Sw16Codec;

impl Sw16Codec {
    /// Create a new codec
    pub fn new() -> Self {
        Self
    }

    /// Build a request frame for an arbitrary command field
    ///
    /// Commands longer than [`COMMAND_LEN`] are truncated.
    pub fn format_packet(command: &[u8]) -> Bytes {
        let mut frame = BytesMut::with_capacity(COMMAND_LEN + 3);
        frame.put_u8(REQUEST_HEADER);

        let len = command.len().min(COMMAND_LEN);
        frame.put_slice(&command[..len]);
        frame.put_bytes(0x00, COMMAND_LEN - len);

        frame.put_u8(REQUEST_VERIFY);
        frame.put_u8(FRAME_DELIMITER);
        frame.freeze()
    }
}

impl FrameCodec for Sw16Codec {
    fn encode(&self, opcode: u8) -> Bytes {
        Self::format_packet(&[opcode])
    }

    fn is_valid(&self, frame_body: &[u8]) -> bool {
        if frame_body.len() != RESPONSE_BODY_LEN || frame_body[0] != RESPONSE_HEADER {
            return false;
        }
        let (payload, checksum) = frame_body[1..].split_at(RESPONSE_BODY_LEN - 2);
        verify_sum8(payload, checksum[0])
    }
}

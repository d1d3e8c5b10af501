//! Frame codec seam
//!
//! The prober treats the wire codec as a black box: it asks for a complete
//! request frame for an opcode and for a yes/no integrity verdict on a
//! received frame body.

use bytes::Bytes;

/// Opcode reserved for "query status"
pub const STATUS_QUERY_OPCODE: u8 = 0x1E;

/// Encoder/validator for a device wire protocol
pub trait FrameCodec: Send + Sync {
    /// Produce a complete wire frame for a single-opcode command,
    /// terminated by the frame delimiter
    fn encode(&self, opcode: u8) -> Bytes;

    /// Whether a received frame body (delimiter stripped) passes the
    /// protocol's integrity rule
    fn is_valid(&self, frame_body: &[u8]) -> bool;
}

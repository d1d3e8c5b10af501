//! Protocol implementations
//!
//! Provides the pieces the handshake needs from the SW16 wire protocol:
//! - Frame codec seam and the default HLK-SW16 codec
//! - Sum-8 checksum
//! - Delimiter framing for `tokio_util::codec::Framed`

pub mod checksum;
pub mod codec;
pub mod framing;
pub mod sw16;

pub use codec::{FrameCodec, STATUS_QUERY_OPCODE};
pub use framing::{DelimiterFramer, FrameError, FRAME_DELIMITER, MAX_FRAME_LEN};
pub use sw16::Sw16Codec;

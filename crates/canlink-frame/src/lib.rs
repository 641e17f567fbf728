//! Raw CAN frame codec, payload chunking and ISO-TP message I/O.
//!
//! Raw mode speaks the kernel `struct can_frame` layout directly:
//! - A host-order 32-bit identifier word (11-bit standard identifiers only)
//! - A length byte (0-8) followed by three zero bytes
//! - Eight data bytes, zero-padded past the length
//!
//! Payloads longer than 8 bytes are split by [`chunk_message`]. ISO-TP mode
//! needs no codec: the kernel segments and reassembles whole messages.

pub mod chunk;
pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use chunk::{chunk_message, frame_count, Chunks};
pub use codec::{
    decode_frame, encode_frame, payload_preview, CanFrame, CAN_FRAME_SIZE, CAN_MAX_DLEN,
};
pub use error::{FrameError, Result};
pub use reader::{Delivery, FrameReader};
pub use writer::FrameWriter;

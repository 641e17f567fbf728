//! Duplex CAN bus transport over Linux SocketCAN.
//!
//! canlink sends a message periodically and prints whatever arrives, either
//! as raw 8-byte CAN frames with 11-bit identifiers or as kernel ISO-TP
//! messages.
//!
//! # Crate Structure
//!
//! - [`transport`]: SocketCAN channel setup and the `CanIo` trait
//! - [`frame`]: Raw frame codec, chunking and ISO-TP message I/O
//! - [`session`]: Transmitter/receiver tasks and lifecycle (behind `session` feature)

/// Re-export transport types.
pub mod transport {
    pub use canlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use canlink_frame::*;
}

/// Re-export session types (requires `session` feature).
#[cfg(feature = "session")]
pub mod session {
    pub use canlink_session::*;
}

/// Errors that can occur during frame encoding/decoding and channel I/O.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The datagram is not exactly one `struct can_frame`.
    #[error("incomplete CAN frame ({got} bytes, expected {expected})")]
    Incomplete { got: usize, expected: usize },

    /// The length field exceeds the 8-byte link-layer limit.
    #[error("invalid CAN frame length {0} (max 8)")]
    InvalidLength(u8),

    /// The identifier does not fit 11 bits.
    #[error("invalid standard identifier 0x{0:X}")]
    InvalidIdentifier(u32),

    /// Extended, remote-request or error frames are not carried.
    #[error("unsupported CAN frame: {0}")]
    UnsupportedFrame(&'static str),

    /// The payload exceeds what one frame or message can carry.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The kernel accepted fewer bytes than one datagram.
    #[error("short write ({written} of {expected} bytes)")]
    ShortWrite { written: usize, expected: usize },

    /// No datagram arrived within the channel read timeout.
    #[error("read timed out")]
    TimedOut,

    /// An I/O error occurred while reading or writing.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// Returns true for errors caused by the received bytes themselves.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            FrameError::Incomplete { .. }
                | FrameError::InvalidLength(_)
                | FrameError::UnsupportedFrame(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;

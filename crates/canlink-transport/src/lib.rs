//! SocketCAN channel configuration.
//!
//! Opens and configures the two kinds of CAN endpoint canlink works with:
//! - Raw CAN (`CAN_RAW`): 8-byte frames, optional identifier filter,
//!   loopback of own frames disabled
//! - ISO-TP (`CAN_ISOTP`): kernel-segmented messages between a fixed
//!   transmit/receive identifier pair, with flow-control parameters
//!
//! This is the lowest layer of canlink. Everything else builds on the
//! [`CanIo`] trait provided here.

pub mod config;
pub mod error;
pub mod traits;

#[cfg(target_os = "linux")]
pub mod socket;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use config::{
    is_standard_id, ChannelConfig, ChannelMode, FilterMode, FilterRule, FlowControl,
    DEFAULT_RECEIVE_BUFFER, MAX_ISOTP_PAYLOAD, MIN_READ_TIMEOUT, STANDARD_ID_MASK,
};
pub use error::{Result, SetupStage, TransportError};
pub use traits::{is_timeout, CanIo};

#[cfg(target_os = "linux")]
pub use socket::CanSocket;

#[cfg(any(test, feature = "mock"))]
pub use mock::MockChannel;

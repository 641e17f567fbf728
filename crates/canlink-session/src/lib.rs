//! Duplex CAN sessions.
//!
//! A [`Session`] owns one channel and runs two tasks on it until its
//! [`RunningFlag`] is cleared:
//! - A transmitter that repeats one outgoing message at a fixed interval
//! - A receiver that decodes inbound traffic and hands it to a sink
//!
//! Neither task ever fails the session over a single bad frame or send.

pub mod config;
pub mod error;
pub mod flag;
pub mod link;
mod receiver;
pub mod report;
pub mod session;
mod transmitter;

pub use config::{
    default_isotp_payload, Outgoing, ReceiveStrategy, SessionConfig, DEFAULT_BLOCKING_DELAY,
    DEFAULT_MESSAGE_INTERVAL, DEFAULT_RAW_ID, DEFAULT_RAW_PAYLOAD, DEFAULT_WAIT_TIMEOUT,
    MIN_WAIT_TIMEOUT,
};
pub use error::{Result, SessionError};
pub use flag::RunningFlag;
pub use link::{InterfaceControl, LinkGuard};
pub use receiver::DeliverySink;
pub use report::SessionReport;
pub use session::Session;

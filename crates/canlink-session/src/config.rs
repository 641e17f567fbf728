use std::time::Duration;

use bytes::Bytes;
use canlink_transport::{is_standard_id, ChannelMode, MAX_ISOTP_PAYLOAD};

use crate::error::{Result, SessionError};

/// Default pause between two outgoing messages.
pub const DEFAULT_MESSAGE_INTERVAL: Duration = Duration::from_secs(1);

/// Default bound on a single readiness wait or read.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(1);

/// Shortest usable wait timeout: readiness waits have millisecond
/// resolution.
pub const MIN_WAIT_TIMEOUT: Duration = Duration::from_millis(1);

/// Default pause between reads under [`ReceiveStrategy::Blocking`].
pub const DEFAULT_BLOCKING_DELAY: Duration = Duration::from_millis(10);

/// Payload sent on every raw transmit cycle unless overridden.
pub const DEFAULT_RAW_PAYLOAD: &[u8] = b"hello world hello can";

/// Identifier used for raw transmit and the default raw filter.
pub const DEFAULT_RAW_ID: u32 = 0x123;

/// Default ISO-TP payload: bytes `0..100`.
pub fn default_isotp_payload() -> Bytes {
    (0u8..100).collect::<Vec<u8>>().into()
}

/// How the receiver waits for inbound data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReceiveStrategy {
    /// Blocking reads bounded by the channel read timeout, with a short
    /// pause after each read.
    Blocking,
    /// Wait for readiness with a timeout, read only when data is pending.
    #[default]
    Multiplexed,
}

impl ReceiveStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            ReceiveStrategy::Blocking => "blocking",
            ReceiveStrategy::Multiplexed => "multiplexed",
        }
    }
}

impl std::fmt::Display for ReceiveStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The message the transmitter repeats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    /// Raw frames on `id`; payloads over 8 bytes are chunked.
    Raw { id: u32, payload: Bytes },
    /// One ISO-TP message, segmented by the kernel.
    IsoTp { payload: Bytes },
}

impl Outgoing {
    pub fn raw(id: u32, payload: impl Into<Bytes>) -> Self {
        Outgoing::Raw {
            id,
            payload: payload.into(),
        }
    }

    pub fn isotp(payload: impl Into<Bytes>) -> Self {
        Outgoing::IsoTp {
            payload: payload.into(),
        }
    }

    pub fn payload(&self) -> &Bytes {
        match self {
            Outgoing::Raw { payload, .. } | Outgoing::IsoTp { payload } => payload,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            Outgoing::Raw { id, .. } if !is_standard_id(*id) => Err(SessionError::InvalidOutgoing(
                format!("identifier 0x{id:X} is not an 11-bit identifier"),
            )),
            Outgoing::IsoTp { payload } if payload.len() > MAX_ISOTP_PAYLOAD => {
                Err(SessionError::InvalidOutgoing(format!(
                    "ISO-TP payload of {} bytes exceeds {MAX_ISOTP_PAYLOAD}",
                    payload.len()
                )))
            }
            _ => Ok(()),
        }
    }

    /// Check that this message can be carried by a channel in `mode`.
    pub(crate) fn check_mode(&self, mode: &ChannelMode) -> Result<()> {
        match (self, mode) {
            (Outgoing::Raw { .. }, ChannelMode::Raw { .. })
            | (Outgoing::IsoTp { .. }, ChannelMode::IsoTp { .. }) => Ok(()),
            _ => Err(SessionError::InvalidOutgoing(format!(
                "outgoing message does not match {} channel",
                mode.name()
            ))),
        }
    }
}

/// Session timing and receive behavior.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub strategy: ReceiveStrategy,
    /// Pause between two outgoing messages.
    pub message_interval: Duration,
    /// Upper bound on one readiness wait or blocking read. Also bounds how
    /// long either task takes to notice a stop request.
    pub wait_timeout: Duration,
    /// Pause after each blocking read.
    pub blocking_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            strategy: ReceiveStrategy::default(),
            message_interval: DEFAULT_MESSAGE_INTERVAL,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            blocking_delay: DEFAULT_BLOCKING_DELAY,
        }
    }
}

impl SessionConfig {
    pub fn with_strategy(mut self, strategy: ReceiveStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_message_interval(mut self, interval: Duration) -> Self {
        self.message_interval = interval;
        self
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.wait_timeout < MIN_WAIT_TIMEOUT {
            return Err(SessionError::InvalidConfig(format!(
                "wait timeout {:?} is below {MIN_WAIT_TIMEOUT:?}",
                self.wait_timeout
            )));
        }
        if self.message_interval.is_zero() {
            return Err(SessionError::InvalidConfig(
                "message interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

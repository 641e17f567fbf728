use std::time::Duration;

use crate::error::{Result, TransportError};

/// Default kernel receive buffer: 1 MiB.
pub const DEFAULT_RECEIVE_BUFFER: usize = 1024 * 1024;

/// Shortest read timeout the kernel can represent (`timeval` resolution).
/// Anything shorter rounds to zero, which `SO_RCVTIMEO` treats as "never".
pub const MIN_READ_TIMEOUT: Duration = Duration::from_micros(1);

/// Mask covering every bit of an 11-bit standard identifier.
pub const STANDARD_ID_MASK: u32 = 0x7FF;

/// Largest ISO-TP payload the kernel transport carries (classic CAN).
pub const MAX_ISOTP_PAYLOAD: usize = 4095;

/// Returns true if `id` fits an 11-bit standard identifier.
pub fn is_standard_id(id: u32) -> bool {
    id <= STANDARD_ID_MASK
}

/// One acceptance filter: a frame is delivered when
/// `received_id & mask == id & mask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterRule {
    pub id: u32,
    pub mask: u32,
}

impl FilterRule {
    /// Match exactly one standard identifier.
    pub fn standard(id: u32) -> Self {
        Self {
            id,
            mask: STANDARD_ID_MASK,
        }
    }
}

/// Raw-mode receive filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Clear all filters; every frame on the bus is delivered.
    #[default]
    AcceptAll,
    /// Deliver only frames matching a single rule.
    Only(FilterRule),
}

/// ISO-TP flow-control parameters advertised to the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowControl {
    /// Consecutive frames per block (0 = unlimited).
    pub block_size: u8,
    /// Minimum separation time, raw ISO-TP STmin encoding (0x00-0x7F = ms).
    pub st_min: u8,
    /// Maximum number of wait frames.
    pub wft_max: u8,
}

impl Default for FlowControl {
    fn default() -> Self {
        Self {
            block_size: 8,
            st_min: 5,
            wft_max: 0,
        }
    }
}

/// Addressing/framing mode of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    /// Raw 8-byte CAN frames (`CAN_RAW`).
    Raw { filter: FilterMode },
    /// Kernel-segmented ISO-TP messages (`CAN_ISOTP`).
    IsoTp {
        tx_id: u32,
        rx_id: u32,
        flow_control: FlowControl,
    },
}

impl ChannelMode {
    pub fn name(&self) -> &'static str {
        match self {
            ChannelMode::Raw { .. } => "raw",
            ChannelMode::IsoTp { .. } => "isotp",
        }
    }
}

/// Everything needed to open a channel. Resolved once, immutable afterwards.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub mode: ChannelMode,
    /// Kernel receive buffer size in bytes. Default: 1 MiB.
    pub receive_buffer_size: usize,
    /// Read timeout applied to blocking reads. `None` blocks indefinitely;
    /// `Some` must be at least [`MIN_READ_TIMEOUT`].
    pub read_timeout: Option<Duration>,
    /// Raw only: keep frames sent by this host from reaching local sockets,
    /// so the receiver never sees its own transmitter. Default: true.
    pub suppress_loopback: bool,
}

impl ChannelConfig {
    /// Raw channel with the given filter.
    pub fn raw(filter: FilterMode) -> Self {
        Self {
            mode: ChannelMode::Raw { filter },
            receive_buffer_size: DEFAULT_RECEIVE_BUFFER,
            read_timeout: None,
            suppress_loopback: true,
        }
    }

    /// ISO-TP channel with default flow control.
    pub fn isotp(tx_id: u32, rx_id: u32) -> Self {
        Self {
            mode: ChannelMode::IsoTp {
                tx_id,
                rx_id,
                flow_control: FlowControl::default(),
            },
            receive_buffer_size: DEFAULT_RECEIVE_BUFFER,
            read_timeout: None,
            suppress_loopback: true,
        }
    }

    /// Override ISO-TP flow control. No effect on raw channels.
    pub fn with_flow_control(mut self, fc: FlowControl) -> Self {
        if let ChannelMode::IsoTp { flow_control, .. } = &mut self.mode {
            *flow_control = fc;
        }
        self
    }

    /// Apply a read timeout so blocking reads return periodically.
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Keep local loopback of sent frames (e.g. to inject frames on a vcan
    /// bus from the same host).
    pub fn with_loopback(mut self, enabled: bool) -> Self {
        self.suppress_loopback = !enabled;
        self
    }

    /// Check identifiers and sizes before any socket is created.
    pub fn validate(&self) -> Result<()> {
        match self.mode {
            ChannelMode::Raw {
                filter: FilterMode::Only(rule),
            } if !is_standard_id(rule.id) => Err(TransportError::InvalidConfig(format!(
                "filter identifier 0x{:X} is not an 11-bit identifier",
                rule.id
            ))),
            ChannelMode::Raw { .. } => Ok(()),
            ChannelMode::IsoTp { tx_id, rx_id, .. } => {
                for (name, id) in [("tx", tx_id), ("rx", rx_id)] {
                    if !is_standard_id(id) {
                        return Err(TransportError::InvalidConfig(format!(
                            "{name} identifier 0x{id:X} is not an 11-bit identifier"
                        )));
                    }
                }
                if tx_id == rx_id {
                    return Err(TransportError::InvalidConfig(format!(
                        "tx and rx identifiers must differ (both 0x{tx_id:X})"
                    )));
                }
                Ok(())
            }
        }?;

        if let Some(timeout) = self.read_timeout {
            if timeout < MIN_READ_TIMEOUT {
                return Err(TransportError::InvalidConfig(format!(
                    "read timeout {timeout:?} is below {MIN_READ_TIMEOUT:?}"
                )));
            }
        }

        if self.receive_buffer_size == 0 || self.receive_buffer_size > i32::MAX as usize {
            return Err(TransportError::InvalidConfig(format!(
                "receive buffer size {} out of range",
                self.receive_buffer_size
            )));
        }
        Ok(())
    }
}

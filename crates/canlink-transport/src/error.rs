use std::fmt;

/// Channel setup step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStage {
    /// Allocating the socket.
    Socket,
    /// Sizing the kernel receive buffer (`SO_RCVBUF`).
    ReceiveBuffer,
    /// Installing or clearing the raw identifier filter.
    Filter,
    /// Disabling loopback of self-sent frames.
    Loopback,
    /// Installing ISO-TP flow-control parameters.
    FlowControl,
    /// Applying the socket read timeout (`SO_RCVTIMEO`).
    ReadTimeout,
    /// Resolving the interface name to an index.
    InterfaceIndex,
    /// Binding the socket to the interface.
    Bind,
}

impl SetupStage {
    pub fn as_str(self) -> &'static str {
        match self {
            SetupStage::Socket => "socket",
            SetupStage::ReceiveBuffer => "receive buffer",
            SetupStage::Filter => "filter",
            SetupStage::Loopback => "loopback",
            SetupStage::FlowControl => "flow control",
            SetupStage::ReadTimeout => "read timeout",
            SetupStage::InterfaceIndex => "interface index",
            SetupStage::Bind => "bind",
        }
    }
}

impl fmt::Display for SetupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while opening or using a CAN channel.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// A configuration step failed; the partially created socket was closed.
    #[error("{stage} setup failed on {interface}: {source}")]
    Setup {
        stage: SetupStage,
        interface: String,
        source: std::io::Error,
    },

    /// The interface name cannot be passed to the kernel.
    #[error("invalid interface name {name:?}: {reason}")]
    InterfaceName { name: String, reason: &'static str },

    /// The channel configuration is inconsistent.
    #[error("invalid channel configuration: {0}")]
    InvalidConfig(String),

    /// An I/O error occurred on an open channel.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// The setup stage that failed, if this is a setup error.
    pub fn stage(&self) -> Option<SetupStage> {
        match self {
            TransportError::Setup { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;

use std::fmt;
use std::io;

use canlink_session::SessionError;
use canlink_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NetworkDown => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Setup { ref source, .. }
            if source.kind() == io::ErrorKind::PermissionDenied =>
        {
            CliError::new(PERMISSION_DENIED, format!("{context}: {err}"))
        }
        TransportError::InterfaceName { .. } | TransportError::InvalidConfig(_) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        TransportError::Io(source) => io_error(context, source),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::Transport(err) => transport_error(context, err),
        SessionError::InvalidOutgoing(_) | SessionError::InvalidConfig(_) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use canlink_transport::SetupStage;

    use super::*;

    #[test]
    fn setup_failures_map_to_transport_error() {
        let err = TransportError::Setup {
            stage: SetupStage::InterfaceIndex,
            interface: "can9".to_string(),
            source: io::Error::from_raw_os_error(19),
        };
        let cli = transport_error("channel setup failed", err);
        assert_eq!(cli.code, TRANSPORT_ERROR);
        assert!(cli.message.contains("can9"));
    }

    #[test]
    fn permission_denied_setup_is_distinguished() {
        let err = TransportError::Setup {
            stage: SetupStage::Socket,
            interface: "can0".to_string(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(transport_error("x", err).code, PERMISSION_DENIED);
    }

    #[test]
    fn configuration_errors_are_usage_errors() {
        let err = SessionError::Transport(TransportError::InvalidConfig("bad".into()));
        assert_eq!(session_error("x", err).code, USAGE);
        let err = SessionError::InvalidOutgoing("bad".into());
        assert_eq!(session_error("x", err).code, USAGE);
        let err = SessionError::TaskPanicked("receiver");
        assert_eq!(session_error("x", err).code, INTERNAL);
    }
}

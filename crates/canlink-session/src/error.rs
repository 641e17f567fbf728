/// Errors that can occur while setting up or running a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Channel setup failed.
    #[error("transport error: {0}")]
    Transport(#[from] canlink_transport::TransportError),

    /// Session timing is unusable.
    #[error("invalid session config: {0}")]
    InvalidConfig(String),

    /// The outgoing message does not fit the channel.
    #[error("invalid outgoing message: {0}")]
    InvalidOutgoing(String),

    /// A task thread could not be started; any started task was stopped and
    /// joined before this was returned.
    #[error("failed to start {task} task: {source}")]
    TaskStart {
        task: &'static str,
        source: std::io::Error,
    },

    /// A task panicked; the other task was joined before this was returned.
    #[error("{0} task panicked")]
    TaskPanicked(&'static str),
}

pub type Result<T> = std::result::Result<T, SessionError>;

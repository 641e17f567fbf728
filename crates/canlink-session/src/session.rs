use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use canlink_frame::FrameReader;
use canlink_transport::CanIo;
#[cfg(target_os = "linux")]
use canlink_transport::{CanSocket, ChannelConfig};
use tracing::{debug, info, warn};

use crate::config::{Outgoing, SessionConfig};
#[cfg(target_os = "linux")]
use crate::config::ReceiveStrategy;
use crate::error::{Result, SessionError};
use crate::flag::{RunningFlag, StopOnExit};
use crate::receiver::{DeliverySink, Receiver};
use crate::report::{SessionReport, SessionStats};
use crate::transmitter::Transmitter;

type Task = Box<dyn FnOnce() + Send + 'static>;

fn spawn_named(name: &'static str, task: Task) -> io::Result<JoinHandle<()>> {
    thread::Builder::new().name(name.to_string()).spawn(task)
}

/// One duplex session: a transmitter and a receiver sharing a channel.
///
/// The channel is released after both tasks have exited, on every path.
pub struct Session<C> {
    channel: Arc<C>,
    outgoing: Outgoing,
    config: SessionConfig,
    running: RunningFlag,
    stats: Arc<SessionStats>,
}

#[cfg(target_os = "linux")]
impl Session<CanSocket> {
    /// Open a SocketCAN channel on `interface` and prepare a session on it.
    ///
    /// Under [`ReceiveStrategy::Blocking`] a channel without a read timeout
    /// gets `config.wait_timeout`, so blocking reads return to check for a
    /// stop request.
    pub fn open(
        interface: &str,
        mut channel: ChannelConfig,
        outgoing: Outgoing,
        config: SessionConfig,
    ) -> Result<Self> {
        outgoing.check_mode(&channel.mode)?;
        outgoing.validate()?;
        config.validate()?;

        if config.strategy == ReceiveStrategy::Blocking && channel.read_timeout.is_none() {
            channel.read_timeout = Some(config.wait_timeout);
        }
        let socket = CanSocket::open(interface, &channel)?;
        debug!(
            interface = socket.interface(),
            index = socket.index(),
            transport = socket.transport_name(),
            strategy = %config.strategy,
            "session prepared"
        );
        Self::from_shared(Arc::new(socket), outgoing, config)
    }
}

impl<C: CanIo + 'static> Session<C> {
    pub fn new(channel: C, outgoing: Outgoing, config: SessionConfig) -> Result<Self> {
        Self::from_shared(Arc::new(channel), outgoing, config)
    }

    /// Build a session on an already shared channel.
    ///
    /// For [`ReceiveStrategy::Blocking`](crate::ReceiveStrategy::Blocking)
    /// the channel's reads must time out, or shutdown waits for the next
    /// inbound datagram.
    pub fn from_shared(channel: Arc<C>, outgoing: Outgoing, config: SessionConfig) -> Result<Self> {
        outgoing.validate()?;
        config.validate()?;
        Ok(Self {
            channel,
            outgoing,
            config,
            running: RunningFlag::new(),
            stats: Arc::new(SessionStats::default()),
        })
    }

    /// Flag that stops the session when cleared. Take it before [`run`](Self::run).
    pub fn running(&self) -> RunningFlag {
        self.running.clone()
    }

    /// Start both tasks and block until they have exited.
    ///
    /// Returns once the running flag is cleared and both tasks have been
    /// joined. `sink` receives every delivery on the receiver thread.
    pub fn run(self, sink: DeliverySink) -> Result<SessionReport> {
        self.run_with(sink, spawn_named)
    }

    fn run_with<S>(self, sink: DeliverySink, mut spawn: S) -> Result<SessionReport>
    where
        S: FnMut(&'static str, Task) -> io::Result<JoinHandle<()>>,
    {
        let Session {
            channel,
            outgoing,
            config,
            running,
            stats,
        } = self;

        let reader = match outgoing {
            Outgoing::Raw { .. } => FrameReader::raw(Arc::clone(&channel)),
            Outgoing::IsoTp { .. } => FrameReader::isotp(Arc::clone(&channel)),
        };
        let receiver = Receiver::new(
            reader,
            config.strategy,
            config.wait_timeout,
            config.blocking_delay,
            running.clone(),
            Arc::clone(&stats),
            sink,
        );
        let transmitter = Transmitter::new(
            Arc::clone(&channel),
            outgoing,
            config.message_interval,
            config.wait_timeout,
            running.clone(),
            Arc::clone(&stats),
        );

        let tx_flag = running.clone();
        let tx_handle = spawn(
            "canlink-tx",
            Box::new(move || {
                let _stop = StopOnExit(tx_flag);
                transmitter.run();
            }),
        )
        .map_err(|source| {
            running.stop();
            SessionError::TaskStart {
                task: "transmitter",
                source,
            }
        })?;

        let rx_flag = running.clone();
        let rx_handle = match spawn(
            "canlink-rx",
            Box::new(move || {
                let _stop = StopOnExit(rx_flag);
                receiver.run();
            }),
        ) {
            Ok(handle) => handle,
            Err(source) => {
                running.stop();
                if tx_handle.join().is_err() {
                    warn!("transmitter task panicked");
                }
                return Err(SessionError::TaskStart {
                    task: "receiver",
                    source,
                });
            }
        };

        let tx_result = tx_handle.join();
        let rx_result = rx_handle.join();
        drop(channel);

        let report = stats.snapshot();
        info!(
            messages_sent = report.messages_sent,
            frames_sent = report.frames_sent,
            send_failures = report.send_failures,
            deliveries = report.deliveries,
            malformed = report.malformed,
            read_failures = report.read_failures,
            "session finished"
        );

        if tx_result.is_err() {
            return Err(SessionError::TaskPanicked("transmitter"));
        }
        if rx_result.is_err() {
            return Err(SessionError::TaskPanicked("receiver"));
        }
        Ok(report)
    }
}

impl<C> std::fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("outgoing", &self.outgoing)
            .field("config", &self.config)
            .field("running", &self.running.is_running())
            .finish_non_exhaustive()
    }
}

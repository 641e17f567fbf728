use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use canlink_frame::{chunk_message, payload_preview, FrameWriter};
use canlink_transport::CanIo;
use tracing::{debug, info, warn};

use crate::config::Outgoing;
use crate::flag::RunningFlag;
use crate::report::SessionStats;

const PREVIEW_BYTES: usize = 16;

/// Periodically sends one message until the running flag is cleared.
///
/// Send failures are logged and counted, never fatal: the next frame or cycle
/// is attempted regardless.
pub struct Transmitter<C> {
    writer: FrameWriter<C>,
    outgoing: Outgoing,
    interval: Duration,
    slice: Duration,
    running: RunningFlag,
    stats: Arc<SessionStats>,
}

impl<C: CanIo> Transmitter<C> {
    pub(crate) fn new(
        channel: C,
        outgoing: Outgoing,
        interval: Duration,
        slice: Duration,
        running: RunningFlag,
        stats: Arc<SessionStats>,
    ) -> Self {
        Self {
            writer: FrameWriter::new(channel),
            outgoing,
            interval,
            slice,
            running,
            stats,
        }
    }

    pub(crate) fn run(mut self) {
        debug!("transmitter started");
        while self.running.is_running() {
            self.send_once();
            self.pause();
        }
        debug!("transmitter stopped");
    }

    /// Send the message once. Returns true if every write succeeded.
    pub(crate) fn send_once(&mut self) -> bool {
        let ok = match &self.outgoing {
            Outgoing::Raw { id, payload } => {
                let chunks = match chunk_message(*id, payload) {
                    Ok(chunks) => chunks,
                    Err(err) => {
                        warn!(error = %err, "cannot frame outgoing message");
                        self.stats.send_failed();
                        return false;
                    }
                };
                let mut ok = true;
                for frame in chunks {
                    if !self.running.is_running() {
                        return false;
                    }
                    match self.writer.write_frame(&frame) {
                        Ok(()) => {
                            self.stats.frame_sent();
                            info!(
                                id = %format!("0x{:03X}", frame.id()),
                                len = frame.len(),
                                data = %payload_preview(frame.data(), PREVIEW_BYTES),
                                "sent frame"
                            );
                        }
                        Err(err) => {
                            ok = false;
                            self.stats.send_failed();
                            warn!(
                                id = %format!("0x{:03X}", frame.id()),
                                error = %err,
                                "frame send failed"
                            );
                        }
                    }
                }
                ok
            }
            Outgoing::IsoTp { payload } => match self.writer.write_message(payload) {
                Ok(()) => {
                    self.stats.frame_sent();
                    info!(
                        len = payload.len(),
                        data = %payload_preview(payload, PREVIEW_BYTES),
                        "sent ISO-TP message"
                    );
                    true
                }
                Err(err) => {
                    self.stats.send_failed();
                    warn!(len = payload.len(), error = %err, "ISO-TP send failed");
                    false
                }
            },
        };
        if ok {
            self.stats.message_sent();
        }
        ok
    }

    /// Sleep out the interval in slices so a stop request is seen promptly.
    fn pause(&self) {
        let deadline = Instant::now() + self.interval;
        while self.running.is_running() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep((deadline - now).min(self.slice));
        }
    }
}

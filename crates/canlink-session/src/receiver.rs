use std::sync::Arc;
use std::thread;
use std::time::Duration;

use canlink_frame::{payload_preview, Delivery, FrameError, FrameReader};
use canlink_transport::CanIo;
use tracing::{debug, trace, warn};

use crate::config::ReceiveStrategy;
use crate::flag::RunningFlag;
use crate::report::SessionStats;

const PREVIEW_BYTES: usize = 16;

/// Callback handed every decoded frame or message, in arrival order.
pub type DeliverySink = Box<dyn FnMut(Delivery) + Send + 'static>;

/// Reads inbound traffic until the running flag is cleared.
pub struct Receiver<C> {
    reader: FrameReader<C>,
    strategy: ReceiveStrategy,
    wait_timeout: Duration,
    blocking_delay: Duration,
    running: RunningFlag,
    stats: Arc<SessionStats>,
    sink: DeliverySink,
}

impl<C: CanIo> Receiver<C> {
    pub(crate) fn new(
        reader: FrameReader<C>,
        strategy: ReceiveStrategy,
        wait_timeout: Duration,
        blocking_delay: Duration,
        running: RunningFlag,
        stats: Arc<SessionStats>,
        sink: DeliverySink,
    ) -> Self {
        Self {
            reader,
            strategy,
            wait_timeout,
            blocking_delay,
            running,
            stats,
            sink,
        }
    }

    pub(crate) fn run(mut self) {
        debug!(strategy = %self.strategy, "receiver started");
        while self.running.is_running() {
            match self.strategy {
                ReceiveStrategy::Blocking => {
                    self.read_once();
                    thread::sleep(self.blocking_delay);
                }
                ReceiveStrategy::Multiplexed => self.wait_and_read(),
            }
        }
        debug!("receiver stopped");
    }

    fn wait_and_read(&mut self) {
        match self.reader.wait_readable(self.wait_timeout) {
            Ok(true) => {
                self.read_once();
            }
            Ok(false) => trace!("receive wait timed out"),
            Err(err) => {
                self.stats.read_failed();
                warn!(error = %err, "readiness wait failed");
                // Keep a persistent wait error from spinning the loop.
                thread::sleep(self.blocking_delay);
            }
        }
    }

    /// Perform one read. Returns true if something was delivered.
    pub(crate) fn read_once(&mut self) -> bool {
        match self.reader.read() {
            Ok(delivery) => {
                self.stats.delivered();
                debug!(
                    id = ?delivery.id(),
                    len = delivery.payload().len(),
                    data = %payload_preview(delivery.payload(), PREVIEW_BYTES),
                    "received"
                );
                (self.sink)(delivery);
                true
            }
            Err(FrameError::TimedOut) => false,
            Err(err) if err.is_malformed() => {
                self.stats.malformed();
                warn!(error = %err, "dropping malformed frame");
                false
            }
            Err(err) => {
                self.stats.read_failed();
                warn!(error = %err, "receive failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bytes::BytesMut;
    use canlink_frame::{encode_frame, CanFrame};
    use canlink_transport::MockChannel;

    use super::*;

    fn frame_bytes(id: u32, payload: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_frame(&CanFrame::new(id, payload).unwrap(), &mut buf);
        buf.to_vec()
    }

    fn collecting_sink() -> (DeliverySink, Arc<Mutex<Vec<Delivery>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let sink: DeliverySink = Box::new(move |d| sink_seen.lock().unwrap().push(d));
        (sink, seen)
    }

    fn receiver(
        channel: Arc<MockChannel>,
        strategy: ReceiveStrategy,
    ) -> (Receiver<Arc<MockChannel>>, Arc<Mutex<Vec<Delivery>>>) {
        let (sink, seen) = collecting_sink();
        let rx = Receiver::new(
            FrameReader::raw(channel),
            strategy,
            Duration::from_millis(5),
            Duration::from_millis(1),
            RunningFlag::new(),
            Arc::new(SessionStats::default()),
            sink,
        );
        (rx, seen)
    }

    #[test]
    fn malformed_frame_is_dropped_and_reading_continues() {
        let channel = Arc::new(MockChannel::new());
        channel.push_inbound(vec![0u8; 3]);
        channel.push_inbound(frame_bytes(0x123, b"after"));
        let (mut rx, seen) = receiver(Arc::clone(&channel), ReceiveStrategy::Blocking);

        assert!(!rx.read_once());
        assert!(rx.read_once());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].payload(), b"after");
        let report = rx.stats.snapshot();
        assert_eq!(report.malformed, 1);
        assert_eq!(report.deliveries, 1);
    }

    #[test]
    fn timeout_is_not_a_failure() {
        let channel = Arc::new(MockChannel::with_read_timeout(Duration::from_millis(2)));
        let (mut rx, _) = receiver(channel, ReceiveStrategy::Blocking);

        assert!(!rx.read_once());
        assert_eq!(rx.stats.snapshot(), Default::default());
    }

    fn run_until_delivered(strategy: ReceiveStrategy) {
        let channel = Arc::new(MockChannel::new());
        let (rx, seen) = receiver(Arc::clone(&channel), strategy);
        let flag = rx.running.clone();
        let stats = Arc::clone(&rx.stats);
        let handle = thread::spawn(move || rx.run());

        channel.push_inbound(frame_bytes(0x123, b"one"));
        channel.push_inbound(frame_bytes(0x123, b"two"));
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while seen.lock().unwrap().len() < 2 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        flag.stop();
        handle.join().unwrap();

        let seen = seen.lock().unwrap();
        let payloads: Vec<&[u8]> = seen.iter().map(Delivery::payload).collect();
        assert_eq!(payloads, vec![&b"one"[..], &b"two"[..]]);
        assert_eq!(stats.snapshot().deliveries, 2);
    }

    #[test]
    fn blocking_strategy_delivers_in_order() {
        run_until_delivered(ReceiveStrategy::Blocking);
    }

    #[test]
    fn multiplexed_strategy_delivers_in_order() {
        run_until_delivered(ReceiveStrategy::Multiplexed);
    }

    #[test]
    fn wait_failure_is_survived() {
        let channel = Arc::new(MockChannel::new());
        channel.fail_next_waits(2);
        channel.push_inbound(frame_bytes(0x123, b"late"));
        let (rx, seen) = receiver(Arc::clone(&channel), ReceiveStrategy::Multiplexed);
        let flag = rx.running.clone();
        let stats = Arc::clone(&rx.stats);
        let handle = thread::spawn(move || rx.run());

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while seen.lock().unwrap().is_empty() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        flag.stop();
        handle.join().unwrap();

        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(stats.snapshot().read_failures, 2);
    }
}

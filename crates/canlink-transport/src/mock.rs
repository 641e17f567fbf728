//! In-memory [`CanIo`] implementation for tests.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::traits::CanIo;

/// A channel that records every sent datagram and serves injected inbound
/// datagrams to `recv`.
///
/// `recv` behaves like a socket with a read timeout: when nothing is queued it
/// waits up to `read_timeout` and then fails with `WouldBlock`.
pub struct MockChannel {
    state: Mutex<State>,
    cond: Condvar,
    read_timeout: Duration,
    released: Arc<AtomicUsize>,
}

#[derive(Default)]
struct State {
    sent: Vec<Vec<u8>>,
    send_attempts: usize,
    inbound: VecDeque<Vec<u8>>,
    failing_sends: usize,
    failing_waits: usize,
}

impl MockChannel {
    pub fn new() -> Self {
        Self::with_read_timeout(Duration::from_millis(10))
    }

    pub fn with_read_timeout(read_timeout: Duration) -> Self {
        Self {
            state: Mutex::new(State::default()),
            cond: Condvar::new(),
            read_timeout,
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Queue a datagram for the next `recv`.
    pub fn push_inbound(&self, datagram: impl Into<Vec<u8>>) {
        self.lock().inbound.push_back(datagram.into());
        self.cond.notify_all();
    }

    /// Make the next `n` sends fail with a `NetworkDown` error.
    pub fn fail_next_sends(&self, n: usize) {
        self.lock().failing_sends = n;
    }

    /// Make the next `n` readiness waits fail.
    pub fn fail_next_waits(&self, n: usize) {
        self.lock().failing_waits = n;
    }

    /// Datagrams successfully sent so far, in order.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.lock().sent.clone()
    }

    /// Number of send calls, failed ones included.
    pub fn send_attempts(&self) -> usize {
        self.lock().send_attempts
    }

    /// Block until at least `count` datagrams were sent or `timeout` elapses.
    pub fn wait_for_sent(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        while state.sent.len() < count {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            state = match self.cond.wait_timeout(state, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        true
    }

    /// Counter incremented when this channel is dropped.
    pub fn release_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.released)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn wait_for_inbound<'a>(
        &self,
        mut state: MutexGuard<'a, State>,
        timeout: Duration,
    ) -> MutexGuard<'a, State> {
        let deadline = Instant::now() + timeout;
        while state.inbound.is_empty() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            state = match self.cond.wait_timeout(state, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        state
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl CanIo for MockChannel {
    fn send(&self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.lock();
        state.send_attempts += 1;
        if state.failing_sends > 0 {
            state.failing_sends -= 1;
            return Err(io::Error::new(
                io::ErrorKind::NetworkDown,
                "injected send failure",
            ));
        }
        state.sent.push(buf.to_vec());
        drop(state);
        self.cond.notify_all();
        Ok(buf.len())
    }

    fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        let state = self.lock();
        let mut state = self.wait_for_inbound(state, self.read_timeout);
        match state.inbound.pop_front() {
            Some(datagram) => {
                let n = datagram.len().min(buf.len());
                buf[..n].copy_from_slice(&datagram[..n]);
                Ok(n)
            }
            None => Err(io::Error::new(
                io::ErrorKind::WouldBlock,
                "no datagram within read timeout",
            )),
        }
    }

    fn wait_readable(&self, timeout: Duration) -> io::Result<bool> {
        let mut state = self.lock();
        if state.failing_waits > 0 {
            state.failing_waits -= 1;
            return Err(io::Error::other("injected wait failure"));
        }
        let state = self.wait_for_inbound(state, timeout);
        Ok(!state.inbound.is_empty())
    }
}

impl Drop for MockChannel {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_sends_in_order() {
        let ch = MockChannel::new();
        ch.send(b"one").unwrap();
        ch.send(b"two").unwrap();
        assert_eq!(ch.sent(), vec![b"one".to_vec(), b"two".to_vec()]);
    }

    #[test]
    fn injected_send_failures_are_counted() {
        let ch = MockChannel::new();
        ch.fail_next_sends(1);
        assert!(ch.send(b"x").is_err());
        assert!(ch.send(b"y").is_ok());
        assert_eq!(ch.send_attempts(), 2);
        assert_eq!(ch.sent().len(), 1);
    }

    #[test]
    fn recv_times_out_when_empty() {
        let ch = MockChannel::with_read_timeout(Duration::from_millis(5));
        let mut buf = [0u8; 16];
        let err = ch.recv(&mut buf).unwrap_err();
        assert!(crate::traits::is_timeout(&err));
    }

    #[test]
    fn wait_readable_sees_inbound() {
        let ch = MockChannel::new();
        assert!(!ch.wait_readable(Duration::from_millis(5)).unwrap());
        ch.push_inbound(vec![1, 2, 3]);
        assert!(ch.wait_readable(Duration::from_millis(5)).unwrap());
        let mut buf = [0u8; 16];
        assert_eq!(ch.recv(&mut buf).unwrap(), 3);
    }

    #[test]
    fn drop_bumps_release_counter() {
        let ch = MockChannel::new();
        let released = ch.release_counter();
        drop(ch);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }
}

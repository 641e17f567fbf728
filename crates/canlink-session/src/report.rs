use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters shared by the two session tasks.
#[derive(Debug, Default)]
pub(crate) struct SessionStats {
    messages_sent: AtomicU64,
    frames_sent: AtomicU64,
    send_failures: AtomicU64,
    deliveries: AtomicU64,
    malformed: AtomicU64,
    read_failures: AtomicU64,
}

impl SessionStats {
    pub(crate) fn message_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn frame_sent(&self) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn send_failed(&self) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn delivered(&self) {
        self.deliveries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn malformed(&self) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn read_failed(&self) {
        self.read_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> SessionReport {
        SessionReport {
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            read_failures: self.read_failures.load(Ordering::Relaxed),
        }
    }
}

/// Totals for one finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SessionReport {
    /// Transmit cycles where every frame (or the ISO-TP message) was sent.
    pub messages_sent: u64,
    /// Raw frames written; ISO-TP messages count as one.
    pub frames_sent: u64,
    pub send_failures: u64,
    pub deliveries: u64,
    /// Inbound datagrams dropped as incomplete or unsupported.
    pub malformed: u64,
    pub read_failures: u64,
}

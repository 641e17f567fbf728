use std::time::Duration;

use bytes::Bytes;
use canlink_transport::{is_timeout, CanIo, MAX_ISOTP_PAYLOAD};

use crate::codec::{decode_frame, CanFrame};
use crate::error::{FrameError, Result};

/// Large enough to see a CAN FD datagram (72 bytes) whole, so an unexpected
/// size is reported instead of silently truncated to 16 bytes.
const RAW_READ_BUFFER: usize = 72;

/// One byte past the ISO-TP limit, so a read that fills it is known to be
/// oversized rather than cut short.
const ISOTP_READ_BUFFER: usize = MAX_ISOTP_PAYLOAD + 1;

/// One unit handed to the application by a [`FrameReader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// A decoded raw CAN frame.
    Frame(CanFrame),
    /// A complete, kernel-reassembled ISO-TP message.
    Message(Bytes),
}

impl Delivery {
    /// Payload bytes of the frame or message.
    pub fn payload(&self) -> &[u8] {
        match self {
            Delivery::Frame(frame) => frame.data(),
            Delivery::Message(bytes) => bytes.as_ref(),
        }
    }

    /// Raw frame identifier; `None` for ISO-TP messages.
    pub fn id(&self) -> Option<u32> {
        match self {
            Delivery::Frame(frame) => Some(frame.id()),
            Delivery::Message(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadKind {
    Raw,
    IsoTp,
}

/// Reads raw frames or ISO-TP messages from a [`CanIo`] channel.
///
/// Every call performs exactly one datagram read.
pub struct FrameReader<T> {
    inner: T,
    buf: Vec<u8>,
    kind: ReadKind,
}

impl<T: CanIo> FrameReader<T> {
    /// Reader for a raw CAN channel.
    pub fn raw(inner: T) -> Self {
        Self {
            inner,
            buf: vec![0u8; RAW_READ_BUFFER],
            kind: ReadKind::Raw,
        }
    }

    /// Reader for an ISO-TP channel.
    pub fn isotp(inner: T) -> Self {
        Self {
            inner,
            buf: vec![0u8; ISOTP_READ_BUFFER],
            kind: ReadKind::IsoTp,
        }
    }

    /// Read and decode the next datagram.
    ///
    /// Returns `Err(FrameError::TimedOut)` when the channel read timeout
    /// elapsed with nothing to read, and `Err(FrameError::PayloadTooLarge)`
    /// for an ISO-TP message longer than [`MAX_ISOTP_PAYLOAD`].
    pub fn read(&mut self) -> Result<Delivery> {
        let read = match self.inner.recv(&mut self.buf) {
            Ok(n) => n,
            Err(err) if is_timeout(&err) => return Err(FrameError::TimedOut),
            Err(err) => return Err(FrameError::Io(err)),
        };
        let datagram = &self.buf[..read];

        match self.kind {
            ReadKind::Raw => decode_frame(datagram).map(Delivery::Frame),
            ReadKind::IsoTp if read > MAX_ISOTP_PAYLOAD => Err(FrameError::PayloadTooLarge {
                size: read,
                max: MAX_ISOTP_PAYLOAD,
            }),
            ReadKind::IsoTp => Ok(Delivery::Message(Bytes::copy_from_slice(datagram))),
        }
    }

    /// Wait up to `timeout` for a datagram to become readable.
    pub fn wait_readable(&self, timeout: Duration) -> Result<bool> {
        Ok(self.inner.wait_readable(timeout)?)
    }
}

use std::io;
use std::sync::Arc;
use std::time::Duration;

/// Datagram I/O on an open CAN channel.
///
/// Every call takes `&self`: one task may send while another receives on the
/// same endpoint. Each `send` writes one datagram (a raw frame or a complete
/// ISO-TP message) and each `recv` returns at most one.
pub trait CanIo: Send + Sync {
    /// Write one datagram, returning the number of bytes accepted.
    fn send(&self, buf: &[u8]) -> io::Result<usize>;

    /// Read one datagram into `buf`, returning its size.
    ///
    /// Returns `WouldBlock`/`TimedOut` when a configured read timeout elapses.
    fn recv(&self, buf: &mut [u8]) -> io::Result<usize>;

    /// Wait until a datagram is ready to read.
    ///
    /// Returns `Ok(false)` when `timeout` elapsed with nothing to read.
    fn wait_readable(&self, timeout: Duration) -> io::Result<bool>;
}

impl<T: CanIo + ?Sized> CanIo for Arc<T> {
    fn send(&self, buf: &[u8]) -> io::Result<usize> {
        (**self).send(buf)
    }

    fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).recv(buf)
    }

    fn wait_readable(&self, timeout: Duration) -> io::Result<bool> {
        (**self).wait_readable(timeout)
    }
}

impl<T: CanIo + ?Sized> CanIo for &T {
    fn send(&self, buf: &[u8]) -> io::Result<usize> {
        (**self).send(buf)
    }

    fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).recv(buf)
    }

    fn wait_readable(&self, timeout: Duration) -> io::Result<bool> {
        (**self).wait_readable(timeout)
    }
}

/// Returns true for the error kinds a read timeout produces.
pub fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

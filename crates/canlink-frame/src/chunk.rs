//! Splitting payloads longer than one CAN frame.
//!
//! Raw CAN carries no reassembly header: a message of `L` bytes becomes
//! `ceil(L / 8)` frames with the same identifier, emitted in byte order.
//! Finding message boundaries on the receiving side is up to the application.

use canlink_transport::config::is_standard_id;

use crate::codec::{CanFrame, CAN_MAX_DLEN};
use crate::error::{FrameError, Result};

/// Iterator over the frames of one chunked message.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    id: u32,
    inner: std::slice::Chunks<'a, u8>,
}

impl Iterator for Chunks<'_> {
    type Item = CanFrame;

    fn next(&mut self) -> Option<CanFrame> {
        let chunk = self.inner.next()?;
        // The identifier was checked in `chunk_message` and chunks never exceed
        // the frame limit, so this cannot fail.
        CanFrame::truncating(self.id, chunk).ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Chunks<'_> {}

/// Split `payload` into consecutive frames of at most 8 bytes for `id`.
///
/// An empty payload yields no frames.
pub fn chunk_message(id: u32, payload: &[u8]) -> Result<Chunks<'_>> {
    if !is_standard_id(id) {
        return Err(FrameError::InvalidIdentifier(id));
    }
    Ok(Chunks {
        id,
        inner: payload.chunks(CAN_MAX_DLEN),
    })
}

/// Number of frames needed for a payload of `len` bytes.
pub fn frame_count(len: usize) -> usize {
    len.div_ceil(CAN_MAX_DLEN)
}

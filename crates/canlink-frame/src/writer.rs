use bytes::BytesMut;
use canlink_transport::{CanIo, MAX_ISOTP_PAYLOAD};

use crate::codec::{encode_frame, CanFrame, CAN_FRAME_SIZE};
use crate::error::{FrameError, Result};

/// Writes raw frames and ISO-TP messages to a [`CanIo`] channel.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: CanIo> FrameWriter<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(CAN_FRAME_SIZE),
        }
    }

    /// Write one raw frame as a single `struct can_frame` datagram.
    pub fn write_frame(&mut self, frame: &CanFrame) -> Result<()> {
        self.buf.clear();
        encode_frame(frame, &mut self.buf);
        let written = self.inner.send(&self.buf)?;
        if written != CAN_FRAME_SIZE {
            return Err(FrameError::ShortWrite {
                written,
                expected: CAN_FRAME_SIZE,
            });
        }
        Ok(())
    }

    /// Write one ISO-TP message; segmentation is left to the kernel.
    pub fn write_message(&mut self, payload: &[u8]) -> Result<()> {
        if payload.len() > MAX_ISOTP_PAYLOAD {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_ISOTP_PAYLOAD,
            });
        }
        let written = self.inner.send(payload)?;
        if written != payload.len() {
            return Err(FrameError::ShortWrite {
                written,
                expected: payload.len(),
            });
        }
        Ok(())
    }
}

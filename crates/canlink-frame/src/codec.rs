use std::fmt::Write as _;

use bytes::{Buf, BufMut, BytesMut};
use canlink_transport::config::is_standard_id;

use crate::error::{FrameError, Result};

/// Size of the kernel `struct can_frame`: id (4) + len (1) + pad (3) + data (8).
pub const CAN_FRAME_SIZE: usize = 16;

/// Maximum payload of one classic CAN frame.
pub const CAN_MAX_DLEN: usize = 8;

const CAN_EFF_FLAG: u32 = 0x8000_0000;
const CAN_RTR_FLAG: u32 = 0x4000_0000;
const CAN_ERR_FLAG: u32 = 0x2000_0000;

/// A classic CAN frame with an 11-bit identifier.
///
/// Invariant: `len <= 8` and only the first `len` bytes of `data` are
/// meaningful; the rest are zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanFrame {
    id: u32,
    len: u8,
    data: [u8; CAN_MAX_DLEN],
}

impl CanFrame {
    /// Create a frame, rejecting payloads longer than 8 bytes.
    ///
    /// Longer payloads go through [`chunk_message`](crate::chunk::chunk_message).
    pub fn new(id: u32, payload: &[u8]) -> Result<Self> {
        if payload.len() > CAN_MAX_DLEN {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: CAN_MAX_DLEN,
            });
        }
        Self::truncating(id, payload)
    }

    /// Link-layer encode: keeps at most the first 8 bytes of `payload`.
    ///
    /// Only the chunking layer calls this, and it never hands over more than
    /// 8 bytes.
    pub(crate) fn truncating(id: u32, payload: &[u8]) -> Result<Self> {
        if !is_standard_id(id) {
            return Err(FrameError::InvalidIdentifier(id));
        }
        let len = payload.len().min(CAN_MAX_DLEN);
        let mut data = [0u8; CAN_MAX_DLEN];
        data[..len].copy_from_slice(&payload[..len]);
        Ok(Self {
            id,
            len: len as u8,
            data,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Length field: number of valid payload bytes.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The valid payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }
}

/// Encode a frame into the kernel wire layout.
///
/// ```text
/// ┌──────────────┬─────┬──────────────┬────────────────┐
/// │ can_id (4B)  │ len │ pad/res (3B) │ data (8B)      │
/// │ host order   │ 0-8 │ zero         │ zero-padded    │
/// └──────────────┴─────┴──────────────┴────────────────┘
/// ```
pub fn encode_frame(frame: &CanFrame, dst: &mut BytesMut) {
    dst.reserve(CAN_FRAME_SIZE);
    dst.put_u32_ne(frame.id);
    dst.put_u8(frame.len);
    dst.put_bytes(0, 3);
    dst.put_slice(&frame.data);
}

/// Decode one datagram read from a raw CAN socket.
///
/// The datagram must be exactly [`CAN_FRAME_SIZE`] bytes; anything else is
/// reported as incomplete rather than partially interpreted.
pub fn decode_frame(src: &[u8]) -> Result<CanFrame> {
    if src.len() != CAN_FRAME_SIZE {
        return Err(FrameError::Incomplete {
            got: src.len(),
            expected: CAN_FRAME_SIZE,
        });
    }

    let mut buf = src;
    let can_id = buf.get_u32_ne();
    let len = buf.get_u8();
    buf.advance(3);

    if can_id & CAN_ERR_FLAG != 0 {
        return Err(FrameError::UnsupportedFrame("error frame"));
    }
    if can_id & CAN_EFF_FLAG != 0 {
        return Err(FrameError::UnsupportedFrame("extended identifier"));
    }
    if can_id & CAN_RTR_FLAG != 0 {
        return Err(FrameError::UnsupportedFrame("remote request"));
    }
    if len as usize > CAN_MAX_DLEN {
        return Err(FrameError::InvalidLength(len));
    }

    let mut data = [0u8; CAN_MAX_DLEN];
    data[..len as usize].copy_from_slice(&buf[..len as usize]);
    Ok(CanFrame {
        id: can_id,
        len,
        data,
    })
}

/// Hex preview of a payload for log lines: at most `limit` bytes, with a
/// trailing `...` when the payload is longer.
pub fn payload_preview(payload: &[u8], limit: usize) -> String {
    let mut out = String::with_capacity(limit.min(payload.len()) * 3 + 3);
    for (i, byte) in payload.iter().take(limit).enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{byte:02X}");
    }
    if payload.len() > limit {
        out.push_str(" ...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(frame: &CanFrame) -> BytesMut {
        let mut buf = BytesMut::new();
        encode_frame(frame, &mut buf);
        buf
    }

    #[test]
    fn short_payload_roundtrips_with_exact_length() {
        for len in 0..=CAN_MAX_DLEN {
            let payload: Vec<u8> = (0..len as u8).map(|b| b.wrapping_mul(7)).collect();
            let frame = CanFrame::new(0x123, &payload).unwrap();
            let buf = wire(&frame);
            assert_eq!(buf.len(), CAN_FRAME_SIZE);

            let decoded = decode_frame(&buf).unwrap();
            assert_eq!(decoded.id(), 0x123);
            assert_eq!(decoded.len(), len);
            assert_eq!(decoded.data(), payload.as_slice());
        }
    }

    #[test]
    fn wire_layout_matches_kernel_struct() {
        let frame = CanFrame::new(0x7E0, &[0x02, 0x10, 0x03]).unwrap();
        let buf = wire(&frame);
        assert_eq!(&buf[..4], &0x7E0u32.to_ne_bytes());
        assert_eq!(buf[4], 3);
        assert_eq!(&buf[5..8], &[0, 0, 0]);
        assert_eq!(&buf[8..11], &[0x02, 0x10, 0x03]);
        assert!(buf[11..].iter().all(|b| *b == 0));
    }

    #[test]
    fn new_rejects_oversized_payload() {
        let err = CanFrame::new(0x123, b"hello world").unwrap_err();
        assert!(matches!(
            err,
            FrameError::PayloadTooLarge { size: 11, max: 8 }
        ));
    }

    #[test]
    fn truncating_keeps_first_eight_bytes() {
        let frame = CanFrame::truncating(0x123, b"hello world").unwrap();
        assert_eq!(frame.len(), 8);
        assert_eq!(frame.data(), b"hello wo");
    }

    #[test]
    fn rejects_extended_identifier_on_encode() {
        assert!(matches!(
            CanFrame::new(0x800, b""),
            Err(FrameError::InvalidIdentifier(0x800))
        ));
    }

    #[test]
    fn decode_wrong_size_is_incomplete() {
        for size in [0usize, 1, 8, 15, 17, 72] {
            let bytes = vec![0u8; size];
            let err = decode_frame(&bytes).unwrap_err();
            assert!(matches!(err, FrameError::Incomplete { got, expected: 16 } if got == size));
            assert!(err.is_malformed());
        }
    }

    #[test]
    fn decode_invalid_length_field() {
        let mut buf = wire(&CanFrame::new(0x123, b"abc").unwrap());
        buf[4] = 9;
        assert!(matches!(
            decode_frame(&buf),
            Err(FrameError::InvalidLength(9))
        ));
    }

    #[test]
    fn decode_rejects_flagged_identifiers() {
        for (flag, what) in [
            (CAN_EFF_FLAG, "extended identifier"),
            (CAN_RTR_FLAG, "remote request"),
            (CAN_ERR_FLAG, "error frame"),
        ] {
            let mut buf = BytesMut::new();
            buf.put_u32_ne(0x123 | flag);
            buf.put_u8(0);
            buf.put_bytes(0, 11);
            match decode_frame(&buf) {
                Err(FrameError::UnsupportedFrame(msg)) => assert_eq!(msg, what),
                other => panic!("unexpected decode result: {other:?}"),
            }
        }
    }

    #[test]
    fn preview_limits_and_marks_truncation() {
        assert_eq!(payload_preview(&[], 16), "");
        assert_eq!(payload_preview(&[0x00, 0xAB], 16), "00 AB");
        let long: Vec<u8> = (0..20).collect();
        let preview = payload_preview(&long, 4);
        assert_eq!(preview, "00 01 02 03 ...");
    }
}

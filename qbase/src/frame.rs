use bytes::BufMut;
use enum_dispatch::enum_dispatch;

use crate::space::SpaceId;

mod new_connection_id;
mod retire_connection_id;

pub use new_connection_id::NewConnectionIdFrame;
pub use retire_connection_id::RetireConnectionIdFrame;

/// Define the basic behaviors for all kinds of frames
#[enum_dispatch]
pub trait BeFrame {
    /// Return the type of frame
    fn frame_type(&self) -> FrameType;

    /// Return the max number of bytes needed to encode this value
    ///
    /// Calculate the maximum size by summing up the maximum length of each field.
    /// If a field type has a maximum length, use it, otherwise use the actual length
    /// of the data in that field.
    fn max_encoding_size(&self) -> usize {
        1
    }

    /// Return the exact number of bytes needed to encode this value
    fn encoding_size(&self) -> usize {
        1
    }
}

/// The types of the frames maintaining connection IDs.
///
/// See [table-3](https://www.rfc-editor.org/rfc/rfc9000.html#table-3)
/// and [frame types and formats](https://www.rfc-editor.org/rfc/rfc9000.html#name-frame-types-and-formats)
/// of [QUIC](https://www.rfc-editor.org/rfc/rfc9000.html) for more details.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameType {
    /// NEW_CONNECTION_ID frame, see [`NewConnectionIdFrame`].
    NewConnectionId,
    /// RETIRE_CONNECTION_ID frame, see [`RetireConnectionIdFrame`].
    RetireConnectionId,
}

impl FrameType {
    /// Return whether a frame type may be carried by packets of the given space
    pub fn belongs_to(&self, space: SpaceId) -> bool {
        match self {
            // Only 0-RTT and 1-RTT packets carry connection ID frames, see table-3.
            FrameType::NewConnectionId | FrameType::RetireConnectionId => {
                matches!(space, SpaceId::ZeroRtt | SpaceId::OneRtt)
            }
        }
    }
}

impl From<FrameType> for u8 {
    fn from(frame_type: FrameType) -> Self {
        match frame_type {
            FrameType::NewConnectionId => 0x18,
            FrameType::RetireConnectionId => 0x19,
        }
    }
}

/// Sum type of the frames that maintain the connection ID sets of both sides.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[enum_dispatch(BeFrame)]
pub enum ConnectionIdFrame {
    /// NEW_CONNECTION_ID frame, see [`NewConnectionIdFrame`].
    NewConnectionId(NewConnectionIdFrame),
    /// RETIRE_CONNECTION_ID frame, see [`RetireConnectionIdFrame`].
    RetireConnectionId(RetireConnectionIdFrame),
}

/// Some modules that need receive specific frames can implement `ReceiveFrame` trait directly.
pub trait ReceiveFrame<T> {
    type Output;

    /// Receive the frames from the peer
    fn recv_frame(&self, frame: &T) -> Result<Self::Output, crate::error::Error>;
}

/// A [`bytes::BufMut`] extension trait, makes buffer more friendly to write frames.
pub trait WriteFrame<F>: BufMut {
    /// Write the frame, whose size is exactly [`BeFrame::encoding_size`].
    fn put_frame(&mut self, frame: &F);
}

impl<T: BufMut> WriteFrame<ConnectionIdFrame> for T {
    fn put_frame(&mut self, frame: &ConnectionIdFrame) {
        match frame {
            ConnectionIdFrame::NewConnectionId(frame) => self.put_frame(frame),
            ConnectionIdFrame::RetireConnectionId(frame) => self.put_frame(frame),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cid_frames_belong_to_data_spaces() {
        for frame_type in [FrameType::NewConnectionId, FrameType::RetireConnectionId] {
            assert!(!frame_type.belongs_to(SpaceId::Initial));
            assert!(!frame_type.belongs_to(SpaceId::Handshake));
            assert!(frame_type.belongs_to(SpaceId::ZeroRtt));
            assert!(frame_type.belongs_to(SpaceId::OneRtt));
        }
    }

    #[test]
    fn test_frame_type_byte() {
        assert_eq!(u8::from(FrameType::NewConnectionId), 0x18);
        assert_eq!(u8::from(FrameType::RetireConnectionId), 0x19);
    }
}

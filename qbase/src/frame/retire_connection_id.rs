use crate::varint::{VarInt, WriteVarInt};

const RETIRE_CONNECTION_ID_FRAME_TYPE: u8 = 0x19;

/// RETIRE_CONNECTION_ID frame.
///
/// ```text
/// RETIRE_CONNECTION_ID Frame {
///   Type (i) = 0x19,
///   Sequence Number (i),
/// }
/// ```
///
/// See [RETIRE_CONNECTION_ID Frames](https://www.rfc-editor.org/rfc/rfc9000.html#name-retire_connection_id-frames)
/// of [QUIC](https://www.rfc-editor.org/rfc/rfc9000.html) for more details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetireConnectionIdFrame {
    pub sequence: VarInt,
}

impl super::BeFrame for RetireConnectionIdFrame {
    fn frame_type(&self) -> super::FrameType {
        super::FrameType::RetireConnectionId
    }

    fn max_encoding_size(&self) -> usize {
        1 + 8
    }

    fn encoding_size(&self) -> usize {
        1 + self.sequence.encoding_size()
    }
}

impl<T: bytes::BufMut> super::WriteFrame<RetireConnectionIdFrame> for T {
    fn put_frame(&mut self, frame: &RetireConnectionIdFrame) {
        self.put_u8(RETIRE_CONNECTION_ID_FRAME_TYPE);
        self.put_varint(&frame.sequence);
    }
}

#[cfg(test)]
mod tests {
    use super::RetireConnectionIdFrame;
    use crate::{
        frame::{BeFrame, WriteFrame},
        varint::VarInt,
    };

    #[test]
    fn test_write_retire_connection_id_frame() {
        let mut buf = Vec::new();
        let frame = RetireConnectionIdFrame {
            sequence: VarInt::from_u32(0x1234),
        };
        buf.put_frame(&frame);
        assert_eq!(buf, vec![0x19, 0x52, 0x34]);
        assert_eq!(frame.encoding_size(), buf.len());
    }
}

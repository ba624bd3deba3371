use crate::{
    cid::{ConnectionId, MAX_CID_SIZE, WriteConnectionId},
    token::{RESET_TOKEN_SIZE, ResetToken, WriteResetToken},
    varint::{VarInt, WriteVarInt},
};

const NEW_CONNECTION_ID_FRAME_TYPE: u8 = 0x18;

/// NEW_CONNECTION_ID frame.
///
/// ```text
/// NEW_CONNECTION_ID Frame {
///   Type (i) = 0x18,
///   Sequence Number (i),
///   Retire Prior To (i),
///   Length (8),
///   Connection ID (8..160),
///   Stateless Reset Token (128),
/// }
/// ```
///
/// See [NEW_CONNECTION_ID Frames](https://www.rfc-editor.org/rfc/rfc9000.html#name-new_connection_id-frames)
/// of [QUIC](https://www.rfc-editor.org/rfc/rfc9000.html) for more details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewConnectionIdFrame {
    pub sequence: VarInt,
    pub retire_prior_to: VarInt,
    pub id: ConnectionId,
    pub reset_token: ResetToken,
}

impl NewConnectionIdFrame {
    /// Advertise `id` under `sequence` without asking the peer to retire anything.
    pub fn new(sequence: VarInt, id: ConnectionId, reset_token: ResetToken) -> Self {
        Self {
            sequence,
            retire_prior_to: VarInt::default(),
            id,
            reset_token,
        }
    }
}

impl super::BeFrame for NewConnectionIdFrame {
    fn frame_type(&self) -> super::FrameType {
        super::FrameType::NewConnectionId
    }

    fn max_encoding_size(&self) -> usize {
        1 + 8 + 8 + 1 + MAX_CID_SIZE + RESET_TOKEN_SIZE
    }

    fn encoding_size(&self) -> usize {
        1 + self.sequence.encoding_size()
            + self.retire_prior_to.encoding_size()
            + self.id.encoding_size()
            + self.reset_token.encoding_size()
    }
}

impl<T: bytes::BufMut> super::WriteFrame<NewConnectionIdFrame> for T {
    fn put_frame(&mut self, frame: &NewConnectionIdFrame) {
        self.put_u8(NEW_CONNECTION_ID_FRAME_TYPE);
        self.put_varint(&frame.sequence);
        self.put_varint(&frame.retire_prior_to);
        self.put_connection_id(&frame.id);
        self.put_reset_token(&frame.reset_token);
    }
}

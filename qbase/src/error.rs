use std::borrow::Cow;

use thiserror::Error;

use crate::{frame::FrameType, varint::VarInt};

/// Transport error codes.
///
/// See [transport error codes](https://www.rfc-editor.org/rfc/rfc9000.html#name-transport-error-codes)
/// of [QUIC](https://www.rfc-editor.org/rfc/rfc9000.html).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ErrorKind {
    None,
    Internal,
    ConnectionRefused,
    FlowControl,
    StreamLimit,
    StreamState,
    FinalSize,
    FrameEncoding,
    TransportParameter,
    ConnectionIdLimit,
    ProtocolViolation,
    InvalidToken,
    Application,
    CryptoBufferExceeded,
    KeyUpdate,
    AeadLimitReached,
    NoViablePath,
    Crypto(u8),
}

impl From<ErrorKind> for VarInt {
    fn from(value: ErrorKind) -> Self {
        VarInt::from_u32(match value {
            ErrorKind::None => 0x00,
            ErrorKind::Internal => 0x01,
            ErrorKind::ConnectionRefused => 0x02,
            ErrorKind::FlowControl => 0x03,
            ErrorKind::StreamLimit => 0x04,
            ErrorKind::StreamState => 0x05,
            ErrorKind::FinalSize => 0x06,
            ErrorKind::FrameEncoding => 0x07,
            ErrorKind::TransportParameter => 0x08,
            ErrorKind::ConnectionIdLimit => 0x09,
            ErrorKind::ProtocolViolation => 0x0a,
            ErrorKind::InvalidToken => 0x0b,
            ErrorKind::Application => 0x0c,
            ErrorKind::CryptoBufferExceeded => 0x0d,
            ErrorKind::KeyUpdate => 0x0e,
            ErrorKind::AeadLimitReached => 0x0f,
            ErrorKind::NoViablePath => 0x10,
            ErrorKind::Crypto(x) => 0x0100 + x as u32,
        })
    }
}

/// A transport error which closes the connection.
///
/// The owner of the connection turns it into a CONNECTION_CLOSE frame,
/// carrying [`Error::error_code`], the offending frame type and the reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("QUIC transport error occurred in {frame_type:?}, kind: {kind:?}, reason: {reason}")]
pub struct Error {
    pub kind: ErrorKind,
    pub frame_type: FrameType,
    pub reason: Cow<'static, str>,
}

impl Error {
    pub fn new<T: Into<Cow<'static, str>>>(kind: ErrorKind, frame_type: FrameType, reason: T) -> Self {
        Self {
            kind,
            frame_type,
            reason: reason.into(),
        }
    }

    pub fn error_code(&self) -> VarInt {
        self.kind.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_violation() {
        let error = Error::new(
            ErrorKind::ProtocolViolation,
            FrameType::RetireConnectionId,
            format!("sequence number {} not currently advertised", 3),
        );
        assert_eq!(error.error_code(), VarInt::from_u32(0x0a));
        assert_eq!(u8::from(error.frame_type), 0x19);
        assert_eq!(
            error.to_string(),
            "QUIC transport error occurred in RetireConnectionId, kind: ProtocolViolation, \
             reason: sequence number 3 not currently advertised"
        );
    }

    #[test]
    fn test_crypto_error_code() {
        assert_eq!(VarInt::from(ErrorKind::Crypto(0x2a)), VarInt::from_u32(0x012a));
    }
}

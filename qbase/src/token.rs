use std::fmt;

use bytes::BufMut;
use rand::Rng;
use ring::hmac;

use crate::cid::ConnectionId;

pub const RESET_TOKEN_SIZE: usize = 16;

/// A stateless reset token, which proves the ownership of a connection ID.
///
/// See [section-10.3](https://www.rfc-editor.org/rfc/rfc9000.html#section-10.3)
/// of [QUIC](https://www.rfc-editor.org/rfc/rfc9000.html).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct ResetToken([u8; RESET_TOKEN_SIZE]);

impl ResetToken {
    pub fn random_gen() -> Self {
        let mut bytes = [0; RESET_TOKEN_SIZE];
        rand::rng().fill(&mut bytes[..]);
        Self(bytes)
    }

    pub fn encoding_size(&self) -> usize {
        RESET_TOKEN_SIZE
    }
}

impl From<[u8; RESET_TOKEN_SIZE]> for ResetToken {
    fn from(bytes: [u8; RESET_TOKEN_SIZE]) -> Self {
        Self(bytes)
    }
}

impl std::ops::Deref for ResetToken {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

pub trait WriteResetToken {
    fn put_reset_token(&mut self, token: &ResetToken);
}

impl<T: BufMut> WriteResetToken for T {
    fn put_reset_token(&mut self, token: &ResetToken) {
        self.put_slice(token);
    }
}

/// The secret an endpoint instance derives its stateless reset tokens from.
///
/// A token is the truncated HMAC-SHA256 of the instance id followed by the
/// connection id, so the endpoint can recompute the token of any connection ID
/// it issued without keeping a side table, while the peer cannot guess it.
#[derive(Clone)]
pub struct StatelessResetKey(hmac::Key);

impl StatelessResetKey {
    /// Recommended secret length, the block size of SHA-256.
    pub const KEY_LEN: usize = 64;

    pub fn new(secret: &[u8]) -> Self {
        Self(hmac::Key::new(hmac::HMAC_SHA256, secret))
    }

    /// Create a key from a fresh random secret, which is never transmitted.
    pub fn random_gen() -> Self {
        let mut secret = [0u8; Self::KEY_LEN];
        rand::rng().fill(&mut secret[..]);
        Self::new(&secret)
    }

    pub fn derive(&self, cid: &ConnectionId, instance_id: u32) -> ResetToken {
        let mut ctx = hmac::Context::with_key(&self.0);
        ctx.update(&instance_id.to_be_bytes());
        ctx.update(cid);
        let tag = ctx.sign();

        let mut token = [0; RESET_TOKEN_SIZE];
        token.copy_from_slice(&tag.as_ref()[..RESET_TOKEN_SIZE]);
        ResetToken(token)
    }
}

impl fmt::Debug for StatelessResetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StatelessResetKey(..)")
    }
}

// Copyright (c) 2022-2023 The MobileCoin Foundation

use encdec::{DecodeOwned, Encode};

use crate::{ProtoError, NONCE_LEN};

/// Authentication nonce, indicated by the lock on subscription
/// and MAC'd by the peer with the shared secret for the claimed slot.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub struct Nonce(pub [u8; NONCE_LEN]);

impl Nonce {
    pub const fn new(b: [u8; NONCE_LEN]) -> Self {
        Self(b)
    }
}

impl AsRef<[u8]> for Nonce {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Debug format [Nonce] as hex
impl core::fmt::Debug for Nonce {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for b in &self.0[..] {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl Encode for Nonce {
    type Error = ProtoError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(NONCE_LEN)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        if buff.len() < NONCE_LEN {
            return Err(ProtoError::InvalidLength);
        }

        buff[..NONCE_LEN].copy_from_slice(&self.0);

        Ok(NONCE_LEN)
    }
}

impl DecodeOwned for Nonce {
    type Output = Self;

    type Error = ProtoError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        if buff.len() < NONCE_LEN {
            return Err(ProtoError::InvalidLength);
        }

        let mut n = [0u8; NONCE_LEN];
        n.copy_from_slice(&buff[..NONCE_LEN]);

        Ok((Self(n), NONCE_LEN))
    }
}

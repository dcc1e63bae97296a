// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Curve25519 key exchange
//!
//! The scalar multiplication itself is an external primitive behind
//! [KeyExchange], [X25519] provides the default `x25519-dalek` backed
//! implementation.

use rand_core::CryptoRngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::Error;

/// Curve25519 scalar / point length
pub const KEY_LEN: usize = 32;

/// Ephemeral secret scalar (clamped)
#[derive(Clone, PartialEq, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; KEY_LEN]);

impl SecretKey {
    /// Create a secret key from raw bytes, applying clamping
    pub fn from_bytes(mut b: [u8; KEY_LEN]) -> Self {
        clamp(&mut b);
        let s = Self(b);
        b.zeroize();
        s
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

/// Public point (u-coordinate, little-endian)
pub type PublicKey = [u8; KEY_LEN];

/// Local key pair
#[derive(Clone)]
pub struct KeyPair {
    pub secret: SecretKey,
    pub public: PublicKey,
}

/// Derived shared secret
#[derive(Clone, Default, PartialEq, Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret([u8; KEY_LEN]);

impl SharedSecret {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl From<[u8; KEY_LEN]> for SharedSecret {
    fn from(b: [u8; KEY_LEN]) -> Self {
        Self(b)
    }
}

/// Debug omits secret values
impl core::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SharedSecret(..)")
    }
}

impl core::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

/// Key exchange primitive
pub trait KeyExchange {
    /// Generate a key pair from the provided RNG
    fn generate_keypair(&self, rng: &mut impl CryptoRngCore) -> Result<KeyPair, Error>;

    /// Compute the shared secret for a local secret and peer public key
    fn shared_secret(&self, secret: &SecretKey, their_public: &PublicKey) -> SharedSecret;
}

impl<T: KeyExchange> KeyExchange for &T {
    fn generate_keypair(&self, rng: &mut impl CryptoRngCore) -> Result<KeyPair, Error> {
        T::generate_keypair(self, rng)
    }

    fn shared_secret(&self, secret: &SecretKey, their_public: &PublicKey) -> SharedSecret {
        T::shared_secret(self, secret, their_public)
    }
}

/// Curve25519 clamping, clear the low 3 bits and bit 255, set bit 254
pub fn clamp(k: &mut [u8; KEY_LEN]) {
    k[0] &= 248;
    k[31] &= 127;
    k[31] |= 64;
}

/// X25519 [KeyExchange] via `x25519-dalek`
#[derive(Copy, Clone, Debug, Default)]
pub struct X25519;

impl KeyExchange for X25519 {
    fn generate_keypair(&self, rng: &mut impl CryptoRngCore) -> Result<KeyPair, Error> {
        let mut b = [0u8; KEY_LEN];
        rng.try_fill_bytes(&mut b).map_err(|_e| {
            #[cfg(feature = "log")]
            log::error!("rng failure generating key pair: {:?}", _e);
            Error::Rng
        })?;

        let secret = SecretKey::from_bytes(b);
        b.zeroize();

        let public = x25519_dalek::x25519(secret.0, x25519_dalek::X25519_BASEPOINT_BYTES);

        Ok(KeyPair { secret, public })
    }

    fn shared_secret(&self, secret: &SecretKey, their_public: &PublicKey) -> SharedSecret {
        SharedSecret(x25519_dalek::x25519(secret.0, *their_public))
    }
}

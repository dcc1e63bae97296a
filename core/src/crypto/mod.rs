// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Cryptographic building blocks for key exchange and authentication

mod verify;
pub use verify::{verify, verify_16, verify_32};

pub mod sha512;
pub use sha512::{sha512, Sha512};

pub mod hmac;
pub use hmac::mac;

pub mod kex;
pub use kex::{KeyExchange, KeyPair, PublicKey, SecretKey, SharedSecret, X25519};

/// Compute the display checksum for a shared secret,
/// the first 8 bytes of `SHA-512(secret)`
pub fn checksum(secret: &[u8; 32]) -> [u8; 8] {
    let h = sha512(secret);
    let mut c = [0u8; 8];
    c.copy_from_slice(&h[..8]);
    c
}

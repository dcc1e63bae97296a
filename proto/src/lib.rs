// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Protocol definitions for communication with Key20 lock controllers
//!
//! The lock exposes a single primary GATT service with four characteristics,
//! all operated without link-layer security (authentication is provided at
//! the application layer, see `key20-core`).
//!
//! | Characteristic | UUID16   | Access             | Payload          |
//! |----------------|----------|--------------------|------------------|
//! | Nonce          | `0x0002` | read, indicate     | [`Nonce`]        |
//! | Unlock         | `0x0003` | read, write        | [`Fragment`]     |
//! | Config In      | `0x0004` | read, write        | [`Fragment`]     |
//! | Config Out     | `0x0005` | read, indicate     | [`Fragment`]     |
//!
//! 32 byte values (public keys and authentication tags) exceed the
//! characteristic length so are transferred as two 16 byte [`Fragment`]s,
//! each prefixed with the key slot and part index.
//!
//! All multi-byte values are transferred little-endian as produced by the
//! underlying primitives.

#![no_std]

use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum::{Display, EnumIter, EnumString};

mod error;
pub use error::ProtoError;

pub mod fragment;
pub use fragment::{Fragment, Part};

pub mod nonce;
pub use nonce::Nonce;

pub mod cccd;
pub use cccd::Subscription;

/// Advertised device name
pub const DEVICE_NAME: &str = "Key20";

/// Number of key slots supported by the lock
pub const KEY_COUNT: usize = 4;

/// Length of shared secrets, public keys and authentication tags
pub const KEY_LEN: usize = 32;

/// Length of the value carried in a single [`Fragment`]
pub const HALF_LEN: usize = KEY_LEN / 2;

/// Length of authentication nonces
///
/// 128 bits keeps the collision probability negligible for any realistic
/// number of unlock requests over the lifetime of a device.
pub const NONCE_LEN: usize = 16;

/// Base UUID `0a9dXXXX-5ff4-4c58-8a53-627de7cf1faf` (little-endian),
/// bytes 12 and 13 are replaced with the service / characteristic UUID16.
pub const UUID_BASE: [u8; 16] = [
    0xaf, 0x1f, 0xcf, 0xe7, 0x7d, 0x62, 0x53, 0x8a, 0x58, 0x4c, 0xf4, 0x5f, 0x00, 0x00, 0x9d, 0x0a,
];

/// Primary service UUID16
pub const SERVICE_UUID: u16 = 0x0001;

/// Expand a UUID16 into the full 128-bit UUID (little-endian)
pub const fn uuid128(uuid16: u16) -> [u8; 16] {
    let mut u = UUID_BASE;
    let b = uuid16.to_le_bytes();
    u[12] = b[0];
    u[13] = b[1];
    u
}

/// Key20 service characteristics
#[derive(
    Copy, Clone, PartialEq, Eq, Debug, Display, EnumString, EnumIter, IntoPrimitive, TryFromPrimitive,
)]
#[repr(u16)]
pub enum Characteristic {
    /// Nonce for authentication, indicated to the peer on subscription
    Nonce = 0x0002,
    /// Authentication tag written by the peer to request unlock
    Unlock = 0x0003,
    /// Peer public key written during key exchange
    CfgIn = 0x0004,
    /// Device public key indicated to the peer during key exchange
    CfgOut = 0x0005,
}

impl Characteristic {
    /// Fetch the 128-bit UUID for this characteristic
    pub const fn uuid(&self) -> [u8; 16] {
        uuid128(*self as u16)
    }

    /// Fixed value length for this characteristic
    pub const fn value_len(&self) -> usize {
        match self {
            Characteristic::Nonce => NONCE_LEN,
            _ => Fragment::LEN,
        }
    }

    /// Check whether the peer may write this characteristic
    pub const fn is_writable(&self) -> bool {
        matches!(self, Characteristic::Unlock | Characteristic::CfgIn)
    }

    /// Check whether this characteristic supports indications
    pub const fn is_indicatable(&self) -> bool {
        matches!(self, Characteristic::Nonce | Characteristic::CfgOut)
    }
}

/// Operator buttons on the lock controller
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display, EnumString, EnumIter)]
pub enum Button {
    /// Start / abort key exchange, reject a pending key
    Red,
    /// Confirm a pending key
    Green,
}

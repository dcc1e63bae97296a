// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Client Characteristic Configuration Descriptor values
//!
//! Peers subscribe to the nonce and config-out characteristics by writing
//! the CCCD, only indication subscriptions (`0x0002`) are acted upon.

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::ProtoError;

/// CCCD subscription value
#[derive(Copy, Clone, PartialEq, Eq, Debug, IntoPrimitive, TryFromPrimitive)]
#[repr(u16)]
pub enum Subscription {
    None = 0x0000,
    Notify = 0x0001,
    Indicate = 0x0002,
}

impl Subscription {
    /// Parse a (little-endian) CCCD write
    pub fn parse(buff: &[u8]) -> Result<Self, ProtoError> {
        if buff.len() != 2 {
            return Err(ProtoError::InvalidLength);
        }

        let v = u16::from_le_bytes([buff[0], buff[1]]);

        Self::try_from(v).map_err(|_| ProtoError::InvalidEncoding)
    }

    /// Encode to CCCD value bytes
    pub fn to_bytes(&self) -> [u8; 2] {
        u16::from(*self).to_le_bytes()
    }
}

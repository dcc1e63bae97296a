// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Split-value fragments for key exchange and unlock
//!
//! ## Encoding
//!
//! ```text
//!  0               1               2
//!  0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 ...
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     SLOT      |     PART      |   DATA (16 bytes)  /
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! `PART` 0 carries bytes `0..16` of the value, `PART` 1 bytes `16..32`.

use encdec::{DecodeOwned, Encode};
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{ProtoError, HALF_LEN, KEY_COUNT, KEY_LEN};

/// Fragment part index
#[derive(Copy, Clone, PartialEq, Eq, Debug, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Part {
    First = 0,
    Second = 1,
}

impl Part {
    /// Byte offset of this part within the complete value
    pub const fn offset(&self) -> usize {
        *self as usize * HALF_LEN
    }
}

/// Half of a 32 byte value tagged with key slot and part index
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Fragment {
    /// Key slot this value refers to
    pub slot: u8,
    /// Part index
    pub part: Part,
    /// Value bytes
    pub data: [u8; HALF_LEN],
}

impl Fragment {
    /// Encoded fragment length
    pub const LEN: usize = 2 + HALF_LEN;

    /// Split a complete value into fragments for transmission
    pub fn split(slot: u8, value: &[u8; KEY_LEN]) -> [Fragment; 2] {
        let mut a = [0u8; HALF_LEN];
        let mut b = [0u8; HALF_LEN];

        a.copy_from_slice(&value[..HALF_LEN]);
        b.copy_from_slice(&value[HALF_LEN..]);

        [
            Fragment {
                slot,
                part: Part::First,
                data: a,
            },
            Fragment {
                slot,
                part: Part::Second,
                data: b,
            },
        ]
    }

    /// Parse a characteristic write, rejecting anything other than
    /// an exact-length fragment for a valid slot
    pub fn parse(buff: &[u8]) -> Result<Self, ProtoError> {
        if buff.len() != Self::LEN {
            return Err(ProtoError::InvalidLength);
        }

        let (f, _n) = Self::decode_owned(buff)?;
        Ok(f)
    }

    /// Encode to a fixed size array
    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let mut b = [0u8; Self::LEN];
        b[0] = self.slot;
        b[1] = self.part.into();
        b[2..].copy_from_slice(&self.data);
        b
    }
}

impl Encode for Fragment {
    type Error = ProtoError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(Self::LEN)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        if buff.len() < Self::LEN {
            return Err(ProtoError::InvalidLength);
        }

        buff[..Self::LEN].copy_from_slice(&self.to_bytes());

        Ok(Self::LEN)
    }
}

impl DecodeOwned for Fragment {
    type Output = Self;

    type Error = ProtoError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        if buff.len() < Self::LEN {
            return Err(ProtoError::InvalidLength);
        }

        let slot = buff[0];
        if slot as usize >= KEY_COUNT {
            return Err(ProtoError::InvalidSlot);
        }

        let part = Part::try_from(buff[1]).map_err(|_| ProtoError::InvalidPart)?;

        let mut data = [0u8; HALF_LEN];
        data.copy_from_slice(&buff[2..Self::LEN]);

        Ok((Self { slot, part, data }, Self::LEN))
    }
}

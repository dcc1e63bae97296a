// Copyright (c) 2022-2023 The MobileCoin Foundation

use core::fmt;

/// Protocol encoding / decoding errors
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ProtoError {
    /// Buffer length does not match the characteristic value
    InvalidLength,
    /// Key slot out of range
    InvalidSlot,
    /// Fragment part index out of range
    InvalidPart,
    /// Value could not be decoded
    InvalidEncoding,
}

impl From<encdec::Error> for ProtoError {
    fn from(e: encdec::Error) -> Self {
        match e {
            encdec::Error::Length => ProtoError::InvalidLength,
            #[allow(unreachable_patterns)]
            _ => ProtoError::InvalidEncoding,
        }
    }
}

impl fmt::Display for ProtoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProtoError::InvalidLength => "invalid length",
            ProtoError::InvalidSlot => "invalid key slot",
            ProtoError::InvalidPart => "invalid part index",
            ProtoError::InvalidEncoding => "invalid encoding",
        };
        f.write_str(s)
    }
}

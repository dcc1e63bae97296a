// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Complete enrolment and unlock scenario

use log::info;

use crate::{key_exchange, unlock, Device};

/// Slot used for scenario enrolment
pub const SLOT: u8 = 2;

/// Enrol a key for [SLOT] on a freshly booted device then unlock with it,
/// checking wrong tags and unused slots are rejected
pub fn test(d: &mut impl Device) -> anyhow::Result<()> {
    info!("enrolling key for slot {SLOT}");
    let secret = key_exchange::test(d, SLOT)?;

    info!("unlocking with slot {SLOT}");
    unlock::test(d, SLOT, &secret, true)?;

    info!("checking rejections");
    unlock::test(d, SLOT, &[0xa5; 32], false)?;
    unlock::test(d, SLOT + 1, &secret, false)?;

    Ok(())
}

// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Authentication / unlock flows

use anyhow::anyhow;
use log::debug;

use key20_proto::{Characteristic, KEY_LEN, NONCE_LEN};

use crate::{auth_tag, expect_display, write_split, Device};

/// Authenticate with the provided slot and secret, checking whether
/// the lock opens as expected
pub fn test(
    d: &mut impl Device,
    slot: u8,
    secret: &[u8; KEY_LEN],
    expect_open: bool,
) -> anyhow::Result<()> {
    d.connect()?;
    expect_display(d, "Authentication", "")?;

    let nonce = fetch_nonce(d)?;
    let tag = auth_tag(&nonce, secret);

    write_split(d, Characteristic::Unlock, slot, &tag)?;

    // Lock state is unchanged until disconnect
    anyhow::ensure!(!d.lock_open(), "lock opened prior to disconnect");

    d.disconnect()?;

    match expect_open {
        true => {
            anyhow::ensure!(d.lock_open(), "lock did not open");
            expect_display(d, "Opening door", "")?;

            // Lock releases after the lock action timeout
            let t = d.timeouts();
            d.advance(t.lock_ms - 1)?;
            anyhow::ensure!(d.lock_open(), "lock released early");

            d.advance(1)?;
            anyhow::ensure!(!d.lock_open(), "lock not released");
        }
        false => {
            anyhow::ensure!(!d.lock_open(), "lock opened for invalid request");
        }
    }

    expect_display(d, "Ready", "")?;

    Ok(())
}

/// Unlock with a valid secret, then replay the same tag on a second
/// connection, checking the nonce changes and the lock stays closed
pub fn replay(d: &mut impl Device, slot: u8, secret: &[u8; KEY_LEN]) -> anyhow::Result<()> {
    // Successful attempt
    d.connect()?;
    let first = fetch_nonce(d)?;
    let tag = auth_tag(&first, secret);
    write_split(d, Characteristic::Unlock, slot, &tag)?;
    d.disconnect()?;

    anyhow::ensure!(d.lock_open(), "lock did not open");
    let t = d.timeouts();
    d.advance(t.lock_ms)?;
    anyhow::ensure!(!d.lock_open(), "lock not released");

    // Replayed tag
    d.connect()?;
    let second = fetch_nonce(d)?;
    anyhow::ensure!(first != second, "nonce reused across attempts");

    write_split(d, Characteristic::Unlock, slot, &tag)?;
    d.disconnect()?;

    anyhow::ensure!(!d.lock_open(), "lock opened for replayed tag");
    expect_display(d, "Ready", "")?;

    Ok(())
}

/// Connect and stall, checking the device disconnects on auth timeout
pub fn timeout(d: &mut impl Device) -> anyhow::Result<()> {
    let t = d.timeouts();

    d.connect()?;
    let _nonce = fetch_nonce(d)?;

    d.advance(t.auth_ms - 1)?;
    anyhow::ensure!(d.is_connected(), "device disconnected early");

    d.advance(1)?;
    anyhow::ensure!(!d.is_connected(), "device did not disconnect on timeout");
    anyhow::ensure!(!d.lock_open(), "lock opened on timeout");

    expect_display(d, "Ready", "")?;

    Ok(())
}

/// Subscribe to and acknowledge a nonce indication
fn fetch_nonce(d: &mut impl Device) -> anyhow::Result<[u8; NONCE_LEN]> {
    d.subscribe(Characteristic::Nonce)?;

    let (ch, data) = d
        .next_indication()?
        .ok_or_else(|| anyhow!("missing nonce indication"))?;
    anyhow::ensure!(ch == Characteristic::Nonce, "unexpected indication on {ch}");

    let mut nonce = [0u8; NONCE_LEN];
    anyhow::ensure!(data.len() == NONCE_LEN, "invalid nonce length {}", data.len());
    nonce.copy_from_slice(&data);

    debug!("nonce: {}", hex::encode(nonce));

    d.ack_indication(ch)?;

    Ok(nonce)
}

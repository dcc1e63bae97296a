// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Key exchange flows

use log::debug;

use key20_proto::{Button, Characteristic, KEY_LEN};

use crate::{checksum, expect_display, read_split, write_split, Device, Peer};

/// Exchange and install a key for the provided slot, returning the
/// shared secret
pub fn test(d: &mut impl Device, slot: u8) -> anyhow::Result<[u8; KEY_LEN]> {
    let secret = exchange(d, slot)?;

    // Confirm, key is persisted then the device returns to idle
    d.press(Button::Green)?;
    expect_display(d, "Ready", "")?;

    Ok(secret)
}

/// Exchange a key then reject it at the operator decision
pub fn reject(d: &mut impl Device, slot: u8) -> anyhow::Result<()> {
    let _secret = exchange(d, slot)?;

    d.press(Button::Red)?;
    expect_display(d, "Ready", "")?;

    Ok(())
}

/// Start a key exchange then abort it via button prior to completion
pub fn abort(d: &mut impl Device, slot: u8) -> anyhow::Result<()> {
    let peer = Peer::new(&mut rand::thread_rng());

    d.press(Button::Red)?;
    d.connect()?;
    d.subscribe(Characteristic::CfgOut)?;
    write_split(d, Characteristic::CfgIn, slot, &peer.public)?;

    d.press(Button::Red)?;
    anyhow::ensure!(!d.is_connected(), "device did not disconnect on abort");
    expect_display(d, "Ready", "")?;

    Ok(())
}

/// Run key exchange up to the operator decision
fn exchange(d: &mut impl Device, slot: u8) -> anyhow::Result<[u8; KEY_LEN]> {
    let peer = Peer::new(&mut rand::thread_rng());

    debug!("starting key exchange for slot {slot}");

    d.press(Button::Red)?;
    expect_display(d, "Waiting for", "client key")?;

    d.connect()?;
    d.subscribe(Characteristic::CfgOut)?;

    // Send our public key, device responds with its own
    write_split(d, Characteristic::CfgIn, slot, &peer.public)?;
    let device_public = read_split(d, slot)?;

    let secret = peer.shared_secret(&device_public);
    let c = checksum(&secret);

    debug!("key exchange complete, checksum: {c}");

    expect_display(d, "Key checksum", &c)?;

    d.disconnect()?;

    // Checksum remains visible for the decision
    expect_display(d, "Key checksum", &c)?;

    Ok(secret)
}

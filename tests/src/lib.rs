// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Tests for Key20 lock controllers, acting as the peer (phone) side of
//! the protocol.
//!
//! Generic over [Device] for reuse against the in-memory harness and the
//! simulator.

use anyhow::anyhow;
use rand_core::{CryptoRng, RngCore};

use key20_proto::{Button, Characteristic, Fragment, Part, HALF_LEN, KEY_LEN};

pub mod key_exchange;

pub mod unlock;

pub mod scenario;

/// Device timeouts in milliseconds
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Timeouts {
    pub auth_ms: u32,
    pub lock_ms: u32,
}

/// Device under test, each operation delivers the peer or operator
/// action then runs the device until idle
pub trait Device {
    /// Peer connects
    fn connect(&mut self) -> anyhow::Result<()>;

    /// Peer disconnects
    fn disconnect(&mut self) -> anyhow::Result<()>;

    /// Check whether the peer link is up (the device may force disconnect)
    fn is_connected(&self) -> bool;

    /// Subscribe to indications on a characteristic
    fn subscribe(&mut self, ch: Characteristic) -> anyhow::Result<()>;

    /// Write a characteristic value
    fn write(&mut self, ch: Characteristic, data: &[u8]) -> anyhow::Result<()>;

    /// Fetch the next pending indication
    fn next_indication(&mut self) -> anyhow::Result<Option<(Characteristic, Vec<u8>)>>;

    /// Acknowledge an indication
    fn ack_indication(&mut self, ch: Characteristic) -> anyhow::Result<()>;

    /// Operator button press
    fn press(&mut self, b: Button) -> anyhow::Result<()>;

    /// Current display lines
    fn display(&self) -> (String, String);

    /// Lock actuator state
    fn lock_open(&self) -> bool;

    /// Advance device time
    fn advance(&mut self, ms: u32) -> anyhow::Result<()>;

    /// Device timeouts
    fn timeouts(&self) -> Timeouts;
}

/// Peer key exchange state
pub struct Peer {
    secret: [u8; KEY_LEN],
    pub public: [u8; KEY_LEN],
}

impl Peer {
    /// Generate a new peer key pair
    pub fn new(rng: &mut (impl RngCore + CryptoRng)) -> Self {
        let mut secret = [0u8; KEY_LEN];
        rng.fill_bytes(&mut secret);

        let public = x25519_dalek::x25519(secret, x25519_dalek::X25519_BASEPOINT_BYTES);

        Self { secret, public }
    }

    /// Compute the shared secret with the device public key
    pub fn shared_secret(&self, device_public: &[u8; KEY_LEN]) -> [u8; KEY_LEN] {
        x25519_dalek::x25519(self.secret, *device_public)
    }
}

/// Compute the expected display checksum for a shared secret
pub fn checksum(secret: &[u8; KEY_LEN]) -> String {
    let h = hmac_sha512::Hash::hash(secret);
    hex::encode_upper(&h[..8])
}

/// Compute the authentication tag for a nonce
pub fn auth_tag(nonce: &[u8], secret: &[u8; KEY_LEN]) -> [u8; KEY_LEN] {
    let m = hmac_sha512::HMAC::mac(nonce, secret);

    let mut t = [0u8; KEY_LEN];
    t.copy_from_slice(&m[..KEY_LEN]);
    t
}

/// Write a 32 byte value as two fragments
pub fn write_split(
    d: &mut impl Device,
    ch: Characteristic,
    slot: u8,
    value: &[u8; KEY_LEN],
) -> anyhow::Result<()> {
    for f in Fragment::split(slot, value) {
        d.write(ch, &f.to_bytes())?;
    }
    Ok(())
}

/// Receive a 32 byte value as two acknowledged config-out fragments
pub fn read_split(d: &mut impl Device, slot: u8) -> anyhow::Result<[u8; KEY_LEN]> {
    let mut v = [0u8; KEY_LEN];

    for part in [Part::First, Part::Second] {
        let (ch, data) = d
            .next_indication()?
            .ok_or_else(|| anyhow!("missing {part:?} config-out indication"))?;

        anyhow::ensure!(ch == Characteristic::CfgOut, "unexpected indication on {ch}");

        let f = Fragment::parse(&data).map_err(|e| anyhow!("invalid fragment: {e}"))?;
        anyhow::ensure!(f.slot == slot, "slot mismatch ({} != {slot})", f.slot);
        anyhow::ensure!(f.part == part, "part mismatch ({:?} != {part:?})", f.part);

        v[part.offset()..][..HALF_LEN].copy_from_slice(&f.data);

        d.ack_indication(ch)?;
    }

    Ok(v)
}

/// Check display contents
pub fn expect_display(d: &impl Device, line1: &str, line2: &str) -> anyhow::Result<()> {
    let (l1, l2) = d.display();
    anyhow::ensure!(
        l1 == line1 && l2 == line2,
        "unexpected display '{l1}' / '{l2}' (expected '{line1}' / '{line2}')"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peers_agree() {
        let mut rng = rand::thread_rng();
        let a = Peer::new(&mut rng);
        let b = Peer::new(&mut rng);

        assert_eq!(a.shared_secret(&b.public), b.shared_secret(&a.public));
    }

    #[test]
    fn checksum_format() {
        let c = checksum(&[0u8; KEY_LEN]);
        assert_eq!(c.len(), 16);
        assert_eq!(c, c.to_uppercase());
    }
}

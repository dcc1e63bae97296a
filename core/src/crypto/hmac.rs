// Copyright (c) 2022-2023 The MobileCoin Foundation

//! HMAC-SHA-512-256, HMAC-SHA-512 truncated to 32 bytes

use zeroize::Zeroize;

use super::{
    sha512::{Sha512, BLOCK_LEN},
    verify_32,
};

/// MAC key length
pub const KEY_LEN: usize = 32;

/// MAC tag length
pub const TAG_LEN: usize = 32;

const IPAD: u8 = 0x36;
const OPAD: u8 = 0x5c;

/// Compute `HMAC-SHA-512(key, message)[..32]`
pub fn mac(message: &[u8], key: &[u8; KEY_LEN]) -> [u8; TAG_LEN] {
    let mut pad = [0u8; BLOCK_LEN];

    // Inner hash over `(key ^ ipad) || message`
    pad_key(&mut pad, key, IPAD);
    let mut h = Sha512::new();
    h.update(&pad);
    h.update(message);
    let mut inner = h.finalize();

    // Outer hash over `(key ^ opad) || inner`
    pad_key(&mut pad, key, OPAD);
    let mut h = Sha512::new();
    h.update(&pad);
    h.update(&inner);
    let mut outer = h.finalize();

    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&outer[..TAG_LEN]);

    pad.zeroize();
    inner.zeroize();
    outer.zeroize();

    tag
}

/// Check a tag against the MAC of the provided message and key
/// in constant time
pub fn verify(tag: &[u8; TAG_LEN], message: &[u8], key: &[u8; KEY_LEN]) -> bool {
    let mut expected = mac(message, key);
    let ok = verify_32(tag, &expected);
    expected.zeroize();
    ok
}

fn pad_key(pad: &mut [u8; BLOCK_LEN], key: &[u8; KEY_LEN], v: u8) {
    pad.fill(v);
    for (p, k) in pad.iter_mut().zip(key.iter()) {
        *p ^= k;
    }
}

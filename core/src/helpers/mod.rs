// Copyright (c) 2022-2023 The MobileCoin Foundation

use core::fmt::Write;

/// Rendered checksum, 16 hex digits
pub type ChecksumStr = heapless::String<16>;

/// Format a key checksum for display as uppercase hex, `c[0]` leftmost
pub fn fmt_checksum(c: &[u8; 8]) -> ChecksumStr {
    let mut s = ChecksumStr::new();
    for b in c {
        // Capacity matches the checksum length so this cannot fail
        let _ = write!(s, "{b:02X}");
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_format() {
        let s = fmt_checksum(&[0x00, 0x01, 0xab, 0xcd, 0xef, 0x10, 0x9a, 0xff]);
        assert_eq!(s.as_str(), "0001ABCDEF109AFF");
    }
}

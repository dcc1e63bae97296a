// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Constant-time equality for fixed length secrets
//!
//! Every byte of both inputs is read regardless of the position of the first
//! difference, with a single reduction to a boolean at the end.

use subtle::{Choice, ConstantTimeEq};

/// Accumulate positionwise equality over `n` bytes fetched via the
/// provided accessors
///
/// Set iff all bytes match.
#[inline(never)]
pub(crate) fn accumulate(
    n: usize,
    mut x: impl FnMut(usize) -> u8,
    mut y: impl FnMut(usize) -> u8,
) -> Choice {
    let mut eq = Choice::from(1);
    for i in 0..n {
        eq &= x(i).ct_eq(&y(i));
    }
    eq
}

/// Reduce an accumulated choice to a boolean
#[inline(always)]
fn reduce(eq: Choice) -> bool {
    bool::from(eq)
}

/// Constant-time comparison of two `N` byte values
pub fn verify<const N: usize>(x: &[u8; N], y: &[u8; N]) -> bool {
    reduce(accumulate(N, |i| x[i], |i| y[i]))
}

/// Constant-time comparison of two 16 byte values
pub fn verify_16(x: &[u8; 16], y: &[u8; 16]) -> bool {
    verify(x, y)
}

/// Constant-time comparison of two 32 byte values
pub fn verify_32(x: &[u8; 32], y: &[u8; 32]) -> bool {
    verify(x, y)
}

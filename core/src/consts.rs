// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Lock controller constants and runtime configuration

pub use key20_proto::{KEY_COUNT, KEY_LEN, NONCE_LEN};

/// Event queue capacity
pub const QUEUE_SIZE: usize = 16;

/// Authentication timeout (connection to unlock request)
pub const AUTH_TIMEOUT_MS: u32 = 10_000;

/// Duration the lock is held open on successful authentication
pub const LOCK_ACTION_MS: u32 = 2_000;

/// Completion polls before a flash operation is considered failed
pub const FLASH_WAIT_SPINS: u32 = 1_000_000;

/// Store image marker, a matching preamble indicates initialised key slots
pub const PREAMBLE: [u8; 16] = [
    0xfe, 0xec, 0x91, 0xf1, 0x06, 0xc4, 0x40, 0x24, 0xbf, 0x19, 0x69, 0x7f, 0x96, 0x4d, 0xc6, 0x67,
];

/// Store image length, preamble followed by key slots
pub const STORE_LEN: usize = PREAMBLE.len() + KEY_COUNT * KEY_LEN;

static_assertions::const_assert_eq!(STORE_LEN, 144);
static_assertions::const_assert!(KEY_COUNT <= 8);

/// Runtime configuration for [App][crate::app::App] instances
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Config {
    /// Authentication timeout in milliseconds
    pub auth_timeout_ms: u32,
    /// Lock open period in milliseconds
    pub lock_action_ms: u32,
    /// Maximum completion polls per blocking flash operation
    pub flash_wait_spins: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auth_timeout_ms: AUTH_TIMEOUT_MS,
            lock_action_ms: LOCK_ACTION_MS,
            flash_wait_spins: FLASH_WAIT_SPINS,
        }
    }
}

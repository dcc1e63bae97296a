// Copyright (c) 2022-2023 The MobileCoin Foundation

/// Fatal errors, any of these propagates to [App::run][crate::app::App::run]
/// and results in a platform reset
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "thiserror", derive(thiserror::Error))]
#[cfg_attr(not(feature = "thiserror"), derive(strum::Display))]
#[repr(u8)]
pub enum Error {
    /// BLE transport operation failed
    #[cfg_attr(feature = "thiserror", error("transport failure"))]
    Transport = 0x00,

    /// Timer operation failed
    #[cfg_attr(feature = "thiserror", error("timer failure"))]
    Timer = 0x01,

    /// Flash operation failed or reported failure
    #[cfg_attr(feature = "thiserror", error("flash failure"))]
    Flash = 0x02,

    /// Flash operation did not complete within the wait bound
    #[cfg_attr(feature = "thiserror", error("flash operation timeout"))]
    FlashTimeout = 0x03,

    /// Random number generation failed
    #[cfg_attr(feature = "thiserror", error("rng failure"))]
    Rng = 0x04,

    /// Engine reached an inconsistent state
    #[cfg_attr(feature = "thiserror", error("invalid engine state"))]
    InvalidState = 0x05,
}

// Copyright (c) 2022-2023 The MobileCoin Foundation

use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum::{Display, EnumCount, EnumIter, EnumString};

/// [Engine][super::Engine] input events
///
/// Events carry no payload, fragment values are written to the
/// [Inbox][crate::inbox::Inbox] receive buffers before the event is queued
/// and delivered alongside via [Received][crate::inbox::Received].
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Debug,
    Display,
    EnumString,
    EnumIter,
    EnumCount,
    IntoPrimitive,
    TryFromPrimitive,
)]
#[repr(u8)]
pub enum Event {
    /// Authentication timer expired
    AuthTimeout = 0x00,
    /// Red (start / abort) button pressed
    RedPressed = 0x01,
    /// Green (confirm) button pressed
    GreenPressed = 0x02,
    /// Peer connected
    Connected = 0x03,
    /// Peer disconnected
    Disconnected = 0x04,
    /// Peer subscribed to config-out indications
    SubscribedKexOut = 0x05,
    /// Peer subscribed to nonce indications
    SubscribedNonce = 0x06,
    /// Config-in fragment written
    KeyPartReceived = 0x07,
    /// Unlock fragment written
    TagPartReceived = 0x08,
    /// Persistence operation complete
    StoreReady = 0x09,
    /// Lock actuator timer expired
    LockActionTimeout = 0x0a,
    /// Nonce indication acknowledged
    NonceAcked = 0x0b,
    /// Config-out indication acknowledged
    KexOutAcked = 0x0c,
    /// Persistence operation failed
    StoreFailed = 0x0d,
}

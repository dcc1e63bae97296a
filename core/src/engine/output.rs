// Copyright (c) 2022-2023 The MobileCoin Foundation

use strum::{Display, EnumIter, EnumString};

use key20_proto::{Fragment, Nonce};

/// Single-shot timers driven by the [Engine][super::Engine]
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display, EnumString, EnumIter)]
pub enum Timer {
    /// Armed on connection, bounds the authentication exchange
    Auth,
    /// Armed on unlock, holds the lock open
    LockAction,
}

/// Display messages
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Message {
    Booting,
    Ready,
    WaitingForKey,
    Authenticating,
    Calculating,
    /// First 8 bytes of `SHA-512(secret)`, rendered as hex
    Checksum([u8; 8]),
    StoringKey,
    Opening,
    Error,
}

impl Message {
    /// Fetch static display lines, the second line of [Message::Checksum]
    /// is rendered from the checksum value (see [fmt_checksum][crate::helpers::fmt_checksum])
    pub const fn lines(&self) -> (&'static str, &'static str) {
        match self {
            Message::Booting => ("Booting", ""),
            Message::Ready => ("Ready", ""),
            Message::WaitingForKey => ("Waiting for", "client key"),
            Message::Authenticating => ("Authentication", ""),
            Message::Calculating => ("Calculating", "secret"),
            Message::Checksum(_) => ("Key checksum", ""),
            Message::StoringKey => ("Storing key", ""),
            Message::Opening => ("Opening door", ""),
            Message::Error => ("Error", ""),
        }
    }
}

/// [Engine][super::Engine] outputs, collaborator calls to be applied in order
#[derive(Clone, PartialEq, Debug)]
pub enum Output {
    /// Start advertising for connections
    Advertise,
    /// Force disconnection of the connected peer
    Disconnect,
    /// Indicate a nonce on the nonce characteristic
    IndicateNonce(Nonce),
    /// Indicate a public key fragment on the config-out characteristic
    IndicateFragment(Fragment),
    /// Arm a timer (cancelling any pending expiry)
    StartTimer(Timer),
    /// Disarm a timer
    StopTimer(Timer),
    /// Set lock actuator state (`true` for open)
    SetLock(bool),
    /// Update display
    Display(Message),
    /// Persist the contents of a key slot
    PersistSlot(u8),
}

/// Ordered outputs for a single event
pub type Outputs = heapless::Vec<Output, 8>;

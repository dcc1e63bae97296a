// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Platform collaborator traits, implemented by firmware or simulator
//! targets to drive an [App][crate::app::App]

use key20_proto::Characteristic;

use crate::engine::{Error, Timer};

/// BLE transport
pub trait Transport {
    /// Start (or restart) connectable advertising
    fn start_advertising(&mut self) -> Result<(), Error>;

    /// Send an indication on the provided characteristic
    fn indicate(&mut self, ch: Characteristic, data: &[u8]) -> Result<(), Error>;

    /// Disconnect the connected peer
    fn disconnect(&mut self) -> Result<(), Error>;
}

/// Single-shot timers, expiry is reported via
/// [Inbox::on_timer][crate::inbox::Inbox::on_timer]
pub trait Timers {
    /// Arm a timer, cancelling any pending expiry
    fn start(&mut self, timer: Timer, ms: u32) -> Result<(), Error>;

    /// Disarm a timer
    fn stop(&mut self, timer: Timer) -> Result<(), Error>;
}

/// Lock actuator and display
pub trait Ui {
    fn set_lock(&mut self, open: bool);

    fn display(&mut self, line1: &str, line2: &str);

    fn display_power(&mut self, on: bool);
}

/// Platform support for [App][crate::app::App] instances
pub trait Platform: Transport + Timers + Ui {
    /// Sleep until the next interrupt
    fn wait_for_event(&mut self);

    /// Reset the device
    fn reset(&mut self) -> !;
}

// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Key20 BLE lock core
//!
//! This provides a hardware-independent [Engine][engine] implementing key
//! exchange and authentication for Key20 lock controllers, with the
//! [App][app::App] context binding the engine to platform collaborators.
//!
//! Interactions with the [Engine][engine] are performed via [Event][engine::Event]s
//! and [Output][engine::Output]s, see [key20_proto] for GATT characteristics and
//! wire encodings.
//!
//! ## Operation
//!
//! Platform interrupt handlers decode radio, timer, button and flash
//! callbacks via an [Inbox][inbox::Inbox], usually a `static`:
//!
//! ```no_run
//! use key20_core::inbox::Inbox;
//! use key20_proto::{Button, Characteristic};
//!
//! static INBOX: Inbox = Inbox::new();
//!
//! // From interrupt context
//! INBOX.on_connected();
//! INBOX.on_write(Characteristic::Unlock, &[0u8; 18]);
//! INBOX.on_button(Button::Red);
//! ```
//!
//! The main loop boots the [App][app::App] then repeatedly drains the inbox,
//! see [App::run][app::App::run]. Fatal errors display `Error` and reset
//! via [Platform::reset][platform::Platform::reset].
//!
//! ## Key storage
//!
//! Shared secrets for up to [KEY_COUNT][consts::KEY_COUNT] peers are held
//! in a single flash block, see [store] for layout.

#![cfg_attr(not(feature = "std"), no_std)]

pub use key20_proto::{self as proto};

pub mod app;

pub mod consts;

pub mod crypto;

pub mod engine;
pub use engine::Error;

pub mod helpers;

pub mod inbox;

pub mod platform;

pub mod queue;

pub mod store;

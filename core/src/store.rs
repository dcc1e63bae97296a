// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Persistent key slot storage
//!
//! ## Image layout
//!
//! ```text
//! +------------+----------+----------+----------+----------+
//! | PREAMBLE   | SLOT 0   | SLOT 1   | SLOT 2   | SLOT 3   |
//! | 16 bytes   | 32 bytes | 32 bytes | 32 bytes | 32 bytes |
//! +------------+----------+----------+----------+----------+
//! ```
//!
//! An image with a mismatched preamble is uninitialised and is formatted on
//! [KeyStore::open]. Flash operations complete asynchronously, signalled via
//! [Completion] from the platform persistence callback.

use core::{
    fmt::Debug,
    sync::atomic::{AtomicBool, Ordering},
};

use bitflags::bitflags;
use zeroize::Zeroize;

use crate::{
    consts::{KEY_COUNT, KEY_LEN, PREAMBLE},
    crypto::{verify_16, SharedSecret},
    Error,
};

/// Flash operation kinds, reported with completion callbacks
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum FlashOp {
    Clear,
    Store,
    Update,
}

/// Persistence collaborator
///
/// `load` is synchronous, `store`, `update` and `clear` return once the
/// operation is issued with completion signalled later via
/// [Inbox::on_flash_complete][crate::inbox::Inbox::on_flash_complete].
pub trait Flash {
    type Error: Debug;

    /// Read `buff.len()` bytes from `offset`
    fn load(&mut self, offset: usize, buff: &mut [u8]) -> Result<(), Self::Error>;

    /// Write to previously cleared storage
    fn store(&mut self, offset: usize, data: &[u8]) -> Result<(), Self::Error>;

    /// Erase-safe read-modify-write of a region
    fn update(&mut self, offset: usize, data: &[u8]) -> Result<(), Self::Error>;

    /// Erase the whole image
    fn clear(&mut self) -> Result<(), Self::Error>;
}

impl<T: Flash> Flash for &mut T {
    type Error = T::Error;

    fn load(&mut self, offset: usize, buff: &mut [u8]) -> Result<(), Self::Error> {
        T::load(self, offset, buff)
    }

    fn store(&mut self, offset: usize, data: &[u8]) -> Result<(), Self::Error> {
        T::store(self, offset, data)
    }

    fn update(&mut self, offset: usize, data: &[u8]) -> Result<(), Self::Error> {
        T::update(self, offset, data)
    }

    fn clear(&mut self) -> Result<(), Self::Error> {
        T::clear(self)
    }
}

/// Flash operation completion flag, set from the persistence callback
#[derive(Debug, Default)]
pub struct Completion {
    ready: AtomicBool,
    failed: AtomicBool,
}

impl Completion {
    pub const fn new() -> Self {
        Self {
            ready: AtomicBool::new(false),
            failed: AtomicBool::new(false),
        }
    }

    /// Reset prior to issuing an operation
    pub fn begin(&self) {
        self.failed.store(false, Ordering::SeqCst);
        self.ready.store(false, Ordering::SeqCst);
    }

    /// Signal operation completion
    pub fn notify(&self, ok: bool) {
        self.failed.store(!ok, Ordering::SeqCst);
        self.ready.store(true, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Poll for completion, at most `spins` times
    pub fn wait(&self, spins: u32) -> Result<(), Error> {
        for _ in 0..spins {
            if self.ready.load(Ordering::SeqCst) {
                return match self.failed.load(Ordering::SeqCst) {
                    false => Ok(()),
                    true => Err(Error::Flash),
                };
            }
            core::hint::spin_loop();
        }

        Err(Error::FlashTimeout)
    }
}

bitflags! {
    /// Key slot validity mask
    pub struct SlotMask: u8 {
        const SLOT0 = 1 << 0;
        const SLOT1 = 1 << 1;
        const SLOT2 = 1 << 2;
        const SLOT3 = 1 << 3;
    }
}

impl SlotMask {
    /// Mask for a single slot index
    pub fn slot(i: u8) -> Self {
        Self::from_bits_truncate(1u8.checked_shl(i as u32).unwrap_or(0))
    }

    pub fn is_set(&self, i: u8) -> bool {
        !Self::slot(i).is_empty() && self.contains(Self::slot(i))
    }
}

/// In-memory key slots
#[derive(Clone, Zeroize)]
pub struct KeySlots {
    keys: [[u8; KEY_LEN]; KEY_COUNT],
    #[zeroize(skip)]
    valid: SlotMask,
}

impl Default for KeySlots {
    fn default() -> Self {
        Self::new()
    }
}

impl KeySlots {
    pub const fn new() -> Self {
        Self {
            keys: [[0u8; KEY_LEN]; KEY_COUNT],
            valid: SlotMask::empty(),
        }
    }

    pub fn valid(&self) -> SlotMask {
        self.valid
    }

    /// Check whether a slot holds a key
    pub fn is_valid(&self, slot: u8) -> bool {
        self.valid.is_set(slot)
    }

    /// Fetch the key for a valid slot
    pub fn get(&self, slot: u8) -> Option<&[u8; KEY_LEN]> {
        match self.is_valid(slot) {
            true => self.keys.get(slot as usize),
            false => None,
        }
    }

    /// Replace the key in a slot
    pub fn set(&mut self, slot: u8, secret: &SharedSecret) {
        if let Some(k) = self.keys.get_mut(slot as usize) {
            k.copy_from_slice(secret.as_bytes());
            self.refresh();
        }
    }

    /// Drop all keys
    pub fn clear(&mut self) {
        self.keys.zeroize();
        self.valid = SlotMask::empty();
    }

    /// Recompute validity, a slot is valid iff not all zero
    fn refresh(&mut self) {
        self.valid = SlotMask::empty();
        for (i, k) in self.keys.iter().enumerate() {
            if k.iter().fold(0u8, |a, b| a | b) != 0 {
                self.valid |= SlotMask::slot(i as u8);
            }
        }
    }
}

impl core::fmt::Debug for KeySlots {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KeySlots")
            .field("valid", &self.valid)
            .finish_non_exhaustive()
    }
}

/// Offset of a key slot in the store image
pub const fn slot_offset(slot: u8) -> usize {
    PREAMBLE.len() + slot as usize * KEY_LEN
}

/// Key store over a [Flash] collaborator
pub struct KeyStore<'a, F: Flash> {
    flash: F,
    completion: &'a Completion,
    wait_spins: u32,
}

impl<'a, F: Flash> KeyStore<'a, F> {
    /// Create a new key store, `wait_spins` bounds blocking operations
    pub fn new(flash: F, completion: &'a Completion, wait_spins: u32) -> Self {
        Self {
            flash,
            completion,
            wait_spins,
        }
    }

    /// Access the underlying flash
    pub fn flash(&mut self) -> &mut F {
        &mut self.flash
    }

    /// Clear the image and write the preamble and empty slots,
    /// blocking on each operation
    pub fn format(&mut self) -> Result<(), Error> {
        #[cfg(feature = "log")]
        log::info!("formatting key store");

        self.completion.begin();
        self.flash.clear().map_err(flash_err)?;
        self.completion.wait(self.wait_spins)?;

        self.completion.begin();
        self.flash.store(0, &PREAMBLE).map_err(flash_err)?;
        self.completion.wait(self.wait_spins)?;

        for i in 0..KEY_COUNT as u8 {
            self.completion.begin();
            self.flash
                .store(slot_offset(i), &[0u8; KEY_LEN])
                .map_err(flash_err)?;
            self.completion.wait(self.wait_spins)?;
        }

        Ok(())
    }

    /// Load all slots, returning `None` if the image is uninitialised
    pub fn load_all(&mut self, slots: &mut KeySlots) -> Result<Option<SlotMask>, Error> {
        let mut p = [0u8; PREAMBLE.len()];
        self.flash.load(0, &mut p).map_err(flash_err)?;

        if !verify_16(&p, &PREAMBLE) {
            return Ok(None);
        }

        for i in 0..KEY_COUNT as u8 {
            self.flash
                .load(slot_offset(i), &mut slots.keys[i as usize])
                .map_err(flash_err)?;
        }
        slots.refresh();

        #[cfg(feature = "log")]
        log::debug!("loaded key slots: {:?}", slots.valid);

        Ok(Some(slots.valid))
    }

    /// Load slots, formatting an uninitialised image
    pub fn open(&mut self, slots: &mut KeySlots) -> Result<SlotMask, Error> {
        if let Some(m) = self.load_all(slots)? {
            return Ok(m);
        }

        self.format()?;
        slots.clear();

        Ok(SlotMask::empty())
    }

    /// Persist a single slot
    ///
    /// This returns once the update is issued, completion is delivered
    /// as a `StoreReady` event.
    pub fn store(&mut self, slot: u8, slots: &KeySlots) -> Result<(), Error> {
        let k = slots.keys.get(slot as usize).ok_or(Error::InvalidState)?;

        self.completion.begin();
        self.flash.update(slot_offset(slot), k).map_err(flash_err)
    }
}

fn flash_err<E: Debug>(_e: E) -> Error {
    #[cfg(feature = "log")]
    log::error!("flash error: {:?}", _e);
    Error::Flash
}

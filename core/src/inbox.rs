// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Interrupt-side event intake
//!
//! Platform callbacks (radio, timers, buttons, flash) decode their inputs
//! into the [Inbox], writing fragment payloads to the [Received] buffers and
//! queueing the matching [Event] within a single critical section. The
//! application pops events together with a snapshot of the buffers under the
//! same exclusion.

use core::{
    cell::RefCell,
    sync::atomic::{AtomicBool, Ordering},
};

use critical_section::Mutex;
use zeroize::Zeroize;

use key20_proto::{Button, Characteristic, Fragment, Part, Subscription, HALF_LEN, KEY_LEN};

use crate::{
    consts::QUEUE_SIZE,
    engine::{Event, Timer},
    queue::{EventQueue, Full},
    store::{Completion, FlashOp},
};

/// Two-part value assembled from [Fragment]s
///
/// The first fragment fixes the slot, fragments for any other slot are
/// rejected until the pair is cleared.
#[derive(Clone, PartialEq, Eq, Debug, Default, Zeroize)]
pub struct HalfPair {
    slot: u8,
    halves: [[u8; HALF_LEN]; 2],
    present: u8,
}

impl HalfPair {
    pub const fn new() -> Self {
        Self {
            slot: 0,
            halves: [[0u8; HALF_LEN]; 2],
            present: 0,
        }
    }

    /// Add a fragment, returns false if the fragment slot does not
    /// match the slot already established
    pub fn insert(&mut self, f: &Fragment) -> bool {
        if self.present != 0 && f.slot != self.slot {
            return false;
        }

        self.slot = f.slot;
        self.halves[f.part as usize].copy_from_slice(&f.data);
        self.present |= 1 << f.part as u8;

        true
    }

    /// Slot established by the first fragment
    pub fn slot(&self) -> Option<u8> {
        match self.present {
            0 => None,
            _ => Some(self.slot),
        }
    }

    pub fn has(&self, part: Part) -> bool {
        self.present & (1 << part as u8) != 0
    }

    pub fn is_complete(&self) -> bool {
        self.has(Part::First) && self.has(Part::Second)
    }

    /// Fetch the assembled value once both parts are present
    pub fn value(&self) -> Option<[u8; KEY_LEN]> {
        if !self.is_complete() {
            return None;
        }

        let mut v = [0u8; KEY_LEN];
        v[Part::First.offset()..][..HALF_LEN].copy_from_slice(&self.halves[0]);
        v[Part::Second.offset()..][..HALF_LEN].copy_from_slice(&self.halves[1]);
        Some(v)
    }
}

/// Payload buffers written by characteristic writes
#[derive(Clone, PartialEq, Eq, Debug, Default, Zeroize)]
pub struct Received {
    /// Peer public key (config-in)
    pub kex: HalfPair,
    /// Authentication tag (unlock)
    pub tag: HalfPair,
}

impl Received {
    pub const fn new() -> Self {
        Self {
            kex: HalfPair::new(),
            tag: HalfPair::new(),
        }
    }
}

struct Shared<const N: usize> {
    queue: EventQueue<N>,
    received: Received,
    dropped: usize,
}

/// Interrupt-shared event queue and receive buffers
pub struct Inbox<const N: usize = QUEUE_SIZE> {
    shared: Mutex<RefCell<Shared<N>>>,
    completion: Completion,
    running: AtomicBool,
}

impl<const N: usize> Default for Inbox<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Inbox<N> {
    /// Create a new inbox, suitable for use as a `static`
    pub const fn new() -> Self {
        Self {
            shared: Mutex::new(RefCell::new(Shared {
                queue: EventQueue::new(),
                received: Received::new(),
                dropped: 0,
            })),
            completion: Completion::new(),
            running: AtomicBool::new(false),
        }
    }

    /// Flash completion flag for blocking store operations
    pub fn completion(&self) -> &Completion {
        &self.completion
    }

    /// Switch from boot to application mode, after which flash
    /// completions are queued as events
    pub fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Pop the next event with a snapshot of the receive buffers
    pub fn pop(&self) -> Option<(Event, Received)> {
        critical_section::with(|cs| {
            let mut s = self.shared.borrow_ref_mut(cs);
            let evt = s.queue.pop()?;
            Some((evt, s.received.clone()))
        })
    }

    /// Number of queued events
    pub fn pending(&self) -> usize {
        critical_section::with(|cs| self.shared.borrow_ref(cs).queue.occupied())
    }

    /// Number of events dropped on a full queue
    pub fn dropped(&self) -> usize {
        critical_section::with(|cs| self.shared.borrow_ref(cs).dropped)
    }

    /// Peer connected, receive buffers are wiped for the new session
    pub fn on_connected(&self) {
        self.with(|s| {
            s.received.zeroize();
            push(s, Event::Connected);
        })
    }

    pub fn on_disconnected(&self) {
        self.push(Event::Disconnected)
    }

    /// Characteristic write, malformed writes are dropped
    pub fn on_write(&self, ch: Characteristic, data: &[u8]) {
        let evt = match ch {
            Characteristic::CfgIn => Event::KeyPartReceived,
            Characteristic::Unlock => Event::TagPartReceived,
            _ => return,
        };

        let f = match Fragment::parse(data) {
            Ok(v) => v,
            Err(_e) => {
                #[cfg(feature = "log")]
                log::debug!("dropping {} write: {}", ch, _e);
                return;
            }
        };

        self.with(|s| {
            let pair = match ch {
                Characteristic::CfgIn => &mut s.received.kex,
                _ => &mut s.received.tag,
            };

            if !pair.insert(&f) {
                #[cfg(feature = "log")]
                log::debug!("dropping {} write for slot {}", ch, f.slot);
                return;
            }

            push(s, evt);
        })
    }

    /// CCCD write, only indication subscriptions raise events
    pub fn on_cccd_write(&self, ch: Characteristic, data: &[u8]) {
        match (ch, Subscription::parse(data)) {
            (Characteristic::Nonce, Ok(Subscription::Indicate)) => {
                self.push(Event::SubscribedNonce)
            }
            (Characteristic::CfgOut, Ok(Subscription::Indicate)) => {
                self.push(Event::SubscribedKexOut)
            }
            _ => (),
        }
    }

    pub fn on_indication_ack(&self, ch: Characteristic) {
        match ch {
            Characteristic::Nonce => self.push(Event::NonceAcked),
            Characteristic::CfgOut => self.push(Event::KexOutAcked),
            _ => (),
        }
    }

    pub fn on_button(&self, b: Button) {
        match b {
            Button::Red => self.push(Event::RedPressed),
            Button::Green => self.push(Event::GreenPressed),
        }
    }

    pub fn on_timer(&self, t: Timer) {
        match t {
            Timer::Auth => self.push(Event::AuthTimeout),
            Timer::LockAction => self.push(Event::LockActionTimeout),
        }
    }

    /// Flash operation complete, always signals [Completion] and
    /// queues a store event once running
    pub fn on_flash_complete(&self, _op: FlashOp, ok: bool) {
        #[cfg(feature = "log")]
        log::trace!("flash {:?} complete (ok: {})", _op, ok);

        self.completion.notify(ok);

        if self.is_running() {
            self.push(match ok {
                true => Event::StoreReady,
                false => Event::StoreFailed,
            });
        }
    }

    fn push(&self, evt: Event) {
        self.with(|s| push(s, evt))
    }

    fn with<R>(&self, f: impl FnOnce(&mut Shared<N>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.shared.borrow_ref_mut(cs)))
    }
}

fn push<const N: usize>(s: &mut Shared<N>, evt: Event) {
    if let Err(Full(_e)) = s.queue.push(evt) {
        s.dropped += 1;

        #[cfg(feature = "log")]
        log::warn!("event queue full, dropped {}", _e);
    }
}

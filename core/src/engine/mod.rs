// Copyright (c) 2022-2023 The MobileCoin Foundation

//! The [Engine] implements the Key20 key exchange and authentication protocol.
//!
//! This handles [Event] inputs and returns an ordered list of [Output]s for
//! the caller to apply to the platform, see [App][crate::app::App] for the
//! top-level context and [key20_proto] for wire encodings.
//!
//! ## Key exchange
//!
//! Entered with a red button press while idle, ensuring physical presence.
//!
//! 1. Peer connects and subscribes to config-out indications
//! 2. Peer writes its public key to config-in as two [Fragment]s for the
//!    target slot
//! 3. Device generates an ephemeral key pair, derives the shared secret, and
//!    displays a checksum of the secret
//! 4. Device indicates its public key in two fragments, each acknowledged
//! 5. Peer disconnects, the operator compares checksums and presses green
//!    to install the key (or red to discard)
//!
//! ## Authentication
//!
//! Entered on any connection while idle, bounded by the auth timer.
//!
//! 1. Peer subscribes to nonce indications, device indicates a fresh nonce
//! 2. Once acknowledged the peer writes `HMAC-SHA-512-256(secret, nonce)`
//!    to unlock as two fragments
//! 3. Peer disconnects, the device verifies the tag against the claimed slot
//!    and opens the lock on success
//!
//! Failures return silently to idle with identical outputs.

use rand_core::{CryptoRngCore, OsRng};
use strum::{Display, EnumIter, EnumString, EnumVariantNames};
use zeroize::Zeroize;

use key20_proto::{Fragment, Nonce, Part, KEY_LEN, NONCE_LEN};

use crate::{
    crypto::{checksum, hmac, KeyExchange, SharedSecret, X25519},
    inbox::Received,
    store::KeySlots,
};

mod event;
pub use event::Event;

mod output;
pub use output::{Message, Output, Outputs, Timer};

mod error;
pub use error::Error;

/// Engine internal state enumeration
#[derive(
    Copy, Clone, PartialEq, Eq, Debug, EnumString, Display, EnumVariantNames, EnumIter,
)]
pub enum State {
    /// Advertising, awaiting a connection or key exchange request
    Idle,

    /// Key exchange requested, awaiting peer connection
    CfgWaitConnection,
    /// Awaiting config-out subscription
    CfgWaitSubscription,
    /// Awaiting first public key fragment
    CfgWaitKeyPart1,
    /// Awaiting second public key fragment
    CfgWaitKeyPart2,
    /// First device key fragment indicated, awaiting ack
    CfgWaitServerKeyPart1Sent,
    /// Second device key fragment indicated, awaiting ack
    CfgWaitServerKeyPart2Sent,
    /// Key exchange complete, awaiting peer disconnect
    CfgWaitDisconnect,
    /// Awaiting operator confirmation
    CfgWaitDecision,
    /// Key persisting
    CfgWaitKeyStore,

    /// Awaiting nonce subscription
    AuthWaitSubscription,
    /// Nonce indicated, awaiting ack
    AuthWaitNonceAck,
    /// Awaiting first tag fragment
    AuthWaitMacPart1,
    /// Awaiting second tag fragment
    AuthWaitMacPart2,
    /// Tag received, awaiting peer disconnect
    AuthWaitDisconnect,
    /// Lock open
    AuthWaitLockActionTimeout,

    /// Session aborted, awaiting disconnect
    AbortedWaitDisconnect,
}

impl State {
    /// Key exchange states in which a red press aborts with disconnect
    const fn is_cfg_connected(&self) -> bool {
        matches!(
            self,
            State::CfgWaitSubscription
                | State::CfgWaitKeyPart1
                | State::CfgWaitKeyPart2
                | State::CfgWaitServerKeyPart1Sent
                | State::CfgWaitServerKeyPart2Sent
                | State::CfgWaitDisconnect
        )
    }

    /// Authentication states bounded by the auth timer
    const fn is_auth(&self) -> bool {
        matches!(
            self,
            State::AuthWaitSubscription
                | State::AuthWaitNonceAck
                | State::AuthWaitMacPart1
                | State::AuthWaitMacPart2
                | State::AuthWaitDisconnect
        )
    }
}

/// Volatile per-exchange state, wiped when each session ends
#[derive(Clone, Default, Zeroize)]
struct Session {
    slot: u8,
    peer_public: [u8; KEY_LEN],
    local_public: [u8; KEY_LEN],
    shared: [u8; KEY_LEN],
    nonce: [u8; NONCE_LEN],
    tag: [u8; KEY_LEN],
}

/// [Engine] provides the hardware-independent Key20 protocol state machine
pub struct Engine<KEX: KeyExchange = X25519, RNG: CryptoRngCore = OsRng> {
    state: State,
    session: Session,
    slots: KeySlots,
    kex: KEX,
    rng: RNG,
}

impl Engine {
    /// Create a new engine instance with the default key exchange and [OsRng]
    pub fn new(slots: KeySlots) -> Self {
        Self::new_with(slots, X25519, OsRng {})
    }
}

impl<KEX: KeyExchange, RNG: CryptoRngCore> Engine<KEX, RNG> {
    /// Create a new engine instance with the provided key exchange and rng
    pub fn new_with(slots: KeySlots, kex: KEX, rng: RNG) -> Self {
        Self {
            state: State::Idle,
            session: Session::default(),
            slots,
            kex,
            rng,
        }
    }

    /// Fetch the current engine state
    pub fn state(&self) -> State {
        self.state
    }

    /// Access key slots
    pub fn slots(&self) -> &KeySlots {
        &self.slots
    }

    /// Mutable access to key slots, used to load persisted keys on boot
    pub fn slots_mut(&mut self) -> &mut KeySlots {
        &mut self.slots
    }

    /// Handle an incoming event with the receive buffer snapshot taken
    /// when the event was dequeued
    ///
    /// Events not handled in the current state are ignored. Errors are fatal.
    pub fn update(&mut self, evt: Event, rx: &Received) -> Result<Outputs, Error> {
        #[cfg(feature = "log")]
        log::debug!("event: {} (state: {})", evt, self.state);

        let mut out = Outputs::new();

        let next = match (self.state, evt) {
            // Persistence failures are always fatal
            (_, Event::StoreFailed) => return Err(Error::Flash),

            // Idle, start key exchange or authentication
            (State::Idle, Event::RedPressed) => {
                push(&mut out, Output::Display(Message::WaitingForKey))?;
                State::CfgWaitConnection
            }
            (State::Idle, Event::Connected) => {
                self.session.zeroize();
                push(&mut out, Output::Display(Message::Authenticating))?;
                push(&mut out, Output::StartTimer(Timer::Auth))?;
                State::AuthWaitSubscription
            }

            // Key exchange cancelled prior to connection, still advertising
            (State::CfgWaitConnection, Event::RedPressed) => {
                push(&mut out, Output::Display(Message::Ready))?;
                State::Idle
            }
            (State::CfgWaitConnection, Event::Connected) => {
                self.session.zeroize();
                State::CfgWaitSubscription
            }

            // Key exchange aborted via button while connected
            (s, Event::RedPressed) if s.is_cfg_connected() => {
                push(&mut out, Output::Disconnect)?;
                State::AbortedWaitDisconnect
            }

            // Waiting for disconnect is the expected path once keys are exchanged
            (State::CfgWaitDisconnect, Event::Disconnected) => State::CfgWaitDecision,

            // Key exchange aborted by peer disconnection
            (s, Event::Disconnected) if s.is_cfg_connected() => self.idle(&mut out)?,

            (State::CfgWaitSubscription, Event::SubscribedKexOut) => State::CfgWaitKeyPart1,

            // First public key fragment establishes the slot
            (State::CfgWaitKeyPart1, Event::KeyPartReceived) => match rx.kex.slot() {
                Some(_) => State::CfgWaitKeyPart2,
                None => State::CfgWaitKeyPart1,
            },

            // Both fragments required prior to exchange
            (State::CfgWaitKeyPart2, Event::KeyPartReceived) => match rx.kex.value() {
                Some(mut peer_public) => {
                    let slot = rx.kex.slot().ok_or(Error::InvalidState)?;
                    let r = self.exchange(slot, &peer_public, &mut out);
                    peer_public.zeroize();
                    r?
                }
                None => State::CfgWaitKeyPart2,
            },

            (State::CfgWaitServerKeyPart1Sent, Event::KexOutAcked) => {
                push(&mut out, Output::IndicateFragment(self.local_fragment(Part::Second)))?;
                State::CfgWaitServerKeyPart2Sent
            }
            (State::CfgWaitServerKeyPart2Sent, Event::KexOutAcked) => State::CfgWaitDisconnect,

            // Operator decision
            (State::CfgWaitDecision, Event::RedPressed) => self.idle(&mut out)?,
            (State::CfgWaitDecision, Event::GreenPressed) => {
                let slot = self.session.slot;
                let secret = SharedSecret::from(self.session.shared);
                self.slots.set(slot, &secret);

                #[cfg(feature = "log")]
                log::info!("installing key for slot {}", slot);

                push(&mut out, Output::Display(Message::StoringKey))?;
                push(&mut out, Output::PersistSlot(slot))?;
                State::CfgWaitKeyStore
            }
            (State::CfgWaitKeyStore, Event::StoreReady) => self.idle(&mut out)?,

            // Authentication timeout, force disconnect
            (s, Event::AuthTimeout) if s.is_auth() => {
                push(&mut out, Output::Disconnect)?;
                State::AbortedWaitDisconnect
            }

            // Verify on disconnect once the tag is complete
            (State::AuthWaitDisconnect, Event::Disconnected) => {
                push(&mut out, Output::StopTimer(Timer::Auth))?;

                match self.authenticate() {
                    true => {
                        push(&mut out, Output::Display(Message::Opening))?;
                        push(&mut out, Output::SetLock(true))?;
                        push(&mut out, Output::StartTimer(Timer::LockAction))?;
                        self.session.zeroize();
                        State::AuthWaitLockActionTimeout
                    }
                    false => self.idle(&mut out)?,
                }
            }

            // Authentication aborted by peer disconnection
            (s, Event::Disconnected) if s.is_auth() => {
                push(&mut out, Output::StopTimer(Timer::Auth))?;
                self.idle(&mut out)?
            }

            (State::AuthWaitSubscription, Event::SubscribedNonce) => {
                self.rng
                    .try_fill_bytes(&mut self.session.nonce)
                    .map_err(|_e| {
                        #[cfg(feature = "log")]
                        log::error!("rng failure generating nonce: {:?}", _e);
                        Error::Rng
                    })?;

                push(&mut out, Output::IndicateNonce(Nonce::new(self.session.nonce)))?;
                State::AuthWaitNonceAck
            }
            (State::AuthWaitNonceAck, Event::NonceAcked) => State::AuthWaitMacPart1,

            (State::AuthWaitMacPart1, Event::TagPartReceived) => match rx.tag.slot() {
                Some(_) => State::AuthWaitMacPart2,
                None => State::AuthWaitMacPart1,
            },
            (State::AuthWaitMacPart2, Event::TagPartReceived) => match rx.tag.value() {
                Some(tag) => {
                    self.session.slot = rx.tag.slot().ok_or(Error::InvalidState)?;
                    self.session.tag = tag;
                    State::AuthWaitDisconnect
                }
                None => State::AuthWaitMacPart2,
            },

            // Lock action runs to completion
            (State::AuthWaitLockActionTimeout, Event::LockActionTimeout) => {
                push(&mut out, Output::SetLock(false))?;
                self.idle(&mut out)?
            }

            (State::AbortedWaitDisconnect, Event::Disconnected) => self.idle(&mut out)?,

            // Ignore anything else
            (s, _) => s,
        };

        #[cfg(feature = "log")]
        {
            if next != self.state {
                log::debug!("state: {} -> {}", self.state, next);
            }
        }

        self.state = next;

        Ok(out)
    }

    /// Generate local keys and derive the shared secret for a key exchange,
    /// returning the next state
    fn exchange(
        &mut self,
        slot: u8,
        peer_public: &[u8; KEY_LEN],
        out: &mut Outputs,
    ) -> Result<State, Error> {
        push(out, Output::Display(Message::Calculating))?;

        let kp = self.kex.generate_keypair(&mut self.rng)?;
        let shared = self.kex.shared_secret(&kp.secret, peer_public);

        self.session.slot = slot;
        self.session.peer_public = *peer_public;
        self.session.local_public = kp.public;
        self.session.shared = *shared.as_bytes();

        push(out, Output::Display(Message::Checksum(checksum(shared.as_bytes()))))?;
        push(out, Output::IndicateFragment(self.local_fragment(Part::First)))?;

        Ok(State::CfgWaitServerKeyPart1Sent)
    }

    /// Build a config-out fragment for the local public key
    fn local_fragment(&self, part: Part) -> Fragment {
        let [a, b] = Fragment::split(self.session.slot, &self.session.local_public);
        match part {
            Part::First => a,
            Part::Second => b,
        }
    }

    /// Check the received tag against the nonce and claimed slot
    ///
    /// The MAC is always computed so slot validity is not observable.
    fn authenticate(&self) -> bool {
        let slot = self.session.slot;
        let valid = self.slots.is_valid(slot);

        let zero = [0u8; KEY_LEN];
        let key = self.slots.get(slot).unwrap_or(&zero);

        let ok = hmac::verify(&self.session.tag, &self.session.nonce, key);

        #[cfg(feature = "log")]
        log::debug!("authentication for slot {} complete", slot);

        valid & ok
    }

    /// Return to idle, wiping session state
    fn idle(&mut self, out: &mut Outputs) -> Result<State, Error> {
        self.session.zeroize();
        push(out, Output::Advertise)?;
        push(out, Output::Display(Message::Ready))?;
        Ok(State::Idle)
    }
}

fn push(out: &mut Outputs, o: Output) -> Result<(), Error> {
    out.push(o).map_err(|_| Error::InvalidState)
}

// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Top-level application context
//!
//! [App] owns the [Engine], [KeyStore] and [Platform], draining events from
//! the interrupt-shared [Inbox] and applying engine [Output]s to the
//! platform. [App::run] is the single restart boundary, any [Error] is
//! displayed then resets the device.

use core::convert::Infallible;

use rand_core::{CryptoRngCore, OsRng};
use zeroize::Zeroize;

use key20_proto::Characteristic;

use crate::{
    consts::Config,
    crypto::{KeyExchange, X25519},
    engine::{Engine, Error, Message, Output, Timer},
    helpers::fmt_checksum,
    inbox::Inbox,
    platform::Platform,
    store::{Flash, KeySlots, KeyStore},
};

/// Key20 application
pub struct App<'a, P: Platform, F: Flash, KEX: KeyExchange = X25519, RNG: CryptoRngCore = OsRng> {
    engine: Engine<KEX, RNG>,
    store: KeyStore<'a, F>,
    platform: P,
    inbox: &'a Inbox,
    config: Config,
}

impl<'a, P: Platform, F: Flash> App<'a, P, F> {
    /// Create a new application using the default key exchange and [OsRng]
    pub fn new(platform: P, flash: F, inbox: &'a Inbox, config: Config) -> Self {
        Self::new_with(platform, flash, inbox, config, X25519, OsRng {})
    }
}

impl<'a, P: Platform, F: Flash, KEX: KeyExchange, RNG: CryptoRngCore> App<'a, P, F, KEX, RNG> {
    /// Create a new application with the provided key exchange and rng
    pub fn new_with(
        platform: P,
        flash: F,
        inbox: &'a Inbox,
        config: Config,
        kex: KEX,
        rng: RNG,
    ) -> Self {
        Self {
            engine: Engine::new_with(KeySlots::new(), kex, rng),
            store: KeyStore::new(flash, inbox.completion(), config.flash_wait_spins),
            platform,
            inbox,
            config,
        }
    }

    pub fn engine(&self) -> &Engine<KEX, RNG> {
        &self.engine
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn flash(&mut self) -> &mut F {
        self.store.flash()
    }

    /// Load (or initialise) key storage and start advertising
    pub fn boot(&mut self) -> Result<(), Error> {
        self.platform.display_power(true);
        self.show(Message::Booting);

        let _valid = self.store.open(self.engine.slots_mut())?;

        #[cfg(feature = "log")]
        log::info!("boot complete, valid slots: {:?}", _valid);

        self.show(Message::Ready);
        self.platform.start_advertising()?;

        self.inbox.start();

        Ok(())
    }

    /// Drain and handle all pending events, returning the number handled
    pub fn poll(&mut self) -> Result<usize, Error> {
        let mut n = 0;

        while let Some((evt, mut rx)) = self.inbox.pop() {
            let r = self.engine.update(evt, &rx);
            rx.zeroize();

            for o in r? {
                self.apply(o)?;
            }

            n += 1;
        }

        Ok(n)
    }

    /// Boot and run the event loop, resetting on any error
    pub fn run(&mut self) -> ! {
        let e = match self.serve() {
            Ok(v) => match v {},
            Err(e) => e,
        };

        self.fatal(e)
    }

    fn serve(&mut self) -> Result<Infallible, Error> {
        self.boot()?;

        loop {
            self.poll()?;
            self.platform.wait_for_event();
        }
    }

    /// Display a fatal error and reset
    pub fn fatal(&mut self, e: Error) -> ! {
        #[cfg(feature = "log")]
        log::error!("fatal error: {:?} (state: {})", e, self.engine.state());

        #[cfg(not(feature = "log"))]
        let _ = e;

        self.show(Message::Error);
        self.platform.reset()
    }

    /// Apply an engine output to the platform
    fn apply(&mut self, o: Output) -> Result<(), Error> {
        #[cfg(feature = "log")]
        log::trace!("output: {:?}", o);

        match o {
            Output::Advertise => self.platform.start_advertising()?,
            Output::Disconnect => self.platform.disconnect()?,
            Output::IndicateNonce(n) => self.platform.indicate(Characteristic::Nonce, n.as_ref())?,
            Output::IndicateFragment(f) => {
                self.platform.indicate(Characteristic::CfgOut, &f.to_bytes())?
            }
            Output::StartTimer(t) => {
                let ms = match t {
                    Timer::Auth => self.config.auth_timeout_ms,
                    Timer::LockAction => self.config.lock_action_ms,
                };
                self.platform.start(t, ms)?
            }
            Output::StopTimer(t) => self.platform.stop(t)?,
            Output::SetLock(open) => self.platform.set_lock(open),
            Output::Display(m) => self.show(m),
            Output::PersistSlot(slot) => self.store.store(slot, self.engine.slots())?,
        }

        Ok(())
    }

    fn show(&mut self, m: Message) {
        let (l1, l2) = m.lines();

        match m {
            Message::Checksum(c) => self.platform.display(l1, &fmt_checksum(&c)),
            _ => self.platform.display(l1, l2),
        }
    }
}

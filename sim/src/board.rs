// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Simulated board with a single peer link and virtual time

use std::collections::VecDeque;

use log::{debug, info, warn};

use key20_core::{
    engine::{Error, Timer},
    inbox::Inbox,
    platform::{Platform, Timers, Transport, Ui},
};
use key20_proto::Characteristic;

pub struct SimBoard {
    inbox: &'static Inbox,

    pub(crate) connected: bool,
    pub(crate) advertising: bool,
    pub(crate) subscribed: Vec<Characteristic>,
    pub(crate) indications: VecDeque<(Characteristic, Vec<u8>)>,

    pub(crate) display: (String, String),
    pub(crate) lock: bool,

    pub(crate) now: u64,
    timers: [Option<u64>; 2],
}

impl SimBoard {
    pub fn new(inbox: &'static Inbox) -> Self {
        Self {
            inbox,
            connected: false,
            advertising: false,
            subscribed: vec![],
            indications: VecDeque::new(),
            display: (String::new(), String::new()),
            lock: false,
            now: 0,
            timers: [None; 2],
        }
    }

    /// Virtual time in milliseconds
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Disarm and return the earliest timer expiring at or before `until`
    pub(crate) fn expire(&mut self, until: u64) -> Option<Timer> {
        let (t, at) = [Timer::Auth, Timer::LockAction]
            .into_iter()
            .filter_map(|t| self.timers[index(t)].map(|at| (t, at)))
            .filter(|(_, at)| *at <= until)
            .min_by_key(|(_, at)| *at)?;

        self.now = at;
        self.timers[index(t)] = None;

        Some(t)
    }

    pub(crate) fn link_down(&mut self) {
        self.connected = false;
        self.subscribed.clear();
        self.indications.clear();
    }
}

fn index(t: Timer) -> usize {
    match t {
        Timer::Auth => 0,
        Timer::LockAction => 1,
    }
}

impl Transport for SimBoard {
    fn start_advertising(&mut self) -> Result<(), Error> {
        if self.connected {
            warn!("advertise requested while connected");
            return Err(Error::Transport);
        }

        debug!("advertising as {}", key20_proto::DEVICE_NAME);
        self.advertising = true;

        Ok(())
    }

    fn indicate(&mut self, ch: Characteristic, data: &[u8]) -> Result<(), Error> {
        if !self.connected || !self.subscribed.contains(&ch) {
            warn!("indication on {} without subscription", ch);
            return Err(Error::Transport);
        }

        debug!("indicate {}: {}", ch, hex::encode(data));
        self.indications.push_back((ch, data.to_vec()));

        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), Error> {
        if self.connected {
            debug!("disconnecting peer");
            self.link_down();
            self.inbox.on_disconnected();
        }
        Ok(())
    }
}

impl Timers for SimBoard {
    fn start(&mut self, timer: Timer, ms: u32) -> Result<(), Error> {
        debug!("start {:?} timer ({} ms)", timer, ms);
        self.timers[index(timer)] = Some(self.now + ms as u64);
        Ok(())
    }

    fn stop(&mut self, timer: Timer) -> Result<(), Error> {
        self.timers[index(timer)] = None;
        Ok(())
    }
}

impl Ui for SimBoard {
    fn set_lock(&mut self, open: bool) {
        info!("[{:>6} ms] lock {}", self.now, if open { "OPEN" } else { "closed" });
        self.lock = open;
    }

    fn display(&mut self, line1: &str, line2: &str) {
        info!("[{:>6} ms] display: {:<16} | {:<16}", self.now, line1, line2);
        self.display = (line1.to_string(), line2.to_string());
    }

    fn display_power(&mut self, on: bool) {
        debug!("display power: {}", on);
    }
}

impl Platform for SimBoard {
    fn wait_for_event(&mut self) {}

    fn reset(&mut self) -> ! {
        log::error!("device reset");
        std::process::exit(1)
    }
}

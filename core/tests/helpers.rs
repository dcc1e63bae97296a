#![allow(unused)]

use std::collections::VecDeque;

use anyhow::anyhow;
use log::{debug, trace};

use key20_core::{
    app::App,
    consts::{Config, STORE_LEN},
    engine::{Error, Timer},
    inbox::Inbox,
    platform::{Platform, Timers, Transport, Ui},
    store::{Flash, FlashOp},
};
use key20_proto::{Button, Characteristic, Subscription};
use key20_tests::{Device, Timeouts};

/// Test configuration, timeouts match the device defaults
pub fn test_config() -> Config {
    Config {
        flash_wait_spins: 16,
        ..Default::default()
    }
}

/// In-memory flash image, completing each operation synchronously
pub struct MemFlash {
    pub image: Vec<u8>,
    pub ops: Vec<FlashOp>,
    pub fail: bool,
    inbox: &'static Inbox,
}

impl MemFlash {
    pub fn new(inbox: &'static Inbox, image: Option<Vec<u8>>) -> Self {
        Self {
            image: image.unwrap_or_else(|| vec![0xff; STORE_LEN]),
            ops: vec![],
            fail: false,
            inbox,
        }
    }

    fn complete(&mut self, op: FlashOp) {
        self.ops.push(op);
        self.inbox.on_flash_complete(op, !self.fail);
    }
}

impl Flash for MemFlash {
    type Error = anyhow::Error;

    fn load(&mut self, offset: usize, buff: &mut [u8]) -> Result<(), Self::Error> {
        let d = self
            .image
            .get(offset..offset + buff.len())
            .ok_or_else(|| anyhow!("load out of bounds"))?;
        buff.copy_from_slice(d);
        Ok(())
    }

    fn store(&mut self, offset: usize, data: &[u8]) -> Result<(), Self::Error> {
        self.image[offset..][..data.len()].copy_from_slice(data);
        self.complete(FlashOp::Store);
        Ok(())
    }

    fn update(&mut self, offset: usize, data: &[u8]) -> Result<(), Self::Error> {
        self.image[offset..][..data.len()].copy_from_slice(data);
        self.complete(FlashOp::Update);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.image.fill(0xff);
        self.complete(FlashOp::Clear);
        Ok(())
    }
}

/// Simulated board, a single peer link with virtual time
pub struct TestBoard {
    inbox: &'static Inbox,

    pub connected: bool,
    pub advertising: bool,
    pub subscribed: Vec<Characteristic>,
    pub indications: VecDeque<(Characteristic, Vec<u8>)>,

    pub display: (String, String),
    pub display_on: bool,
    pub lock: bool,

    pub now: u64,
    pub timers: [Option<u64>; 2],
}

impl TestBoard {
    pub fn new(inbox: &'static Inbox) -> Self {
        Self {
            inbox,
            connected: false,
            advertising: false,
            subscribed: vec![],
            indications: VecDeque::new(),
            display: (String::new(), String::new()),
            display_on: false,
            lock: false,
            now: 0,
            timers: [None; 2],
        }
    }

    fn timer_index(t: Timer) -> usize {
        match t {
            Timer::Auth => 0,
            Timer::LockAction => 1,
        }
    }

    /// Fetch the next timer expiry at or before `until`
    fn next_expiry(&self, until: u64) -> Option<(Timer, u64)> {
        [Timer::Auth, Timer::LockAction]
            .into_iter()
            .filter_map(|t| self.timers[Self::timer_index(t)].map(|d| (t, d)))
            .filter(|(_, d)| *d <= until)
            .min_by_key(|(_, d)| *d)
    }

    fn link_down(&mut self) {
        self.connected = false;
        self.subscribed.clear();
        self.indications.clear();
    }
}

impl Transport for TestBoard {
    fn start_advertising(&mut self) -> Result<(), Error> {
        if self.connected {
            return Err(Error::Transport);
        }
        self.advertising = true;
        Ok(())
    }

    fn indicate(&mut self, ch: Characteristic, data: &[u8]) -> Result<(), Error> {
        if !self.connected || !self.subscribed.contains(&ch) {
            return Err(Error::Transport);
        }
        self.indications.push_back((ch, data.to_vec()));
        Ok(())
    }

    /// Forced disconnect, idempotent where the peer already dropped
    fn disconnect(&mut self) -> Result<(), Error> {
        if self.connected {
            self.link_down();
            self.inbox.on_disconnected();
        }
        Ok(())
    }
}

impl Timers for TestBoard {
    fn start(&mut self, timer: Timer, ms: u32) -> Result<(), Error> {
        self.timers[Self::timer_index(timer)] = Some(self.now + ms as u64);
        Ok(())
    }

    fn stop(&mut self, timer: Timer) -> Result<(), Error> {
        self.timers[Self::timer_index(timer)] = None;
        Ok(())
    }
}

impl Ui for TestBoard {
    fn set_lock(&mut self, open: bool) {
        debug!("lock: {}", if open { "open" } else { "closed" });
        self.lock = open;
    }

    fn display(&mut self, line1: &str, line2: &str) {
        trace!("display: '{line1}' / '{line2}'");
        self.display = (line1.to_string(), line2.to_string());
    }

    fn display_power(&mut self, on: bool) {
        self.display_on = on;
    }
}

impl Platform for TestBoard {
    fn wait_for_event(&mut self) {}

    fn reset(&mut self) -> ! {
        panic!("device reset");
    }
}

/// Booted application with in-memory platform
pub struct TestDevice {
    pub app: App<'static, TestBoard, MemFlash>,
    pub inbox: &'static Inbox,
    config: Config,
}

impl TestDevice {
    /// Create and boot a device, using a blank image where none is provided
    pub fn new(image: Option<Vec<u8>>) -> anyhow::Result<Self> {
        let mut d = Self::unbooted(image);
        d.app.boot()?;
        Ok(d)
    }

    /// Create a device without booting
    pub fn unbooted(image: Option<Vec<u8>>) -> Self {
        let inbox: &'static Inbox = Box::leak(Box::new(Inbox::new()));
        let config = test_config();

        let app = App::new(
            TestBoard::new(inbox),
            MemFlash::new(inbox, image),
            inbox,
            config,
        );

        Self { app, inbox, config }
    }

    pub fn board(&self) -> &TestBoard {
        self.app.platform()
    }

    /// Fetch a copy of the flash image
    pub fn image(&mut self) -> Vec<u8> {
        self.app.flash().image.clone()
    }

    fn poll(&mut self) -> anyhow::Result<()> {
        self.app.poll()?;
        Ok(())
    }
}

impl Device for TestDevice {
    fn connect(&mut self) -> anyhow::Result<()> {
        let b = self.app.platform_mut();
        anyhow::ensure!(!b.connected, "already connected");
        anyhow::ensure!(b.advertising, "device not advertising");

        b.connected = true;
        b.advertising = false;

        self.inbox.on_connected();
        self.poll()
    }

    fn disconnect(&mut self) -> anyhow::Result<()> {
        let b = self.app.platform_mut();
        anyhow::ensure!(b.connected, "not connected");

        b.link_down();

        self.inbox.on_disconnected();
        self.poll()
    }

    fn is_connected(&self) -> bool {
        self.board().connected
    }

    fn subscribe(&mut self, ch: Characteristic) -> anyhow::Result<()> {
        self.app.platform_mut().subscribed.push(ch);

        self.inbox
            .on_cccd_write(ch, &Subscription::Indicate.to_bytes());
        self.poll()
    }

    fn write(&mut self, ch: Characteristic, data: &[u8]) -> anyhow::Result<()> {
        anyhow::ensure!(self.board().connected, "not connected");

        self.inbox.on_write(ch, data);
        self.poll()
    }

    fn next_indication(&mut self) -> anyhow::Result<Option<(Characteristic, Vec<u8>)>> {
        Ok(self.app.platform_mut().indications.pop_front())
    }

    fn ack_indication(&mut self, ch: Characteristic) -> anyhow::Result<()> {
        self.inbox.on_indication_ack(ch);
        self.poll()
    }

    fn press(&mut self, b: Button) -> anyhow::Result<()> {
        self.inbox.on_button(b);
        self.poll()
    }

    fn display(&self) -> (String, String) {
        self.board().display.clone()
    }

    fn lock_open(&self) -> bool {
        self.board().lock
    }

    fn advance(&mut self, ms: u32) -> anyhow::Result<()> {
        let until = self.board().now + ms as u64;

        while let Some((t, at)) = self.board().next_expiry(until) {
            let b = self.app.platform_mut();
            b.now = at;
            b.timers[TestBoard::timer_index(t)] = None;

            self.inbox.on_timer(t);
            self.poll()?;
        }

        self.app.platform_mut().now = until;

        Ok(())
    }

    fn timeouts(&self) -> Timeouts {
        Timeouts {
            auth_ms: self.config.auth_timeout_ms,
            lock_ms: self.config.lock_action_ms,
        }
    }
}

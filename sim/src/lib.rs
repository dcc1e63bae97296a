// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Host simulator for Key20 lock controllers
//!
//! This runs the [App] against a [SimBoard] with virtual time and a
//! [FileFlash] image, exposing the peer side via [Device] so the
//! [key20_tests] flows may be executed from the command line.

use std::path::Path;

use anyhow::anyhow;

use key20_core::{app::App, consts::Config, inbox::Inbox};
use key20_proto::{Button, Characteristic, Subscription};
use key20_tests::{Device, Timeouts};

mod board;
pub use board::SimBoard;

mod flash;
pub use flash::FileFlash;

/// Simulated Key20 device
pub struct Sim {
    app: App<'static, SimBoard, FileFlash>,
    inbox: &'static Inbox,
    config: Config,
}

impl Sim {
    /// Create and boot a simulated device using the provided flash image
    pub fn new(flash: impl AsRef<Path>, config: Config) -> anyhow::Result<Self> {
        let inbox: &'static Inbox = Box::leak(Box::new(Inbox::new()));

        let flash = FileFlash::open(flash.as_ref(), inbox)?;

        let mut app = App::new(SimBoard::new(inbox), flash, inbox, config);
        app.boot()?;

        Ok(Self { app, inbox, config })
    }

    pub fn board(&self) -> &SimBoard {
        self.app.platform()
    }

    /// Valid key slots
    pub fn slots(&self) -> Vec<u8> {
        let s = self.app.engine().slots();
        (0..key20_core::consts::KEY_COUNT as u8)
            .filter(|i| s.is_valid(*i))
            .collect()
    }

    fn poll(&mut self) -> anyhow::Result<()> {
        self.app.poll()?;
        Ok(())
    }
}

impl Device for Sim {
    fn connect(&mut self) -> anyhow::Result<()> {
        let b = self.app.platform_mut();
        if b.connected {
            return Err(anyhow!("already connected"));
        }
        if !b.advertising {
            return Err(anyhow!("device not advertising"));
        }

        b.connected = true;
        b.advertising = false;

        self.inbox.on_connected();
        self.poll()
    }

    fn disconnect(&mut self) -> anyhow::Result<()> {
        let b = self.app.platform_mut();
        if !b.connected {
            return Err(anyhow!("not connected"));
        }

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
        if !self.board().connected {
            return Err(anyhow!("not connected"));
        }

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
        log::info!("[{:>6} ms] press {:?}", self.board().now(), b);

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
        let until = self.board().now() + ms as u64;

        while let Some(t) = self.app.platform_mut().expire(until) {
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

#[cfg(test)]
mod tests {
    use key20_tests::scenario;

    use super::*;

    #[test]
    fn sim_scenario() {
        let path = std::env::temp_dir().join(format!("key20-sim-{}.bin", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let mut s = Sim::new(&path, Config::default()).unwrap();
        scenario::test(&mut s).unwrap();
        assert_eq!(s.slots(), vec![scenario::SLOT]);

        // Reload from the persisted image
        let s = Sim::new(&path, Config::default()).unwrap();
        assert_eq!(s.slots(), vec![scenario::SLOT]);

        let _ = std::fs::remove_file(&path);
    }
}

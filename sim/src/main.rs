// Copyright (c) 2022-2023 The MobileCoin Foundation

use std::path::PathBuf;

use clap::Parser;
use log::{debug, info, LevelFilter};
use strum::Display;

use key20_core::consts::{Config, AUTH_TIMEOUT_MS, LOCK_ACTION_MS};
use key20_proto::KEY_LEN;
use key20_tests::{key_exchange, scenario, unlock};

use key20_sim::Sim;

/// Key20 lock simulator
///
/// This runs the lock core against a simulated board with virtual time,
/// acting as the peer to exercise key exchange and unlock flows. Keys are
/// persisted to the flash image file between runs.
#[derive(Clone, Debug, Parser)]
pub struct Args {
    #[clap(subcommand)]
    cmd: Command,

    /// Flash image file
    #[clap(long, default_value = "key20.bin", env = "KEY20_FLASH")]
    flash: PathBuf,

    /// Authentication timeout (ms)
    #[clap(long, default_value_t = AUTH_TIMEOUT_MS)]
    auth_timeout_ms: u32,

    /// Lock action duration (ms)
    #[clap(long, default_value_t = LOCK_ACTION_MS)]
    lock_action_ms: u32,

    /// Log level
    #[clap(long, default_value = "info", env)]
    log_level: LevelFilter,
}

/// Simulator commands
#[derive(Clone, PartialEq, Debug, Parser, Display)]
pub enum Command {
    /// Exchange a key for the provided slot, confirming at the device
    Enrol {
        #[clap(long, default_value = "0")]
        slot: u8,

        /// Reject the key at the operator decision
        #[clap(long)]
        reject: bool,
    },
    /// Authenticate against a slot with a shared secret
    Unlock {
        #[clap(long, default_value = "0")]
        slot: u8,

        /// Hex encoded shared secret
        #[clap(long, value_parser = secret_from_str)]
        secret: [u8; KEY_LEN],

        /// Expect the request to be rejected
        #[clap(long)]
        expect_reject: bool,
    },
    /// Connect without authenticating, checking the device times out
    Timeout,
    /// Enrol then unlock, checking rejections
    Scenario,
    /// Show valid key slots
    Status,
}

fn secret_from_str(s: &str) -> anyhow::Result<[u8; KEY_LEN]> {
    let mut b = [0u8; KEY_LEN];
    hex::decode_to_slice(s, &mut b)?;
    Ok(b)
}

fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging
    let _ = simplelog::SimpleLogger::init(args.log_level, Default::default());

    debug!("args: {:?}", args);

    let config = Config {
        auth_timeout_ms: args.auth_timeout_ms,
        lock_action_ms: args.lock_action_ms,
        ..Default::default()
    };

    info!("Booting simulator (flash: {})", args.flash.display());

    let mut s = Sim::new(&args.flash, config)?;

    info!("Running '{}'", args.cmd);

    match args.cmd {
        Command::Enrol {
            slot,
            reject: false,
        } => {
            let secret = key_exchange::test(&mut s, slot)?;
            println!("{}", hex::encode(secret));
        }
        Command::Enrol { slot, reject: true } => key_exchange::reject(&mut s, slot)?,
        Command::Unlock {
            slot,
            secret,
            expect_reject,
        } => unlock::test(&mut s, slot, &secret, !expect_reject)?,
        Command::Timeout => unlock::timeout(&mut s)?,
        Command::Scenario => scenario::test(&mut s)?,
        Command::Status => (),
    }

    info!("Valid slots: {:?}", s.slots());

    Ok(())
}

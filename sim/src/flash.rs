// Copyright (c) 2022-2023 The MobileCoin Foundation

//! File-backed flash image

use std::{fs, path::PathBuf};

use anyhow::Context;
use log::{debug, trace};

use key20_core::{
    consts::STORE_LEN,
    inbox::Inbox,
    store::{Flash, FlashOp},
};

/// Flash emulation persisting the key store image to a file, so keys
/// enrolled in one simulator run remain available to the next
pub struct FileFlash {
    path: PathBuf,
    image: Vec<u8>,
    inbox: &'static Inbox,
}

impl FileFlash {
    /// Open an existing image or create an erased one
    pub fn open(path: impl Into<PathBuf>, inbox: &'static Inbox) -> anyhow::Result<Self> {
        let path = path.into();

        let mut image = match path.exists() {
            true => fs::read(&path).with_context(|| format!("reading {}", path.display()))?,
            false => vec![],
        };

        // Short or missing images read as erased
        if image.len() != STORE_LEN {
            debug!("flash image {} invalid, erasing", path.display());
            image = vec![0xff; STORE_LEN];
        }

        Ok(Self { path, image, inbox })
    }

    pub fn image(&self) -> &[u8] {
        &self.image
    }

    fn write(&mut self, op: FlashOp, offset: usize, data: &[u8]) -> anyhow::Result<()> {
        trace!("flash {:?} at {} ({} bytes)", op, offset, data.len());

        let d = self
            .image
            .get_mut(offset..offset + data.len())
            .ok_or_else(|| anyhow::anyhow!("write out of bounds"))?;
        d.copy_from_slice(data);

        self.sync(op)
    }

    /// Write the image out then signal completion
    fn sync(&mut self, op: FlashOp) -> anyhow::Result<()> {
        let r = fs::write(&self.path, &self.image);

        self.inbox.on_flash_complete(op, r.is_ok());

        r.with_context(|| format!("writing {}", self.path.display()))
    }
}

impl Flash for FileFlash {
    type Error = anyhow::Error;

    fn load(&mut self, offset: usize, buff: &mut [u8]) -> Result<(), Self::Error> {
        let d = self
            .image
            .get(offset..offset + buff.len())
            .ok_or_else(|| anyhow::anyhow!("load out of bounds"))?;
        buff.copy_from_slice(d);
        Ok(())
    }

    fn store(&mut self, offset: usize, data: &[u8]) -> Result<(), Self::Error> {
        self.write(FlashOp::Store, offset, data)
    }

    fn update(&mut self, offset: usize, data: &[u8]) -> Result<(), Self::Error> {
        self.write(FlashOp::Update, offset, data)
    }

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.image.fill(0xff);
        self.sync(FlashOp::Clear)
    }
}

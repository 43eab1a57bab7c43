//! Linux `ec_sys` debugfs backend.
//!
//! Requires the `ec_sys` module loaded with `write_support=1`; the `io` file
//! exposes the 256 EC registers as byte offsets.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use ecfan_traits::EmbeddedController;

use crate::error::{HwError, Result};

pub const DEFAULT_EC_IO_PATH: &str = "/sys/kernel/debug/ec/ec0/io";

#[derive(Debug)]
pub struct DebugfsEc {
    path: PathBuf,
    file: File,
}

impl DebugfsEc {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        tracing::debug!(path = %path.display(), "opened ec debugfs io");
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_at(&mut self, register: u8) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.file.seek(SeekFrom::Start(u64::from(register)))?;
        self.file.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn write_at(&mut self, register: u8, value: u8) -> Result<()> {
        self.file.seek(SeekFrom::Start(u64::from(register)))?;
        self.file.write_all(&[value])?;
        self.file.flush().map_err(HwError::from)
    }
}

impl EmbeddedController for DebugfsEc {
    fn read_byte(&mut self, register: u8) -> std::result::Result<u8, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.read_at(register)?)
    }

    fn write_byte(
        &mut self,
        register: u8,
        value: u8,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.write_at(register, value)?)
    }
}

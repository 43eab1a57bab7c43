//! ACPI embedded controller protocol over the legacy I/O ports.
//!
//! The EC exposes a command/status port and a data port. A byte read is
//! `RD_EC` on the command port followed by the register on the data port and
//! a wait for the output buffer; a write is `WR_EC`, register, value, each
//! gated on the input buffer draining.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::time::Duration;

use ecfan_traits::EmbeddedController;

use crate::error::{HwError, Result};
use crate::util::wait_until_with_timeout;

pub const EC_DATA_PORT: u16 = 0x62;
pub const EC_COMMAND_PORT: u16 = 0x66;

pub const RD_EC: u8 = 0x80;
pub const WR_EC: u8 = 0x81;

/// Output buffer full: a byte is waiting in the data port.
pub const STATUS_OBF: u8 = 0x01;
/// Input buffer full: the EC has not consumed the last byte yet.
pub const STATUS_IBF: u8 = 0x02;

const MAX_ATTEMPTS: u32 = 3;

/// Raw byte I/O on x86 ports.
pub trait PortIo {
    fn inb(&mut self, port: u16) -> Result<u8>;
    fn outb(&mut self, port: u16, value: u8) -> Result<()>;
}

/// Port I/O through the `/dev/port` character device (root only).
#[derive(Debug)]
pub struct DevPort {
    file: File,
}

impl DevPort {
    pub const PATH: &'static str = "/dev/port";

    pub fn open() -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(Self::PATH)?;
        Ok(Self { file })
    }
}

impl PortIo for DevPort {
    fn inb(&mut self, port: u16) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.file.seek(SeekFrom::Start(u64::from(port)))?;
        self.file.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn outb(&mut self, port: u16, value: u8) -> Result<()> {
        self.file.seek(SeekFrom::Start(u64::from(port)))?;
        self.file.write_all(&[value])?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct PortIoEc<P> {
    ports: P,
    timeout: Duration,
    poll_interval: Duration,
}

impl<P: PortIo> PortIoEc<P> {
    pub fn new(ports: P, timeout: Duration) -> Self {
        Self {
            ports,
            timeout,
            poll_interval: Duration::from_micros(10),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn ports(&self) -> &P {
        &self.ports
    }

    fn wait_input_drained(&mut self) -> Result<()> {
        let ports = &mut self.ports;
        wait_until_with_timeout(
            || Ok(ports.inb(EC_COMMAND_PORT)? & STATUS_IBF == 0),
            self.timeout,
            self.poll_interval,
            "input buffer to drain",
        )
    }

    fn wait_output_full(&mut self) -> Result<()> {
        let ports = &mut self.ports;
        wait_until_with_timeout(
            || Ok(ports.inb(EC_COMMAND_PORT)? & STATUS_OBF != 0),
            self.timeout,
            self.poll_interval,
            "output buffer",
        )
    }

    fn try_read(&mut self, register: u8) -> Result<u8> {
        self.wait_input_drained()?;
        self.ports.outb(EC_COMMAND_PORT, RD_EC)?;
        self.wait_input_drained()?;
        self.ports.outb(EC_DATA_PORT, register)?;
        self.wait_output_full()?;
        self.ports.inb(EC_DATA_PORT)
    }

    fn try_write(&mut self, register: u8, value: u8) -> Result<()> {
        self.wait_input_drained()?;
        self.ports.outb(EC_COMMAND_PORT, WR_EC)?;
        self.wait_input_drained()?;
        self.ports.outb(EC_DATA_PORT, register)?;
        self.wait_input_drained()?;
        self.ports.outb(EC_DATA_PORT, value)?;
        self.wait_input_drained()
    }

    fn with_retries<T>(
        &mut self,
        op: &'static str,
        register: u8,
        mut f: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let mut attempts = 1;
        loop {
            match f(self) {
                Ok(v) => return Ok(v),
                Err(HwError::Timeout(what)) if attempts < MAX_ATTEMPTS => {
                    attempts += 1;
                    tracing::warn!(op, register, waiting_for = what, attempt = attempts, "ec timeout, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl<P: PortIo> EmbeddedController for PortIoEc<P> {
    fn read_byte(&mut self, register: u8) -> std::result::Result<u8, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.with_retries("read", register, |ec| ec.try_read(register))?)
    }

    fn write_byte(
        &mut self,
        register: u8,
        value: u8,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.with_retries("write", register, |ec| ec.try_write(register, value))?)
    }
}

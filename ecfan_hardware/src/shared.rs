//! Serialised access to one embedded controller from several fans.

use std::sync::{Arc, Mutex, MutexGuard};

use ecfan_traits::EmbeddedController;

use crate::error::HwError;

/// Cloneable handle to a single embedded controller.
///
/// Every register transaction holds the lock for its whole duration, and a
/// word transaction holds it across both of its byte accesses, so interleaved
/// fans never see a half-written word on an indexed-port EC.
#[derive(Debug)]
pub struct SharedEc<E> {
    inner: Arc<Mutex<E>>,
}

impl<E> Clone for SharedEc<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: EmbeddedController> SharedEc<E> {
    pub fn new(ec: E) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ec)),
        }
    }

    /// Lock the underlying controller for inspection or a multi-step
    /// transaction.
    pub fn lock(&self) -> Result<MutexGuard<'_, E>, HwError> {
        self.inner.lock().map_err(|_| HwError::LockPoisoned)
    }
}

impl<E: EmbeddedController> EmbeddedController for SharedEc<E> {
    fn read_byte(&mut self, register: u8) -> Result<u8, Box<dyn std::error::Error + Send + Sync>> {
        self.lock()?.read_byte(register)
    }

    fn write_byte(
        &mut self,
        register: u8,
        value: u8,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.lock()?.write_byte(register, value)
    }

    fn read_word(&mut self, register: u8) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        self.lock()?.read_word(register)
    }

    fn write_word(
        &mut self,
        register: u8,
        value: u16,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.lock()?.write_word(register, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimulatedEc;

    #[test]
    fn clones_share_the_same_registers() {
        let mut a = SharedEc::new(SimulatedEc::new());
        let mut b = a.clone();
        a.write_byte(0x40, 9).unwrap();
        assert_eq!(b.read_byte(0x40).unwrap(), 9);
        b.write_word(0x50, 0x1234).unwrap();
        assert_eq!(a.read_word(0x50).unwrap(), 0x1234);
        assert_eq!(a.lock().unwrap().writes().len(), 3);
    }
}

pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Register access to a notebook embedded controller.
///
/// Implementations are the only place that touches the physical bus and are
/// responsible for serialising transactions when the same controller is shared
/// between several fans.
pub trait EmbeddedController {
    fn read_byte(&mut self, register: u8) -> Result<u8, Box<dyn std::error::Error + Send + Sync>>;
    fn write_byte(
        &mut self,
        register: u8,
        value: u8,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Read a little-endian word stored in `register` (low byte) and
    /// `register + 1` (high byte).
    fn read_word(&mut self, register: u8) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        let high_reg = high_byte_register(register)?;
        let lo = self.read_byte(register)?;
        let hi = self.read_byte(high_reg)?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    /// Write a little-endian word to `register` (low byte) and `register + 1`.
    fn write_word(
        &mut self,
        register: u8,
        value: u16,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let high_reg = high_byte_register(register)?;
        let [lo, hi] = value.to_le_bytes();
        self.write_byte(register, lo)?;
        self.write_byte(high_reg, hi)
    }
}

fn high_byte_register(register: u8) -> Result<u8, Box<dyn std::error::Error + Send + Sync>> {
    register
        .checked_add(1)
        .ok_or_else(|| format!("word register 0x{register:02x} has no high byte").into())
}

impl<E: EmbeddedController + ?Sized> EmbeddedController for Box<E> {
    fn read_byte(&mut self, register: u8) -> Result<u8, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read_byte(register)
    }
    fn write_byte(
        &mut self,
        register: u8,
        value: u8,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).write_byte(register, value)
    }
    fn read_word(&mut self, register: u8) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read_word(register)
    }
    fn write_word(
        &mut self,
        register: u8,
        value: u16,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).write_word(register, value)
    }
}

/// Instantaneous CPU/GPU temperatures in degrees Celsius.
pub trait TemperatureSource {
    fn cpu_temperature(&mut self) -> Result<f32, Box<dyn std::error::Error + Send + Sync>>;
    fn gpu_temperature(&mut self) -> Result<f32, Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: TemperatureSource + ?Sized> TemperatureSource for Box<T> {
    fn cpu_temperature(&mut self) -> Result<f32, Box<dyn std::error::Error + Send + Sync>> {
        (**self).cpu_temperature()
    }
    fn gpu_temperature(&mut self) -> Result<f32, Box<dyn std::error::Error + Send + Sync>> {
        (**self).gpu_temperature()
    }
}

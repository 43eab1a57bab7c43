use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FanError {
    /// A percentage reached the raw encoder without passing through the
    /// automatic-mode resolution.
    #[error("fan speed percentage {0} outside [0, 100]")]
    PercentOutOfRange(f32),
    #[error("raw value {raw} does not fit a {bits}-bit register")]
    RawOutOfRange { raw: u16, bits: u8 },
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("timeout waiting for embedded controller")]
    Timeout,
    #[error("sensor error: {0}")]
    Sensor(String),
    #[error("no fan at index {0}")]
    UnknownFan(usize),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;

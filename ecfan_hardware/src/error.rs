use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("embedded controller timeout waiting for {0}")]
    Timeout(&'static str),
    #[error("shared embedded controller lock poisoned")]
    LockPoisoned,
    #[error("sensor {}: {reason}", path.display())]
    Sensor { path: PathBuf, reason: String },
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;

//! Maps `Box<dyn Error>` from trait boundaries to typed `FanError`.
//!
//! The traits in `ecfan_traits` use `Box<dyn Error + Send + Sync>` so any
//! backend can plug in; this module converts those to our typed error enum,
//! with an optional feature-gated path for `ecfan_hardware::HwError`
//! downcasting.

use crate::error::{FanError, Report};

/// A backend error carried unmodified as the source of a mapped `FanError`.
#[derive(Debug)]
pub struct BackendError(pub Box<dyn std::error::Error + Send + Sync>);

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("backend error")
    }
}

impl std::error::Error for BackendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.0)
    }
}

/// Report for a trait-boundary error: the typed `FanError` on top, the
/// original backend error kept in the chain for `downcast_ref`.
pub fn hw_report(e: Box<dyn std::error::Error + Send + Sync>) -> Report {
    let mapped = map_hw_error(&*e);
    Report::new(BackendError(e)).wrap_err(mapped)
}

/// Map a trait-boundary error to a typed `FanError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> FanError {
    #[cfg(feature = "hardware-errors")]
    {
        use ecfan_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Timeout(_) => FanError::Timeout,
                HwError::Sensor { .. } => FanError::Sensor(hw.to_string()),
                other => FanError::HardwareFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        FanError::Timeout
    } else {
        FanError::Hardware(s)
    }
}

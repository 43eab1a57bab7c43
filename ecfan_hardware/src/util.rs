use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

/// Poll `ready` until it reports true or `timeout` expires.
///
/// Errors from `ready` are returned immediately. `what` names the awaited
/// condition in the timeout error.
pub fn wait_until_with_timeout(
    mut ready: impl FnMut() -> Result<bool>,
    timeout: Duration,
    poll_interval: Duration,
    what: &'static str,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    loop {
        if ready()? {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(HwError::Timeout(what));
        }
        if !poll_interval.is_zero() {
            std::thread::sleep(poll_interval);
        }
    }
}

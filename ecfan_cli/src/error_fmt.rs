//! Human-readable error descriptions and structured JSON error formatting.

use ecfan_core::FanError;
use ecfan_hardware::error::HwError;

pub const EXIT_GENERIC: i32 = 1;
pub const EXIT_CONFIG: i32 = 2;
pub const EXIT_HARDWARE: i32 = 3;
pub const EXIT_CONTRACT: i32 = 4;

/// Context attached to every failure to load or validate the config file.
#[derive(Debug, Clone, Copy)]
pub struct ConfigInvalid;

impl std::fmt::Display for ConfigInvalid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("invalid configuration")
    }
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // The first cause under our own context is the useful detail.
    let detail = err
        .chain()
        .nth(1)
        .map_or_else(|| err.to_string(), ToString::to_string);

    if err.downcast_ref::<ConfigInvalid>().is_some() {
        return format!(
            "What happened: The configuration file was rejected ({detail}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file and run `ecfan check` until it prints `config ok`."
        );
    }

    if let Some(fe) = err.downcast_ref::<FanError>() {
        return match fe {
            FanError::Timeout => "What happened: The embedded controller did not respond in time.\nLikely causes: Another program is talking to the EC, or hardware.timeout_ms is too low.\nHow to fix: Stop other fan tools and consider raising hardware.timeout_ms in the config.".to_string(),
            FanError::Sensor(msg) => format!(
                "What happened: A temperature sensor could not be read ({msg}).\nLikely causes: Wrong [sensors] path or the hwmon index changed after a reboot.\nHow to fix: Point [sensors] cpu/gpu at an existing temp*_input file."
            ),
            FanError::PercentOutOfRange(_) | FanError::RawOutOfRange { .. } => format!(
                "What happened: {fe}.\nLikely causes: A fan speed outside [0, 100] or register limits wider than the register.\nHow to fix: Pass --speed between 0 and 100, or fix min/max_speed_value and read_write_words."
            ),
            FanError::UnknownFan(_) => format!(
                "What happened: {fe}.\nLikely causes: A fan index beyond the [[fans]] list.\nHow to fix: Check the number of [[fans]] entries."
            ),
            FanError::Hardware(_) | FanError::HardwareFault(_) => format!(
                "What happened: Embedded controller access failed ({detail}).\nLikely causes: Missing privileges or the ec_sys module is not loaded with write_support=1.\nHow to fix: Run as root, or use backend = \"sim\" for a dry run."
            ),
        };
    }

    if err.downcast_ref::<HwError>().is_some() {
        return format!(
            "What happened: The hardware backend could not be opened ({detail}).\nLikely causes: Missing privileges, or /sys/kernel/debug is not mounted.\nHow to fix: Run as root, `modprobe ec_sys write_support=1`, or use backend = \"sim\"."
        );
    }

    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 2 config, 3 hardware, 4 contract violation, 1 otherwise.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<ConfigInvalid>().is_some() {
        return EXIT_CONFIG;
    }
    if let Some(fe) = err.downcast_ref::<FanError>() {
        return match fe {
            FanError::PercentOutOfRange(_) | FanError::RawOutOfRange { .. } => EXIT_CONTRACT,
            FanError::UnknownFan(_) => EXIT_GENERIC,
            FanError::Hardware(_)
            | FanError::HardwareFault(_)
            | FanError::Timeout
            | FanError::Sensor(_) => EXIT_HARDWARE,
        };
    }
    if err.downcast_ref::<HwError>().is_some() {
        return EXIT_HARDWARE;
    }
    EXIT_GENERIC
}

fn reason_name(err: &eyre::Report) -> &'static str {
    match exit_code_for_error(err) {
        EXIT_CONFIG => "Config",
        EXIT_HARDWARE => "Hardware",
        EXIT_CONTRACT => "ContractViolation",
        _ => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::WrapErr;

    #[test]
    fn config_errors_map_to_exit_code_two() {
        let err = eyre::eyre!("cpu_up (95) must be below the cpu critical temperature (90)")
            .wrap_err(ConfigInvalid);
        assert_eq!(exit_code_for_error(&err), EXIT_CONFIG);
        assert!(humanize(&err).contains("cpu_up (95)"));
    }

    #[test]
    fn typed_fan_errors_survive_context() {
        let res: Result<(), FanError> = Err(FanError::PercentOutOfRange(150.0));
        let err = res.wrap_err("failed to set speed of fan0").unwrap_err();
        assert_eq!(exit_code_for_error(&err), EXIT_CONTRACT);

        let res: Result<(), FanError> = Err(FanError::Timeout);
        let err = res.wrap_err("failed to read speed of fan0").unwrap_err();
        assert_eq!(exit_code_for_error(&err), EXIT_HARDWARE);
    }

    #[test]
    fn json_carries_reason_and_code() {
        let err = eyre::Report::new(HwError::LockPoisoned);
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "Hardware");
        assert_eq!(v["exit_code"], 3);
        assert_eq!(exit_code_for_error(&eyre::eyre!("boom")), EXIT_GENERIC);
    }
}

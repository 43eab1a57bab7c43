use ecfan_config::{Backend, load_file, load_toml};
use rstest::rstest;
use std::fs;
use tempfile::tempdir;

fn with_fan(fan_extra: &str) -> String {
    format!(
        r#"
cpu_critical_temperature = 90
gpu_critical_temperature = 85
poll_interval_ms = 500

[[fans]]
name = "CPU fan"
write_register = 0x2f
read_register = 0x2f
min_speed_value = 0
max_speed_value = 255
is_gpu_fan = true
{fan_extra}
"#
    )
}

#[test]
fn accepts_realistic_profile() {
    let toml = with_fan(
        r#"
reset_required = true
fan_speed_reset_value = 255
temperature_thresholds = [
  { cpu_up = 60, cpu_down = 0, gpu_up = 60, gpu_down = 0, speed = 0.0 },
  { cpu_up = 65, cpu_down = 55, gpu_up = 65, gpu_down = 55, speed = 30.0 },
  { cpu_up = 75, cpu_down = 65, gpu_up = 75, gpu_down = 65, speed = 100.0 },
]
fan_speed_percentage_overrides = [
  { percent = 0.0, value = 255, direction = "write" },
]
"#,
    );
    let cfg = load_toml(&toml).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert!(cfg.warnings().is_empty());
    assert_eq!(cfg.fans[0].temperature_thresholds.len(), 3);
}

#[rstest]
#[case(
    "temperature_thresholds = [{ cpu_up = 60, cpu_down = 50, gpu_up = 60, gpu_down = 50, speed = 10.0 }, { cpu_up = 60, cpu_down = 40, gpu_up = 60, gpu_down = 40, speed = 20.0 }]",
    "duplicate up-threshold"
)]
#[case(
    "temperature_thresholds = [{ cpu_up = 50, cpu_down = 60, gpu_up = 60, gpu_down = 50, speed = 10.0 }]",
    "cpu_up (50) must be >= cpu_down (60)"
)]
#[case(
    "temperature_thresholds = [{ cpu_up = 60, cpu_down = 50, gpu_up = 40, gpu_down = 50, speed = 10.0 }]",
    "gpu_up (40) must be >= gpu_down (50)"
)]
#[case(
    "temperature_thresholds = [{ cpu_up = 90, cpu_down = 50, gpu_up = 60, gpu_down = 50, speed = 10.0 }]",
    "below the cpu critical temperature"
)]
#[case(
    "temperature_thresholds = [{ cpu_up = 60, cpu_down = 50, gpu_up = 85, gpu_down = 50, speed = 10.0 }]",
    "below the gpu critical temperature"
)]
#[case(
    "fan_speed_percentage_overrides = [{ percent = 0.0, value = 300 }]",
    "exceeds 255"
)]
#[case(
    "fan_speed_percentage_overrides = [{ percent = 120.0, value = 3 }]",
    "must be in [0, 100]"
)]
fn rejects_invalid_fan(#[case] extra: &str, #[case] needle: &str) {
    let cfg = load_toml(&with_fan(extra)).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(format!("{err}").contains(needle), "{err}");
}

#[test]
fn gpu_threshold_ignored_for_cpu_only_fan() {
    let toml = r#"
cpu_critical_temperature = 90

[[fans]]
write_register = 0x2f
read_register = 0x2f
min_speed_value = 0
max_speed_value = 255
temperature_thresholds = [{ cpu_up = 60, cpu_down = 50, gpu_up = 150, gpu_down = 50, speed = 10.0 }]
"#;
    let cfg = load_toml(toml).unwrap();
    cfg.validate().expect("gpu axis is not monitored");
}

#[test]
fn word_registers_allow_wide_raw_values() {
    let toml = r#"
cpu_critical_temperature = 90
read_write_words = true

[[fans]]
write_register = 0x20
read_register = 0x22
min_speed_value = 0
max_speed_value = 4000
"#;
    let cfg = load_toml(toml).unwrap();
    cfg.validate().expect("16-bit registers hold 4000");
}

#[test]
fn warns_when_threshold_close_to_critical() {
    let cfg = load_toml(&with_fan(
        "temperature_thresholds = [{ cpu_up = 86, cpu_down = 70, gpu_up = 60, gpu_down = 50, speed = 10.0 }]",
    ))
    .unwrap();
    cfg.validate().unwrap();
    let warnings = cfg.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("cpu_up (86)"), "{warnings:?}");
}

#[rstest]
#[case("cpu_critical_temperature = 0\n[[fans]]\nwrite_register = 1\nread_register = 1\nmin_speed_value = 0\nmax_speed_value = 1\n", "cpu_critical_temperature")]
#[case("cpu_critical_temperature = 90\n", "at least one [[fans]]")]
#[case("cpu_critical_temperature = 90\npoll_interval_ms = 0\n[[fans]]\nwrite_register = 1\nread_register = 1\nmin_speed_value = 0\nmax_speed_value = 1\n", "poll_interval_ms")]
#[case("cpu_critical_temperature = 90\n[hardware]\nbackend = \"debugfs\"\n[[fans]]\nwrite_register = 1\nread_register = 1\nmin_speed_value = 0\nmax_speed_value = 1\n", "sensors.cpu is required")]
fn rejects_invalid_global(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(format!("{err}").contains(needle), "{err}");
}

#[test]
fn unknown_backend_is_a_parse_error() {
    let toml = "cpu_critical_temperature = 90\n[hardware]\nbackend = \"wmi\"\n";
    assert!(load_toml(toml).is_err());
}

#[test]
fn load_file_parses_and_validates() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ecfan.toml");
    fs::write(&path, with_fan("")).unwrap();
    let cfg = load_file(&path).expect("load");
    assert_eq!(cfg.hardware.backend, Backend::Sim);
    assert_eq!(cfg.fans[0].label(0), "CPU fan");

    fs::write(&path, "cpu_critical_temperature = 90\n").unwrap();
    let err = load_file(&path).expect_err("no fans");
    assert!(err.to_string().contains("at least one"));
}

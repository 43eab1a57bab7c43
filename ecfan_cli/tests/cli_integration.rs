use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Minimal valid config for the sim backend
const VALID: &str = r#"
cpu_critical_temperature = 90
poll_interval_ms = 10

[sim]
min_temp = 50.0
max_temp = 60.0
step = 2.0

[[fans]]
name = "CPU fan"
write_register = 0x2f
read_register = 0x2e
min_speed_value = 0
max_speed_value = 200
reset_required = true
fan_speed_reset_value = 255
temperature_thresholds = [
  { cpu_up = 0, cpu_down = 0, gpu_up = 0, gpu_down = 0, speed = 0.0 },
  { cpu_up = 55, cpu_down = 45, gpu_up = 55, gpu_down = 45, speed = 40.0 },
  { cpu_up = 86, cpu_down = 70, gpu_up = 86, gpu_down = 70, speed = 100.0 },
]
"#;

fn write_config(dir: &tempfile::TempDir, toml: &str) -> PathBuf {
    let path = dir.path().join("ecfan.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn ecfan(cfg: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("ecfan").unwrap();
    cmd.arg("--config").arg(cfg).env_remove("RUST_LOG");
    cmd
}

#[rstest]
#[case(&["--help"], "Usage:")]
#[case(&["check"], "config ok")]
#[case(&["run", "--ticks", "2", "--interval-ms", "0"], "[2] CPU fan:")]
#[case(&["run", "--ticks", "1", "--speed", "50"], "target 50.0%")]
#[case(&["status"], "cpu: 50.0 C")]
#[case(&["reset"], "reset 1 fan(s)")]
fn successful_commands(#[case] args: &[&str], #[case] needle: &str) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, VALID);
    ecfan(&cfg)
        .args(args)
        .assert()
        .success()
        .stdout(predicate::str::contains(needle));
}

#[test]
fn check_prints_warnings_for_thresholds_near_critical() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, VALID);
    ecfan(&cfg)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("warning:").and(predicate::str::contains("config ok")));
}

#[rstest]
#[case("cpu_critical_temperature = 90\n", "[[fans]]")]
#[case(&VALID.replace("cpu_up = 86", "cpu_up = 95"), "critical")]
#[case(&VALID.replace("0x2e", "\"nope\""), "invalid configuration")]
fn invalid_config_exits_with_code_two(#[case] toml: &str, #[case] needle: &str) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, toml);
    ecfan(&cfg)
        .arg("check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains(needle));
}

#[test]
fn missing_config_file_is_a_config_error() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("absent.toml");
    ecfan(&cfg).arg("check").assert().code(2);
}

#[test]
fn nan_speed_is_a_contract_violation() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, VALID);
    ecfan(&cfg)
        .args(["run", "--ticks", "1", "--speed", "NaN"])
        .assert()
        .code(4);
}

#[test]
fn json_mode_prints_tick_objects() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, VALID);
    let out = ecfan(&cfg)
        .args(["--json", "run", "--ticks", "3", "--interval-ms", "0"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let lines: Vec<serde_json::Value> = String::from_utf8(out.stdout)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[2]["tick"], 3);
    assert_eq!(lines[0]["fans"][0]["name"], "CPU fan");
    assert_eq!(lines[0]["fans"][0]["auto"], true);
}

#[test]
fn json_mode_reports_errors_as_json() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "cpu_critical_temperature = 0\n");
    let out = ecfan(&cfg).args(["--json", "check"]).output().unwrap();
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8(out.stderr).unwrap();
    let last = stderr.lines().rev().find(|l| l.contains("\"reason\"")).unwrap();
    let v: serde_json::Value = serde_json::from_str(last).unwrap();
    assert_eq!(v["reason"], "Config");
}

#[test]
fn debugfs_backend_without_ec_file_is_a_hardware_error() {
    let dir = tempdir().unwrap();
    let toml = format!(
        "{VALID}\n[hardware]\nbackend = \"debugfs\"\nec_path = \"{}\"\n\n[sensors]\ncpu = \"{}\"\n",
        dir.path().join("no-such-io").display(),
        dir.path().join("temp1_input").display(),
    );
    let cfg = write_config(&dir, &toml);
    ecfan(&cfg).arg("status").assert().code(3);
}

#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and static validation for notebook fan profiles.
//!
//! - `Config` and sub-structs are deserialized from TOML.
//! - `Config::validate` rejects profiles the controller must never see
//!   (duplicate up-thresholds, inverted hysteresis, thresholds at or above
//!   the critical temperature, raw values wider than the register).
//! - `Config::warnings` reports legal but risky thresholds.
use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

/// Thresholds within this many degrees of critical are reported as warnings.
pub const CRITICAL_WARNING_MARGIN: i32 = 5;
/// Largest critical temperature accepted; the controller reserves 200 °C as
/// the "never trigger" sentinel for unmonitored axes.
pub const MAX_CRITICAL_TEMPERATURE: i32 = 199;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct TemperatureThreshold {
    pub cpu_up: i32,
    pub cpu_down: i32,
    pub gpu_up: i32,
    pub gpu_down: i32,
    /// Fan speed in percent. Clamped to [0, 100] by the controller.
    pub speed: f32,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OverrideDirection {
    Read,
    Write,
    #[default]
    Both,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct SpeedOverride {
    pub percent: f32,
    pub value: u16,
    #[serde(default)]
    pub direction: OverrideDirection,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FanCfg {
    #[serde(default)]
    pub name: Option<String>,
    pub write_register: u8,
    pub read_register: u8,
    pub min_speed_value: u16,
    pub max_speed_value: u16,
    #[serde(default)]
    pub independent_read_min_max_values: bool,
    #[serde(default)]
    pub min_speed_value_read: u16,
    #[serde(default)]
    pub max_speed_value_read: u16,
    #[serde(default)]
    pub reset_required: bool,
    #[serde(default)]
    pub fan_speed_reset_value: u16,
    #[serde(default = "default_true")]
    pub is_cpu_fan: bool,
    #[serde(default)]
    pub is_gpu_fan: bool,
    #[serde(default)]
    pub temperature_thresholds: Vec<TemperatureThreshold>,
    #[serde(default)]
    pub fan_speed_percentage_overrides: Vec<SpeedOverride>,
}

impl FanCfg {
    /// Display label: the configured name, or `fan<index>`.
    pub fn label(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("fan{index}"))
    }

    /// Effective raw read range (falls back to the write range).
    pub fn read_range(&self) -> (u16, u16) {
        if self.independent_read_min_max_values {
            (self.min_speed_value_read, self.max_speed_value_read)
        } else {
            (self.min_speed_value, self.max_speed_value)
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// In-memory EC and a sweeping temperature source.
    #[default]
    Sim,
    /// Linux `ec_sys` debugfs register file.
    Debugfs,
    /// ACPI EC protocol through `/dev/port`.
    Port,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Hardware {
    pub backend: Backend,
    /// Override for the debugfs `io` file.
    pub ec_path: Option<String>,
    /// Max wait for an EC status bit per protocol step (ms)
    pub timeout_ms: u64,
}

impl Default for Hardware {
    fn default() -> Self {
        Self {
            backend: Backend::Sim,
            ec_path: None,
            timeout_ms: 50,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Sensors {
    /// Millidegree file for the CPU temperature
    pub cpu: Option<String>,
    /// Millidegree file for the GPU temperature; GPU reads 0 when absent
    pub gpu: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimCfg {
    pub min_temp: f32,
    pub max_temp: f32,
    pub step: f32,
    pub gpu_offset: f32,
}

impl Default for SimCfg {
    fn default() -> Self {
        Self {
            min_temp: 40.0,
            max_temp: 95.0,
            step: 1.5,
            gpu_offset: -5.0,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub cpu_critical_temperature: i32,
    /// Defaults to `cpu_critical_temperature` when absent.
    #[serde(default)]
    pub gpu_critical_temperature: Option<i32>,
    /// Access fan registers as 16-bit little-endian words
    #[serde(default)]
    pub read_write_words: bool,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Compute speeds but never write the EC
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub hardware: Hardware,
    #[serde(default)]
    pub sensors: Sensors,
    #[serde(default)]
    pub sim: SimCfg,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub fans: Vec<FanCfg>,
}

fn default_poll_interval_ms() -> u64 {
    1000
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {}: {}", path.display(), e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("invalid configuration: {e}"))?;
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    pub fn gpu_critical(&self) -> i32 {
        self.gpu_critical_temperature
            .unwrap_or(self.cpu_critical_temperature)
    }

    pub fn validate(&self) -> eyre::Result<()> {
        let crit_range = 1..=MAX_CRITICAL_TEMPERATURE;
        if !crit_range.contains(&self.cpu_critical_temperature) {
            eyre::bail!("cpu_critical_temperature must be in [1, {MAX_CRITICAL_TEMPERATURE}]");
        }
        if !crit_range.contains(&self.gpu_critical()) {
            eyre::bail!("gpu_critical_temperature must be in [1, {MAX_CRITICAL_TEMPERATURE}]");
        }
        if self.poll_interval_ms == 0 {
            eyre::bail!("poll_interval_ms must be >= 1");
        }
        if self.poll_interval_ms > 60 * 1000 {
            eyre::bail!("poll_interval_ms is unreasonably large (>60s)");
        }

        // Hardware
        if self.hardware.timeout_ms == 0 {
            eyre::bail!("hardware.timeout_ms must be >= 1");
        }
        if self.hardware.backend != Backend::Sim && self.sensors.cpu.is_none() {
            eyre::bail!("sensors.cpu is required for the {:?} backend", self.hardware.backend);
        }

        // Sim
        if !(self.sim.step.is_finite() && self.sim.step >= 0.0) {
            eyre::bail!("sim.step must be a finite value >= 0");
        }
        if !(self.sim.min_temp.is_finite() && self.sim.max_temp.is_finite()) {
            eyre::bail!("sim.min_temp and sim.max_temp must be finite");
        }

        // Fans
        if self.fans.is_empty() {
            eyre::bail!("at least one [[fans]] entry is required");
        }
        for (i, fan) in self.fans.iter().enumerate() {
            self.validate_fan(i, fan)?;
        }

        Ok(())
    }

    fn validate_fan(&self, i: usize, fan: &FanCfg) -> eyre::Result<()> {
        if !self.read_write_words {
            let (min_read, max_read) = fan.read_range();
            let raw_values = [
                ("min_speed_value", fan.min_speed_value),
                ("max_speed_value", fan.max_speed_value),
                ("min_speed_value_read", min_read),
                ("max_speed_value_read", max_read),
                ("fan_speed_reset_value", fan.fan_speed_reset_value),
            ];
            for (field, v) in raw_values {
                if v > u16::from(u8::MAX) {
                    eyre::bail!("fans[{i}].{field} ({v}) exceeds 255 with byte-wide registers");
                }
            }
            if let Some(o) = fan
                .fan_speed_percentage_overrides
                .iter()
                .find(|o| o.value > u16::from(u8::MAX))
            {
                eyre::bail!(
                    "fans[{i}].fan_speed_percentage_overrides: value {} exceeds 255 with byte-wide registers",
                    o.value
                );
            }
        }
        if self.read_write_words && (fan.read_register == u8::MAX || fan.write_register == u8::MAX) {
            eyre::bail!("fans[{i}]: word registers need a following byte register (0xff has none)");
        }

        for o in &fan.fan_speed_percentage_overrides {
            if !(0.0..=100.0).contains(&o.percent) {
                eyre::bail!(
                    "fans[{i}].fan_speed_percentage_overrides: percent {} must be in [0, 100]",
                    o.percent
                );
            }
        }

        let mut seen = HashSet::new();
        for (j, t) in fan.temperature_thresholds.iter().enumerate() {
            if !seen.insert((t.cpu_up, t.gpu_up)) {
                eyre::bail!(
                    "fans[{i}].temperature_thresholds[{j}]: duplicate up-threshold (cpu {}, gpu {})",
                    t.cpu_up,
                    t.gpu_up
                );
            }
            if t.cpu_up < t.cpu_down {
                eyre::bail!(
                    "fans[{i}].temperature_thresholds[{j}]: cpu_up ({}) must be >= cpu_down ({})",
                    t.cpu_up,
                    t.cpu_down
                );
            }
            if t.gpu_up < t.gpu_down {
                eyre::bail!(
                    "fans[{i}].temperature_thresholds[{j}]: gpu_up ({}) must be >= gpu_down ({})",
                    t.gpu_up,
                    t.gpu_down
                );
            }
            if fan.is_cpu_fan && t.cpu_up >= self.cpu_critical_temperature {
                eyre::bail!(
                    "fans[{i}].temperature_thresholds[{j}]: cpu_up ({}) must be below the cpu critical temperature ({})",
                    t.cpu_up,
                    self.cpu_critical_temperature
                );
            }
            if fan.is_gpu_fan && t.gpu_up >= self.gpu_critical() {
                eyre::bail!(
                    "fans[{i}].temperature_thresholds[{j}]: gpu_up ({}) must be below the gpu critical temperature ({})",
                    t.gpu_up,
                    self.gpu_critical()
                );
            }
            if !t.speed.is_finite() {
                eyre::bail!("fans[{i}].temperature_thresholds[{j}]: speed must be finite");
            }
        }
        Ok(())
    }

    /// Thresholds that pass validation but sit within
    /// `CRITICAL_WARNING_MARGIN` degrees of the critical temperature.
    pub fn warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        for (i, fan) in self.fans.iter().enumerate() {
            for (j, t) in fan.temperature_thresholds.iter().enumerate() {
                let cpu_crit = self.cpu_critical_temperature;
                if fan.is_cpu_fan && t.cpu_up < cpu_crit && t.cpu_up >= cpu_crit - CRITICAL_WARNING_MARGIN {
                    out.push(format!(
                        "fans[{i}].temperature_thresholds[{j}]: cpu_up ({}) is less than {CRITICAL_WARNING_MARGIN} degrees below the cpu critical temperature ({cpu_crit})",
                        t.cpu_up
                    ));
                }
                let gpu_crit = self.gpu_critical();
                if fan.is_gpu_fan && t.gpu_up < gpu_crit && t.gpu_up >= gpu_crit - CRITICAL_WARNING_MARGIN {
                    out.push(format!(
                        "fans[{i}].temperature_thresholds[{j}]: gpu_up ({}) is less than {CRITICAL_WARNING_MARGIN} degrees below the gpu critical temperature ({gpu_crit})",
                        t.gpu_up
                    ));
                }
            }
        }
        out
    }
}

//! `From` implementations bridging `ecfan_config` types to `ecfan_core` types.

use std::time::Duration;

use ecfan_traits::EmbeddedController;

use crate::fan::FanController;
use crate::profile::{FanProfile, OverrideDirection, RegisterWidth, SpeedOverride};
use crate::runner::RunParams;
use crate::threshold::ThermalBand;

// ── ThermalBand ──────────────────────────────────────────────────────────────

impl From<&ecfan_config::TemperatureThreshold> for ThermalBand {
    fn from(t: &ecfan_config::TemperatureThreshold) -> Self {
        Self::new(t.cpu_up, t.cpu_down, t.gpu_up, t.gpu_down, t.speed)
    }
}

// ── SpeedOverride ────────────────────────────────────────────────────────────

impl From<ecfan_config::OverrideDirection> for OverrideDirection {
    fn from(d: ecfan_config::OverrideDirection) -> Self {
        match d {
            ecfan_config::OverrideDirection::Read => Self::Read,
            ecfan_config::OverrideDirection::Write => Self::Write,
            ecfan_config::OverrideDirection::Both => Self::Both,
        }
    }
}

impl From<&ecfan_config::SpeedOverride> for SpeedOverride {
    fn from(o: &ecfan_config::SpeedOverride) -> Self {
        Self::new(o.percent, o.value, o.direction.into())
    }
}

// ── FanProfile ───────────────────────────────────────────────────────────────

impl From<&ecfan_config::FanCfg> for FanProfile {
    fn from(c: &ecfan_config::FanCfg) -> Self {
        Self {
            name: c.name.clone(),
            write_register: c.write_register,
            read_register: c.read_register,
            min_write: c.min_speed_value,
            max_write: c.max_speed_value,
            read_range: c
                .independent_read_min_max_values
                .then_some((c.min_speed_value_read, c.max_speed_value_read)),
            reset_required: c.reset_required,
            reset_value: c.fan_speed_reset_value,
            bands: c.temperature_thresholds.iter().map(ThermalBand::from).collect(),
            overrides: c
                .fan_speed_percentage_overrides
                .iter()
                .map(SpeedOverride::from)
                .collect(),
            is_cpu_fan: c.is_cpu_fan,
            is_gpu_fan: c.is_gpu_fan,
        }
    }
}

// ── RunParams ────────────────────────────────────────────────────────────────

impl From<&ecfan_config::Config> for RunParams {
    fn from(c: &ecfan_config::Config) -> Self {
        Self {
            poll_interval: Duration::from_millis(c.poll_interval_ms),
            read_only: c.read_only,
            max_ticks: None,
        }
    }
}

/// One controller per `[[fans]]` entry, each holding a clone of `ec`.
///
/// `ec` is normally a shared handle so every fan talks to the same
/// controller through one lock. Unnamed fans are labelled `fan<index>`.
pub fn build_controllers<E>(cfg: &ecfan_config::Config, ec: &E) -> Vec<FanController<E>>
where
    E: EmbeddedController + Clone,
{
    let width = RegisterWidth::from_words(cfg.read_write_words);
    cfg.fans
        .iter()
        .enumerate()
        .map(|(i, fan_cfg)| {
            let mut profile = FanProfile::from(fan_cfg);
            profile.name = Some(fan_cfg.label(i));
            FanController::new(
                profile,
                ec.clone(),
                cfg.cpu_critical_temperature,
                cfg.gpu_critical(),
                width,
            )
        })
        .collect()
}

//! Per-fan control: ladder selection, critical override, raw encoding.

use ecfan_traits::EmbeddedController;
use eyre::WrapErr;

use crate::critical::CriticalGuard;
use crate::error::{FanError, Result};
use crate::hw_error::hw_report;
use crate::overrides::OverrideTables;
use crate::profile::{FanProfile, RegisterWidth};
use crate::threshold::{ThresholdLadder, default_bands};

/// Attempts made by [`FanController::get_current_speed`] to obtain an
/// in-range sample before accepting whatever the last read returned.
pub const READ_ATTEMPTS: usize = 3;

pub struct FanController<E: EmbeddedController> {
    name: Option<String>,
    ec: E,
    width: RegisterWidth,
    write_register: u8,
    read_register: u8,
    min_write: u16,
    max_write: u16,
    min_read: u16,
    max_read: u16,
    reset_value: Option<u16>,
    monitors_gpu: bool,
    ladder: ThresholdLadder,
    overrides: OverrideTables,
    critical: CriticalGuard,
    target_percent: f32,
    last_read_percent: f32,
    auto_enabled: bool,
    fan_enabled: bool,
}

impl<E: EmbeddedController> std::fmt::Debug for FanController<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanController")
            .field("name", &self.name)
            .field("width", &self.width)
            .field("target_percent", &self.target_percent)
            .field("last_read_percent", &self.last_read_percent)
            .field("auto_enabled", &self.auto_enabled)
            .field("critical", &self.critical.state())
            .finish_non_exhaustive()
    }
}

impl<E: EmbeddedController> FanController<E> {
    /// Build a controller for one fan.
    ///
    /// The profile's bands are used only when it declares at least one and
    /// the fan monitors at least one axis; otherwise the built-in ladder from
    /// [`default_bands`] applies. The axis a fan does not monitor is disabled
    /// by moving its thresholds out of reach.
    pub fn new(
        profile: FanProfile,
        ec: E,
        cpu_critical: i32,
        gpu_critical: i32,
        width: RegisterWidth,
    ) -> Self {
        let (min_read, max_read) = profile.read_bounds();
        let use_profile_bands =
            !profile.bands.is_empty() && (profile.is_cpu_fan || profile.is_gpu_fan);

        let ladder = if use_profile_bands {
            ThresholdLadder::new(profile.bands.iter().map(|b| {
                let mut b = *b;
                if !profile.is_cpu_fan {
                    b.neutralize_cpu();
                }
                if !profile.is_gpu_fan {
                    b.neutralize_gpu();
                }
                b
            }))
        } else {
            ThresholdLadder::new(default_bands())
        };

        Self {
            overrides: OverrideTables::new(&profile.overrides),
            name: profile.name,
            ec,
            width,
            write_register: profile.write_register,
            read_register: profile.read_register,
            min_write: profile.min_write,
            max_write: profile.max_write,
            min_read,
            max_read,
            reset_value: profile.reset_required.then_some(profile.reset_value),
            // The built-in ladder is symmetric, so both axes drive it.
            monitors_gpu: !use_profile_bands || profile.is_gpu_fan,
            ladder,
            critical: CriticalGuard::new(cpu_critical, gpu_critical),
            target_percent: 0.0,
            last_read_percent: 0.0,
            auto_enabled: false,
            fan_enabled: true,
        }
    }

    /// Apply one control step.
    ///
    /// A `requested_percent` outside `[0, 100]` selects automatic control.
    /// With `read_only` set, state is updated but nothing is written.
    pub fn set_target_speed(
        &mut self,
        requested_percent: f32,
        cpu_temp: f32,
        gpu_temp: f32,
        read_only: bool,
    ) -> Result<()> {
        self.critical.update(cpu_temp, gpu_temp);
        // NaN is neither: it reaches the encoder and is rejected there.
        self.auto_enabled = requested_percent < 0.0 || requested_percent > 100.0;

        if self.auto_enabled {
            if let Some(band) = self.ladder.select(cpu_temp, gpu_temp) {
                self.target_percent = band.speed_percent();
            }
        } else {
            self.target_percent = requested_percent;
        }

        if read_only || !self.fan_enabled {
            return Ok(());
        }
        let effective = self.target_speed();
        let raw = self.percent_to_raw(effective)?;
        tracing::debug!(
            fan = self.label(),
            register = self.write_register,
            raw,
            percent = effective,
            "fan speed write"
        );
        self.write_raw(self.write_register, raw)
            .wrap_err_with(|| format!("failed to set speed of {}", self.label()))
    }

    /// Read the fan's current speed, in percent.
    ///
    /// Up to [`READ_ATTEMPTS`] samples are taken; the first inside the read
    /// range is decoded, otherwise the last sample is used as-is.
    pub fn get_current_speed(&mut self) -> Result<f32> {
        let lo = self.min_read.min(self.max_read);
        let hi = self.min_read.max(self.max_read);

        let mut raw = 0;
        for attempt in 1..=READ_ATTEMPTS {
            raw = self
                .read_raw(self.read_register)
                .wrap_err_with(|| format!("failed to read speed of {}", self.label()))?;
            if (lo..=hi).contains(&raw) {
                break;
            }
            if attempt == READ_ATTEMPTS {
                tracing::warn!(
                    fan = self.label(),
                    raw,
                    min = lo,
                    max = hi,
                    "fan speed register out of range on every attempt"
                );
            }
        }
        self.last_read_percent = self.raw_to_percent(raw);
        Ok(self.last_read_percent)
    }

    /// Hand the fan back to firmware control, if the profile asks for it.
    pub fn reset(&mut self) -> Result<()> {
        let Some(raw) = self.reset_value else {
            return Ok(());
        };
        tracing::info!(fan = self.label(), register = self.write_register, raw, "fan reset");
        self.write_raw(self.write_register, raw)
            .wrap_err_with(|| format!("failed to reset {}", self.label()))
    }

    /// Encode a duty cycle as a raw register value.
    pub fn percent_to_raw(&self, percent: f32) -> Result<u16> {
        if !(0.0..=100.0).contains(&percent) {
            return Err(FanError::PercentOutOfRange(percent).into());
        }
        let raw = match self.overrides.raw_for_percent(percent) {
            Some(raw) => raw,
            None => {
                let min = f64::from(self.min_write);
                let max = f64::from(self.max_write);
                // Always between min_write and max_write, so within u16.
                (min + (max - min) * f64::from(percent) / 100.0).round_ties_even() as u16
            }
        };
        self.check_width(raw)?;
        Ok(raw)
    }

    /// Decode a raw register value into a duty cycle. Not clamped: a sample
    /// outside the read range decodes outside `[0, 100]`.
    pub fn raw_to_percent(&self, raw: u16) -> f32 {
        if let Some(percent) = self.overrides.percent_for_raw(raw) {
            return percent;
        }
        if self.min_read == self.max_read {
            return 0.0;
        }
        let min = f64::from(self.min_read);
        let max = f64::from(self.max_read);
        ((f64::from(raw) - min) / (max - min) * 100.0) as f32
    }

    /// Effective duty cycle: 100 while critical mode is active.
    pub fn target_speed(&self) -> f32 {
        if self.critical.is_critical() {
            100.0
        } else {
            self.target_percent
        }
    }

    /// Last value returned by [`Self::get_current_speed`].
    pub fn current_speed(&self) -> f32 {
        self.last_read_percent
    }

    pub fn auto_control_enabled(&self) -> bool {
        self.auto_enabled
    }

    pub fn critical_mode_enabled(&self) -> bool {
        self.critical.is_critical()
    }

    pub fn fan_enabled(&self) -> bool {
        self.fan_enabled
    }

    /// A disabled fan keeps tracking state but is never written.
    pub fn set_fan_enabled(&mut self, enabled: bool) {
        self.fan_enabled = enabled;
    }

    /// Whether GPU temperature can move this fan's ladder. Critical mode
    /// watches both axes regardless.
    pub fn monitors_gpu(&self) -> bool {
        self.monitors_gpu
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn ladder(&self) -> &ThresholdLadder {
        &self.ladder
    }

    pub fn ec(&self) -> &E {
        &self.ec
    }

    pub fn ec_mut(&mut self) -> &mut E {
        &mut self.ec
    }

    fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("fan")
    }

    fn check_width(&self, raw: u16) -> Result<()> {
        match self.width {
            RegisterWidth::Byte if u8::try_from(raw).is_err() => Err(FanError::RawOutOfRange {
                raw,
                bits: self.width.bits(),
            }
            .into()),
            _ => Ok(()),
        }
    }

    fn write_raw(&mut self, register: u8, raw: u16) -> Result<()> {
        let res = match self.width {
            RegisterWidth::Word => self.ec.write_word(register, raw),
            RegisterWidth::Byte => {
                let byte = u8::try_from(raw).map_err(|_| FanError::RawOutOfRange {
                    raw,
                    bits: self.width.bits(),
                })?;
                self.ec.write_byte(register, byte)
            }
        };
        res.map_err(hw_report)
    }

    fn read_raw(&mut self, register: u8) -> Result<u16> {
        let res = match self.width {
            RegisterWidth::Word => self.ec.read_word(register),
            RegisterWidth::Byte => self.ec.read_byte(register).map(u16::from),
        };
        res.map_err(hw_report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{OverrideDirection, SpeedOverride};
    use crate::threshold::ThermalBand;
    use ecfan_hardware::SimulatedEc;

    fn fan(profile: FanProfile) -> FanController<SimulatedEc> {
        FanController::new(profile, SimulatedEc::new(), 90, 90, RegisterWidth::Byte)
    }

    #[test]
    fn encode_rounds_half_to_even() {
        let f = fan(FanProfile::new(0x2f, 0x2f, 0, 255));
        // 255 * 50 / 100 = 127.5
        assert_eq!(f.percent_to_raw(50.0).unwrap(), 128);
        let f = fan(FanProfile::new(0x2f, 0x2f, 0, 5));
        // 5 * 50 / 100 = 2.5
        assert_eq!(f.percent_to_raw(50.0).unwrap(), 2);
    }

    #[test]
    fn inverted_write_range_encodes_downward() {
        let f = fan(FanProfile::new(0x2f, 0x2f, 255, 0));
        assert_eq!(f.percent_to_raw(0.0).unwrap(), 255);
        assert_eq!(f.percent_to_raw(100.0).unwrap(), 0);
    }

    #[test]
    fn out_of_range_percent_is_rejected_not_clamped() {
        let f = fan(FanProfile::new(0x2f, 0x2f, 0, 255));
        for p in [-0.5, 100.5, f32::NAN] {
            let err = f.percent_to_raw(p).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<FanError>(),
                Some(FanError::PercentOutOfRange(_))
            ));
        }
    }

    #[test]
    fn byte_width_rejects_wide_raw_values() {
        let f = fan(FanProfile::new(0x2f, 0x2f, 0, 1000));
        let err = f.percent_to_raw(100.0).unwrap_err();
        assert_eq!(
            err.downcast_ref::<FanError>(),
            Some(&FanError::RawOutOfRange { raw: 1000, bits: 8 })
        );
    }

    #[test]
    fn degenerate_read_range_decodes_to_zero() {
        let f = fan(FanProfile::new(0x2f, 0x2f, 40, 40));
        assert_eq!(f.raw_to_percent(40), 0.0);
        assert_eq!(f.raw_to_percent(200), 0.0);
    }

    #[test]
    fn independent_read_range_is_used_for_decoding() {
        let f = fan(FanProfile::new(0x2f, 0x2e, 0, 255).with_read_range(100, 200));
        assert_eq!(f.raw_to_percent(150), 50.0);
    }

    #[test]
    fn override_maps_exactly_in_both_directions() {
        let f = fan(FanProfile::new(0x2f, 0x2f, 0, 200).with_overrides([SpeedOverride::new(
            0.0,
            255,
            OverrideDirection::Both,
        )]));
        assert_eq!(f.percent_to_raw(0.0).unwrap(), 255);
        assert_eq!(f.raw_to_percent(255), 0.0);
    }

    #[test]
    fn unmonitored_profile_falls_back_to_default_ladder() {
        let f = fan(FanProfile::new(0x2f, 0x2f, 0, 255)
            .with_bands([ThermalBand::symmetric(50, 40, 33.0)])
            .monitoring(false, false));
        assert_eq!(f.ladder().len(), default_bands().len());
        assert!(f.monitors_gpu());
    }

    #[test]
    fn gpu_fan_bands_ignore_cpu_axis() {
        let f = fan(FanProfile::new(0x2f, 0x2f, 0, 255)
            .with_bands([ThermalBand::symmetric(50, 40, 33.0)])
            .monitoring(false, true));
        let band = f.ladder().bands()[0];
        assert_eq!(band.cpu_up(), crate::threshold::NEUTRAL_THRESHOLD);
        assert_eq!(band.gpu_up(), 50);
        assert!(f.monitors_gpu());
    }
}

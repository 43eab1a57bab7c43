use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use ecfan_traits::clock::{Clock, MonotonicClock};
use ecfan_traits::{EmbeddedController, TemperatureSource};
use eyre::WrapErr;

use crate::error::{FanError, Report, Result};
use crate::fan::FanController;
use crate::hw_error::hw_report;

/// Requested speed that selects automatic (ladder) control.
pub const AUTO_FAN_SPEED: f32 = 101.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunParams {
    pub poll_interval: Duration,
    /// Track temperatures and read speeds, but never write.
    pub read_only: bool,
    /// Stop [`Runner::run`] after this many ticks.
    pub max_ticks: Option<u64>,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            read_only: false,
            max_ticks: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FanStatus {
    pub name: Option<String>,
    pub target_speed: f32,
    pub current_speed: f32,
    pub auto_control: bool,
    pub critical: bool,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// 1-based tick counter.
    pub tick: u64,
    pub cpu_temp: f32,
    pub gpu_temp: f32,
    pub fans: Vec<FanStatus>,
}

/// Drives every fan once per poll interval from one thread.
pub struct Runner<E, T, C = MonotonicClock>
where
    E: EmbeddedController,
    T: TemperatureSource,
    C: Clock,
{
    fans: Vec<FanController<E>>,
    requested: Vec<Option<f32>>,
    sensors: T,
    clock: C,
    params: RunParams,
    ticks: u64,
}

impl<E, T, C> Runner<E, T, C>
where
    E: EmbeddedController,
    T: TemperatureSource,
    C: Clock,
{
    pub fn new(fans: Vec<FanController<E>>, sensors: T, clock: C, params: RunParams) -> Self {
        let requested = vec![None; fans.len()];
        Self {
            fans,
            requested,
            sensors,
            clock,
            params,
            ticks: 0,
        }
    }

    pub fn fans(&self) -> &[FanController<E>] {
        &self.fans
    }

    pub fn params(&self) -> &RunParams {
        &self.params
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Manual speed for one fan; `None` returns it to automatic control.
    pub fn set_requested_speed(&mut self, fan: usize, speed: Option<f32>) -> Result<()> {
        let slot = self
            .requested
            .get_mut(fan)
            .ok_or(FanError::UnknownFan(fan))?;
        *slot = speed;
        Ok(())
    }

    /// Same manual speed for every fan.
    pub fn set_requested_speed_all(&mut self, speed: Option<f32>) {
        self.requested.fill(speed);
    }

    pub fn set_fan_enabled(&mut self, fan: usize, enabled: bool) -> Result<()> {
        self.fans
            .get_mut(fan)
            .ok_or(FanError::UnknownFan(fan))?
            .set_fan_enabled(enabled);
        Ok(())
    }

    /// One control step: read sensors, drive every fan, read speeds back.
    pub fn tick(&mut self) -> Result<TickReport> {
        let cpu_temp = self
            .sensors
            .cpu_temperature()
            .map_err(hw_report)
            .wrap_err("failed to read CPU temperature")?;
        // Always sampled: critical mode watches the GPU even for CPU-only fans.
        let gpu_temp = self
            .sensors
            .gpu_temperature()
            .map_err(hw_report)
            .wrap_err("failed to read GPU temperature")?;

        for (fan, requested) in self.fans.iter_mut().zip(&self.requested) {
            let was_critical = fan.critical_mode_enabled();
            fan.set_target_speed(
                requested.unwrap_or(AUTO_FAN_SPEED),
                cpu_temp,
                gpu_temp,
                self.params.read_only,
            )?;
            match (was_critical, fan.critical_mode_enabled()) {
                (false, true) => tracing::warn!(
                    fan = fan.name().unwrap_or("fan"),
                    cpu_temp,
                    gpu_temp,
                    "critical temperature reached, forcing full speed"
                ),
                (true, false) => tracing::info!(
                    fan = fan.name().unwrap_or("fan"),
                    cpu_temp,
                    gpu_temp,
                    "left critical mode"
                ),
                _ => {}
            }
        }
        for fan in &mut self.fans {
            fan.get_current_speed()?;
        }

        self.ticks += 1;
        let report = TickReport {
            tick: self.ticks,
            cpu_temp,
            gpu_temp,
            fans: self
                .fans
                .iter()
                .map(|f| FanStatus {
                    name: f.name().map(str::to_owned),
                    target_speed: f.target_speed(),
                    current_speed: f.current_speed(),
                    auto_control: f.auto_control_enabled(),
                    critical: f.critical_mode_enabled(),
                    enabled: f.fan_enabled(),
                })
                .collect(),
        };
        tracing::debug!(tick = report.tick, cpu_temp, gpu_temp, fans = report.fans.len(), "tick");
        Ok(report)
    }

    /// Tick, then sleep for the poll interval, until `shutdown` is set or the
    /// tick budget is spent. Returns the number of ticks run.
    ///
    /// A failed tick resets every fan before the error is returned.
    pub fn run<F>(&mut self, shutdown: &AtomicBool, mut on_tick: F) -> Result<u64>
    where
        F: FnMut(&TickReport),
    {
        let mut ran = 0u64;
        while !shutdown.load(Ordering::Relaxed) {
            let report = match self.tick() {
                Ok(r) => r,
                Err(e) => {
                    tracing::error!(error = %e, "tick failed, returning fans to firmware control");
                    if let Err(reset_err) = self.reset_all() {
                        tracing::error!(error = %reset_err, "reset after failed tick also failed");
                    }
                    return Err(e);
                }
            };
            on_tick(&report);
            ran += 1;

            if self.params.max_ticks.is_some_and(|max| ran >= max)
                || shutdown.load(Ordering::Relaxed)
            {
                break;
            }
            self.clock.sleep(self.params.poll_interval);
        }
        Ok(ran)
    }

    /// Reset every fan; keeps going past failures and returns the first one.
    pub fn reset_all(&mut self) -> Result<()> {
        let mut first: Option<Report> = None;
        for fan in &mut self.fans {
            if let Err(e) = fan.reset() {
                tracing::warn!(fan = fan.name().unwrap_or("fan"), error = %e, "fan reset failed");
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }
}

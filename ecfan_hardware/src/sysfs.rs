//! Temperatures from Linux sysfs millidegree files (hwmon `temp*_input` or
//! `thermal_zone*/temp`).

use std::fs;
use std::path::{Path, PathBuf};

use ecfan_traits::TemperatureSource;

use crate::error::{HwError, Result};

#[derive(Debug, Clone)]
pub struct SysfsTemperature {
    cpu: PathBuf,
    gpu: Option<PathBuf>,
}

impl SysfsTemperature {
    pub fn new(cpu: impl Into<PathBuf>, gpu: Option<PathBuf>) -> Self {
        Self {
            cpu: cpu.into(),
            gpu,
        }
    }
}

/// Read one millidegree file and convert to degrees Celsius.
pub fn read_millidegrees(path: &Path) -> Result<f32> {
    let content = fs::read_to_string(path).map_err(|e| HwError::Sensor {
        path: path.to_path_buf(),
        reason: format!("failed to read: {e}"),
    })?;
    let milli = content.trim().parse::<i64>().map_err(|e| HwError::Sensor {
        path: path.to_path_buf(),
        reason: format!("failed to parse '{}': {e}", content.trim()),
    })?;
    Ok(milli as f32 / 1000.0)
}

impl TemperatureSource for SysfsTemperature {
    fn cpu_temperature(&mut self) -> std::result::Result<f32, Box<dyn std::error::Error + Send + Sync>> {
        Ok(read_millidegrees(&self.cpu)?)
    }

    fn gpu_temperature(&mut self) -> std::result::Result<f32, Box<dyn std::error::Error + Send + Sync>> {
        match &self.gpu {
            Some(p) => Ok(read_millidegrees(p)?),
            None => Ok(0.0),
        }
    }
}

//! Static description of one physical fan.

use crate::threshold::ThermalBand;

/// Width of the fan speed registers on this machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegisterWidth {
    #[default]
    Byte,
    /// Little-endian word across `register` and `register + 1`.
    Word,
}

impl RegisterWidth {
    pub fn from_words(read_write_words: bool) -> Self {
        if read_write_words { Self::Word } else { Self::Byte }
    }

    pub fn bits(self) -> u8 {
        match self {
            Self::Byte => 8,
            Self::Word => 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideDirection {
    Read,
    Write,
    Both,
}

impl OverrideDirection {
    pub fn applies_to_read(self) -> bool {
        matches!(self, Self::Read | Self::Both)
    }

    pub fn applies_to_write(self) -> bool {
        matches!(self, Self::Write | Self::Both)
    }
}

/// Exact percent <-> raw mapping that bypasses the linear formula, e.g. a
/// firmware "auto" sentinel or a point on a non-linear fan curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedOverride {
    pub percent: f32,
    pub raw_value: u16,
    pub direction: OverrideDirection,
}

impl SpeedOverride {
    pub fn new(percent: f32, raw_value: u16, direction: OverrideDirection) -> Self {
        Self {
            percent,
            raw_value,
            direction,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FanProfile {
    pub name: Option<String>,
    pub write_register: u8,
    pub read_register: u8,
    pub min_write: u16,
    pub max_write: u16,
    /// Independent raw read range; `None` reuses the write range.
    pub read_range: Option<(u16, u16)>,
    pub reset_required: bool,
    pub reset_value: u16,
    pub bands: Vec<ThermalBand>,
    pub overrides: Vec<SpeedOverride>,
    pub is_cpu_fan: bool,
    pub is_gpu_fan: bool,
}

impl FanProfile {
    /// A CPU fan with no bands, overrides or reset action.
    pub fn new(write_register: u8, read_register: u8, min_write: u16, max_write: u16) -> Self {
        Self {
            name: None,
            write_register,
            read_register,
            min_write,
            max_write,
            read_range: None,
            reset_required: false,
            reset_value: 0,
            bands: Vec::new(),
            overrides: Vec::new(),
            is_cpu_fan: true,
            is_gpu_fan: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_read_range(mut self, min_read: u16, max_read: u16) -> Self {
        self.read_range = Some((min_read, max_read));
        self
    }

    pub fn with_reset(mut self, reset_value: u16) -> Self {
        self.reset_required = true;
        self.reset_value = reset_value;
        self
    }

    pub fn with_bands(mut self, bands: impl IntoIterator<Item = ThermalBand>) -> Self {
        self.bands = bands.into_iter().collect();
        self
    }

    pub fn with_overrides(mut self, overrides: impl IntoIterator<Item = SpeedOverride>) -> Self {
        self.overrides = overrides.into_iter().collect();
        self
    }

    pub fn monitoring(mut self, cpu: bool, gpu: bool) -> Self {
        self.is_cpu_fan = cpu;
        self.is_gpu_fan = gpu;
        self
    }

    /// `(min_read, max_read)` as configured (may be inverted).
    pub fn read_bounds(&self) -> (u16, u16) {
        self.read_range.unwrap_or((self.min_write, self.max_write))
    }
}

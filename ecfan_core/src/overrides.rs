//! Exact-match override lookup tables.
//!
//! Percent keys are stored as the bit pattern of the `f32` rather than as a
//! float, which keeps lookups exact without floating-point map keys. `-0.0`
//! is folded into `0.0` so the two compare equal as they do numerically; NaN
//! never equals anything and is therefore dropped.

use std::collections::HashMap;

use crate::profile::SpeedOverride;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PercentKey(u32);

impl PercentKey {
    pub fn new(percent: f32) -> Option<Self> {
        if percent.is_nan() {
            None
        } else if percent == 0.0 {
            Some(Self(0.0f32.to_bits()))
        } else {
            Some(Self(percent.to_bits()))
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OverrideTables {
    write: HashMap<PercentKey, u16>,
    read: HashMap<u16, f32>,
}

impl OverrideTables {
    /// Build both tables; for a repeated key the first declared entry wins.
    pub fn new(overrides: &[SpeedOverride]) -> Self {
        let mut tables = Self::default();
        for o in overrides {
            if o.direction.applies_to_write()
                && let Some(key) = PercentKey::new(o.percent)
            {
                tables.write.entry(key).or_insert(o.raw_value);
            }
            if o.direction.applies_to_read() {
                tables.read.entry(o.raw_value).or_insert(o.percent);
            }
        }
        tables
    }

    pub fn raw_for_percent(&self, percent: f32) -> Option<u16> {
        PercentKey::new(percent).and_then(|k| self.write.get(&k).copied())
    }

    pub fn percent_for_raw(&self, raw: u16) -> Option<f32> {
        self.read.get(&raw).copied()
    }
}

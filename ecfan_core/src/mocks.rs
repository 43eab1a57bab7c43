//! Test and helper mocks for ecfan_core

use std::collections::VecDeque;

/// An embedded controller whose every transaction fails with `message`.
pub struct FailingEc {
    pub message: &'static str,
}

impl ecfan_traits::EmbeddedController for FailingEc {
    fn read_byte(&mut self, _register: u8) -> Result<u8, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other(self.message)))
    }

    fn write_byte(
        &mut self,
        _register: u8,
        _value: u8,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other(self.message)))
    }
}

/// Replays `(cpu, gpu)` samples in order and then repeats the last one.
/// An empty script reports a sensor error.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTemperature {
    samples: VecDeque<(f32, f32)>,
    last: Option<(f32, f32)>,
}

impl ScriptedTemperature {
    pub fn new(samples: impl IntoIterator<Item = (f32, f32)>) -> Self {
        Self {
            samples: samples.into_iter().collect(),
            last: None,
        }
    }

    fn current(&self) -> Result<(f32, f32), Box<dyn std::error::Error + Send + Sync>> {
        self.last.ok_or_else(|| "no temperature sample scripted".into())
    }
}

impl ecfan_traits::TemperatureSource for ScriptedTemperature {
    /// Advances the script; the GPU reading of the same tick uses this sample.
    fn cpu_temperature(&mut self) -> Result<f32, Box<dyn std::error::Error + Send + Sync>> {
        if let Some(s) = self.samples.pop_front() {
            self.last = Some(s);
        }
        Ok(self.current()?.0)
    }

    fn gpu_temperature(&mut self) -> Result<f32, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.current()?.1)
    }
}

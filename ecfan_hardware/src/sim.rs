//! In-memory stand-ins for the embedded controller and temperature sensors.

use std::collections::{HashMap, VecDeque};

use ecfan_traits::{EmbeddedController, TemperatureSource};

/// A 256-register embedded controller held in memory.
///
/// Writes to a register can be mirrored into a second register to imitate
/// firmware that exposes the applied duty cycle at a separate read address.
/// Scripted glitches are returned by the next reads of a register before the
/// stored value.
#[derive(Debug, Clone)]
pub struct SimulatedEc {
    regs: [u8; 256],
    mirrors: HashMap<u8, u8>,
    glitches: HashMap<u8, VecDeque<u8>>,
    writes: Vec<(u8, u8)>,
}

impl Default for SimulatedEc {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedEc {
    pub fn new() -> Self {
        Self {
            regs: [0; 256],
            mirrors: HashMap::new(),
            glitches: HashMap::new(),
            writes: Vec::new(),
        }
    }

    /// Copy every write to `write_register` into `read_register` as well.
    pub fn mirror(mut self, write_register: u8, read_register: u8) -> Self {
        self.mirrors.insert(write_register, read_register);
        self
    }

    /// Queue values returned by upcoming reads of `register`.
    pub fn push_glitches(&mut self, register: u8, values: impl IntoIterator<Item = u8>) {
        self.glitches.entry(register).or_default().extend(values);
    }

    pub fn set(&mut self, register: u8, value: u8) {
        self.regs[register as usize] = value;
    }

    pub fn get(&self, register: u8) -> u8 {
        self.regs[register as usize]
    }

    /// Every byte write in order, as `(register, value)`.
    pub fn writes(&self) -> &[(u8, u8)] {
        &self.writes
    }
}

impl EmbeddedController for SimulatedEc {
    fn read_byte(&mut self, register: u8) -> Result<u8, Box<dyn std::error::Error + Send + Sync>> {
        if let Some(v) = self.glitches.get_mut(&register).and_then(VecDeque::pop_front) {
            tracing::trace!(register, value = v, "simulated ec glitch read");
            return Ok(v);
        }
        Ok(self.regs[register as usize])
    }

    fn write_byte(
        &mut self,
        register: u8,
        value: u8,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::trace!(register, value, "simulated ec write");
        self.regs[register as usize] = value;
        self.writes.push((register, value));
        if let Some(&mirror) = self.mirrors.get(&register) {
            self.regs[mirror as usize] = value;
        }
        Ok(())
    }
}

/// Temperature source that sweeps the CPU reading up and down between `min`
/// and `max` by `step` per read. The GPU reading follows at a fixed offset.
#[derive(Debug, Clone)]
pub struct SimulatedTemperature {
    current: f32,
    min: f32,
    max: f32,
    step: f32,
    rising: bool,
    gpu_offset: f32,
}

impl SimulatedTemperature {
    pub fn new(min: f32, max: f32, step: f32, gpu_offset: f32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            current: min,
            min,
            max,
            step: step.abs(),
            rising: true,
            gpu_offset,
        }
    }

    /// A source that always reports the same temperatures.
    pub fn constant(cpu: f32, gpu: f32) -> Self {
        Self::new(cpu, cpu, 0.0, gpu - cpu)
    }

    fn advance(&mut self) {
        if self.rising {
            self.current += self.step;
            if self.current >= self.max {
                self.current = self.max;
                self.rising = false;
            }
        } else {
            self.current -= self.step;
            if self.current <= self.min {
                self.current = self.min;
                self.rising = true;
            }
        }
    }
}

impl TemperatureSource for SimulatedTemperature {
    fn cpu_temperature(&mut self) -> Result<f32, Box<dyn std::error::Error + Send + Sync>> {
        let t = self.current;
        self.advance();
        Ok(t)
    }

    fn gpu_temperature(&mut self) -> Result<f32, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.current + self.gpu_offset)
    }
}

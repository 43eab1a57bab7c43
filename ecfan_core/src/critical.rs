//! Critical-temperature fail-safe.
//!
//! Enter when either axis exceeds its critical temperature; leave only once
//! both axes are more than `CRITICAL_RELEASE_MARGIN` degrees below it.

pub const CRITICAL_RELEASE_MARGIN: i32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThermalState {
    #[default]
    Normal,
    Critical,
}

#[derive(Debug, Clone)]
pub struct CriticalGuard {
    cpu_critical: i32,
    gpu_critical: i32,
    state: ThermalState,
}

impl CriticalGuard {
    pub fn new(cpu_critical: i32, gpu_critical: i32) -> Self {
        Self {
            cpu_critical,
            gpu_critical,
            state: ThermalState::Normal,
        }
    }

    pub fn state(&self) -> ThermalState {
        self.state
    }

    pub fn is_critical(&self) -> bool {
        self.state == ThermalState::Critical
    }

    /// Feed one temperature sample and return the resulting state.
    pub fn update(&mut self, cpu_temp: f32, gpu_temp: f32) -> ThermalState {
        let cpu_release = (self.cpu_critical - CRITICAL_RELEASE_MARGIN) as f32;
        let gpu_release = (self.gpu_critical - CRITICAL_RELEASE_MARGIN) as f32;

        if self.is_critical() && cpu_temp < cpu_release && gpu_temp < gpu_release {
            self.state = ThermalState::Normal;
        } else if cpu_temp > self.cpu_critical as f32 || gpu_temp > self.gpu_critical as f32 {
            self.state = ThermalState::Critical;
        }
        self.state
    }
}

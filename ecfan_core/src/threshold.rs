//! Hysteresis ladder selecting the active thermal band.
//!
//! Bands are kept in a `Vec` sorted ascending by `cpu_up + gpu_up` with a
//! cursor index. Each call to [`ThresholdLadder::select`] moves the cursor by
//! at most one band, so a sudden jump of several tiers settles over several
//! consecutive samples.

/// Threshold value that can never be reached by a real sensor. Used to
/// disable the axis a fan does not monitor.
pub const NEUTRAL_THRESHOLD: i32 = 200;

/// A (temperature range, duty cycle) pairing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalBand {
    cpu_up: i32,
    cpu_down: i32,
    gpu_up: i32,
    gpu_down: i32,
    speed_percent: f32,
}

impl ThermalBand {
    pub fn new(cpu_up: i32, cpu_down: i32, gpu_up: i32, gpu_down: i32, speed_percent: f32) -> Self {
        let mut band = Self {
            cpu_up,
            cpu_down,
            gpu_up,
            gpu_down,
            speed_percent: 0.0,
        };
        band.set_speed_percent(speed_percent);
        band
    }

    /// Same thresholds on both axes.
    pub fn symmetric(up: i32, down: i32, speed_percent: f32) -> Self {
        Self::new(up, down, up, down, speed_percent)
    }

    pub fn cpu_up(&self) -> i32 {
        self.cpu_up
    }
    pub fn cpu_down(&self) -> i32 {
        self.cpu_down
    }
    pub fn gpu_up(&self) -> i32 {
        self.gpu_up
    }
    pub fn gpu_down(&self) -> i32 {
        self.gpu_down
    }
    pub fn speed_percent(&self) -> f32 {
        self.speed_percent
    }

    /// Clamp into [0, 100]; NaN is stored as 0.
    pub fn set_speed_percent(&mut self, speed_percent: f32) {
        self.speed_percent = if speed_percent.is_nan() {
            0.0
        } else {
            speed_percent.clamp(0.0, 100.0)
        };
    }

    pub(crate) fn neutralize_cpu(&mut self) {
        self.cpu_up = NEUTRAL_THRESHOLD;
        self.cpu_down = NEUTRAL_THRESHOLD;
    }

    pub(crate) fn neutralize_gpu(&mut self) {
        self.gpu_up = NEUTRAL_THRESHOLD;
        self.gpu_down = NEUTRAL_THRESHOLD;
    }

    fn up_sum(&self) -> i64 {
        i64::from(self.cpu_up) + i64::from(self.gpu_up)
    }
}

/// Ladder used when a fan declares no bands of its own.
pub fn default_bands() -> Vec<ThermalBand> {
    vec![
        ThermalBand::symmetric(60, 0, 0.0),
        ThermalBand::symmetric(63, 48, 10.0),
        ThermalBand::symmetric(66, 55, 20.0),
        ThermalBand::symmetric(68, 59, 50.0),
        ThermalBand::symmetric(71, 63, 70.0),
        ThermalBand::symmetric(75, 67, 100.0),
    ]
}

#[derive(Debug, Clone, Default)]
pub struct ThresholdLadder {
    bands: Vec<ThermalBand>,
    current: Option<usize>,
}

impl ThresholdLadder {
    /// Build the ladder; ties on `cpu_up + gpu_up` keep declaration order.
    pub fn new(bands: impl IntoIterator<Item = ThermalBand>) -> Self {
        let mut bands: Vec<ThermalBand> = bands.into_iter().collect();
        bands.sort_by_key(ThermalBand::up_sum);
        Self {
            bands,
            current: None,
        }
    }

    pub fn bands(&self) -> &[ThermalBand] {
        &self.bands
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.current
    }

    /// The current band, without stepping.
    pub fn selected(&self) -> Option<&ThermalBand> {
        self.current.and_then(|i| self.bands.get(i))
    }

    /// Step at most one band toward the given temperatures and return the
    /// resulting band. `None` only for an empty ladder.
    pub fn select(&mut self, cpu_temp: f32, gpu_temp: f32) -> Option<&ThermalBand> {
        if self.bands.is_empty() {
            return None;
        }
        let idx = self.current.unwrap_or(0);
        let cur = &self.bands[idx];

        let next = if cpu_temp <= cur.cpu_down as f32 && gpu_temp <= cur.gpu_down as f32 {
            idx.saturating_sub(1)
        } else if let Some(hotter) = self.bands.get(idx + 1)
            && (cpu_temp >= hotter.cpu_up as f32 || gpu_temp >= hotter.gpu_up as f32)
        {
            idx + 1
        } else {
            idx
        };

        if Some(next) != self.current {
            tracing::trace!(from = ?self.current, to = next, cpu_temp, gpu_temp, "thermal band change");
        }
        self.current = Some(next);
        self.bands.get(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ladder() -> ThresholdLadder {
        ThresholdLadder::new([
            ThermalBand::symmetric(70, 60, 100.0),
            ThermalBand::symmetric(30, 20, 20.0),
            ThermalBand::symmetric(50, 40, 60.0),
        ])
    }

    fn speed(l: &mut ThresholdLadder, cpu: f32, gpu: f32) -> f32 {
        l.select(cpu, gpu).map(ThermalBand::speed_percent).unwrap()
    }

    #[test]
    fn walks_the_ladder_one_step_at_a_time() {
        let mut l = ladder();
        assert_eq!(l.selected(), None);
        assert_eq!(speed(&mut l, 25.0, 0.0), 20.0);
        assert_eq!(speed(&mut l, 55.0, 0.0), 60.0);
        assert_eq!(speed(&mut l, 75.0, 0.0), 100.0);
        assert_eq!(speed(&mut l, 65.0, 0.0), 100.0);
        assert_eq!(speed(&mut l, 35.0, 0.0), 60.0);
        assert_eq!(speed(&mut l, 15.0, 0.0), 20.0);
        assert_eq!(l.selected_index(), Some(0));
    }

    #[test]
    fn large_jump_needs_several_samples() {
        let mut l = ladder();
        assert_eq!(speed(&mut l, 99.0, 0.0), 60.0);
        assert_eq!(speed(&mut l, 99.0, 0.0), 100.0);
        assert_eq!(speed(&mut l, 0.0, 0.0), 60.0);
        assert_eq!(speed(&mut l, 0.0, 0.0), 20.0);
        assert_eq!(speed(&mut l, 0.0, 0.0), 20.0);
    }

    #[test]
    fn gpu_alone_can_raise_but_both_must_fall() {
        let mut l = ladder();
        l.select(0.0, 0.0);
        assert_eq!(speed(&mut l, 0.0, 50.0), 60.0);
        assert_eq!(speed(&mut l, 0.0, 45.0), 60.0, "gpu above down threshold holds");
        assert_eq!(speed(&mut l, 45.0, 0.0), 60.0, "cpu above down threshold holds");
        assert_eq!(speed(&mut l, 40.0, 40.0), 20.0);
    }

    #[test]
    fn empty_and_single_band_ladders() {
        let mut empty = ThresholdLadder::new([]);
        assert!(empty.select(90.0, 90.0).is_none());
        assert!(empty.is_empty());

        let mut one = ThresholdLadder::new([ThermalBand::symmetric(60, 50, 40.0)]);
        for t in [0.0, 100.0, 55.0, -10.0] {
            assert_eq!(speed(&mut one, t, t), 40.0);
        }
    }

    #[test]
    fn equal_sums_keep_declaration_order() {
        let l = ThresholdLadder::new([
            ThermalBand::new(60, 50, 40, 30, 1.0),
            ThermalBand::new(40, 30, 60, 50, 2.0),
            ThermalBand::symmetric(10, 0, 3.0),
        ]);
        let speeds: Vec<f32> = l.bands().iter().map(ThermalBand::speed_percent).collect();
        assert_eq!(speeds, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn speed_is_clamped_on_assignment() {
        assert_eq!(ThermalBand::symmetric(1, 0, 150.0).speed_percent(), 100.0);
        assert_eq!(ThermalBand::symmetric(1, 0, -3.0).speed_percent(), 0.0);
        assert_eq!(ThermalBand::symmetric(1, 0, f32::NAN).speed_percent(), 0.0);
    }

    #[test]
    fn neutralized_axis_never_triggers() {
        let mut b = ThermalBand::symmetric(50, 40, 60.0);
        b.neutralize_gpu();
        let mut l = ThresholdLadder::new([ThermalBand::symmetric(0, 0, 0.0), b]);
        l.select(0.0, 0.0);
        assert_eq!(speed(&mut l, 0.0, 150.0), 0.0);
        assert_eq!(speed(&mut l, 50.0, 0.0), 60.0);
    }
}

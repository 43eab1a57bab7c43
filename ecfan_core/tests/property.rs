use ecfan_core::{FanController, FanProfile, RegisterWidth, ThermalBand, ThresholdLadder};
use ecfan_hardware::SimulatedEc;
use proptest::prelude::*;

prop_compose! {
    fn band_strategy()(
        cpu_down in 0i32..90,
        cpu_gap in 0i32..20,
        gpu_down in 0i32..90,
        gpu_gap in 0i32..20,
        speed in 0f32..=100.0,
    ) -> ThermalBand {
        ThermalBand::new(cpu_down + cpu_gap, cpu_down, gpu_down + gpu_gap, gpu_down, speed)
    }
}

proptest! {
    #[test]
    fn ladder_moves_at_most_one_band_per_sample(
        bands in prop::collection::vec(band_strategy(), 1..8),
        temps in prop::collection::vec((-20f32..130.0, -20f32..130.0), 1..64),
    ) {
        let mut ladder = ThresholdLadder::new(bands);
        let mut prev: Option<usize> = None;
        for (cpu, gpu) in temps {
            prop_assert!(ladder.select(cpu, gpu).is_some());
            let now = ladder.selected_index().unwrap();
            let from = prev.unwrap_or(0);
            prop_assert!(now.abs_diff(from) <= 1, "jumped from {from} to {now}");
            prev = Some(now);
        }
    }

    #[test]
    fn encode_then_decode_is_within_one_raw_unit(
        min in 0u16..=255,
        max in 0u16..=255,
        percent in 0f32..=100.0,
    ) {
        let fan = FanController::new(
            FanProfile::new(0x10, 0x10, min, max),
            SimulatedEc::new(),
            90,
            90,
            RegisterWidth::Byte,
        );
        let raw = fan.percent_to_raw(percent).unwrap();
        prop_assert!(raw >= min.min(max) && raw <= min.max(max));
        if min != max {
            let back = fan.percent_to_raw(fan.raw_to_percent(raw)).unwrap();
            prop_assert!(back.abs_diff(raw) <= 1, "raw {raw} came back as {back}");
        }
    }

    #[test]
    fn word_width_accepts_full_u16_range(max in 256u16..=u16::MAX, percent in 0f32..=100.0) {
        let fan = FanController::new(
            FanProfile::new(0x10, 0x10, 0, max),
            SimulatedEc::new(),
            90,
            90,
            RegisterWidth::Word,
        );
        prop_assert!(fan.percent_to_raw(percent).unwrap() <= max);
    }
}

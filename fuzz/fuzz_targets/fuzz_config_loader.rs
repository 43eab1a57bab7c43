#![no_main]
use libfuzzer_sys::fuzz_target;

use ecfan_core::build_controllers;
use ecfan_hardware::{SharedEc, SimulatedEc};

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    let Ok(cfg) = ecfan_config::load_toml(data) else {
        return;
    };
    let _ = cfg.warnings();
    if cfg.validate().is_err() {
        return;
    }
    // Anything validate() accepts must drive the controllers without panicking.
    let ec = SharedEc::new(SimulatedEc::new());
    for mut fan in build_controllers(&cfg, &ec) {
        for t in [0.0, 45.0, 90.0, 120.0, 30.0] {
            let _ = fan.set_target_speed(ecfan_core::AUTO_FAN_SPEED, t, t, false);
            let _ = fan.get_current_speed();
        }
        let _ = fan.reset();
    }
});

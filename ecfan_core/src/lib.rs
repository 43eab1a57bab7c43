#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core fan control logic (hardware-agnostic).
//!
//! All hardware access goes through `ecfan_traits::EmbeddedController` and
//! `ecfan_traits::TemperatureSource`.
//!
//! ## Architecture
//!
//! - **Ladder**: hysteresis band selection, one step per sample (`threshold` module)
//! - **Fan**: percent/raw encoding, overrides, critical fail-safe (`fan` module)
//! - **Runner**: poll loop driving every fan from one thread (`runner` module)
//! - **Conversions**: `ecfan_config` -> core types (`conversions` module)
//!
//! ## Automatic control
//!
//! A requested speed outside `[0, 100]` (conventionally [`AUTO_FAN_SPEED`])
//! lets the ladder pick the duty cycle. NaN selects neither mode and surfaces
//! as [`FanError::PercentOutOfRange`] when the speed is written.

pub mod conversions;
pub mod critical;
pub mod error;
pub mod fan;
pub mod hw_error;
pub mod mocks;
pub mod overrides;
pub mod profile;
pub mod runner;
pub mod threshold;

pub use conversions::build_controllers;
pub use critical::{CRITICAL_RELEASE_MARGIN, CriticalGuard, ThermalState};
pub use error::{FanError, Report, Result};
pub use fan::{FanController, READ_ATTEMPTS};
pub use profile::{FanProfile, OverrideDirection, RegisterWidth, SpeedOverride};
pub use runner::{AUTO_FAN_SPEED, FanStatus, RunParams, Runner, TickReport};
pub use threshold::{NEUTRAL_THRESHOLD, ThermalBand, ThresholdLadder, default_bands};

//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "ecfan", version, about = "Notebook fan control through the embedded controller")]
pub struct Cli {
    /// Path to config TOML
    #[arg(long, value_name = "FILE", default_value = "etc/ecfan.toml")]
    pub config: PathBuf,

    /// Log and print status as JSON lines
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); RUST_LOG wins when set
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the control loop until Ctrl-C or the tick budget is spent
    Run {
        /// Fixed fan speed in percent for every fan; omit (or >100) for automatic control
        #[arg(long, value_name = "PCT", allow_negative_numbers = true)]
        speed: Option<f32>,
        /// Stop after this many ticks
        #[arg(long, value_name = "N")]
        ticks: Option<u64>,
        /// Override poll_interval_ms from the config
        #[arg(long, value_name = "MS")]
        interval_ms: Option<u64>,
        /// Never write the EC (overrides read_only = false in the config)
        #[arg(long, action = ArgAction::SetTrue)]
        read_only: bool,
    },
    /// Read temperatures and fan speeds once without writing
    Status,
    /// Validate the config and print warnings
    Check,
    /// Hand every fan back to firmware control
    Reset,
}

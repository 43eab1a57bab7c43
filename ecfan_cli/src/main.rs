mod cli;
mod error_fmt;
mod run;

use std::path::Path;

use clap::Parser;
use eyre::WrapErr;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{ConfigInvalid, exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if let Err(e) = color_eyre::install() {
        eprintln!("failed to install error report handler: {e}");
    }

    if let Err(err) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        tracing::error!(error = %err, "exiting with error");
        std::process::exit(exit_code_for_error(&err));
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    // Logging depends on the [logging] section, so load first and report
    // config failures after the subscriber is up.
    let loaded = ecfan_config::load_file(&cli.config).wrap_err(ConfigInvalid);
    init_tracing(
        cli.json,
        &cli.log_level,
        loaded.as_ref().ok().map(|c| &c.logging),
    );
    let cfg = loaded?;
    tracing::debug!(config = %cli.config.display(), fans = cfg.fans.len(), "config loaded");

    match cli.cmd {
        Commands::Check => {
            for w in cfg.warnings() {
                println!("warning: {w}");
            }
            println!("config ok");
            Ok(())
        }
        Commands::Run {
            speed,
            ticks,
            interval_ms,
            read_only,
        } => run::run_loop(&cfg, speed, ticks, interval_ms, read_only, cli.json),
        Commands::Status => run::status(&cfg, cli.json),
        Commands::Reset => run::reset(&cfg),
    }
}

fn console_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Console logs go to stderr so stdout carries only status output.
fn init_tracing(json: bool, level: &str, logging: Option<&ecfan_config::Logging>) {
    let pretty = (!json).then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(console_filter(level))
    });
    let json_console = json.then(|| {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(console_filter(level))
    });

    let file = logging.and_then(|l| {
        let path = l.file.as_deref()?;
        match file_appender(path, l.rotation.as_deref()) {
            Ok(appender) => {
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let _ = FILE_GUARD.set(guard);
                let file_level = l.level.as_deref().unwrap_or("info");
                Some(
                    fmt::layer()
                        .json()
                        .with_ansi(false)
                        .with_writer(writer)
                        .with_filter(EnvFilter::new(file_level)),
                )
            }
            Err(e) => {
                eprintln!("file logging disabled: {e}");
                None
            }
        }
    });

    let _ = tracing_subscriber::registry()
        .with(pretty)
        .with(json_console)
        .with(file)
        .try_init();
}

fn file_appender(path: &str, rotation: Option<&str>) -> eyre::Result<RollingFileAppender> {
    let path = Path::new(path);
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .ok_or_else(|| eyre::eyre!("log file path {} has no file name", path.display()))?;
    let rotation = match rotation.unwrap_or("never") {
        "daily" => Rotation::DAILY,
        "hourly" => Rotation::HOURLY,
        "never" => Rotation::NEVER,
        other => eyre::bail!("unknown log rotation {other:?} (expected never|daily|hourly)"),
    };
    RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(name.to_string_lossy().into_owned())
        .build(dir)
        .wrap_err_with(|| format!("create log directory {}", dir.display()))
}

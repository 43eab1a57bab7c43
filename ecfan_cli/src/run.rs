//! Backend assembly and command execution.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use ecfan_config::{Backend, Config};
use ecfan_core::{RunParams, Runner, TickReport, build_controllers};
use ecfan_hardware::{
    DEFAULT_EC_IO_PATH, DebugfsEc, DevPort, PortIoEc, SharedEc, SimulatedEc, SimulatedTemperature,
    SysfsTemperature,
};
use ecfan_traits::{EmbeddedController, MonotonicClock, TemperatureSource};
use eyre::WrapErr;

pub type DynEc = Box<dyn EmbeddedController + Send>;
pub type DynSensors = Box<dyn TemperatureSource + Send>;
pub type CliRunner = Runner<SharedEc<DynEc>, DynSensors, MonotonicClock>;

/// Open the configured embedded controller behind one shared handle.
pub fn open_ec(cfg: &Config) -> eyre::Result<SharedEc<DynEc>> {
    let ec: DynEc = match cfg.hardware.backend {
        Backend::Sim => Box::new(simulated_ec(cfg)),
        Backend::Debugfs => {
            let path = cfg.hardware.ec_path.as_deref().unwrap_or(DEFAULT_EC_IO_PATH);
            Box::new(DebugfsEc::open(path).wrap_err_with(|| format!("open EC at {path}"))?)
        }
        Backend::Port => {
            let ports = DevPort::open().wrap_err("open /dev/port")?;
            Box::new(PortIoEc::new(
                ports,
                Duration::from_millis(cfg.hardware.timeout_ms),
            ))
        }
    };
    tracing::info!(backend = ?cfg.hardware.backend, "embedded controller ready");
    Ok(SharedEc::new(ec))
}

/// In-memory EC whose read registers follow the write registers, so reads
/// reflect what was last written.
fn simulated_ec(cfg: &Config) -> SimulatedEc {
    let mut ec = SimulatedEc::new();
    for fan in cfg.fans.iter().filter(|f| f.write_register != f.read_register) {
        ec = ec.mirror(fan.write_register, fan.read_register);
        if cfg.read_write_words
            && let (Some(w), Some(r)) = (
                fan.write_register.checked_add(1),
                fan.read_register.checked_add(1),
            )
        {
            ec = ec.mirror(w, r);
        }
    }
    ec
}

pub fn open_sensors(cfg: &Config) -> eyre::Result<DynSensors> {
    if cfg.hardware.backend == Backend::Sim {
        let s = &cfg.sim;
        return Ok(Box::new(SimulatedTemperature::new(
            s.min_temp,
            s.max_temp,
            s.step,
            s.gpu_offset,
        )));
    }
    let cpu = cfg
        .sensors
        .cpu
        .as_deref()
        .ok_or_else(|| eyre::eyre!("[sensors] cpu is required for the {:?} backend", cfg.hardware.backend))?;
    Ok(Box::new(SysfsTemperature::new(
        cpu,
        cfg.sensors.gpu.as_deref().map(PathBuf::from),
    )))
}

pub fn build_runner(cfg: &Config, params: RunParams) -> eyre::Result<CliRunner> {
    let ec = open_ec(cfg)?;
    let sensors = open_sensors(cfg)?;
    let fans = build_controllers(cfg, &ec);
    Ok(Runner::new(fans, sensors, MonotonicClock::new(), params))
}

/// `run`: poll loop until Ctrl-C or the tick budget; fans are reset on exit.
pub fn run_loop(
    cfg: &Config,
    speed: Option<f32>,
    ticks: Option<u64>,
    interval_ms: Option<u64>,
    read_only: bool,
    json: bool,
) -> eyre::Result<()> {
    let mut params = RunParams::from(cfg);
    params.max_ticks = ticks;
    params.read_only |= read_only;
    if let Some(ms) = interval_ms {
        params.poll_interval = Duration::from_millis(ms);
    }

    let mut runner = build_runner(cfg, params)?;
    runner.set_requested_speed_all(speed);

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
        tracing::warn!(error = %e, "failed to install Ctrl-C handler");
    }

    tracing::info!(
        fans = runner.fans().len(),
        interval_ms = params.poll_interval.as_millis() as u64,
        read_only = params.read_only,
        "control loop start"
    );
    let ran = runner.run(&shutdown, |report| print_report(report, json))?;
    tracing::info!(ticks = ran, "control loop stopped");

    if !params.read_only {
        runner.reset_all()?;
    }
    Ok(())
}

/// `status`: one read-only tick.
pub fn status(cfg: &Config, json: bool) -> eyre::Result<()> {
    let params = RunParams {
        read_only: true,
        max_ticks: Some(1),
        ..RunParams::from(cfg)
    };
    let mut runner = build_runner(cfg, params)?;
    let report = runner.tick()?;
    if json {
        print_report(&report, true);
    } else {
        println!("cpu: {:.1} C", report.cpu_temp);
        println!("gpu: {:.1} C", report.gpu_temp);
        for fan in &report.fans {
            println!(
                "{}: {:.1}%",
                fan.name.as_deref().unwrap_or("fan"),
                fan.current_speed
            );
        }
    }
    Ok(())
}

/// `reset`: hand every fan back to firmware control.
pub fn reset(cfg: &Config) -> eyre::Result<()> {
    let mut runner = build_runner(cfg, RunParams::from(cfg))?;
    runner.reset_all()?;
    println!("reset {} fan(s)", runner.fans().len());
    Ok(())
}

fn print_report(report: &TickReport, json: bool) {
    if json {
        let fans: Vec<_> = report
            .fans
            .iter()
            .map(|f| {
                serde_json::json!({
                    "name": f.name,
                    "target": f.target_speed,
                    "current": f.current_speed,
                    "auto": f.auto_control,
                    "critical": f.critical,
                    "enabled": f.enabled,
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::json!({
                "tick": report.tick,
                "cpu": report.cpu_temp,
                "gpu": report.gpu_temp,
                "fans": fans,
            })
        );
        return;
    }
    for f in &report.fans {
        let mode = if f.critical {
            " CRITICAL"
        } else if f.auto_control {
            " auto"
        } else {
            ""
        };
        println!(
            "[{}] {}: target {:.1}% current {:.1}% (cpu {:.1} C, gpu {:.1} C){}",
            report.tick,
            f.name.as_deref().unwrap_or("fan"),
            f.target_speed,
            f.current_speed,
            report.cpu_temp,
            report.gpu_temp,
            mode
        );
    }
}

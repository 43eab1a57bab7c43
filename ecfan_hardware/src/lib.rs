//! Embedded controller and temperature backends for `ecfan`.
//!
//! - `SimulatedEc` / `SimulatedTemperature`: in-memory backends for dry runs and tests.
//! - `SharedEc`: mutex-serialised handle shared by every fan on one EC.
//! - `DebugfsEc`: Linux `ec_sys` debugfs register file.
//! - `PortIoEc`: ACPI EC command protocol over ports 0x62/0x66.
//! - `SysfsTemperature`: hwmon / thermal zone millidegree files.
pub mod debugfs;
pub mod error;
pub mod port_io;
pub mod shared;
pub mod sim;
pub mod sysfs;
pub mod util;

pub use debugfs::{DEFAULT_EC_IO_PATH, DebugfsEc};
pub use port_io::{DevPort, PortIo, PortIoEc};
pub use shared::SharedEc;
pub use sim::{SimulatedEc, SimulatedTemperature};
pub use sysfs::SysfsTemperature;

//! Sysfs GPIO actuator driver.
//!
//! Talks to the kernel GPIO interface under `/sys/class/gpio`: two output
//! lines drive the motor (energizing A closes, B opens), two input lines
//! read the limit switches. `probe` fails with `HardwareUnavailable` on
//! machines without the GPIO tree, and the runtime falls back to
//! simulation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::GpioConfig;
use crate::domain::actuator::{DriveDirection, SensorState};
use crate::error::AccessError;
use crate::ports::outbound::ActuatorDriver;

const SYSFS_ROOT: &str = "/sys/class/gpio";

/// One exported GPIO line.
#[derive(Debug)]
struct SysfsPin {
    number: u32,
    value_path: PathBuf,
}

impl SysfsPin {
    fn export(root: &Path, number: u32, direction: &str) -> io::Result<Self> {
        let pin_dir = root.join(format!("gpio{number}"));
        if !pin_dir.exists() {
            fs::write(root.join("export"), number.to_string())?;
            // The kernel creates the pin directory asynchronously.
            for _ in 0..10 {
                if pin_dir.exists() {
                    break;
                }
                thread::sleep(Duration::from_millis(10));
            }
        }
        fs::write(pin_dir.join("direction"), direction)?;
        Ok(Self {
            number,
            value_path: pin_dir.join("value"),
        })
    }

    fn write(&self, high: bool) -> io::Result<()> {
        fs::write(&self.value_path, if high { "1" } else { "0" })
    }

    fn read(&self) -> io::Result<bool> {
        let raw = fs::read_to_string(&self.value_path)?;
        Ok(raw.trim() == "1")
    }
}

/// Actuator driver over the Linux sysfs GPIO interface.
#[derive(Debug)]
pub struct SysfsGpioDriver {
    drive_a: SysfsPin,
    drive_b: SysfsPin,
    sensor_open: SysfsPin,
    sensor_closed: SysfsPin,
}

impl SysfsGpioDriver {
    /// Export and configure the four lines from `config`.
    ///
    /// Any failure (no GPIO tree, permissions, bad pin numbers) yields
    /// `HardwareUnavailable` so the caller can select simulation instead.
    pub fn probe(config: &GpioConfig) -> Result<Self, AccessError> {
        Self::probe_at(Path::new(SYSFS_ROOT), config)
    }

    fn probe_at(root: &Path, config: &GpioConfig) -> Result<Self, AccessError> {
        let unavailable = |err: io::Error| AccessError::HardwareUnavailable {
            reason: err.to_string(),
        };

        if !root.exists() {
            return Err(AccessError::HardwareUnavailable {
                reason: format!("{} not present", root.display()),
            });
        }

        let drive_a = SysfsPin::export(root, config.pin_a, "out").map_err(unavailable)?;
        let drive_b = SysfsPin::export(root, config.pin_b, "out").map_err(unavailable)?;
        let sensor_open = SysfsPin::export(root, config.sensor_open, "in").map_err(unavailable)?;
        let sensor_closed =
            SysfsPin::export(root, config.sensor_closed, "in").map_err(unavailable)?;

        let driver = Self {
            drive_a,
            drive_b,
            sensor_open,
            sensor_closed,
        };
        // Start from a known de-energized state.
        driver.de_energize();
        debug!(
            "[actuator] GPIO ready: drive a={} b={}, sensors open={} closed={}",
            config.pin_a, config.pin_b, config.sensor_open, config.sensor_closed
        );
        Ok(driver)
    }

    fn set_lines(&self, a: bool, b: bool) {
        if let Err(err) = self.drive_a.write(a) {
            warn!("[actuator] failed writing gpio{}: {err}", self.drive_a.number);
        }
        if let Err(err) = self.drive_b.write(b) {
            warn!("[actuator] failed writing gpio{}: {err}", self.drive_b.number);
        }
    }
}

impl ActuatorDriver for SysfsGpioDriver {
    fn is_available(&self) -> bool {
        true
    }

    fn energize(&self, direction: DriveDirection) {
        match direction {
            DriveDirection::Close => self.set_lines(true, false),
            DriveDirection::Open => self.set_lines(false, true),
        }
    }

    fn de_energize(&self) {
        self.set_lines(false, false);
    }

    fn read_sensor(&self) -> SensorState {
        let open = self.sensor_open.read();
        let closed = self.sensor_closed.read();
        match (open, closed) {
            (Ok(true), Ok(false)) => SensorState::Open,
            (Ok(false), Ok(true)) => SensorState::Closed,
            (Ok(_), Ok(_)) => SensorState::Indeterminate,
            (Err(err), _) | (_, Err(err)) => {
                warn!("[actuator] sensor read failed: {err}");
                SensorState::Indeterminate
            }
        }
    }
}

impl Drop for SysfsGpioDriver {
    fn drop(&mut self) {
        // Cut power before the lines go away.
        self.de_energize();
    }
}

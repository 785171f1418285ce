//! Actuator control with limit-sensor confirmation.
//!
//! Driving and confirming are split so the type system enforces the safety
//! rule: a drive command hands back a [`DriveGuard`], and the only way to
//! wait for confirmation is to surrender the guard to
//! [`ActuatorController::confirm`], which drops it on every path — success,
//! timeout, or panic. A stuck sensor therefore never leaves the motor
//! powered.

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::AccessError;
use crate::ports::outbound::ActuatorDriver;

/// Default confirmation timeout.
pub const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(8);

/// Default sensor poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Drive line polarity for the two motions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveDirection {
    /// Turn towards the open limit.
    Open,
    /// Turn towards the closed limit.
    Close,
}

/// What the limit sensors report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorState {
    /// Open sensor active, closed sensor inactive.
    Open,
    /// Closed sensor active, open sensor inactive.
    Closed,
    /// Both or neither sensor active; the mechanism is mid-travel or wired
    /// wrong.
    Indeterminate,
    /// No hardware capability.
    Unavailable,
}

impl fmt::Display for SensorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorState::Open => write!(f, "open"),
            SensorState::Closed => write!(f, "closed"),
            SensorState::Indeterminate => write!(f, "indeterminate"),
            SensorState::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Scoped energization: power is cut when the guard drops.
#[must_use = "dropping the guard immediately releases the drive"]
pub struct DriveGuard<'a> {
    driver: &'a dyn ActuatorDriver,
}

impl Drop for DriveGuard<'_> {
    fn drop(&mut self) {
        self.driver.de_energize();
        debug!("[actuator] drive released");
    }
}

/// Drives the physical lock and waits for sensor confirmation.
pub struct ActuatorController {
    driver: Arc<dyn ActuatorDriver>,
    confirm_timeout: Duration,
    poll_interval: Duration,
}

impl ActuatorController {
    /// Wrap a driver with the given confirmation timing.
    pub fn new(
        driver: Arc<dyn ActuatorDriver>,
        confirm_timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            driver,
            confirm_timeout,
            poll_interval,
        }
    }

    /// Wrap a driver with default timing.
    pub fn with_defaults(driver: Arc<dyn ActuatorDriver>) -> Self {
        Self::new(driver, DEFAULT_CONFIRM_TIMEOUT, DEFAULT_POLL_INTERVAL)
    }

    /// Whether real hardware capability is present.
    pub fn is_available(&self) -> bool {
        self.driver.is_available()
    }

    /// Energize towards the open limit.
    pub fn drive_open(&self) -> DriveGuard<'_> {
        self.drive(DriveDirection::Open)
    }

    /// Energize towards the closed limit.
    pub fn drive_close(&self) -> DriveGuard<'_> {
        self.drive(DriveDirection::Close)
    }

    fn drive(&self, direction: DriveDirection) -> DriveGuard<'_> {
        debug!("[actuator] energizing {direction:?}");
        self.driver.energize(direction);
        DriveGuard {
            driver: &*self.driver,
        }
    }

    /// Poll the sensors until they report `target` or the timeout elapses.
    ///
    /// Consumes the guard: the drive is de-energized when this returns, no
    /// matter how it returns. A timeout is reported to the caller, who
    /// decides whether to continue (the engine does, optimistically).
    pub fn confirm(&self, drive: DriveGuard<'_>, target: SensorState) -> Result<(), AccessError> {
        let _release_on_exit = drive;
        let started = Instant::now();
        loop {
            if self.driver.read_sensor() == target {
                return Ok(());
            }
            let waited = started.elapsed();
            if waited >= self.confirm_timeout {
                return Err(AccessError::SensorTimeout { target, waited });
            }
            thread::sleep(self.poll_interval);
        }
    }
}

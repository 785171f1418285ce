//! Outbound (driven) ports: what the access core requires from its host.

use chrono::{DateTime, Utc};

use crate::domain::actuator::{DriveDirection, SensorState};
use crate::domain::entities::{
    BearerCategory, BearerRecord, BlockKind, IneligibleRegistration, ObfuscatedId, ProfileData,
    RecordedAction,
};
use crate::error::{AccessError, StoreError};

/// Raw actuator hardware: two drive lines and two limit sensors.
///
/// Production: `SysfsGpioDriver` (`adapters::gpio`).
/// Simulation/tests: `SimulatedDriver` (`adapters::sim`),
/// `ScriptedDriver` (`test_support`).
pub trait ActuatorDriver: Send + Sync {
    /// Whether real hardware capability is present. `false` routes the
    /// decision engine through the simulation path.
    fn is_available(&self) -> bool;

    /// Energize the drive lines in the given direction. No-op when
    /// capability is absent.
    fn energize(&self, direction: DriveDirection);

    /// Cut power to both drive lines. Must be safe to call at any time,
    /// including when already de-energized.
    fn de_energize(&self);

    /// Read the limit sensors.
    fn read_sensor(&self) -> SensorState;
}

/// Persistent record of known bearers — a single-writer synchronous store.
///
/// Scan keys are unique and are the identity key; obfuscated identifiers
/// are the lookup key for bike-state operations and are only unique-ish —
/// the obfuscation drops foreign characters, so distinct identifiers can
/// collide.
pub trait IdentityStore: Send + Sync {
    /// Whether a bearer with this scan key exists in the category.
    fn contains_scan_key(
        &self,
        scan_key: &str,
        category: BearerCategory,
    ) -> Result<bool, StoreError>;

    /// The plain identifier of the bearer with this scan key, revealed from
    /// its stored obfuscated form. `None` when the scan key is unknown.
    fn identifier_for_scan_key(
        &self,
        scan_key: &str,
        category: BearerCategory,
    ) -> Result<Option<String>, StoreError>;

    /// Current bike-stored flag for an identifier; `false` for unknown
    /// bearers (a new bearer has nothing checked in).
    fn bike_stored(
        &self,
        identifier: &ObfuscatedId,
        category: BearerCategory,
    ) -> Result<bool, StoreError>;

    /// Overwrite the bike-stored flag for an identifier.
    fn set_bike_stored(
        &self,
        identifier: &ObfuscatedId,
        category: BearerCategory,
        stored: bool,
    ) -> Result<(), StoreError>;

    /// Compare an entered PIN against the stored one. Unknown identifiers
    /// never validate.
    fn validate_pin(
        &self,
        identifier: &ObfuscatedId,
        category: BearerCategory,
        pin: &str,
    ) -> Result<bool, StoreError>;

    /// Record a realized action for the bearer with this scan key: updates
    /// `last_action`, stamps `last_event_time`, and synchronizes
    /// `bike_stored` with the action.
    fn record_action(
        &self,
        scan_key: &str,
        category: BearerCategory,
        action: RecordedAction,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Insert a newly registered bearer. Inserting an already-known scan
    /// key is a no-op, matching the one-time-creation lifecycle.
    fn insert(&self, record: BearerRecord) -> Result<(), StoreError>;
}

/// Retrieval and extraction of a bearer's profile page.
pub trait ProfileFetcher: Send + Sync {
    /// Fetch and parse the profile behind a scan key.
    ///
    /// Network/HTTP failures surface as [`AccessError::Scrape`]; a missing
    /// identifier as [`AccessError::Extraction`].
    fn fetch(&self, scan_key: &str, category: BearerCategory) -> Result<ProfileData, AccessError>;
}

/// Denylist lookups by scan key or plain identifier.
pub trait Blocklist: Send + Sync {
    /// Whether the value is denylisted under the given kind. Adapters fail
    /// open: an unreadable or absent blocklist blocks nothing.
    fn is_blocked(&self, kind: BlockKind, value: &str) -> bool;
}

/// Append-only sink for registrants who failed eligibility.
pub trait OverflowStore: Send + Sync {
    /// Append one ineligible registration.
    fn record(&self, registration: &IneligibleRegistration) -> Result<(), StoreError>;
}

/// Interactive PIN entry for exits.
pub trait PinEntry: Send + Sync {
    /// Ask the bearer for their PIN.
    fn read_pin(&self, identifier: &str) -> Result<String, AccessError>;
}

/// Clock abstraction so tests control event timestamps.
pub trait TimeSource: Send + Sync {
    /// Current wall-clock time.
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Default time source using the system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

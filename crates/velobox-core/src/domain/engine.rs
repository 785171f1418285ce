//! The entry/exit/deny decision engine.
//!
//! Per-bearer state machine over the persisted bike-stored flag. Exits are
//! gated behind a PIN; entries are not. The actuator motion for a decision
//! always completes (or times out) before the flag is rewritten, and a
//! denial touches neither the actuator nor the store.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::actuator::{ActuatorController, SensorState};
use crate::domain::entities::{
    AccessOutcome, BearerCategory, BearerRecord, IneligibleRegistration, ObfuscatedId, ProfileData,
};
use crate::domain::text;
use crate::error::{AccessError, Result};
use crate::ports::outbound::{IdentityStore, OverflowStore, PinEntry, TimeSource};

/// Eligibility check on the externally supplied status string.
///
/// Students must be exactly "Inscrito". Staff status is compared
/// accent-folded against "valida", so "Válida" passes and "No válida" does
/// not.
pub fn is_eligible(category: BearerCategory, status: &str) -> bool {
    match category {
        BearerCategory::Student => status.trim() == "Inscrito",
        BearerCategory::Staff => text::fold(status) == "valida",
    }
}

/// Decides entry/exit/deny for one bearer and drives the actuator.
pub struct AccessDecisionEngine {
    actuator: ActuatorController,
    store: Arc<dyn IdentityStore>,
    overflow: Arc<dyn OverflowStore>,
    pin_entry: Arc<dyn PinEntry>,
    time: Arc<dyn TimeSource>,
}

impl AccessDecisionEngine {
    pub fn new(
        actuator: ActuatorController,
        store: Arc<dyn IdentityStore>,
        overflow: Arc<dyn OverflowStore>,
        pin_entry: Arc<dyn PinEntry>,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            actuator,
            store,
            overflow,
            pin_entry,
            time,
        }
    }

    /// Decide and perform the transition for a bearer.
    ///
    /// - bike stored: PIN-gated exit. A mismatch returns `Denied` with no
    ///   actuator call and no state mutation.
    /// - no bike stored: entry, no PIN.
    /// - no hardware capability: flip the flag and report the action; this
    ///   path keeps the decision logic testable without hardware.
    ///
    /// A confirmation timeout is logged and the flow continues: the drive
    /// command most likely succeeded, and availability of the locker wins
    /// over strict physical/state consistency here.
    pub fn transition(&self, identifier: &str, category: BearerCategory) -> Result<AccessOutcome> {
        let token = ObfuscatedId::from_plain(identifier);
        let stored = self.store.bike_stored(&token, category)?;

        if !self.actuator.is_available() {
            self.store.set_bike_stored(&token, category, !stored)?;
            let outcome = if stored {
                AccessOutcome::Exit
            } else {
                AccessOutcome::Entry
            };
            info!("[engine] simulation: no actuator driven, outcome '{outcome}'");
            return Ok(outcome);
        }

        if stored {
            info!("[engine] bearer {identifier}: bike retrieval requested");
            match self.check_pin(identifier, &token, category) {
                Ok(()) => {}
                Err(AccessError::PinMismatch) => {
                    info!("[engine] wrong PIN for bearer {identifier}, access denied");
                    return Ok(AccessOutcome::Denied);
                }
                Err(other) => return Err(other),
            }

            let drive = self.actuator.drive_open();
            if let Err(err) = self.actuator.confirm(drive, SensorState::Open) {
                warn!("[engine] {err}; continuing");
            }
            self.store.set_bike_stored(&token, category, false)?;
            Ok(AccessOutcome::Exit)
        } else {
            info!("[engine] bearer {identifier}: storing bike");
            let drive = self.actuator.drive_close();
            if let Err(err) = self.actuator.confirm(drive, SensorState::Closed) {
                warn!("[engine] {err}; continuing");
            }
            self.store.set_bike_stored(&token, category, true)?;
            Ok(AccessOutcome::Entry)
        }
    }

    fn check_pin(
        &self,
        identifier: &str,
        token: &ObfuscatedId,
        category: BearerCategory,
    ) -> Result<()> {
        let pin = self.pin_entry.read_pin(identifier)?;
        if self.store.validate_pin(token, category, &pin)? {
            Ok(())
        } else {
            Err(AccessError::PinMismatch)
        }
    }

    /// Persist a first-time registrant after their pre-registration actuator
    /// call.
    ///
    /// Eligible bearers become a [`BearerRecord`] whose bike-stored flag
    /// follows the already-realized action. Ineligible bearers are appended
    /// to the overflow store and never tallied. Returns whether the bearer
    /// was eligible.
    pub fn register_new(
        &self,
        profile: &ProfileData,
        category: BearerCategory,
        scan_key: &str,
        outcome: AccessOutcome,
    ) -> Result<bool> {
        let Some(action) = outcome.as_recorded() else {
            return Ok(false);
        };
        let now = self.time.now_utc();

        if is_eligible(category, &profile.status) {
            let record = BearerRecord::from_profile(profile, category, scan_key, action, now);
            info!(
                "[engine] new {category} {} registered with PIN {}",
                profile.identifier, record.pin
            );
            self.store.insert(record)?;
            Ok(true)
        } else {
            info!(
                "[engine] {category} {} has status '{}', routed to overflow",
                profile.identifier, profile.status
            );
            self.overflow.record(&IneligibleRegistration {
                category,
                identifier: profile.identifier.clone(),
                name: profile.name.clone(),
                status: profile.status.clone(),
                scan_key: scan_key.to_owned(),
                recorded_at: now,
                details: profile.details.clone(),
            })?;
            Ok(false)
        }
    }
}

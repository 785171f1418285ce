//! Identity store adapters.
//!
//! Both adapters keep the full record set in memory and answer queries from
//! it; the file adapter additionally rewrites its document after each
//! mutation. The shared [`RecordSet`] implements the store semantics once.

pub mod file;
pub mod memory;

pub use file::FileIdentityStore;
pub use memory::MemoryIdentityStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{BearerCategory, BearerRecord, ObfuscatedId, RecordedAction};
use crate::error::StoreError;

/// The record collection shared by both adapters; also the on-disk schema
/// of the file adapter (`{"bearers": [...]}`).
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct RecordSet {
    bearers: Vec<BearerRecord>,
}

impl RecordSet {
    fn by_scan_key(&self, scan_key: &str, category: BearerCategory) -> Option<&BearerRecord> {
        self.bearers
            .iter()
            .find(|r| r.category == category && r.scan_key == scan_key)
    }

    pub(crate) fn contains_scan_key(&self, scan_key: &str, category: BearerCategory) -> bool {
        self.by_scan_key(scan_key, category).is_some()
    }

    pub(crate) fn identifier_for_scan_key(
        &self,
        scan_key: &str,
        category: BearerCategory,
    ) -> Result<Option<String>, StoreError> {
        match self.by_scan_key(scan_key, category) {
            Some(record) => {
                let plain = record
                    .identifier
                    .reveal()
                    .map_err(|err| StoreError::Corrupt {
                        detail: format!("identifier for {scan_key} does not reveal: {err}"),
                    })?;
                Ok(Some(plain))
            }
            None => Ok(None),
        }
    }

    pub(crate) fn bike_stored(&self, identifier: &ObfuscatedId, category: BearerCategory) -> bool {
        self.bearers
            .iter()
            .find(|r| r.category == category && &r.identifier == identifier)
            .is_some_and(|r| r.bike_stored)
    }

    /// Overwrite the flag on every record with this identifier. Unknown
    /// identifiers are a silent no-op (a new bearer has no record yet).
    /// Returns whether anything changed.
    pub(crate) fn set_bike_stored(
        &mut self,
        identifier: &ObfuscatedId,
        category: BearerCategory,
        stored: bool,
    ) -> bool {
        let mut changed = false;
        for record in self
            .bearers
            .iter_mut()
            .filter(|r| r.category == category && &r.identifier == identifier)
        {
            if record.bike_stored != stored {
                record.bike_stored = stored;
                changed = true;
            }
        }
        changed
    }

    pub(crate) fn validate_pin(
        &self,
        identifier: &ObfuscatedId,
        category: BearerCategory,
        pin: &str,
    ) -> bool {
        self.bearers
            .iter()
            .find(|r| r.category == category && &r.identifier == identifier)
            .is_some_and(|r| r.pin == pin)
    }

    /// Returns whether a record was updated.
    pub(crate) fn record_action(
        &mut self,
        scan_key: &str,
        category: BearerCategory,
        action: RecordedAction,
        at: DateTime<Utc>,
    ) -> bool {
        let record = self
            .bearers
            .iter_mut()
            .find(|r| r.category == category && r.scan_key == scan_key);
        let Some(record) = record else {
            return false;
        };
        record.last_action = action;
        record.last_event_time = at;
        match action {
            RecordedAction::Entry => record.bike_stored = true,
            RecordedAction::Exit => record.bike_stored = false,
            RecordedAction::None => {}
        }
        true
    }

    /// Returns whether the record was inserted (a known scan key is a
    /// no-op: records are created exactly once).
    pub(crate) fn insert(&mut self, record: BearerRecord) -> bool {
        if self.contains_scan_key(&record.scan_key, record.category) {
            return false;
        }
        self.bearers.push(record);
        true
    }
}

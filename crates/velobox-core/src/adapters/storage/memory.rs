//! In-memory identity store for tests and ephemeral runs.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::RecordSet;
use crate::domain::entities::{BearerCategory, BearerRecord, ObfuscatedId, RecordedAction};
use crate::error::StoreError;
use crate::ports::outbound::IdentityStore;

/// Identity store backed by a plain in-memory record set.
#[derive(Default)]
pub struct MemoryIdentityStore {
    records: Mutex<RecordSet>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a record, for assertions.
    pub fn record_for_scan_key(
        &self,
        scan_key: &str,
        category: BearerCategory,
    ) -> Option<BearerRecord> {
        self.records
            .lock()
            .by_scan_key(scan_key, category)
            .cloned()
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn contains_scan_key(
        &self,
        scan_key: &str,
        category: BearerCategory,
    ) -> Result<bool, StoreError> {
        Ok(self.records.lock().contains_scan_key(scan_key, category))
    }

    fn identifier_for_scan_key(
        &self,
        scan_key: &str,
        category: BearerCategory,
    ) -> Result<Option<String>, StoreError> {
        self.records
            .lock()
            .identifier_for_scan_key(scan_key, category)
    }

    fn bike_stored(
        &self,
        identifier: &ObfuscatedId,
        category: BearerCategory,
    ) -> Result<bool, StoreError> {
        Ok(self.records.lock().bike_stored(identifier, category))
    }

    fn set_bike_stored(
        &self,
        identifier: &ObfuscatedId,
        category: BearerCategory,
        stored: bool,
    ) -> Result<(), StoreError> {
        self.records
            .lock()
            .set_bike_stored(identifier, category, stored);
        Ok(())
    }

    fn validate_pin(
        &self,
        identifier: &ObfuscatedId,
        category: BearerCategory,
        pin: &str,
    ) -> Result<bool, StoreError> {
        Ok(self.records.lock().validate_pin(identifier, category, pin))
    }

    fn record_action(
        &self,
        scan_key: &str,
        category: BearerCategory,
        action: RecordedAction,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.records
            .lock()
            .record_action(scan_key, category, action, at);
        Ok(())
    }

    fn insert(&self, record: BearerRecord) -> Result<(), StoreError> {
        self.records.lock().insert(record);
        Ok(())
    }
}

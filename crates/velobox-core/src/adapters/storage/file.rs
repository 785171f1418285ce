//! File-backed identity store.
//!
//! The whole record set lives in one JSON document, loaded at open and
//! rewritten through a temp file + rename on every mutation. An exclusive
//! lock file stops a second station process from sharing the document —
//! the store contract is single-writer.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use parking_lot::Mutex;
use tracing::info;

use super::RecordSet;
use crate::domain::entities::{BearerCategory, BearerRecord, ObfuscatedId, RecordedAction};
use crate::error::StoreError;
use crate::ports::outbound::IdentityStore;

/// Identity store persisted as a JSON document.
#[derive(Debug)]
pub struct FileIdentityStore {
    path: PathBuf,
    records: Mutex<RecordSet>,
    /// Held open for the lifetime of the store to keep the flock.
    _lock: File,
}

impl FileIdentityStore {
    /// Open (or create) the store at `path`, acquiring its lock file.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let lock_path = path.with_extension("lock");
        let lock = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)?;
        lock.try_lock_exclusive().map_err(|_| StoreError::Locked {
            path: lock_path.display().to_string(),
        })?;

        let records = if path.exists() {
            let raw = fs::read_to_string(path)?;
            serde_json::from_str(&raw).map_err(|err| StoreError::Corrupt {
                detail: format!("{}: {err}", path.display()),
            })?
        } else {
            RecordSet::default()
        };

        info!("[store] opened {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            records: Mutex::new(records),
            _lock: lock,
        })
    }

    /// Rewrite the document atomically.
    fn persist(&self, records: &RecordSet) -> Result<(), StoreError> {
        let body = serde_json::to_string_pretty(records).map_err(|err| StoreError::Io {
            message: err.to_string(),
        })?;

        let temp_path = self.path.with_extension("tmp");
        let mut temp = File::create(&temp_path)?;
        temp.write_all(body.as_bytes())?;
        temp.sync_all()?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

impl IdentityStore for FileIdentityStore {
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
        let mut records = self.records.lock();
        if records.set_bike_stored(identifier, category, stored) {
            self.persist(&records)?;
        }
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
        let mut records = self.records.lock();
        if records.record_action(scan_key, category, action, at) {
            self.persist(&records)?;
        }
        Ok(())
    }

    fn insert(&self, record: BearerRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock();
        if records.insert(record) {
            self.persist(&records)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::student_profile;

    fn sample_record(scan_key: &str) -> BearerRecord {
        BearerRecord::from_profile(
            &student_profile("2020630123", "Inscrito"),
            BearerCategory::Student,
            scan_key,
            RecordedAction::Entry,
            Utc::now(),
        )
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bearers.json");

        {
            let store = FileIdentityStore::open(&path).unwrap();
            store.insert(sample_record("key-1")).unwrap();
            store
                .record_action(
                    "key-1",
                    BearerCategory::Student,
                    RecordedAction::Exit,
                    Utc::now(),
                )
                .unwrap();
        }

        let store = FileIdentityStore::open(&path).unwrap();
        let identifier = store
            .identifier_for_scan_key("key-1", BearerCategory::Student)
            .unwrap();
        assert_eq!(identifier.as_deref(), Some("2020630123"));
        let token = ObfuscatedId::from_plain("2020630123");
        assert!(!store.bike_stored(&token, BearerCategory::Student).unwrap());
    }

    #[test]
    fn test_second_opener_is_locked_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bearers.json");

        let _first = FileIdentityStore::open(&path).unwrap();
        let second = FileIdentityStore::open(&path);
        assert!(matches!(second, Err(StoreError::Locked { .. })));
    }

    #[test]
    fn test_corrupt_document_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bearers.json");
        fs::write(&path, "not json").unwrap();

        let err = FileIdentityStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn test_identifier_is_not_stored_in_plain_form() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bearers.json");

        let store = FileIdentityStore::open(&path).unwrap();
        store.insert(sample_record("key-1")).unwrap();
        drop(store);

        let body = fs::read_to_string(&path).unwrap();
        assert!(!body.contains("2020630123"));
    }
}

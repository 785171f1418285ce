//! JSON side stores: the denylist and the ineligible-registration overflow.
//!
//! Both are flat JSON files operators can inspect and edit by hand. The
//! blocklist is re-read on every check so edits apply while the station
//! runs; it fails open — an absent or unreadable file blocks nothing.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::entities::{BearerCategory, BlockKind, IneligibleRegistration};
use crate::error::StoreError;
use crate::ports::outbound::{Blocklist, OverflowStore};

/// One denylist entry: `{"tipo": "url", "valor": "...", "motivo": "..."}`.
#[derive(Debug, Deserialize)]
struct BlockEntry {
    #[serde(rename = "tipo")]
    kind: BlockKind,
    #[serde(rename = "valor")]
    value: String,
    #[serde(rename = "motivo", default)]
    #[allow(dead_code)]
    reason: String,
}

/// Denylist backed by an optional JSON file.
pub struct JsonBlocklist {
    path: Option<PathBuf>,
}

impl JsonBlocklist {
    /// A blocklist at `path`; `None` means nothing is ever blocked.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    fn entries(&self) -> Vec<BlockEntry> {
        let Some(path) = &self.path else {
            return Vec::new();
        };
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) => {
                debug!("[dispatch] blocklist {} not readable: {err}", path.display());
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("[dispatch] blocklist {} not parseable: {err}", path.display());
                Vec::new()
            }
        }
    }
}

impl Blocklist for JsonBlocklist {
    fn is_blocked(&self, kind: BlockKind, value: &str) -> bool {
        self.entries()
            .iter()
            .any(|e| e.kind == kind && e.value == value)
    }
}

/// Append-only JSON-array files for registrants who failed eligibility,
/// one file per category.
pub struct JsonOverflowStore {
    students_path: PathBuf,
    staff_path: PathBuf,
}

impl JsonOverflowStore {
    pub fn new(students_path: PathBuf, staff_path: PathBuf) -> Self {
        Self {
            students_path,
            staff_path,
        }
    }

    fn append(path: &Path, item: serde_json::Value) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Tolerate a missing, empty, or malformed file: start a fresh list
        // rather than refusing the registration.
        let mut items: Vec<serde_json::Value> = match fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_default(),
            Err(_) => Vec::new(),
        };
        items.push(item);

        let body = serde_json::to_string_pretty(&items).map_err(|err| StoreError::Io {
            message: err.to_string(),
        })?;
        fs::write(path, body)?;
        Ok(())
    }
}

impl OverflowStore for JsonOverflowStore {
    fn record(&self, registration: &IneligibleRegistration) -> Result<(), StoreError> {
        let path = match registration.category {
            BearerCategory::Student => &self.students_path,
            BearerCategory::Staff => &self.staff_path,
        };
        let item = serde_json::to_value(registration).map_err(|err| StoreError::Io {
            message: err.to_string(),
        })?;
        Self::append(path, item)
    }
}

//! Domain entities: bearers, outcomes, registrations, and tallies.
//!
//! Persisted enums keep the Spanish data-file vocabulary (`entrada`,
//! `salida`, `alumno`, ...) through serde renames so store and blocklist
//! files from deployed stations stay readable.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::cipher;
use crate::error::CipherError;

/// Which population a bearer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BearerCategory {
    /// Enrolled student.
    #[serde(rename = "alumno")]
    Student,
    /// Staff member with a payroll credential.
    #[serde(rename = "profesor")]
    Staff,
}

impl fmt::Display for BearerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BearerCategory::Student => write!(f, "student"),
            BearerCategory::Staff => write!(f, "staff"),
        }
    }
}

/// An identifier in its obfuscated stored form.
///
/// The newtype keeps tokens from being confused with plain identifiers. The
/// obfuscation is reversible and keyless; tokens are "unique-ish" only — two
/// identifiers differing solely in dropped characters collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObfuscatedId(String);

impl ObfuscatedId {
    /// Obfuscate a plain identifier.
    pub fn from_plain(identifier: &str) -> Self {
        Self(cipher::obfuscate(identifier))
    }

    /// Reverse the obfuscation.
    pub fn reveal(&self) -> Result<String, CipherError> {
        cipher::reveal(&self.0)
    }
}

/// The last realized action recorded for a bearer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RecordedAction {
    /// Bike was checked in.
    #[serde(rename = "entrada")]
    Entry,
    /// Bike was retrieved.
    #[serde(rename = "salida")]
    Exit,
    /// No action recorded yet.
    #[serde(rename = "none")]
    #[default]
    None,
}

impl fmt::Display for RecordedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordedAction::Entry => write!(f, "entrada"),
            RecordedAction::Exit => write!(f, "salida"),
            RecordedAction::None => write!(f, "none"),
        }
    }
}

/// Transient outcome of one access decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOutcome {
    /// Bearer stored a bike.
    Entry,
    /// Bearer retrieved a bike.
    Exit,
    /// Access refused; nothing moved, nothing persisted.
    Denied,
}

impl AccessOutcome {
    /// The action to persist, if this outcome was realized.
    pub fn as_recorded(self) -> Option<RecordedAction> {
        match self {
            AccessOutcome::Entry => Some(RecordedAction::Entry),
            AccessOutcome::Exit => Some(RecordedAction::Exit),
            AccessOutcome::Denied => None,
        }
    }
}

impl fmt::Display for AccessOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessOutcome::Entry => write!(f, "entrada"),
            AccessOutcome::Exit => write!(f, "salida"),
            AccessOutcome::Denied => write!(f, "denegado"),
        }
    }
}

/// Denylist entry kinds, named as they appear in the blocklist file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    /// Canonical scan key.
    #[serde(rename = "url")]
    ScanKey,
    /// Student identifier (plain form).
    #[serde(rename = "boleta")]
    StudentId,
    /// Staff employee number (plain form).
    #[serde(rename = "numero_empleado")]
    StaffId,
}

impl BlockKind {
    /// The identifier kind used for blocklist checks in a category.
    pub fn identifier_for(category: BearerCategory) -> Self {
        match category {
            BearerCategory::Student => BlockKind::StudentId,
            BearerCategory::Staff => BlockKind::StaffId,
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKind::ScanKey => write!(f, "scan key"),
            BlockKind::StudentId => write!(f, "student identifier"),
            BlockKind::StaffId => write!(f, "employee number"),
        }
    }
}

/// Category-specific profile fields.
///
/// In a [`BearerRecord`] the sensitive members (`national_id`,
/// `budget_code`) hold obfuscated tokens; in a fresh [`ProfileData`] or an
/// [`IneligibleRegistration`] they are plain as scraped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProfileDetails {
    /// Student profile fields.
    Student {
        /// National identity code.
        national_id: String,
        /// Degree program.
        program: String,
        /// School / faculty.
        school: String,
        /// Class shift, when the portal lists one.
        shift: String,
    },
    /// Staff profile fields.
    Staff {
        /// Payroll budget code.
        budget_code: String,
        /// Department of adscription.
        department: String,
    },
}

impl ProfileDetails {
    fn obfuscated(&self) -> Self {
        match self {
            ProfileDetails::Student {
                national_id,
                program,
                school,
                shift,
            } => ProfileDetails::Student {
                national_id: cipher::obfuscate(national_id),
                program: program.clone(),
                school: school.clone(),
                shift: shift.clone(),
            },
            ProfileDetails::Staff {
                budget_code,
                department,
            } => ProfileDetails::Staff {
                budget_code: cipher::obfuscate(budget_code),
                department: department.clone(),
            },
        }
    }
}

/// Everything extracted from a bearer's profile page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileData {
    /// Primary identifier, plain (student number / employee number).
    pub identifier: String,
    /// Display name.
    pub name: String,
    /// Eligibility status string as published by the portal.
    pub status: String,
    /// Category-specific fields, plain.
    pub details: ProfileDetails,
}

/// One row per known bearer.
///
/// Created exactly once at first eligible scan; afterwards updated in place.
/// Each scan overwrites the previous state — there is deliberately no
/// history log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BearerRecord {
    /// Bearer population.
    pub category: BearerCategory,
    /// Obfuscated identifier; lookup key for bike-state operations.
    pub identifier: ObfuscatedId,
    /// Canonical scan key; the true identity/dedup key.
    pub scan_key: String,
    /// Display name.
    pub name: String,
    /// Eligibility status at registration time.
    pub status: String,
    /// 4-character exit PIN, compared in plain text.
    pub pin: String,
    /// Whether the bearer currently has a bike checked in.
    pub bike_stored: bool,
    /// Last realized action; always consistent with `bike_stored`.
    pub last_action: RecordedAction,
    /// Timestamp of the most recent mutation.
    pub last_event_time: DateTime<Utc>,
    /// Remaining profile fields, sensitive members obfuscated.
    pub details: ProfileDetails,
}

impl BearerRecord {
    /// Build the record persisted at first eligible scan.
    ///
    /// `action` is the action already realized by the pre-registration
    /// actuator call; `bike_stored` follows from it.
    pub fn from_profile(
        profile: &ProfileData,
        category: BearerCategory,
        scan_key: &str,
        action: RecordedAction,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            category,
            identifier: ObfuscatedId::from_plain(&profile.identifier),
            scan_key: scan_key.to_owned(),
            name: profile.name.clone(),
            status: profile.status.clone(),
            pin: default_pin(&profile.identifier),
            bike_stored: action == RecordedAction::Entry,
            last_action: action,
            last_event_time: at,
            details: profile.details.obfuscated(),
        }
    }
}

/// Default exit PIN: the last four characters of the raw identifier, or
/// `"0000"` when the identifier is shorter.
pub fn default_pin(identifier: &str) -> String {
    let chars: Vec<char> = identifier.chars().collect();
    if chars.len() >= 4 {
        chars[chars.len() - 4..].iter().collect()
    } else {
        "0000".to_owned()
    }
}

/// Append-only record for a bearer who scanned but failed eligibility.
///
/// Never promoted to a [`BearerRecord`], never tallied, and carries no
/// bike-state semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IneligibleRegistration {
    /// Bearer population.
    pub category: BearerCategory,
    /// Primary identifier, plain as scraped.
    pub identifier: String,
    /// Display name.
    pub name: String,
    /// The status string that failed the eligibility check.
    pub status: String,
    /// Canonical scan key.
    pub scan_key: String,
    /// When the scan happened.
    pub recorded_at: DateTime<Utc>,
    /// Remaining profile fields, plain.
    pub details: ProfileDetails,
}

/// Process-wide entry/exit tallies.
///
/// An explicitly owned value (no global state): the dispatcher holds one and
/// bumps it only on realized actions. Reset only by process restart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TallyCounters {
    entries: u64,
    exits: u64,
}

impl TallyCounters {
    /// Count a realized outcome. Returns whether anything was counted.
    pub fn record(&mut self, outcome: AccessOutcome) -> bool {
        match outcome {
            AccessOutcome::Entry => {
                self.entries += 1;
                true
            }
            AccessOutcome::Exit => {
                self.exits += 1;
                true
            }
            AccessOutcome::Denied => false,
        }
    }

    /// Total realized entries.
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Total realized exits.
    pub fn exits(&self) -> u64 {
        self.exits
    }
}

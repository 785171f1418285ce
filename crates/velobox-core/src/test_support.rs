//! In-memory doubles for unit tests and the scenario suite.
//!
//! These are deliberately tiny: each fakes exactly one port with observable
//! state so tests can assert on side effects (or their absence).

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::domain::actuator::{DriveDirection, SensorState};
use crate::domain::entities::{
    BearerCategory, BlockKind, IneligibleRegistration, ProfileData, ProfileDetails,
};
use crate::error::AccessError;
use crate::ports::outbound::{
    ActuatorDriver, Blocklist, OverflowStore, PinEntry, ProfileFetcher, TimeSource,
};

// =============================================================================
// ACTUATOR
// =============================================================================

/// Hardware-present driver whose sensors follow the drive after a scripted
/// number of polls.
pub struct ScriptedDriver {
    settle_polls: usize,
    jammed: bool,
    inner: Mutex<ScriptedState>,
}

struct ScriptedState {
    position: SensorState,
    energized: Option<DriveDirection>,
    polls_left: usize,
    drives: Vec<DriveDirection>,
}

impl ScriptedDriver {
    /// A driver whose mechanism currently rests at `position`.
    pub fn starting(position: SensorState) -> Self {
        Self {
            settle_polls: 0,
            jammed: false,
            inner: Mutex::new(ScriptedState {
                position,
                energized: None,
                polls_left: 0,
                drives: Vec::new(),
            }),
        }
    }

    /// Require `polls` sensor reads after energization before the mechanism
    /// reaches its limit.
    pub fn settle_after(mut self, polls: usize) -> Self {
        self.settle_polls = polls;
        self
    }

    /// Sensors never report a limit (both inactive), forcing confirmation
    /// timeouts.
    pub fn jammed(mut self) -> Self {
        self.jammed = true;
        self
    }

    /// Whether a drive line is currently powered.
    pub fn is_energized(&self) -> bool {
        self.inner.lock().energized.is_some()
    }

    /// Where the mechanism currently rests.
    pub fn position(&self) -> SensorState {
        self.inner.lock().position
    }

    /// Every drive command issued, in order.
    pub fn drives(&self) -> Vec<DriveDirection> {
        self.inner.lock().drives.clone()
    }
}

impl ActuatorDriver for ScriptedDriver {
    fn is_available(&self) -> bool {
        true
    }

    fn energize(&self, direction: DriveDirection) {
        let mut inner = self.inner.lock();
        inner.energized = Some(direction);
        inner.polls_left = self.settle_polls;
        inner.drives.push(direction);
    }

    fn de_energize(&self) {
        self.inner.lock().energized = None;
    }

    fn read_sensor(&self) -> SensorState {
        if self.jammed {
            return SensorState::Indeterminate;
        }
        let mut inner = self.inner.lock();
        if let Some(direction) = inner.energized {
            if inner.polls_left > 0 {
                inner.polls_left -= 1;
            } else {
                inner.position = match direction {
                    DriveDirection::Open => SensorState::Open,
                    DriveDirection::Close => SensorState::Closed,
                };
            }
        }
        inner.position
    }
}

// =============================================================================
// PROFILE FETCHER
// =============================================================================

/// Canned profile responses keyed by scan key.
#[derive(Clone)]
pub enum StubResponse {
    /// Successful fetch and extraction.
    Profile(ProfileData),
    /// Network/HTTP failure.
    ScrapeFailure,
    /// Page fetched but the identifier field is absent.
    MissingIdentifier,
}

/// Profile fetcher answering from a fixed table.
#[derive(Default)]
pub struct StubProfileFetcher {
    responses: HashMap<String, StubResponse>,
    calls: Mutex<Vec<String>>,
}

impl StubProfileFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the response for a scan key.
    pub fn with(mut self, scan_key: &str, response: StubResponse) -> Self {
        self.responses.insert(scan_key.to_owned(), response);
        self
    }

    /// Scan keys fetched so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl ProfileFetcher for StubProfileFetcher {
    fn fetch(&self, scan_key: &str, _category: BearerCategory) -> Result<ProfileData, AccessError> {
        self.calls.lock().push(scan_key.to_owned());
        match self.responses.get(scan_key) {
            Some(StubResponse::Profile(profile)) => Ok(profile.clone()),
            Some(StubResponse::MissingIdentifier) => Err(AccessError::Extraction {
                field: "identifier",
            }),
            Some(StubResponse::ScrapeFailure) | None => Err(AccessError::Scrape {
                url: scan_key.to_owned(),
                reason: "stubbed failure".to_owned(),
            }),
        }
    }
}

// =============================================================================
// BLOCKLIST / OVERFLOW
// =============================================================================

/// Fixed denylist.
#[derive(Default)]
pub struct StaticBlocklist {
    entries: Vec<(BlockKind, String)>,
}

impl StaticBlocklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one denylist entry.
    pub fn blocking(mut self, kind: BlockKind, value: &str) -> Self {
        self.entries.push((kind, value.to_owned()));
        self
    }
}

impl Blocklist for StaticBlocklist {
    fn is_blocked(&self, kind: BlockKind, value: &str) -> bool {
        self.entries.iter().any(|(k, v)| *k == kind && v == value)
    }
}

/// Overflow store that keeps registrations in memory.
#[derive(Default)]
pub struct MemoryOverflowStore {
    records: Mutex<Vec<IneligibleRegistration>>,
}

impl MemoryOverflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far.
    pub fn records(&self) -> Vec<IneligibleRegistration> {
        self.records.lock().clone()
    }
}

impl OverflowStore for MemoryOverflowStore {
    fn record(
        &self,
        registration: &IneligibleRegistration,
    ) -> Result<(), crate::error::StoreError> {
        self.records.lock().push(registration.clone());
        Ok(())
    }
}

// =============================================================================
// PIN ENTRY / TIME
// =============================================================================

/// PIN entry answering from a queue; runs dry with a `PinEntry` error.
#[derive(Default)]
pub struct QueuedPinEntry {
    pins: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl QueuedPinEntry {
    /// Queue up the PINs to hand out, in order.
    pub fn with_pins<I: IntoIterator<Item = &'static str>>(pins: I) -> Self {
        Self {
            pins: Mutex::new(pins.into_iter().map(str::to_owned).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Identifiers that were prompted for a PIN.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

impl PinEntry for QueuedPinEntry {
    fn read_pin(&self, identifier: &str) -> Result<String, AccessError> {
        self.prompts.lock().push(identifier.to_owned());
        self.pins.lock().pop_front().ok_or(AccessError::PinEntry {
            reason: "no queued PIN".to_owned(),
        })
    }
}

/// Clock pinned to a fixed instant.
#[derive(Clone, Copy)]
pub struct FixedTimeSource(pub DateTime<Utc>);

impl TimeSource for FixedTimeSource {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

// =============================================================================
// SAMPLE PROFILES
// =============================================================================

/// A student profile with the given identifier and status.
pub fn student_profile(identifier: &str, status: &str) -> ProfileData {
    ProfileData {
        identifier: identifier.to_owned(),
        name: "Ana Torres".to_owned(),
        status: status.to_owned(),
        details: ProfileDetails::Student {
            national_id: "TOAA000101MDFRRN09".to_owned(),
            program: "Ing. Sistemas".to_owned(),
            school: "ESCOM".to_owned(),
            shift: "Matutino".to_owned(),
        },
    }
}

/// A staff profile with the given employee number and status.
pub fn staff_profile(identifier: &str, status: &str) -> ProfileData {
    ProfileData {
        identifier: identifier.to_owned(),
        name: "Luis Mendoza".to_owned(),
        status: status.to_owned(),
        details: ProfileDetails::Staff {
            budget_code: "CP2024A".to_owned(),
            department: "Matemáticas".to_owned(),
        },
    }
}


//! Scenario flows over real files: the bearer store document, the overflow
//! arrays, and the blocklist.
#![cfg(test)]

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use velobox_core::adapters::overflow::{JsonBlocklist, JsonOverflowStore};
use velobox_core::adapters::storage::FileIdentityStore;
use velobox_core::domain::ObfuscatedId;
use velobox_core::ports::outbound::{IdentityStore, SystemTimeSource};
use velobox_core::test_support::{
    staff_profile, student_profile, QueuedPinEntry, ScriptedDriver, StubProfileFetcher,
    StubResponse,
};
use velobox_core::{
    AccessDecisionEngine, AccessError, AccessOutcome, ActuatorController, BearerCategory,
    DispatchOutcome, ScanDispatcher, ScanWindow, SensorState,
};

const STUDENT_KEY: &str = "https://dae.school.mx/vcred/abc";
const STAFF_KEY: &str = "https://dsapp.school.mx/vcred/xyz";

/// Wire a dispatcher over file-backed stores rooted in `dir`.
fn file_station(
    dir: &Path,
    fetcher: StubProfileFetcher,
    blocklist: Option<&Path>,
    pins: &[&'static str],
) -> ScanDispatcher {
    let store = Arc::new(FileIdentityStore::open(&dir.join("bearers.json")).unwrap());
    let overflow = Arc::new(JsonOverflowStore::new(
        dir.join("ineligible-students.json"),
        dir.join("ineligible-staff.json"),
    ));
    let engine = AccessDecisionEngine::new(
        ActuatorController::new(
            Arc::new(ScriptedDriver::starting(SensorState::Closed)),
            Duration::from_millis(20),
            Duration::from_millis(1),
        ),
        store.clone(),
        overflow,
        Arc::new(QueuedPinEntry::with_pins(pins.iter().copied())),
        Arc::new(SystemTimeSource),
    );
    ScanDispatcher::new(
        engine,
        store,
        Arc::new(JsonBlocklist::new(blocklist.map(Path::to_path_buf))),
        Arc::new(fetcher),
        Arc::new(SystemTimeSource),
        ScanWindow::new(Duration::ZERO, 64, Instant::now()),
    )
}

fn enrolled_student() -> StubProfileFetcher {
    StubProfileFetcher::new().with(
        STUDENT_KEY,
        StubResponse::Profile(student_profile("2020630123", "Inscrito")),
    )
}

#[test]
fn test_bike_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    // First process: register and store a bike.
    {
        let mut dispatcher = file_station(dir.path(), enrolled_student(), None, &[]);
        let outcome = dispatcher.dispatch(STUDENT_KEY).unwrap();
        assert_eq!(
            outcome,
            DispatchOutcome::Decided {
                outcome: AccessOutcome::Entry,
                newly_registered: true,
            }
        );
    }

    // Second process: the bearer is known from disk, so the scan is an exit
    // (PIN-gated, no fetch).
    {
        let fetcher = StubProfileFetcher::new();
        let mut dispatcher = file_station(dir.path(), fetcher, None, &["0123"]);
        let outcome = dispatcher.dispatch(STUDENT_KEY).unwrap();
        assert_eq!(
            outcome,
            DispatchOutcome::Decided {
                outcome: AccessOutcome::Exit,
                newly_registered: false,
            }
        );
    }

    // Third process: the exit is on disk too.
    let store = FileIdentityStore::open(&dir.path().join("bearers.json")).unwrap();
    let token = ObfuscatedId::from_plain("2020630123");
    assert!(!store.bike_stored(&token, BearerCategory::Student).unwrap());
}

#[test]
fn test_store_document_keeps_wire_vocabulary() {
    let dir = tempfile::tempdir().unwrap();
    let mut dispatcher = file_station(dir.path(), enrolled_student(), None, &[]);
    dispatcher.dispatch(STUDENT_KEY).unwrap();
    drop(dispatcher);

    let body = fs::read_to_string(dir.path().join("bearers.json")).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&body).unwrap();
    let record = &doc["bearers"][0];

    assert_eq!(record["category"], "alumno");
    assert_eq!(record["last_action"], "entrada");
    assert_eq!(record["bike_stored"], true);
    // The identifier is stored only in obfuscated form.
    assert!(!body.contains("2020630123"));
}

#[test]
fn test_ineligible_staff_lands_in_overflow_file_only() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = StubProfileFetcher::new().with(
        STAFF_KEY,
        StubResponse::Profile(staff_profile("123456", "No válida")),
    );
    let mut dispatcher = file_station(dir.path(), fetcher, None, &[]);

    let outcome = dispatcher.dispatch(STAFF_KEY).unwrap();
    assert_eq!(outcome, DispatchOutcome::Ineligible);
    drop(dispatcher);

    let overflow: Vec<serde_json::Value> =
        serde_json::from_str(&fs::read_to_string(dir.path().join("ineligible-staff.json")).unwrap())
            .unwrap();
    assert_eq!(overflow.len(), 1);
    assert_eq!(overflow[0]["identifier"], "123456");
    assert_eq!(overflow[0]["status"], "No válida");

    // The bearer store never saw a write.
    assert!(!dir.path().join("bearers.json").exists());
}

#[test]
fn test_blocklist_file_denies_scan() {
    let dir = tempfile::tempdir().unwrap();
    let blocklist_path = dir.path().join("blocked.json");
    fs::write(
        &blocklist_path,
        format!(r#"[{{"tipo": "url", "valor": "{STUDENT_KEY}", "motivo": "reported stolen"}}]"#),
    )
    .unwrap();

    let mut dispatcher = file_station(
        dir.path(),
        enrolled_student(),
        Some(&blocklist_path),
        &[],
    );

    let result = dispatcher.dispatch(STUDENT_KEY);
    assert!(matches!(result, Err(AccessError::Blocked { .. })));
    drop(dispatcher);

    assert!(!dir.path().join("bearers.json").exists());
}

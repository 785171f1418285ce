//! End-to-end access flows over the in-memory store.
//!
//! Covers the station's observable properties: realized actions update the
//! bike-stored flag and the tallies, denials leave zero trace, the
//! anti-rebound window swallows repeats, and simulation mode never touches
//! PIN or hardware.
#![cfg(test)]

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use velobox_core::adapters::storage::MemoryIdentityStore;
use velobox_core::domain::actuator::DriveDirection;
use velobox_core::ports::outbound::{ActuatorDriver, SystemTimeSource};
use velobox_core::test_support::{
    staff_profile, student_profile, MemoryOverflowStore, QueuedPinEntry, ScriptedDriver,
    StaticBlocklist, StubProfileFetcher, StubResponse,
};
use velobox_core::{
    AccessDecisionEngine, AccessError, AccessOutcome, ActuatorController, BearerCategory,
    DispatchOutcome, ScanDispatcher, ScanWindow, SensorState,
};

const STUDENT_KEY: &str = "https://dae.school.mx/vcred/abc";
const STAFF_KEY: &str = "https://dsapp.school.mx/vcred/xyz";

struct Station {
    scripted: Option<Arc<ScriptedDriver>>,
    store: Arc<MemoryIdentityStore>,
    overflow: Arc<MemoryOverflowStore>,
    pin_entry: Arc<QueuedPinEntry>,
    dispatcher: ScanDispatcher,
}

impl Station {
    /// The scripted driver, in tests that run against one.
    fn driver(&self) -> &ScriptedDriver {
        self.scripted.as_ref().unwrap()
    }
}

fn station_with_driver(
    driver: Arc<dyn ActuatorDriver>,
    scripted: Option<Arc<ScriptedDriver>>,
    fetcher: StubProfileFetcher,
    pins: &[&'static str],
    window: Duration,
) -> Station {
    let store = Arc::new(MemoryIdentityStore::new());
    let overflow = Arc::new(MemoryOverflowStore::new());
    let pin_entry = Arc::new(QueuedPinEntry::with_pins(pins.iter().copied()));
    let engine = AccessDecisionEngine::new(
        ActuatorController::new(driver, Duration::from_millis(20), Duration::from_millis(1)),
        store.clone(),
        overflow.clone(),
        pin_entry.clone(),
        Arc::new(SystemTimeSource),
    );
    let dispatcher = ScanDispatcher::new(
        engine,
        store.clone(),
        Arc::new(StaticBlocklist::new()),
        Arc::new(fetcher),
        Arc::new(SystemTimeSource),
        ScanWindow::new(window, 64, Instant::now()),
    );
    Station {
        scripted,
        store,
        overflow,
        pin_entry,
        dispatcher,
    }
}

fn station(fetcher: StubProfileFetcher, pins: &[&'static str], window: Duration) -> Station {
    let scripted = Arc::new(ScriptedDriver::starting(SensorState::Closed));
    station_with_driver(scripted.clone(), Some(scripted), fetcher, pins, window)
}

fn enrolled_student() -> StubProfileFetcher {
    StubProfileFetcher::new().with(
        STUDENT_KEY,
        StubResponse::Profile(student_profile("2020630123", "Inscrito")),
    )
}

#[test]
fn test_full_cycle_entry_then_exit() {
    let mut s = station(enrolled_student(), &["0123"], Duration::ZERO);

    let first = s.dispatcher.dispatch(STUDENT_KEY).unwrap();
    assert_eq!(
        first,
        DispatchOutcome::Decided {
            outcome: AccessOutcome::Entry,
            newly_registered: true,
        }
    );

    let second = s.dispatcher.dispatch(STUDENT_KEY).unwrap();
    assert_eq!(
        second,
        DispatchOutcome::Decided {
            outcome: AccessOutcome::Exit,
            newly_registered: false,
        }
    );

    // Entry closed the slot, exit opened it; both confirmed and released.
    assert_eq!(
        s.driver().drives(),
        vec![DriveDirection::Close, DriveDirection::Open]
    );
    assert!(!s.driver().is_energized());

    let record = s
        .store
        .record_for_scan_key(STUDENT_KEY, BearerCategory::Student)
        .unwrap();
    assert!(!record.bike_stored);
    assert_eq!(s.dispatcher.tally().entries(), 1);
    assert_eq!(s.dispatcher.tally().exits(), 1);
}

#[test]
fn test_wrong_pin_leaves_zero_trace() {
    let mut s = station(enrolled_student(), &["4321"], Duration::ZERO);

    s.dispatcher.dispatch(STUDENT_KEY).unwrap();
    let before = s
        .store
        .record_for_scan_key(STUDENT_KEY, BearerCategory::Student)
        .unwrap();

    let denied = s.dispatcher.dispatch(STUDENT_KEY).unwrap();
    assert_eq!(
        denied,
        DispatchOutcome::Decided {
            outcome: AccessOutcome::Denied,
            newly_registered: false,
        }
    );

    // The record is byte-identical: flag, action, and timestamp untouched.
    let after = s
        .store
        .record_for_scan_key(STUDENT_KEY, BearerCategory::Student)
        .unwrap();
    assert_eq!(before, after);

    // No exit drive happened, only the original entry close.
    assert_eq!(s.driver().drives(), vec![DriveDirection::Close]);
    assert_eq!(s.dispatcher.tally().entries(), 1);
    assert_eq!(s.dispatcher.tally().exits(), 0);
}

#[test]
fn test_anti_rebound_swallows_then_releases() {
    let mut s = station(enrolled_student(), &["0123"], Duration::from_millis(100));

    assert!(matches!(
        s.dispatcher.dispatch(STUDENT_KEY).unwrap(),
        DispatchOutcome::Decided { .. }
    ));
    assert!(matches!(
        s.dispatcher.dispatch(STUDENT_KEY),
        Err(AccessError::DuplicateScan)
    ));

    thread::sleep(Duration::from_millis(150));

    // Past the window the same scan processes again, now as an exit.
    let third = s.dispatcher.dispatch(STUDENT_KEY).unwrap();
    assert_eq!(
        third,
        DispatchOutcome::Decided {
            outcome: AccessOutcome::Exit,
            newly_registered: false,
        }
    );
    assert_eq!(s.dispatcher.tally().entries(), 1);
    assert_eq!(s.dispatcher.tally().exits(), 1);
}

#[test]
fn test_simulation_mode_needs_no_pin_and_no_hardware() {
    let mut s = station_with_driver(
        Arc::new(velobox_core::adapters::sim::SimulatedDriver::new()),
        None,
        enrolled_student(),
        &[],
        Duration::ZERO,
    );

    let first = s.dispatcher.dispatch(STUDENT_KEY).unwrap();
    let second = s.dispatcher.dispatch(STUDENT_KEY).unwrap();

    assert_eq!(
        first,
        DispatchOutcome::Decided {
            outcome: AccessOutcome::Entry,
            newly_registered: true,
        }
    );
    assert_eq!(
        second,
        DispatchOutcome::Decided {
            outcome: AccessOutcome::Exit,
            newly_registered: false,
        }
    );
    // The simulated exit skipped the PIN gate entirely.
    assert!(s.pin_entry.prompts().is_empty());
    assert_eq!(s.dispatcher.tally().exits(), 1);
}

#[test]
fn test_staff_with_valid_credential_registers() {
    let fetcher = StubProfileFetcher::new().with(
        STAFF_KEY,
        StubResponse::Profile(staff_profile("123456", "Válida")),
    );
    let mut s = station(fetcher, &[], Duration::ZERO);

    let outcome = s.dispatcher.dispatch(STAFF_KEY).unwrap();

    assert_eq!(
        outcome,
        DispatchOutcome::Decided {
            outcome: AccessOutcome::Entry,
            newly_registered: true,
        }
    );
    assert!(s
        .store
        .record_for_scan_key(STAFF_KEY, BearerCategory::Staff)
        .is_some());
    assert!(s.overflow.records().is_empty());
}

#[test]
fn test_staff_with_invalid_credential_is_ineligible() {
    let fetcher = StubProfileFetcher::new().with(
        STAFF_KEY,
        StubResponse::Profile(staff_profile("123456", "No válida")),
    );
    let mut s = station(fetcher, &[], Duration::ZERO);

    let outcome = s.dispatcher.dispatch(STAFF_KEY).unwrap();

    assert_eq!(outcome, DispatchOutcome::Ineligible);
    assert!(s
        .store
        .record_for_scan_key(STAFF_KEY, BearerCategory::Staff)
        .is_none());
    assert_eq!(s.overflow.records().len(), 1);
    assert_eq!(s.dispatcher.tally().entries(), 0);
}

#[test]
fn test_sensor_timeout_still_realizes_the_entry() {
    let jammed = Arc::new(ScriptedDriver::starting(SensorState::Closed).jammed());
    let mut s = station_with_driver(
        jammed.clone(),
        Some(jammed),
        enrolled_student(),
        &[],
        Duration::ZERO,
    );

    let outcome = s.dispatcher.dispatch(STUDENT_KEY).unwrap();

    // Confirmation timed out, but the action was realized and tallied.
    assert_eq!(
        outcome,
        DispatchOutcome::Decided {
            outcome: AccessOutcome::Entry,
            newly_registered: true,
        }
    );
    assert!(!s.driver().is_energized());
    assert_eq!(s.dispatcher.tally().entries(), 1);
}

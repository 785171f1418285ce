//! # VeloBox Access Core
//!
//! The access-decision and actuator-confirmation subsystem of a bicycle
//! storage station: it turns one scanned identity token into one granted or
//! denied slot access, confirmed by limit sensors.
//!
//! ## Flow per scan
//!
//! ```text
//! raw scan ──normalize──→ scan key ──classify──→ category
//!                                        │
//!                              [ScanDispatcher]
//!                         dedup → blocklist → store lookup
//!                              │                    │
//!                        known bearer          new bearer
//!                              │              fetch profile
//!                              └──────┬─────────────┘
//!                                     ↓
//!                          [AccessDecisionEngine]
//!                      bike stored?  PIN gate on exits
//!                                     ↓
//!                           [ActuatorController]
//!                      drive + sensor confirm (8 s)
//!                                     ↓
//!                          persist flag / record / tally
//! ```
//!
//! ## Ordering invariant
//!
//! The actuator motion (and any PIN check) for a scan always completes
//! before the matching persistence write commits. A denied PIN leaves zero
//! trace in the store and the tallies.
//!
//! ## Crate structure
//!
//! - `domain/` — entities, decision engine, actuator control, cipher,
//!   classification, normalization, dedup window
//! - `ports/` — trait contracts the host wires at startup
//! - `adapters/` — GPIO & simulated actuator, file & memory store, JSON
//!   side stores, HTTP fetcher, console PIN entry
//! - `service.rs` — the scan dispatcher
//!
//! Execution is single-threaded and cooperative: one scan is processed
//! completely (including the blocking confirmation wait) before the next
//! input line is read, so the store only ever sees one writer.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;
pub mod test_support;

pub use config::LockerConfig;
pub use domain::{
    AccessDecisionEngine, AccessOutcome, ActuatorController, BearerCategory, BearerRecord,
    BlockKind, ScanWindow, SensorState, TallyCounters,
};
pub use error::{AccessError, Result};
pub use service::{DispatchOutcome, ScanDispatcher};

//! The scan dispatcher: single entry point per input event.
//!
//! Sequencing per scan: normalize → classify → dedup → blocklist → known or
//! new bearer path. The ordering invariant lives here: the actuator motion
//! (and any PIN check) for a scan always completes before the matching
//! persistence write commits, and a denied PIN leaves zero trace in the
//! store or the tallies.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::domain::classify;
use crate::domain::engine::AccessDecisionEngine;
use crate::domain::entities::{AccessOutcome, BearerCategory, BlockKind, TallyCounters};
use crate::domain::scan_window::ScanWindow;
use crate::domain::text;
use crate::error::{AccessError, Result};
use crate::ports::outbound::{Blocklist, IdentityStore, ProfileFetcher, TimeSource};

/// How one dispatched scan ended, when it was not aborted by an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The decision engine ran; `outcome` may still be `Denied`.
    Decided {
        /// The engine's decision.
        outcome: AccessOutcome,
        /// Whether this scan created the bearer's record.
        newly_registered: bool,
    },
    /// New bearer failed eligibility; recorded in the overflow store only.
    Ineligible,
    /// No category keyword matched; the scan was not processed.
    Unclassified,
}

/// Deduplicates scans, resolves known vs. new bearers, and sequences
/// decision → persistence.
pub struct ScanDispatcher {
    engine: AccessDecisionEngine,
    store: Arc<dyn IdentityStore>,
    blocklist: Arc<dyn Blocklist>,
    fetcher: Arc<dyn ProfileFetcher>,
    time: Arc<dyn TimeSource>,
    window: ScanWindow,
    tally: TallyCounters,
}

impl ScanDispatcher {
    pub fn new(
        engine: AccessDecisionEngine,
        store: Arc<dyn IdentityStore>,
        blocklist: Arc<dyn Blocklist>,
        fetcher: Arc<dyn ProfileFetcher>,
        time: Arc<dyn TimeSource>,
        window: ScanWindow,
    ) -> Self {
        Self {
            engine,
            store,
            blocklist,
            fetcher,
            time,
            window,
            tally: TallyCounters::default(),
        }
    }

    /// Current entry/exit tallies.
    pub fn tally(&self) -> TallyCounters {
        self.tally
    }

    /// Process one raw scan completely.
    ///
    /// Errors abort this scan only; the caller logs them and keeps reading
    /// input.
    pub fn dispatch(&mut self, raw: &str) -> Result<DispatchOutcome> {
        let raw = raw.trim();
        if raw.is_empty() {
            debug!("[dispatch] empty scan ignored");
            return Ok(DispatchOutcome::Unclassified);
        }

        let scan_key = text::normalize_scan(raw);
        let Some(category) = classify::classify(&scan_key) else {
            info!("[dispatch] unclassified scan: {scan_key}");
            return Ok(DispatchOutcome::Unclassified);
        };

        if self.window.observe(&scan_key, Instant::now()) {
            return Err(AccessError::DuplicateScan);
        }

        if self.blocklist.is_blocked(BlockKind::ScanKey, &scan_key) {
            return Err(AccessError::Blocked {
                kind: BlockKind::ScanKey,
            });
        }

        match self.store.identifier_for_scan_key(&scan_key, category)? {
            Some(identifier) => self.known_bearer(&scan_key, category, &identifier),
            None => self.new_bearer(&scan_key, category),
        }
    }

    fn known_bearer(
        &mut self,
        scan_key: &str,
        category: BearerCategory,
        identifier: &str,
    ) -> Result<DispatchOutcome> {
        info!("[dispatch] known bearer, deciding from the store");
        let outcome = self.engine.transition(identifier, category)?;

        if let Some(action) = outcome.as_recorded() {
            self.store
                .record_action(scan_key, category, action, self.time.now_utc())?;
            self.tally.record(outcome);
            info!("[dispatch] access '{outcome}' recorded for bearer {identifier}");
            self.log_tally();
        }

        Ok(DispatchOutcome::Decided {
            outcome,
            newly_registered: false,
        })
    }

    fn new_bearer(
        &mut self,
        scan_key: &str,
        category: BearerCategory,
    ) -> Result<DispatchOutcome> {
        info!("[dispatch] new {category}, fetching profile");
        let profile = self.fetcher.fetch(scan_key, category)?;
        if profile.identifier.is_empty() {
            return Err(AccessError::Extraction {
                field: "identifier",
            });
        }

        let id_kind = BlockKind::identifier_for(category);
        if self.blocklist.is_blocked(id_kind, &profile.identifier) {
            return Err(AccessError::Blocked { kind: id_kind });
        }

        // Actuator motion and any PIN gate run before anything is written.
        let outcome = self.engine.transition(&profile.identifier, category)?;
        if outcome == AccessOutcome::Denied {
            return Ok(DispatchOutcome::Decided {
                outcome,
                newly_registered: false,
            });
        }

        let eligible = self
            .engine
            .register_new(&profile, category, scan_key, outcome)?;
        if !eligible {
            return Ok(DispatchOutcome::Ineligible);
        }

        self.tally.record(outcome);
        self.log_tally();
        Ok(DispatchOutcome::Decided {
            outcome,
            newly_registered: true,
        })
    }

    fn log_tally(&self) {
        info!(
            "[dispatch] entries: {} | exits: {}",
            self.tally.entries(),
            self.tally.exits()
        );
    }
}

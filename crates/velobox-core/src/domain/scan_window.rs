//! Anti-rebound dedup window over recent scan keys.
//!
//! Handheld scanners fire the same code several times per second; the window
//! swallows repeats of a scan key seen less than the configured interval
//! ago. Two rolling generations bound memory under sustained traffic: the
//! map never holds more than `2 * max_entries` keys, and a key is forgotten
//! after at most two window lengths.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Default anti-rebound interval.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(5);

/// Default per-generation capacity.
pub const DEFAULT_MAX_ENTRIES: usize = 1024;

/// Ephemeral scan-key dedup window. Not persisted.
#[derive(Debug)]
pub struct ScanWindow {
    window: Duration,
    max_entries: usize,
    current: HashMap<String, Instant>,
    previous: HashMap<String, Instant>,
    last_roll: Instant,
}

impl ScanWindow {
    /// Create a window with the given interval and generation capacity.
    pub fn new(window: Duration, max_entries: usize, now: Instant) -> Self {
        Self {
            window,
            max_entries,
            current: HashMap::new(),
            previous: HashMap::new(),
            last_roll: now,
        }
    }

    /// Record a scan key observation.
    ///
    /// Returns `true` when the key was already seen inside the window (the
    /// caller discards the scan); the original timestamp is kept so a
    /// machine-gunned scanner cannot extend its own window. Returns `false`
    /// and remembers the key otherwise.
    pub fn observe(&mut self, scan_key: &str, now: Instant) -> bool {
        self.maybe_roll(now);

        let seen = self
            .current
            .get(scan_key)
            .or_else(|| self.previous.get(scan_key));
        if let Some(&seen) = seen {
            if now.duration_since(seen) < self.window {
                return true;
            }
        }

        self.current.insert(scan_key.to_owned(), now);
        false
    }

    /// Number of keys currently remembered across both generations.
    pub fn len(&self) -> usize {
        self.current.len() + self.previous.len()
    }

    /// Whether no keys are remembered.
    pub fn is_empty(&self) -> bool {
        self.current.is_empty() && self.previous.is_empty()
    }

    fn maybe_roll(&mut self, now: Instant) {
        let interval_elapsed = now.duration_since(self.last_roll) >= self.window;
        if interval_elapsed || self.current.len() >= self.max_entries {
            self.previous = std::mem::take(&mut self.current);
            self.last_roll = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(5);

    #[test]
    fn test_repeat_inside_window_is_duplicate() {
        let t0 = Instant::now();
        let mut window = ScanWindow::new(WINDOW, 16, t0);

        assert!(!window.observe("key", t0));
        assert!(window.observe("key", t0 + Duration::from_secs(2)));
    }

    #[test]
    fn test_repeat_after_window_processes_again() {
        let t0 = Instant::now();
        let mut window = ScanWindow::new(WINDOW, 16, t0);

        assert!(!window.observe("key", t0));
        assert!(!window.observe("key", t0 + Duration::from_secs(6)));
    }

    #[test]
    fn test_duplicate_does_not_extend_its_own_window() {
        let t0 = Instant::now();
        let mut window = ScanWindow::new(WINDOW, 16, t0);

        assert!(!window.observe("key", t0));
        // Rebounds at 4s and 4.9s are swallowed without refreshing the
        // timestamp, so the key is fresh again at t0+5s.
        assert!(window.observe("key", t0 + Duration::from_secs(4)));
        assert!(window.observe("key", t0 + Duration::from_millis(4900)));
        assert!(!window.observe("key", t0 + Duration::from_secs(5)));
    }

    #[test]
    fn test_distinct_keys_do_not_collide() {
        let t0 = Instant::now();
        let mut window = ScanWindow::new(WINDOW, 16, t0);

        assert!(!window.observe("a", t0));
        assert!(!window.observe("b", t0));
    }

    #[test]
    fn test_capacity_stays_bounded() {
        let t0 = Instant::now();
        let mut window = ScanWindow::new(WINDOW, 8, t0);

        for i in 0..100 {
            window.observe(&format!("key-{i}"), t0 + Duration::from_millis(i));
        }
        assert!(window.len() <= 16);
    }

    #[test]
    fn test_recent_key_survives_a_capacity_roll() {
        let t0 = Instant::now();
        let mut window = ScanWindow::new(WINDOW, 4, t0);

        assert!(!window.observe("keeper", t0));
        for i in 0..4 {
            window.observe(&format!("filler-{i}"), t0 + Duration::from_millis(1));
        }
        // "keeper" rolled into the previous generation but is still inside
        // the window.
        assert!(window.observe("keeper", t0 + Duration::from_secs(1)));
    }
}

//! Error types for the access-control subsystem.
//!
//! Every failure here is scoped to a single scan: none of these variants may
//! leave a partial mutation behind in another bearer's record.

use std::time::Duration;

use thiserror::Error;

use crate::domain::actuator::SensorState;
use crate::domain::entities::BlockKind;

/// Result type alias for access-control operations.
pub type Result<T> = std::result::Result<T, AccessError>;

/// Failures that can end the processing of one scan.
///
/// `SensorTimeout` is the single non-aborting member: the caller reports it
/// and continues optimistically. Everything else aborts the scan with no
/// side effects.
#[derive(Debug, Error)]
pub enum AccessError {
    /// Profile page could not be retrieved.
    #[error("profile fetch failed for {url}: {reason}")]
    Scrape {
        /// The scan key that was fetched
        url: String,
        /// Underlying network/HTTP failure
        reason: String,
    },

    /// A required field was absent from the profile page.
    #[error("profile page is missing required field '{field}'")]
    Extraction {
        /// Name of the missing field
        field: &'static str,
    },

    /// Limit sensors never reported the target state within the timeout.
    #[error("no '{target}' confirmation from limit sensors within {waited:?}")]
    SensorTimeout {
        /// The sensor state that was awaited
        target: SensorState,
        /// How long the controller polled before giving up
        waited: Duration,
    },

    /// Entered PIN does not match the stored one.
    #[error("PIN mismatch")]
    PinMismatch,

    /// Same scan key seen again inside the anti-rebound window.
    #[error("duplicate scan inside the anti-rebound window")]
    DuplicateScan,

    /// Scan key or identifier is on the denylist.
    #[error("access denied: {kind} is blocked")]
    Blocked {
        /// Which denylist entry kind matched
        kind: BlockKind,
    },

    /// GPIO capability could not be initialized; callers fall back to
    /// simulation.
    #[error("hardware unavailable: {reason}")]
    HardwareUnavailable {
        /// Why the GPIO tree could not be used
        reason: String,
    },

    /// PIN could not be read from the console.
    #[error("PIN entry failed: {reason}")]
    PinEntry {
        /// Underlying input failure
        reason: String,
    },

    /// Bearer store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Obfuscated identifier could not be revealed.
    #[error(transparent)]
    Cipher(#[from] CipherError),
}

/// Failures of the persistent bearer store and the JSON side stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying filesystem failure.
    #[error("store I/O error: {message}")]
    Io {
        /// Description of the I/O failure
        message: String,
    },

    /// Stored data could not be decoded.
    #[error("corrupt store data: {detail}")]
    Corrupt {
        /// What failed to decode, and why
        detail: String,
    },

    /// Another process holds the store lock.
    #[error("store already in use ({path})")]
    Locked {
        /// Lock file path
        path: String,
    },
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io {
            message: err.to_string(),
        }
    }
}

/// Failures when reversing the identifier obfuscation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CipherError {
    /// Token contains a symbol outside the substitution table.
    #[error("invalid symbol {symbol:?} in obfuscated token")]
    InvalidSymbol {
        /// The offending character
        symbol: char,
    },

    /// Tokens encode coordinate pairs; an odd symbol count is malformed.
    #[error("obfuscated token has odd length {len}")]
    OddLength {
        /// Number of symbols in the token
        len: usize,
    },

    /// Decoded coordinates fall outside the 6x6 alphabet grid.
    #[error("coordinates ({row},{col}) outside the alphabet grid")]
    OutOfRange {
        /// Decoded row
        row: u8,
        /// Decoded column
        col: u8,
    },
}

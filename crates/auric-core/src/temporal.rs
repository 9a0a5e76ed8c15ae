//! UTC-only timestamps and the clock seam.
//!
//! All time comparisons in the platform — in practice the escrow resolution
//! window — are made against [`Timestamp`] values with seconds precision.
//! Services never call `Utc::now()` directly; they hold a [`Clock`] so the
//! window logic can be driven through time in tests.

use chrono::{DateTime, Timelike, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A UTC timestamp truncated to seconds precision.
///
/// Sub-second components are discarded at construction so that serialized
/// forms are stable: `YYYY-MM-DDTHH:MM:SSZ`, always `Z`, never an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self::from_utc(Utc::now())
    }

    /// From a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt.with_nanosecond(0).unwrap_or(dt))
    }

    /// From a Unix epoch timestamp in seconds.
    pub fn from_epoch_secs(secs: i64) -> Result<Self, CoreError> {
        DateTime::from_timestamp(secs, 0)
            .map(Self)
            .ok_or_else(|| CoreError::InvalidTimestamp(format!("unix timestamp out of range: {secs}")))
    }

    /// Parse an RFC 3339 string. Only the `Z` suffix is accepted — explicit
    /// offsets (even `+00:00`) are rejected to keep canonical forms unique.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if !s.ends_with('Z') {
            return Err(CoreError::InvalidTimestamp(format!(
                "timestamp must use Z suffix (UTC only), got {s:?}"
            )));
        }
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|e| CoreError::InvalidTimestamp(format!("{s:?}: {e}")))?;
        Ok(Self::from_utc(dt.with_timezone(&Utc)))
    }

    /// Unix epoch seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// This timestamp shifted forward by `secs` seconds, saturating at the
    /// far future rather than panicking on absurd caller-supplied delays.
    pub fn plus_secs(&self, secs: u64) -> Self {
        // chrono durations are bounded by i64 milliseconds.
        const MAX_DELTA_SECS: i64 = i64::MAX / 1_000;
        let secs = i64::try_from(secs).unwrap_or(MAX_DELTA_SECS).min(MAX_DELTA_SECS);
        match self.0.checked_add_signed(chrono::Duration::seconds(secs)) {
            Some(dt) => Self(dt),
            None => Self::from_utc(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Render as ISO 8601 with Z suffix (e.g. `2026-01-15T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

/// Capability trait for reading ledger time.
///
/// Injected into services that enforce time-dependent rules, so tests can
/// advance the clock instead of sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock implementation used in production wiring.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A manually driven clock for tests of deadline behavior.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward by `secs` seconds.
    pub fn advance_secs(&self, secs: u64) {
        let mut now = self.now.lock();
        *now = now.plus_secs(secs);
    }

    /// Set the clock to an absolute instant.
    pub fn set(&self, instant: Timestamp) {
        *self.now.lock() = instant;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock()
    }
}

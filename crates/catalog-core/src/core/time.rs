// crates/catalog-core/src/core/time.rs
// ============================================================================
// Module: Product Catalog Time Model
// Description: Canonical UTC timestamps for documents, events, and evaluation.
// Purpose: Provide a single RFC3339 timestamp representation across the catalog.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Timestamps are UTC instants serialized as RFC3339 strings on the wire.
//! Engine entry points accept explicit `now` values rather than reading the
//! wall clock, so rule evaluation and expiry sweeps are replayable; hosts
//! obtain the current instant once per operation via [`Timestamp::now`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Canonical UTC timestamp used across catalog documents and envelopes.
///
/// # Invariants
/// - Values are always UTC; serialization is RFC3339.
/// - Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(#[serde(with = "time::serde::rfc3339")] OffsetDateTime);

impl Timestamp {
    /// Returns the current UTC instant.
    #[must_use]
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    /// Wraps an existing UTC instant.
    #[must_use]
    pub const fn from_odt(value: OffsetDateTime) -> Self {
        Self(value)
    }

    /// Returns the wrapped instant.
    #[must_use]
    pub const fn into_odt(self) -> OffsetDateTime {
        self.0
    }

    /// Returns this instant shifted back by the given number of days.
    #[must_use]
    pub fn minus_days(self, days: i64) -> Self {
        Self(self.0.saturating_sub(Duration::days(days)))
    }

    /// Parses an RFC3339 timestamp string.
    ///
    /// # Errors
    ///
    /// Returns the underlying parse error when the input is not RFC3339.
    pub fn parse_rfc3339(value: &str) -> Result<Self, time::error::Parse> {
        OffsetDateTime::parse(value, &Rfc3339).map(Self)
    }

    /// Renders the timestamp as an RFC3339 string.
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.0.format(&Rfc3339).unwrap_or_default()
    }

    /// Returns the timestamp as unix seconds.
    #[must_use]
    pub const fn unix_seconds(&self) -> i64 {
        self.0.unix_timestamp()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

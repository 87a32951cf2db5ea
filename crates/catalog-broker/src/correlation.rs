// crates/catalog-broker/src/correlation.rs
// ============================================================================
// Module: Correlation Policy
// Description: Sanitization and generation for request correlation IDs.
// Purpose: Provide deterministic, fail-closed correlation handling at ingress.
// Dependencies: catalog-core, rand
// ============================================================================

//! ## Overview
//! A correlation identifier follows one logical request through event
//! envelopes, outbound calls, and log entries. Client-provided values
//! arrive on the `X-Correlation-ID` header and are untrusted; invalid
//! inputs are rejected with a structured reason. When no header is present
//! the ingress boundary generates a fresh value from a boot-scoped random
//! seed plus a monotonic counter.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use catalog_core::CorrelationId;
use rand::RngCore;
use rand::rngs::OsRng;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header name for client-provided correlation identifiers.
pub const CORRELATION_HEADER: &str = "x-correlation-id";
/// Maximum allowed length for client correlation identifiers.
pub const MAX_CORRELATION_ID_LENGTH: usize = 128;

// ============================================================================
// SECTION: Rejection Reasons
// ============================================================================

/// Typed rejection reason for invalid client correlation IDs.
///
/// # Invariants
/// - Variants are stable for audit labeling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrelationIdRejection {
    /// Input was empty after trimming.
    EmptyAfterTrim,
    /// Input exceeded the maximum length.
    TooLong,
    /// Input contained whitespace after trimming.
    ContainsWhitespace,
    /// Input contained control characters after trimming.
    ContainsControlChar,
    /// Input contained non-ASCII characters.
    NonAscii,
    /// Input contained disallowed ASCII characters.
    ContainsDisallowedChar,
}

impl CorrelationIdRejection {
    /// Returns a stable label for this rejection reason.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::EmptyAfterTrim => "empty_after_trim",
            Self::TooLong => "too_long",
            Self::ContainsWhitespace => "contains_whitespace",
            Self::ContainsControlChar => "contains_control_char",
            Self::NonAscii => "non_ascii",
            Self::ContainsDisallowedChar => "contains_disallowed_char",
        }
    }
}

impl fmt::Display for CorrelationIdRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// SECTION: Generation
// ============================================================================

/// Boot-scoped correlation ID generator.
///
/// # Invariants
/// - Issued identifiers are unique within the process lifetime.
#[derive(Debug)]
pub struct CorrelationIdGenerator {
    /// Prefix included in every generated correlation ID.
    prefix: &'static str,
    /// Boot-scoped random identifier for entropy.
    boot_id: u64,
    /// Monotonic counter for IDs issued in this process.
    counter: AtomicU64,
}

impl CorrelationIdGenerator {
    /// Creates a new generator with the given prefix.
    #[must_use]
    pub fn new(prefix: &'static str) -> Self {
        let mut bytes = [0u8; 8];
        OsRng.fill_bytes(&mut bytes);
        Self {
            prefix,
            boot_id: u64::from_be_bytes(bytes),
            counter: AtomicU64::new(1),
        }
    }

    /// Issues a new correlation ID.
    #[must_use]
    pub fn issue(&self) -> CorrelationId {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        CorrelationId::new(format!("{}-{:016x}-{:016x}", self.prefix, self.boot_id, seq))
    }
}

/// Resolves the correlation id for one request: sanitized header value when
/// valid, otherwise a freshly generated id.
#[must_use]
pub fn resolve_correlation_id(
    header: Option<&str>,
    generator: &CorrelationIdGenerator,
) -> CorrelationId {
    match sanitize_correlation_id(header) {
        Ok(Some(id)) => id,
        Ok(None) | Err(_) => generator.issue(),
    }
}

/// Sanitizes a client correlation ID using strict token rules.
///
/// Returns `Ok(None)` when no header value is provided. Any invalid value
/// returns a structured rejection reason.
///
/// # Errors
/// Returns [`CorrelationIdRejection`] when the value is empty, too long,
/// or contains disallowed characters.
pub fn sanitize_correlation_id(
    value: Option<&str>,
) -> Result<Option<CorrelationId>, CorrelationIdRejection> {
    let Some(value) = value else {
        return Ok(None);
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CorrelationIdRejection::EmptyAfterTrim);
    }
    if trimmed.len() > MAX_CORRELATION_ID_LENGTH {
        return Err(CorrelationIdRejection::TooLong);
    }
    for ch in trimmed.chars() {
        if !ch.is_ascii() {
            return Err(CorrelationIdRejection::NonAscii);
        }
        if ch.is_ascii_whitespace() {
            return Err(CorrelationIdRejection::ContainsWhitespace);
        }
        if ch.is_control() {
            return Err(CorrelationIdRejection::ContainsControlChar);
        }
        if !is_tchar(ch) {
            return Err(CorrelationIdRejection::ContainsDisallowedChar);
        }
    }
    Ok(Some(CorrelationId::new(trimmed)))
}

/// Returns true when the character is a valid HTTP token character.
const fn is_tchar(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
        || matches!(
            ch,
            '!' | '#'
                | '$'
                | '%'
                | '&'
                | '\''
                | '*'
                | '+'
                | '-'
                | '.'
                | '^'
                | '_'
                | '`'
                | '|'
                | '~'
        )
}

// ============================================================================
// SECTION: Tests
// ============================================================================

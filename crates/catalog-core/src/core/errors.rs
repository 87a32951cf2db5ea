// crates/catalog-core/src/core/errors.rs
// ============================================================================
// Module: Product Catalog Error Taxonomy
// Description: Domain error kinds with HTTP mapping and transience classification.
// Purpose: Provide one error vocabulary shared by engines, stores, and the router.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Engines surface [`CatalogError`] values; HTTP collaborators map them to
//! status codes and the event router maps them to ack/retry/drop outcomes.
//! Only [`CatalogError::StoreUnavailable`] is transient; everything else is
//! permanent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use thiserror::Error;

use crate::core::badge::BadgeType;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Conflict Kinds
// ============================================================================

/// Uniqueness or state conflicts surfaced as 409s.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// Another active product already carries the SKU.
    DuplicateSku,
    /// A badge of the same type is already attached.
    DuplicateBadge,
    /// A sibling variation already uses the attribute tuple.
    DuplicateAttributeTuple,
    /// Reactivation requested for an already-active entity.
    AlreadyActive,
}

impl ConflictKind {
    /// Returns a stable label for this conflict kind.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::DuplicateSku => "duplicate_sku",
            Self::DuplicateBadge => "duplicate_badge",
            Self::DuplicateAttributeTuple => "duplicate_attribute_tuple",
            Self::AlreadyActive => "already_active",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// SECTION: Domain Errors
// ============================================================================

/// Domain error taxonomy for catalog operations.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - `http_status` and `is_transient` are total over all variants.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Caller supplied malformed or contradictory input.
    #[error("validation failure: {0}")]
    Validation(String),
    /// Referenced entity does not exist or is not active.
    #[error("not found: {0}")]
    NotFound(String),
    /// A uniqueness or state invariant would be violated.
    #[error("conflict ({kind}): {message}")]
    Conflict {
        /// Conflict classification.
        kind: ConflictKind,
        /// Human-readable conflict description.
        message: String,
    },
    /// Non-admin attempted an admin operation.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Missing or invalid credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Transient downstream failure.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    /// Bug or unexpected failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CatalogError {
    /// Builds a duplicate-SKU conflict.
    #[must_use]
    pub fn duplicate_sku(sku: &str) -> Self {
        Self::Conflict {
            kind: ConflictKind::DuplicateSku,
            message: format!("sku '{sku}' already exists on an active product"),
        }
    }

    /// Builds a duplicate-badge conflict.
    #[must_use]
    pub fn duplicate_badge(badge_type: BadgeType) -> Self {
        Self::Conflict {
            kind: ConflictKind::DuplicateBadge,
            message: format!("badge '{badge_type}' is already assigned"),
        }
    }

    /// Builds a duplicate-attribute-tuple conflict.
    #[must_use]
    pub fn duplicate_attribute_tuple() -> Self {
        Self::Conflict {
            kind: ConflictKind::DuplicateAttributeTuple,
            message: "a sibling variation already uses this attribute combination".to_string(),
        }
    }

    /// Returns the HTTP status code for this error kind.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict {
                ..
            } => 409,
            Self::StoreUnavailable(_) => 503,
            Self::Internal(_) => 500,
        }
    }

    /// Returns true when the failure may succeed on retry.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(message) => Self::StoreUnavailable(message),
            StoreError::Rejected(message) => Self::Internal(message),
            StoreError::DuplicateSku {
                sku,
            } => Self::duplicate_sku(&sku),
        }
    }
}

// crates/catalog-core/src/interfaces/mod.rs
// ============================================================================
// Module: Product Catalog Interfaces
// Description: Backend-agnostic interfaces for storage and event publication.
// Purpose: Define the capability surfaces the engines depend on.
// Dependencies: crate::core, async-trait, serde, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the catalog engines integrate with the document
//! store and the pub/sub broker without embedding backend details. All
//! mutation flows through the store's atomic update primitives; publish
//! failures never roll back the originating state change.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::BadgeType;
use crate::core::ChartId;
use crate::core::CorrelationId;
use crate::core::ImportJob;
use crate::core::JobId;
use crate::core::Product;
use crate::core::ProductId;
use crate::core::SizeChart;
use crate::core::Sku;

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Errors surfaced by product store implementations.
///
/// # Invariants
/// - `Unavailable` is the only transient variant.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transient downstream failure; the operation may succeed on retry.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// Permanent failure; the operation will not succeed on retry.
    #[error("store rejected operation: {0}")]
    Rejected(String),
    /// Insert collided with an active product's SKU.
    #[error("duplicate sku: {sku}")]
    DuplicateSku {
        /// The colliding SKU value.
        sku: String,
    },
}

// ============================================================================
// SECTION: Query Types
// ============================================================================

/// Structured predicate for product queries.
///
/// All present fields must match (conjunction). Tag matching requires every
/// listed tag; text matching targets name, description, tags, and search
/// keywords case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    /// Match on top-level taxonomy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// Match on second-level taxonomy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Match on third-level taxonomy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    /// Match on brand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Inclusive lower price bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_min: Option<f64>,
    /// Inclusive upper price bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_max: Option<f64>,
    /// Tags that must all be present.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Match products carrying a badge of this type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge_type: Option<BadgeType>,
    /// Match products carrying at least one badge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_badges: Option<bool>,
    /// Match children of this parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ProductId>,
    /// Match on the soft-delete flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    /// Free-text query over searchable fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ProductFilter {
    /// Returns a filter matching all active products.
    #[must_use]
    pub fn active() -> Self {
        Self {
            is_active: Some(true),
            ..Self::default()
        }
    }
}

/// Offset/limit paging window.
///
/// # Invariants
/// - `limit` is clamped by implementations to [`Paging::MAX_LIMIT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    /// Rows to skip.
    pub offset: u64,
    /// Maximum rows to return.
    pub limit: u64,
}

impl Paging {
    /// Largest page size implementations will serve.
    pub const MAX_LIMIT: u64 = 1_000;

    /// Creates a paging window.
    #[must_use]
    pub const fn new(offset: u64, limit: u64) -> Self {
        Self {
            offset,
            limit,
        }
    }

    /// Returns the limit clamped to [`Self::MAX_LIMIT`].
    #[must_use]
    pub const fn clamped_limit(&self) -> u64 {
        if self.limit > Self::MAX_LIMIT { Self::MAX_LIMIT } else { self.limit }
    }
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// One page of query results with the unpaged total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Rows in this page.
    pub items: Vec<T>,
    /// Total matching rows ignoring paging.
    pub total: u64,
}

/// Operational description of one store index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexInfo {
    /// Index name.
    pub name: String,
    /// Indexed keys in order.
    pub keys: Vec<String>,
    /// True for uniqueness-enforcing indexes.
    pub unique: bool,
    /// True when the index skips documents missing the key.
    pub sparse: bool,
}

// ============================================================================
// SECTION: Product Store
// ============================================================================

/// Document store capability for products, import jobs, and size charts.
///
/// Concurrent writes to disjoint fields of the same product succeed
/// independently; writes to the same field are linearized by the atomic
/// update primitives.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Persists a new product and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateSku`] when the SKU collides with an
    /// active product, or another [`StoreError`] on failure.
    async fn create_product(&self, product: &Product) -> Result<ProductId, StoreError>;

    /// Loads a product by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store fails.
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError>;

    /// Finds a product by SKU.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store fails.
    async fn find_by_sku(&self, sku: &Sku, active_only: bool)
    -> Result<Option<Product>, StoreError>;

    /// Runs a structured query with paging.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store fails.
    async fn find_many(
        &self,
        filter: &ProductFilter,
        paging: Paging,
    ) -> Result<Page<Product>, StoreError>;

    /// Sets dot-notation fields on a product document atomically.
    ///
    /// Returns the number of documents modified (0 or 1).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store fails.
    async fn atomic_set(
        &self,
        id: &ProductId,
        fields: &[(String, Value)],
    ) -> Result<u64, StoreError>;

    /// Appends a value to an array field atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store fails.
    async fn atomic_push(
        &self,
        id: &ProductId,
        field: &str,
        value: Value,
    ) -> Result<u64, StoreError>;

    /// Adds a signed delta to a numeric field atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store fails.
    async fn atomic_inc(&self, id: &ProductId, field: &str, delta: i64)
    -> Result<u64, StoreError>;

    /// Inserts a batch of products as one operation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateSku`] on the first collision; no
    /// documents are inserted in that case.
    async fn insert_many(&self, products: &[Product]) -> Result<Vec<ProductId>, StoreError>;

    /// Weighted text search over name, description, tags, and keywords.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store fails.
    async fn search_text(
        &self,
        query: &str,
        filter: &ProductFilter,
        paging: Paging,
    ) -> Result<Page<Product>, StoreError>;

    /// Enumerates the indexes backing the product collection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store fails.
    async fn list_indexes(&self) -> Result<Vec<IndexInfo>, StoreError>;

    /// Persists a new import job record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store fails.
    async fn create_import_job(&self, job: &ImportJob) -> Result<(), StoreError>;

    /// Loads an import job by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store fails.
    async fn get_import_job(&self, job_id: &JobId) -> Result<Option<ImportJob>, StoreError>;

    /// Atomically transitions a job `pending -> processing`.
    ///
    /// Returns true when this caller won the claim; false when the job is
    /// missing or was already claimed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store fails.
    async fn claim_import_job(&self, job_id: &JobId) -> Result<bool, StoreError>;

    /// Overwrites an existing import job record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store fails.
    async fn update_import_job(&self, job: &ImportJob) -> Result<(), StoreError>;

    /// Persists or replaces a size chart.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store fails.
    async fn put_size_chart(&self, chart: &SizeChart) -> Result<(), StoreError>;

    /// Loads a size chart by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store fails.
    async fn get_size_chart(&self, id: &ChartId) -> Result<Option<SizeChart>, StoreError>;
}

// ============================================================================
// SECTION: Event Publisher
// ============================================================================

/// Errors surfaced by event publication.
///
/// # Invariants
/// - Publish failures never roll back the originating state change.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The underlying transport failed to accept the envelope.
    #[error("event transport failure: {0}")]
    Transport(String),
}

/// Optional envelope attributes supplied per publish call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PublishOptions {
    /// Optional envelope subject, e.g. `product/{id}`.
    pub subject: Option<String>,
    /// Optional correlation identifier from the originating request.
    pub correlation_id: Option<CorrelationId>,
}

impl PublishOptions {
    /// Builds options with a `product/{id}` subject.
    #[must_use]
    pub fn for_product(id: &ProductId, correlation_id: Option<CorrelationId>) -> Self {
        Self {
            subject: Some(format!("product/{id}")),
            correlation_id,
        }
    }
}

/// Capability for emitting domain events to the pub/sub broker.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes an event payload on a topic.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] when the transport rejects the envelope.
    /// Callers log the failure and continue; the business operation must
    /// remain successful.
    async fn publish(
        &self,
        topic: &str,
        data: Value,
        opts: PublishOptions,
    ) -> Result<(), PublishError>;
}

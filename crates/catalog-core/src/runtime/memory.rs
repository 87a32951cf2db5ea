// crates/catalog-core/src/runtime/memory.rs
// ============================================================================
// Module: In-Memory Product Store
// Description: Simple in-memory store and capture publisher for tests and demos.
// Purpose: Provide deterministic capability implementations without external deps.
// Dependencies: crate::{core, interfaces}, async-trait, serde_json
// ============================================================================

//! ## Overview
//! This module provides in-memory implementations of [`ProductStore`] and
//! [`EventPublisher`] for tests and local demos. They are not intended for
//! production use. The store applies dot-path updates against the document's
//! JSON projection, matching the patch semantics of the durable store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Map;
use serde_json::Value;

use crate::core::ChartId;
use crate::core::ImportJob;
use crate::core::ImportJobStatus;
use crate::core::JobId;
use crate::core::Product;
use crate::core::ProductId;
use crate::core::SizeChart;
use crate::core::Sku;
use crate::interfaces::EventPublisher;
use crate::interfaces::IndexInfo;
use crate::interfaces::Page;
use crate::interfaces::Paging;
use crate::interfaces::ProductFilter;
use crate::interfaces::ProductStore;
use crate::interfaces::PublishError;
use crate::interfaces::PublishOptions;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory product store for tests and examples.
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    /// Product documents keyed by identifier.
    products: Mutex<BTreeMap<String, Product>>,
    /// Import job records keyed by identifier.
    jobs: Mutex<BTreeMap<String, ImportJob>>,
    /// Size chart documents keyed by identifier.
    charts: Mutex<BTreeMap<String, SizeChart>>,
}

impl InMemoryProductStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a mutex-poisoning store error.
    fn poisoned() -> StoreError {
        StoreError::Unavailable("in-memory store mutex poisoned".to_string())
    }

    /// Checks whether an active product already carries the SKU.
    fn sku_taken(products: &BTreeMap<String, Product>, sku: &Sku, except: &ProductId) -> bool {
        products.values().any(|candidate| {
            candidate.is_active
                && candidate.id != *except
                && candidate.sku.as_ref() == Some(sku)
        })
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn create_product(&self, product: &Product) -> Result<ProductId, StoreError> {
        let mut products = self.products.lock().map_err(|_| Self::poisoned())?;
        if product.is_active
            && let Some(sku) = &product.sku
            && Self::sku_taken(&products, sku, &product.id)
        {
            return Err(StoreError::DuplicateSku {
                sku: sku.as_str().to_string(),
            });
        }
        products.insert(product.id.as_str().to_string(), product.clone());
        Ok(product.id.clone())
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        let products = self.products.lock().map_err(|_| Self::poisoned())?;
        Ok(products.get(id.as_str()).cloned())
    }

    async fn find_by_sku(
        &self,
        sku: &Sku,
        active_only: bool,
    ) -> Result<Option<Product>, StoreError> {
        let products = self.products.lock().map_err(|_| Self::poisoned())?;
        Ok(products
            .values()
            .find(|product| {
                product.sku.as_ref() == Some(sku) && (!active_only || product.is_active)
            })
            .cloned())
    }

    async fn find_many(
        &self,
        filter: &ProductFilter,
        paging: Paging,
    ) -> Result<Page<Product>, StoreError> {
        let products = self.products.lock().map_err(|_| Self::poisoned())?;
        let matched: Vec<Product> =
            products.values().filter(|product| matches_filter(product, filter)).cloned().collect();
        Ok(page_of(matched, paging))
    }

    async fn atomic_set(
        &self,
        id: &ProductId,
        fields: &[(String, Value)],
    ) -> Result<u64, StoreError> {
        self.patch_document(id, |document| {
            for (path, value) in fields {
                set_path(document, path, value.clone());
            }
        })
        .await
    }

    async fn atomic_push(
        &self,
        id: &ProductId,
        field: &str,
        value: Value,
    ) -> Result<u64, StoreError> {
        self.patch_document(id, |document| push_path(document, field, value.clone())).await
    }

    async fn atomic_inc(
        &self,
        id: &ProductId,
        field: &str,
        delta: i64,
    ) -> Result<u64, StoreError> {
        self.patch_document(id, |document| inc_path(document, field, delta)).await
    }

    async fn insert_many(&self, batch: &[Product]) -> Result<Vec<ProductId>, StoreError> {
        let mut products = self.products.lock().map_err(|_| Self::poisoned())?;
        let mut batch_skus = std::collections::BTreeSet::new();
        for product in batch {
            if product.is_active
                && let Some(sku) = &product.sku
                && (Self::sku_taken(&products, sku, &product.id)
                    || !batch_skus.insert(sku.as_str().to_string()))
            {
                return Err(StoreError::DuplicateSku {
                    sku: sku.as_str().to_string(),
                });
            }
        }
        let mut ids = Vec::with_capacity(batch.len());
        for product in batch {
            products.insert(product.id.as_str().to_string(), product.clone());
            ids.push(product.id.clone());
        }
        Ok(ids)
    }

    async fn search_text(
        &self,
        query: &str,
        filter: &ProductFilter,
        paging: Paging,
    ) -> Result<Page<Product>, StoreError> {
        let products = self.products.lock().map_err(|_| Self::poisoned())?;
        let mut scored: Vec<(u32, Product)> = products
            .values()
            .filter(|product| matches_filter(product, filter))
            .filter_map(|product| {
                let score = text_score(product, query);
                (score > 0).then(|| (score, product.clone()))
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        let matched: Vec<Product> = scored.into_iter().map(|(_, product)| product).collect();
        Ok(page_of(matched, paging))
    }

    async fn list_indexes(&self) -> Result<Vec<IndexInfo>, StoreError> {
        Ok(vec![IndexInfo {
            name: "memory".to_string(),
            keys: vec!["id".to_string()],
            unique: true,
            sparse: false,
        }])
    }

    async fn create_import_job(&self, job: &ImportJob) -> Result<(), StoreError> {
        let mut jobs = self.jobs.lock().map_err(|_| Self::poisoned())?;
        jobs.insert(job.job_id.as_str().to_string(), job.clone());
        Ok(())
    }

    async fn get_import_job(&self, job_id: &JobId) -> Result<Option<ImportJob>, StoreError> {
        let jobs = self.jobs.lock().map_err(|_| Self::poisoned())?;
        Ok(jobs.get(job_id.as_str()).cloned())
    }

    async fn claim_import_job(&self, job_id: &JobId) -> Result<bool, StoreError> {
        let mut jobs = self.jobs.lock().map_err(|_| Self::poisoned())?;
        match jobs.get_mut(job_id.as_str()) {
            Some(job) if job.status == ImportJobStatus::Pending => {
                job.status = ImportJobStatus::Processing;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_import_job(&self, job: &ImportJob) -> Result<(), StoreError> {
        let mut jobs = self.jobs.lock().map_err(|_| Self::poisoned())?;
        jobs.insert(job.job_id.as_str().to_string(), job.clone());
        Ok(())
    }

    async fn put_size_chart(&self, chart: &SizeChart) -> Result<(), StoreError> {
        let mut charts = self.charts.lock().map_err(|_| Self::poisoned())?;
        charts.insert(chart.chart_id.as_str().to_string(), chart.clone());
        Ok(())
    }

    async fn get_size_chart(&self, id: &ChartId) -> Result<Option<SizeChart>, StoreError> {
        let charts = self.charts.lock().map_err(|_| Self::poisoned())?;
        Ok(charts.get(id.as_str()).cloned())
    }
}

impl InMemoryProductStore {
    /// Applies a JSON patch to one document inside the store lock.
    async fn patch_document<F: FnOnce(&mut Value)>(
        &self,
        id: &ProductId,
        patch: F,
    ) -> Result<u64, StoreError> {
        let mut products = self.products.lock().map_err(|_| Self::poisoned())?;
        let Some(product) = products.get(id.as_str()) else {
            return Ok(0);
        };
        let mut document = serde_json::to_value(product)
            .map_err(|err| StoreError::Rejected(err.to_string()))?;
        patch(&mut document);
        let updated: Product = serde_json::from_value(document)
            .map_err(|err| StoreError::Rejected(err.to_string()))?;
        products.insert(id.as_str().to_string(), updated);
        Ok(1)
    }
}

// ============================================================================
// SECTION: Document Patch Helpers
// ============================================================================

/// Sets a dot-path member, creating intermediate objects as needed.
pub fn set_path(document: &mut Value, path: &str, value: Value) {
    let mut current = document;
    let mut parts = path.split('.').peekable();
    while let Some(part) = parts.next() {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Some(object) = current.as_object_mut() else {
            return;
        };
        if parts.peek().is_none() {
            object.insert(part.to_string(), value);
            return;
        }
        current = object.entry(part.to_string()).or_insert_with(|| Value::Object(Map::new()));
    }
}

/// Appends to a dot-path array member, creating it as needed.
pub fn push_path(document: &mut Value, path: &str, value: Value) {
    let mut current = document;
    let mut parts = path.split('.').peekable();
    while let Some(part) = parts.next() {
        let Some(object) = current.as_object_mut() else {
            return;
        };
        if parts.peek().is_none() {
            let entry = object.entry(part.to_string()).or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(items) = entry {
                items.push(value);
            }
            return;
        }
        current = object.entry(part.to_string()).or_insert_with(|| Value::Object(Map::new()));
    }
}

/// Adds a signed delta to a dot-path numeric member, creating it at zero.
pub fn inc_path(document: &mut Value, path: &str, delta: i64) {
    let mut current = document;
    let mut parts = path.split('.').peekable();
    while let Some(part) = parts.next() {
        let Some(object) = current.as_object_mut() else {
            return;
        };
        if parts.peek().is_none() {
            let entry = object.entry(part.to_string()).or_insert_with(|| Value::from(0));
            let updated = entry.as_i64().unwrap_or(0).saturating_add(delta);
            *entry = Value::from(updated);
            return;
        }
        current = object.entry(part.to_string()).or_insert_with(|| Value::Object(Map::new()));
    }
}

// ============================================================================
// SECTION: Query Helpers
// ============================================================================

/// Applies a structured filter to one product.
#[must_use]
pub fn matches_filter(product: &Product, filter: &ProductFilter) -> bool {
    if let Some(is_active) = filter.is_active
        && product.is_active != is_active
    {
        return false;
    }
    if let Some(department) = &filter.department
        && product.department.as_deref() != Some(department.as_str())
    {
        return false;
    }
    if let Some(category) = &filter.category
        && product.category.as_deref() != Some(category.as_str())
    {
        return false;
    }
    if let Some(subcategory) = &filter.subcategory
        && product.subcategory.as_deref() != Some(subcategory.as_str())
    {
        return false;
    }
    if let Some(brand) = &filter.brand
        && product.brand.as_deref() != Some(brand.as_str())
    {
        return false;
    }
    if let Some(price_min) = filter.price_min
        && product.price < price_min
    {
        return false;
    }
    if let Some(price_max) = filter.price_max
        && product.price > price_max
    {
        return false;
    }
    if !filter.tags.iter().all(|tag| product.tags.contains(tag)) {
        return false;
    }
    if let Some(badge_type) = filter.badge_type
        && !product.has_badge(badge_type)
    {
        return false;
    }
    if let Some(has_badges) = filter.has_badges
        && product.badges.is_empty() == has_badges
    {
        return false;
    }
    if let Some(parent_id) = &filter.parent_id
        && product.parent_id.as_ref() != Some(parent_id)
    {
        return false;
    }
    if let Some(text) = &filter.text
        && text_score(product, text) == 0
    {
        return false;
    }
    true
}

/// Computes the weighted text score (name 10, description 2, tags 5, keywords 5).
#[must_use]
pub fn text_score(product: &Product, query: &str) -> u32 {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return 0;
    }
    let mut score = 0;
    if product.name.to_lowercase().contains(&needle) {
        score += 10;
    }
    if product
        .description
        .as_ref()
        .is_some_and(|description| description.to_lowercase().contains(&needle))
    {
        score += 2;
    }
    if product.tags.iter().any(|tag| tag.to_lowercase().contains(&needle)) {
        score += 5;
    }
    if product.search_keywords.iter().any(|keyword| keyword.to_lowercase().contains(&needle)) {
        score += 5;
    }
    score
}

/// Slices matched rows into one page with the unpaged total.
fn page_of(matched: Vec<Product>, paging: Paging) -> Page<Product> {
    let total = matched.len() as u64;
    let offset = usize::try_from(paging.offset).unwrap_or(usize::MAX);
    let limit = usize::try_from(paging.clamped_limit()).unwrap_or(usize::MAX);
    let items = matched.into_iter().skip(offset).take(limit).collect();
    Page {
        items,
        total,
    }
}

// ============================================================================
// SECTION: Capture Publisher
// ============================================================================

/// One captured publish call.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedEvent {
    /// Topic the payload was published on.
    pub topic: String,
    /// Event payload.
    pub data: Value,
    /// Options supplied with the publish call.
    pub opts: PublishOptions,
}

/// Publisher that records every publish call for assertions.
#[derive(Debug, Default)]
pub struct CapturePublisher {
    /// Captured publish calls in order.
    events: Mutex<Vec<CapturedEvent>>,
    /// When true, every publish fails with a transport error.
    fail: bool,
}

impl CapturePublisher {
    /// Creates a capture publisher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a capture publisher whose publishes always fail.
    #[must_use]
    pub const fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Returns the captured events so far.
    #[must_use]
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Returns the captured events for one topic.
    #[must_use]
    pub fn events_for(&self, topic: &str) -> Vec<CapturedEvent> {
        self.events().into_iter().filter(|event| event.topic == topic).collect()
    }
}

#[async_trait]
impl EventPublisher for CapturePublisher {
    async fn publish(
        &self,
        topic: &str,
        data: Value,
        opts: PublishOptions,
    ) -> Result<(), PublishError> {
        if self.fail {
            return Err(PublishError::Transport("capture publisher configured to fail".into()));
        }
        self.events
            .lock()
            .map_err(|_| PublishError::Transport("capture publisher mutex poisoned".into()))?
            .push(CapturedEvent {
                topic: topic.to_string(),
                data,
                opts,
            });
        Ok(())
    }
}

/// Shared handle to an in-memory store.
pub type SharedMemoryStore = Arc<InMemoryProductStore>;

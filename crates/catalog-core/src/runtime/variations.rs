// crates/catalog-core/src/runtime/variations.rs
// ============================================================================
// Module: Variation Engine
// Description: Parent/child product families with inheritance and uniqueness.
// Purpose: Enforce variation invariants and serve the unified matrix view.
// Dependencies: crate::{core, interfaces}, serde, tracing
// ============================================================================

//! ## Overview
//! A parent product groups up to [`MAX_CHILDREN`] child variations. Children
//! inherit department, category, subcategory, and brand from the parent at
//! creation; tags are unioned and specifications merge with child overrides.
//! Invariants:
//! - Child SKUs are globally unique and mutually unique within a request.
//! - No two active children of one parent share a normalized attribute
//!   tuple (case-insensitive, sorted by attribute name).
//! - `variationCount` on the parent tracks its active children.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use tracing::info;
use tracing::warn;

use crate::core::ActorId;
use crate::core::CatalogError;
use crate::core::CorrelationId;
use crate::core::HistoryEntry;
use crate::core::Product;
use crate::core::ProductId;
use crate::core::Sku;
use crate::core::StockState;
use crate::core::Timestamp;
use crate::core::VariantAttribute;
use crate::core::VariationKind;
use crate::core::attribute_index;
use crate::core::normalize_attribute_tuple;
use crate::core::topics;
use crate::interfaces::EventPublisher;
use crate::interfaces::Paging;
use crate::interfaces::ProductFilter;
use crate::interfaces::ProductStore;
use crate::interfaces::PublishOptions;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum children accepted for one parent.
pub const MAX_CHILDREN: usize = 1_000;

// ============================================================================
// SECTION: Operation Inputs
// ============================================================================

/// Caller-supplied fields for the parent of a variation family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ParentSpec {
    /// Display name.
    pub name: String,
    /// Long-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Brand inherited by every child.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Top-level taxonomy inherited by every child.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// Second-level taxonomy inherited by every child.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Third-level taxonomy inherited by every child.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    /// Reference price shown before a child is selected.
    #[serde(default)]
    pub base_price: f64,
    /// Image URLs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    /// Tags applied to the parent and unioned into children.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Specifications merged into children (child values win).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub specifications: BTreeMap<String, String>,
}

/// Caller-supplied fields for one child variation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildSpec {
    /// Child SKU; globally unique.
    pub sku: Sku,
    /// Display name; falls back to the parent name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Child price.
    pub price: f64,
    /// Long-form description; falls back to the parent description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Child-specific image URLs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    /// Child-specific tags, unioned with the parent tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Child specification overrides.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub specifications: BTreeMap<String, String>,
    /// Variant attribute tuple; unique within the family.
    pub attributes: Vec<VariantAttribute>,
}

impl Default for ChildSpec {
    fn default() -> Self {
        Self {
            sku: Sku::new(""),
            name: None,
            price: 0.0,
            description: None,
            images: Vec::new(),
            tags: Vec::new(),
            specifications: BTreeMap::new(),
            attributes: Vec::new(),
        }
    }
}

/// Field updates accepted for a child variation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChildUpdate {
    /// New display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Replacement image URLs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Replacement variant attributes; re-checked for uniqueness.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<VariantAttribute>>,
    /// Specification overlay; replaces the child's map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specifications: Option<BTreeMap<String, String>>,
    /// Replacement tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Soft-delete or reactivate the child.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl ChildUpdate {
    /// Returns true when no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.images.is_none()
            && self.description.is_none()
            && self.attributes.is_none()
            && self.specifications.is_none()
            && self.tags.is_none()
            && self.is_active.is_none()
    }
}

// ============================================================================
// SECTION: Views
// ============================================================================

/// One row of the variation matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixEntry {
    /// Child SKU.
    pub sku: Sku,
    /// Lowercased attribute name to value.
    pub attributes: BTreeMap<String, String>,
    /// Child price.
    pub price: f64,
    /// True when the child is purchasable (not out of stock).
    pub available: bool,
    /// Child images, when any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

/// Parent fields plus the assembled variation matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentView {
    /// Parent identifier.
    pub parent_id: ProductId,
    /// Parent display name.
    pub name: String,
    /// Parent description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Parent brand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Parent top-level taxonomy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// Parent second-level taxonomy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Parent third-level taxonomy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    /// Parent images.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    /// Parent tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Parent specifications.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub specifications: BTreeMap<String, String>,
    /// Ordered variation matrix.
    pub variations: Vec<MatrixEntry>,
    /// Number of matrix rows.
    pub total_variations: u64,
}

/// Identifiers created by [`VariationEngine::create_parent_with_children`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedFamily {
    /// Parent identifier.
    pub parent_id: ProductId,
    /// Child identifiers in request order.
    pub child_ids: Vec<ProductId>,
}

// ============================================================================
// SECTION: Variation Engine
// ============================================================================

/// Enforces parent/child invariants and serves the matrix view.
pub struct VariationEngine<S, P> {
    /// Product store used for lookups and writes.
    store: Arc<S>,
    /// Publisher for variation lifecycle events.
    publisher: Arc<P>,
    /// Identifier factory for new documents.
    ids: Arc<dyn Fn() -> ProductId + Send + Sync>,
}

impl<S, P> VariationEngine<S, P>
where
    S: ProductStore,
    P: EventPublisher,
{
    /// Creates a variation engine with an identifier factory.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        publisher: Arc<P>,
        ids: Arc<dyn Fn() -> ProductId + Send + Sync>,
    ) -> Self {
        Self {
            store,
            publisher,
            ids,
        }
    }

    /// Creates a parent with its children in one validated operation.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] for empty or oversized families,
    /// a duplicate-SKU conflict for colliding SKUs, and a
    /// duplicate-attribute-tuple conflict for repeated tuples.
    pub async fn create_parent_with_children(
        &self,
        parent: ParentSpec,
        children: Vec<ChildSpec>,
        creator: &ActorId,
        now: Timestamp,
        correlation_id: Option<&CorrelationId>,
    ) -> Result<CreatedFamily, CatalogError> {
        if children.is_empty() {
            return Err(CatalogError::Validation(
                "a variation family requires at least one child".to_string(),
            ));
        }
        if children.len() > MAX_CHILDREN {
            return Err(CatalogError::Validation(format!(
                "a variation family supports at most {MAX_CHILDREN} children"
            )));
        }
        validate_mutual_skus(&children)?;
        validate_mutual_tuples(&children)?;
        for child in &children {
            if self.store.find_by_sku(&child.sku, true).await?.is_some() {
                return Err(CatalogError::duplicate_sku(child.sku.as_str()));
            }
            validate_child_price(child)?;
        }

        let parent_id = (self.ids)();
        let child_count = u32::try_from(children.len()).unwrap_or(u32::MAX);
        let parent_doc = build_parent(&parent, parent_id.clone(), child_count, creator, now);
        self.store.create_product(&parent_doc).await?;

        let mut child_ids = Vec::with_capacity(children.len());
        for child in children {
            let child_id = (self.ids)();
            let child_doc =
                build_child(&parent, &parent_id, child, child_id.clone(), creator, now);
            self.store.create_product(&child_doc).await?;
            child_ids.push(child_id);
        }

        self.emit_variation_event(
            topics::VARIATION_CREATED,
            &parent_id,
            json!({
                "parentId": parent_id,
                "variationIds": child_ids,
                "variationCount": child_ids.len(),
            }),
            correlation_id,
        )
        .await;
        info!(parent_id = %parent_id, children = child_ids.len(), "variation family created");
        Ok(CreatedFamily {
            parent_id,
            child_ids,
        })
    }

    /// Adds one child to an existing parent.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] for a missing parent, a
    /// duplicate-SKU conflict for a colliding SKU, and a
    /// duplicate-attribute-tuple conflict for a repeated tuple.
    pub async fn add_child(
        &self,
        parent_id: &ProductId,
        child: ChildSpec,
        creator: &ActorId,
        now: Timestamp,
        correlation_id: Option<&CorrelationId>,
    ) -> Result<ProductId, CatalogError> {
        let parent = self.require_parent(parent_id).await?;
        validate_child_price(&child)?;
        if self.store.find_by_sku(&child.sku, true).await?.is_some() {
            return Err(CatalogError::duplicate_sku(child.sku.as_str()));
        }
        let siblings = self.active_children(parent_id).await?;
        let tuple = normalize_attribute_tuple(&child.attributes);
        for sibling in &siblings {
            let sibling_tuple =
                normalize_attribute_tuple(sibling.variant_attributes.as_deref().unwrap_or(&[]));
            if sibling_tuple == tuple {
                return Err(CatalogError::duplicate_attribute_tuple());
            }
        }

        let parent_spec = parent_as_spec(&parent);
        let child_id = (self.ids)();
        let child_doc =
            build_child(&parent_spec, parent_id, child, child_id.clone(), creator, now);
        self.store.create_product(&child_doc).await?;
        self.store.atomic_inc(parent_id, "variationCount", 1).await?;
        self.store
            .atomic_set(parent_id, &[(
                "updatedAt".to_string(),
                serde_json::to_value(now).map_err(|err| CatalogError::Internal(err.to_string()))?,
            )])
            .await?;

        self.emit_variation_event(
            topics::VARIATION_CREATED,
            &child_id,
            json!({
                "parentId": parent_id,
                "variationIds": [child_id],
                "variationCount": siblings.len() + 1,
            }),
            correlation_id,
        )
        .await;
        Ok(child_id)
    }

    /// Updates child-scoped fields, re-checking tuple uniqueness on renames.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] for a missing child and a
    /// duplicate-attribute-tuple conflict for a colliding rename.
    pub async fn update_child(
        &self,
        child_id: &ProductId,
        updates: ChildUpdate,
        actor: &ActorId,
        now: Timestamp,
        correlation_id: Option<&CorrelationId>,
    ) -> Result<(), CatalogError> {
        if updates.is_empty() {
            return Err(CatalogError::Validation("no fields to update".to_string()));
        }
        let child = self.require_child(child_id).await?;
        if let Some(price) = updates.price
            && (!price.is_finite() || price < 0.0)
        {
            return Err(CatalogError::Validation(
                "price must be a non-negative number".to_string(),
            ));
        }

        let mut fields: Vec<(String, Value)> = Vec::new();
        let mut changes: BTreeMap<String, Value> = BTreeMap::new();
        push_field(&mut fields, &mut changes, "name", updates.name.as_ref())?;
        push_field(&mut fields, &mut changes, "price", updates.price.as_ref())?;
        push_field(&mut fields, &mut changes, "images", updates.images.as_ref())?;
        push_field(&mut fields, &mut changes, "description", updates.description.as_ref())?;
        push_field(&mut fields, &mut changes, "specifications", updates.specifications.as_ref())?;
        push_field(&mut fields, &mut changes, "tags", updates.tags.as_ref())?;
        push_field(&mut fields, &mut changes, "isActive", updates.is_active.as_ref())?;

        if let Some(attributes) = &updates.attributes {
            let parent_id = child.parent_id.clone().ok_or_else(|| {
                CatalogError::Internal(format!("child {child_id} has no parent reference"))
            })?;
            let tuple = normalize_attribute_tuple(attributes);
            for sibling in self.active_children(&parent_id).await? {
                if sibling.id == *child_id {
                    continue;
                }
                let sibling_tuple = normalize_attribute_tuple(
                    sibling.variant_attributes.as_deref().unwrap_or(&[]),
                );
                if sibling_tuple == tuple {
                    return Err(CatalogError::duplicate_attribute_tuple());
                }
            }
            push_field(&mut fields, &mut changes, "variantAttributes", Some(attributes))?;
            push_field(
                &mut fields,
                &mut changes,
                "variantAttributesIndex",
                Some(&attribute_index(attributes)),
            )?;
        }

        push_field(&mut fields, &mut changes, "updatedAt", Some(&now))?;
        push_field(&mut fields, &mut changes, "updatedBy", Some(actor))?;
        self.store.atomic_set(child_id, &fields).await?;

        let entry = HistoryEntry {
            actor: actor.clone(),
            timestamp: now,
            changes,
        };
        self.store
            .atomic_push(
                child_id,
                "history",
                serde_json::to_value(entry)
                    .map_err(|err| CatalogError::Internal(err.to_string()))?,
            )
            .await?;

        self.emit_variation_event(
            topics::VARIATION_UPDATED,
            child_id,
            json!({ "variationId": child_id }),
            correlation_id,
        )
        .await;
        Ok(())
    }

    /// Soft-deletes a child and decrements the parent's variation count.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] for a missing child.
    pub async fn delete_child(
        &self,
        child_id: &ProductId,
        actor: &ActorId,
        now: Timestamp,
        correlation_id: Option<&CorrelationId>,
    ) -> Result<(), CatalogError> {
        let child = self.require_child(child_id).await?;
        if !child.is_active {
            return Err(CatalogError::NotFound(format!("variation {child_id} is not active")));
        }
        self.store
            .atomic_set(child_id, &[
                ("isActive".to_string(), Value::Bool(false)),
                (
                    "updatedAt".to_string(),
                    serde_json::to_value(now)
                        .map_err(|err| CatalogError::Internal(err.to_string()))?,
                ),
            ])
            .await?;
        let entry = HistoryEntry {
            actor: actor.clone(),
            timestamp: now,
            changes: BTreeMap::from([("isActive".to_string(), Value::Bool(false))]),
        };
        self.store
            .atomic_push(
                child_id,
                "history",
                serde_json::to_value(entry)
                    .map_err(|err| CatalogError::Internal(err.to_string()))?,
            )
            .await?;
        if let Some(parent_id) = &child.parent_id {
            self.store.atomic_inc(parent_id, "variationCount", -1).await?;
        }
        self.emit_variation_event(
            topics::VARIATION_DELETED,
            child_id,
            json!({ "variationId": child_id, "parentId": child.parent_id }),
            correlation_id,
        )
        .await;
        Ok(())
    }

    /// Returns the parent fields with the assembled variation matrix.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] for a missing or inactive parent.
    pub async fn parent_view(&self, parent_id: &ProductId) -> Result<ParentView, CatalogError> {
        let parent = self.require_parent(parent_id).await?;
        let children = self.active_children(parent_id).await?;
        let variations: Vec<MatrixEntry> = children.iter().map(matrix_entry).collect();
        Ok(ParentView {
            parent_id: parent_id.clone(),
            name: parent.name,
            description: parent.description,
            brand: parent.brand,
            department: parent.department,
            category: parent.category,
            subcategory: parent.subcategory,
            images: parent.images,
            tags: parent.tags,
            specifications: parent.specifications,
            total_variations: variations.len() as u64,
            variations,
        })
    }

    /// Returns matrix rows whose attributes match every supplied constraint.
    ///
    /// Matching is exact on values but case-insensitive on both names and
    /// values.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] for a missing or inactive parent.
    pub async fn filter_children(
        &self,
        parent_id: &ProductId,
        constraints: &BTreeMap<String, String>,
    ) -> Result<Vec<MatrixEntry>, CatalogError> {
        self.require_parent(parent_id).await?;
        let children = self.active_children(parent_id).await?;
        Ok(children
            .iter()
            .filter(|child| {
                constraints.iter().all(|(name, value)| {
                    child
                        .variant_attributes_index
                        .get(&name.to_lowercase())
                        .is_some_and(|actual| actual.eq_ignore_ascii_case(value))
                })
            })
            .map(matrix_entry)
            .collect())
    }

    /// Loads a parent or fails with `NotFound`.
    async fn require_parent(&self, parent_id: &ProductId) -> Result<Product, CatalogError> {
        let product = self.store.get_product(parent_id).await?;
        match product {
            Some(parent)
                if parent.variation_type == VariationKind::Parent && parent.is_active =>
            {
                Ok(parent)
            }
            _ => Err(CatalogError::NotFound(format!("parent product {parent_id} not found"))),
        }
    }

    /// Loads a child or fails with `NotFound`.
    async fn require_child(&self, child_id: &ProductId) -> Result<Product, CatalogError> {
        let product = self.store.get_product(child_id).await?;
        match product {
            Some(child) if child.variation_type == VariationKind::Child => Ok(child),
            _ => Err(CatalogError::NotFound(format!("variation {child_id} not found"))),
        }
    }

    /// Loads the active children of a parent.
    async fn active_children(&self, parent_id: &ProductId) -> Result<Vec<Product>, CatalogError> {
        let filter = ProductFilter {
            parent_id: Some(parent_id.clone()),
            is_active: Some(true),
            ..ProductFilter::default()
        };
        let page = self
            .store
            .find_many(&filter, Paging::new(0, MAX_CHILDREN as u64))
            .await?;
        Ok(page.items)
    }

    /// Emits a variation lifecycle event; failures are logged, never raised.
    async fn emit_variation_event(
        &self,
        topic: &str,
        subject_id: &ProductId,
        payload: Value,
        correlation_id: Option<&CorrelationId>,
    ) {
        if let Err(err) = self
            .publisher
            .publish(
                topic,
                payload,
                PublishOptions::for_product(subject_id, correlation_id.cloned()),
            )
            .await
        {
            warn!(topic, product_id = %subject_id, error = %err, "variation event publish failed");
        }
    }
}

// ============================================================================
// SECTION: Document Builders
// ============================================================================

/// Builds the parent document for a new family.
fn build_parent(
    spec: &ParentSpec,
    parent_id: ProductId,
    child_count: u32,
    creator: &ActorId,
    now: Timestamp,
) -> Product {
    let mut parent = Product::new(parent_id, spec.name.clone(), spec.base_price, now);
    parent.variation_type = VariationKind::Parent;
    parent.variation_count = child_count;
    parent.description.clone_from(&spec.description);
    parent.brand.clone_from(&spec.brand);
    parent.department.clone_from(&spec.department);
    parent.category.clone_from(&spec.category);
    parent.subcategory.clone_from(&spec.subcategory);
    parent.images.clone_from(&spec.images);
    parent.tags.clone_from(&spec.tags);
    parent.specifications.clone_from(&spec.specifications);
    parent.created_by = Some(creator.clone());
    parent.updated_by = Some(creator.clone());
    parent
}

/// Builds a child document with inheritance from the parent spec.
fn build_child(
    parent: &ParentSpec,
    parent_id: &ProductId,
    child: ChildSpec,
    child_id: ProductId,
    creator: &ActorId,
    now: Timestamp,
) -> Product {
    let name = child.name.unwrap_or_else(|| parent.name.clone());
    let mut doc = Product::new(child_id, name, child.price, now);
    doc.variation_type = VariationKind::Child;
    doc.parent_id = Some(parent_id.clone());
    doc.sku = Some(child.sku);
    doc.description = child.description.or_else(|| parent.description.clone());
    doc.brand.clone_from(&parent.brand);
    doc.department.clone_from(&parent.department);
    doc.category.clone_from(&parent.category);
    doc.subcategory.clone_from(&parent.subcategory);
    doc.images = child.images;
    doc.tags = union_tags(&parent.tags, &child.tags);
    doc.specifications = merge_specifications(&parent.specifications, child.specifications);
    doc.variant_attributes_index = attribute_index(&child.attributes);
    doc.variant_attributes = Some(child.attributes);
    doc.created_by = Some(creator.clone());
    doc.updated_by = Some(creator.clone());
    doc
}

/// Reconstructs the inheritance-relevant spec fields from a stored parent.
fn parent_as_spec(parent: &Product) -> ParentSpec {
    ParentSpec {
        name: parent.name.clone(),
        description: parent.description.clone(),
        brand: parent.brand.clone(),
        department: parent.department.clone(),
        category: parent.category.clone(),
        subcategory: parent.subcategory.clone(),
        base_price: parent.price,
        images: parent.images.clone(),
        tags: parent.tags.clone(),
        specifications: parent.specifications.clone(),
    }
}

/// Unions parent and child tags preserving first-seen order.
fn union_tags(parent_tags: &[String], child_tags: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut tags = Vec::new();
    for tag in parent_tags.iter().chain(child_tags) {
        if seen.insert(tag.clone()) {
            tags.push(tag.clone());
        }
    }
    tags
}

/// Merges parent specifications with child overrides winning.
fn merge_specifications(
    parent: &BTreeMap<String, String>,
    child: BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged = parent.clone();
    merged.extend(child);
    merged
}

/// Projects a child document into one matrix row.
fn matrix_entry(child: &Product) -> MatrixEntry {
    MatrixEntry {
        sku: child.sku.clone().unwrap_or_else(|| Sku::new("")),
        attributes: child.variant_attributes_index.clone(),
        price: child.price,
        available: child.availability_status.state != StockState::OutOfStock,
        images: if child.images.is_empty() { None } else { Some(child.images.clone()) },
    }
}

// ============================================================================
// SECTION: Validation Helpers
// ============================================================================

/// Rejects empty or non-finite child prices.
fn validate_child_price(child: &ChildSpec) -> Result<(), CatalogError> {
    if !child.price.is_finite() || child.price < 0.0 {
        return Err(CatalogError::Validation(format!(
            "price for sku '{}' must be a non-negative number",
            child.sku
        )));
    }
    if child.attributes.is_empty() {
        return Err(CatalogError::Validation(format!(
            "variation '{}' requires at least one attribute",
            child.sku
        )));
    }
    Ok(())
}

/// Rejects duplicate SKUs within one request.
fn validate_mutual_skus(children: &[ChildSpec]) -> Result<(), CatalogError> {
    let mut seen = BTreeSet::new();
    for child in children {
        if !seen.insert(child.sku.as_str().to_string()) {
            return Err(CatalogError::duplicate_sku(child.sku.as_str()));
        }
    }
    Ok(())
}

/// Rejects duplicate normalized attribute tuples within one request.
fn validate_mutual_tuples(children: &[ChildSpec]) -> Result<(), CatalogError> {
    let mut seen = BTreeSet::new();
    for child in children {
        let tuple = normalize_attribute_tuple(&child.attributes);
        if !seen.insert(tuple) {
            return Err(CatalogError::duplicate_attribute_tuple());
        }
    }
    Ok(())
}

/// Serializes a field value into the atomic-update buffers.
fn push_field<T: Serialize>(
    fields: &mut Vec<(String, Value)>,
    changes: &mut BTreeMap<String, Value>,
    name: &str,
    value: Option<&T>,
) -> Result<(), CatalogError> {
    if let Some(value) = value {
        let value =
            serde_json::to_value(value).map_err(|err| CatalogError::Internal(err.to_string()))?;
        fields.push((name.to_string(), value.clone()));
        changes.insert(name.to_string(), value);
    }
    Ok(())
}

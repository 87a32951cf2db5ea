// crates/catalog-core/src/core/mod.rs
// ============================================================================
// Module: Product Catalog Core Types
// Description: Domain model shared by engines, stores, and transports.
// Purpose: Define the canonical catalog entities and wire shapes.
// Dependencies: serde, serde_json, thiserror, time
// ============================================================================

//! ## Overview
//! Core types capture the catalog data model of the platform: products and
//! their denormalized projections, badges and rules, bulk import jobs, size
//! charts, event envelopes, and the shared error taxonomy.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod badge;
pub mod envelope;
pub mod errors;
pub mod identifiers;
pub mod import;
pub mod product;
pub mod sizechart;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use badge::Badge;
pub use badge::BadgeRule;
pub use badge::BadgeType;
pub use badge::ConditionOperator;
pub use badge::RuleCondition;
pub use badge::default_badge_rules;
pub use envelope::EVENT_CONTENT_TYPE;
pub use envelope::EVENT_SOURCE;
pub use envelope::EventEnvelope;
pub use envelope::SPEC_VERSION;
pub use envelope::event_type_for;
pub use envelope::topics;
pub use errors::CatalogError;
pub use errors::ConflictKind;
pub use identifiers::ActorId;
pub use identifiers::ChartId;
pub use identifiers::CorrelationId;
pub use identifiers::EventId;
pub use identifiers::JobId;
pub use identifiers::ProductId;
pub use identifiers::Sku;
pub use import::BulkImportJobEvent;
pub use import::ImportJob;
pub use import::ImportJobStatus;
pub use import::ImportMode;
pub use import::ImportProduct;
pub use import::ImportRowError;
pub use import::ImportValidationError;
pub use import::MAX_JOB_ERRORS;
pub use product::AvailabilityStatus;
pub use product::DEFAULT_LOW_STOCK_THRESHOLD;
pub use product::HistoryEntry;
pub use product::Product;
pub use product::ProductDraft;
pub use product::QaStats;
pub use product::RatingDistribution;
pub use product::ReviewAggregates;
pub use product::SalesMetrics;
pub use product::SalesPeriod;
pub use product::StockState;
pub use product::VariantAttribute;
pub use product::VariationKind;
pub use product::ViewMetrics;
pub use product::ViewPeriod;
pub use product::attribute_index;
pub use product::normalize_attribute_tuple;
pub use product::round_to_2dp;
pub use sizechart::SizeChart;
pub use sizechart::SizeChartRow;
pub use self::time::Timestamp;

// crates/catalog-core/src/runtime/mod.rs
// ============================================================================
// Module: Product Catalog Runtime
// Description: Projection, badge, variation, and size chart engines.
// Purpose: Execute catalog mutations against the store and publisher interfaces.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the engines that mutate product documents:
//! event-driven projections, the badge rule engine with its condition
//! evaluator, the variation engine, and size chart assignment. Engines are
//! generic over the store and publisher so hosts wire concrete backends at
//! startup.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod badges;
pub mod conditions;
pub mod fields;
pub mod memory;
pub mod projection;
pub mod sizecharts;
pub mod variations;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use badges::AssignOptions;
pub use badges::BadgeEngine;
pub use badges::BadgeStatistics;
pub use badges::BulkAssignReport;
pub use badges::BulkFailure;
pub use badges::BulkSkip;
pub use badges::EvaluateOptions;
pub use badges::EvaluationReport;
pub use badges::ProductBadges;
pub use badges::ProductEvaluation;
pub use badges::SkippedBadge;
pub use badges::SweepReport;
pub use conditions::THIRTY_DAYS_AGO_SENTINEL;
pub use conditions::evaluate_condition;
pub use conditions::evaluate_rule;
pub use fields::product_document;
pub use fields::resolve_path;
pub use memory::CapturePublisher;
pub use memory::CapturedEvent;
pub use memory::InMemoryProductStore;
pub use projection::ProjectionEngine;
pub use projection::QaEvent;
pub use projection::ReviewEvent;
pub use projection::ReviewUpdatedEvent;
pub use projection::SalesEvent;
pub use projection::StockEvent;
pub use projection::ViewsEvent;
pub use projection::view_growth_percent;
pub use sizecharts::SizeChartEngine;
pub use variations::ChildSpec;
pub use variations::ChildUpdate;
pub use variations::CreatedFamily;
pub use variations::MAX_CHILDREN;
pub use variations::MatrixEntry;
pub use variations::ParentSpec;
pub use variations::ParentView;
pub use variations::VariationEngine;

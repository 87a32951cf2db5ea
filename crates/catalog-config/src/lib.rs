// crates/catalog-config/src/lib.rs
// ============================================================================
// Module: Product Catalog Config Library
// Description: Strict configuration loading for the catalog service.
// Purpose: Expose fail-closed config parsing with hard limits.
// Dependencies: serde, toml
// ============================================================================

//! ## Overview
//! This crate loads and validates the catalog service configuration from a
//! TOML file with strict size and path limits. Invalid configuration fails
//! closed; every limit has a bounded range.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::BrokerConfig;
pub use config::CatalogConfig;
pub use config::ConfigError;
pub use config::LimitsConfig;
pub use config::LogFormat;
pub use config::ObservabilityConfig;
pub use config::ServiceConfig;
pub use config::StoreConfig;

// crates/catalog-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Catalog Store Library
// Description: Durable ProductStore backend using SQLite WAL.
// Purpose: Provide production-grade persistence for catalog documents.
// Dependencies: catalog-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`catalog_core::ProductStore`]
//! implementation that persists product, import job, and size chart
//! documents as JSON snapshots with extracted, indexed query columns. It is
//! designed for single-writer deployments; the connection mutex linearizes
//! same-field writes.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::MAX_DOC_BYTES;
pub use store::SqliteCatalogStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;

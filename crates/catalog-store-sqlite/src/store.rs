// crates/catalog-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Catalog Store
// Description: Durable ProductStore backed by SQLite with extracted columns.
// Purpose: Persist product, job, and size chart documents with indexed queries.
// Dependencies: catalog-core, rusqlite, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Documents are persisted as canonical JSON snapshots alongside extracted
//! columns that back the required indexes: SKU uniqueness across active
//! products is a partial unique index, taxonomy/price combinations and
//! rating/created orderings are compound indexes, and tag/badge membership
//! is matched against delimiter-wrapped text columns. Atomic field updates
//! run inside a single transaction on a mutex-held connection, which is the
//! linearization point for same-field writes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use catalog_core::ChartId;
use catalog_core::ImportJob;
use catalog_core::ImportJobStatus;
use catalog_core::JobId;
use catalog_core::Product;
use catalog_core::ProductId;
use catalog_core::SizeChart;
use catalog_core::Sku;
use catalog_core::interfaces::IndexInfo;
use catalog_core::interfaces::Page;
use catalog_core::interfaces::Paging;
use catalog_core::interfaces::ProductFilter;
use catalog_core::interfaces::ProductStore;
use catalog_core::interfaces::StoreError;
use catalog_core::runtime::memory::inc_path;
use catalog_core::runtime::memory::push_path;
use catalog_core::runtime::memory::set_path;
use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use rusqlite::params_from_iter;
use rusqlite::types::Value as SqlValue;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum document snapshot size accepted by the store.
pub const MAX_DOC_BYTES: usize = 1024 * 1024;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Configuration for the `SQLite` catalog store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by the `SQLite` catalog store.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Filesystem or connection failure.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// Database operation failure.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Stored data failed to decode.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Input rejected by validation.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Insert collided with an active product's SKU.
    #[error("duplicate sku: {0}")]
    DuplicateSku(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) | SqliteStoreError::Db(message) => {
                Self::Unavailable(message)
            }
            SqliteStoreError::Corrupt(message) | SqliteStoreError::Invalid(message) => {
                Self::Rejected(message)
            }
            SqliteStoreError::DuplicateSku(sku) => Self::DuplicateSku {
                sku,
            },
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Durable catalog store over a single `SQLite` connection.
pub struct SqliteCatalogStore {
    /// Connection guarded by a mutex; transactions linearize writers.
    connection: Mutex<Connection>,
}

impl SqliteCatalogStore {
    /// Opens (or creates) the store at the configured path.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// migrated.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        let connection = Connection::open_with_flags(
            &config.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )
        .map_err(|err| SqliteStoreError::Io(err.to_string()))?;
        configure_connection(&connection, config.busy_timeout_ms)?;
        migrate(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    /// Opens an in-memory store for tests and demos.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be created.
    pub fn in_memory() -> Result<Self, SqliteStoreError> {
        let connection =
            Connection::open_in_memory().map_err(|err| SqliteStoreError::Io(err.to_string()))?;
        configure_connection(&connection, DEFAULT_BUSY_TIMEOUT_MS)?;
        migrate(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    /// Locks the connection, mapping poisoning into a store error.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("catalog store mutex poisoned".to_string()))
    }

    /// Inserts one product row inside an open transaction.
    fn insert_product_tx(
        tx: &rusqlite::Transaction<'_>,
        product: &Product,
    ) -> Result<(), SqliteStoreError> {
        let doc = encode_doc(product)?;
        let columns = ExtractedColumns::from_product(product);
        let result = tx.execute(
            "INSERT INTO products (
                id, sku, is_active, parent_id, name, description, brand,
                department, category, subcategory, price, average_rating,
                created_at, tags_text, keywords_text, badge_types, doc
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            params![
                product.id.as_str(),
                product.sku.as_ref().map(Sku::as_str),
                i64::from(product.is_active),
                product.parent_id.as_ref().map(ProductId::as_str),
                product.name,
                product.description,
                product.brand,
                product.department,
                product.category,
                product.subcategory,
                product.price,
                product.review_aggregates.average_rating,
                product.created_at.to_rfc3339(),
                columns.tags_text,
                columns.keywords_text,
                columns.badge_types,
                doc,
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(SqliteStoreError::DuplicateSku(
                    product.sku.as_ref().map(Sku::as_str).unwrap_or_default().to_string(),
                ))
            }
            Err(err) => Err(SqliteStoreError::Db(err.to_string())),
        }
    }

    /// Rewrites one product row from a patched document inside a transaction.
    fn rewrite_product_tx(
        tx: &rusqlite::Transaction<'_>,
        product: &Product,
    ) -> Result<(), SqliteStoreError> {
        let doc = encode_doc(product)?;
        let columns = ExtractedColumns::from_product(product);
        tx.execute(
            "UPDATE products SET
                sku = ?2, is_active = ?3, parent_id = ?4, name = ?5,
                description = ?6, brand = ?7, department = ?8, category = ?9,
                subcategory = ?10, price = ?11, average_rating = ?12,
                created_at = ?13, tags_text = ?14, keywords_text = ?15,
                badge_types = ?16, doc = ?17
             WHERE id = ?1",
            params![
                product.id.as_str(),
                product.sku.as_ref().map(Sku::as_str),
                i64::from(product.is_active),
                product.parent_id.as_ref().map(ProductId::as_str),
                product.name,
                product.description,
                product.brand,
                product.department,
                product.category,
                product.subcategory,
                product.price,
                product.review_aggregates.average_rating,
                product.created_at.to_rfc3339(),
                columns.tags_text,
                columns.keywords_text,
                columns.badge_types,
                doc,
            ],
        )
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    /// Applies a JSON patch to one product document transactionally.
    fn patch_product<F: FnOnce(&mut Value)>(
        &self,
        id: &ProductId,
        patch: F,
    ) -> Result<u64, SqliteStoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let doc: Option<String> = tx
            .query_row("SELECT doc FROM products WHERE id = ?1", params![id.as_str()], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let Some(doc) = doc else {
            return Ok(0);
        };
        let mut document: Value = serde_json::from_str(&doc)
            .map_err(|err| SqliteStoreError::Corrupt(err.to_string()))?;
        patch(&mut document);
        let product: Product = serde_json::from_value(document)
            .map_err(|err| SqliteStoreError::Corrupt(err.to_string()))?;
        Self::rewrite_product_tx(&tx, &product)?;
        tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(1)
    }

    /// Runs a filtered query returning one page plus the unpaged total.
    fn query_products(
        &self,
        filter: &ProductFilter,
        paging: Paging,
        text_query: Option<&str>,
    ) -> Result<Page<Product>, SqliteStoreError> {
        let (where_sql, mut params) = filter_sql(filter);
        let guard = self.lock()?;

        let (select_sql, count_sql) = if let Some(query) = text_query {
            let needle = query.to_lowercase();
            let mut scored_params: Vec<SqlValue> =
                vec![SqlValue::from(needle.clone()); 4];
            scored_params.append(&mut params);
            params = scored_params;
            (
                format!(
                    "SELECT doc FROM (SELECT doc, {SCORE_EXPR} AS score FROM products \
                     WHERE {where_sql}) WHERE score > 0 ORDER BY score DESC \
                     LIMIT ?{limit} OFFSET ?{offset}",
                    limit = params.len() + 1,
                    offset = params.len() + 2,
                ),
                format!(
                    "SELECT COUNT(*) FROM (SELECT {SCORE_EXPR} AS score FROM products \
                     WHERE {where_sql}) WHERE score > 0"
                ),
            )
        } else {
            (
                format!(
                    "SELECT doc FROM products WHERE {where_sql} ORDER BY created_at DESC \
                     LIMIT ?{limit} OFFSET ?{offset}",
                    limit = params.len() + 1,
                    offset = params.len() + 2,
                ),
                format!("SELECT COUNT(*) FROM products WHERE {where_sql}"),
            )
        };

        let total: i64 = guard
            .query_row(&count_sql, params_from_iter(params.iter()), |row| row.get(0))
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;

        let limit = i64::try_from(paging.clamped_limit()).unwrap_or(i64::MAX);
        let offset = i64::try_from(paging.offset).unwrap_or(i64::MAX);
        let mut select_params = params;
        select_params.push(SqlValue::from(limit));
        select_params.push(SqlValue::from(offset));

        let mut statement = guard
            .prepare(&select_sql)
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let rows = statement
            .query_map(params_from_iter(select_params.iter()), |row| {
                row.get::<_, String>(0)
            })
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let mut items = Vec::new();
        for row in rows {
            let doc = row.map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            items.push(decode_doc(&doc)?);
        }
        Ok(Page {
            items,
            total: u64::try_from(total).unwrap_or(0),
        })
    }
}

// ============================================================================
// SECTION: ProductStore Implementation
// ============================================================================

#[async_trait]
impl ProductStore for SqliteCatalogStore {
    async fn create_product(&self, product: &Product) -> Result<ProductId, StoreError> {
        let mut guard = self.lock().map_err(StoreError::from)?;
        let tx = guard
            .transaction()
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Self::insert_product_tx(&tx, product).map_err(StoreError::from)?;
        tx.commit().map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Ok(product.id.clone())
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        let guard = self.lock().map_err(StoreError::from)?;
        let doc: Option<String> = guard
            .query_row("SELECT doc FROM products WHERE id = ?1", params![id.as_str()], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        doc.map(|doc| decode_doc(&doc).map_err(StoreError::from)).transpose()
    }

    async fn find_by_sku(
        &self,
        sku: &Sku,
        active_only: bool,
    ) -> Result<Option<Product>, StoreError> {
        let guard = self.lock().map_err(StoreError::from)?;
        let sql = if active_only {
            "SELECT doc FROM products WHERE sku = ?1 AND is_active = 1"
        } else {
            "SELECT doc FROM products WHERE sku = ?1 ORDER BY is_active DESC LIMIT 1"
        };
        let doc: Option<String> = guard
            .query_row(sql, params![sku.as_str()], |row| row.get(0))
            .optional()
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        doc.map(|doc| decode_doc(&doc).map_err(StoreError::from)).transpose()
    }

    async fn find_many(
        &self,
        filter: &ProductFilter,
        paging: Paging,
    ) -> Result<Page<Product>, StoreError> {
        self.query_products(filter, paging, filter.text.as_deref()).map_err(StoreError::from)
    }

    async fn atomic_set(
        &self,
        id: &ProductId,
        fields: &[(String, Value)],
    ) -> Result<u64, StoreError> {
        self.patch_product(id, |document| {
            for (path, value) in fields {
                set_path(document, path, value.clone());
            }
        })
        .map_err(StoreError::from)
    }

    async fn atomic_push(
        &self,
        id: &ProductId,
        field: &str,
        value: Value,
    ) -> Result<u64, StoreError> {
        self.patch_product(id, |document| push_path(document, field, value.clone()))
            .map_err(StoreError::from)
    }

    async fn atomic_inc(
        &self,
        id: &ProductId,
        field: &str,
        delta: i64,
    ) -> Result<u64, StoreError> {
        self.patch_product(id, |document| inc_path(document, field, delta))
            .map_err(StoreError::from)
    }

    async fn insert_many(&self, products: &[Product]) -> Result<Vec<ProductId>, StoreError> {
        let mut guard = self.lock().map_err(StoreError::from)?;
        let tx = guard
            .transaction()
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        let mut ids = Vec::with_capacity(products.len());
        for product in products {
            Self::insert_product_tx(&tx, product).map_err(StoreError::from)?;
            ids.push(product.id.clone());
        }
        tx.commit().map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Ok(ids)
    }

    async fn search_text(
        &self,
        query: &str,
        filter: &ProductFilter,
        paging: Paging,
    ) -> Result<Page<Product>, StoreError> {
        self.query_products(filter, paging, Some(query)).map_err(StoreError::from)
    }

    async fn list_indexes(&self) -> Result<Vec<IndexInfo>, StoreError> {
        let guard = self.lock().map_err(StoreError::from)?;
        let mut statement = guard
            .prepare(
                "SELECT name, sql FROM sqlite_master WHERE type = 'index' \
                 AND tbl_name = 'products' AND sql IS NOT NULL ORDER BY name",
            )
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        let rows = statement
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        let mut indexes = Vec::new();
        for row in rows {
            let (name, sql) = row.map_err(|err| StoreError::Unavailable(err.to_string()))?;
            indexes.push(IndexInfo {
                keys: index_keys(&sql),
                unique: sql.to_uppercase().contains("UNIQUE"),
                sparse: sql.to_uppercase().contains("WHERE"),
                name,
            });
        }
        Ok(indexes)
    }

    async fn create_import_job(&self, job: &ImportJob) -> Result<(), StoreError> {
        let doc = serde_json::to_string(job)
            .map_err(|err| StoreError::Rejected(err.to_string()))?;
        let guard = self.lock().map_err(StoreError::from)?;
        guard
            .execute(
                "INSERT OR REPLACE INTO import_jobs (job_id, status, doc) VALUES (?1, ?2, ?3)",
                params![job.job_id.as_str(), status_label(job.status), doc],
            )
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Ok(())
    }

    async fn get_import_job(&self, job_id: &JobId) -> Result<Option<ImportJob>, StoreError> {
        let guard = self.lock().map_err(StoreError::from)?;
        let doc: Option<String> = guard
            .query_row(
                "SELECT doc FROM import_jobs WHERE job_id = ?1",
                params![job_id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        doc.map(|doc| {
            serde_json::from_str(&doc).map_err(|err| StoreError::Rejected(err.to_string()))
        })
        .transpose()
    }

    async fn claim_import_job(&self, job_id: &JobId) -> Result<bool, StoreError> {
        let mut guard = self.lock().map_err(StoreError::from)?;
        let tx = guard
            .transaction()
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        let doc: Option<String> = tx
            .query_row(
                "SELECT doc FROM import_jobs WHERE job_id = ?1 AND status = 'pending'",
                params![job_id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        let Some(doc) = doc else {
            return Ok(false);
        };
        let mut job: ImportJob = serde_json::from_str(&doc)
            .map_err(|err| StoreError::Rejected(err.to_string()))?;
        job.status = ImportJobStatus::Processing;
        let doc = serde_json::to_string(&job)
            .map_err(|err| StoreError::Rejected(err.to_string()))?;
        let changed = tx
            .execute(
                "UPDATE import_jobs SET status = 'processing', doc = ?2 \
                 WHERE job_id = ?1 AND status = 'pending'",
                params![job_id.as_str(), doc],
            )
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        tx.commit().map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Ok(changed == 1)
    }

    async fn update_import_job(&self, job: &ImportJob) -> Result<(), StoreError> {
        let doc = serde_json::to_string(job)
            .map_err(|err| StoreError::Rejected(err.to_string()))?;
        let guard = self.lock().map_err(StoreError::from)?;
        guard
            .execute(
                "UPDATE import_jobs SET status = ?2, doc = ?3 WHERE job_id = ?1",
                params![job.job_id.as_str(), status_label(job.status), doc],
            )
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Ok(())
    }

    async fn put_size_chart(&self, chart: &SizeChart) -> Result<(), StoreError> {
        let doc = serde_json::to_string(chart)
            .map_err(|err| StoreError::Rejected(err.to_string()))?;
        let guard = self.lock().map_err(StoreError::from)?;
        guard
            .execute(
                "INSERT OR REPLACE INTO size_charts (chart_id, doc) VALUES (?1, ?2)",
                params![chart.chart_id.as_str(), doc],
            )
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Ok(())
    }

    async fn get_size_chart(&self, id: &ChartId) -> Result<Option<SizeChart>, StoreError> {
        let guard = self.lock().map_err(StoreError::from)?;
        let doc: Option<String> = guard
            .query_row(
                "SELECT doc FROM size_charts WHERE chart_id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        doc.map(|doc| {
            serde_json::from_str(&doc).map_err(|err| StoreError::Rejected(err.to_string()))
        })
        .transpose()
    }
}

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Weighted text score over name (10), description (2), tags (5), keywords (5).
const SCORE_EXPR: &str = "\
    (CASE WHEN instr(lower(name), ?1) > 0 THEN 10 ELSE 0 END) + \
    (CASE WHEN instr(lower(coalesce(description, '')), ?2) > 0 THEN 2 ELSE 0 END) + \
    (CASE WHEN instr(tags_text, ?3) > 0 THEN 5 ELSE 0 END) + \
    (CASE WHEN instr(keywords_text, ?4) > 0 THEN 5 ELSE 0 END)";

/// Applies connection pragmas.
fn configure_connection(
    connection: &Connection,
    busy_timeout_ms: u64,
) -> Result<(), SqliteStoreError> {
    connection
        .pragma_update(None, "journal_mode", "wal")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .pragma_update(None, "synchronous", "normal")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .pragma_update(None, "busy_timeout", i64::try_from(busy_timeout_ms).unwrap_or(i64::MAX))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Creates the schema and verifies the stored version.
fn migrate(connection: &Connection) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch(
            "CREATE TABLE IF NOT EXISTS catalog_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS products (
                id TEXT PRIMARY KEY,
                sku TEXT,
                is_active INTEGER NOT NULL,
                parent_id TEXT,
                name TEXT NOT NULL,
                description TEXT,
                brand TEXT,
                department TEXT,
                category TEXT,
                subcategory TEXT,
                price REAL NOT NULL,
                average_rating REAL NOT NULL,
                created_at TEXT NOT NULL,
                tags_text TEXT NOT NULL,
                keywords_text TEXT NOT NULL,
                badge_types TEXT NOT NULL,
                doc TEXT NOT NULL
             );
             CREATE UNIQUE INDEX IF NOT EXISTS idx_sku_unique
                ON products(sku) WHERE sku IS NOT NULL AND is_active = 1;
             CREATE INDEX IF NOT EXISTS idx_active_category_price
                ON products(is_active, category, price);
             CREATE INDEX IF NOT EXISTS idx_active_department_price
                ON products(is_active, department, price);
             CREATE INDEX IF NOT EXISTS idx_active_rating
                ON products(is_active, average_rating DESC);
             CREATE INDEX IF NOT EXISTS idx_active_created
                ON products(is_active, created_at DESC);
             CREATE INDEX IF NOT EXISTS idx_brand ON products(brand);
             CREATE INDEX IF NOT EXISTS idx_tags ON products(tags_text);
             CREATE INDEX IF NOT EXISTS idx_badge_types ON products(badge_types);
             CREATE INDEX IF NOT EXISTS idx_parent
                ON products(parent_id) WHERE parent_id IS NOT NULL;
             CREATE TABLE IF NOT EXISTS import_jobs (
                job_id TEXT PRIMARY KEY,
                status TEXT NOT NULL,
                doc TEXT NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_job_status ON import_jobs(status);
             CREATE TABLE IF NOT EXISTS size_charts (
                chart_id TEXT PRIMARY KEY,
                doc TEXT NOT NULL
             );",
        )
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<String> = connection
        .query_row(
            "SELECT value FROM catalog_meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            connection
                .execute(
                    "INSERT INTO catalog_meta (key, value) VALUES ('schema_version', ?1)",
                    params![SCHEMA_VERSION.to_string()],
                )
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            Ok(())
        }
        Some(value) if value == SCHEMA_VERSION.to_string() => Ok(()),
        Some(value) => Err(SqliteStoreError::Invalid(format!(
            "schema version mismatch: found {value}, expected {SCHEMA_VERSION}"
        ))),
    }
}

/// Validates the configured database path.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid("store path must be a file".to_string()));
    }
    Ok(())
}

// ============================================================================
// SECTION: Row Encoding
// ============================================================================

/// Extracted columns maintained alongside the document snapshot.
struct ExtractedColumns {
    /// Delimiter-wrapped lowercased tags (",a,b," or empty).
    tags_text: String,
    /// Delimiter-wrapped lowercased search keywords.
    keywords_text: String,
    /// Delimiter-wrapped badge type labels.
    badge_types: String,
}

impl ExtractedColumns {
    /// Derives the extracted columns from a product document.
    fn from_product(product: &Product) -> Self {
        Self {
            tags_text: wrap_list(product.tags.iter().map(|tag| tag.to_lowercase())),
            keywords_text: wrap_list(
                product.search_keywords.iter().map(|keyword| keyword.to_lowercase()),
            ),
            badge_types: wrap_list(
                product.badges.iter().map(|badge| badge.badge_type.label().to_string()),
            ),
        }
    }
}

/// Wraps list items as ",a,b," for delimiter-safe LIKE matching.
fn wrap_list(items: impl Iterator<Item = String>) -> String {
    let joined: Vec<String> = items.collect();
    if joined.is_empty() {
        String::new()
    } else {
        format!(",{},", joined.join(","))
    }
}

/// Serializes a product snapshot with the size cap applied.
fn encode_doc(product: &Product) -> Result<String, SqliteStoreError> {
    let doc = serde_json::to_string(product)
        .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
    if doc.len() > MAX_DOC_BYTES {
        return Err(SqliteStoreError::Invalid(format!(
            "product document exceeds {MAX_DOC_BYTES} bytes"
        )));
    }
    Ok(doc)
}

/// Decodes a stored product snapshot.
fn decode_doc(doc: &str) -> Result<Product, SqliteStoreError> {
    serde_json::from_str(doc).map_err(|err| SqliteStoreError::Corrupt(err.to_string()))
}

/// Returns the stable status label stored on job rows.
const fn status_label(status: ImportJobStatus) -> &'static str {
    match status {
        ImportJobStatus::Pending => "pending",
        ImportJobStatus::Processing => "processing",
        ImportJobStatus::Completed => "completed",
        ImportJobStatus::Failed => "failed",
        ImportJobStatus::Cancelled => "cancelled",
    }
}

/// Extracts the indexed key list from an index's CREATE statement.
fn index_keys(sql: &str) -> Vec<String> {
    sql.split_once('(')
        .and_then(|(_, rest)| rest.split_once(')'))
        .map(|(keys, _)| {
            keys.split(',').map(|key| key.trim().to_string()).collect()
        })
        .unwrap_or_default()
}

// ============================================================================
// SECTION: Filter Compilation
// ============================================================================

/// Compiles a structured filter into a WHERE clause with positional params.
fn filter_sql(filter: &ProductFilter) -> (String, Vec<SqlValue>) {
    let mut conditions: Vec<String> = Vec::new();
    let mut params: Vec<SqlValue> = Vec::new();

    if let Some(is_active) = filter.is_active {
        bind(&mut conditions, &mut params, "is_active = ?", SqlValue::from(i64::from(is_active)));
    }
    if let Some(department) = &filter.department {
        bind(&mut conditions, &mut params, "department = ?", SqlValue::from(department.clone()));
    }
    if let Some(category) = &filter.category {
        bind(&mut conditions, &mut params, "category = ?", SqlValue::from(category.clone()));
    }
    if let Some(subcategory) = &filter.subcategory {
        bind(&mut conditions, &mut params, "subcategory = ?", SqlValue::from(subcategory.clone()));
    }
    if let Some(brand) = &filter.brand {
        bind(&mut conditions, &mut params, "brand = ?", SqlValue::from(brand.clone()));
    }
    if let Some(price_min) = filter.price_min {
        bind(&mut conditions, &mut params, "price >= ?", SqlValue::from(price_min));
    }
    if let Some(price_max) = filter.price_max {
        bind(&mut conditions, &mut params, "price <= ?", SqlValue::from(price_max));
    }
    for tag in &filter.tags {
        bind(
            &mut conditions,
            &mut params,
            "tags_text LIKE ?",
            SqlValue::from(format!("%,{},%", tag.to_lowercase())),
        );
    }
    if let Some(badge_type) = filter.badge_type {
        bind(
            &mut conditions,
            &mut params,
            "badge_types LIKE ?",
            SqlValue::from(format!("%,{},%", badge_type.label())),
        );
    }
    if let Some(has_badges) = filter.has_badges {
        conditions
            .push(if has_badges { "badge_types <> ''" } else { "badge_types = ''" }.to_string());
    }
    if let Some(parent_id) = &filter.parent_id {
        bind(
            &mut conditions,
            &mut params,
            "parent_id = ?",
            SqlValue::from(parent_id.as_str().to_string()),
        );
    }

    if conditions.is_empty() {
        ("1 = 1".to_string(), params)
    } else {
        (conditions.join(" AND "), params)
    }
}

/// Appends one parameterized condition.
fn bind(conditions: &mut Vec<String>, params: &mut Vec<SqlValue>, clause: &str, value: SqlValue) {
    conditions.push(clause.to_string());
    params.push(value);
}

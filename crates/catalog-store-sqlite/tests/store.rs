// crates/catalog-store-sqlite/tests/store.rs
// ============================================================================
// Module: SQLite Catalog Store Tests
// Description: Persistence, uniqueness, atomic updates, queries, and claims.
// Purpose: Validate the durable store against the ProductStore contract.
// ============================================================================

//! ## Overview
//! Exercises the SQLite store: document round-trips, the partial unique SKU
//! index, dot-path atomic updates, filtered queries with totals, weighted
//! text search ordering, and the single-winner import job claim.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::float_cmp,
    reason = "Test-only assertions and exact price comparisons are permitted."
)]

use catalog_core::ImportJob;
use catalog_core::ImportJobStatus;
use catalog_core::ImportMode;
use catalog_core::JobId;
use catalog_core::Product;
use catalog_core::ProductId;
use catalog_core::SizeChart;
use catalog_core::SizeChartRow;
use catalog_core::Sku;
use catalog_core::Timestamp;
use catalog_core::ChartId;
use catalog_core::interfaces::Paging;
use catalog_core::interfaces::ProductFilter;
use catalog_core::interfaces::ProductStore;
use catalog_core::interfaces::StoreError;
use catalog_store_sqlite::SqliteCatalogStore;
use catalog_store_sqlite::SqliteStoreConfig;
use serde_json::json;
use tempfile::TempDir;

/// Builds a product with a SKU in the given category.
fn product(id: &str, sku: &str, category: &str, price: f64) -> Product {
    let mut product = Product::new(ProductId::new(id), format!("Item {id}"), price, Timestamp::now());
    product.sku = Some(Sku::new(sku));
    product.category = Some(category.to_string());
    product
}

#[tokio::test]
async fn documents_round_trip_through_the_file_backend() {
    let dir = TempDir::new().expect("tempdir");
    let config = SqliteStoreConfig {
        path: dir.path().join("catalog.db"),
        busy_timeout_ms: 1_000,
    };
    let store = SqliteCatalogStore::new(&config).expect("open store");
    let doc = product("p-1", "SKU-1", "Clothing", 19.99);
    store.create_product(&doc).await.expect("create");

    let loaded = store.get_product(&doc.id).await.expect("get").expect("exists");
    assert_eq!(loaded, doc);
    let by_sku = store
        .find_by_sku(&Sku::new("SKU-1"), true)
        .await
        .expect("find")
        .expect("found");
    assert_eq!(by_sku.id, doc.id);
}

#[tokio::test]
async fn active_sku_uniqueness_is_enforced_but_inactive_rows_release_the_sku() {
    let store = SqliteCatalogStore::in_memory().expect("open store");
    store.create_product(&product("p-1", "SKU-1", "Clothing", 10.0)).await.expect("create");

    let err = store
        .create_product(&product("p-2", "SKU-1", "Clothing", 12.0))
        .await
        .expect_err("duplicate sku");
    assert!(matches!(err, StoreError::DuplicateSku { .. }));

    store
        .atomic_set(&ProductId::new("p-1"), &[("isActive".to_string(), json!(false))])
        .await
        .expect("soft delete");
    store
        .create_product(&product("p-2", "SKU-1", "Clothing", 12.0))
        .await
        .expect("sku released by soft delete");
}

#[tokio::test]
async fn atomic_updates_patch_nested_fields_and_counters() {
    let store = SqliteCatalogStore::in_memory().expect("open store");
    let doc = product("p-1", "SKU-1", "Clothing", 10.0);
    store.create_product(&doc).await.expect("create");

    let modified = store
        .atomic_set(&doc.id, &[(
            "qaStats.totalQuestions".to_string(),
            json!(4),
        )])
        .await
        .expect("set");
    assert_eq!(modified, 1);
    store.atomic_inc(&doc.id, "qaStats.totalQuestions", -1).await.expect("inc");
    store
        .atomic_push(
            &doc.id,
            "tags",
            json!("sale"),
        )
        .await
        .expect("push");

    let loaded = store.get_product(&doc.id).await.expect("get").expect("exists");
    assert_eq!(loaded.qa_stats.total_questions, 3);
    assert_eq!(loaded.tags, vec!["sale".to_string()]);

    let missing = store
        .atomic_set(&ProductId::new("ghost"), &[("price".to_string(), json!(1))])
        .await
        .expect("set on missing");
    assert_eq!(missing, 0);
}

#[tokio::test]
async fn filtered_queries_report_the_unpaged_total() {
    let store = SqliteCatalogStore::in_memory().expect("open store");
    for index in 0..3 {
        store
            .create_product(&product(
                &format!("p-{index}"),
                &format!("SKU-{index}"),
                "Clothing",
                10.0 + f64::from(index),
            ))
            .await
            .expect("create");
    }
    store.create_product(&product("p-9", "SKU-9", "Shoes", 99.0)).await.expect("create");

    let filter = ProductFilter {
        category: Some("Clothing".to_string()),
        is_active: Some(true),
        ..ProductFilter::default()
    };
    let page = store.find_many(&filter, Paging::new(0, 2)).await.expect("query");
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total, 3);

    let priced = ProductFilter {
        price_min: Some(11.0),
        price_max: Some(12.0),
        ..ProductFilter::default()
    };
    let page = store.find_many(&priced, Paging::default()).await.expect("query");
    assert_eq!(page.total, 2);
}

#[tokio::test]
async fn tag_and_badge_filters_match_membership() {
    let store = SqliteCatalogStore::in_memory().expect("open store");
    let mut tagged = product("p-1", "SKU-1", "Clothing", 10.0);
    tagged.tags = vec!["summer".to_string(), "cotton".to_string()];
    store.create_product(&tagged).await.expect("create");
    store.create_product(&product("p-2", "SKU-2", "Clothing", 10.0)).await.expect("create");

    let filter = ProductFilter {
        tags: vec!["summer".to_string()],
        ..ProductFilter::default()
    };
    let page = store.find_many(&filter, Paging::default()).await.expect("query");
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, tagged.id);

    let none = ProductFilter {
        tags: vec!["winter".to_string()],
        ..ProductFilter::default()
    };
    assert_eq!(store.find_many(&none, Paging::default()).await.expect("query").total, 0);
}

#[tokio::test]
async fn text_search_orders_by_field_weights() {
    let store = SqliteCatalogStore::in_memory().expect("open store");
    let mut by_name = product("p-name", "SKU-A", "Clothing", 10.0);
    by_name.name = "Linen Shirt".to_string();
    let mut by_tag = product("p-tag", "SKU-B", "Clothing", 10.0);
    by_tag.name = "Summer Top".to_string();
    by_tag.tags = vec!["shirt".to_string()];
    let mut by_description = product("p-desc", "SKU-C", "Clothing", 10.0);
    by_description.name = "Summer Blouse".to_string();
    by_description.description = Some("A lightweight shirt alternative".to_string());
    for doc in [&by_name, &by_tag, &by_description] {
        store.create_product(doc).await.expect("create");
    }

    let page = store
        .search_text("shirt", &ProductFilter::active(), Paging::default())
        .await
        .expect("search");
    assert_eq!(page.total, 3);
    assert_eq!(page.items[0].id, by_name.id);
    assert_eq!(page.items[1].id, by_tag.id);
    assert_eq!(page.items[2].id, by_description.id);
}

#[tokio::test]
async fn insert_many_is_atomic_on_collision() {
    let store = SqliteCatalogStore::in_memory().expect("open store");
    store.create_product(&product("p-1", "SKU-1", "Clothing", 10.0)).await.expect("create");

    let batch =
        vec![product("p-2", "SKU-2", "Clothing", 11.0), product("p-3", "SKU-1", "Clothing", 12.0)];
    let err = store.insert_many(&batch).await.expect_err("collision");
    assert!(matches!(err, StoreError::DuplicateSku { .. }));
    assert!(store.get_product(&ProductId::new("p-2")).await.expect("get").is_none());

    let clean =
        vec![product("p-2", "SKU-2", "Clothing", 11.0), product("p-3", "SKU-3", "Clothing", 12.0)];
    let ids = store.insert_many(&clean).await.expect("insert");
    assert_eq!(ids.len(), 2);
}

#[tokio::test]
async fn import_job_claims_have_a_single_winner() {
    let store = SqliteCatalogStore::in_memory().expect("open store");
    let job = ImportJob::new(JobId::new("job-1"), "upload.csv", 10, ImportMode::Partial, Timestamp::now());
    store.create_import_job(&job).await.expect("create job");

    assert!(store.claim_import_job(&job.job_id).await.expect("first claim"));
    assert!(!store.claim_import_job(&job.job_id).await.expect("second claim"));
    assert!(!store.claim_import_job(&JobId::new("ghost")).await.expect("missing job"));

    let claimed = store.get_import_job(&job.job_id).await.expect("get").expect("exists");
    assert_eq!(claimed.status, ImportJobStatus::Processing);
}

#[tokio::test]
async fn size_charts_round_trip() {
    let store = SqliteCatalogStore::in_memory().expect("open store");
    let chart = SizeChart {
        chart_id: ChartId::new("chart-1"),
        name: "Men's Tops".to_string(),
        department: Some("Men".to_string()),
        rows: vec![SizeChartRow {
            label: "M".to_string(),
            measurements: [("chest".to_string(), "38-40\"".to_string())].into(),
        }],
        created_at: Timestamp::now(),
    };
    store.put_size_chart(&chart).await.expect("put chart");
    let loaded = store
        .get_size_chart(&chart.chart_id)
        .await
        .expect("get chart")
        .expect("chart exists");
    assert_eq!(loaded, chart);
}

#[tokio::test]
async fn the_required_indexes_exist_at_startup() {
    let store = SqliteCatalogStore::in_memory().expect("open store");
    let indexes = store.list_indexes().await.expect("list indexes");
    let names: Vec<&str> = indexes.iter().map(|index| index.name.as_str()).collect();
    assert!(names.contains(&"idx_sku_unique"));
    assert!(names.contains(&"idx_active_category_price"));
    assert!(names.contains(&"idx_active_created"));
    assert!(names.contains(&"idx_parent"));
    let sku = indexes.iter().find(|index| index.name == "idx_sku_unique").expect("sku index");
    assert!(sku.unique);
    assert!(sku.sparse);
}

// crates/catalog-import/src/template.rs
// ============================================================================
// Module: Import Template
// Description: Column schema and downloadable CSV template for bulk import.
// Purpose: Define the fixed upload schema shared by template and validation.
// Dependencies: csv
// ============================================================================

//! ## Overview
//! The upload schema is a fixed column set derived from the product's
//! required fields. Required columns carry a `*` suffix in their header.
//! The downloadable template ships the header row, one example row, and an
//! instructions document describing each column.

// ============================================================================
// SECTION: Column Schema
// ============================================================================

/// One column of the upload schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportColumn {
    /// Product field the column maps to.
    pub field: &'static str,
    /// Header cell text.
    pub header: &'static str,
    /// True when a value is mandatory.
    pub required: bool,
    /// Column description for the instructions sheet.
    pub description: &'static str,
    /// Example cell value.
    pub example: &'static str,
}

/// The fixed upload schema in column order.
pub const TEMPLATE_COLUMNS: [ImportColumn; 12] = [
    ImportColumn {
        field: "sku",
        header: "SKU*",
        required: true,
        description: "Unique product identifier",
        example: "PROD-12345",
    },
    ImportColumn {
        field: "name",
        header: "Product Name*",
        required: true,
        description: "Product name (max 200 chars)",
        example: "Men's Cotton T-Shirt",
    },
    ImportColumn {
        field: "description",
        header: "Description",
        required: false,
        description: "Product description",
        example: "Comfortable cotton t-shirt for everyday wear",
    },
    ImportColumn {
        field: "price",
        header: "Price*",
        required: true,
        description: "Price in USD (must be >= 0)",
        example: "29.99",
    },
    ImportColumn {
        field: "brand",
        header: "Brand",
        required: false,
        description: "Brand name",
        example: "Nike",
    },
    ImportColumn {
        field: "department",
        header: "Department",
        required: false,
        description: "Top level category (Men, Women, Kids, etc.)",
        example: "Men",
    },
    ImportColumn {
        field: "category",
        header: "Category",
        required: false,
        description: "Second level category (Clothing, Shoes, etc.)",
        example: "Clothing",
    },
    ImportColumn {
        field: "subcategory",
        header: "Subcategory",
        required: false,
        description: "Third level category (Tops, Bottoms, etc.)",
        example: "Tops",
    },
    ImportColumn {
        field: "tags",
        header: "Tags",
        required: false,
        description: "Comma-separated tags",
        example: "casual, summer, cotton",
    },
    ImportColumn {
        field: "images",
        header: "Image URLs",
        required: false,
        description: "Comma-separated image URLs",
        example: "https://cdn.example.com/image1.jpg,https://cdn.example.com/image2.jpg",
    },
    ImportColumn {
        field: "colors",
        header: "Colors",
        required: false,
        description: "Comma-separated colors",
        example: "Red, Blue, Black",
    },
    ImportColumn {
        field: "sizes",
        header: "Sizes",
        required: false,
        description: "Comma-separated sizes",
        example: "S, M, L, XL",
    },
];

/// Columns whose values are comma-separated lists.
pub const LIST_COLUMNS: [&str; 4] = ["tags", "images", "colors", "sizes"];

// ============================================================================
// SECTION: Template Generation
// ============================================================================

/// Renders the downloadable CSV template (header row plus one example row).
#[must_use]
pub fn csv_template() -> String {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let headers: Vec<&str> = TEMPLATE_COLUMNS.iter().map(|column| column.header).collect();
    let examples: Vec<&str> = TEMPLATE_COLUMNS.iter().map(|column| column.example).collect();
    if writer.write_record(&headers).is_err() || writer.write_record(&examples).is_err() {
        return String::new();
    }
    writer
        .into_inner()
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_default()
}

/// Renders the instructions document accompanying template downloads.
#[must_use]
pub fn template_instructions() -> String {
    let mut text = String::from("Bulk Product Import Template\nVersion: 1.0\n\nField\tDescription\n");
    for column in &TEMPLATE_COLUMNS {
        text.push_str(column.header);
        text.push('\t');
        text.push_str(column.description);
        text.push('\n');
    }
    text.push_str("\nColumns marked with * are required. List columns accept comma-separated values.\n");
    text
}

//! Catalog models: categories and products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopforge_core::{CategoryId, ProductId, ShopId};

/// A product category.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub shop_id: ShopId,
    pub parent_id: Option<CategoryId>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub position: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Active category on the storefront, with the number of active products.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PublicCategory {
    pub id: CategoryId,
    pub parent_id: Option<CategoryId>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub product_count: i64,
}

/// Body of `POST /shops/{shop_id}/categories`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryInput {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub position: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// A catalog product as its owner sees it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub shop_id: ShopId,
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub price: Decimal,
    pub compare_price: Option<Decimal>,
    pub cost_price: Option<Decimal>,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub quantity: i32,
    pub track_inventory: bool,
    pub allow_backorder: bool,
    pub weight: Option<Decimal>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub is_active: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Owner listing row: the product plus its category name.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductListItem {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub product: Product,
    pub category_name: Option<String>,
}

/// Storefront view of an active product. Cost price and stock counts stay
/// private; only availability is exposed.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PublicProduct {
    pub id: ProductId,
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub price: Decimal,
    pub compare_price: Option<Decimal>,
    pub sku: Option<String>,
    pub in_stock: bool,
    pub is_featured: bool,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

/// Body of `POST /shops/{shop_id}/products`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductInput {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub short_description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub compare_price: Option<Decimal>,
    #[serde(default)]
    pub cost_price: Option<Decimal>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
}

/// One product in a catalog export. Ids, category and cost stay behind so
/// the file can be imported into any shop.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductExport {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub price: Decimal,
    pub compare_price: Option<Decimal>,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub quantity: i32,
    pub is_active: bool,
    pub is_featured: bool,
}

/// Body of `POST /shops/{shop_id}/products/import` and of the export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCatalog<T> {
    pub products: Vec<T>,
}

/// Outcome of a bulk import: products are inserted one by one and failures
/// do not stop the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub errors: Vec<String>,
}

const fn default_true() -> bool {
    true
}

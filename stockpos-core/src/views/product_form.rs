//! Product create/edit forms and per-store stock actions

use crate::api::InventoryApi;
use crate::domain::{
    AdjustStockInput, AdjustStockResponse, Category, InitialStock, Product, ProductPayload,
    SetStockInput, SetStockResponse, StockDetail, Store,
};
use crate::error::{ClientError, Result};
use crate::http::FilePart;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, warn};
use validator::{Validate, ValidationError};

pub const SKU_SUGGESTION_LEN: usize = 16;

lazy_static::lazy_static! {
    static ref SKU_SEPARATORS: regex::Regex = regex::Regex::new(r"[^A-Z0-9]+").unwrap();
}

/// SKU derived from a product name: uppercase, runs of other characters
/// collapsed to `-`, no leading or trailing `-`, at most 16 characters
pub fn suggest_sku(name: &str) -> String {
    let upper = name.trim().to_uppercase();
    let collapsed = SKU_SEPARATORS.replace_all(&upper, "-");
    collapsed
        .trim_matches('-')
        .chars()
        .take(SKU_SUGGESTION_LEN)
        .collect()
}

/// Initial stock row of a new product
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct InitialStockDraft {
    /// Rows without a store are skipped
    pub store_id: Option<i64>,
    #[validate(range(min = 0))]
    pub quantity: i64,
    #[validate(range(min = 0))]
    pub min_threshold: i64,
}

fn validate_distinct_stores(rows: &[InitialStockDraft]) -> std::result::Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for store_id in rows.iter().filter_map(|r| r.store_id) {
        if !seen.insert(store_id) {
            let mut err = ValidationError::new("duplicate_store");
            err.message = Some("the same store appears twice in the initial stock".into());
            return Err(err);
        }
    }
    Ok(())
}

/// New product form
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct ProductDraft {
    #[validate(length(min = 1, max = 60))]
    pub sku: String,
    #[validate(length(min = 1, max = 160))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 0.0))]
    pub price_usd: f64,
    #[validate(length(min = 1))]
    pub categories: Vec<i64>,
    #[serde(default)]
    #[validate(nested, custom(function = "validate_distinct_stores"))]
    pub initial_stocks: Vec<InitialStockDraft>,
}

impl Default for ProductDraft {
    /// An empty form starts with one blank stock row
    fn default() -> Self {
        Self {
            sku: String::new(),
            name: String::new(),
            description: String::new(),
            price_usd: 0.0,
            categories: Vec::new(),
            initial_stocks: vec![InitialStockDraft::default()],
        }
    }
}

impl ProductDraft {
    /// Fill the SKU from the name unless one was typed
    pub fn autofill_sku(&mut self) {
        if self.sku.is_empty() && !self.name.trim().is_empty() {
            self.sku = suggest_sku(&self.name);
        }
    }

    pub fn toggle_category(&mut self, id: i64) {
        toggle(&mut self.categories, id);
    }

    pub fn add_stock_row(&mut self) {
        self.initial_stocks.push(InitialStockDraft::default());
    }

    pub fn remove_stock_row(&mut self, index: usize) {
        if index < self.initial_stocks.len() {
            self.initial_stocks.remove(index);
        }
    }

    pub fn to_payload(&self) -> ProductPayload {
        ProductPayload {
            sku: Some(self.sku.clone()),
            name: Some(self.name.clone()),
            description: Some(self.description.clone()),
            categories: Some(self.categories.clone()),
            price_usd: Some(self.price_usd),
            initial_stocks: Some(
                self.initial_stocks
                    .iter()
                    .filter_map(|row| {
                        row.store_id.map(|store_id| InitialStock {
                            store_id,
                            quantity: row.quantity,
                            min_threshold: row.min_threshold,
                        })
                    })
                    .collect(),
            ),
        }
    }
}

/// Edit form of an existing product
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
pub struct ProductEdit {
    #[validate(length(min = 1))]
    pub sku: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 0.0))]
    pub price_usd: f64,
    #[serde(default)]
    pub categories: Vec<i64>,
}

impl ProductEdit {
    pub fn from_product(product: &Product) -> Self {
        Self {
            sku: product.sku.clone(),
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price_usd: product.price_usd.unwrap_or(0.0),
            categories: product.category_ids(),
        }
    }

    pub fn toggle_category(&mut self, id: i64) {
        toggle(&mut self.categories, id);
    }

    pub fn to_payload(&self) -> ProductPayload {
        ProductPayload {
            sku: Some(self.sku.clone()),
            name: Some(self.name.clone()),
            description: Some(self.description.clone()),
            categories: Some(self.categories.clone()),
            price_usd: Some(self.price_usd),
            initial_stocks: None,
        }
    }
}

fn toggle(ids: &mut Vec<i64>, id: i64) {
    if let Some(pos) = ids.iter().position(|c| *c == id) {
        ids.remove(pos);
    } else {
        ids.push(id);
    }
}

/// Stores the product has no stock row for
pub fn stores_missing<'a>(product: &Product, stores: &'a [Store]) -> Vec<&'a Store> {
    let have: HashSet<i64> = product
        .stocks_detail
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|row| row.store_id)
        .collect();
    stores.iter().filter(|s| !have.contains(&s.id)).collect()
}

/// Everything the detail screen shows
#[derive(Debug, Clone)]
pub struct ProductDetail {
    pub product: Product,
    pub categories: Vec<Category>,
    pub stores: Vec<Store>,
}

impl ProductDetail {
    pub fn stores_missing(&self) -> Vec<&Store> {
        stores_missing(&self.product, &self.stores)
    }
}

/// Product create, edit and stock actions
#[derive(Clone)]
pub struct ProductForms {
    inventory: InventoryApi,
}

impl ProductForms {
    pub fn new(inventory: InventoryApi) -> Self {
        Self { inventory }
    }

    /// Validate and create the product, then upload its image if one was
    /// picked. A failed upload does not fail the creation.
    pub async fn create(&self, draft: &ProductDraft, image: Option<FilePart>) -> Result<Product> {
        draft.validate()?;
        let mut product = self.inventory.create_product(&draft.to_payload()).await?;
        info!(product_id = product.id, sku = %product.sku, "product created");

        if let Some(image) = image {
            match self.inventory.upload_product_image(product.id, image).await {
                Ok(uploaded) => product.image_url = Some(uploaded.image_url),
                Err(e) => warn!(product_id = product.id, error = %e, "image upload failed"),
            }
        }
        Ok(product)
    }

    /// Product, categories and stores, fetched concurrently
    pub async fn load(&self, id: i64) -> Result<ProductDetail> {
        if id <= 0 {
            return Err(ClientError::InvalidInput(format!("invalid product id {}", id)));
        }
        let (product, categories, stores) = tokio::try_join!(
            self.inventory.get_product(id),
            self.inventory.list_categories(),
            self.inventory.list_stores(),
        )?;
        Ok(ProductDetail {
            product,
            categories,
            stores,
        })
    }

    pub async fn update(&self, id: i64, edit: &ProductEdit) -> Result<Product> {
        edit.validate()?;
        let product = self.inventory.update_product(id, &edit.to_payload()).await?;
        info!(product_id = id, "product updated");
        Ok(product)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.inventory.delete_product(id).await?;
        info!(product_id = id, "product deleted");
        Ok(())
    }

    /// Replace the product image, returning the new URL
    pub async fn replace_image(&self, id: i64, image: FilePart) -> Result<String> {
        Ok(self.inventory.upload_product_image(id, image).await?.image_url)
    }

    pub async fn remove_image(&self, id: i64) -> Result<()> {
        self.inventory.delete_product_image(id).await
    }

    /// Set the absolute quantity and threshold of a store row
    pub async fn set_stock(
        &self,
        product: &mut Product,
        store_id: i64,
        quantity: i64,
        min_threshold: i64,
    ) -> Result<SetStockResponse> {
        let input = SetStockInput {
            store_id,
            quantity,
            min_threshold: Some(min_threshold),
        };
        let saved = self.inventory.set_stock(product.id, &input).await?;
        if let Some(row) = row_mut(product, saved.store_id) {
            row.quantity = saved.quantity;
            row.min_threshold = saved.min_threshold;
        }
        Ok(saved)
    }

    /// Add `delta` units to a store row. Zero is a no-op and sends nothing.
    pub async fn apply_delta(
        &self,
        product: &mut Product,
        store_id: i64,
        delta: i64,
    ) -> Result<Option<AdjustStockResponse>> {
        if delta == 0 {
            return Ok(None);
        }
        let adjusted = self
            .inventory
            .adjust_stock(product.id, &AdjustStockInput { store_id, delta })
            .await?;
        if let Some(row) = row_mut(product, adjusted.store_id) {
            row.quantity = adjusted.new_quantity;
        }
        Ok(Some(adjusted))
    }

    /// Create an empty stock row for `store`
    pub async fn add_store(&self, product: &mut Product, store: &Store) -> Result<()> {
        let input = SetStockInput {
            store_id: store.id,
            quantity: 0,
            min_threshold: Some(0),
        };
        let saved = self.inventory.set_stock(product.id, &input).await?;
        product
            .stocks_detail
            .get_or_insert_with(Vec::new)
            .push(StockDetail {
                store_id: saved.store_id,
                store_code: Some(store.code.clone()),
                quantity: saved.quantity,
                min_threshold: saved.min_threshold,
                updated_at: Some(chrono::Utc::now().to_rfc3339()),
            });
        Ok(())
    }
}

fn row_mut(product: &mut Product, store_id: i64) -> Option<&mut StockDetail> {
    product
        .stocks_detail
        .as_mut()
        .and_then(|rows| rows.iter_mut().find(|r| r.store_id == store_id))
}

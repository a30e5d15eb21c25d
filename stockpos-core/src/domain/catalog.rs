//! Catalog domain models: stores, categories, products and stock rows

use super::number::{flexible_f64, flexible_f64_opt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Physical store (sede)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub id: i64,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

/// Products reference categories either by id or embedded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryRef {
    Id(i64),
    Full(Category),
}

impl CategoryRef {
    pub fn id(&self) -> i64 {
        match self {
            CategoryRef::Id(id) => *id,
            CategoryRef::Full(c) => c.id,
        }
    }
}

/// Per-store stock line embedded in a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockDetail {
    pub store_id: i64,
    #[serde(default)]
    pub store_code: Option<String>,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub min_threshold: i64,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub categories: Vec<CategoryRef>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_stock: i64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "flexible_f64_opt")]
    pub price_usd: Option<f64>,
    #[serde(default)]
    pub stocks_detail: Option<Vec<StockDetail>>,
}

impl Product {
    pub fn category_ids(&self) -> Vec<i64> {
        self.categories.iter().map(CategoryRef::id).collect()
    }

    pub fn stock_row(&self, store_id: i64) -> Option<&StockDetail> {
        self.stocks_detail
            .as_deref()
            .and_then(|rows| rows.iter().find(|r| r.store_id == store_id))
    }

    /// Quantity in one store; products without a row there have none
    pub fn stock_in_store(&self, store_id: i64) -> i64 {
        self.stock_row(store_id).map(|r| r.quantity).unwrap_or(0)
    }

    /// Stock across stores: the backend total, else the sum of rows
    pub fn global_stock(&self) -> i64 {
        if self.total_stock != 0 {
            return self.total_stock;
        }
        self.stocks_detail
            .as_deref()
            .map(|rows| rows.iter().map(|r| r.quantity).sum())
            .unwrap_or(0)
    }

    pub fn unit_price_usd(&self) -> f64 {
        self.price_usd.unwrap_or(0.0).max(0.0)
    }
}

/// Row of the per-product stocks endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRow {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub store: Option<Store>,
    #[serde(default)]
    pub store_id: Option<i64>,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub min_threshold: i64,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl StockRow {
    pub fn store_id(&self) -> Option<i64> {
        self.store_id.or_else(|| self.store.as_ref().map(|s| s.id))
    }
}

/// Query parameters of the product list
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordering: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,
}

/// Initial stock line sent when creating a product
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitialStock {
    pub store_id: i64,
    pub quantity: i64,
    pub min_threshold: i64,
}

/// Body of product create (all fields) and update requests
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_stocks: Option<Vec<InitialStock>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetStockInput {
    pub store_id: i64,
    pub quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_threshold: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdjustStockInput {
    pub store_id: i64,
    pub delta: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SetStockResponse {
    #[serde(alias = "product")]
    pub product_id: i64,
    pub store_id: i64,
    pub quantity: i64,
    #[serde(default)]
    pub min_threshold: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AdjustStockResponse {
    #[serde(alias = "product")]
    pub product_id: i64,
    pub store_id: i64,
    pub new_quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImageUploadResponse {
    pub image_url: String,
}

/// Exchange rate: Bs per USD
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FxRate {
    #[serde(deserialize_with = "flexible_f64")]
    pub usd_to_bs: f64,
    #[serde(default)]
    pub effective_date: Option<String>,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product_json() -> serde_json::Value {
        json!({
            "id": 9,
            "sku": "ARROZ-1KG",
            "name": "Arroz 1kg",
            "categories": [1, {"id": 4, "name": "Granos", "slug": "granos"}],
            "is_active": true,
            "created_at": "2025-03-01T10:00:00-04:00",
            "total_stock": 0,
            "price_usd": "1.25",
            "stocks_detail": [
                {"store_id": 1, "store_code": "CCS", "quantity": 4, "min_threshold": 2, "updated_at": null},
                {"store_id": 2, "store_code": "VAL", "quantity": 6, "min_threshold": 0, "updated_at": null}
            ]
        })
    }

    #[test]
    fn test_product_decodes_mixed_shapes() {
        let p: Product = serde_json::from_value(product_json()).unwrap();
        assert_eq!(p.category_ids(), vec![1, 4]);
        assert_eq!(p.price_usd, Some(1.25));
        assert!(p.created_at.is_some());
    }

    #[test]
    fn test_stock_helpers() {
        let p: Product = serde_json::from_value(product_json()).unwrap();
        assert_eq!(p.stock_in_store(1), 4);
        assert_eq!(p.stock_in_store(3), 0);
        // total_stock missing -> sum of rows
        assert_eq!(p.global_stock(), 10);
    }

    #[test]
    fn test_stock_row_store_id_fallback() {
        let row: StockRow = serde_json::from_value(json!({
            "id": 1,
            "store": {"id": 5, "name": "Centro", "code": "CEN", "is_active": true},
            "quantity": 3,
            "min_threshold": 1
        }))
        .unwrap();
        assert_eq!(row.store_id(), Some(5));
    }

    #[test]
    fn test_set_stock_response_alias() {
        let r: SetStockResponse = serde_json::from_value(json!({
            "product_id": 9, "store_id": 1, "quantity": 10, "min_threshold": 2
        }))
        .unwrap();
        assert_eq!(r.product_id, 9);

        let r: SetStockResponse =
            serde_json::from_value(json!({"product": 9, "store_id": 1, "quantity": 10})).unwrap();
        assert_eq!(r.min_threshold, 0);
    }

    #[test]
    fn test_product_payload_skips_unset_fields() {
        let payload = ProductPayload {
            name: Some("Arroz".to_string()),
            price_usd: Some(1.5),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"name": "Arroz", "price_usd": 1.5})
        );
    }

    #[test]
    fn test_fx_rate_string_decimal() {
        let fx: FxRate = serde_json::from_value(json!({"usd_to_bs": "40.2500"})).unwrap();
        assert_eq!(fx.usd_to_bs, 40.25);
    }
}

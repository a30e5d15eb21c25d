//! Inventory endpoints: catalog, stock, exchange rate, sales and KPIs

use super::client::ApiClient;
use crate::domain::{
    AdjustStockInput, AdjustStockResponse, Category, FxRate, ImageUploadResponse, Listing, Page,
    PayCurrency, Product, ProductPayload, ProductQuery, Sale, SaleCreatePayload, SalesQuery,
    SetStockInput, SetStockResponse, StatsResponse, StockAlerts, StockRow, Store, TopProducts,
    TopProductsQuery,
};
use crate::error::Result;
use crate::http::{ApiRequest, FilePart};
use serde_json::json;

const PRODUCTS: &str = "/inventory/products/";
const SALES: &str = "/inventory/sales/";

/// Multipart field the backend reads the product image from
pub const IMAGE_FIELD: &str = "image";

fn product_path(id: i64) -> String {
    format!("{}{}/", PRODUCTS, id)
}

fn product_action(id: i64, action: &str) -> String {
    format!("{}{}/{}/", PRODUCTS, id, action)
}

#[derive(Clone)]
pub struct InventoryApi {
    client: ApiClient,
}

impl InventoryApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub async fn stats(&self) -> Result<StatsResponse> {
        self.client.get_json("/inventory/stats/").await
    }

    pub async fn get_fx(&self) -> Result<FxRate> {
        self.client.get_json("/inventory/fx/").await
    }

    /// Set the Bs per USD rate (admin only on the backend)
    pub async fn set_fx(&self, usd_to_bs: f64) -> Result<FxRate> {
        self.client
            .post_json("/inventory/fx/", &json!({ "usd_to_bs": usd_to_bs }))
            .await
    }

    pub async fn list_products(&self, query: &ProductQuery) -> Result<Page<Product>> {
        let listing: Listing<Product> = self.client.get_json_with(PRODUCTS, query).await?;
        Ok(listing.into_page())
    }

    pub async fn get_product(&self, id: i64) -> Result<Product> {
        self.client.get_json(&product_path(id)).await
    }

    pub async fn create_product(&self, payload: &ProductPayload) -> Result<Product> {
        self.client.post_json(PRODUCTS, payload).await
    }

    pub async fn update_product(&self, id: i64, payload: &ProductPayload) -> Result<Product> {
        self.client.put_json(&product_path(id), payload).await
    }

    pub async fn delete_product(&self, id: i64) -> Result<()> {
        self.client.delete(&product_path(id)).await
    }

    /// Upload the product image; the part is always sent as the `image` field
    pub async fn upload_product_image(
        &self,
        id: i64,
        file: FilePart,
    ) -> Result<ImageUploadResponse> {
        let file = FilePart {
            field: IMAGE_FIELD.to_string(),
            ..file
        };
        let request = ApiRequest::post(product_action(id, "image")).file(file);
        self.client.fetch(&request).await
    }

    pub async fn delete_product_image(&self, id: i64) -> Result<()> {
        self.client.delete(&product_action(id, "image")).await
    }

    pub async fn product_stocks(&self, id: i64) -> Result<Vec<StockRow>> {
        let listing: Listing<StockRow> =
            self.client.get_json(&product_action(id, "stocks")).await?;
        Ok(listing.into_items())
    }

    pub async fn set_stock(&self, id: i64, input: &SetStockInput) -> Result<SetStockResponse> {
        self.client
            .post_json(&product_action(id, "set_stock"), input)
            .await
    }

    pub async fn adjust_stock(
        &self,
        id: i64,
        input: &AdjustStockInput,
    ) -> Result<AdjustStockResponse> {
        self.client
            .post_json(&product_action(id, "adjust_stock"), input)
            .await
    }

    pub async fn list_stores(&self) -> Result<Vec<Store>> {
        let listing: Listing<Store> = self.client.get_json("/inventory/stores/").await?;
        Ok(listing.into_items())
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let listing: Listing<Category> = self.client.get_json("/inventory/categories/").await?;
        Ok(listing.into_items())
    }

    pub async fn list_sales(&self, query: &SalesQuery) -> Result<Page<Sale>> {
        let listing: Listing<Sale> = self.client.get_json_with(SALES, query).await?;
        Ok(listing.into_page())
    }

    pub async fn create_sale(&self, payload: &SaleCreatePayload) -> Result<Sale> {
        self.client.post_json(SALES, payload).await
    }

    /// Absolute invoice link, optionally in a given currency
    pub fn sale_invoice_url(&self, id: i64, currency: Option<PayCurrency>) -> String {
        let url = self
            .client
            .resolve_absolute_url(&format!("{}{}/invoice/", SALES, id));
        match currency {
            Some(currency) => format!("{}?currency={}", url, currency.as_str()),
            None => url,
        }
    }

    /// Low stock, out of stock and inactive products.
    ///
    /// `threshold` overrides the per-store minimum when set.
    pub async fn stock_alerts(&self, threshold: Option<i64>) -> Result<StockAlerts> {
        let mut request = ApiRequest::get("/inventory/kpis/stock/alerts/");
        if let Some(threshold) = threshold {
            request = request.query_pair("threshold", threshold);
        }
        self.client.fetch(&request).await
    }

    pub async fn top_products(&self, query: &TopProductsQuery) -> Result<TopProducts> {
        self.client
            .get_json_with("/inventory/kpis/sales/top-products/", query)
            .await
    }
}

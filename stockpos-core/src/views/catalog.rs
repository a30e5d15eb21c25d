//! Product catalog listing
//!
//! Search and paging go to the backend; store, category and status filters
//! are applied locally on the loaded page.

use crate::api::InventoryApi;
use crate::domain::{Page, Product, ProductQuery, StockRow};
use crate::error::Result;
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

pub const DEFAULT_PAGE_SIZE: u32 = 9;
const CATALOG_ORDERING: &str = "-created_at";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    #[default]
    Active,
    Inactive,
}

impl std::str::FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "inactive" => Ok(StatusFilter::Inactive),
            other => Err(format!("unknown status filter: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilters {
    /// Keep only products with stock in this store
    pub store: Option<i64>,
    /// Keep products in any of these categories; empty keeps all
    pub categories: BTreeSet<i64>,
    pub status: StatusFilter,
}

impl CatalogFilters {
    pub fn matches(&self, product: &Product) -> bool {
        self.matches_store(product) && self.matches_categories(product) && self.matches_status(product)
    }

    fn matches_store(&self, product: &Product) -> bool {
        match self.store {
            Some(store_id) => product.stock_in_store(store_id) > 0,
            None => true,
        }
    }

    fn matches_categories(&self, product: &Product) -> bool {
        self.categories.is_empty()
            || product
                .category_ids()
                .iter()
                .any(|id| self.categories.contains(id))
    }

    fn matches_status(&self, product: &Product) -> bool {
        match self.status {
            StatusFilter::All => true,
            StatusFilter::Active => product.is_active,
            StatusFilter::Inactive => !product.is_active,
        }
    }

    pub fn toggle_category(&mut self, id: i64) {
        if !self.categories.remove(&id) {
            self.categories.insert(id);
        }
    }
}

/// Loaded page plus the locally filtered view of it
#[derive(Debug, Clone)]
pub struct CatalogView {
    pub search: String,
    pub page: u32,
    pub page_size: u32,
    pub filters: CatalogFilters,
    items: Vec<Product>,
    total: u64,
    /// The backend sent the whole list at once
    complete: bool,
    next: Option<String>,
    visible: Vec<Product>,
}

impl Default for CatalogView {
    fn default() -> Self {
        Self {
            search: String::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            filters: CatalogFilters::default(),
            items: Vec::new(),
            total: 0,
            complete: true,
            next: None,
            visible: Vec::new(),
        }
    }
}

impl CatalogView {
    /// Backend query for the current search and page
    pub fn query(&self) -> ProductQuery {
        let search = self.search.trim();
        ProductQuery {
            search: (!search.is_empty()).then(|| search.to_string()),
            ordering: Some(CATALOG_ORDERING.to_string()),
            page: Some(self.page),
            page_size: Some(self.page_size),
            ..Default::default()
        }
    }

    pub fn set_page(&mut self, page: Page<Product>) {
        self.total = page.total;
        self.complete = page.complete;
        self.next = page.next;
        self.items = page.items;
        self.apply_filters();
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.visible.clear();
        self.total = 0;
        self.complete = true;
        self.next = None;
    }

    pub fn apply_filters(&mut self) {
        self.visible = self
            .items
            .iter()
            .filter(|p| self.filters.matches(p))
            .cloned()
            .collect();
    }

    fn pages_locally(&self) -> bool {
        self.complete
    }

    /// Products to show on the current page
    pub fn page_items(&self) -> &[Product] {
        if !self.pages_locally() {
            return &self.visible;
        }
        let size = self.page_size.max(1) as usize;
        let start = (self.page.max(1) as usize - 1) * size;
        if start >= self.visible.len() {
            return &[];
        }
        let end = (start + size).min(self.visible.len());
        &self.visible[start..end]
    }

    pub fn total_pages(&self) -> u32 {
        let size = u64::from(self.page_size.max(1));
        if self.pages_locally() {
            return (self.visible.len() as u64).div_ceil(size).max(1) as u32;
        }
        let counted = self.total.div_ceil(size).max(1) as u32;
        // Envelopes without a count only tell us whether another page exists.
        let linked = self.page.max(1) + u32::from(self.next.is_some());
        counted.max(linked)
    }

    /// Whether a page after the current one exists
    pub fn has_next(&self) -> bool {
        if self.pages_locally() {
            self.page < self.total_pages()
        } else {
            self.next.is_some()
        }
    }

    pub fn visible(&self) -> &[Product] {
        &self.visible
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}

/// Catalog screen: a [`CatalogView`] bound to the inventory API
pub struct Catalog {
    inventory: InventoryApi,
    pub view: CatalogView,
    stocks: HashMap<i64, Vec<StockRow>>,
}

impl Catalog {
    pub fn new(inventory: InventoryApi) -> Self {
        Self {
            inventory,
            view: CatalogView::default(),
            stocks: HashMap::new(),
        }
    }

    /// Fetch the current page. On failure the view is emptied.
    pub async fn load(&mut self) -> Result<()> {
        match self.inventory.list_products(&self.view.query()).await {
            Ok(page) => {
                self.view.set_page(page);
                Ok(())
            }
            Err(e) => {
                self.view.clear();
                Err(e)
            }
        }
    }

    /// New search text; paging restarts from the first page
    pub async fn search(&mut self, text: &str) -> Result<()> {
        self.view.search = text.to_string();
        self.view.page = 1;
        self.load().await
    }

    /// Move to the next page; `false` when already on the last one
    pub async fn next_page(&mut self) -> Result<bool> {
        if !self.view.has_next() {
            return Ok(false);
        }
        self.view.page += 1;
        self.load().await.map(|_| true)
    }

    pub async fn prev_page(&mut self) -> Result<bool> {
        if self.view.page <= 1 {
            return Ok(false);
        }
        self.view.page -= 1;
        self.load().await.map(|_| true)
    }

    /// Per-store stock rows of a product, fetched once and cached
    pub async fn stocks(&mut self, product_id: i64) -> &[StockRow] {
        if !self.stocks.contains_key(&product_id) {
            let rows = match self.inventory.product_stocks(product_id).await {
                Ok(rows) => rows,
                Err(e) => {
                    warn!(product_id, error = %e, "stock rows unavailable");
                    Vec::new()
                }
            };
            self.stocks.insert(product_id, rows);
        }
        self.stocks.get(&product_id).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CategoryRef, StockDetail};

    fn product(id: i64, active: bool, categories: &[i64], stock: &[(i64, i64)]) -> Product {
        Product {
            id,
            sku: format!("SKU-{}", id),
            name: format!("Producto {}", id),
            description: None,
            categories: categories.iter().map(|c| CategoryRef::Id(*c)).collect(),
            is_active: active,
            created_at: None,
            total_stock: stock.iter().map(|(_, q)| q).sum(),
            image_url: None,
            price_usd: Some(1.0),
            stocks_detail: Some(
                stock
                    .iter()
                    .map(|(store_id, quantity)| StockDetail {
                        store_id: *store_id,
                        store_code: None,
                        quantity: *quantity,
                        min_threshold: 0,
                        updated_at: None,
                    })
                    .collect(),
            ),
        }
    }

    fn bare(items: Vec<Product>) -> Page<Product> {
        Page {
            total: items.len() as u64,
            items,
            next: None,
            previous: None,
            complete: true,
        }
    }

    #[test]
    fn test_default_status_is_active() {
        let mut view = CatalogView::default();
        view.set_page(bare(vec![product(1, true, &[], &[]), product(2, false, &[], &[])]));
        assert_eq!(view.visible().len(), 1);

        view.filters.status = StatusFilter::Inactive;
        view.apply_filters();
        assert_eq!(view.visible()[0].id, 2);

        view.filters.status = StatusFilter::All;
        view.apply_filters();
        assert_eq!(view.visible().len(), 2);
    }

    #[test]
    fn test_store_filter_needs_positive_stock() {
        let mut view = CatalogView::default();
        view.filters.store = Some(1);
        view.set_page(bare(vec![
            product(1, true, &[], &[(1, 3)]),
            product(2, true, &[], &[(1, 0), (2, 5)]),
            product(3, true, &[], &[]),
        ]));
        let ids: Vec<i64> = view.visible().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_category_filter_matches_any() {
        let mut view = CatalogView::default();
        view.filters.toggle_category(4);
        view.filters.toggle_category(7);
        view.set_page(bare(vec![
            product(1, true, &[4], &[]),
            product(2, true, &[5], &[]),
            product(3, true, &[5, 7], &[]),
        ]));
        let ids: Vec<i64> = view.visible().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3]);

        view.filters.toggle_category(4);
        view.filters.toggle_category(7);
        view.apply_filters();
        assert_eq!(view.visible().len(), 3);
    }

    #[test]
    fn test_local_pagination_for_bare_lists() {
        let mut view = CatalogView {
            page_size: 2,
            ..Default::default()
        };
        view.set_page(bare((1..=5).map(|i| product(i, true, &[], &[])).collect()));

        assert_eq!(view.total_pages(), 3);
        assert_eq!(view.page_items().len(), 2);
        view.page = 3;
        assert_eq!(view.page_items()[0].id, 5);
        view.page = 4;
        assert!(view.page_items().is_empty());
    }

    #[test]
    fn test_server_pagination_trusts_count() {
        let mut view = CatalogView::default();
        view.set_page(Page {
            items: (1..=9).map(|i| product(i, true, &[], &[])).collect(),
            total: 40,
            next: Some("http://x/?page=2".to_string()),
            previous: None,
            complete: false,
        });
        assert_eq!(view.total_pages(), 5);
        assert_eq!(view.page_items().len(), 9);
    }

    #[test]
    fn test_envelope_without_count_follows_next_link() {
        let mut view = CatalogView::default();
        // count missing: the normalized total equals the page length
        view.set_page(Page {
            items: (1..=9).map(|i| product(i, true, &[], &[])).collect(),
            total: 9,
            next: Some("http://x/?page=2".to_string()),
            previous: None,
            complete: false,
        });
        assert_eq!(view.total_pages(), 2);
        assert!(view.has_next());

        view.page = 2;
        view.set_page(Page {
            items: (10..=13).map(|i| product(i, true, &[], &[])).collect(),
            total: 4,
            next: None,
            previous: Some("http://x/?page=1".to_string()),
            complete: false,
        });
        assert_eq!(view.page_items().len(), 4);
        assert_eq!(view.page_items()[0].id, 10);
        assert_eq!(view.total_pages(), 2);
        assert!(!view.has_next());
    }

    #[test]
    fn test_local_pages_have_next_until_last() {
        let mut view = CatalogView {
            page_size: 2,
            ..Default::default()
        };
        view.set_page(bare((1..=3).map(|i| product(i, true, &[], &[])).collect()));
        assert!(view.has_next());
        view.page = 2;
        assert!(!view.has_next());
    }

    #[test]
    fn test_empty_catalog_has_one_page() {
        assert_eq!(CatalogView::default().total_pages(), 1);
    }

    #[test]
    fn test_query() {
        let mut view = CatalogView::default();
        view.search = "  arroz ".to_string();
        view.page = 2;
        let q = view.query();
        assert_eq!(q.search.as_deref(), Some("arroz"));
        assert_eq!(q.ordering.as_deref(), Some("-created_at"));
        assert_eq!(q.page, Some(2));
        assert_eq!(q.page_size, Some(DEFAULT_PAGE_SIZE));

        view.search.clear();
        assert!(view.query().search.is_none());
    }
}

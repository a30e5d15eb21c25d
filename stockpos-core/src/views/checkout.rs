//! Point-of-sale cart and checkout

use crate::api::InventoryApi;
use crate::domain::number::round2;
use crate::domain::{
    Category, PayCurrency, PaymentMethod, Product, ProductQuery, Sale, SaleCreatePayload,
    SaleItemWrite, SalesQuery, Store,
};
use crate::error::{ClientError, Result};
use serde::Serialize;
use tracing::{info, warn};

pub const SEARCH_PAGE_SIZE: u32 = 40;
pub const RECENT_SALES: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartItem {
    pub product: Product,
    pub quantity: i64,
    pub unit_usd: f64,
}

impl CartItem {
    pub fn line_usd(&self) -> f64 {
        self.unit_usd * self.quantity as f64
    }
}

/// Cart bound to the store being invoiced
#[derive(Debug, Clone, Default)]
pub struct Cart {
    store: Option<i64>,
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> Option<i64> {
        self.store
    }

    pub fn select_store(&mut self, store: Option<i64>) {
        self.store = store;
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn quantity_of(&self, product_id: i64) -> i64 {
        self.items
            .iter()
            .find(|i| i.product.id == product_id)
            .map(|i| i.quantity)
            .unwrap_or(0)
    }

    /// Stock of `product` in the selected store, or across stores when none is selected
    pub fn base_stock(&self, product: &Product) -> i64 {
        match self.store {
            Some(store_id) => product.stock_in_store(store_id),
            None => product.global_stock(),
        }
    }

    /// Units that can still be added
    pub fn available(&self, product: &Product) -> i64 {
        (self.base_stock(product) - self.quantity_of(product.id)).max(0)
    }

    /// Add one unit; `false` when nothing is left to add
    pub fn add(&mut self, product: &Product) -> bool {
        if self.available(product) <= 0 {
            return false;
        }
        match self.items.iter_mut().find(|i| i.product.id == product.id) {
            Some(item) => item.quantity += 1,
            None => self.items.push(CartItem {
                product: product.clone(),
                quantity: 1,
                unit_usd: product.unit_price_usd(),
            }),
        }
        true
    }

    /// Change a line by `delta` units, capped by availability; lines that
    /// reach zero are dropped
    pub fn change(&mut self, product_id: i64, delta: i64) {
        let Some(index) = self.items.iter().position(|i| i.product.id == product_id) else {
            return;
        };
        let max = self.base_stock(&self.items[index].product).max(0);
        let item = &mut self.items[index];
        item.quantity = (item.quantity + delta).clamp(0, max);
        if item.quantity == 0 {
            self.items.remove(index);
        }
    }

    pub fn increment(&mut self, product_id: i64) {
        self.change(product_id, 1);
    }

    pub fn decrement(&mut self, product_id: i64) {
        self.change(product_id, -1);
    }

    pub fn remove(&mut self, product_id: i64) {
        self.items.retain(|i| i.product.id != product_id);
    }

    /// Override the unit price of a line; negative or non-finite values are ignored
    pub fn set_unit_usd(&mut self, product_id: i64, unit_usd: f64) -> bool {
        if !unit_usd.is_finite() || unit_usd < 0.0 {
            return false;
        }
        match self.items.iter_mut().find(|i| i.product.id == product_id) {
            Some(item) => {
                item.unit_usd = unit_usd;
                true
            }
            None => false,
        }
    }

    pub fn subtotal_usd(&self) -> f64 {
        self.items.iter().map(CartItem::line_usd).sum()
    }

    pub fn subtotal_ves(&self, fx: f64) -> f64 {
        round2(self.subtotal_usd() * fx)
    }
}

/// Invoice and payment details entered at checkout
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutForm {
    pub customer_name: String,
    pub customer_address: String,
    pub customer_id_doc: String,
    pub customer_phone: String,
    pub payment_method: PaymentMethod,
    pub payment_reference: String,
    pub notes: String,
}

impl Default for CheckoutForm {
    fn default() -> Self {
        Self {
            customer_name: String::new(),
            customer_address: String::new(),
            customer_id_doc: String::new(),
            customer_phone: String::new(),
            payment_method: PaymentMethod::PagoMovil,
            payment_reference: String::new(),
            notes: String::new(),
        }
    }
}

/// Check the cart and form and build the sale payload.
///
/// Local-currency methods send Bs line prices, the rest USD prices.
pub fn build_sale(cart: &Cart, form: &CheckoutForm, fx: f64) -> Result<SaleCreatePayload> {
    let store = cart
        .store()
        .ok_or_else(|| ClientError::InvalidInput("Select a store to invoice".to_string()))?;
    if cart.is_empty() {
        return Err(ClientError::InvalidInput("The cart is empty".to_string()));
    }
    let reference = form.payment_reference.trim();
    if form.payment_method.requires_reference() && reference.is_empty() {
        return Err(ClientError::InvalidInput(
            "A payment reference is required for mobile payments".to_string(),
        ));
    }

    let currency = form.payment_method.currency();
    let items = cart
        .items()
        .iter()
        .map(|item| match currency {
            PayCurrency::Usd => SaleItemWrite {
                product_id: item.product.id,
                quantity: item.quantity,
                unit_price: None,
                unit_price_usd: Some(round2(item.unit_usd)),
            },
            PayCurrency::Ves => SaleItemWrite {
                product_id: item.product.id,
                quantity: item.quantity,
                unit_price: Some(round2(item.unit_usd * fx)),
                unit_price_usd: None,
            },
        })
        .collect();

    Ok(SaleCreatePayload {
        store,
        notes: Some(form.notes.trim().to_string()),
        items,
        pay_currency_set: Some(currency),
        customer_name: form.customer_name.trim().to_string(),
        customer_address: form.customer_address.trim().to_string(),
        customer_id_doc: form.customer_id_doc.trim().to_string(),
        customer_phone: form.customer_phone.trim().to_string(),
        payment_method: form.payment_method,
        payment_reference: (!reference.is_empty()).then(|| reference.to_string()),
        vat_rate: None,
    })
}

/// Product search query of the sales screen
pub fn sales_search_query(search: &str) -> ProductQuery {
    let search = search.trim();
    ProductQuery {
        search: (!search.is_empty()).then(|| search.to_string()),
        ordering: Some("name".to_string()),
        page_size: Some(SEARCH_PAGE_SIZE),
        is_active: Some(true),
        include: Some("stocks".to_string()),
        ..Default::default()
    }
}

/// Recorded sale and where to fetch its invoice
#[derive(Debug, Clone)]
pub struct CheckoutReceipt {
    pub sale: Sale,
    pub invoice_url: String,
}

/// Sales screen: catalogs, product search, cart and checkout
pub struct Checkout {
    inventory: InventoryApi,
    pub cart: Cart,
    pub form: CheckoutForm,
    /// Bs per USD
    pub fx: f64,
    /// Single category filter for the search results
    pub category: Option<i64>,
    pub stores: Vec<Store>,
    pub categories: Vec<Category>,
}

impl Checkout {
    pub fn new(inventory: InventoryApi) -> Self {
        Self {
            inventory,
            cart: Cart::new(),
            form: CheckoutForm::default(),
            fx: 1.0,
            category: None,
            stores: Vec::new(),
            categories: Vec::new(),
        }
    }

    /// Load stores, categories and the exchange rate. Each part that fails
    /// keeps its previous value.
    pub async fn load_catalogs(&mut self) {
        let (stores, categories, fx) = tokio::join!(
            self.inventory.list_stores(),
            self.inventory.list_categories(),
            self.inventory.get_fx(),
        );
        match stores {
            Ok(stores) => self.stores = stores,
            Err(e) => warn!(error = %e, "stores unavailable"),
        }
        match categories {
            Ok(categories) => self.categories = categories,
            Err(e) => warn!(error = %e, "categories unavailable"),
        }
        match fx {
            Ok(rate) if rate.usd_to_bs > 0.0 => self.fx = rate.usd_to_bs,
            Ok(_) => self.fx = 1.0,
            Err(e) => warn!(error = %e, "exchange rate unavailable"),
        }
        // A single store is selected automatically.
        if self.cart.store().is_none() && self.stores.len() == 1 {
            self.cart.select_store(Some(self.stores[0].id));
        }
    }

    /// Selecting the category already selected clears the filter
    pub fn toggle_category(&mut self, id: i64) {
        self.category = if self.category == Some(id) { None } else { Some(id) };
    }

    /// Active products matching `search`, restricted to the selected store's
    /// stock and the category filter
    pub async fn search(&self, search: &str) -> Result<Vec<Product>> {
        let page = self
            .inventory
            .list_products(&sales_search_query(search))
            .await?;
        Ok(page
            .items
            .into_iter()
            .filter(|p| match self.cart.store() {
                Some(store_id) => p.stock_in_store(store_id) > 0,
                None => true,
            })
            .filter(|p| match self.category {
                Some(category) => p.category_ids().contains(&category),
                None => true,
            })
            .collect())
    }

    pub fn unit_ves(&self, item: &CartItem) -> f64 {
        round2(item.unit_usd * self.fx)
    }

    pub fn price_ves(&self, product: &Product) -> f64 {
        round2(product.unit_price_usd() * self.fx)
    }

    /// Total in the currency the selected payment method is charged in
    pub fn total(&self) -> (PayCurrency, f64) {
        match self.form.payment_method.currency() {
            PayCurrency::Usd => (PayCurrency::Usd, self.cart.subtotal_usd()),
            PayCurrency::Ves => (PayCurrency::Ves, self.cart.subtotal_ves(self.fx)),
        }
    }

    /// Record the sale. The cart is cleared only when the backend accepts it.
    pub async fn checkout(&mut self) -> Result<CheckoutReceipt> {
        let payload = build_sale(&self.cart, &self.form, self.fx)?;
        let currency = payload.pay_currency_set;
        let sale = self.inventory.create_sale(&payload).await?;
        info!(sale_id = sale.id, store = payload.store, items = payload.items.len(), "sale recorded");

        self.cart.clear();
        let invoice_url = self.inventory.sale_invoice_url(sale.id, currency);
        Ok(CheckoutReceipt { sale, invoice_url })
    }

    pub async fn recent_sales(&self) -> Result<Vec<Sale>> {
        let query = SalesQuery {
            page_size: Some(RECENT_SALES),
            ..Default::default()
        };
        Ok(self.inventory.list_sales(&query).await?.items)
    }
}

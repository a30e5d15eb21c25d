//! Screen-level state and workflows built on the typed API

pub mod catalog;
pub mod checkout;
pub mod dashboard;
pub mod product_form;

pub use catalog::{Catalog, CatalogFilters, CatalogView, StatusFilter};
pub use checkout::{build_sale, Cart, CartItem, Checkout, CheckoutForm, CheckoutReceipt};
pub use dashboard::{Dashboard, DashboardSummary, KpiView};
pub use product_form::{ProductDetail, ProductDraft, ProductEdit, ProductForms};

//! Domain models shared by the API clients and the view logic

pub mod catalog;
pub mod number;
pub mod page;
pub mod sale;
pub mod stats;
pub mod user;

pub use catalog::{
    AdjustStockInput, AdjustStockResponse, Category, CategoryRef, FxRate, ImageUploadResponse,
    InitialStock, Product, ProductPayload, ProductQuery, SetStockInput, SetStockResponse,
    StockDetail, StockRow, Store,
};
pub use page::{Listing, Page, Paginated};
pub use sale::{
    PayCurrency, PaymentMethod, Sale, SaleCreatePayload, SaleItem, SaleItemWrite, SalesQuery,
};
pub use stats::{
    AlertItem, DateRange, KpiPeriod, ProductCounts, SalesWindow, StatsResponse, StockAlerts,
    StockSummary, StoreStock, TopProduct, TopProducts, TopProductsQuery,
};
pub use user::{AuthUser, Credentials};

//! Dashboard statistics and KPI models

use super::catalog::StockDetail;
use super::number::{flexible_f64, flexible_f64_opt};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductCounts {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub active: u64,
    #[serde(default)]
    pub inactive: u64,
}

/// Stock total of one store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreStock {
    #[serde(rename = "store__code")]
    pub store_code: String,
    #[serde(default)]
    pub total: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockSummary {
    #[serde(default)]
    pub global: i64,
    #[serde(default)]
    pub por_sede: Vec<StoreStock>,
}

/// Sales of the trailing 30 days; `total` is in Bs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesWindow {
    #[serde(default)]
    pub count: u64,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub total: f64,
    #[serde(default, deserialize_with = "flexible_f64_opt", skip_serializing_if = "Option::is_none")]
    pub total_usd: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsResponse {
    #[serde(default)]
    pub products: ProductCounts,
    #[serde(default)]
    pub stock: StockSummary,
    #[serde(default)]
    pub sales_last_30d: SalesWindow,
    /// Bs per USD, rounded for display
    #[serde(default, deserialize_with = "flexible_f64_opt")]
    pub fx_usd: Option<f64>,
    /// Bs per USD, full precision
    #[serde(default, deserialize_with = "flexible_f64_opt")]
    pub fx_usd_raw: Option<f64>,
    #[serde(default)]
    pub fx_base: Option<String>,
    #[serde(default)]
    pub fx_currency: Option<String>,
}

impl StatsResponse {
    /// Stats with every field filled with its neutral value
    pub fn empty() -> Self {
        Self {
            fx_usd: Some(1.0),
            fx_usd_raw: Some(1.0),
            fx_base: Some("USD".to_string()),
            fx_currency: Some("VES".to_string()),
            ..Default::default()
        }
    }

    /// Fill in the optional fx fields the same way `empty` does
    pub fn normalized(mut self) -> Self {
        let fx = self.fx_usd.filter(|v| *v > 0.0).unwrap_or(1.0);
        self.fx_usd = Some(fx);
        self.fx_usd_raw = Some(self.fx_usd_raw.filter(|v| *v > 0.0).unwrap_or(fx));
        self.fx_base.get_or_insert_with(|| "USD".to_string());
        self.fx_currency.get_or_insert_with(|| "VES".to_string());
        self
    }
}

/// Product entry of the stock alerts report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertItem {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default, alias = "stocks")]
    pub total_stock: i64,
    #[serde(default)]
    pub threshold: i64,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub stocks_detail: Vec<StockDetail>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockAlerts {
    #[serde(default)]
    pub threshold_fallback: i64,
    #[serde(default)]
    pub low_stock: Vec<AlertItem>,
    #[serde(default)]
    pub out_of_stock: Vec<AlertItem>,
    #[serde(default)]
    pub inactive_products: Vec<AlertItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KpiPeriod {
    Week,
    Month,
    Year,
}

impl KpiPeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            KpiPeriod::Week => "week",
            KpiPeriod::Month => "month",
            KpiPeriod::Year => "year",
        }
    }
}

impl std::str::FromStr for KpiPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" => Ok(KpiPeriod::Week),
            "month" => Ok(KpiPeriod::Month),
            "year" => Ok(KpiPeriod::Year),
            other => Err(format!("period must be one of week, month, year (got {})", other)),
        }
    }
}

/// Query of the top-selling products report.
///
/// `start`/`end` together override `period` with a custom range.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TopProductsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<KpiPeriod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopProduct {
    pub product_id: i64,
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub total_units: i64,
    #[serde(default)]
    pub total_sales_lines: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopProducts {
    #[serde(default)]
    pub range: DateRange,
    #[serde(default)]
    pub period_used: String,
    #[serde(default)]
    pub best_seller: Option<TopProduct>,
    #[serde(default)]
    pub top_products: Vec<TopProduct>,
}

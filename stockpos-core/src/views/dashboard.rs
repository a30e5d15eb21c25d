//! Home dashboard and stock alert KPIs

use crate::api::{InventoryApi, Kpis, Overview, StatsService};
use crate::domain::number::round2;
use crate::domain::{
    AlertItem, KpiPeriod, ProductCounts, SalesWindow, StatsResponse, StockSummary, TopProduct,
    TopProductsQuery,
};
use crate::error::Result;
use serde::Serialize;
use tracing::warn;

/// Figures of the home screen, merged from the overview and the raw stats
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub products: ProductCounts,
    pub stock: StockSummary,
    pub sales: SalesWindow,
    /// Sales of the last 30 days in USD
    pub sales_total_usd: f64,
    /// Bs per USD
    pub fx: f64,
    pub categories_count: u64,
    pub stores_count: u64,
}

impl DashboardSummary {
    /// Merge the aggregated overview with the inventory stats.
    ///
    /// Inventory figures win when they carry data; otherwise the aggregate
    /// is kept. `fallback_fx` is used when neither reports a positive rate.
    pub fn merge(overview: &Overview, inventory: Option<&StatsResponse>, fallback_fx: f64) -> Self {
        let agg = &overview.stats;

        let products = match inventory {
            Some(inv) if inv.products.total != 0 => inv.products.clone(),
            _ => agg.products.clone(),
        };
        let stock = match inventory {
            Some(inv) if inv.stock.global > 0 => inv.stock.clone(),
            _ => agg.stock.clone(),
        };
        let sales = match inventory {
            Some(inv) if inv.sales_last_30d.count > 0 => inv.sales_last_30d.clone(),
            _ => agg.sales_last_30d.clone(),
        };

        let fx = agg
            .fx_usd
            .filter(|v| *v > 0.0)
            .or_else(|| inventory.and_then(|inv| inv.fx_usd).filter(|v| *v > 0.0))
            .unwrap_or(if fallback_fx > 0.0 { fallback_fx } else { 1.0 });

        let sales_total_usd = match sales.total_usd {
            Some(usd) => round2(usd),
            None => round2(sales.total / fx),
        };

        Self {
            products,
            stock,
            sales,
            sales_total_usd,
            fx,
            categories_count: overview.categories_count,
            stores_count: overview.stores_count,
        }
    }

    /// Stock per store as chart labels and values
    pub fn store_series(&self) -> (Vec<String>, Vec<i64>) {
        self.stock
            .por_sede
            .iter()
            .map(|s| (s.store_code.clone(), s.total))
            .unzip()
    }
}

pub struct Dashboard {
    inventory: InventoryApi,
    stats: StatsService,
}

impl Dashboard {
    pub fn new(inventory: InventoryApi) -> Self {
        let stats = StatsService::new(inventory.clone());
        Self { inventory, stats }
    }

    /// Load every dashboard figure concurrently; failures fall back to
    /// neutral values instead of failing the screen
    pub async fn load(&self) -> DashboardSummary {
        let (overview, inventory, fx) = tokio::join!(
            self.stats.overview(),
            self.inventory.stats(),
            self.inventory.get_fx(),
        );

        let inventory = inventory
            .map_err(|e| warn!(error = %e, "inventory stats unavailable"))
            .ok();
        let fallback_fx = match fx {
            Ok(rate) => rate.usd_to_bs,
            Err(e) => {
                warn!(error = %e, "exchange rate unavailable");
                1.0
            }
        };

        DashboardSummary::merge(&overview, inventory.as_ref(), fallback_fx)
    }
}

pub const DEFAULT_ALERT_THRESHOLD: i64 = 5;
pub const DEFAULT_TOP_LIMIT: u32 = 10;

/// Alerts screen state
#[derive(Debug, Clone)]
pub struct KpiView {
    pub threshold: i64,
    pub period: KpiPeriod,
    pub limit: u32,
    kpis: Option<Kpis>,
}

impl Default for KpiView {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_ALERT_THRESHOLD,
            period: KpiPeriod::Week,
            limit: DEFAULT_TOP_LIMIT,
            kpis: None,
        }
    }
}

impl KpiView {
    pub fn query(&self) -> TopProductsQuery {
        TopProductsQuery {
            period: Some(self.period),
            limit: Some(self.limit.max(1)),
            ..Default::default()
        }
    }

    pub async fn load(&mut self, stats: &StatsService) -> Result<()> {
        let kpis = stats.kpis(Some(self.threshold), &self.query()).await?;
        self.kpis = Some(kpis);
        Ok(())
    }

    pub fn set(&mut self, kpis: Kpis) {
        self.kpis = Some(kpis);
    }

    pub fn kpis(&self) -> Option<&Kpis> {
        self.kpis.as_ref()
    }

    pub fn low_stock(&self) -> &[AlertItem] {
        self.kpis.as_ref().map(|k| k.alerts.low_stock.as_slice()).unwrap_or(&[])
    }

    pub fn out_of_stock(&self) -> &[AlertItem] {
        self.kpis
            .as_ref()
            .map(|k| k.alerts.out_of_stock.as_slice())
            .unwrap_or(&[])
    }

    pub fn inactive(&self) -> &[AlertItem] {
        self.kpis
            .as_ref()
            .map(|k| k.alerts.inactive_products.as_slice())
            .unwrap_or(&[])
    }

    /// Best seller as reported, else the first of the ranking
    pub fn best_seller(&self) -> Option<&TopProduct> {
        let top = &self.kpis.as_ref()?.top;
        top.best_seller.as_ref().or_else(|| top.top_products.first())
    }

    pub fn top_products(&self) -> &[TopProduct] {
        self.kpis
            .as_ref()
            .map(|k| k.top.top_products.as_slice())
            .unwrap_or(&[])
    }
}

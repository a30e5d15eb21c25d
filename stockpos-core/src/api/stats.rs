//! Dashboard aggregation over the inventory endpoints

use super::inventory::InventoryApi;
use crate::domain::{Listing, StatsResponse, StockAlerts, TopProducts, TopProductsQuery};
use crate::error::Result;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Figures shown on the home dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub stats: StatsResponse,
    pub categories_count: u64,
    pub stores_count: u64,
}

/// Inputs of the alerts dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub alerts: StockAlerts,
    pub top: TopProducts,
}

#[derive(Clone)]
pub struct StatsService {
    inventory: InventoryApi,
}

impl StatsService {
    pub fn new(inventory: InventoryApi) -> Self {
        Self { inventory }
    }

    /// Stats plus category and store counts, fetched concurrently.
    ///
    /// Each part degrades to its empty value on failure, so the dashboard
    /// always has something to show.
    pub async fn overview(&self) -> Overview {
        let (stats, categories, stores) = tokio::join!(
            self.inventory.stats(),
            self.count("/inventory/categories/"),
            self.count("/inventory/stores/"),
        );

        let stats = match stats {
            Ok(stats) => stats.normalized(),
            Err(e) => {
                warn!(error = %e, "stats unavailable, using empty values");
                StatsResponse::empty()
            }
        };

        Overview {
            stats,
            categories_count: categories,
            stores_count: stores,
        }
    }

    async fn count(&self, path: &str) -> u64 {
        match self.inventory.client().get_json::<Listing<Value>>(path).await {
            Ok(listing) => listing.total(),
            Err(e) => {
                warn!(path, error = %e, "count unavailable");
                0
            }
        }
    }

    /// Stock alerts and top products, fetched concurrently
    pub async fn kpis(&self, threshold: Option<i64>, query: &TopProductsQuery) -> Result<Kpis> {
        let (alerts, top) = tokio::try_join!(
            self.inventory.stock_alerts(threshold),
            self.inventory.top_products(query),
        )?;
        Ok(Kpis { alerts, top })
    }
}

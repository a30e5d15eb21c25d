//! StockPOS command-line client
//!
//! Signs in with the configured credentials and prints inventory figures as JSON.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use stockpos_core::domain::{Credentials, KpiPeriod, ProductQuery, SalesQuery, TopProductsQuery};
use stockpos_core::views::{Dashboard, KpiView};
use stockpos_core::{telemetry, AppContext, Config};
use tracing::info;

#[derive(Parser)]
#[command(name = "stockpos")]
#[command(about = "Inventory and point-of-sale client")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend origin, overrides STOCKPOS_BASE_URL
    #[arg(long)]
    base_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the signed-in user
    Whoami,

    /// Dashboard figures
    Stats,

    /// List products
    Products {
        /// Search text
        #[arg(short, long)]
        search: Option<String>,

        #[arg(long, default_value = "1")]
        page: u32,

        #[arg(long, default_value = "20")]
        page_size: u32,
    },

    /// Low stock, out of stock and inactive products with the top sellers
    Alerts {
        /// Minimum stock before a product is reported
        #[arg(short, long, default_value = "5")]
        threshold: i64,

        /// week, month or year
        #[arg(short, long, default_value = "week")]
        period: KpiPeriod,
    },

    /// Top-selling products
    TopProducts {
        #[arg(short, long, default_value = "week")]
        period: KpiPeriod,

        #[arg(short, long, default_value = "10")]
        limit: u32,

        /// Custom range start (YYYY-MM-DD), needs --end
        #[arg(long, requires = "end")]
        start: Option<String>,

        #[arg(long, requires = "start")]
        end: Option<String>,
    },

    /// Show the exchange rate, or set it when a value is given
    Fx {
        /// Bs per USD
        rate: Option<f64>,
    },

    /// List recent sales
    Sales {
        #[arg(long)]
        store: Option<i64>,

        #[arg(long)]
        from: Option<String>,

        #[arg(long)]
        to: Option<String>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn sign_in(ctx: &AppContext) -> Result<()> {
    if ctx.restore().await {
        return Ok(());
    }

    let username = std::env::var("STOCKPOS_USERNAME").unwrap_or_default();
    let password = std::env::var("STOCKPOS_PASSWORD").unwrap_or_default();
    if username.is_empty() || password.is_empty() {
        bail!("No active session; set STOCKPOS_USERNAME and STOCKPOS_PASSWORD");
    }

    ctx.login(&Credentials::new(&username, &password))
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message("Invalid username or password")))
        .context("Sign in failed")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
    }
    telemetry::init(&config.telemetry);

    info!(base_url = %config.api.base_url, "Starting StockPOS client");

    let ctx = AppContext::headless(config)?;
    sign_in(&ctx).await?;

    match cli.command {
        Commands::Whoami => print_json(&ctx.session.current_user())?,
        Commands::Stats => {
            let summary = Dashboard::new(ctx.inventory.clone()).load().await;
            print_json(&summary)?;
        }
        Commands::Products {
            search,
            page,
            page_size,
        } => {
            let query = ProductQuery {
                search,
                page: Some(page),
                page_size: Some(page_size),
                ..Default::default()
            };
            print_json(&ctx.inventory.list_products(&query).await?)?;
        }
        Commands::Alerts { threshold, period } => {
            let mut view = KpiView::default();
            view.threshold = threshold;
            view.period = period;
            view.load(&ctx.stats).await?;
            print_json(&view.kpis())?;
        }
        Commands::TopProducts {
            period,
            limit,
            start,
            end,
        } => {
            let query = TopProductsQuery {
                period: Some(period),
                limit: Some(limit),
                start,
                end,
            };
            print_json(&ctx.inventory.top_products(&query).await?)?;
        }
        Commands::Fx { rate } => {
            let fx = match rate {
                Some(rate) if rate > 0.0 => ctx.inventory.set_fx(rate).await?,
                Some(_) => bail!("Exchange rate must be positive"),
                None => ctx.inventory.get_fx().await?,
            };
            print_json(&fx)?;
        }
        Commands::Sales { store, from, to } => {
            let query = SalesQuery {
                store,
                date_from: from,
                date_to: to,
                ..Default::default()
            };
            print_json(&ctx.inventory.list_sales(&query).await?)?;
        }
    }

    Ok(())
}

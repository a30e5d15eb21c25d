//! Configuration management for the StockPOS client

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend API configuration
    pub api: ApiConfig,
    /// Navigation routes
    pub routes: RouteConfig,
    /// Logging configuration
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Backend origin (e.g., http://localhost:8000)
    pub base_url: String,
    /// Path prefix every API call is relative to
    pub api_prefix: String,
    /// Transport timeout; `None` keeps the transport default
    pub timeout: Option<Duration>,
    /// Cookie the backend stores the anti-forgery token in
    pub csrf_cookie: String,
    /// Header unsafe requests carry the token in
    pub csrf_header: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            api_prefix: "/api".to_string(),
            timeout: None,
            csrf_cookie: "csrftoken".to_string(),
            csrf_header: "X-CSRFToken".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouteConfig {
    /// Public login entry point
    pub login_route: String,
    /// Landing route for role-denied navigation
    pub default_route: String,
    /// Query parameter carrying the route to resume after login
    pub resume_param: String,
    /// Groups admitted to the sales screen (staff always are)
    pub sales_groups: Vec<String>,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            login_route: "/login".to_string(),
            default_route: "/home".to_string(),
            resume_param: "next".to_string(),
            sales_groups: vec!["VENDEDOR".to_string()],
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// "pretty" or "json"
    pub log_format: String,
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: "pretty".to_string(),
            service_name: "stockpos".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            routes: RouteConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let timeout = match env::var("STOCKPOS_HTTP_TIMEOUT_SECS") {
            Ok(raw) if !raw.trim().is_empty() => Some(Duration::from_secs(
                raw.trim()
                    .parse()
                    .context("Invalid STOCKPOS_HTTP_TIMEOUT_SECS")?,
            )),
            _ => None,
        };

        Ok(Self {
            api: ApiConfig {
                base_url: env::var("STOCKPOS_BASE_URL").unwrap_or(defaults.api.base_url),
                api_prefix: normalize_prefix(
                    &env::var("STOCKPOS_API_PREFIX").unwrap_or(defaults.api.api_prefix),
                ),
                timeout,
                csrf_cookie: env::var("STOCKPOS_CSRF_COOKIE").unwrap_or(defaults.api.csrf_cookie),
                csrf_header: env::var("STOCKPOS_CSRF_HEADER").unwrap_or(defaults.api.csrf_header),
            },
            routes: RouteConfig {
                login_route: env::var("STOCKPOS_LOGIN_ROUTE")
                    .unwrap_or(defaults.routes.login_route),
                default_route: env::var("STOCKPOS_DEFAULT_ROUTE")
                    .unwrap_or(defaults.routes.default_route),
                resume_param: defaults.routes.resume_param,
                sales_groups: env::var("STOCKPOS_SALES_GROUPS")
                    .map(|s| {
                        s.split(',')
                            .map(|g| g.trim().to_string())
                            .filter(|g| !g.is_empty())
                            .collect()
                    })
                    .unwrap_or(defaults.routes.sales_groups),
            },
            telemetry: TelemetryConfig {
                log_format: env::var("LOG_FORMAT").unwrap_or(defaults.telemetry.log_format),
                service_name: env::var("OTEL_SERVICE_NAME")
                    .unwrap_or(defaults.telemetry.service_name),
            },
        })
    }

    /// Config pointing at a given backend origin, everything else default
    pub fn for_base_url(base_url: &str) -> Self {
        let mut config = Config::default();
        config.api.base_url = base_url.to_string();
        config
    }
}

/// Ensure the prefix starts with `/` and has no trailing slash
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

//! Application context wiring the client together
//!
//! One cookie-carrying transport is shared by the session, the refresh
//! protocol and every API service, so they all see the same session.

use crate::api::{ApiClient, InventoryApi, StatsService};
use crate::auth::{RefreshOrchestrator, SessionManager, SessionRefresher};
use crate::config::Config;
use crate::domain::{AuthUser, Credentials};
use crate::error::Result;
use crate::http::HttpClient;
use crate::navigation::{NavigationLog, Navigator, RouteTable, Router};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub http: HttpClient,
    pub session: Arc<SessionManager>,
    pub navigator: Arc<dyn Navigator>,
    pub orchestrator: Arc<RefreshOrchestrator>,
    pub api: ApiClient,
    pub inventory: InventoryApi,
    pub stats: StatsService,
    pub router: Arc<Router>,
}

impl AppContext {
    pub fn new(config: Config, navigator: Arc<dyn Navigator>) -> Result<Self> {
        let http = HttpClient::new(config.api.clone())?;
        let session = Arc::new(SessionManager::new(http.clone()));

        let refresher = SessionRefresher::new(
            session.clone(),
            navigator.clone(),
            config.routes.clone(),
        );
        let orchestrator = Arc::new(RefreshOrchestrator::new(Arc::new(refresher)));

        let api = ApiClient::new(http.clone(), orchestrator.clone());
        let inventory = InventoryApi::new(api.clone());
        let stats = StatsService::new(inventory.clone());

        let router = Arc::new(Router::new(
            RouteTable::standard(&config.routes),
            config.routes.clone(),
            session.clone(),
            navigator.clone(),
        ));

        Ok(Self {
            config: Arc::new(config),
            http,
            session,
            navigator,
            orchestrator,
            api,
            inventory,
            stats,
            router,
        })
    }

    /// Context whose navigation is recorded in memory
    pub fn headless(config: Config) -> Result<Self> {
        Self::new(config, Arc::new(NavigationLog::new()))
    }

    /// Reuse the current session if the backend still accepts it
    pub async fn restore(&self) -> bool {
        self.session.restore_session().await
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<AuthUser> {
        let user = self.session.login(credentials).await?;
        info!(username = %user.username, "signed in");
        Ok(user)
    }

    /// End the session and return to the login route
    pub async fn logout(&self) -> Result<()> {
        let result = self.session.logout().await;
        self.navigator.navigate(&self.config.routes.login_route);
        result
    }
}

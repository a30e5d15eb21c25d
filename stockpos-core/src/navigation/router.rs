//! Route table and guarded navigation

use super::guard::{auth_guard, path_of, role_guard, GuardDecision};
use super::Navigator;
use crate::auth::SessionManager;
use crate::config::RouteConfig;
use crate::error::{ClientError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Redirect chains longer than this are treated as a loop
const MAX_REDIRECTS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteGuard {
    Authenticated,
    AnyRole(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct Route {
    /// Path pattern; `:name` segments capture a parameter
    pub pattern: String,
    pub guards: Vec<RouteGuard>,
}

impl Route {
    pub fn public(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            guards: Vec::new(),
        }
    }

    pub fn guarded(pattern: &str, guards: Vec<RouteGuard>) -> Self {
        Self {
            pattern: pattern.to_string(),
            guards,
        }
    }

    /// Captured parameters when `path` matches this route
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let pattern: Vec<&str> = segments(&self.pattern).collect();
        let actual: Vec<&str> = segments(path).collect();
        if pattern.len() != actual.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (expected, got) in pattern.iter().zip(actual.iter()) {
            if let Some(name) = expected.strip_prefix(':') {
                params.insert(name.to_string(), got.to_string());
            } else if expected != got {
                return None;
            }
        }
        Some(params)
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Ordered routes plus the fallback for paths nothing matches
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
    fallback: String,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>, fallback: &str) -> Self {
        Self {
            routes,
            fallback: fallback.to_string(),
        }
    }

    /// Routes of the inventory application
    pub fn standard(config: &RouteConfig) -> Self {
        let authed = || vec![RouteGuard::Authenticated];
        Self::new(
            vec![
                Route::public(&config.login_route),
                Route::guarded("/home", authed()),
                Route::guarded("/products", authed()),
                // Listed before `:id` so "new" is not taken as an id.
                Route::guarded("/products/new", authed()),
                Route::guarded("/products/:id", authed()),
                Route::guarded(
                    "/sales",
                    vec![
                        RouteGuard::Authenticated,
                        RouteGuard::AnyRole(config.sales_groups.clone()),
                    ],
                ),
            ],
            &config.default_route,
        )
    }

    /// First route matching `path`, with its parameters
    pub fn resolve(&self, path: &str) -> Option<(&Route, HashMap<String, String>)> {
        self.routes
            .iter()
            .find_map(|route| route.matches(path).map(|params| (route, params)))
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }
}

/// Where a navigation ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationOutcome {
    /// Final location, including its query
    pub url: String,
    /// Pattern of the route that was activated
    pub route: String,
    pub params: HashMap<String, String>,
    /// Whether a guard or the fallback changed the requested location
    pub redirected: bool,
}

pub struct Router {
    table: RouteTable,
    routes: RouteConfig,
    session: Arc<SessionManager>,
    navigator: Arc<dyn Navigator>,
}

impl Router {
    pub fn new(
        table: RouteTable,
        routes: RouteConfig,
        session: Arc<SessionManager>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            table,
            routes,
            session,
            navigator,
        }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Resolve `url`, run its guards and deliver the final location to the
    /// navigator. Redirects are followed until a route admits the transition.
    pub async fn navigate(&self, url: &str) -> Result<NavigationOutcome> {
        let mut target = url.to_string();

        for _ in 0..=MAX_REDIRECTS {
            let path = path_of(&target);
            let Some((route, params)) = self.table.resolve(path) else {
                debug!(path, fallback = self.table.fallback(), "no route, using fallback");
                target = self.table.fallback().to_string();
                continue;
            };

            match self.run_guards(route, &target).await {
                GuardDecision::Allow => {
                    self.navigator.navigate(&target);
                    return Ok(NavigationOutcome {
                        redirected: target != url,
                        url: target,
                        route: route.pattern.clone(),
                        params,
                    });
                }
                GuardDecision::Redirect(next) => {
                    debug!(from = %target, to = %next, "navigation redirected");
                    target = next;
                }
            }
        }

        Err(ClientError::InvalidInput(format!(
            "Too many redirects navigating to {}",
            url
        )))
    }

    async fn run_guards(&self, route: &Route, target: &str) -> GuardDecision {
        for guard in &route.guards {
            let decision = match guard {
                RouteGuard::Authenticated => auth_guard(&self.session, &self.routes, target).await,
                RouteGuard::AnyRole(roles) => role_guard(&self.session, &self.routes, roles),
            };
            if decision != GuardDecision::Allow {
                return decision;
            }
        }
        GuardDecision::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::domain::AuthUser;
    use crate::http::HttpClient;
    use crate::navigation::MockNavigator;
    use mockall::predicate::eq;
    use rstest::rstest;

    fn table() -> RouteTable {
        RouteTable::standard(&RouteConfig::default())
    }

    fn session() -> Arc<SessionManager> {
        let http = HttpClient::new(ApiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..ApiConfig::default()
        })
        .unwrap();
        Arc::new(SessionManager::new(http))
    }

    fn seller() -> AuthUser {
        AuthUser {
            id: 4,
            username: "pedro".to_string(),
            email: None,
            is_staff: false,
            is_superuser: false,
            groups: vec!["VENDEDOR".to_string()],
        }
    }

    #[rstest]
    #[case("/login", "/login")]
    #[case("/home", "/home")]
    #[case("/products", "/products")]
    #[case("/products/new", "/products/new")]
    #[case("/products/12", "/products/:id")]
    #[case("/products/12/", "/products/:id")]
    #[case("/sales", "/sales")]
    fn test_resolve(#[case] path: &str, #[case] pattern: &str) {
        let table = table();
        let (route, _) = table.resolve(path).unwrap();
        assert_eq!(route.pattern, pattern);
    }

    #[test]
    fn test_resolve_captures_params() {
        let table = table();
        let (_, params) = table.resolve("/products/42").unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("42"));
        assert!(table.resolve("/").is_none());
        assert!(table.resolve("/reports/2024").is_none());
    }

    #[tokio::test]
    async fn test_unknown_path_falls_back_to_home() {
        let session = session();
        session.set_user(seller());

        let mut navigator = MockNavigator::new();
        navigator
            .expect_navigate()
            .with(eq("/home"))
            .times(1)
            .return_const(());

        let router = Router::new(table(), RouteConfig::default(), session, Arc::new(navigator));
        let outcome = router.navigate("/").await.unwrap();
        assert_eq!(outcome.url, "/home");
        assert!(outcome.redirected);
    }

    #[tokio::test]
    async fn test_guarded_route_redirects_to_login() {
        let mut navigator = MockNavigator::new();
        navigator
            .expect_navigate()
            .with(eq("/login?next=/products/7"))
            .times(1)
            .return_const(());

        let router = Router::new(table(), RouteConfig::default(), session(), Arc::new(navigator));
        let outcome = router.navigate("/products/7").await.unwrap();
        assert_eq!(outcome.route, "/login");
        assert_eq!(outcome.url, "/login?next=/products/7");
    }

    #[tokio::test]
    async fn test_sales_requires_role() {
        let session = session();
        let mut outsider = seller();
        outsider.groups = vec!["ALMACEN".to_string()];
        session.set_user(outsider);

        let mut navigator = MockNavigator::new();
        navigator
            .expect_navigate()
            .with(eq("/home"))
            .times(1)
            .return_const(());

        let router = Router::new(table(), RouteConfig::default(), session, Arc::new(navigator));
        let outcome = router.navigate("/sales").await.unwrap();
        assert_eq!(outcome.route, "/home");
    }

    #[tokio::test]
    async fn test_seller_reaches_sales() {
        let session = session();
        session.set_user(seller());

        let mut navigator = MockNavigator::new();
        navigator
            .expect_navigate()
            .with(eq("/sales"))
            .times(1)
            .return_const(());

        let router = Router::new(table(), RouteConfig::default(), session, Arc::new(navigator));
        let outcome = router.navigate("/sales").await.unwrap();
        assert!(!outcome.redirected);
    }

    #[tokio::test]
    async fn test_redirect_loop_is_reported() {
        // A fallback that itself matches nothing loops forever.
        let table = RouteTable::new(vec![Route::public("/login")], "/nowhere");
        let mut navigator = MockNavigator::new();
        navigator.expect_navigate().never();

        let router = Router::new(table, RouteConfig::default(), session(), Arc::new(navigator));
        assert!(matches!(
            router.navigate("/x").await,
            Err(ClientError::InvalidInput(_))
        ));
    }
}

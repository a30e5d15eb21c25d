//! Route guards
//!
//! Guards are evaluated on every navigation; nothing is cached between
//! transitions beyond what the session itself caches.

use crate::auth::SessionManager;
use crate::config::RouteConfig;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(String),
}

/// Login route carrying `next` as the location to resume after login
pub fn login_redirect(routes: &RouteConfig, next: Option<&str>) -> String {
    match next.map(str::trim).filter(|n| !n.is_empty()) {
        Some(next) if path_of(next) != routes.login_route => format!(
            "{}?{}={}",
            routes.login_route,
            routes.resume_param,
            encode_query_value(next)
        ),
        _ => routes.login_route.clone(),
    }
}

/// Query-encode a value, leaving path separators readable
fn encode_query_value(value: &str) -> String {
    urlencoding::encode(value).replace("%2F", "/")
}

/// Path part of a location (`/products?page=2` -> `/products`)
pub(crate) fn path_of(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

/// Admit only sessions the backend recognizes.
///
/// Restores the session when none is cached; otherwise redirects to the
/// login route with the requested location as `next`.
pub async fn auth_guard(
    session: &SessionManager,
    routes: &RouteConfig,
    requested: &str,
) -> GuardDecision {
    if session.restore_session().await {
        GuardDecision::Allow
    } else {
        debug!(requested, "no session, redirecting to login");
        GuardDecision::Redirect(login_redirect(routes, Some(requested)))
    }
}

/// Admit staff and users sharing a group with `allowed`
pub fn role_guard<S: AsRef<str>>(
    session: &SessionManager,
    routes: &RouteConfig,
    allowed: &[S],
) -> GuardDecision {
    if session.has_any_role(allowed) {
        GuardDecision::Allow
    } else {
        debug!("role check failed, redirecting to default route");
        GuardDecision::Redirect(routes.default_route.clone())
    }
}

//! Session state
//!
//! [`SessionManager`] is the single owner of the authenticated identity.
//! Guards and views only read it through snapshots.

use crate::domain::{AuthUser, Credentials};
use crate::error::{ClientError, LoginStep, Result};
use crate::http::{ApiRequest, HttpClient};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

pub const ME_PATH: &str = "/auth/me/";
pub const CSRF_PATH: &str = "/auth/csrf/";
pub const LOGIN_PATH: &str = "/auth/login/";
pub const LOGOUT_PATH: &str = "/auth/logout/";
pub const REFRESH_PATH: &str = "/auth/refresh/";

/// Authentication state at a point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub authenticated: bool,
    pub user: Option<AuthUser>,
}

impl Session {
    fn signed_in(user: AuthUser) -> Self {
        Self {
            authenticated: true,
            user: Some(user),
        }
    }
}

pub struct SessionManager {
    http: HttpClient,
    state: RwLock<Session>,
}

impl SessionManager {
    /// Create a manager with an empty session
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            state: RwLock::new(Session::default()),
        }
    }

    pub fn snapshot(&self) -> Session {
        self.state.read().clone()
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.state.read().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().authenticated
    }

    /// Staff passes every check; otherwise the user's groups must intersect `roles`
    pub fn has_any_role<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        self.state
            .read()
            .user
            .as_ref()
            .map(|user| user.has_any_role(roles))
            .unwrap_or(false)
    }

    /// Forget the local identity
    pub fn clear(&self) {
        *self.state.write() = Session::default();
    }

    pub(crate) fn set_user(&self, user: AuthUser) {
        *self.state.write() = Session::signed_in(user);
    }

    /// Make sure a session exists, asking the backend when nothing is cached.
    ///
    /// Never fails: any error leaves the session cleared and yields `false`.
    pub async fn restore_session(&self) -> bool {
        {
            let state = self.state.read();
            if state.authenticated && state.user.is_some() {
                return true;
            }
        }
        self.reload_identity().await.is_some()
    }

    /// Fetch the identity again, regardless of the cached state
    pub async fn reload_identity(&self) -> Option<AuthUser> {
        match self.fetch_identity().await {
            Ok(user) => {
                debug!(username = %user.username, "session identity loaded");
                self.set_user(user.clone());
                Some(user)
            }
            Err(e) => {
                debug!(error = %e, "no active session");
                self.clear();
                None
            }
        }
    }

    async fn fetch_identity(&self) -> Result<AuthUser> {
        self.http.send(&ApiRequest::get(ME_PATH)).await?.json()
    }

    /// Run the csrf, credentials and identity steps in order.
    ///
    /// The session is only marked authenticated once all three succeed.
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthUser> {
        let result = self.login_steps(credentials).await;
        match &result {
            Ok(user) => {
                info!(username = %user.username, "logged in");
                self.set_user(user.clone());
            }
            Err(e) => {
                warn!(username = %credentials.username, error = %e, "login failed");
                self.clear();
            }
        }
        result
    }

    async fn login_steps(&self, credentials: &Credentials) -> Result<AuthUser> {
        self.http
            .send(&ApiRequest::get(CSRF_PATH))
            .await
            .map_err(|e| login_error(LoginStep::Csrf, e))?;

        let request = ApiRequest::post(LOGIN_PATH)
            .json(credentials)
            .map_err(|e| login_error(LoginStep::Credentials, e))?;
        self.http
            .send(&request)
            .await
            .map_err(|e| login_error(LoginStep::Credentials, e))?;

        self.fetch_identity()
            .await
            .map_err(|e| login_error(LoginStep::Identity, e))
    }

    /// Tell the backend to end the session, then clear it locally whatever
    /// the backend answered.
    pub async fn logout(&self) -> Result<()> {
        let result = self.end_remote_session().await;
        self.clear();
        info!("logged out");
        result
    }

    /// Best-effort logout call; the local session is left untouched
    pub(crate) async fn end_remote_session(&self) -> Result<()> {
        let request = ApiRequest::post(LOGOUT_PATH).json(&serde_json::json!({}))?;
        match self.http.send(&request).await {
            Ok(_) => Ok(()),
            Err(e) => {
                debug!(error = %e, "logout call failed");
                Err(e)
            }
        }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }
}

fn login_error(step: LoginStep, source: ClientError) -> ClientError {
    ClientError::Login {
        step,
        source: Box::new(source),
    }
}

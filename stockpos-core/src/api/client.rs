//! Intercepting API client
//!
//! Every domain call goes through [`ApiClient::execute`]. A non-exempt
//! request that fails authentication waits on the refresh orchestrator and
//! is replayed once if the session was renewed.

use crate::auth::{RefreshOrchestrator, RefreshOutcome};
use crate::error::Result;
use crate::http::{ApiRequest, ApiResponse, HttpClient};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct ApiClient {
    http: HttpClient,
    refresh: Arc<RefreshOrchestrator>,
}

impl ApiClient {
    pub fn new(http: HttpClient, refresh: Arc<RefreshOrchestrator>) -> Self {
        Self { http, refresh }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn orchestrator(&self) -> &RefreshOrchestrator {
        &self.refresh
    }

    /// Send a request, refreshing the session and replaying once on 401.
    ///
    /// After a failed refresh the caller gets its own authentication error.
    pub async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let err = match self.http.send(request).await {
            Err(e) if e.is_authentication() && !request.is_exempt() => e,
            other => return other,
        };

        debug!(path = request.path(), "authentication failed, waiting for refresh");
        match self.refresh.await_refresh().await {
            RefreshOutcome::Refreshed => {
                debug!(path = request.path(), "replaying after refresh");
                self.http.send(request).await
            }
            RefreshOutcome::Failed => Err(err),
        }
    }

    /// Execute and decode the JSON body
    pub async fn fetch<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T> {
        self.execute(request).await?.json()
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.fetch(&ApiRequest::get(path)).await
    }

    pub async fn get_json_with<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.fetch(&ApiRequest::get(path).query(query)?).await
    }

    pub async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.fetch(&ApiRequest::post(path).json(body)?).await
    }

    pub async fn put_json<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.fetch(&ApiRequest::put(path).json(body)?).await
    }

    pub async fn patch_json<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.fetch(&ApiRequest::patch(path).json(body)?).await
    }

    /// DELETE, ignoring any response body
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.execute(&ApiRequest::delete(path)).await.map(|_| ())
    }

    /// Absolute URL for links the caller opens outside the client
    pub fn resolve_absolute_url(&self, path: &str) -> String {
        self.http.resolve_absolute_url(path)
    }
}

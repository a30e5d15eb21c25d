//! Backend HTTP client
//!
//! Sends every call with the shared cookie jar, attaches the CSRF header to
//! unsafe verbs and maps non-success statuses to [`ClientError`]. It performs
//! no retries; refresh handling lives one layer up in `api::client`.

use super::csrf::CsrfAttacher;
use super::request::{ApiRequest, FilePart, RequestBody};
use crate::config::ApiConfig;
use crate::error::{ClientError, Result};
use crate::telemetry::metrics::record_http_request;
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Successful backend response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub path: String,
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|source| ClientError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }
}

/// Cookie-aware HTTP client bound to one backend
#[derive(Clone)]
pub struct HttpClient {
    config: ApiConfig,
    http_client: Client,
    cookies: Arc<Jar>,
    origin: Url,
    csrf: CsrfAttacher,
}

impl HttpClient {
    /// Create a new client with an empty cookie jar
    pub fn new(config: ApiConfig) -> Result<Self> {
        let origin = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| ClientError::Config(format!("Invalid base URL: {}", e)))?;
        let csrf = CsrfAttacher::new(&config.csrf_cookie, &config.csrf_header)?;
        let cookies = Arc::new(Jar::default());

        let mut builder = Client::builder().cookie_provider(cookies.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        Ok(Self {
            config,
            http_client,
            cookies,
            origin,
            csrf,
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Absolute URL string for an API path (downloads, invoices)
    pub fn resolve_absolute_url(&self, path: &str) -> String {
        format!(
            "{}{}{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.api_prefix,
            path
        )
    }

    fn url_for(&self, path: &str) -> Result<Url> {
        Url::parse(&self.resolve_absolute_url(path))
            .map_err(|e| ClientError::Config(format!("Invalid request path {}: {}", path, e)))
    }

    /// Read a cookie visible to the backend origin
    pub fn cookie(&self, name: &str) -> Option<String> {
        use reqwest::cookie::CookieStore;
        let header = self.cookies.cookies(&self.origin)?;
        super::csrf::cookie_value(header.to_str().ok()?, name)
    }

    /// Store a cookie for the backend origin
    pub fn set_cookie(&self, name: &str, value: &str) {
        self.cookies
            .add_cookie_str(&format!("{}={}; Path=/", name, value), &self.origin);
    }

    /// Send a request once
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = self.url_for(request.path())?;
        let method = request.method().clone();

        let mut headers = HeaderMap::new();
        for (name, value) in request.headers() {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ClientError::InvalidInput(format!("Invalid header name: {}", e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ClientError::InvalidInput(format!("Invalid header value: {}", e)))?;
            headers.insert(name, value);
        }
        self.csrf
            .apply(&method, &mut headers, self.csrf.token(&self.cookies, &url));

        let mut builder = self
            .http_client
            .request(method.clone(), url)
            .headers(headers);
        if !request.query_pairs().is_empty() {
            builder = builder.query(request.query_pairs());
        }
        builder = match request.body() {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(parts) => builder.multipart(build_form(parts)?),
        };

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                record_http_request(method.as_str(), "network_error");
                debug!(method = %method, path = request.path(), error = %e, "request failed");
                return Err(ClientError::Network(e));
            }
        };

        let status = response.status();
        let body = response.bytes().await?;
        record_http_request(method.as_str(), status.as_str());
        debug!(method = %method, path = request.path(), status = status.as_u16(), "request completed");

        if status.is_success() {
            Ok(ApiResponse {
                status,
                path: request.path().to_string(),
                body: body.to_vec(),
            })
        } else {
            Err(ClientError::from_status(status, request.path(), &body))
        }
    }
}

fn build_form(parts: &[FilePart]) -> Result<Form> {
    let mut form = Form::new();
    for part in parts {
        let mut field = Part::bytes(part.bytes.clone()).file_name(part.file_name.clone());
        if let Some(content_type) = &part.content_type {
            field = field.mime_str(content_type)?;
        }
        form = form.part(part.field.clone(), field);
    }
    Ok(form)
}

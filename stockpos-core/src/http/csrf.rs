//! CSRF token attachment for unsafe verbs

use crate::error::{ClientError, Result};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use url::Url;

/// Verbs that change server state and need the anti-forgery header
pub fn is_unsafe(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// Extract a cookie value from a `Cookie` header string, percent-decoded
pub fn cookie_value(cookie_header: &str, name: &str) -> Option<String> {
    cookie_header
        .split(';')
        .map(str::trim)
        .find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key == name).then_some(value)
        })
        .map(|raw| {
            urlencoding::decode(raw)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| raw.to_string())
        })
}

#[derive(Debug, Clone)]
pub struct CsrfAttacher {
    cookie_name: String,
    header_name: HeaderName,
}

impl CsrfAttacher {
    pub fn new(cookie_name: &str, header_name: &str) -> Result<Self> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes())
            .map_err(|e| ClientError::Config(format!("Invalid CSRF header name: {}", e)))?;
        Ok(Self {
            cookie_name: cookie_name.to_string(),
            header_name,
        })
    }

    /// Current token for `url`, read from the cookie jar
    pub fn token(&self, jar: &Jar, url: &Url) -> Option<String> {
        let header = jar.cookies(url)?;
        let header = header.to_str().ok()?;
        cookie_value(header, &self.cookie_name)
    }

    /// Add the token header for unsafe verbs unless the caller set one
    pub fn apply(&self, method: &Method, headers: &mut HeaderMap, token: Option<String>) {
        if !is_unsafe(method) || headers.contains_key(&self.header_name) {
            return;
        }
        if let Some(value) = token.and_then(|t| HeaderValue::from_str(&t).ok()) {
            headers.insert(self.header_name.clone(), value);
        }
    }
}

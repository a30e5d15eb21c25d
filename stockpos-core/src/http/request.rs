//! Replayable request description
//!
//! An [`ApiRequest`] owns everything needed to send a call again, which is
//! what lets the refresh orchestrator replay a failed request after the
//! session has been renewed.

use crate::error::{ClientError, Result};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

/// Path prefix (relative to the API prefix) of the authentication endpoints.
pub const AUTH_PATH_PREFIX: &str = "/auth/";

/// Body of a request
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Multipart(Vec<FilePart>),
}

/// A file field of a multipart form
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FilePart {
    pub fn new(field: &str, file_name: &str, bytes: Vec<u8>) -> Self {
        Self {
            field: field.to_string(),
            file_name: file_name.to_string(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }
}

/// A backend call relative to the API prefix
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: RequestBody,
    exempt: bool,
}

/// Authentication endpoints are never intercepted by the refresh protocol.
pub fn is_auth_path(path: &str) -> bool {
    path.starts_with(AUTH_PATH_PREFIX)
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        let exempt = is_auth_path(&path) || method == Method::OPTIONS;
        Self {
            method,
            path,
            query: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::Empty,
            exempt,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| ClientError::InvalidInput(format!("Unserializable body: {}", e)))?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    /// Add query parameters from a serializable map or struct.
    ///
    /// Null values are dropped, everything else is stringified.
    pub fn query<Q: Serialize + ?Sized>(mut self, params: &Q) -> Result<Self> {
        let value = serde_json::to_value(params)
            .map_err(|e| ClientError::InvalidInput(format!("Unserializable query: {}", e)))?;
        match value {
            Value::Object(map) => {
                for (key, v) in map {
                    if let Some(s) = query_value(&v) {
                        self.query.push((key, s));
                    }
                }
                Ok(self)
            }
            Value::Null => Ok(self),
            other => Err(ClientError::InvalidInput(format!(
                "Query parameters must be an object, got {}",
                other
            ))),
        }
    }

    pub fn query_pair(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Add a file field; turns the body into a multipart form
    pub fn file(mut self, part: FilePart) -> Self {
        match &mut self.body {
            RequestBody::Multipart(parts) => parts.push(part),
            body => *body = RequestBody::Multipart(vec![part]),
        }
        self
    }

    /// Mark the request as exempt from refresh interception
    pub fn exempt(mut self) -> Self {
        self.exempt = true;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn is_exempt(&self) -> bool {
        self.exempt
    }
}

fn query_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(query_value).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(","))
            }
        }
        Value::Object(_) => Some(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_auth_paths_are_exempt() {
        assert!(ApiRequest::get("/auth/me/").is_exempt());
        assert!(ApiRequest::post("/auth/refresh/").is_exempt());
        assert!(ApiRequest::post("/auth/logout/").is_exempt());
        assert!(ApiRequest::new(Method::OPTIONS, "/inventory/products/").is_exempt());
        assert!(!ApiRequest::get("/inventory/products/").is_exempt());
        assert!(ApiRequest::get("/inventory/products/").exempt().is_exempt());
    }

    #[test]
    fn test_query_skips_nulls_and_stringifies() {
        let req = ApiRequest::get("/inventory/products/")
            .query(&json!({
                "search": "arroz",
                "page": 2,
                "is_active": true,
                "ordering": null,
            }))
            .unwrap();

        let mut pairs = req.query_pairs().to_vec();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("is_active".to_string(), "true".to_string()),
                ("page".to_string(), "2".to_string()),
                ("search".to_string(), "arroz".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_rejects_scalars() {
        assert!(ApiRequest::get("/x/").query(&5).is_err());
        assert!(ApiRequest::get("/x/").query(&Option::<u8>::None).is_ok());
    }

    #[test]
    fn test_file_parts_accumulate() {
        let req = ApiRequest::post("/inventory/products/1/image/")
            .file(FilePart::new("image", "a.png", vec![1, 2]))
            .file(FilePart::new("thumb", "b.png", vec![3]).with_content_type("image/png"));

        match req.body() {
            RequestBody::Multipart(parts) => {
                assert_eq!(parts.len(), 2);
                assert_eq!(parts[1].content_type.as_deref(), Some("image/png"));
            }
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[test]
    fn test_clone_is_replayable() {
        let req = ApiRequest::post("/inventory/sales/")
            .json(&json!({"store": 1}))
            .unwrap();
        let replay = req.clone();
        assert_eq!(replay.body(), req.body());
        assert_eq!(replay.path(), "/inventory/sales/");
    }
}

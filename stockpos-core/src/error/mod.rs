//! Unified error handling for the StockPOS client

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Client-wide result type
pub type Result<T> = std::result::Result<T, ClientError>;

/// Step of the login sequence that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStep {
    Csrf,
    Credentials,
    Identity,
}

impl std::fmt::Display for LoginStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LoginStep::Csrf => "csrf",
            LoginStep::Credentials => "credentials",
            LoginStep::Identity => "identity",
        };
        f.write_str(s)
    }
}

/// Client error types
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unauthorized: {path}")]
    Authentication { path: String, body: Option<Value> },

    #[error("Rejected ({status}): {path}")]
    Validation {
        status: StatusCode,
        path: String,
        body: Option<Value>,
    },

    #[error("Server error ({status}): {path}")]
    Server {
        status: StatusCode,
        path: String,
        body: Option<Value>,
    },

    #[error("Unexpected response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Login failed at {step} step")]
    Login {
        step: LoginStep,
        #[source]
        source: Box<ClientError>,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse error classification used by the interceptor and by callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Authentication,
    Validation,
    Server,
    Other,
}

impl ClientError {
    /// Map a non-success HTTP status to the matching error variant
    pub fn from_status(status: StatusCode, path: &str, raw_body: &[u8]) -> Self {
        let body = serde_json::from_slice::<Value>(raw_body).ok();
        let path = path.to_string();
        if status == StatusCode::UNAUTHORIZED {
            ClientError::Authentication { path, body }
        } else if status.is_server_error() {
            ClientError::Server { status, path, body }
        } else {
            ClientError::Validation { status, path, body }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Network(_) => ErrorKind::Network,
            ClientError::Authentication { .. } => ErrorKind::Authentication,
            ClientError::Validation { .. } | ClientError::InvalidInput(_) => ErrorKind::Validation,
            ClientError::Server { .. } => ErrorKind::Server,
            ClientError::Login { source, .. } => source.kind(),
            ClientError::Decode { .. } | ClientError::Config(_) => ErrorKind::Other,
        }
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, ClientError::Authentication { .. })
    }

    /// HTTP status of the failed call, when there was one
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Authentication { .. } => Some(StatusCode::UNAUTHORIZED),
            ClientError::Validation { status, .. } | ClientError::Server { status, .. } => {
                Some(*status)
            }
            ClientError::Network(e) => e.status(),
            ClientError::Login { source, .. } => source.status(),
            _ => None,
        }
    }

    fn body(&self) -> Option<&Value> {
        match self {
            ClientError::Authentication { body, .. }
            | ClientError::Validation { body, .. }
            | ClientError::Server { body, .. } => body.as_ref(),
            ClientError::Login { source, .. } => source.body(),
            _ => None,
        }
    }

    /// Best-effort human readable message for the user.
    ///
    /// Looks at the backend payload (`detail`, `non_field_errors`, then the
    /// first field error) and falls back to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        if let ClientError::InvalidInput(msg) = self {
            return msg.clone();
        }
        self.body()
            .and_then(message_from_payload)
            .unwrap_or_else(|| fallback.to_string())
    }
}

// Conversion from draft validation errors
impl From<validator::ValidationErrors> for ClientError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ClientError::InvalidInput(errors.to_string())
    }
}

fn first_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(first_text),
        _ => None,
    }
}

fn message_from_payload(payload: &Value) -> Option<String> {
    match payload {
        Value::Object(map) => {
            if let Some(msg) = map.get("detail").and_then(first_text) {
                return Some(msg);
            }
            if let Some(msg) = map.get("non_field_errors").and_then(first_text) {
                return Some(msg);
            }
            map.iter().find_map(|(field, value)| {
                first_text(value).map(|msg| format!("{}: {}", field, msg))
            })
        }
        other => first_text(other),
    }
}

//! Authenticated user identity

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity returned by the backend `me` endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default)]
    pub groups: Vec<String>,
}

impl AuthUser {
    /// Staff passes every role check; otherwise any shared group admits.
    pub fn has_any_role<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        self.is_staff
            || roles
                .iter()
                .any(|role| self.groups.iter().any(|g| g == role.as_ref()))
    }
}

/// Login credentials
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

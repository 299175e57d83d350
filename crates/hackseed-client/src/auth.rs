//! Typed client for the `/auth` endpoints.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST   | `/auth/register` | Create account, returns access token |
//! | POST   | `/auth/login`    | Authenticate, returns access token |

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::transport::Transport;

/// Account creation request. Borrowed so credentials are not copied.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub role: &'a str,
}

/// Login request.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// User summary embedded in auth responses.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Response of both register and login.
///
/// `access_token` is optional at the type level so that a reply without one
/// can be reported by the caller instead of failing deserialization.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

impl std::fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthResponse")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("user", &self.user)
            .finish()
    }
}

/// Client for the `/auth` endpoints.
#[derive(Debug, Clone)]
pub struct AuthClient {
    transport: Transport,
}

impl AuthClient {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Create an account. Calls `POST /auth/register`.
    pub async fn register(&self, req: &RegisterRequest<'_>) -> Result<AuthResponse, ApiError> {
        self.transport
            .send(Method::POST, "/auth/register", Some(req), None)
            .await
    }

    /// Authenticate with email and password. Calls `POST /auth/login`.
    pub async fn login(&self, req: &LoginRequest<'_>) -> Result<AuthResponse, ApiError> {
        self.transport
            .send(Method::POST, "/auth/login", Some(req), None)
            .await
    }
}

//! Identities: what to provision, and what provisioning produced.
//!
//! Passwords and tokens live in [`Zeroizing`] buffers and never appear in
//! `Debug` output or serialized run outcomes.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Input to provisioning.
#[derive(Clone, PartialEq, Eq)]
pub struct IdentitySpec {
    pub email: String,
    pub password: Zeroizing<String>,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

impl IdentitySpec {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl std::fmt::Debug for IdentitySpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentitySpec")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("role", &self.role)
            .finish()
    }
}

/// Deterministic generator of numbered identity specs.
///
/// Identity `i` (1-based) is `{email_prefix}{i}@{email_domain}` with
/// password `{password_prefix}{i}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IdentityTemplate {
    pub email_prefix: String,
    pub email_domain: String,
    pub password_prefix: String,
    pub first_name_prefix: String,
    pub last_name_prefix: String,
    pub role: String,
}

impl Default for IdentityTemplate {
    fn default() -> Self {
        Self {
            email_prefix: "testuser".into(),
            email_domain: "loadtest.com".into(),
            password_prefix: "password123".into(),
            first_name_prefix: "TestUser".into(),
            last_name_prefix: "LastName".into(),
            role: "PARTICIPANT".into(),
        }
    }
}

impl IdentityTemplate {
    /// The spec of identity `i` (1-based).
    pub fn spec(&self, i: usize) -> IdentitySpec {
        IdentitySpec {
            email: format!("{}{i}@{}", self.email_prefix, self.email_domain),
            password: Zeroizing::new(format!("{}{i}", self.password_prefix)),
            first_name: format!("{}{i}", self.first_name_prefix),
            last_name: format!("{}{i}", self.last_name_prefix),
            role: self.role.clone(),
        }
    }

    /// Specs `1..=count`, in order.
    pub fn generate(&self, count: usize) -> Vec<IdentitySpec> {
        (1..=count).map(|i| self.spec(i)).collect()
    }
}

/// Whether provisioning created the account or reused an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProvisionState {
    New,
    Existing,
}

/// An access token shared by every clone of one [`Identity`].
///
/// A refresh through any clone is seen by all of them, so a re-login during
/// registration carries over to the submission stage.
#[derive(Clone, Default)]
pub struct TokenSlot(Arc<RwLock<Option<Zeroizing<String>>>>);

impl TokenSlot {
    pub fn new(token: Option<String>) -> Self {
        Self(Arc::new(RwLock::new(token.map(Zeroizing::new))))
    }

    pub fn get(&self) -> Option<Zeroizing<String>> {
        self.0.read().clone()
    }

    pub fn set(&self, token: String) {
        *self.0.write() = Some(Zeroizing::new(token));
    }

    pub fn clear(&self) {
        *self.0.write() = None;
    }
}

impl std::fmt::Debug for TokenSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shown = if self.0.read().is_some() { "[REDACTED]" } else { "None" };
        f.write_str(shown)
    }
}

/// A provisioned, authenticated account.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub email: String,
    #[serde(skip)]
    pub password: Zeroizing<String>,
    pub display_name: String,
    pub role: String,
    /// Backend user id, when the auth reply included one.
    pub user_id: Option<String>,
    pub state: ProvisionState,
    #[serde(skip)]
    pub token: TokenSlot,
}

impl Identity {
    pub fn new(spec: &IdentitySpec, state: ProvisionState, user_id: Option<String>, token: String) -> Self {
        Self {
            email: spec.email.clone(),
            password: spec.password.clone(),
            display_name: spec.display_name(),
            role: spec.role.clone(),
            user_id,
            state,
            token: TokenSlot::new(Some(token)),
        }
    }

    /// Current access token.
    pub fn token(&self) -> Option<Zeroizing<String>> {
        self.token.get()
    }

    /// Part of the email before `@`.
    pub fn local_part(&self) -> &str {
        self.email.split('@').next().unwrap_or(&self.email)
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("display_name", &self.display_name)
            .field("role", &self.role)
            .field("user_id", &self.user_id)
            .field("state", &self.state)
            .field("token", &self.token)
            .finish()
    }
}

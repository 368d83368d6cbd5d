//! Email/password authentication, delegated to an external provider.

mod validation;

pub use validation::{validate_credentials, validate_email};

use crate::error::Result;
use crate::identity::Identity;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// A signed-in user as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub user_id: String,
    pub email: String,
    pub id_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl AuthSession {
    pub fn identity(&self) -> Identity {
        Identity::User(self.user_id.clone())
    }
}

/// External auth provider. No session or token logic lives on our side.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(&self, credentials: &Credentials) -> Result<AuthSession>;

    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession>;
}

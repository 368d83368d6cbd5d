//! Email/password auth against the Firebase Identity Toolkit REST API.

use async_trait::async_trait;
use headshot_core::auth::{AuthProvider, AuthSession, Credentials, validate_credentials};
use headshot_core::{HeadshotError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

#[derive(Clone)]
pub struct FirebaseAuthProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    local_id: String,
    email: String,
    id_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl FirebaseAuthProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn call(&self, action: &str, credentials: &Credentials) -> Result<AuthSession> {
        let credentials = validate_credentials(credentials)?;
        let url = format!("{}/accounts:{}", self.base_url, action);

        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&PasswordRequest {
                email: &credentials.email,
                password: &credentials.password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|err| HeadshotError::auth(format!("Auth request failed: {err}")))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_auth_error(&body));
        }

        let parsed: PasswordResponse = response
            .json()
            .await
            .map_err(|err| HeadshotError::auth(format!("Failed to parse auth response: {err}")))?;

        tracing::info!("[Auth] {} succeeded for user {}", action, parsed.local_id);
        Ok(AuthSession {
            user_id: parsed.local_id,
            email: parsed.email,
            id_token: parsed.id_token,
            refresh_token: parsed.refresh_token,
        })
    }
}

#[async_trait]
impl AuthProvider for FirebaseAuthProvider {
    async fn sign_up(&self, credentials: &Credentials) -> Result<AuthSession> {
        self.call("signUp", credentials).await
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession> {
        self.call("signInWithPassword", credentials).await
    }
}

/// Turns a provider error code into a message fit for the sign-in form.
fn map_auth_error(body: &str) -> HeadshotError {
    let code = serde_json::from_str::<ErrorWrapper>(body)
        .ok()
        .and_then(|wrapper| wrapper.error.message)
        .unwrap_or_default();
    // Codes may carry a detail suffix: "WEAK_PASSWORD : Password should be ..."
    let code = code.split(" : ").next().unwrap_or_default().trim();

    let message = match code {
        "EMAIL_EXISTS" => "An account with this email already exists",
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            "Invalid email or password"
        }
        "USER_DISABLED" => "This account has been disabled",
        "WEAK_PASSWORD" => "Password must be at least 6 characters",
        "INVALID_EMAIL" => "Please enter a valid email address",
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "Too many attempts. Please try again later",
        _ => "Authentication failed. Please try again",
    };
    HeadshotError::auth(message)
}

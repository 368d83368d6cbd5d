//! Sign-up / sign-in use cases.

use headshot_core::auth::{AuthProvider, AuthSession, Credentials, validate_credentials};
use headshot_core::{Identity, Result};
use std::sync::Arc;

pub struct AuthService {
    provider: Arc<dyn AuthProvider>,
}

impl AuthService {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self { provider }
    }

    /// Validates locally, then creates the account with the provider.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession> {
        let credentials = validate_credentials(&Credentials::new(email, password))?;
        self.provider.sign_up(&credentials).await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let credentials = validate_credentials(&Credentials::new(email, password))?;
        let session = self.provider.sign_in(&credentials).await?;
        tracing::debug!("Signed in as {}", session.identity());
        Ok(session)
    }

    /// Identity under which usage is tracked for an optional session.
    pub fn identity_for(session: Option<&AuthSession>) -> Identity {
        session.map(AuthSession::identity).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use headshot_core::HeadshotError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingProvider {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AuthProvider for RecordingProvider {
        async fn sign_up(&self, credentials: &Credentials) -> Result<AuthSession> {
            self.seen.lock().unwrap().push(credentials.email.clone());
            Ok(AuthSession {
                user_id: "uid-1".into(),
                email: credentials.email.clone(),
                id_token: "token".into(),
                refresh_token: None,
            })
        }

        async fn sign_in(&self, _: &Credentials) -> Result<AuthSession> {
            Err(HeadshotError::auth("Invalid email or password"))
        }
    }

    #[tokio::test]
    async fn test_sign_up_normalizes_email() {
        let provider = Arc::new(RecordingProvider::default());
        let auth = AuthService::new(provider.clone());

        let session = auth.sign_up(" New@Example.com", "hunter22").await.unwrap();
        assert_eq!(session.identity(), Identity::User("uid-1".into()));
        assert_eq!(*provider.seen.lock().unwrap(), vec!["new@example.com".to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_provider() {
        let provider = Arc::new(RecordingProvider::default());
        let auth = AuthService::new(provider.clone());

        assert!(auth.sign_up("a@b.co", "12345").await.unwrap_err().is_validation());
        assert!(auth.sign_up("nope", "123456").await.unwrap_err().is_validation());
        assert!(provider.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_provider_error_passes_through() {
        let auth = AuthService::new(Arc::new(RecordingProvider::default()));
        let err = auth.sign_in("a@b.co", "123456").await.unwrap_err();
        assert_eq!(err.user_message(), "Authentication error: Invalid email or password");
    }

    #[test]
    fn test_identity_for() {
        assert_eq!(AuthService::identity_for(None), Identity::Anonymous);
    }
}

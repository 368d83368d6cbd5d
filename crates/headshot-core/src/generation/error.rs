use std::time::Duration;
use thiserror::Error;

use super::retry::RateLimitSignal;

const BUSY_MESSAGE: &str =
    "The image service is temporarily busy. Please wait a minute and try again.";
const GENERIC_MESSAGE: &str = "We couldn't generate your image. Please try again.";

/// Failures reported by the image-generation API client.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    /// HTTP 429 or a quota-exhaustion status.
    #[error("Rate limited by image API: {message}")]
    RateLimited {
        status: Option<u16>,
        message: String,
        retry_after: Option<Duration>,
    },

    /// The provider's safety filter refused the request or the output.
    #[error("{reason}")]
    SafetyBlocked { reason: String },

    #[error(
        "No API key configured for the image service. Add it to secret.json or set GEMINI_API_KEY."
    )]
    MissingApiKey,

    /// Any other non-success response or transport failure.
    #[error("Image API request failed: {message}")]
    Request {
        status: Option<u16>,
        message: String,
    },

    /// A success response that carried no image.
    #[error("Image API returned no image: {0}")]
    EmptyResponse(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),
}

impl GenerationError {
    pub fn request(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Request {
            status,
            message: message.into(),
        }
    }

    /// Message shown to the end user once retries are exhausted.
    ///
    /// Rate limits read as "busy, try later", safety rejections are passed
    /// through verbatim, configuration problems say how to fix them.
    pub fn user_message(&self) -> String {
        match self {
            Self::RateLimited { .. } => BUSY_MESSAGE.to_string(),
            Self::SafetyBlocked { reason } => reason.clone(),
            Self::MissingApiKey => self.to_string(),
            Self::Request { .. } if self.is_rate_limited() => BUSY_MESSAGE.to_string(),
            _ => GENERIC_MESSAGE.to_string(),
        }
    }
}

impl RateLimitSignal for GenerationError {
    fn is_rate_limited(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Request { status, message } => {
                *status == Some(429) || message_signals_rate_limit(message)
            }
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Loose match on provider error text, which is all some SDK paths expose.
pub fn message_signals_rate_limit(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("429")
        || lower.contains("resource_exhausted")
        || lower.contains("quota")
        || lower.contains("rate limit")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_detection() {
        assert!(
            GenerationError::RateLimited {
                status: Some(429),
                message: "slow down".into(),
                retry_after: None,
            }
            .is_rate_limited()
        );
        assert!(GenerationError::request(Some(429), "x").is_rate_limited());
        assert!(GenerationError::request(None, "RESOURCE_EXHAUSTED: try later").is_rate_limited());
        assert!(GenerationError::request(Some(400), "Quota exceeded for metric").is_rate_limited());
        assert!(!GenerationError::request(Some(500), "internal").is_rate_limited());
        assert!(
            !GenerationError::SafetyBlocked {
                reason: "blocked".into()
            }
            .is_rate_limited()
        );
    }

    #[test]
    fn test_user_messages() {
        let busy = GenerationError::request(Some(429), "x").user_message();
        assert!(busy.contains("temporarily busy"));

        let safety = GenerationError::SafetyBlocked {
            reason: "The image was blocked by the safety filter (SAFETY).".into(),
        };
        assert_eq!(
            safety.user_message(),
            "The image was blocked by the safety filter (SAFETY)."
        );

        assert!(GenerationError::MissingApiKey.user_message().contains("GEMINI_API_KEY"));
        assert_eq!(
            GenerationError::EmptyResponse("no parts".into()).user_message(),
            GENERIC_MESSAGE
        );
    }
}

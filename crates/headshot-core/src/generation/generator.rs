use super::error::GenerationError;
use crate::image::ImageRef;
use async_trait::async_trait;

/// One call to the image model: a source image plus a natural-language
/// instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub image: ImageRef,
    pub instruction: String,
}

/// What the model sent back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub image: ImageRef,
    /// Optional text the model returned alongside the image.
    pub note: Option<String>,
}

/// Abstraction over the external image-generation API.
///
/// Implementations report rate limits as rate-limited errors so callers can
/// wrap them with [`with_retry`](super::with_retry).
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest)
    -> Result<GeneratedImage, GenerationError>;

    /// Model identifier, for logs.
    fn model(&self) -> &str;
}

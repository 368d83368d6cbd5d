//! Image generation domain.
//!
//! - `generator`: the `ImageGenerator` trait and its request/response types
//! - `error`: `GenerationError` and the user-facing message mapping
//! - `retry`: `with_retry`, backoff for rate-limited calls
//! - `style`: headshot style presets and prompt builders

mod error;
mod generator;
mod retry;
mod style;

pub use error::{GenerationError, message_signals_rate_limit};
pub use generator::{GeneratedImage, GenerationRequest, ImageGenerator};
pub use retry::{RateLimitSignal, RetryPolicy, with_retry};
pub use style::{HeadshotStyle, edit_prompt};

//! Clients for the external image-generation API.

pub mod gemini_image_agent;

pub use gemini_image_agent::GeminiImageGenerator;

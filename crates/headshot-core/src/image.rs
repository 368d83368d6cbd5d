//! Encoded image values and upload validation.

use crate::error::{HeadshotError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// An image carried around as a MIME type plus base64 payload.
///
/// Opaque to the history and chat log; only the generator and the output
/// writers look inside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    pub mime_type: String,
    pub data: String,
}

impl ImageRef {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(mime_type, BASE64_STANDARD.encode(bytes))
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        BASE64_STANDARD
            .decode(&self.data)
            .map_err(|e| HeadshotError::validation(format!("Image data is not valid base64: {e}")))
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// File extension matching the MIME type.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            _ => "png",
        }
    }
}

/// Accepted selfie formats and size.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_bytes: usize,
    pub allowed_mime_types: Vec<&'static str>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: MAX_UPLOAD_BYTES,
            allowed_mime_types: vec!["image/jpeg", "image/png", "image/webp"],
        }
    }
}

impl UploadPolicy {
    /// Checks an uploaded file and wraps it as an [`ImageRef`].
    ///
    /// The MIME type guessed from the file name must agree with the file's
    /// magic bytes.
    pub fn validate(&self, file_name: &str, bytes: &[u8]) -> Result<ImageRef> {
        if bytes.is_empty() {
            return Err(HeadshotError::validation("The selected file is empty"));
        }
        if bytes.len() > self.max_bytes {
            return Err(HeadshotError::validation(format!(
                "Image is too large ({:.1} MB); the limit is {} MB",
                bytes.len() as f64 / (1024.0 * 1024.0),
                self.max_bytes / (1024 * 1024)
            )));
        }

        let guessed = mime_guess::from_path(Path::new(file_name))
            .first()
            .map(|mime| mime.essence_str().to_string())
            .ok_or_else(|| {
                HeadshotError::validation(format!("Unsupported file type: {file_name}"))
            })?;

        if !self.allowed_mime_types.contains(&guessed.as_str()) {
            return Err(HeadshotError::validation(format!(
                "Unsupported file type {guessed}; please upload a JPEG, PNG or WebP image"
            )));
        }

        match sniff_mime(bytes) {
            Some(actual) if actual == guessed => Ok(ImageRef::from_bytes(guessed, bytes)),
            _ => Err(HeadshotError::validation(format!(
                "{file_name} does not look like a valid {guessed} file"
            ))),
        }
    }
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some("image/png")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

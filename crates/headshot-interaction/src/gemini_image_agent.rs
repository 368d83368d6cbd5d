//! GeminiImageGenerator - Direct REST API implementation for Gemini image models.
//!
//! Sends the current image inline with a text instruction and reads the
//! first inline image out of the response. The API key comes from
//! secret.json or `GEMINI_API_KEY`.

use async_trait::async_trait;
use headshot_core::config::{DEFAULT_IMAGE_MODEL, SecretConfig};
use headshot_core::generation::{
    GeneratedImage, GenerationError, GenerationRequest, ImageGenerator,
};
use headshot_core::image::ImageRef;
use reqwest::{Client, StatusCode, header::HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const SAFETY_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "IMAGE_SAFETY",
    "PROHIBITED_CONTENT",
    "BLOCKLIST",
    "SPII",
];

/// Image generator that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiImageGenerator {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiImageGenerator {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Builds a generator from loaded secrets.
    ///
    /// `model` overrides the model named in secret.json, which in turn
    /// overrides the built-in default.
    pub fn from_secrets(
        secrets: &SecretConfig,
        model: Option<&str>,
    ) -> Result<Self, GenerationError> {
        let gemini = secrets
            .gemini
            .as_ref()
            .filter(|g| !g.api_key.trim().is_empty())
            .ok_or(GenerationError::MissingApiKey)?;

        let model = model
            .map(str::to_string)
            .or_else(|| gemini.model_name.clone())
            .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string());

        Ok(Self::new(gemini.api_key.clone(), model))
    }

    /// Overrides the API endpoint, e.g. for a proxy.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn build_request(request: &GenerationRequest) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineDataPayload {
                            mime_type: request.image.mime_type.clone(),
                            data: request.image.data.clone(),
                        },
                    },
                    Part::Text {
                        text: request.instruction.clone(),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
            },
        }
    }

    async fn send_request(
        &self,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenerationError> {
        let url = format!("{}/{}:generateContent", self.base_url, self.model);

        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|err| {
                // reqwest errors may include the URL, which carries the key.
                GenerationError::request(None, format!("Gemini API request failed: {}", err.without_url()))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after(response.headers().get("retry-after"));
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, &body_text, retry_after));
        }

        response.json().await.map_err(|err| {
            GenerationError::request(None, format!("Failed to parse Gemini response: {}", err.without_url()))
        })
    }
}

#[async_trait]
impl ImageGenerator for GeminiImageGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedImage, GenerationError> {
        if request.instruction.trim().is_empty() {
            return Err(GenerationError::InvalidImage(
                "Generation needs an instruction".to_string(),
            ));
        }

        tracing::debug!(
            "Calling {} with a {} image ({} base64 bytes)",
            self.model,
            request.image.mime_type,
            request.image.data.len()
        );

        let body = Self::build_request(request);
        let response = self.send_request(&body).await?;
        extract_image_response(response)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
    block_reason_message: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ContentResponse>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartResponse {
    text: Option<String>,
    inline_data: Option<InlineDataPayload>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    code: Option<i32>,
    message: Option<String>,
    status: Option<String>,
}

fn safety_message(detail: &str) -> String {
    format!(
        "Your request was blocked by the image service's safety filter ({detail}). \
         Try a different photo or instruction."
    )
}

fn extract_image_response(
    response: GenerateContentResponse,
) -> Result<GeneratedImage, GenerationError> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.as_ref())
    {
        let detail = response
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason_message.clone())
            .unwrap_or_else(|| reason.clone());
        return Err(GenerationError::SafetyBlocked {
            reason: safety_message(&detail),
        });
    }

    let candidate = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .ok_or_else(|| GenerationError::EmptyResponse("no candidates".to_string()))?;

    let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
    let note = parts
        .iter()
        .filter_map(|part| part.text.as_deref())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    let image = parts.into_iter().find_map(|part| part.inline_data);

    match image {
        Some(inline) => Ok(GeneratedImage {
            image: ImageRef::new(inline.mime_type, inline.data),
            note: (!note.is_empty()).then_some(note),
        }),
        None => match candidate.finish_reason.as_deref() {
            Some(reason) if SAFETY_FINISH_REASONS.contains(&reason) => {
                Err(GenerationError::SafetyBlocked {
                    reason: safety_message(reason),
                })
            }
            _ if !note.is_empty() => Err(GenerationError::EmptyResponse(note)),
            Some(reason) => Err(GenerationError::EmptyResponse(format!(
                "finish reason {reason}"
            ))),
            None => Err(GenerationError::EmptyResponse("no image part".to_string())),
        },
    }
}

fn map_http_error(
    status: StatusCode,
    body: &str,
    retry_after: Option<Duration>,
) -> GenerationError {
    let (status_text, message) = serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.to_string());
            (status_text, msg)
        })
        .unwrap_or_else(|_| (String::new(), body.to_string()));

    let message = if status_text.is_empty() {
        message
    } else {
        format!("{status_text}: {message}")
    };

    if status == StatusCode::TOO_MANY_REQUESTS || status_text == "RESOURCE_EXHAUSTED" {
        return GenerationError::RateLimited {
            status: Some(status.as_u16()),
            message,
            retry_after,
        };
    }

    GenerationError::request(Some(status.as_u16()), message)
}

fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

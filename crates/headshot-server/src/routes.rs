use axum::{Json, extract::State};
use headshot_core::HeadshotError;
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;

const SETUP_MESSAGE: &str = "Gemini API key is not configured. Add it to ~/.config/headshot/secret.json \
     under \"gemini.api_key\" or set the GEMINI_API_KEY environment variable, then restart the server.";

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub api_key: String,
    pub model: String,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        version: state.version,
    })
}

/// `GET /api/config` -- generation key and model for the browser client.
pub async fn client_config(State(state): State<AppState>) -> Result<Json<ClientConfig>, AppError> {
    let (api_key, model) = state.ctx.client_api_config().ok_or_else(|| {
        tracing::warn!("Config requested but no generation key is set");
        AppError::from(HeadshotError::config(SETUP_MESSAGE))
    })?;
    Ok(Json(ClientConfig { api_key, model }))
}

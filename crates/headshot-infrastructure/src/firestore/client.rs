//! Minimal Firestore REST client.
//!
//! Only the document operations the blog needs: list a collection, get,
//! create-if-absent, upsert and delete by id.

use super::value::Fields;
use headshot_core::{HeadshotError, Result};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const PAGE_SIZE: u32 = 300;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name, `projects/.../documents/{collection}/{id}`.
    pub name: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    pub fn fields(&self) -> Fields {
        Fields::from_map(self.fields.clone())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Serialize)]
struct DocumentBody {
    fields: Map<String, Value>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

#[derive(Clone)]
pub struct FirestoreClient {
    client: Client,
    base_url: String,
    project_id: String,
    api_key: Option<String>,
}

impl FirestoreClient {
    pub fn new(project_id: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            project_id: project_id.into(),
            api_key,
        }
    }

    /// Points the client at another endpoint, e.g. the local emulator.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}",
            self.base_url, self.project_id, collection
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.query(&[("key", key.as_str())]),
            None => request,
        }
    }

    pub async fn list_documents(&self, collection: &str) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(self.collection_url(collection))
                .query(&[("pageSize", PAGE_SIZE.to_string())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = send(self.authorize(request)).await?;
            let page: ListDocumentsResponse = parse(response).await?;
            documents.extend(page.documents);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!("Listed {} document(s) from {}", documents.len(), collection);
        Ok(documents)
    }

    pub async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let url = format!("{}/{}", self.collection_url(collection), id);
        let response = send(self.authorize(self.client.get(url))).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        parse(response).await.map(Some)
    }

    /// Creates the document unless one with `id` exists. Returns whether it
    /// was created.
    pub async fn create_document(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<bool> {
        let request = self
            .client
            .post(self.collection_url(collection))
            .query(&[("documentId", id)])
            .json(&DocumentBody {
                fields: fields.into_map(),
            });
        let response = send(self.authorize(request)).await?;
        if response.status() == StatusCode::CONFLICT {
            return Ok(false);
        }
        let _: Document = parse(response).await?;
        Ok(true)
    }

    /// Creates or replaces the document with `id`.
    pub async fn upsert_document(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        let url = format!("{}/{}", self.collection_url(collection), id);
        let request = self.client.patch(url).json(&DocumentBody {
            fields: fields.into_map(),
        });
        let response = send(self.authorize(request)).await?;
        let _: Document = parse(response).await?;
        Ok(())
    }

    pub async fn delete_document(&self, collection: &str, id: &str) -> Result<()> {
        let url = format!("{}/{}", self.collection_url(collection), id);
        let response = send(self.authorize(self.client.delete(url))).await?;
        if response.status() == StatusCode::NOT_FOUND || response.status().is_success() {
            return Ok(());
        }
        Err(read_error(response).await)
    }
}

async fn send(request: RequestBuilder) -> Result<Response> {
    request
        .send()
        .await
        .map_err(|err| HeadshotError::data_access(format!("Document store request failed: {err}")))
}

async fn parse<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    if !response.status().is_success() {
        return Err(read_error(response).await);
    }
    response.json().await.map_err(|err| {
        HeadshotError::data_access(format!("Failed to parse document store response: {err}"))
    })
}

async fn read_error(response: Response) -> HeadshotError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error body".to_string());
    map_http_error(status, &body)
}

fn map_http_error(status: StatusCode, body: &str) -> HeadshotError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .ok()
        .map(|wrapper| {
            let msg = wrapper.error.message.unwrap_or_default();
            match wrapper.error.status {
                Some(status_text) if !status_text.is_empty() => format!("{status_text}: {msg}"),
                _ => msg,
            }
        })
        .unwrap_or_else(|| body.to_string());

    HeadshotError::data_access(format!(
        "Document store returned {}: {}",
        status.as_u16(),
        message
    ))
}

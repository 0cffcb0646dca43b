use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{debug, warn};

use super::FirestoreConfig;

/// Maximum writes accepted by a single `batchWrite` call.
const MAX_BATCH_WRITES: usize = 500;
const LIST_PAGE_SIZE: u32 = 300;

#[derive(Debug, Error)]
pub enum FirestoreError {
    #[error("request timed out")]
    Timeout,

    #[error("document not found")]
    NotFound,

    #[error("document already exists")]
    AlreadyExists,

    #[error("firestore returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("transport: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FirestoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FirestoreError::Timeout
        } else if e.is_decode() {
            FirestoreError::Decode(e.to_string())
        } else {
            FirestoreError::Transport(e.to_string())
        }
    }
}

/// A stored document: full resource name plus typed fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

#[derive(Deserialize)]
struct RunQueryItem {
    document: Option<Document>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsPage {
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct BatchWriteResponse {
    #[serde(default)]
    status: Vec<RpcStatus>,
}

#[derive(Deserialize)]
struct RpcStatus {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

/// Thin client for the subset of the Firestore REST API the stores need.
pub struct FirestoreClient {
    http: reqwest::Client,
    documents_url: String,
    access_token: Option<SecretString>,
}

impl FirestoreClient {
    /// # Errors
    /// Returns [`FirestoreError::Transport`] if the HTTP client cannot be built.
    pub fn new(cfg: &FirestoreConfig) -> Result<Self, FirestoreError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| FirestoreError::Transport(format!("failed to create HTTP client: {e}")))?;

        let documents_url = format!(
            "{}/v1/projects/{}/databases/{}/documents",
            cfg.base_url.trim_end_matches('/'),
            cfg.project_id,
            cfg.database,
        );

        Ok(Self {
            http,
            documents_url,
            access_token: cfg.access_token.clone(),
        })
    }

    /// Create a document in `collection`. A `None` id lets the server pick one.
    ///
    /// # Errors
    /// [`FirestoreError::AlreadyExists`] if `document_id` is taken.
    pub async fn create_document(
        &self,
        collection: &str,
        document_id: Option<&str>,
        fields: Map<String, Value>,
    ) -> Result<Document, FirestoreError> {
        let mut url = format!("{}/{collection}", self.documents_url);
        if let Some(id) = document_id {
            url = format!("{url}?documentId={}", urlencoding::encode(id));
        }

        let body = json!({ "fields": fields });
        let response = self.send(self.http.post(url).json(&body)).await?;
        read_json(response).await
    }

    /// # Errors
    /// [`FirestoreError::NotFound`] if the document does not exist.
    pub async fn get_document(
        &self,
        collection: &str,
        document_id: &str,
    ) -> Result<Document, FirestoreError> {
        let url = format!(
            "{}/{collection}/{}",
            self.documents_url,
            urlencoding::encode(document_id)
        );
        let response = self.send(self.http.get(url)).await?;
        read_json(response).await
    }

    /// Every document in `collection`, newest `order_field` first.
    ///
    /// # Errors
    /// Transport, status and decode failures.
    pub async fn query_descending(
        &self,
        collection: &str,
        order_field: &str,
    ) -> Result<Vec<Document>, FirestoreError> {
        let url = format!("{}:runQuery", self.documents_url);
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection }],
                "orderBy": [{
                    "field": { "fieldPath": order_field },
                    "direction": "DESCENDING"
                }]
            }
        });

        let response = self.send(self.http.post(url).json(&body)).await?;
        let items: Vec<RunQueryItem> = read_json(response).await?;
        // Items without a document carry only read-time metadata
        Ok(items.into_iter().filter_map(|item| item.document).collect())
    }

    /// Resource names of every document in `collection`, following pagination.
    ///
    /// # Errors
    /// Transport, status and decode failures.
    pub async fn list_document_names(&self, collection: &str) -> Result<Vec<String>, FirestoreError> {
        let url = format!("{}/{collection}", self.documents_url);
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(&url)
                .query(&[("pageSize", LIST_PAGE_SIZE.to_string())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let page: ListDocumentsPage = read_json(self.send(request).await?).await?;
            names.extend(page.documents.into_iter().map(|doc| doc.name));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(names)
    }

    /// Delete documents by resource name in batches.
    ///
    /// # Errors
    /// Fails on the first batch with a rejected write. Earlier batches stay applied.
    pub async fn delete_documents(&self, names: &[String]) -> Result<(), FirestoreError> {
        let url = format!("{}:batchWrite", self.documents_url);

        for chunk in names.chunks(MAX_BATCH_WRITES) {
            let writes: Vec<Value> = chunk.iter().map(|name| json!({ "delete": name })).collect();
            let response = self
                .send(self.http.post(&url).json(&json!({ "writes": writes })))
                .await?;
            let result: BatchWriteResponse = read_json(response).await?;

            if let Some(failed) = result.status.iter().find(|s| s.code != 0) {
                warn!(code = failed.code, message = %failed.message, "batch delete rejected");
                return Err(FirestoreError::Decode(format!(
                    "batch delete rejected with code {}: {}",
                    failed.code, failed.message
                )));
            }
            debug!(count = chunk.len(), "deleted documents");
        }

        Ok(())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, FirestoreError> {
        let request = match &self.access_token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::NOT_FOUND => Err(FirestoreError::NotFound),
            StatusCode::CONFLICT => Err(FirestoreError::AlreadyExists),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(FirestoreError::Status { status, body })
            }
        }
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, FirestoreError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| FirestoreError::Decode(e.to_string()))
}

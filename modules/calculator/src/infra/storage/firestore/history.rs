use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::client::{FirestoreClient, FirestoreError};
use super::value::{self, TIMESTAMP};
use super::HISTORY_COLLECTION;
use crate::domain::error::HistoryError;
use crate::domain::model::OperationRecord;
use crate::domain::repo::HistoryStore;

/// History in the `calculations` collection, listed newest first.
pub struct FirestoreHistoryStore {
    client: Arc<FirestoreClient>,
}

impl FirestoreHistoryStore {
    #[must_use]
    pub fn new(client: Arc<FirestoreClient>) -> Self {
        Self { client }
    }
}

impl From<FirestoreError> for HistoryError {
    fn from(e: FirestoreError) -> Self {
        match e {
            FirestoreError::Timeout => HistoryError::Timeout,
            FirestoreError::Decode(msg) => HistoryError::InvalidDocument(msg),
            other => HistoryError::Transport(other.to_string()),
        }
    }
}

#[async_trait]
impl HistoryStore for FirestoreHistoryStore {
    #[instrument(skip_all)]
    async fn append(&self, record: &OperationRecord) -> Result<(), HistoryError> {
        let fields = value::encode_record(record)
            .map_err(|e| HistoryError::InvalidDocument(e.to_string()))?;
        let doc = self
            .client
            .create_document(HISTORY_COLLECTION, None, fields)
            .await?;
        debug!(name = %doc.name, "history record stored");
        Ok(())
    }

    #[instrument(skip_all)]
    async fn list(&self) -> Result<Vec<OperationRecord>, HistoryError> {
        let docs = self
            .client
            .query_descending(HISTORY_COLLECTION, TIMESTAMP)
            .await?;
        if docs.is_empty() {
            return Err(HistoryError::Empty);
        }

        docs.iter()
            .map(|doc| {
                value::decode_record(&doc.fields)
                    .map_err(|e| HistoryError::InvalidDocument(format!("{}: {e}", doc.name)))
            })
            .collect()
    }

    #[instrument(skip_all)]
    async fn clear(&self) -> Result<(), HistoryError> {
        let names = self.client.list_document_names(HISTORY_COLLECTION).await?;
        self.client.delete_documents(&names).await?;
        debug!(count = names.len(), "history cleared");
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::domain::model::Operation;
    use crate::infra::storage::firestore::FirestoreConfig;
    use httpmock::prelude::*;
    use serde_json::json;
    use time::OffsetDateTime;

    const DOCS: &str = "/v1/projects/test/databases/(default)/documents";

    fn store(server: &MockServer) -> FirestoreHistoryStore {
        let mut cfg = FirestoreConfig::new("test");
        cfg.base_url = server.base_url();
        FirestoreHistoryStore::new(Arc::new(FirestoreClient::new(&cfg).unwrap()))
    }

    fn stored(name: &str, op: &str, a: f64, b: f64, result: f64, ts: &str) -> serde_json::Value {
        json!({
            "document": {
                "name": format!("projects/test/databases/(default)/documents/calculations/{name}"),
                "fields": {
                    "operand1": { "doubleValue": a },
                    "operand2": { "doubleValue": b },
                    "operation": { "stringValue": op },
                    "result": { "doubleValue": result },
                    "timestamp": { "timestampValue": ts }
                }
            },
            "readTime": "2024-05-01T12:00:00Z"
        })
    }

    #[tokio::test]
    async fn append_posts_typed_document() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(format!("{DOCS}/calculations"))
                    .body_includes(r#""operation":{"stringValue":"Add"}"#)
                    .body_includes(r#""timestampValue":"2023-11-14T22:13:20Z""#);
                then.status(200).json_body(json!({
                    "name": "projects/test/databases/(default)/documents/calculations/abc"
                }));
            })
            .await;

        let ts = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let record = OperationRecord::new(Operation::Add, 10.0, 5.0, 15.0, ts);
        store(&server).append(&record).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn list_queries_newest_first() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(format!("{DOCS}:runQuery"))
                    .body_includes(r#""direction":"DESCENDING""#)
                    .body_includes(r#""collectionId":"calculations""#);
                then.status(200).json_body(json!([
                    stored("b", "Multiply", 6.0, 3.0, 18.0, "2024-05-01T12:00:02Z"),
                    stored("a", "Add", 10.0, 5.0, 15.0, "2024-05-01T12:00:01Z"),
                ]));
            })
            .await;

        let records = store(&server).list().await.unwrap();
        mock.assert_async().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].operation, Operation::Multiply);
        assert_eq!(records[1].result, 15.0);
    }

    #[tokio::test]
    async fn list_of_empty_collection_is_empty_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(format!("{DOCS}:runQuery"));
                // no matches still yields one read-time-only item
                then.status(200)
                    .json_body(json!([{ "readTime": "2024-05-01T12:00:00Z" }]));
            })
            .await;

        assert_eq!(store(&server).list().await, Err(HistoryError::Empty));
    }

    #[tokio::test]
    async fn malformed_document_is_reported() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(format!("{DOCS}:runQuery"));
                then.status(200).json_body(json!([{
                    "document": { "name": "broken", "fields": {} }
                }]));
            })
            .await;

        assert!(matches!(
            store(&server).list().await,
            Err(HistoryError::InvalidDocument(msg)) if msg.starts_with("broken")
        ));
    }

    #[tokio::test]
    async fn server_errors_become_transport_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(format!("{DOCS}:runQuery"));
                then.status(500).body("boom");
            })
            .await;

        assert!(matches!(
            store(&server).list().await,
            Err(HistoryError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn clear_deletes_every_listed_document() {
        let server = MockServer::start_async().await;
        let list = server
            .mock_async(|when, then| {
                when.method(GET).path(format!("{DOCS}/calculations"));
                then.status(200).json_body(json!({
                    "documents": [{ "name": "doc/a" }, { "name": "doc/b" }]
                }));
            })
            .await;
        let delete = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(format!("{DOCS}:batchWrite"))
                    .json_body(json!({ "writes": [{ "delete": "doc/a" }, { "delete": "doc/b" }] }));
                then.status(200)
                    .json_body(json!({ "writeResults": [{}, {}], "status": [{}, {}] }));
            })
            .await;

        store(&server).clear().await.unwrap();
        list.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn clearing_empty_collection_sends_no_writes() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("{DOCS}/calculations"));
                then.status(200).json_body(json!({}));
            })
            .await;
        let delete = server
            .mock_async(|when, then| {
                when.method(POST).path(format!("{DOCS}:batchWrite"));
                then.status(200).json_body(json!({}));
            })
            .await;

        store(&server).clear().await.unwrap();
        delete.assert_calls_async(0).await;
    }
}

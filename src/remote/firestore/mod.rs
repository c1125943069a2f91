pub mod dto;

use std::collections::BTreeMap;
use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, info};

use super::{Collection, Document, MirrorError, RemoteMirror, WriteBatch};
use crate::error::AppError;

const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const PAGE_SIZE: &str = "300";
/// Firestore refuses a `documents:commit` with more writes than this.
pub const MAX_WRITES_PER_COMMIT: usize = 500;

#[derive(Clone, Debug)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub base_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl FirestoreConfig {
    /// Reads the mirror settings; `Ok(None)` when no project is configured.
    pub fn new_from_env() -> Result<Option<Self>, AppError> {
        let project_id = match env::var("FIRESTORE_PROJECT_ID") {
            Ok(id) if !id.trim().is_empty() => id,
            _ => return Ok(None),
        };
        let base_url = env::var("FIRESTORE_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let token = env::var("FIRESTORE_TOKEN").ok().filter(|t| !t.is_empty());
        let timeout_secs = match env::var("REMOTE_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .map_err(|_| AppError::Config(format!("REMOTE_TIMEOUT_SECS is not a number: {}", raw)))?,
            Err(_) => 30,
        };

        Ok(Some(Self {
            project_id,
            base_url,
            token,
            timeout: Duration::from_secs(timeout_secs),
        }))
    }
}

/// Mirror backed by the Firestore REST API. Each collection maps to a
/// top-level Firestore collection; a batch is sent as one atomic commit.
pub struct FirestoreClient {
    client: Client,
    config: FirestoreConfig,
}

impl FirestoreClient {
    pub fn new(config: FirestoreConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn documents_root(&self) -> String {
        format!("projects/{}/databases/(default)/documents", self.config.project_id)
    }

    fn document_name(&self, collection: Collection, id: &str) -> String {
        format!("{}/{}/{}", self.documents_root(), collection.as_str(), id)
    }

    fn url(&self, path: &str) -> Result<Url, MirrorError> {
        let raw = format!("{}/{}", self.config.base_url.trim_end_matches('/'), path);
        Url::parse(&raw).map_err(|e| MirrorError::Unavailable(format!("invalid mirror url {}: {}", raw, e)))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, MirrorError> {
        let response = self.authorize(request).send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                MirrorError::Unavailable(format!("Firestore unreachable: {}", e))
            } else {
                MirrorError::Rejected(format!("Firestore request failed: {}", e))
            }
        })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status.is_success() {
            Ok(body)
        } else {
            Err(classify_failure(status, &body))
        }
    }

    async fn list_page(
        &self,
        collection: Collection,
        page_token: Option<&str>,
    ) -> Result<dto::ListDocumentsResponse, MirrorError> {
        let mut url = self.url(&format!("{}/{}", self.documents_root(), collection.as_str()))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("pageSize", PAGE_SIZE);
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
        }

        let body = self.send(self.client.get(url)).await?;
        serde_json::from_str::<dto::ListDocumentsResponse>(&body)
            .map_err(|e| MirrorError::Rejected(format!("Failed to parse Firestore response: {}", e)))
    }

    async fn send_commit(&self, writes: Vec<dto::Write>) -> Result<(), MirrorError> {
        let url = self.url(&format!("{}:commit", self.documents_root()))?;
        let request_body = dto::CommitRequest { writes };
        self.send(self.client.post(url).json(&request_body)).await?;
        Ok(())
    }
}

/// Turns a Firestore error response into a message an operator can act on.
fn classify_failure(status: StatusCode, body: &str) -> MirrorError {
    let (code, message) = match serde_json::from_str::<dto::ErrorEnvelope>(body) {
        Ok(envelope) => (envelope.error.status, envelope.error.message),
        Err(_) => (String::new(), body.to_string()),
    };

    let hint = match code.as_str() {
        "PERMISSION_DENIED" => "Permission denied. Check the Firestore security rules.".to_string(),
        "UNAUTHENTICATED" => "Authentication required. Check FIRESTORE_TOKEN.".to_string(),
        "NOT_FOUND" => format!("Firestore project or database not found: {}", message),
        _ => format!("Firestore error {}: {}", status, message),
    };

    if status == StatusCode::SERVICE_UNAVAILABLE || code == "UNAVAILABLE" {
        MirrorError::Unavailable("Firestore service unavailable. Please try again later.".to_string())
    } else {
        MirrorError::Rejected(hint)
    }
}

fn to_fields(document: &Document) -> BTreeMap<String, dto::Value> {
    document
        .iter()
        .map(|(k, v)| (k.clone(), dto::Value::from_json(v)))
        .collect()
}

fn from_fields(fields: &BTreeMap<String, dto::Value>) -> Document {
    fields.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()
}

#[async_trait]
impl RemoteMirror for FirestoreClient {
    async fn ping(&self) -> Result<(), MirrorError> {
        let mut url = self.url(&format!("{}/{}", self.documents_root(), Collection::Courses.as_str()))?;
        url.query_pairs_mut().append_pair("pageSize", "1");
        self.send(self.client.get(url)).await?;
        info!("Firestore connection test succeeded");
        Ok(())
    }

    async fn list_all(&self, collection: Collection) -> Result<BTreeMap<String, Document>, MirrorError> {
        let mut documents = BTreeMap::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.list_page(collection, page_token.as_deref()).await?;
            for document in page.documents {
                documents.insert(document.id().to_string(), from_fields(&document.fields));
            }
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!("listed {} documents from {}", documents.len(), collection);
        Ok(documents)
    }

    async fn commit(&self, collection: Collection, batch: WriteBatch) -> Result<(), MirrorError> {
        if batch.len() > MAX_WRITES_PER_COMMIT {
            return Err(MirrorError::Rejected(format!(
                "{} batch has {} writes; Firestore allows at most {} per atomic commit",
                collection,
                batch.len(),
                MAX_WRITES_PER_COMMIT
            )));
        }

        let mut writes = Vec::with_capacity(batch.len());
        for (id, document) in &batch.upserts {
            writes.push(dto::Write::Update(dto::FirestoreDocument {
                name: self.document_name(collection, id),
                fields: to_fields(document),
                update_time: None,
            }));
        }
        for id in &batch.deletes {
            writes.push(dto::Write::Delete(self.document_name(collection, id)));
        }

        self.send_commit(writes).await
    }

    async fn delete_all(&self, collection: Collection) -> Result<usize, MirrorError> {
        let existing = self.list_all(collection).await?;
        if existing.is_empty() {
            debug!("no {} to delete", collection);
            return Ok(0);
        }

        // A reset is not atomic, so it may span several commits.
        let ids: Vec<&String> = existing.keys().collect();
        for chunk in ids.chunks(MAX_WRITES_PER_COMMIT) {
            let writes = chunk
                .iter()
                .map(|id| dto::Write::Delete(self.document_name(collection, id)))
                .collect();
            self.send_commit(writes).await?;
        }
        Ok(ids.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> FirestoreClient {
        FirestoreClient::new(FirestoreConfig {
            project_id: "yoga-demo".to_string(),
            base_url: "https://firestore.example.test/v1/".to_string(),
            token: None,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn document_names_are_keyed_by_local_id() {
        let client = client();
        assert_eq!(
            client.document_name(Collection::Schedules, "42"),
            "projects/yoga-demo/databases/(default)/documents/schedules/42"
        );
        let url = client.url(&format!("{}:commit", client.documents_root())).unwrap();
        assert_eq!(
            url.as_str(),
            "https://firestore.example.test/v1/projects/yoga-demo/databases/(default)/documents:commit"
        );
    }

    #[tokio::test]
    async fn oversized_batch_is_refused_before_sending() {
        let mut batch = WriteBatch::default();
        batch.deletes = (0..=MAX_WRITES_PER_COMMIT).map(|i| i.to_string()).collect();

        let err = client().commit(Collection::Courses, batch).await.unwrap_err();
        match err {
            MirrorError::Rejected(msg) => assert!(msg.contains("at most 500")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn permission_errors_are_rejections() {
        let body = r#"{"error":{"code":403,"message":"Missing or insufficient permissions.","status":"PERMISSION_DENIED"}}"#;
        match classify_failure(StatusCode::FORBIDDEN, body) {
            MirrorError::Rejected(message) => assert!(message.starts_with("Permission denied")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn service_unavailable_is_unavailable() {
        assert!(matches!(
            classify_failure(StatusCode::SERVICE_UNAVAILABLE, "down"),
            MirrorError::Unavailable(_)
        ));
    }

    #[test]
    fn fields_round_trip_through_firestore_values() {
        let document: Document = serde_json::json!({
            "id": 3,
            "price": 12.5,
            "type": "Yin",
            "description": null
        })
        .as_object()
        .cloned()
        .unwrap();
        assert_eq!(from_fields(&to_fields(&document)), document);
    }
}

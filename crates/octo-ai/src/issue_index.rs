use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::{MetadataTokenSource, OctoAiError};

const ISSUE_COLLECTION: &str = "github-issues";
const EMBEDDING_FIELD: &str = "embedding_field";
const DISTANCE_FIELD: &str = "vector_distance";
const NEAREST_LIMIT: u32 = 5;

#[derive(Debug, Clone, PartialEq)]
/// Public struct `IssueRecord` stored in the issue index.
pub struct IssueRecord {
    pub number: u64,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
/// Public struct `RankedIssue` returned by a similarity search. Smaller distance is closer.
pub struct RankedIssue {
    pub number: u64,
    pub title: String,
    pub distance: f64,
}

#[async_trait]
/// Trait contract for `IssueIndex` behavior.
pub trait IssueIndex: Send + Sync {
    /// Insert or replace the record keyed by issue number.
    async fn upsert(&self, owner: &str, repo: &str, record: &IssueRecord)
        -> Result<(), OctoAiError>;

    /// Nearest issues to `query`, ordered by ascending distance.
    async fn search(
        &self,
        owner: &str,
        repo: &str,
        query: &str,
    ) -> Result<Vec<RankedIssue>, OctoAiError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EmbeddingTask {
    Query,
    Document,
}

impl EmbeddingTask {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "RETRIEVAL_QUERY",
            Self::Document => "RETRIEVAL_DOCUMENT",
        }
    }
}

#[derive(Debug, Clone)]
/// Public struct `FirestoreIssueIndexConfig` used to construct a `FirestoreIssueIndex`.
pub struct FirestoreIssueIndexConfig {
    pub project_id: String,
    pub location: String,
    pub embedding_model: String,
    /// Defaults to the regional Vertex AI endpoint when `None`.
    pub vertex_api_base: Option<String>,
    pub firestore_api_base: String,
    pub request_timeout_ms: u64,
}

impl FirestoreIssueIndexConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            location: "us-central1".to_string(),
            embedding_model: "text-multilingual-embedding-002".to_string(),
            vertex_api_base: None,
            firestore_api_base: "https://firestore.googleapis.com".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone)]
/// Issue index backed by Vertex AI text embeddings and Firestore vector search.
pub struct FirestoreIssueIndex {
    http: reqwest::Client,
    config: FirestoreIssueIndexConfig,
    tokens: MetadataTokenSource,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    embeddings: PredictionEmbeddings,
}

#[derive(Debug, Deserialize)]
struct PredictionEmbeddings {
    values: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct RunQueryRow {
    document: Option<FirestoreDocument>,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    #[serde(default)]
    fields: Map<String, Value>,
}

impl FirestoreIssueIndex {
    pub fn new(
        config: FirestoreIssueIndexConfig,
        tokens: MetadataTokenSource,
    ) -> Result<Self, OctoAiError> {
        if config.project_id.trim().is_empty() {
            return Err(OctoAiError::InvalidConfig(
                "issue index requires a gcp project id".to_string(),
            ));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()?;
        Ok(Self {
            http,
            config,
            tokens,
        })
    }

    fn vertex_predict_url(&self) -> String {
        let base = self
            .config
            .vertex_api_base
            .clone()
            .unwrap_or_else(|| format!("https://{}-aiplatform.googleapis.com", self.config.location));
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:predict",
            base.trim_end_matches('/'),
            self.config.project_id,
            self.config.location,
            self.config.embedding_model
        )
    }

    fn documents_root(&self) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents",
            self.config.firestore_api_base.trim_end_matches('/'),
            self.config.project_id
        )
    }

    async fn embed(&self, content: &str, task: EmbeddingTask) -> Result<Vec<f64>, OctoAiError> {
        let token = self.tokens.access_token().await?;
        let payload = json!({
            "instances": [{ "content": content, "task_type": task.as_str() }]
        });
        let response = self
            .http
            .post(self.vertex_predict_url())
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await?;
        let parsed: PredictResponse = decode_response(response, "embedding api").await?;
        parsed
            .predictions
            .into_iter()
            .next()
            .map(|prediction| prediction.embeddings.values)
            .ok_or_else(|| {
                OctoAiError::InvalidResponse("embedding api returned no predictions".to_string())
            })
    }
}

async fn decode_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    service: &'static str,
) -> Result<T, OctoAiError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(OctoAiError::HttpStatus {
            service,
            status: status.as_u16(),
            body,
        });
    }
    Ok(serde_json::from_str(&body)?)
}

fn vector_value(values: &[f64]) -> Value {
    let items = values
        .iter()
        .map(|value| json!({ "doubleValue": value }))
        .collect::<Vec<_>>();
    json!({
        "mapValue": {
            "fields": {
                "__type__": { "stringValue": "__vector__" },
                "value": { "arrayValue": { "values": items } }
            }
        }
    })
}

fn field_u64(fields: &Map<String, Value>, name: &str) -> Option<u64> {
    let value = fields.get(name)?;
    if let Some(raw) = value.get("integerValue") {
        return match raw {
            Value::String(text) => text.parse().ok(),
            other => other.as_u64(),
        };
    }
    value
        .get("doubleValue")
        .and_then(Value::as_f64)
        .map(|number| number as u64)
}

fn field_f64(fields: &Map<String, Value>, name: &str) -> Option<f64> {
    let value = fields.get(name)?;
    if let Some(number) = value.get("doubleValue").and_then(Value::as_f64) {
        return Some(number);
    }
    match value.get("integerValue")? {
        Value::String(text) => text.parse().ok(),
        other => other.as_f64(),
    }
}

fn field_string(fields: &Map<String, Value>, name: &str) -> String {
    fields
        .get(name)
        .and_then(|value| value.get("stringValue"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn ranked_issue_from_document(document: FirestoreDocument) -> Option<RankedIssue> {
    Some(RankedIssue {
        number: field_u64(&document.fields, "number")?,
        title: field_string(&document.fields, "title"),
        distance: field_f64(&document.fields, DISTANCE_FIELD)?,
    })
}

#[async_trait]
impl IssueIndex for FirestoreIssueIndex {
    async fn upsert(
        &self,
        owner: &str,
        repo: &str,
        record: &IssueRecord,
    ) -> Result<(), OctoAiError> {
        let embedding = self.embed(&record.body, EmbeddingTask::Document).await?;
        let token = self.tokens.access_token().await?;
        let url = format!(
            "{}/{owner}/{repo}/{ISSUE_COLLECTION}/{}",
            self.documents_root(),
            record.number
        );
        let payload = json!({
            "fields": {
                "number": { "integerValue": record.number.to_string() },
                "title": { "stringValue": record.title },
                "body": { "stringValue": record.body },
                EMBEDDING_FIELD: vector_value(&embedding),
                "updated_at": { "timestampValue": chrono::Utc::now().to_rfc3339() }
            }
        });
        let response = self
            .http
            .patch(url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await?;
        let _: Value = decode_response(response, "firestore").await?;
        tracing::debug!(owner, repo, issue = record.number, "issue index upserted");
        Ok(())
    }

    async fn search(
        &self,
        owner: &str,
        repo: &str,
        query: &str,
    ) -> Result<Vec<RankedIssue>, OctoAiError> {
        let embedding = self.embed(query, EmbeddingTask::Query).await?;
        let token = self.tokens.access_token().await?;
        let url = format!("{}/{owner}/{repo}:runQuery", self.documents_root());
        let payload = json!({
            "structuredQuery": {
                "from": [{ "collectionId": ISSUE_COLLECTION }],
                "findNearest": {
                    "vectorField": { "fieldPath": EMBEDDING_FIELD },
                    "queryVector": vector_value(&embedding),
                    "distanceMeasure": "EUCLIDEAN",
                    "limit": NEAREST_LIMIT,
                    "distanceResultField": DISTANCE_FIELD
                }
            }
        });
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await?;
        let rows: Vec<RunQueryRow> = decode_response(response, "firestore").await?;
        let mut ranked = rows
            .into_iter()
            .filter_map(|row| row.document)
            .filter_map(ranked_issue_from_document)
            .collect::<Vec<_>>();
        ranked.sort_by(|left, right| left.distance.total_cmp(&right.distance));
        Ok(ranked)
    }
}

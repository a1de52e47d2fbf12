use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::{CompletionResponse, MultiCompletionResponse};
use crate::{
    CompletionBackend, CompletionRequest, MetadataTokenSource, MultiCompletionRequest,
    OctoAiError, Provider, ProviderCompletion,
};

const MULTI_COMPLETION_ENDPOINT: &str = "/multi/completion";
const ERROR_BODY_MAX_CHARS: usize = 800;

#[derive(Debug, Clone)]
/// Enumerates supported `BackendAuth` values.
pub enum BackendAuth {
    /// No authorization header; for local backends.
    None,
    StaticBearer(String),
    /// Identity token from the GCP metadata server with the backend URL as audience.
    Metadata(MetadataTokenSource),
}

#[derive(Debug, Clone)]
/// Public struct `BackendConfig` used to construct a `BackendClient`.
pub struct BackendConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
    pub auth: BackendAuth,
}

#[derive(Debug, Clone)]
/// HTTP client for the completion backend.
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    auth: BackendAuth,
}

impl BackendClient {
    pub fn new(config: BackendConfig) -> Result<Self, OctoAiError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(OctoAiError::InvalidConfig(
                "backend base url must not be empty".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()?;
        Ok(Self {
            http,
            base_url,
            auth: config.auth,
        })
    }

    async fn bearer_token(&self) -> Result<Option<String>, OctoAiError> {
        match &self.auth {
            BackendAuth::None => Ok(None),
            BackendAuth::StaticBearer(token) => Ok(Some(token.trim().to_string())),
            BackendAuth::Metadata(source) => source.identity_token(&self.base_url).await.map(Some),
        }
    }

    async fn post_json<B, T>(&self, endpoint: &str, payload: &B) -> Result<T, OctoAiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self
            .http
            .post(format!("{}{endpoint}", self.base_url))
            .json(payload);
        if let Some(token) = self.bearer_token().await? {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(OctoAiError::HttpStatus {
                service: "completion backend",
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

fn truncate_body(body: &str) -> String {
    if body.chars().count() <= ERROR_BODY_MAX_CHARS {
        return body.to_string();
    }
    let mut truncated = body.chars().take(ERROR_BODY_MAX_CHARS).collect::<String>();
    truncated.push_str("...");
    truncated
}

#[async_trait]
impl CompletionBackend for BackendClient {
    async fn complete(
        &self,
        provider: Provider,
        request: CompletionRequest,
    ) -> Result<String, OctoAiError> {
        let endpoint = provider.completion_endpoint();
        tracing::debug!(
            provider = provider.as_str(),
            json = request.response_schema.is_some(),
            "requesting backend completion"
        );
        let response: CompletionResponse = self.post_json(&endpoint, &request).await?;
        Ok(response.completion)
    }

    async fn complete_multi(
        &self,
        request: MultiCompletionRequest,
    ) -> Result<Vec<ProviderCompletion>, OctoAiError> {
        tracing::debug!(
            providers = request.providers.len(),
            "requesting backend multi completion"
        );
        let response: MultiCompletionResponse =
            self.post_json(MULTI_COMPLETION_ENDPOINT, &request).await?;
        Ok(response.completions)
    }
}

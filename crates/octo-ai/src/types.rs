use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Enumerates supported `Provider` values.
pub enum Provider {
    OpenAi,
    Gemini,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::OpenAi, Provider::Gemini];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "gemini" => Some(Self::Gemini),
            _ => None,
        }
    }

    /// Backend path serving single-provider completions.
    pub fn completion_endpoint(&self) -> String {
        format!("/{}/completion", self.as_str())
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
/// Public struct `CompletionRequest` sent to the completion backend.
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompts: Vec<String>,
    /// OpenAPI-style schema the provider must follow when answering in JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
}

impl CompletionRequest {
    pub fn new(system_prompt: impl Into<String>, user_prompts: Vec<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompts,
            response_schema: None,
        }
    }

    pub fn with_response_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Public struct `MultiCompletionRequest` fanned out by the backend to several providers.
pub struct MultiCompletionRequest {
    #[serde(flatten)]
    pub request: CompletionRequest,
    pub providers: Vec<Provider>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct CompletionResponse {
    pub(crate) completion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Public struct `ProviderCompletion` returned per provider by a multi completion.
pub struct ProviderCompletion {
    pub completion: String,
    pub provider: Provider,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct MultiCompletionResponse {
    pub(crate) completions: Vec<ProviderCompletion>,
}

#[derive(Debug, thiserror::Error)]
/// Enumerates supported `OctoAiError` values.
pub enum OctoAiError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{service} returned non-success status {status}: {body}")]
    HttpStatus {
        service: &'static str,
        status: u16,
        body: String,
    },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[async_trait]
/// Trait contract for `CompletionBackend` behavior.
pub trait CompletionBackend: Send + Sync {
    async fn complete(
        &self,
        provider: Provider,
        request: CompletionRequest,
    ) -> Result<String, OctoAiError>;

    async fn complete_multi(
        &self,
        request: MultiCompletionRequest,
    ) -> Result<Vec<ProviderCompletion>, OctoAiError>;
}

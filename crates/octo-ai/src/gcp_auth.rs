use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;

use crate::OctoAiError;

pub const DEFAULT_METADATA_BASE: &str = "http://metadata.google.internal";

const METADATA_ACCOUNT_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default";

#[derive(Debug, Clone)]
/// Fetches Google credentials for the runtime service account from the metadata server.
pub struct MetadataTokenSource {
    http: reqwest::Client,
    metadata_base: String,
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: String,
}

impl MetadataTokenSource {
    pub fn new(metadata_base: &str, request_timeout_ms: u64) -> Result<Self, OctoAiError> {
        let mut headers = HeaderMap::new();
        headers.insert("Metadata-Flavor", HeaderValue::from_static("Google"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()?;
        Ok(Self {
            http,
            metadata_base: metadata_base.trim_end_matches('/').to_string(),
        })
    }

    /// OIDC identity token scoped to `audience`, used for service-to-service calls.
    pub async fn identity_token(&self, audience: &str) -> Result<String, OctoAiError> {
        let response = self
            .http
            .get(format!("{}{METADATA_ACCOUNT_PATH}/identity", self.metadata_base))
            .query(&[("audience", audience), ("format", "full")])
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(OctoAiError::HttpStatus {
                service: "metadata server",
                status: status.as_u16(),
                body,
            });
        }
        let token = body.trim();
        if token.is_empty() {
            return Err(OctoAiError::InvalidResponse(
                "metadata server returned an empty identity token".to_string(),
            ));
        }
        Ok(token.to_string())
    }

    /// OAuth access token for Google Cloud APIs.
    pub async fn access_token(&self) -> Result<String, OctoAiError> {
        let response = self
            .http
            .get(format!("{}{METADATA_ACCOUNT_PATH}/token", self.metadata_base))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OctoAiError::HttpStatus {
                service: "metadata server",
                status: status.as_u16(),
                body,
            });
        }
        let parsed = response.json::<AccessTokenResponse>().await?;
        Ok(parsed.access_token)
    }
}

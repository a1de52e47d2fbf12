use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Utc};
use ring::rand::SystemRandom;
use ring::signature::{RsaKeyPair, RSA_PKCS1_SHA256};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;

use crate::github_transport_helpers::{normalize_api_base, truncate_for_error};

/// GitHub rejects app JWTs that live longer than ten minutes.
const APP_JWT_TTL_SECONDS: i64 = 540;
const APP_JWT_CLOCK_SKEW_SECONDS: i64 = 60;
const TOKEN_REFRESH_MARGIN_SECONDS: i64 = 60;

/// GitHub App identity able to mint RS256 app JWTs.
pub struct GithubAppCredentials {
    app_id: String,
    key_pair: RsaKeyPair,
}

impl fmt::Debug for GithubAppCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubAppCredentials")
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

impl GithubAppCredentials {
    /// Accepts PKCS#1 (`RSA PRIVATE KEY`) or PKCS#8 (`PRIVATE KEY`) PEM text.
    pub fn from_pem(app_id: &str, private_key_pem: &str) -> Result<Self> {
        let app_id = app_id.trim();
        if app_id.is_empty() {
            bail!("github app id must not be empty");
        }
        let normalized = private_key_pem.replace("\\n", "\n");
        let der = decode_pem_body(&normalized)?;
        let key_pair = if normalized.contains("BEGIN RSA PRIVATE KEY") {
            RsaKeyPair::from_der(&der)
        } else {
            RsaKeyPair::from_pkcs8(&der)
        }
        .map_err(|error| anyhow!("github app private key rejected: {error}"))?;
        Ok(Self {
            app_id: app_id.to_string(),
            key_pair,
        })
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Signs a short-lived app JWT valid from `now - 60s`.
    pub fn app_jwt(&self, now: DateTime<Utc>) -> Result<String> {
        let issued_at = now.timestamp() - APP_JWT_CLOCK_SKEW_SECONDS;
        let header = json!({ "alg": "RS256", "typ": "JWT" });
        let claims = json!({
            "iat": issued_at,
            "exp": issued_at + APP_JWT_TTL_SECONDS,
            "iss": self.app_id,
        });
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?)
        );
        let mut signature = vec![0_u8; self.key_pair.public().modulus_len()];
        self.key_pair
            .sign(
                &RSA_PKCS1_SHA256,
                &SystemRandom::new(),
                signing_input.as_bytes(),
                &mut signature,
            )
            .map_err(|_| anyhow!("failed to sign github app jwt"))?;
        Ok(format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature)))
    }

    #[cfg(test)]
    fn public_key_der(&self) -> Vec<u8> {
        self.key_pair.public().as_ref().to_vec()
    }
}

fn decode_pem_body(pem: &str) -> Result<Vec<u8>> {
    let body = pem
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("-----"))
        .collect::<String>();
    if body.is_empty() {
        bail!("github app private key is not PEM encoded");
    }
    STANDARD
        .decode(body.as_bytes())
        .context("github app private key contains invalid base64")
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct InstallationTokenResponse {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Exchanges app JWTs for installation access tokens, caching them until shortly before expiry.
#[derive(Debug)]
pub struct InstallationTokenProvider {
    http: reqwest::Client,
    api_base: String,
    credentials: Arc<GithubAppCredentials>,
    cache: Mutex<HashMap<u64, CachedToken>>,
}

impl InstallationTokenProvider {
    pub fn new(
        api_base: &str,
        credentials: Arc<GithubAppCredentials>,
        request_timeout_ms: u64,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("OctoThink-github-app")
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()
            .context("failed to create github app auth client")?;
        Ok(Self {
            http,
            api_base: normalize_api_base(api_base),
            credentials,
            cache: Mutex::new(HashMap::new()),
        })
    }

    pub async fn installation_token(&self, installation_id: u64) -> Result<String> {
        let now = Utc::now();
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.get(&installation_id) {
            if cached.expires_at - chrono::Duration::seconds(TOKEN_REFRESH_MARGIN_SECONDS) > now {
                return Ok(cached.token.clone());
            }
        }

        let jwt = self.credentials.app_jwt(now)?;
        let response = self
            .http
            .post(format!(
                "{}/app/installations/{installation_id}/access_tokens",
                self.api_base
            ))
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("x-github-api-version", "2022-11-28")
            .bearer_auth(jwt)
            .send()
            .await
            .context("github installation token request failed")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!(
                "github installation token request failed with status {}: {}",
                status.as_u16(),
                truncate_for_error(&body, 800)
            );
        }
        let parsed = response
            .json::<InstallationTokenResponse>()
            .await
            .context("failed to decode github installation token")?;
        tracing::debug!(installation_id, expires_at = %parsed.expires_at, "installation token issued");
        cache.insert(
            installation_id,
            CachedToken {
                token: parsed.token.clone(),
                expires_at: parsed.expires_at,
            },
        );
        Ok(parsed.token)
    }
}

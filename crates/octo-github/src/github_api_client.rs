use std::time::Duration;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::github_transport_helpers::{normalize_api_base, truncate_for_error};
use crate::webhook_payload::GithubComment;
use crate::RepoRef;

const PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct GithubCommentCreateResponse {
    pub id: u64,
    #[serde(default)]
    pub node_id: String,
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GithubLabel {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubIssueCreateResponse {
    pub number: u64,
    pub html_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubBranchRef {
    pub label: String,
    pub sha: String,
}

#[derive(Debug, Clone, Deserialize)]
/// Public struct `GithubPullRequest` used across OctoThink components.
pub struct GithubPullRequest {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub base: GithubBranchRef,
    pub head: GithubBranchRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubCommitRef {
    pub sha: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubChangedFile {
    pub filename: String,
    pub status: String,
    #[serde(default)]
    pub patch: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
/// Result of comparing two refs with `base...head`.
pub struct GithubComparison {
    #[serde(default)]
    pub commits: Vec<GithubCommitRef>,
    #[serde(default)]
    pub files: Option<Vec<GithubChangedFile>>,
}

#[derive(Debug, Clone, Serialize)]
/// Public struct `ReviewCommentRequest` for a single pull request review comment.
pub struct ReviewCommentRequest {
    pub commit_id: String,
    pub path: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubContentFile {
    pub sha: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl GithubContentFile {
    /// Decodes the base64 `content` field returned by the contents API.
    pub fn decoded_text(&self) -> Result<String> {
        let raw = self
            .content
            .as_deref()
            .unwrap_or_default()
            .chars()
            .filter(|ch| !ch.is_whitespace())
            .collect::<String>();
        let bytes = STANDARD
            .decode(raw.as_bytes())
            .context("github content is not valid base64")?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[derive(Debug, Clone)]
/// Public struct `GithubApiConfig` used to construct a `GithubApiClient`.
pub struct GithubApiConfig {
    pub api_base: String,
    pub token: String,
    pub request_timeout_ms: u64,
}

#[derive(Clone)]
/// REST and GraphQL client bound to one repository and one access token.
pub struct GithubApiClient {
    pub(crate) http: reqwest::Client,
    pub(crate) api_base: String,
    repo: RepoRef,
}

impl GithubApiClient {
    pub fn new(config: GithubApiConfig, repo: RepoRef) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("OctoThink-github-app"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            reqwest::header::HeaderValue::from_static("2022-11-28"),
        );
        let auth_header = format!("Bearer {}", config.token.trim());
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&auth_header)
                .context("invalid github authorization header")?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()
            .context("failed to create github api client")?;
        Ok(Self {
            http: client,
            api_base: normalize_api_base(&config.api_base),
            repo,
        })
    }

    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    fn repo_url(&self, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.repo.owner, self.repo.name, suffix
        )
    }

    pub async fn create_issue_comment(
        &self,
        issue_number: u64,
        body: &str,
    ) -> Result<GithubCommentCreateResponse> {
        let payload = json!({ "body": body });
        self.request_json(
            "create issue comment",
            self.http
                .post(self.repo_url(&format!("issues/{issue_number}/comments")))
                .json(&payload),
        )
        .await
    }

    pub async fn delete_issue_comment(&self, comment_id: u64) -> Result<()> {
        self.request_empty(
            "delete issue comment",
            self.http
                .delete(self.repo_url(&format!("issues/comments/{comment_id}"))),
        )
        .await
    }

    /// Adds a reaction such as `rocket` to an issue or pull request comment.
    pub async fn add_issue_comment_reaction(&self, comment_id: u64, content: &str) -> Result<()> {
        let payload = json!({ "content": content });
        let _: Value = self
            .request_json(
                "create issue comment reaction",
                self.http
                    .post(self.repo_url(&format!("issues/comments/{comment_id}/reactions")))
                    .json(&payload),
            )
            .await?;
        Ok(())
    }

    pub async fn list_issue_comments(&self, issue_number: u64) -> Result<Vec<GithubComment>> {
        let url = self.repo_url(&format!("issues/{issue_number}/comments"));
        self.paginate("list issue comments", &url).await
    }

    pub async fn list_labels(&self) -> Result<Vec<GithubLabel>> {
        let url = self.repo_url("labels");
        self.paginate("list labels", &url).await
    }

    pub async fn add_labels(&self, issue_number: u64, labels: &[String]) -> Result<()> {
        let payload = json!({ "labels": labels });
        let _: Value = self
            .request_json(
                "add labels",
                self.http
                    .post(self.repo_url(&format!("issues/{issue_number}/labels")))
                    .json(&payload),
            )
            .await?;
        Ok(())
    }

    pub async fn create_issue(&self, title: &str, body: &str) -> Result<GithubIssueCreateResponse> {
        let payload = json!({ "title": title, "body": body });
        self.request_json(
            "create issue",
            self.http.post(self.repo_url("issues")).json(&payload),
        )
        .await
    }

    pub async fn update_issue_body(&self, issue_number: u64, body: &str) -> Result<()> {
        let payload = json!({ "body": body });
        let _: Value = self
            .request_json(
                "update issue",
                self.http
                    .patch(self.repo_url(&format!("issues/{issue_number}")))
                    .json(&payload),
            )
            .await?;
        Ok(())
    }

    pub async fn get_pull_request(&self, pull_number: u64) -> Result<GithubPullRequest> {
        self.request_json(
            "get pull request",
            self.http.get(self.repo_url(&format!("pulls/{pull_number}"))),
        )
        .await
    }

    /// Compares `base...head` where both sides are branch labels or shas.
    pub async fn compare_commits(&self, basehead: &str) -> Result<GithubComparison> {
        self.request_json(
            "compare commits",
            self.http.get(self.repo_url(&format!("compare/{basehead}"))),
        )
        .await
    }

    pub async fn create_review_comment(
        &self,
        pull_number: u64,
        request: &ReviewCommentRequest,
    ) -> Result<()> {
        let _: Value = self
            .request_json(
                "create review comment",
                self.http
                    .post(self.repo_url(&format!("pulls/{pull_number}/comments")))
                    .json(request),
            )
            .await?;
        Ok(())
    }

    /// Returns `None` when the path does not exist; directories are reported as missing files.
    pub async fn get_file(&self, path: &str) -> Result<Option<GithubContentFile>> {
        let response = self
            .http
            .get(self.repo_url(&format!("contents/{path}")))
            .send()
            .await
            .context("github api get contents request failed")?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            bail!(
                "github api get contents failed with status {}: {}",
                status.as_u16(),
                truncate_for_error(&body, 800)
            );
        }
        let parsed: Value =
            serde_json::from_str(&body).context("failed to decode github get contents")?;
        if parsed.is_array() {
            return Ok(None);
        }
        Ok(Some(
            serde_json::from_value(parsed).context("failed to decode github content file")?,
        ))
    }

    /// Creates or replaces a file; `sha` must carry the current blob sha when replacing.
    pub async fn put_file(
        &self,
        path: &str,
        message: &str,
        content: &str,
        sha: Option<&str>,
    ) -> Result<()> {
        let mut payload = json!({
            "message": message,
            "content": STANDARD.encode(content.as_bytes()),
        });
        if let Some(sha) = sha {
            payload["sha"] = Value::String(sha.to_string());
        }
        let _: Value = self
            .request_json(
                "put contents",
                self.http
                    .put(self.repo_url(&format!("contents/{path}")))
                    .json(&payload),
            )
            .await?;
        Ok(())
    }

    async fn paginate<T: DeserializeOwned>(&self, operation: &str, url: &str) -> Result<Vec<T>> {
        let mut page = 1_u32;
        let mut rows = Vec::new();
        loop {
            let page_value = page.to_string();
            let chunk: Vec<T> = self
                .request_json(
                    operation,
                    self.http
                        .get(url)
                        .query(&[("per_page", "100"), ("page", page_value.as_str())]),
                )
                .await?;
            let chunk_len = chunk.len();
            rows.extend(chunk);
            if chunk_len < PAGE_SIZE {
                break;
            }
            page = page.saturating_add(1);
        }
        Ok(rows)
    }

    async fn request_empty(&self, operation: &str, request: reqwest::RequestBuilder) -> Result<()> {
        let response = request
            .send()
            .await
            .with_context(|| format!("github api {operation} request failed"))?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        bail!(
            "github api {operation} failed with status {}: {}",
            status.as_u16(),
            truncate_for_error(&body, 800)
        );
    }

    pub(crate) async fn request_json<T>(
        &self,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = request
            .send()
            .await
            .with_context(|| format!("github api {operation} request failed"))?;
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .with_context(|| format!("failed to decode github {operation}"));
        }

        let body = response.text().await.unwrap_or_default();
        bail!(
            "github api {operation} failed with status {}: {}",
            status.as_u16(),
            truncate_for_error(&body, 800)
        );
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
/// Public struct `GithubUser` used across OctoThink components.
pub struct GithubUser {
    pub login: String,
    #[serde(default)]
    pub id: u64,
    /// `User`, `Bot` or `Organization`.
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl GithubUser {
    /// Bot accounts, GitHub App identities and the Actions runner.
    pub fn is_bot(&self) -> bool {
        self.kind == "Bot" || self.login.contains("[bot]") || self.login.contains("github-actions")
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
/// Public struct `GithubRepository` used across OctoThink components.
pub struct GithubRepository {
    pub name: String,
    pub owner: GithubUser,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GithubInstallation {
    pub id: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GithubOrganization {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
/// Public struct `GithubIssue` used across OctoThink components.
pub struct GithubIssue {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub node_id: String,
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub closed_at: Option<String>,
    pub user: GithubUser,
    /// Present when the issue is the conversation thread of a pull request.
    #[serde(default)]
    pub pull_request: Option<Value>,
}

impl GithubIssue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }

    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
/// Public struct `GithubComment` covering issue, pull request and discussion comments.
pub struct GithubComment {
    pub id: u64,
    #[serde(default)]
    pub node_id: String,
    #[serde(default)]
    pub body: Option<String>,
    pub user: GithubUser,
}

impl GithubComment {
    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GithubDiscussion {
    #[serde(default)]
    pub id: u64,
    pub node_id: String,
    #[serde(default)]
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
/// Payload of `issues` deliveries.
pub struct IssuesPayload {
    pub action: String,
    pub issue: GithubIssue,
    pub repository: GithubRepository,
    pub sender: GithubUser,
    #[serde(default)]
    pub installation: Option<GithubInstallation>,
    #[serde(default)]
    pub organization: Option<GithubOrganization>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
/// Payload of `issue_comment` deliveries.
pub struct IssueCommentPayload {
    pub action: String,
    pub issue: GithubIssue,
    pub comment: GithubComment,
    pub repository: GithubRepository,
    pub sender: GithubUser,
    #[serde(default)]
    pub installation: Option<GithubInstallation>,
    #[serde(default)]
    pub organization: Option<GithubOrganization>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
/// Payload of `discussion_comment` deliveries.
pub struct DiscussionCommentPayload {
    pub action: String,
    pub discussion: GithubDiscussion,
    pub comment: GithubComment,
    pub repository: GithubRepository,
    pub sender: GithubUser,
    #[serde(default)]
    pub installation: Option<GithubInstallation>,
    #[serde(default)]
    pub organization: Option<GithubOrganization>,
}

#[derive(Debug, Clone)]
/// Enumerates supported `WebhookEvent` values.
pub enum WebhookEvent {
    IssueOpened(IssuesPayload),
    IssueClosed(IssuesPayload),
    IssueCommentCreated(IssueCommentPayload),
    DiscussionCommentCreated(DiscussionCommentPayload),
    Unsubscribed { event: String, action: Option<String> },
}

#[derive(Debug, Deserialize)]
struct ActionProbe {
    #[serde(default)]
    action: Option<String>,
}

impl WebhookEvent {
    /// Decodes a delivery using the `x-github-event` header value and the body's `action`.
    pub fn parse(event_name: &str, body: &[u8]) -> Result<Self, serde_json::Error> {
        let probe: ActionProbe = serde_json::from_slice(body)?;
        let action = probe.action.unwrap_or_default();
        let event = match (event_name, action.as_str()) {
            ("issues", "opened") => Self::IssueOpened(serde_json::from_slice(body)?),
            ("issues", "closed") => Self::IssueClosed(serde_json::from_slice(body)?),
            ("issue_comment", "created") => {
                Self::IssueCommentCreated(serde_json::from_slice(body)?)
            }
            ("discussion_comment", "created") => {
                Self::DiscussionCommentCreated(serde_json::from_slice(body)?)
            }
            _ => Self::Unsubscribed {
                event: event_name.to_string(),
                action: (!action.is_empty()).then_some(action),
            },
        };
        Ok(event)
    }

    /// Dotted `event.action` name used in logs.
    pub fn name(&self) -> String {
        match self {
            Self::IssueOpened(_) => "issues.opened".to_string(),
            Self::IssueClosed(_) => "issues.closed".to_string(),
            Self::IssueCommentCreated(_) => "issue_comment.created".to_string(),
            Self::DiscussionCommentCreated(_) => "discussion_comment.created".to_string(),
            Self::Unsubscribed { event, action } => match action {
                Some(action) => format!("{event}.{action}"),
                None => event.clone(),
            },
        }
    }

    pub fn sender(&self) -> Option<&GithubUser> {
        match self {
            Self::IssueOpened(payload) | Self::IssueClosed(payload) => Some(&payload.sender),
            Self::IssueCommentCreated(payload) => Some(&payload.sender),
            Self::DiscussionCommentCreated(payload) => Some(&payload.sender),
            Self::Unsubscribed { .. } => None,
        }
    }

    pub fn installation_id(&self) -> Option<u64> {
        let installation = match self {
            Self::IssueOpened(payload) | Self::IssueClosed(payload) => &payload.installation,
            Self::IssueCommentCreated(payload) => &payload.installation,
            Self::DiscussionCommentCreated(payload) => &payload.installation,
            Self::Unsubscribed { .. } => return None,
        };
        installation.as_ref().map(|installation| installation.id)
    }

    pub fn repository(&self) -> Option<&GithubRepository> {
        match self {
            Self::IssueOpened(payload) | Self::IssueClosed(payload) => Some(&payload.repository),
            Self::IssueCommentCreated(payload) => Some(&payload.repository),
            Self::DiscussionCommentCreated(payload) => Some(&payload.repository),
            Self::Unsubscribed { .. } => None,
        }
    }
}

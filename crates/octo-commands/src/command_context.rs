use std::sync::Arc;

use anyhow::{anyhow, Result};
use octo_ai::{CompletionBackend, IssueIndex};
use octo_github::webhook_payload::{GithubComment, GithubDiscussion, GithubIssue};
use octo_github::GithubApiClient;
use octo_settings::BotSettings;

use crate::command_registry::{CommandRegistry, ContentType};

const ACKNOWLEDGE_REACTION: &str = "rocket";
const ACKNOWLEDGE_REACTION_GRAPHQL: &str = "ROCKET";

#[derive(Clone)]
/// Long-lived collaborators shared by every delivery.
pub struct BotServices {
    pub backend: Arc<dyn CompletionBackend>,
    /// `None` when no vector index is configured.
    pub issue_index: Option<Arc<dyn IssueIndex>>,
    pub settings: Arc<BotSettings>,
    pub registry: Arc<CommandRegistry>,
}

#[derive(Debug, Clone)]
/// Enumerates supported `CommentSubject` values.
pub enum CommentSubject {
    /// Comment on an issue or on a pull request conversation.
    Issue {
        issue: GithubIssue,
        comment: GithubComment,
    },
    Discussion {
        discussion: GithubDiscussion,
        comment: GithubComment,
    },
}

/// Everything a command handler can reach while serving one comment.
pub struct CommandContext {
    pub services: BotServices,
    pub github: GithubApiClient,
    pub subject: CommentSubject,
}

impl CommandContext {
    pub fn new(services: BotServices, github: GithubApiClient, subject: CommentSubject) -> Self {
        Self {
            services,
            github,
            subject,
        }
    }

    pub fn settings(&self) -> &BotSettings {
        &self.services.settings
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.services.registry
    }

    pub fn content_type(&self) -> ContentType {
        match &self.subject {
            CommentSubject::Issue { issue, .. } if issue.is_pull_request() => {
                ContentType::PullRequest
            }
            CommentSubject::Issue { .. } => ContentType::Issue,
            CommentSubject::Discussion { .. } => ContentType::Discussion,
        }
    }

    pub fn comment(&self) -> &GithubComment {
        match &self.subject {
            CommentSubject::Issue { comment, .. } | CommentSubject::Discussion { comment, .. } => {
                comment
            }
        }
    }

    pub fn issue(&self) -> Option<&GithubIssue> {
        match &self.subject {
            CommentSubject::Issue { issue, .. } => Some(issue),
            CommentSubject::Discussion { .. } => None,
        }
    }

    pub fn require_issue(&self) -> Result<&GithubIssue> {
        self.issue()
            .ok_or_else(|| anyhow!("this command is only available on issues and pull requests"))
    }

    pub fn discussion(&self) -> Option<&GithubDiscussion> {
        match &self.subject {
            CommentSubject::Discussion { discussion, .. } => Some(discussion),
            CommentSubject::Issue { .. } => None,
        }
    }

    /// Posts on the thread the triggering comment belongs to.
    pub async fn post_comment(&self, body: &str) -> Result<()> {
        match &self.subject {
            CommentSubject::Issue { issue, .. } => {
                self.github.create_issue_comment(issue.number, body).await?;
            }
            CommentSubject::Discussion { discussion, .. } => {
                self.github
                    .add_discussion_comment(&discussion.node_id, body)
                    .await?;
            }
        }
        Ok(())
    }

    /// Reacts with a rocket to the triggering comment.
    pub async fn acknowledge(&self) -> Result<()> {
        match &self.subject {
            CommentSubject::Issue { comment, .. } => {
                self.github
                    .add_issue_comment_reaction(comment.id, ACKNOWLEDGE_REACTION)
                    .await
            }
            CommentSubject::Discussion { comment, .. } => {
                self.github
                    .add_reaction(&comment.node_id, ACKNOWLEDGE_REACTION_GRAPHQL)
                    .await
            }
        }
    }

    pub async fn delete_trigger(&self) -> Result<()> {
        match &self.subject {
            CommentSubject::Issue { comment, .. } => {
                self.github.delete_issue_comment(comment.id).await
            }
            CommentSubject::Discussion { comment, .. } => {
                self.github.delete_discussion_comment(&comment.node_id).await
            }
        }
    }
}

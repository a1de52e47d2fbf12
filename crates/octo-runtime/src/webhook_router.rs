use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::Utc;
use octo_commands::issue_actions::{add_to_monthly_project, create_issue_summary, set_label_to_issue};
use octo_commands::{dispatch_comment, BotServices, CommandContext, CommentDispatchOutcome, CommentSubject};
use octo_github::github_app_auth::InstallationTokenProvider;
use octo_github::webhook_payload::{GithubRepository, IssuesPayload, WebhookEvent};
use octo_github::{GithubApiClient, GithubApiConfig, RepoRef};

use crate::action_aggregator::{run_actions, ActionOutcome, NamedAction};
use crate::sender_validator::{validate_sender, SenderDecision};

#[derive(Clone)]
/// Enumerates supported `GithubAuth` values.
pub enum GithubAuth {
    /// Installation access token minted per delivery from the App credentials.
    App(Arc<InstallationTokenProvider>),
    /// Fixed token for local development against a single account.
    StaticToken(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Enumerates supported `DeliveryOutcome` values.
pub enum DeliveryOutcome {
    Unsubscribed { event: String },
    SenderRejected { event: String, decision: SenderDecision },
    Actions { event: String, outcomes: Vec<ActionOutcome> },
    Comment { event: String, outcome: CommentDispatchOutcome },
}

/// Routes decoded deliveries to the command dispatcher or to issue actions.
#[derive(Clone)]
pub struct DeliveryRouter {
    services: BotServices,
    auth: GithubAuth,
    api_base: String,
    request_timeout_ms: u64,
}

impl DeliveryRouter {
    pub fn new(
        services: BotServices,
        auth: GithubAuth,
        api_base: impl Into<String>,
        request_timeout_ms: u64,
    ) -> Self {
        Self {
            services,
            auth,
            api_base: api_base.into(),
            request_timeout_ms,
        }
    }

    pub async fn route(&self, event: WebhookEvent) -> Result<DeliveryOutcome> {
        let name = event.name();
        let Some(sender) = event.sender() else {
            tracing::debug!(event = %name, "ignoring unsubscribed event");
            return Ok(DeliveryOutcome::Unsubscribed { event: name });
        };
        let decision = validate_sender(sender, event.installation_id(), &self.services.settings);
        if !decision.is_allowed() {
            tracing::debug!(event = %name, sender = %sender.login, ?decision, "sender rejected");
            return Ok(DeliveryOutcome::SenderRejected {
                event: name,
                decision,
            });
        }

        let repository = event
            .repository()
            .ok_or_else(|| anyhow!("delivery {name} has no repository"))?;
        let github = self
            .github_client(repository, event.installation_id())
            .await?;

        match event {
            WebhookEvent::IssueOpened(payload) => {
                let actions = self.issue_opened_actions(github, payload);
                Ok(DeliveryOutcome::Actions {
                    outcomes: run_actions(&name, actions).await,
                    event: name,
                })
            }
            WebhookEvent::IssueClosed(payload) => {
                let actions = self.issue_closed_actions(github, payload);
                Ok(DeliveryOutcome::Actions {
                    outcomes: run_actions(&name, actions).await,
                    event: name,
                })
            }
            WebhookEvent::IssueCommentCreated(payload) => {
                let ctx = CommandContext::new(
                    self.services.clone(),
                    github,
                    CommentSubject::Issue {
                        issue: payload.issue,
                        comment: payload.comment,
                    },
                );
                Ok(DeliveryOutcome::Comment {
                    outcome: dispatch_comment(&ctx).await,
                    event: name,
                })
            }
            WebhookEvent::DiscussionCommentCreated(payload) => {
                let ctx = CommandContext::new(
                    self.services.clone(),
                    github,
                    CommentSubject::Discussion {
                        discussion: payload.discussion,
                        comment: payload.comment,
                    },
                );
                Ok(DeliveryOutcome::Comment {
                    outcome: dispatch_comment(&ctx).await,
                    event: name,
                })
            }
            WebhookEvent::Unsubscribed { .. } => Ok(DeliveryOutcome::Unsubscribed { event: name }),
        }
    }

    async fn github_client(
        &self,
        repository: &GithubRepository,
        installation_id: Option<u64>,
    ) -> Result<GithubApiClient> {
        let token = match &self.auth {
            GithubAuth::StaticToken(token) => token.clone(),
            GithubAuth::App(provider) => {
                let installation_id = installation_id
                    .ok_or_else(|| anyhow!("delivery has no installation id"))?;
                provider.installation_token(installation_id).await?
            }
        };
        GithubApiClient::new(
            GithubApiConfig {
                api_base: self.api_base.clone(),
                token,
                request_timeout_ms: self.request_timeout_ms,
            },
            RepoRef::new(repository.owner.login.clone(), repository.name.clone()),
        )
    }

    fn issue_opened_actions(&self, github: GithubApiClient, payload: IssuesPayload) -> Vec<NamedAction> {
        let organization = payload.organization.map(|organization| organization.login);
        let label_services = self.services.clone();
        let label_github = github.clone();
        let label_issue = payload.issue.clone();
        let issue = payload.issue;
        vec![
            NamedAction::new("setLabelToIssue", async move {
                set_label_to_issue(&label_services, &label_github, &label_issue, None).await
            }),
            NamedAction::new("addToMonthlyProject", async move {
                add_to_monthly_project(&github, &issue, organization.as_deref(), Utc::now()).await
            }),
        ]
    }

    fn issue_closed_actions(&self, github: GithubApiClient, payload: IssuesPayload) -> Vec<NamedAction> {
        let summary_services = self.services.clone();
        let summary_github = github.clone();
        let summary_issue = payload.issue.clone();
        let services = self.services.clone();
        let issue = payload.issue;
        vec![
            NamedAction::new("createIssueSummary", async move {
                create_issue_summary(&summary_services, &summary_github, &summary_issue).await
            }),
            NamedAction::new("setLabelToIssue", async move {
                set_label_to_issue(&services, &github, &issue, None).await
            }),
        ]
    }
}

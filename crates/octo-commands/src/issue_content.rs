use anyhow::Result;
use octo_github::webhook_payload::GithubIssue;
use octo_github::{DiscussionThread, GithubApiClient};

use crate::command_context::{CommandContext, CommentSubject};
use crate::command_registry::{CommandRegistry, ContentType};
use crate::comment_render::truncate_chars;
use crate::pull_request_review::pull_request_context;

const README_PATH: &str = "README.md";

/// Issue title, body and the conversation, without command comments.
/// Bot comments are dropped unless `include_bot` is set.
pub async fn issue_with_comments(
    github: &GithubApiClient,
    registry: &CommandRegistry,
    issue: &GithubIssue,
    include_bot: bool,
) -> Result<String> {
    let comments = github.list_issue_comments(issue.number).await?;
    let rendered = comments
        .iter()
        .filter(|comment| include_bot || comment.user.kind != "Bot")
        .filter(|comment| !registry.is_command_comment(comment.body_text()))
        .map(|comment| format!("Comment by {}:\n{}", comment.user.login, comment.body_text()))
        .collect::<Vec<_>>()
        .join("\n\n");
    Ok(format!(
        "Title: {}\n\nBody: {}\n\nComments:\n{rendered}",
        issue.title,
        issue.body_text()
    ))
}

pub fn discussion_text(thread: &DiscussionThread) -> String {
    format!("{}\n\n{}", thread.body, thread.comments.join("\n\n"))
}

/// Root README trimmed to `max_chars`; empty when disabled or unavailable.
pub async fn readme(github: &GithubApiClient, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    let file = match github.get_file(README_PATH).await {
        Ok(Some(file)) => file,
        Ok(None) => return String::new(),
        Err(error) => {
            tracing::debug!(error = %error, "readme unavailable");
            return String::new();
        }
    };
    match file.decoded_text() {
        Ok(text) => format!(
            "# README For {}\n\n{}",
            github.repo().as_slug(),
            truncate_chars(&text, max_chars, "")
        ),
        Err(error) => {
            tracing::debug!(error = %error, "readme could not be decoded");
            String::new()
        }
    }
}

/// Appends the README section to `prompts` when one is available.
pub fn push_readme(prompts: &mut Vec<String>, readme: String) {
    if !readme.is_empty() {
        prompts.push("The README of this repository follows.".to_string());
        prompts.push(readme);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `CurrentContext` describing the thread a command runs on.
pub struct CurrentContext {
    pub content_type: ContentType,
    pub title: String,
    pub body: String,
}

pub async fn current_context(ctx: &CommandContext) -> Result<CurrentContext> {
    let content_type = ctx.content_type();
    match (&ctx.subject, content_type) {
        (CommentSubject::Discussion { discussion, .. }, _) => {
            let thread = ctx
                .github
                .discussion_with_comments(&discussion.node_id)
                .await?;
            Ok(CurrentContext {
                content_type,
                title: discussion.title.clone(),
                body: discussion_text(&thread),
            })
        }
        (CommentSubject::Issue { issue, .. }, ContentType::PullRequest) => {
            let pull_request =
                pull_request_context(&ctx.github, ctx.registry(), issue.number).await?;
            Ok(CurrentContext {
                content_type,
                title: pull_request.title,
                body: pull_request.description,
            })
        }
        (CommentSubject::Issue { issue, .. }, _) => Ok(CurrentContext {
            content_type,
            title: issue.title.clone(),
            body: issue_with_comments(&ctx.github, ctx.registry(), issue, true).await?,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use base64::Engine;
    use httpmock::prelude::*;
    use serde_json::json;

    use super::{issue_with_comments, readme};
    use crate::command_registry::{CommandRegistry, ContentType};
    use crate::test_support::{definition, github_client, issue, RecordingHandler};

    fn registry() -> CommandRegistry {
        CommandRegistry::new(vec![definition(
            "label",
            &[ContentType::Issue],
            Arc::new(RecordingHandler::default()),
        )])
        .expect("registry")
    }

    #[tokio::test]
    async fn functional_issue_with_comments_drops_commands_and_bots() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repos/acme/widgets/issues/5/comments");
            then.status(200).json_body(json!([
                {"id": 1, "node_id": "c1", "body": "first", "user": {"login": "alice", "id": 1, "type": "User"}},
                {"id": 2, "node_id": "c2", "body": "/label bug", "user": {"login": "alice", "id": 1, "type": "User"}},
                {"id": 3, "node_id": "c3", "body": "summary", "user": {"login": "octo[bot]", "id": 9, "type": "Bot"}}
            ]));
        });
        let github = github_client(&server);
        let subject = issue(5, "Crash", "It crashes", false);

        let without_bots = issue_with_comments(&github, &registry(), &subject, false)
            .await
            .expect("content");
        assert_eq!(
            without_bots,
            "Title: Crash\n\nBody: It crashes\n\nComments:\nComment by alice:\nfirst"
        );

        let with_bots = issue_with_comments(&github, &registry(), &subject, true)
            .await
            .expect("content");
        assert!(with_bots.ends_with("Comment by alice:\nfirst\n\nComment by octo[bot]:\nsummary"));
    }

    #[tokio::test]
    async fn functional_readme_is_prefixed_and_truncated() {
        let server = MockServer::start();
        let encoded = base64::engine::general_purpose::STANDARD.encode("Widgets rock");
        server.mock(|when, then| {
            when.method(GET).path("/repos/acme/widgets/contents/README.md");
            then.status(200)
                .json_body(json!({"sha": "abc", "content": encoded}));
        });
        let github = github_client(&server);

        assert_eq!(
            readme(&github, 7).await,
            "# README For acme/widgets\n\nWidgets"
        );
        assert_eq!(readme(&github, 0).await, "");
    }

    #[tokio::test]
    async fn regression_readme_errors_collapse_to_empty() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repos/acme/widgets/contents/README.md");
            then.status(500).body("boom");
        });
        assert_eq!(readme(&github_client(&server), 100).await, "");
    }
}

use anyhow::{Context, Result};
use async_trait::async_trait;
use octo_ai::CompletionRequest;
use serde::Deserialize;
use serde_json::json;

use crate::command_context::CommandContext;
use crate::command_registry::CommandHandler;
use crate::issue_content::issue_with_comments;
use crate::prompts;

#[derive(Debug, Deserialize)]
struct DraftIssue {
    title: String,
    body: String,
}

/// `/create <instruction>`: drafts a follow-up issue from the current one.
pub struct CreateCommand;

#[async_trait]
impl CommandHandler for CreateCommand {
    async fn execute(&self, ctx: &CommandContext, args: Option<&str>) -> Result<()> {
        let issue = ctx.require_issue()?;
        let content = issue_with_comments(&ctx.github, ctx.registry(), issue, true).await?;
        let lead = match args {
            Some(args) => format!("The issue is as follows. {args}"),
            None => "The issue is as follows.".to_string(),
        };
        let request = CompletionRequest::new(
            prompts::CREATE_ISSUE,
            vec![
                lead,
                content,
                format!(
                    "List the source issue as a related issue. URL: {}",
                    issue.html_url
                ),
            ],
        )
        .with_response_schema(json!({
            "type": "object",
            "properties": {
                "title": {"type": "string", "description": "Title of the issue"},
                "body": {"type": "string", "description": "Body of the issue"}
            },
            "required": ["title", "body"]
        }));
        let completion = ctx
            .services
            .backend
            .complete(ctx.settings().default_provider, request)
            .await?;
        let draft: DraftIssue =
            serde_json::from_str(&completion).context("new issue draft was not valid json")?;

        let created = ctx.github.create_issue(&draft.title, &draft.body).await?;
        tracing::info!(source = issue.number, created = created.number, "created follow-up issue");
        ctx.github
            .create_issue_comment(
                issue.number,
                &format!("Created a new issue:\n- {}", created.html_url),
            )
            .await?;
        Ok(())
    }
}

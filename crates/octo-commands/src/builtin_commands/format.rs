use anyhow::Result;
use async_trait::async_trait;
use octo_ai::CompletionRequest;

use crate::command_context::CommandContext;
use crate::command_registry::CommandHandler;
use crate::issue_content::issue_with_comments;
use crate::prompts;

/// `/format [instruction]`: rewrites the issue description from the conversation.
pub struct FormatCommand;

#[async_trait]
impl CommandHandler for FormatCommand {
    async fn execute(&self, ctx: &CommandContext, args: Option<&str>) -> Result<()> {
        let issue = ctx.require_issue()?;
        let content = issue_with_comments(&ctx.github, ctx.registry(), issue, false).await?;
        let lead = match args {
            Some(args) => format!("The issue is as follows. {args}"),
            None => "The issue is as follows.".to_string(),
        };
        let formatted = ctx
            .services
            .backend
            .complete(
                ctx.settings().default_provider,
                CompletionRequest::new(prompts::FORMAT_ISSUE, vec![lead, content]),
            )
            .await?;
        if formatted.is_empty() {
            tracing::info!(issue = issue.number, "formatter returned nothing; body unchanged");
            return Ok(());
        }
        ctx.github.update_issue_body(issue.number, &formatted).await
    }
}

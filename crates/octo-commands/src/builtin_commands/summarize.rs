use anyhow::Result;
use async_trait::async_trait;

use crate::command_context::CommandContext;
use crate::command_registry::CommandHandler;
use crate::issue_actions::summarize_issue;
use crate::issue_content::issue_with_comments;

/// `/summarize [instruction]`: posts a summary of the issue conversation.
pub struct SummarizeCommand;

#[async_trait]
impl CommandHandler for SummarizeCommand {
    async fn execute(&self, ctx: &CommandContext, args: Option<&str>) -> Result<()> {
        let issue = ctx.require_issue()?;
        let content = issue_with_comments(&ctx.github, ctx.registry(), issue, false).await?;
        let summary = summarize_issue(&ctx.services, &content, args).await?;
        ctx.post_comment(&summary).await
    }
}

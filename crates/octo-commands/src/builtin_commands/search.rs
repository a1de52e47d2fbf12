use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::command_context::CommandContext;
use crate::command_registry::CommandHandler;
use crate::comment_render::render_related_issues;
use crate::issue_content::issue_with_comments;

/// `/search`: nearest issues by embedding distance.
pub struct SearchCommand;

#[async_trait]
impl CommandHandler for SearchCommand {
    async fn execute(&self, ctx: &CommandContext, _args: Option<&str>) -> Result<()> {
        let issue = ctx.require_issue()?;
        let index = ctx
            .services
            .issue_index
            .as_ref()
            .ok_or_else(|| anyhow!("issue search is not configured for this deployment"))?;
        let content = issue_with_comments(&ctx.github, ctx.registry(), issue, true).await?;
        let repo = ctx.github.repo();
        let related = index.search(&repo.owner, &repo.name, &content).await?;
        ctx.post_comment(&render_related_issues(issue.number, &related))
            .await
    }
}

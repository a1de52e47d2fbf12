use anyhow::Result;
use async_trait::async_trait;

use crate::command_context::CommandContext;
use crate::command_registry::CommandHandler;
use crate::issue_actions::set_label_to_issue;

/// `/label [instruction]`: runs the labelling action on the current issue.
pub struct LabelCommand;

#[async_trait]
impl CommandHandler for LabelCommand {
    async fn execute(&self, ctx: &CommandContext, args: Option<&str>) -> Result<()> {
        let issue = ctx.require_issue()?;
        set_label_to_issue(&ctx.services, &ctx.github, issue, args).await
    }
}

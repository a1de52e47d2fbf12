use anyhow::{anyhow, Result};
use async_trait::async_trait;
use octo_ai::{CompletionRequest, MultiCompletionRequest, Provider};

use crate::command_context::CommandContext;
use crate::command_registry::CommandHandler;
use crate::comment_render::{clean_markdown_response, format_as_accordion, ANSWER_ACCORDION_TITLE};
use crate::issue_content::{discussion_text, push_readme, readme};
use crate::prompts;

/// `/discuss <instruction>`: every provider answers on the discussion.
pub struct DiscussCommand;

#[async_trait]
impl CommandHandler for DiscussCommand {
    async fn execute(&self, ctx: &CommandContext, args: Option<&str>) -> Result<()> {
        let discussion = ctx
            .discussion()
            .ok_or_else(|| anyhow!("this command is only available on discussions"))?;
        let (thread, readme) = tokio::join!(
            ctx.github.discussion_with_comments(&discussion.node_id),
            readme(&ctx.github, ctx.settings().max_readme_size),
        );
        let lead = match args {
            Some(args) => format!("Propose solutions for the following discussion. {args}"),
            None => "Propose solutions for the following discussion.".to_string(),
        };
        let mut user_prompts = vec![lead, discussion_text(&thread?)];
        push_readme(&mut user_prompts, readme);

        let completions = ctx
            .services
            .backend
            .complete_multi(MultiCompletionRequest {
                request: CompletionRequest::new(prompts::ASK_DISCUSSION, user_prompts),
                providers: Provider::ALL.to_vec(),
            })
            .await?;
        for completion in completions {
            let body = format_as_accordion(
                &clean_markdown_response(&completion.completion),
                ANSWER_ACCORDION_TITLE,
                completion.provider,
            );
            ctx.post_comment(&body).await?;
        }
        Ok(())
    }
}

use anyhow::Result;
use async_trait::async_trait;
use octo_ai::{CompletionRequest, MultiCompletionRequest, Provider};

use crate::command_context::CommandContext;
use crate::command_registry::CommandHandler;
use crate::comment_render::{
    clean_markdown_response, format_as_accordion, ANSWER_ACCORDION_TITLE, QUESTION_USAGE_HINT,
};
use crate::issue_content::{issue_with_comments, push_readme, readme};
use crate::prompts;

/// Issue conversation (bots excluded) and README fetched together.
async fn issue_and_readme(ctx: &CommandContext) -> Result<(String, String)> {
    let issue = ctx.require_issue()?;
    let (content, readme) = tokio::join!(
        issue_with_comments(&ctx.github, ctx.registry(), issue, false),
        readme(&ctx.github, ctx.settings().max_readme_size),
    );
    Ok((content?, readme))
}

/// `/question <text>`: single-provider answer about the current thread.
pub struct QuestionCommand;

#[async_trait]
impl CommandHandler for QuestionCommand {
    async fn execute(&self, ctx: &CommandContext, args: Option<&str>) -> Result<()> {
        let Some(question) = args.filter(|value| !value.trim().is_empty()) else {
            return ctx.post_comment(QUESTION_USAGE_HINT).await;
        };
        let (content, readme) = issue_and_readme(ctx).await?;
        let mut user_prompts = vec![
            question.to_string(),
            format!("The issue or pull request reads as follows.\n----\n{content}\n----"),
        ];
        push_readme(&mut user_prompts, readme);

        let provider = ctx.settings().default_provider;
        let completion = ctx
            .services
            .backend
            .complete(provider, CompletionRequest::new(prompts::GENERAL, user_prompts))
            .await?;
        let answer = clean_markdown_response(&completion);
        ctx.post_comment(&format_as_accordion(&answer, ANSWER_ACCORDION_TITLE, provider))
            .await
    }
}

/// `/consult <text>`: asks every provider for a resolution plan.
pub struct ConsultCommand;

#[async_trait]
impl CommandHandler for ConsultCommand {
    async fn execute(&self, ctx: &CommandContext, args: Option<&str>) -> Result<()> {
        let (content, readme) = issue_and_readme(ctx).await?;
        let lead = match args {
            Some(args) => format!("Propose solutions for the following issue. {args}"),
            None => "Propose solutions for the following issue.".to_string(),
        };
        let mut user_prompts = vec![lead, content];
        push_readme(&mut user_prompts, readme);

        let completions = ctx
            .services
            .backend
            .complete_multi(MultiCompletionRequest {
                request: CompletionRequest::new(prompts::ASK_ISSUE, user_prompts),
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

use anyhow::Result;
use async_trait::async_trait;

use crate::command_context::CommandContext;
use crate::command_registry::{CommandHandler, ContentType};
use crate::comment_render::REVIEW_ERROR_PREFIX;
use crate::issue_content::readme;
use crate::pull_request_review::{
    file_diffs, inline_review_pull_request, post_reviews, pull_request_context,
    review_pull_request, FileDiff, PullRequestContext,
};

struct ReviewInputs {
    number: u64,
    context: PullRequestContext,
    diffs: Vec<FileDiff>,
    readme: String,
}

/// Pull request number when the command runs on one; other threads are skipped.
fn pull_request_number(ctx: &CommandContext, command: &str) -> Option<u64> {
    if ctx.content_type() != ContentType::PullRequest {
        tracing::info!(command, "review skipped outside a pull request");
        return None;
    }
    ctx.issue().map(|issue| issue.number)
}

async fn review_inputs(ctx: &CommandContext, number: u64) -> Result<ReviewInputs> {
    let settings = ctx.settings();
    let (context, diffs, readme) = tokio::join!(
        pull_request_context(&ctx.github, ctx.registry(), number),
        file_diffs(&ctx.github, &settings.pull_request, number),
        readme(&ctx.github, settings.max_readme_size),
    );
    Ok(ReviewInputs {
        number,
        context: context?,
        diffs: diffs?,
        readme,
    })
}

/// Review failures are reported on the pull request and never escalate.
async fn report_review_error(ctx: &CommandContext, error: anyhow::Error) -> Result<()> {
    tracing::warn!(error = %error, "review failed");
    ctx.post_comment(&format!("{REVIEW_ERROR_PREFIX}{error}"))
        .await
}

/// `/review [instruction]`: one overall review comment per provider.
pub struct ReviewCommand;

impl ReviewCommand {
    async fn run(ctx: &CommandContext, number: u64, args: Option<&str>) -> Result<()> {
        let inputs = review_inputs(ctx, number).await?;
        let mut additional = args.unwrap_or_default().to_string();
        if !inputs.readme.is_empty() {
            additional.push_str("\n\nThe README of this repository follows.\n");
            additional.push_str(&inputs.readme);
        }
        let reviews = review_pull_request(
            ctx.services.backend.as_ref(),
            &ctx.settings().pull_request,
            &inputs.context,
            &inputs.diffs,
            &additional,
        )
        .await?;
        post_reviews(&ctx.github, inputs.number, &reviews).await
    }
}

#[async_trait]
impl CommandHandler for ReviewCommand {
    async fn execute(&self, ctx: &CommandContext, args: Option<&str>) -> Result<()> {
        let Some(number) = pull_request_number(ctx, "review") else {
            return Ok(());
        };
        match Self::run(ctx, number, args).await {
            Ok(()) => Ok(()),
            Err(error) => report_review_error(ctx, error).await,
        }
    }
}

/// `/inlineReview [instruction]`: per-file review comments on the diff.
pub struct InlineReviewCommand;

impl InlineReviewCommand {
    async fn run(ctx: &CommandContext, number: u64, args: Option<&str>) -> Result<()> {
        let inputs = review_inputs(ctx, number).await?;
        inline_review_pull_request(
            ctx.services.backend.as_ref(),
            &ctx.github,
            &ctx.settings().pull_request,
            inputs.number,
            &inputs.context,
            &inputs.diffs,
            args,
        )
        .await
    }
}

#[async_trait]
impl CommandHandler for InlineReviewCommand {
    async fn execute(&self, ctx: &CommandContext, args: Option<&str>) -> Result<()> {
        let Some(number) = pull_request_number(ctx, "inlineReview") else {
            return Ok(());
        };
        match Self::run(ctx, number, args).await {
            Ok(()) => Ok(()),
            Err(error) => report_review_error(ctx, error).await,
        }
    }
}

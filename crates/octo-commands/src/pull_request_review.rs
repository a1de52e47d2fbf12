use anyhow::{anyhow, Result};
use futures_util::future::{join_all, try_join_all};
use octo_ai::{CompletionBackend, CompletionRequest, MultiCompletionRequest, Provider};
use octo_github::github_api_client::ReviewCommentRequest;
use octo_github::patch_lines::first_added_line;
use octo_github::GithubApiClient;
use octo_settings::PullRequestSettings;

use crate::command_registry::CommandRegistry;
use crate::comment_render::{
    clean_markdown_response, format_as_accordion, truncate_with_marker, REVIEW_ACCORDION_TITLE,
    REVIEW_TRUNCATION_NOTE,
};
use crate::prompts::{self, InlineReviewPrompt};

const DEFAULT_INLINE_INSTRUCTION: &str = "Please review this file.";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `PullRequestContext` with the conversation around a pull request.
pub struct PullRequestContext {
    pub title: String,
    pub description: String,
    /// Non-command comment bodies in thread order.
    pub comments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `FileDiff` holding one reviewable file of a comparison.
pub struct FileDiff {
    /// Head commit of the comparison; inline comments are anchored to it.
    pub commit_id: String,
    pub filename: String,
    pub diff: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderReview {
    pub provider: Provider,
    pub review: String,
}

pub async fn pull_request_context(
    github: &GithubApiClient,
    registry: &CommandRegistry,
    number: u64,
) -> Result<PullRequestContext> {
    let (pull_request, comments) = tokio::try_join!(
        github.get_pull_request(number),
        github.list_issue_comments(number)
    )?;
    Ok(PullRequestContext {
        title: pull_request.title,
        description: pull_request.body.unwrap_or_default(),
        comments: comments
            .iter()
            .filter(|comment| !registry.is_command_comment(comment.body_text()))
            .map(|comment| comment.body_text().to_string())
            .collect(),
    })
}

/// Reviewable files between the pull request's base and head labels.
///
/// Excluded extensions are dropped first, then the list is capped at
/// `max_file_count`, then only `modified`/`added` files are kept. Patches
/// longer than `max_diff_length` are cut with a truncation marker.
pub async fn file_diffs(
    github: &GithubApiClient,
    settings: &PullRequestSettings,
    number: u64,
) -> Result<Vec<FileDiff>> {
    let pull_request = github.get_pull_request(number).await?;
    let comparison = github
        .compare_commits(&format!(
            "{}...{}",
            pull_request.base.label, pull_request.head.label
        ))
        .await?;
    let Some(files) = comparison.files else {
        tracing::warn!(pull_request = number, "comparison returned no changed files");
        return Ok(Vec::new());
    };
    tracing::debug!(pull_request = number, files = files.len(), "comparison loaded");
    let commit_id = comparison
        .commits
        .last()
        .map(|commit| commit.sha.clone())
        .ok_or_else(|| anyhow!("comparison for pull request #{number} returned no commits"))?;

    Ok(files
        .into_iter()
        .filter(|file| !settings.is_excluded(&file.filename))
        .take(settings.max_file_count)
        .filter(|file| file.status == "modified" || file.status == "added")
        .map(|file| FileDiff {
            commit_id: commit_id.clone(),
            diff: truncate_with_marker(
                file.patch.as_deref().unwrap_or_default(),
                settings.max_diff_length,
            ),
            filename: file.filename,
        })
        .collect())
}

pub fn review_context(
    context: &PullRequestContext,
    diffs: &[FileDiff],
    additional_context: &str,
) -> String {
    let combined_diff = diffs
        .iter()
        .map(|diff| format!("File: {}\n{}", diff.filename, diff.diff))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        "### Title:\n{}\n### Description:\n {}\n### Comments:\n{}\n\n### Diff:\n{combined_diff}\n\n### Additional Context:\n{additional_context}\n",
        context.title,
        context.description,
        context.comments.join("\n"),
    )
    .trim()
    .to_string()
}

/// One review per provider of the combined diff, trimmed to `max_review_size`.
pub async fn review_pull_request(
    backend: &dyn CompletionBackend,
    settings: &PullRequestSettings,
    context: &PullRequestContext,
    diffs: &[FileDiff],
    additional_context: &str,
) -> Result<Vec<ProviderReview>> {
    let full_context = review_context(context, diffs, additional_context);
    let truncated = full_context.chars().count() > settings.max_review_size;
    let user_prompt = truncate_with_marker(&full_context, settings.max_review_size);

    let completions = backend
        .complete_multi(MultiCompletionRequest {
            request: CompletionRequest::new(prompts::REVIEW_PR, vec![user_prompt]),
            providers: Provider::ALL.to_vec(),
        })
        .await?;

    Ok(completions
        .into_iter()
        .map(|completion| {
            let review = clean_markdown_response(&completion.completion);
            ProviderReview {
                provider: completion.provider,
                review: if truncated {
                    format!("{review}\n\n{REVIEW_TRUNCATION_NOTE}")
                } else {
                    review
                },
            }
        })
        .collect())
}

/// Posts each review as an accordion comment, all at once.
pub async fn post_reviews(
    github: &GithubApiClient,
    number: u64,
    reviews: &[ProviderReview],
) -> Result<()> {
    try_join_all(reviews.iter().map(|review| {
        let body = format_as_accordion(&review.review, REVIEW_ACCORDION_TITLE, review.provider);
        async move { github.create_issue_comment(number, &body).await }
    }))
    .await?;
    Ok(())
}

/// Reviews every file separately and posts the results as review comments.
///
/// A failure for one file or one comment is logged and does not stop the
/// others.
pub async fn inline_review_pull_request(
    backend: &dyn CompletionBackend,
    github: &GithubApiClient,
    settings: &PullRequestSettings,
    number: u64,
    context: &PullRequestContext,
    diffs: &[FileDiff],
    instruction: Option<&str>,
) -> Result<()> {
    if diffs.len() > settings.max_file_count {
        anyhow::bail!(
            "Too many files to review: {}. Maximum is {}",
            diffs.len(),
            settings.max_file_count
        );
    }

    let description = format!(
        "Title: {}\nDescription: {}\nComments:\n{}",
        context.title,
        context.description,
        context.comments.join("\n")
    );
    let changed_files = diffs
        .iter()
        .map(|diff| diff.filename.clone())
        .collect::<Vec<_>>();

    join_all(diffs.iter().map(|diff| {
        let description = description.as_str();
        let changed_files = changed_files.as_slice();
        async move {
            if let Err(error) = review_file(
                backend,
                github,
                number,
                diff,
                description,
                changed_files,
                instruction,
            )
            .await
            {
                tracing::warn!(file = %diff.filename, error = %error, "inline review failed for file");
            }
        }
    }))
    .await;
    Ok(())
}

async fn review_file(
    backend: &dyn CompletionBackend,
    github: &GithubApiClient,
    number: u64,
    diff: &FileDiff,
    description: &str,
    changed_files: &[String],
    instruction: Option<&str>,
) -> Result<()> {
    let system_prompt = prompts::inline_review(&InlineReviewPrompt {
        pull_request_description: description,
        patch: &diff.diff,
        reviewing_file: &diff.filename,
        changed_files,
    });
    let user_prompt = format!(
        "{} Filename: {}",
        instruction.unwrap_or(DEFAULT_INLINE_INSTRUCTION),
        diff.filename
    );
    let completions = backend
        .complete_multi(MultiCompletionRequest {
            request: CompletionRequest::new(system_prompt, vec![user_prompt]),
            providers: Provider::ALL.to_vec(),
        })
        .await?;

    let line = first_added_line(&diff.diff);
    join_all(
        completions
            .iter()
            .filter(|completion| !completion.completion.is_empty())
            .map(|completion| {
                let request = ReviewCommentRequest {
                    commit_id: diff.commit_id.clone(),
                    path: diff.filename.clone(),
                    body: clean_markdown_response(&completion.completion),
                    line,
                    subject_type: line.is_none().then(|| "file".to_string()),
                };
                async move {
                    if let Err(error) = github.create_review_comment(number, &request).await {
                        tracing::warn!(
                            file = %request.path,
                            error = %error,
                            "failed to post inline review comment"
                        );
                    }
                }
            }),
    )
    .await;
    Ok(())
}

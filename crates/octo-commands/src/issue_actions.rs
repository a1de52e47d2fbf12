//! Side effects bound to `issues` events. `setLabelToIssue` is also reachable
//! through the `/label` command.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Asia::Tokyo;
use octo_ai::{CompletionRequest, IssueRecord};
use octo_github::webhook_payload::GithubIssue;
use octo_github::GithubApiClient;
use serde::Deserialize;
use serde_json::json;

use crate::command_context::BotServices;
use crate::comment_render::SUMMARY_ERROR_PREFIX;
use crate::issue_content::issue_with_comments;
use crate::prompts;

const SUMMARY_DIRECTORY: &str = "issue-summary";

#[derive(Debug, Deserialize)]
struct LabelSelection {
    labels: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SummaryAnswer {
    summary: String,
}

/// Asks the backend which repository labels fit the issue and applies them.
pub async fn set_label_to_issue(
    services: &BotServices,
    github: &GithubApiClient,
    issue: &GithubIssue,
    args: Option<&str>,
) -> Result<()> {
    if issue.title.is_empty() && issue.body_text().is_empty() {
        tracing::info!(issue = issue.number, "issue has no title or body; skipping labels");
        return Ok(());
    }
    let labels = github.list_labels().await?;
    if labels.is_empty() {
        tracing::info!(issue = issue.number, "repository has no labels");
        return Ok(());
    }

    let available = labels
        .iter()
        .map(|label| {
            format!(
                "[name] {}, [description] {}",
                label.name,
                label.description.as_deref().unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let issue_text = format!("Title: {}\nBody: {}", issue.title, issue.body_text());
    let user_prompt = match args {
        Some(args) => format!("Pick labels from the following. {args}\n\n{issue_text}"),
        None => issue_text,
    };
    let request = CompletionRequest::new(prompts::add_labels(&available), vec![user_prompt])
        .with_response_schema(json!({
            "type": "object",
            "properties": {
                "labels": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Label names to be added to the issue"
                }
            },
            "required": ["labels"]
        }));
    let completion = services
        .backend
        .complete(services.settings.default_provider, request)
        .await?;
    let selection: LabelSelection =
        serde_json::from_str(&completion).context("label selection was not valid json")?;
    if selection.labels.is_empty() {
        tracing::info!(issue = issue.number, "no labels selected");
        return Ok(());
    }
    github.add_labels(issue.number, &selection.labels).await?;
    tracing::info!(issue = issue.number, labels = ?selection.labels, "labels added");
    Ok(())
}

/// `YYYY/MM` of `now` in Asia/Tokyo, the convention for monthly project titles.
pub fn current_month_label(now: DateTime<Utc>) -> String {
    now.with_timezone(&Tokyo).format("%Y/%m").to_string()
}

/// Adds a newly opened issue to the organization project named after the current month.
pub async fn add_to_monthly_project(
    github: &GithubApiClient,
    issue: &GithubIssue,
    organization: Option<&str>,
    now: DateTime<Utc>,
) -> Result<()> {
    let Some(organization) = organization else {
        tracing::info!("repository is not owned by an organization; skipping monthly project");
        return Ok(());
    };
    let projects = github.organization_projects(organization).await?;
    if projects.is_empty() {
        tracing::info!(organization, "organization has no projects");
        return Ok(());
    }
    let month = current_month_label(now);
    let Some(project) = projects.iter().find(|project| project.title.contains(&month)) else {
        tracing::info!(organization, month = %month, "no project for the current month");
        return Ok(());
    };
    let item_id = github.add_project_item(&project.id, &issue.node_id).await?;
    tracing::info!(
        project_id = %project.id,
        project_title = %project.title,
        issue_id = %issue.node_id,
        item_id = %item_id,
        "added issue to monthly project"
    );
    Ok(())
}

pub async fn summarize_issue(
    services: &BotServices,
    issue_content: &str,
    args: Option<&str>,
) -> Result<String> {
    let lead = match args {
        Some(args) => format!("The issue is as follows. {args}"),
        None => "The issue is as follows.".to_string(),
    };
    let request = CompletionRequest::new(
        prompts::SUMMARIZE_ISSUE,
        vec![lead, issue_content.to_string()],
    )
    .with_response_schema(json!({
        "type": "object",
        "properties": {
            "summary": {"type": "string", "description": "Summary of the issue"}
        },
        "required": ["summary"]
    }));
    let completion = services
        .backend
        .complete(services.settings.default_provider, request)
        .await?;
    let answer: SummaryAnswer =
        serde_json::from_str(&completion).context("issue summary was not valid json")?;
    Ok(answer.summary)
}

pub fn summary_archive_path(issue: &GithubIssue) -> String {
    format!("{SUMMARY_DIRECTORY}/{}.md", issue.number)
}

pub fn summary_archive_content(issue: &GithubIssue, summary: &str) -> String {
    [
        format!("# {}", issue.title),
        String::new(),
        summary.to_string(),
        String::new(),
        "## Metadata".to_string(),
        format!("- Issue: #{}", issue.number),
        format!("- Created: {}", issue.created_at),
        format!("- Closed: {}", issue.closed_at.as_deref().unwrap_or_default()),
    ]
    .join("\n")
}

/// Commits the summary under `issue-summary/` when the repository allows it.
pub async fn save_summary_to_repo(
    services: &BotServices,
    github: &GithubApiClient,
    issue: &GithubIssue,
    summary: &str,
) -> Result<()> {
    if !services
        .settings
        .destructive_operations
        .issue_close
        .allow_save_summary
    {
        tracing::info!(issue = issue.number, "saving issue summaries is disabled");
        return Ok(());
    }
    let path = summary_archive_path(issue);
    let existing = github.get_file(&path).await?;
    github
        .put_file(
            &path,
            &format!("Add issue summary for #{}", issue.number),
            &summary_archive_content(issue, summary),
            existing.as_ref().map(|file| file.sha.as_str()),
        )
        .await
}

pub async fn index_issue_summary(
    services: &BotServices,
    github: &GithubApiClient,
    issue: &GithubIssue,
    summary: &str,
) -> Result<()> {
    let Some(index) = &services.issue_index else {
        tracing::debug!(issue = issue.number, "issue index not configured");
        return Ok(());
    };
    let repo = github.repo();
    index
        .upsert(
            &repo.owner,
            &repo.name,
            &IssueRecord {
                number: issue.number,
                title: issue.title.clone(),
                body: summary.to_string(),
            },
        )
        .await?;
    Ok(())
}

/// Summarises a closed issue and fans the summary out to a comment, the
/// repository archive and the issue index.
///
/// Each write may fail on its own; an error is returned only when the
/// summary could not be produced or every write failed. In both cases the
/// failure is also reported on the issue.
pub async fn create_issue_summary(
    services: &BotServices,
    github: &GithubApiClient,
    issue: &GithubIssue,
) -> Result<()> {
    match summarize_and_store(services, github, issue).await {
        Ok(()) => Ok(()),
        Err(error) => {
            let body = format!("{SUMMARY_ERROR_PREFIX}{error}");
            if let Err(report_error) = github.create_issue_comment(issue.number, &body).await {
                tracing::error!(issue = issue.number, error = %report_error, "failed to report summary error");
            }
            Err(error)
        }
    }
}

async fn summarize_and_store(
    services: &BotServices,
    github: &GithubApiClient,
    issue: &GithubIssue,
) -> Result<()> {
    let content = issue_with_comments(github, &services.registry, issue, false).await?;
    let summary = summarize_issue(services, &content, None).await?;

    let (comment, archive, index) = tokio::join!(
        async {
            github
                .create_issue_comment(issue.number, &summary)
                .await
                .map(|_| ())
        },
        save_summary_to_repo(services, github, issue, &summary),
        index_issue_summary(services, github, issue, &summary),
    );
    let results = [("comment", comment), ("archive", archive), ("index", index)];
    for (operation, result) in &results {
        if let Err(error) = result {
            tracing::error!(issue = issue.number, operation, error = %error, "issue summary operation failed");
        }
    }
    if results.iter().all(|(_, result)| result.is_err()) {
        return Err(anyhow!("All operations failed"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use httpmock::prelude::*;
    use octo_settings::BotSettings;
    use serde_json::json;

    use super::{
        add_to_monthly_project, create_issue_summary, current_month_label, set_label_to_issue,
        summary_archive_content,
    };
    use crate::command_context::BotServices;
    use crate::command_registry::CommandRegistry;
    use crate::test_support::{
        github_client, issue, services, settings_with_readme, RecordingIndex, ScriptedBackend,
    };

    fn shared(backend: Arc<ScriptedBackend>, settings: BotSettings) -> BotServices {
        services(backend, CommandRegistry::default(), settings)
    }

    fn mock_labels(server: &MockServer) {
        server.mock(|when, then| {
            when.method(GET).path("/repos/acme/widgets/labels");
            then.status(200).json_body(json!([
                {"name": "bug", "description": "Something is broken"},
                {"name": "docs", "description": null}
            ]));
        });
    }

    #[tokio::test]
    async fn functional_set_label_to_issue_applies_selected_labels() {
        let server = MockServer::start();
        mock_labels(&server);
        let add = server.mock(|when, then| {
            when.method(POST)
                .path("/repos/acme/widgets/issues/5/labels")
                .json_body(json!({"labels": ["bug"]}));
            then.status(200).json_body(json!([{"name": "bug"}]));
        });
        let backend = Arc::new(ScriptedBackend::with_completions(&[r#"{"labels":["bug"]}"#]));

        set_label_to_issue(
            &shared(backend.clone(), settings_with_readme(0)),
            &github_client(&server),
            &issue(5, "Crash", "It crashes", false),
            Some("only bugs"),
        )
        .await
        .expect("labels");

        add.assert_calls(1);
        let (_, request) = &backend.requests()[0];
        assert!(request
            .system_prompt
            .contains("[name] bug, [description] Something is broken\n[name] docs, [description] "));
        assert_eq!(
            request.user_prompts,
            vec!["Pick labels from the following. only bugs\n\nTitle: Crash\nBody: It crashes".to_string()]
        );
    }

    #[tokio::test]
    async fn regression_set_label_to_issue_skips_empty_issue_and_empty_selection() {
        let server = MockServer::start();
        mock_labels(&server);
        let add = server.mock(|when, then| {
            when.method(POST).path("/repos/acme/widgets/issues/5/labels");
            then.status(200).json_body(json!([]));
        });
        let backend = Arc::new(ScriptedBackend::with_completions(&[r#"{"labels":[]}"#]));
        let services = shared(backend.clone(), settings_with_readme(0));
        let github = github_client(&server);

        set_label_to_issue(&services, &github, &issue(5, "", "", false), None)
            .await
            .expect("empty issue");
        assert!(backend.requests().is_empty());

        set_label_to_issue(&services, &github, &issue(5, "Crash", "", false), None)
            .await
            .expect("empty selection");
        assert_eq!(backend.requests()[0].1.user_prompts, vec!["Title: Crash\nBody: ".to_string()]);
        add.assert_calls(0);
    }

    #[test]
    fn unit_current_month_label_uses_tokyo_time() {
        let late_utc = Utc.with_ymd_and_hms(2026, 1, 31, 16, 0, 0).single().expect("time");
        assert_eq!(current_month_label(late_utc), "2026/02");
        let early_utc = Utc.with_ymd_and_hms(2026, 1, 31, 14, 0, 0).single().expect("time");
        assert_eq!(current_month_label(early_utc), "2026/01");
    }

    #[tokio::test]
    async fn functional_add_to_monthly_project_adds_issue_node_to_matching_project() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/graphql").body_includes("projectsV2");
            then.status(200).json_body(json!({"data": {"organization": {"projectsV2": {"nodes": [
                {"id": "P_old", "title": "Sprint 2026/09"},
                {"id": "P_now", "title": "Sprint 2026/10"}
            ]}}}}));
        });
        let add = server.mock(|when, then| {
            when.method(POST)
                .path("/graphql")
                .body_includes("addProjectV2ItemById")
                .body_includes("P_now")
                .body_includes("I_5");
            then.status(200)
                .json_body(json!({"data": {"addProjectV2ItemById": {"item": {"id": "ITEM_1"}}}}));
        });
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 3, 0, 0).single().expect("time");

        add_to_monthly_project(
            &github_client(&server),
            &issue(5, "Crash", "", false),
            Some("acme"),
            now,
        )
        .await
        .expect("project");
        add.assert_calls(1);

        add_to_monthly_project(&github_client(&server), &issue(5, "Crash", "", false), None, now)
            .await
            .expect("user repositories are skipped");
        add.assert_calls(1);
    }

    #[test]
    fn unit_summary_archive_content_includes_metadata() {
        let content = summary_archive_content(&issue(5, "Crash", "", false), "Fixed it.");
        assert_eq!(
            content,
            "# Crash\n\nFixed it.\n\n## Metadata\n- Issue: #5\n- Created: 2026-10-01T00:00:00Z\n- Closed: 2026-10-02T00:00:00Z"
        );
    }

    #[tokio::test]
    async fn functional_create_issue_summary_writes_comment_archive_and_index() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repos/acme/widgets/issues/5/comments");
            then.status(200).json_body(json!([]));
        });
        let comment = server.mock(|when, then| {
            when.method(POST)
                .path("/repos/acme/widgets/issues/5/comments")
                .json_body(json!({"body": "Short summary"}));
            then.status(201).json_body(json!({"id": 1}));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/repos/acme/widgets/contents/issue-summary/5.md");
            then.status(200).json_body(json!({"sha": "old-sha", "content": ""}));
        });
        let archive = server.mock(|when, then| {
            when.method(PUT)
                .path("/repos/acme/widgets/contents/issue-summary/5.md")
                .json_body_includes(json!({"message": "Add issue summary for #5", "sha": "old-sha"}).to_string());
            then.status(200).json_body(json!({"content": {}}));
        });
        let mut settings = settings_with_readme(0);
        settings.destructive_operations.issue_close.allow_save_summary = true;
        let index = Arc::new(RecordingIndex::default());
        let mut services = shared(
            Arc::new(ScriptedBackend::with_completions(&[r#"{"summary":"Short summary"}"#])),
            settings,
        );
        services.issue_index = Some(index.clone());

        create_issue_summary(&services, &github_client(&server), &issue(5, "Crash", "", false))
            .await
            .expect("summary");

        comment.assert_calls(1);
        archive.assert_calls(1);
        let upserts = index.upserts.lock().expect("lock").clone();
        assert_eq!(upserts.len(), 1);
        assert_eq!(upserts[0].body, "Short summary");
    }

    #[tokio::test]
    async fn regression_create_issue_summary_reports_when_every_write_fails() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repos/acme/widgets/issues/5/comments");
            then.status(200).json_body(json!([]));
        });
        let summary_comment = server.mock(|when, then| {
            when.method(POST)
                .path("/repos/acme/widgets/issues/5/comments")
                .json_body(json!({"body": "Short summary"}));
            then.status(500).body("down");
        });
        let failure_comment = server.mock(|when, then| {
            when.method(POST)
                .path("/repos/acme/widgets/issues/5/comments")
                .body_includes("Failed to summarize the issue: All operations failed");
            then.status(201).json_body(json!({"id": 2}));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/repos/acme/widgets/contents/issue-summary/5.md");
            then.status(500).body("down");
        });
        let mut settings = settings_with_readme(0);
        settings.destructive_operations.issue_close.allow_save_summary = true;
        let mut services = shared(
            Arc::new(ScriptedBackend::with_completions(&[r#"{"summary":"Short summary"}"#])),
            settings,
        );
        services.issue_index = Some(Arc::new(RecordingIndex {
            fail_upsert: true,
            ..RecordingIndex::default()
        }));

        let error = create_issue_summary(&services, &github_client(&server), &issue(5, "Crash", "", false))
            .await
            .expect_err("all failed");

        assert_eq!(error.to_string(), "All operations failed");
        summary_comment.assert_calls(1);
        failure_comment.assert_calls(1);
    }

    #[tokio::test]
    async fn regression_create_issue_summary_tolerates_partial_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repos/acme/widgets/issues/5/comments");
            then.status(200).json_body(json!([]));
        });
        let comment = server.mock(|when, then| {
            when.method(POST).path("/repos/acme/widgets/issues/5/comments");
            then.status(201).json_body(json!({"id": 1}));
        });
        let mut services = shared(
            Arc::new(ScriptedBackend::with_completions(&[r#"{"summary":"Short summary"}"#])),
            settings_with_readme(0),
        );
        services.issue_index = Some(Arc::new(RecordingIndex {
            fail_upsert: true,
            ..RecordingIndex::default()
        }));

        create_issue_summary(&services, &github_client(&server), &issue(5, "Crash", "", false))
            .await
            .expect("comment succeeded");
        comment.assert_calls(1);
    }
}

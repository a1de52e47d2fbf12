use octo_ai::Provider;

use crate::command_registry::CommandDefinition;

pub const COMMAND_ERROR_PREFIX: &str = "An error occurred while running the command: ";
pub const REVIEW_ERROR_PREFIX: &str = "An error occurred while running the review: ";
pub const SUMMARY_ERROR_PREFIX: &str = "Failed to summarize the issue: ";
pub const NO_SUITABLE_COMMAND: &str = "No suitable command was available.";
pub const AGENT_RESPONSE_ERROR: &str = "An error occurred.";
pub const ACT_USAGE_HINT: &str =
    "No instruction was given. Run it like this: `/act <instruction>`";
pub const QUESTION_USAGE_HINT: &str = "Please write your question after the command.";
pub const NO_RELATED_ISSUES: &str = "No related issues were found.";
pub const ANSWER_ACCORDION_TITLE: &str = "💡 Show answer";
pub const REVIEW_ACCORDION_TITLE: &str = "💡 Show review";
pub const REVIEW_TRUNCATION_NOTE: &str =
    "> ⚠️ Note: the diff was large, so part of it was cut before reviewing.";
const TRUNCATED_SUFFIX: &str = "... (truncated)";

/// Wraps `body` in a collapsed `<details>` block tagged with the provider.
pub fn format_as_accordion(body: &str, title: &str, provider: Provider) -> String {
    format!(
        "<details>\n<summary>{title}</summary>\n\n{body}\n\n</details>\n\n> Answered by *{}*",
        provider_display_name(provider)
    )
}

fn provider_display_name(provider: Provider) -> &'static str {
    match provider {
        Provider::OpenAi => "OpenAI",
        Provider::Gemini => "Gemini",
    }
}

/// Strips a leading ```` ```markdown ```` or ```` ``` ```` fence and a trailing
/// fence, keeping fenced code inside the answer.
pub fn clean_markdown_response(text: &str) -> String {
    let without_leading = text
        .strip_prefix("```markdown\n")
        .or_else(|| text.strip_prefix("```\n"))
        .unwrap_or(text);
    let trimmed_end = without_leading.trim_end();
    let without_trailing = trimmed_end.strip_suffix("```").unwrap_or(without_leading);
    without_trailing.trim().to_string()
}

/// Char-boundary safe prefix; appends `suffix` only when something was cut.
pub fn truncate_chars(text: &str, max_chars: usize, suffix: &str) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{suffix}", &text[..cut]),
        None => text.to_string(),
    }
}

pub fn truncate_with_marker(text: &str, max_chars: usize) -> String {
    truncate_chars(text, max_chars, TRUNCATED_SUFFIX)
}

pub fn command_error_message(error: &anyhow::Error) -> String {
    format!("{COMMAND_ERROR_PREFIX}{error}")
}

/// Markdown table of enabled commands shown by `/howto`.
pub fn render_howto(commands: &[CommandDefinition]) -> String {
    let rows = commands
        .iter()
        .map(|command| {
            let args = command
                .args
                .as_ref()
                .map(|args| args.description)
                .unwrap_or(" - ");
            let available = command
                .content_types
                .iter()
                .map(|content_type| content_type.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "| {} | {} | {args} | {available} |",
                command.name, command.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "## 📖 Commands\n\n| command | description | arguments | available |\n|---|---|---|---|\n{rows}\n\n> [!TIP]\n> Add a space after a command and pass an argument to give more detailed instructions.\n> (e.g.) `/act summarize this issue`"
    )
}

pub fn render_related_issues(current_issue: u64, related: &[octo_ai::RankedIssue]) -> String {
    if related.is_empty() {
        return NO_RELATED_ISSUES.to_string();
    }
    let lines = related
        .iter()
        .filter(|issue| issue.number != current_issue)
        .map(|issue| format!("- #{} (distance: {})", issue.number, issue.distance))
        .collect::<Vec<_>>()
        .join("\n");
    format!("# Related issues\n{lines}")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use octo_ai::{Provider, RankedIssue};

    use super::{
        clean_markdown_response, format_as_accordion, render_howto, render_related_issues,
        truncate_with_marker, NO_RELATED_ISSUES,
    };
    use crate::command_registry::{CommandArgs, ContentType};
    use crate::test_support::{definition, RecordingHandler};

    #[test]
    fn unit_clean_markdown_response_strips_outer_fences_only() {
        assert_eq!(clean_markdown_response("```markdown\n*yes*\n```"), "*yes*");
        assert_eq!(clean_markdown_response("```\nplain\n```  "), "plain");
        assert_eq!(
            clean_markdown_response("intro\n```rust\nfn main() {}\n```\noutro"),
            "intro\n```rust\nfn main() {}\n```\noutro"
        );
        assert_eq!(clean_markdown_response("  answer  "), "answer");
    }

    #[test]
    fn unit_truncate_with_marker_is_char_boundary_safe() {
        assert_eq!(truncate_with_marker("héllo", 2), "hé... (truncated)");
        assert_eq!(truncate_with_marker("short", 10), "short");
        assert_eq!(truncate_with_marker("exact", 5), "exact");
    }

    #[test]
    fn functional_format_as_accordion_names_title_and_provider() {
        let body = format_as_accordion("answer", "💡 Show answer", Provider::Gemini);
        assert!(body.starts_with("<details>\n<summary>💡 Show answer</summary>"));
        assert!(body.contains("\n\nanswer\n\n</details>"));
        assert!(body.ends_with("*Gemini*"));
    }

    #[test]
    fn functional_render_howto_lists_every_command_as_table_row() {
        let handler = Arc::new(RecordingHandler::default());
        let mut act = definition(
            "act",
            &[ContentType::Issue, ContentType::PullRequest, ContentType::Discussion],
            handler.clone(),
        );
        act.args = Some(CommandArgs {
            kind: "string",
            description: "instruction for the assistant",
            optional: false,
        });
        let howto = definition("howto", &[ContentType::Issue], handler);

        let rendered = render_howto(&[act, howto]);
        assert!(rendered.contains("| command | description | arguments | available |"));
        assert!(rendered.contains(
            "| act | act command | instruction for the assistant | issue, pull_request, discussion |"
        ));
        assert!(rendered.contains("| howto | howto command |  -  | issue |"));
        assert!(rendered.contains("[!TIP]"));
    }

    #[test]
    fn regression_render_related_issues_skips_current_issue() {
        assert_eq!(render_related_issues(3, &[]), NO_RELATED_ISSUES);
        let rendered = render_related_issues(
            3,
            &[
                RankedIssue {
                    number: 3,
                    title: "self".to_string(),
                    distance: 0.0,
                },
                RankedIssue {
                    number: 8,
                    title: "other".to_string(),
                    distance: 0.25,
                },
            ],
        );
        assert_eq!(rendered, "# Related issues\n- #8 (distance: 0.25)");
    }
}

use anyhow::Result;

use crate::command_context::CommandContext;
use crate::command_parser::parse_command;
use crate::command_registry::CommandDefinition;
use crate::comment_render::command_error_message;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Enumerates supported `CommentDispatchOutcome` values.
pub enum CommentDispatchOutcome {
    IgnoredBotAuthor,
    NotACommand,
    /// `/token` parsed but no enabled command for this content type matched.
    NoMatchingCommand { command: String },
    Executed { command: String, trigger_deleted: bool },
    /// The failure was reported on the thread; the trigger was kept.
    Failed { command: String, error: String },
}

/// Runs the slash command carried by the comment in `ctx`, if any.
///
/// Sequence: acknowledge with a reaction, run the handler, then delete the
/// trigger for self-deleting commands. Any failure in that sequence is
/// reported once on the same thread and never propagates.
pub async fn dispatch_comment(ctx: &CommandContext) -> CommentDispatchOutcome {
    let comment = ctx.comment();
    if comment.user.is_bot() {
        tracing::debug!(author = %comment.user.login, "ignoring comment from bot author");
        return CommentDispatchOutcome::IgnoredBotAuthor;
    }
    let Some(parsed) = parse_command(comment.body_text()) else {
        return CommentDispatchOutcome::NotACommand;
    };

    let content_type = ctx.content_type();
    let Some(command) = ctx.registry().find_for_comment(content_type, parsed.command) else {
        tracing::debug!(
            command = parsed.command,
            content_type = %content_type,
            "no enabled command matches"
        );
        return CommentDispatchOutcome::NoMatchingCommand {
            command: parsed.command.to_string(),
        };
    };

    tracing::info!(command = %command.name, content_type = %content_type, "running command");
    match run_command(ctx, command, parsed.args).await {
        Ok(trigger_deleted) => {
            tracing::info!(command = %command.name, trigger_deleted, "command finished");
            CommentDispatchOutcome::Executed {
                command: command.name.clone(),
                trigger_deleted,
            }
        }
        Err(error) => {
            tracing::warn!(command = %command.name, error = %error, "command failed");
            if let Err(report_error) = ctx.post_comment(&command_error_message(&error)).await {
                tracing::error!(
                    command = %command.name,
                    error = %report_error,
                    "failed to report command error"
                );
            }
            CommentDispatchOutcome::Failed {
                command: command.name.clone(),
                error: error.to_string(),
            }
        }
    }
}

async fn run_command(
    ctx: &CommandContext,
    command: &CommandDefinition,
    args: Option<&str>,
) -> Result<bool> {
    ctx.acknowledge().await?;
    command.handler.execute(ctx, args).await?;
    if !command.remove_trigger {
        return Ok(false);
    }
    ctx.delete_trigger().await?;
    Ok(true)
}

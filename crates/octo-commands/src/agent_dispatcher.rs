use anyhow::Result;
use async_trait::async_trait;
use octo_ai::CompletionRequest;
use serde_json::{json, Value};

use crate::command_context::CommandContext;
use crate::command_registry::{CommandDefinition, CommandHandler, CommandName, CommandRegistry};
use crate::comment_render::{ACT_USAGE_HINT, AGENT_RESPONSE_ERROR, NO_SUITABLE_COMMAND};
use crate::issue_content::current_context;
use crate::prompts;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Public struct `AgentDecision` parsed from the backend's JSON answer.
pub struct AgentDecision {
    pub command: Option<String>,
    pub args: Option<String>,
    pub reply: Option<String>,
}

impl AgentDecision {
    /// Reads the string fields of any JSON value. Fields of another type, or a
    /// value that is not an object, leave the matching field empty.
    pub fn from_value(value: &Value) -> Self {
        let field = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .map(ToOwned::to_owned)
        };
        Self {
            command: field("command"),
            args: field("args"),
            reply: field("reply"),
        }
    }
}

pub fn decision_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "command": {"type": "string", "description": "Name of the command to run."},
            "args": {"type": "string", "description": "Argument passed to the command."},
            "reply": {"type": "string", "description": "Message shown to the user."}
        },
        "required": ["reply"]
    })
}

/// The command the backend picked, when it is enabled and may be chosen by
/// the agent. Names are matched exactly against the whole registry.
pub fn resolve_decision<'a>(
    registry: &'a CommandRegistry,
    decision: &AgentDecision,
) -> Option<&'a CommandDefinition> {
    let name = decision
        .command
        .as_deref()
        .filter(|name| !name.is_empty())?;
    registry
        .find_by_name(name)
        .filter(|command| command.llm_callable)
}

/// `/act <instruction>`: lets the backend choose which command serves the request.
pub struct ActCommand;

#[async_trait]
impl CommandHandler for ActCommand {
    async fn execute(&self, ctx: &CommandContext, args: Option<&str>) -> Result<()> {
        let Some(instruction) = args.filter(|value| !value.trim().is_empty()) else {
            return ctx.post_comment(ACT_USAGE_HINT).await;
        };

        let current = current_context(ctx).await?;
        let repo_context = format!("Title: {}\nBody: {}", current.title, current.body);
        let catalog = ctx.registry().llm_catalog(current.content_type);
        let repo = ctx.github.repo();
        let system_prompt = prompts::act(
            current.content_type,
            &catalog,
            &repo.owner,
            &repo.name,
            &repo_context,
        );
        let request = CompletionRequest::new(system_prompt, vec![instruction.to_string()])
            .with_response_schema(decision_schema());
        let completion = ctx
            .services
            .backend
            .complete(ctx.settings().default_provider, request)
            .await?;

        let decision = match serde_json::from_str::<Value>(&completion) {
            Ok(value) => AgentDecision::from_value(&value),
            Err(error) => {
                tracing::warn!(error = %error, "agent decision was not valid json");
                return ctx.post_comment(AGENT_RESPONSE_ERROR).await;
            }
        };

        let Some(command) = resolve_decision(ctx.registry(), &decision) else {
            tracing::info!(choice = ?decision.command, "agent chose no runnable command");
            return reply_with_no_command(ctx).await;
        };

        tracing::info!(command = %command.name, "agent delegating to command");
        if let Some(reply) = decision.reply.as_deref().filter(|reply| !reply.is_empty()) {
            ctx.post_comment(reply).await?;
        }
        let augmented = prompts::augment_instruction(instruction, decision.args.as_deref());
        command.handler.execute(ctx, Some(&augmented)).await
    }
}

async fn reply_with_no_command(ctx: &CommandContext) -> Result<()> {
    ctx.post_comment(NO_SUITABLE_COMMAND).await?;
    if let Some(howto) = ctx.registry().find_by_name(CommandName::Howto.as_str()) {
        howto.handler.execute(ctx, None).await?;
    }
    Ok(())
}

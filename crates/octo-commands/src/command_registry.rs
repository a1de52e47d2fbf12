use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::command_context::CommandContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Enumerates supported `ContentType` values.
pub enum ContentType {
    Issue,
    PullRequest,
    Discussion,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::PullRequest => "pull_request",
            Self::Discussion => "discussion",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Enumerates the built-in command names.
pub enum CommandName {
    Act,
    Question,
    Summarize,
    Consult,
    Format,
    Label,
    Create,
    Review,
    InlineReview,
    Discuss,
    Howto,
    Search,
}

impl CommandName {
    pub const ALL: [CommandName; 12] = [
        CommandName::Act,
        CommandName::Question,
        CommandName::Summarize,
        CommandName::Consult,
        CommandName::Format,
        CommandName::Label,
        CommandName::Create,
        CommandName::Review,
        CommandName::InlineReview,
        CommandName::Discuss,
        CommandName::Howto,
        CommandName::Search,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Act => "act",
            Self::Question => "question",
            Self::Summarize => "summarize",
            Self::Consult => "consult",
            Self::Format => "format",
            Self::Label => "label",
            Self::Create => "create",
            Self::Review => "review",
            Self::InlineReview => "inlineReview",
            Self::Discuss => "discuss",
            Self::Howto => "howto",
            Self::Search => "search",
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|name| name.as_str() == raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Argument contract shown to users and to the agent dispatcher.
pub struct CommandArgs {
    pub kind: &'static str,
    pub description: &'static str,
    pub optional: bool,
}

#[async_trait]
/// Trait contract for `CommandHandler` behavior.
pub trait CommandHandler: Send + Sync {
    async fn execute(&self, ctx: &CommandContext, args: Option<&str>) -> anyhow::Result<()>;
}

#[derive(Clone)]
/// Public struct `CommandDefinition` describing one registered command.
pub struct CommandDefinition {
    pub name: String,
    pub description: String,
    pub content_types: Vec<ContentType>,
    pub args: Option<CommandArgs>,
    /// `false` keeps the agent dispatcher from selecting this command.
    pub llm_callable: bool,
    /// Delete the triggering comment after a successful run.
    pub remove_trigger: bool,
    pub handler: Arc<dyn CommandHandler>,
}

impl fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("name", &self.name)
            .field("content_types", &self.content_types)
            .field("llm_callable", &self.llm_callable)
            .field("remove_trigger", &self.remove_trigger)
            .finish_non_exhaustive()
    }
}

impl CommandDefinition {
    pub fn supports(&self, content_type: ContentType) -> bool {
        self.content_types.contains(&content_type)
    }

    /// Case-insensitive prefix match of `/name` against `text`.
    pub fn matches(&self, text: &str) -> bool {
        let trigger = format!("/{}", self.name);
        text.get(..trigger.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(&trigger))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
/// Enumerates supported `RegistryError` values.
pub enum RegistryError {
    #[error("enabled command '{0}' is not a known command")]
    UnknownCommand(String),
    #[error("command name '{0}' is registered more than once")]
    DuplicateName(String),
    #[error("commands '{first}' and '{second}' both match the same trigger for {content_type}")]
    AmbiguousTrigger {
        first: String,
        second: String,
        content_type: ContentType,
    },
    #[error("command name '{0}' must be non-empty ASCII letters, digits or underscores")]
    InvalidName(String),
}

#[derive(Debug, Clone, Default)]
/// Ordered set of enabled commands. Matching is first-match-wins in this order.
pub struct CommandRegistry {
    commands: Vec<CommandDefinition>,
}

impl CommandRegistry {
    /// Builds a registry, rejecting names that could not be typed as a
    /// command and pairs whose triggers overlap within a content type.
    pub fn new(commands: Vec<CommandDefinition>) -> Result<Self, RegistryError> {
        for (index, command) in commands.iter().enumerate() {
            if command.name.is_empty()
                || !command
                    .name
                    .chars()
                    .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
            {
                return Err(RegistryError::InvalidName(command.name.clone()));
            }
            for other in &commands[..index] {
                if other.name == command.name {
                    return Err(RegistryError::DuplicateName(command.name.clone()));
                }
                let shared = command
                    .content_types
                    .iter()
                    .find(|content_type| other.supports(**content_type));
                let overlapping = other.matches(&format!("/{}", command.name))
                    || command.matches(&format!("/{}", other.name));
                if let (Some(content_type), true) = (shared, overlapping) {
                    return Err(RegistryError::AmbiguousTrigger {
                        first: other.name.clone(),
                        second: command.name.clone(),
                        content_type: *content_type,
                    });
                }
            }
        }
        Ok(Self { commands })
    }

    /// Keeps the commands of `all` named in `enabled`, in `all`'s order.
    pub fn from_enabled(
        all: Vec<CommandDefinition>,
        enabled: &[String],
    ) -> Result<Self, RegistryError> {
        if let Some(unknown) = enabled
            .iter()
            .find(|name| !all.iter().any(|command| &command.name == *name))
        {
            return Err(RegistryError::UnknownCommand(unknown.clone()));
        }
        let selected = all
            .into_iter()
            .filter(|command| enabled.contains(&command.name))
            .collect();
        Self::new(selected)
    }

    pub fn commands(&self) -> &[CommandDefinition] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// First enabled command for `content_type` whose trigger matches `/token`.
    pub fn find_for_comment(
        &self,
        content_type: ContentType,
        token: &str,
    ) -> Option<&CommandDefinition> {
        let candidate = format!("/{token}");
        self.commands
            .iter()
            .find(|command| command.supports(content_type) && command.matches(&candidate))
    }

    /// Exact-name lookup across every enabled command, ignoring content type.
    pub fn find_by_name(&self, name: &str) -> Option<&CommandDefinition> {
        self.commands.iter().find(|command| command.name == name)
    }

    /// Commands the agent dispatcher may offer for `content_type`.
    pub fn llm_catalog(&self, content_type: ContentType) -> Vec<&CommandDefinition> {
        self.commands
            .iter()
            .filter(|command| command.name != CommandName::Act.as_str())
            .filter(|command| command.llm_callable)
            .filter(|command| command.supports(content_type))
            .collect()
    }

    /// True when a comment body starts with any enabled trigger.
    pub fn is_command_comment(&self, body: &str) -> bool {
        !body.is_empty() && self.commands.iter().any(|command| command.matches(body))
    }
}

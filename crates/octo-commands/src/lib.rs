//! Slash-command engine for OctoThink.
//! Comments such as `/label bugs only` are parsed, matched against the
//! enabled command registry for the comment's content type, acknowledged,
//! executed and optionally removed. The `act` command lets the completion
//! backend pick another command on the user's behalf.

pub mod agent_dispatcher;
pub mod builtin_commands;
pub mod command_context;
pub mod command_parser;
pub mod command_registry;
pub mod comment_dispatcher;
pub mod comment_render;
pub mod issue_actions;
pub mod issue_content;
pub mod prompts;
pub mod pull_request_review;

#[cfg(test)]
pub(crate) mod test_support;

pub use builtin_commands::{builtin_commands, builtin_registry};
pub use command_context::{BotServices, CommandContext, CommentSubject};
pub use command_parser::{parse_command, ParsedCommand};
pub use command_registry::{
    CommandArgs, CommandDefinition, CommandHandler, CommandName, CommandRegistry, ContentType,
    RegistryError,
};
pub use comment_dispatcher::{dispatch_comment, CommentDispatchOutcome};

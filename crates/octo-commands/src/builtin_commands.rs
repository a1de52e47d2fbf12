//! The commands shipped with OctoThink, in registry order.

mod create;
mod discuss;
mod format;
mod howto;
mod label;
mod question;
mod review;
mod search;
mod summarize;

use std::sync::Arc;

use crate::agent_dispatcher::ActCommand;
use crate::command_registry::{
    CommandArgs, CommandDefinition, CommandHandler, CommandName, CommandRegistry, ContentType,
    RegistryError,
};

pub use create::CreateCommand;
pub use discuss::DiscussCommand;
pub use format::FormatCommand;
pub use howto::HowtoCommand;
pub use label::LabelCommand;
pub use question::{ConsultCommand, QuestionCommand};
pub use review::{InlineReviewCommand, ReviewCommand};
pub use search::SearchCommand;
pub use summarize::SummarizeCommand;

const ADDITIONAL_INSTRUCTION: &str = "Additional instruction for the AI, used when answering.";
const REVIEW_INSTRUCTION: &str =
    "Additional instruction for the AI. Give extra information or requests about the pull request.";

const ISSUE: &[ContentType] = &[ContentType::Issue];
const ISSUE_AND_PULL_REQUEST: &[ContentType] = &[ContentType::Issue, ContentType::PullRequest];
const PULL_REQUEST: &[ContentType] = &[ContentType::PullRequest];
const DISCUSSION: &[ContentType] = &[ContentType::Discussion];
const EVERYWHERE: &[ContentType] = &[
    ContentType::Issue,
    ContentType::PullRequest,
    ContentType::Discussion,
];

fn string_args(description: &'static str, optional: bool) -> Option<CommandArgs> {
    Some(CommandArgs {
        kind: "string",
        description,
        optional,
    })
}

struct Spec {
    name: CommandName,
    description: &'static str,
    content_types: &'static [ContentType],
    args: Option<CommandArgs>,
    llm_callable: bool,
    remove_trigger: bool,
    handler: Arc<dyn CommandHandler>,
}

impl From<Spec> for CommandDefinition {
    fn from(spec: Spec) -> Self {
        CommandDefinition {
            name: spec.name.as_str().to_string(),
            description: spec.description.to_string(),
            content_types: spec.content_types.to_vec(),
            args: spec.args,
            llm_callable: spec.llm_callable,
            remove_trigger: spec.remove_trigger,
            handler: spec.handler,
        }
    }
}

/// Every built-in command. Order decides first-match-wins dispatch.
pub fn builtin_commands() -> Vec<CommandDefinition> {
    let specs = vec![
        Spec {
            name: CommandName::Act,
            description: "Let the AI choose a command and run it.",
            content_types: EVERYWHERE,
            args: string_args(
                "Instruction for the AI. It is used to pick the command.",
                false,
            ),
            llm_callable: false,
            remove_trigger: false,
            handler: Arc::new(ActCommand),
        },
        Spec {
            name: CommandName::Question,
            description:
                "Ask the AI a general question or request about the current issue or pull request.",
            content_types: ISSUE_AND_PULL_REQUEST,
            args: string_args("The question for the AI.", false),
            llm_callable: true,
            remove_trigger: false,
            handler: Arc::new(QuestionCommand),
        },
        Spec {
            name: CommandName::Summarize,
            description: "Summarize the issue.",
            content_types: ISSUE,
            args: string_args(ADDITIONAL_INSTRUCTION, true),
            llm_callable: false,
            remove_trigger: true,
            handler: Arc::new(SummarizeCommand),
        },
        Spec {
            name: CommandName::Consult,
            description: "Consult several AIs on how to handle the issue. Suited to more detailed answers than question.",
            content_types: ISSUE,
            args: string_args("What to consult the AI about.", false),
            llm_callable: true,
            remove_trigger: true,
            handler: Arc::new(ConsultCommand),
        },
        Spec {
            name: CommandName::Format,
            description: "Rewrite the issue description based on the conversation.",
            content_types: ISSUE,
            args: string_args(ADDITIONAL_INSTRUCTION, true),
            llm_callable: true,
            remove_trigger: true,
            handler: Arc::new(FormatCommand),
        },
        Spec {
            name: CommandName::Label,
            description: "Add labels to the issue.",
            content_types: ISSUE_AND_PULL_REQUEST,
            args: string_args(ADDITIONAL_INSTRUCTION, true),
            llm_callable: true,
            remove_trigger: true,
            handler: Arc::new(LabelCommand),
        },
        Spec {
            name: CommandName::Create,
            description: "Create a new issue from the content of this issue.",
            content_types: ISSUE,
            args: string_args(
                "Instruction for the AI about the format or content of the new issue.",
                false,
            ),
            llm_callable: true,
            remove_trigger: true,
            handler: Arc::new(CreateCommand),
        },
        Spec {
            name: CommandName::Review,
            description: "Review the pull request.",
            content_types: PULL_REQUEST,
            args: string_args(REVIEW_INSTRUCTION, true),
            llm_callable: true,
            remove_trigger: true,
            handler: Arc::new(ReviewCommand),
        },
        Spec {
            name: CommandName::InlineReview,
            description: "Review the pull request file by file with inline comments.",
            content_types: PULL_REQUEST,
            args: string_args(REVIEW_INSTRUCTION, true),
            llm_callable: true,
            remove_trigger: true,
            handler: Arc::new(InlineReviewCommand),
        },
        Spec {
            name: CommandName::Discuss,
            description: "Ask the AI about the discussion.",
            content_types: DISCUSSION,
            args: string_args(
                "Additional instruction for the AI. Give extra information or requests about the discussion.",
                false,
            ),
            llm_callable: true,
            remove_trigger: true,
            handler: Arc::new(DiscussCommand),
        },
        Spec {
            name: CommandName::Howto,
            description: "Show how to use the commands.",
            content_types: EVERYWHERE,
            args: None,
            llm_callable: true,
            remove_trigger: false,
            handler: Arc::new(HowtoCommand),
        },
        Spec {
            name: CommandName::Search,
            description: "Search for related issues.",
            content_types: ISSUE,
            args: None,
            llm_callable: true,
            remove_trigger: true,
            handler: Arc::new(SearchCommand),
        },
    ];
    specs.into_iter().map(CommandDefinition::from).collect()
}

/// Registry of the built-in commands named in `enabled`.
pub fn builtin_registry(enabled: &[String]) -> Result<CommandRegistry, RegistryError> {
    CommandRegistry::from_enabled(builtin_commands(), enabled)
}

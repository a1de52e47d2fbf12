use std::sync::Arc;

use async_trait::async_trait;
use octo_ai::{
    CompletionBackend, CompletionRequest, MultiCompletionRequest, OctoAiError, Provider,
    ProviderCompletion,
};
use octo_commands::{builtin_registry, BotServices};
use octo_settings::BotSettings;
use serde_json::json;

/// Backend that is never expected to be reached.
pub(crate) struct UnreachableBackend;

#[async_trait]
impl CompletionBackend for UnreachableBackend {
    async fn complete(
        &self,
        _provider: Provider,
        _request: CompletionRequest,
    ) -> Result<String, OctoAiError> {
        Err(OctoAiError::InvalidResponse("backend not available in tests".to_string()))
    }

    async fn complete_multi(
        &self,
        _request: MultiCompletionRequest,
    ) -> Result<Vec<ProviderCompletion>, OctoAiError> {
        Err(OctoAiError::InvalidResponse("backend not available in tests".to_string()))
    }
}

pub(crate) fn bot_services(enabled: &[&str]) -> BotServices {
    let enabled = enabled
        .iter()
        .map(|name| name.to_string())
        .collect::<Vec<_>>();
    let mut settings = BotSettings::with_provider(Provider::OpenAi);
    settings.max_readme_size = 0;
    settings.enabled_commands = enabled.clone();
    BotServices {
        backend: Arc::new(UnreachableBackend),
        issue_index: None,
        settings: Arc::new(settings),
        registry: Arc::new(builtin_registry(&enabled).expect("registry")),
    }
}

fn repository() -> serde_json::Value {
    json!({"name": "widgets", "owner": {"login": "acme", "id": 2, "type": "Organization"}})
}

fn issue() -> serde_json::Value {
    json!({
        "id": 120,
        "node_id": "I_12",
        "number": 12,
        "title": "Crash on start",
        "body": "It crashes",
        "html_url": "https://github.com/acme/widgets/issues/12",
        "user": {"login": "alice", "id": 5, "type": "User"}
    })
}

pub(crate) fn issue_comment_body(comment: &str, login: &str, kind: &str) -> String {
    json!({
        "action": "created",
        "issue": issue(),
        "comment": {
            "id": 301,
            "node_id": "IC_301",
            "body": comment,
            "user": {"login": login, "id": 5, "type": kind}
        },
        "repository": repository(),
        "organization": {"login": "acme"},
        "sender": {"login": login, "id": 5, "type": kind},
        "installation": {"id": 777}
    })
    .to_string()
}

pub(crate) fn issues_body(action: &str, login: &str, kind: &str) -> String {
    json!({
        "action": action,
        "issue": issue(),
        "repository": repository(),
        "organization": {"login": "acme"},
        "sender": {"login": login, "id": 5, "type": kind},
        "installation": {"id": 777}
    })
    .to_string()
}

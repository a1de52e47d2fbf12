use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use httpmock::MockServer;
use octo_ai::{
    CompletionBackend, CompletionRequest, IssueIndex, IssueRecord, MultiCompletionRequest,
    OctoAiError, Provider, ProviderCompletion, RankedIssue,
};
use octo_github::webhook_payload::{GithubComment, GithubDiscussion, GithubIssue, GithubUser};
use octo_github::{GithubApiClient, GithubApiConfig, RepoRef};
use octo_settings::BotSettings;

use crate::command_context::{BotServices, CommandContext, CommentSubject};
use crate::command_registry::{CommandDefinition, CommandHandler, CommandRegistry, ContentType};

#[derive(Default)]
pub(crate) struct ScriptedBackend {
    completions: Mutex<VecDeque<Result<String, String>>>,
    multi: Mutex<VecDeque<Vec<ProviderCompletion>>>,
    requests: Mutex<Vec<(Provider, CompletionRequest)>>,
    multi_requests: Mutex<Vec<MultiCompletionRequest>>,
}

impl ScriptedBackend {
    pub(crate) fn with_completions(completions: &[&str]) -> Self {
        let backend = Self::default();
        for completion in completions {
            backend.push_completion(completion);
        }
        backend
    }

    pub(crate) fn push_completion(&self, completion: &str) {
        self.completions
            .lock()
            .expect("lock")
            .push_back(Ok(completion.to_string()));
    }

    pub(crate) fn push_failure(&self, message: &str) {
        self.completions
            .lock()
            .expect("lock")
            .push_back(Err(message.to_string()));
    }

    pub(crate) fn push_multi(&self, completions: &[(Provider, &str)]) {
        self.multi.lock().expect("lock").push_back(
            completions
                .iter()
                .map(|(provider, completion)| ProviderCompletion {
                    provider: *provider,
                    completion: completion.to_string(),
                })
                .collect(),
        );
    }

    pub(crate) fn requests(&self) -> Vec<(Provider, CompletionRequest)> {
        self.requests.lock().expect("lock").clone()
    }

    pub(crate) fn multi_requests(&self) -> Vec<MultiCompletionRequest> {
        self.multi_requests.lock().expect("lock").clone()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(
        &self,
        provider: Provider,
        request: CompletionRequest,
    ) -> Result<String, OctoAiError> {
        self.requests
            .lock()
            .expect("lock")
            .push((provider, request));
        match self.completions.lock().expect("lock").pop_front() {
            Some(Ok(completion)) => Ok(completion),
            Some(Err(message)) => Err(OctoAiError::InvalidResponse(message)),
            None => Err(OctoAiError::InvalidResponse(
                "scripted backend has no completion queued".to_string(),
            )),
        }
    }

    async fn complete_multi(
        &self,
        request: MultiCompletionRequest,
    ) -> Result<Vec<ProviderCompletion>, OctoAiError> {
        self.multi_requests.lock().expect("lock").push(request);
        self.multi.lock().expect("lock").pop_front().ok_or_else(|| {
            OctoAiError::InvalidResponse("scripted backend has no multi completion queued".to_string())
        })
    }
}

#[derive(Default)]
pub(crate) struct RecordingIndex {
    pub(crate) results: Mutex<Vec<RankedIssue>>,
    pub(crate) upserts: Mutex<Vec<IssueRecord>>,
    pub(crate) fail_upsert: bool,
}

#[async_trait]
impl IssueIndex for RecordingIndex {
    async fn upsert(
        &self,
        _owner: &str,
        _repo: &str,
        record: &IssueRecord,
    ) -> Result<(), OctoAiError> {
        if self.fail_upsert {
            return Err(OctoAiError::InvalidResponse("index unavailable".to_string()));
        }
        self.upserts.lock().expect("lock").push(record.clone());
        Ok(())
    }

    async fn search(
        &self,
        _owner: &str,
        _repo: &str,
        _query: &str,
    ) -> Result<Vec<RankedIssue>, OctoAiError> {
        Ok(self.results.lock().expect("lock").clone())
    }
}

#[derive(Default)]
pub(crate) struct RecordingHandler {
    calls: Mutex<Vec<Option<String>>>,
}

impl RecordingHandler {
    pub(crate) fn calls(&self) -> Vec<Option<String>> {
        self.calls.lock().expect("lock").clone()
    }
}

#[async_trait]
impl CommandHandler for RecordingHandler {
    async fn execute(&self, _ctx: &CommandContext, args: Option<&str>) -> anyhow::Result<()> {
        self.calls
            .lock()
            .expect("lock")
            .push(args.map(ToOwned::to_owned));
        Ok(())
    }
}

pub(crate) struct FailingHandler(pub(crate) &'static str);

#[async_trait]
impl CommandHandler for FailingHandler {
    async fn execute(&self, _ctx: &CommandContext, _args: Option<&str>) -> anyhow::Result<()> {
        anyhow::bail!("{}", self.0)
    }
}

pub(crate) fn definition(
    name: &str,
    content_types: &[ContentType],
    handler: Arc<dyn CommandHandler>,
) -> CommandDefinition {
    CommandDefinition {
        name: name.to_string(),
        description: format!("{name} command"),
        content_types: content_types.to_vec(),
        args: None,
        llm_callable: true,
        remove_trigger: false,
        handler,
    }
}

pub(crate) fn user(login: &str, kind: &str) -> GithubUser {
    GithubUser {
        login: login.to_string(),
        id: 42,
        kind: kind.to_string(),
    }
}

pub(crate) fn issue(number: u64, title: &str, body: &str, pull_request: bool) -> GithubIssue {
    GithubIssue {
        id: number * 10,
        node_id: format!("I_{number}"),
        number,
        title: title.to_string(),
        body: Some(body.to_string()),
        html_url: format!("https://github.com/acme/widgets/issues/{number}"),
        created_at: "2026-10-01T00:00:00Z".to_string(),
        closed_at: Some("2026-10-02T00:00:00Z".to_string()),
        user: user("alice", "User"),
        pull_request: pull_request
            .then(|| serde_json::json!({"url": format!("https://api.github.com/repos/acme/widgets/pulls/{number}")})),
    }
}

pub(crate) fn comment(id: u64, body: &str, author: GithubUser) -> GithubComment {
    GithubComment {
        id,
        node_id: format!("IC_{id}"),
        body: Some(body.to_string()),
        user: author,
    }
}

pub(crate) fn discussion(node_id: &str) -> GithubDiscussion {
    GithubDiscussion {
        id: 1,
        node_id: node_id.to_string(),
        number: 3,
        title: "Roadmap".to_string(),
        body: Some("What next?".to_string()),
    }
}

pub(crate) fn github_client(server: &MockServer) -> GithubApiClient {
    GithubApiClient::new(
        GithubApiConfig {
            api_base: server.base_url(),
            token: "test-token".to_string(),
            request_timeout_ms: 2_000,
        },
        RepoRef::new("acme", "widgets"),
    )
    .expect("github client")
}

pub(crate) fn settings_with_readme(max_readme_size: usize) -> BotSettings {
    let mut settings = BotSettings::with_provider(Provider::OpenAi);
    settings.max_readme_size = max_readme_size;
    settings
}

pub(crate) fn services(
    backend: Arc<dyn CompletionBackend>,
    registry: CommandRegistry,
    settings: BotSettings,
) -> BotServices {
    BotServices {
        backend,
        issue_index: None,
        settings: Arc::new(settings),
        registry: Arc::new(registry),
    }
}

pub(crate) fn issue_context(
    server: &MockServer,
    services: BotServices,
    issue: GithubIssue,
    comment: GithubComment,
) -> CommandContext {
    CommandContext::new(
        services,
        github_client(server),
        CommentSubject::Issue { issue, comment },
    )
}

pub(crate) fn discussion_context(
    server: &MockServer,
    services: BotServices,
    discussion: GithubDiscussion,
    comment: GithubComment,
) -> CommandContext {
    CommandContext::new(
        services,
        github_client(server),
        CommentSubject::Discussion {
            discussion,
            comment,
        },
    )
}

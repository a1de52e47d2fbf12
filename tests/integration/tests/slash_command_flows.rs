use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use httpmock::prelude::*;
use octo_ai::{
    CompletionBackend, CompletionRequest, MultiCompletionRequest, OctoAiError, Provider,
    ProviderCompletion,
};
use octo_commands::{builtin_registry, BotServices, CommentDispatchOutcome};
use octo_github::webhook_payload::WebhookEvent;
use octo_github::webhook_signature::sign_sha256_hmac;
use octo_runtime::{build_webhook_app, DeliveryOutcome, DeliveryRouter, GithubAuth};
use octo_settings::BotSettings;
use serde_json::json;
use tower::ServiceExt;

struct ScriptedBackend {
    completions: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedBackend {
    fn new(completions: &[&str]) -> Self {
        Self {
            completions: Mutex::new(completions.iter().map(|text| text.to_string()).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().expect("lock").clone()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(
        &self,
        _provider: Provider,
        request: CompletionRequest,
    ) -> Result<String, OctoAiError> {
        self.requests.lock().expect("lock").push(request);
        self.completions
            .lock()
            .expect("lock")
            .pop_front()
            .ok_or_else(|| OctoAiError::InvalidResponse("scripted queue exhausted".to_string()))
    }

    async fn complete_multi(
        &self,
        _request: MultiCompletionRequest,
    ) -> Result<Vec<ProviderCompletion>, OctoAiError> {
        Err(OctoAiError::InvalidResponse("multi completion not scripted".to_string()))
    }
}

fn router(server: &MockServer, backend: Arc<ScriptedBackend>, enabled: &[&str]) -> DeliveryRouter {
    let enabled = enabled
        .iter()
        .map(|name| name.to_string())
        .collect::<Vec<_>>();
    let mut settings = BotSettings::with_provider(Provider::OpenAi);
    settings.max_readme_size = 0;
    settings.enabled_commands = enabled.clone();
    let services = BotServices {
        backend,
        issue_index: None,
        settings: Arc::new(settings),
        registry: Arc::new(builtin_registry(&enabled).expect("registry")),
    };
    DeliveryRouter::new(
        services,
        GithubAuth::StaticToken("integration-token".to_string()),
        server.base_url(),
        2_000,
    )
}

fn issue_comment_delivery(comment: &str) -> String {
    json!({
        "action": "created",
        "issue": {
            "id": 70,
            "node_id": "I_7",
            "number": 7,
            "title": "Login fails",
            "body": "The login page returns 500",
            "html_url": "https://github.com/acme/widgets/issues/7",
            "user": {"login": "alice", "id": 5, "type": "User"}
        },
        "comment": {
            "id": 4242,
            "node_id": "IC_4242",
            "body": comment,
            "user": {"login": "alice", "id": 5, "type": "User"}
        },
        "repository": {"name": "widgets", "owner": {"login": "acme", "id": 2, "type": "Organization"}},
        "sender": {"login": "alice", "id": 5, "type": "User"},
        "installation": {"id": 900}
    })
    .to_string()
}

fn mock_reaction(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(POST)
            .path("/repos/acme/widgets/issues/comments/4242/reactions")
            .json_body(json!({"content": "rocket"}));
        then.status(201).json_body(json!({"id": 1, "content": "rocket"}));
    })
}

fn mock_trigger_delete(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(DELETE)
            .path("/repos/acme/widgets/issues/comments/4242");
        then.status(204);
    })
}

#[tokio::test]
async fn integration_label_command_reacts_labels_and_deletes_trigger() {
    let server = MockServer::start();
    let reaction = mock_reaction(&server);
    let delete = mock_trigger_delete(&server);
    server.mock(|when, then| {
        when.method(GET).path("/repos/acme/widgets/labels");
        then.status(200).json_body(json!([
            {"name": "bug", "description": "Something is broken"},
            {"name": "docs", "description": null}
        ]));
    });
    let labelled = server.mock(|when, then| {
        when.method(POST)
            .path("/repos/acme/widgets/issues/7/labels")
            .json_body(json!({"labels": ["bug"]}));
        then.status(200).json_body(json!([{"name": "bug"}]));
    });
    let backend = Arc::new(ScriptedBackend::new(&[r#"{"labels":["bug"]}"#]));
    let body = issue_comment_delivery("/label");
    let event = WebhookEvent::parse("issue_comment", body.as_bytes()).expect("event");

    let outcome = router(&server, backend.clone(), &["act", "label", "howto"])
        .route(event)
        .await
        .expect("route");

    assert_eq!(
        outcome,
        DeliveryOutcome::Comment {
            event: "issue_comment.created".to_string(),
            outcome: CommentDispatchOutcome::Executed {
                command: "label".to_string(),
                trigger_deleted: true,
            },
        }
    );
    reaction.assert_calls(1);
    labelled.assert_calls(1);
    delete.assert_calls(1);
    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].user_prompts,
        vec!["Title: Login fails\nBody: The login page returns 500".to_string()]
    );
    assert!(requests[0].system_prompt.contains("[name] bug, [description] Something is broken"));
}

#[tokio::test]
async fn integration_act_without_runnable_choice_falls_back_to_howto() {
    let server = MockServer::start();
    let reaction = mock_reaction(&server);
    let delete = mock_trigger_delete(&server);
    server.mock(|when, then| {
        when.method(GET).path("/repos/acme/widgets/issues/7/comments");
        then.status(200).json_body(json!([]));
    });
    let no_command = server.mock(|when, then| {
        when.method(POST)
            .path("/repos/acme/widgets/issues/7/comments")
            .json_body(json!({"body": "No suitable command was available."}));
        then.status(201).json_body(json!({"id": 5000}));
    });
    let howto = server.mock(|when, then| {
        when.method(POST)
            .path("/repos/acme/widgets/issues/7/comments")
            .body_includes("| act |")
            .body_includes("| summarize |");
        then.status(201).json_body(json!({"id": 5001}));
    });
    let backend = Arc::new(ScriptedBackend::new(&[r#"{"reply":"ok"}"#]));
    let body = issue_comment_delivery("  /act please summarize this  ");
    let event = WebhookEvent::parse("issue_comment", body.as_bytes()).expect("event");

    let outcome = router(&server, backend.clone(), &["act", "summarize", "howto"])
        .route(event)
        .await
        .expect("route");

    assert!(matches!(
        outcome,
        DeliveryOutcome::Comment {
            outcome: CommentDispatchOutcome::Executed {
                trigger_deleted: false,
                ..
            },
            ..
        }
    ));
    reaction.assert_calls(1);
    no_command.assert_calls(1);
    howto.assert_calls(1);
    delete.assert_calls(0);
    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].user_prompts, vec!["please summarize this".to_string()]);
    assert!(!requests[0].system_prompt.contains("### summarize"));
    assert!(requests[0].system_prompt.contains("### howto"));
}

#[tokio::test]
async fn integration_signed_delivery_runs_through_http_server() {
    let server = MockServer::start();
    let reaction = mock_reaction(&server);
    let table = server.mock(|when, then| {
        when.method(POST)
            .path("/repos/acme/widgets/issues/7/comments")
            .body_includes("Commands");
        then.status(201).json_body(json!({"id": 6000}));
    });
    let app = build_webhook_app(
        router(&server, Arc::new(ScriptedBackend::new(&[])), &["howto"]),
        Some("integration-secret".to_string()),
        Duration::from_secs(5),
    );
    let body = issue_comment_delivery("/howto");
    let signature = sign_sha256_hmac(body.as_bytes(), "integration-secret").expect("sign");
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .header("x-github-event", "issue_comment")
        .header("x-github-delivery", "delivery-1")
        .header("x-hub-signature-256", signature)
        .body(Body::from(body))
        .expect("request");

    let response = app.oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    reaction.assert_calls(1);
    table.assert_calls(1);
}

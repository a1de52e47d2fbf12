use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use octo_github::webhook_payload::WebhookEvent;
use octo_github::webhook_signature::verify_sha256_hmac_signature;
use serde_json::json;
use tokio::net::TcpListener;

use crate::webhook_router::{DeliveryOutcome, DeliveryRouter};

const DELIVERY_ENDPOINT: &str = "/";
const HEALTH_ENDPOINT: &str = "/healthz";
const EVENT_HEADER: &str = "x-github-event";
const DELIVERY_HEADER: &str = "x-github-delivery";
const SIGNATURE_HEADER: &str = "x-hub-signature-256";

#[derive(Debug, Clone)]
/// Public struct `WebhookServerConfig` used to run the webhook listener.
pub struct WebhookServerConfig {
    pub bind: String,
    /// Signatures are only checked when a secret is configured.
    pub webhook_secret: Option<String>,
    pub delivery_timeout: Duration,
}

struct WebhookServerState {
    router: DeliveryRouter,
    webhook_secret: Option<String>,
    delivery_timeout: Duration,
}

/// Serves deliveries until ctrl-c.
pub async fn run_webhook_server(config: WebhookServerConfig, router: DeliveryRouter) -> Result<()> {
    let bind_addr: SocketAddr = config
        .bind
        .parse()
        .with_context(|| format!("invalid --bind '{}': expected host:port", config.bind))?;
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind webhook server on {bind_addr}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve webhook server listen address")?;
    tracing::info!(
        addr = %local_addr,
        signature_check = config.webhook_secret.is_some(),
        delivery_timeout_seconds = config.delivery_timeout.as_secs(),
        "webhook server listening"
    );

    let app = build_webhook_app(router, config.webhook_secret, config.delivery_timeout);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await
        .context("webhook server exited unexpectedly")?;
    Ok(())
}

pub fn build_webhook_app(
    router: DeliveryRouter,
    webhook_secret: Option<String>,
    delivery_timeout: Duration,
) -> Router {
    let state = Arc::new(WebhookServerState {
        router,
        webhook_secret,
        delivery_timeout,
    });
    Router::new()
        .route(HEALTH_ENDPOINT, get(handle_health))
        .route(DELIVERY_ENDPOINT, post(handle_delivery))
        .with_state(state)
}

async fn handle_health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({"error": {"code": code, "message": message.into()}})),
    )
        .into_response()
}

fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

async fn handle_delivery(
    State(state): State<Arc<WebhookServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let delivery = header_text(&headers, DELIVERY_HEADER).unwrap_or("-").to_string();

    if let Some(secret) = state.webhook_secret.as_deref() {
        let verified = header_text(&headers, SIGNATURE_HEADER)
            .map(|signature| verify_sha256_hmac_signature(&body, signature, secret));
        match verified {
            Some(Ok(())) => {}
            Some(Err(error)) => {
                tracing::warn!(delivery = %delivery, error = %error, "webhook signature rejected");
                return error_response(StatusCode::UNAUTHORIZED, "invalid_signature", error.to_string());
            }
            None => {
                tracing::warn!(delivery = %delivery, "webhook signature missing");
                return error_response(
                    StatusCode::UNAUTHORIZED,
                    "missing_signature",
                    format!("missing {SIGNATURE_HEADER} header"),
                );
            }
        }
    }

    let Some(event_name) = header_text(&headers, EVENT_HEADER) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "missing_event",
            format!("missing {EVENT_HEADER} header"),
        );
    };
    let event = match WebhookEvent::parse(event_name, &body) {
        Ok(event) => event,
        Err(error) => {
            tracing::warn!(delivery = %delivery, event = event_name, error = %error, "webhook payload rejected");
            return error_response(StatusCode::BAD_REQUEST, "invalid_payload", error.to_string());
        }
    };
    if let WebhookEvent::Unsubscribed { .. } = &event {
        let name = event.name();
        tracing::debug!(delivery = %delivery, event = %name, "event not subscribed");
        return (
            StatusCode::ACCEPTED,
            Json(json!({"status": "ignored", "event": name})),
        )
            .into_response();
    }

    let name = event.name();
    tracing::info!(delivery = %delivery, event = %name, "delivery received");
    match tokio::time::timeout(state.delivery_timeout, state.router.route(event)).await {
        Ok(Ok(outcome)) => {
            let status = match outcome {
                DeliveryOutcome::SenderRejected { .. } | DeliveryOutcome::Unsubscribed { .. } => {
                    "skipped"
                }
                DeliveryOutcome::Actions { .. } | DeliveryOutcome::Comment { .. } => "processed",
            };
            (StatusCode::OK, Json(json!({"status": status, "event": name}))).into_response()
        }
        Ok(Err(error)) => {
            tracing::error!(delivery = %delivery, event = %name, error = %error, "delivery failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "delivery_failed", error.to_string())
        }
        Err(_) => {
            tracing::error!(
                delivery = %delivery,
                event = %name,
                timeout_seconds = state.delivery_timeout.as_secs(),
                "delivery timed out"
            );
            error_response(
                StatusCode::GATEWAY_TIMEOUT,
                "delivery_timeout",
                format!("delivery exceeded {}s", state.delivery_timeout.as_secs()),
            )
        }
    }
}

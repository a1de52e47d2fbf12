//! Webhook runtime for OctoThink.
//! Deliveries arrive over HTTP, are authenticated and decoded, filtered by
//! sender, then routed either to the slash-command dispatcher (comments) or
//! to a fan-out of independent issue actions (`issues` events).

pub mod action_aggregator;
pub mod sender_validator;
pub mod webhook_router;
pub mod webhook_server;

#[cfg(test)]
pub(crate) mod test_support;

pub use action_aggregator::{run_actions, ActionOutcome, ActionStatus, NamedAction};
pub use sender_validator::{validate_sender, SenderDecision};
pub use webhook_router::{DeliveryOutcome, DeliveryRouter, GithubAuth};
pub use webhook_server::{build_webhook_app, run_webhook_server, WebhookServerConfig};

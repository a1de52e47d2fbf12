use std::future::Future;
use std::pin::Pin;

use anyhow::Result;

type ActionFuture = Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>>;

/// An independent side effect bound to an event, tagged for logging.
pub struct NamedAction {
    name: String,
    future: ActionFuture,
}

impl NamedAction {
    pub fn new<F>(name: impl Into<String>, future: F) -> Self
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            future: Box::pin(future),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Enumerates supported `ActionStatus` values.
pub enum ActionStatus {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `ActionOutcome` reported for each action of an event.
pub struct ActionOutcome {
    pub name: String,
    pub status: ActionStatus,
    pub error: Option<String>,
}

impl ActionOutcome {
    fn succeeded(name: String) -> Self {
        Self {
            name,
            status: ActionStatus::Succeeded,
            error: None,
        }
    }

    fn failed(name: String, error: String) -> Self {
        Self {
            name,
            status: ActionStatus::Failed,
            error: Some(error),
        }
    }
}

/// Runs every action concurrently and waits for all of them to settle.
///
/// Outcomes come back in input order. A failing action is logged and
/// recorded; it never cancels or hides the others.
pub async fn run_actions(event: &str, actions: Vec<NamedAction>) -> Vec<ActionOutcome> {
    let handles = actions
        .into_iter()
        .map(|action| (action.name, tokio::spawn(action.future)))
        .collect::<Vec<_>>();

    let mut outcomes = Vec::with_capacity(handles.len());
    for (name, handle) in handles {
        let outcome = match handle.await {
            Ok(Ok(())) => {
                tracing::info!(event, action = %name, "action succeeded");
                ActionOutcome::succeeded(name)
            }
            Ok(Err(error)) => {
                tracing::error!(event, action = %name, error = %error, "action failed");
                ActionOutcome::failed(name, error.to_string())
            }
            Err(join_error) => {
                tracing::error!(
                    event,
                    action = %name,
                    error = %join_error,
                    "unexpected error in {event} handler"
                );
                ActionOutcome::failed(name, join_error.to_string())
            }
        };
        outcomes.push(outcome);
    }
    outcomes
}

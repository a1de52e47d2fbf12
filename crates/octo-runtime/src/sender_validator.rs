use octo_github::webhook_payload::GithubUser;
use octo_settings::BotSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Enumerates supported `SenderDecision` values.
pub enum SenderDecision {
    Allowed,
    /// Bot accounts and the app's own installation identity.
    RejectedAutomation,
    RejectedNotAllowed,
}

impl SenderDecision {
    pub fn is_allowed(self) -> bool {
        self == Self::Allowed
    }
}

/// Decides whether a delivery's sender may trigger the bot.
pub fn validate_sender(
    sender: &GithubUser,
    installation_id: Option<u64>,
    settings: &BotSettings,
) -> SenderDecision {
    let is_installation = installation_id.is_some_and(|id| id == sender.id);
    if sender.kind == "Bot" || is_installation || sender.login.contains("[bot]") {
        return SenderDecision::RejectedAutomation;
    }
    if !settings.is_user_allowed(&sender.login) {
        return SenderDecision::RejectedNotAllowed;
    }
    SenderDecision::Allowed
}

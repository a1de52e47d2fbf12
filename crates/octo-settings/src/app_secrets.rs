use std::fmt;

use serde::Deserialize;

use crate::SettingsError;

#[derive(Clone, PartialEq, Eq, Deserialize)]
/// GitHub App secrets carried as JSON in `GITHUB_BOT_CONFIG`.
pub struct AppSecrets {
    #[serde(rename = "APP_ID")]
    pub app_id: String,
    #[serde(rename = "WEBHOOK_SECRET")]
    pub webhook_secret: String,
    #[serde(rename = "PRIVATE_KEY")]
    pub private_key: String,
}

impl fmt::Debug for AppSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppSecrets")
            .field("app_id", &self.app_id)
            .field("webhook_secret", &"<redacted>")
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl AppSecrets {
    pub fn parse(raw: Option<&str>) -> Result<Self, SettingsError> {
        let raw = raw
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(SettingsError::MissingSecret)?;
        let secrets: AppSecrets = serde_json::from_str(raw)
            .map_err(|error| SettingsError::InvalidSecret(error.to_string()))?;
        for (field, value) in [
            ("APP_ID", &secrets.app_id),
            ("WEBHOOK_SECRET", &secrets.webhook_secret),
            ("PRIVATE_KEY", &secrets.private_key),
        ] {
            if value.trim().is_empty() {
                return Err(SettingsError::InvalidSecret(format!("{field} must not be empty")));
            }
        }
        Ok(secrets)
    }
}

use std::path::Path;

use octo_ai::Provider;
use serde::Deserialize;

use crate::SettingsError;

pub const DEFAULT_EXCLUDED_EXTENSIONS: [&str; 10] = [
    ".lock", ".json", ".svg", ".png", ".jpg", ".jpeg", ".gif", ".pdf", ".ico", "lock.yaml",
];

const DEFAULT_MAX_FILE_COUNT: usize = 10;
const DEFAULT_MAX_DIFF_LENGTH: usize = 10_000;
const DEFAULT_MAX_REVIEW_SIZE: usize = 50_000;
const DEFAULT_MAX_README_SIZE: usize = 10_000;
const MAX_DIFF_LENGTH_LIMIT: usize = 50_000;
const MAX_REVIEW_SIZE_LIMIT: usize = 100_000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawSettings {
    default_provider: Option<Provider>,
    #[serde(default)]
    allowed_users: Option<Vec<String>>,
    max_readme_size: Option<usize>,
    #[serde(default)]
    pull_request_settings: RawPullRequestSettings,
    enabled_commands: Option<Vec<String>>,
    #[serde(default)]
    destructive_operations: DestructiveOperations,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawPullRequestSettings {
    max_file_count: Option<usize>,
    max_diff_length: Option<usize>,
    max_review_size: Option<usize>,
    excluded_extensions: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `PullRequestSettings` bounding review payloads.
pub struct PullRequestSettings {
    pub max_file_count: usize,
    pub max_diff_length: usize,
    pub max_review_size: usize,
    pub excluded_extensions: Vec<String>,
}

impl Default for PullRequestSettings {
    fn default() -> Self {
        Self {
            max_file_count: DEFAULT_MAX_FILE_COUNT,
            max_diff_length: DEFAULT_MAX_DIFF_LENGTH,
            max_review_size: DEFAULT_MAX_REVIEW_SIZE,
            excluded_extensions: DEFAULT_EXCLUDED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

impl PullRequestSettings {
    pub fn is_excluded(&self, filename: &str) -> bool {
        self.excluded_extensions
            .iter()
            .any(|ext| filename.ends_with(ext.as_str()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IssueCloseOperations {
    #[serde(default)]
    pub allow_save_summary: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
/// Operations that write to the repository; all disabled unless configured.
pub struct DestructiveOperations {
    #[serde(default)]
    pub issue_close: IssueCloseOperations,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `BotSettings` loaded from `config.yml`.
pub struct BotSettings {
    pub default_provider: Provider,
    pub allowed_users: Vec<String>,
    /// Zero disables README context.
    pub max_readme_size: usize,
    pub pull_request: PullRequestSettings,
    /// An absent list means no command is enabled.
    pub enabled_commands: Vec<String>,
    pub destructive_operations: DestructiveOperations,
}

impl BotSettings {
    /// Settings with every default and the given provider; no commands enabled.
    pub fn with_provider(default_provider: Provider) -> Self {
        Self {
            default_provider,
            allowed_users: Vec::new(),
            max_readme_size: DEFAULT_MAX_README_SIZE,
            pull_request: PullRequestSettings::default(),
            enabled_commands: Vec::new(),
            destructive_operations: DestructiveOperations::default(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                SettingsError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                SettingsError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let settings = Self::from_yaml_str(&raw)?;
        tracing::info!(
            path = %path.display(),
            provider = settings.default_provider.as_str(),
            enabled_commands = settings.enabled_commands.len(),
            "config loaded"
        );
        Ok(settings)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, SettingsError> {
        let parsed: RawSettings = serde_yaml::from_str(raw)?;
        let default_provider = parsed.default_provider.ok_or_else(|| {
            SettingsError::Invalid("defaultProvider must be one of openai, gemini".to_string())
        })?;

        let pr = parsed.pull_request_settings;
        let max_diff_length = non_zero_or(pr.max_diff_length, DEFAULT_MAX_DIFF_LENGTH);
        if max_diff_length > MAX_DIFF_LENGTH_LIMIT {
            return Err(SettingsError::Invalid(format!(
                "pullRequestSettings.maxDiffLength must be at most {MAX_DIFF_LENGTH_LIMIT}"
            )));
        }
        let max_review_size = non_zero_or(pr.max_review_size, DEFAULT_MAX_REVIEW_SIZE);
        if max_review_size > MAX_REVIEW_SIZE_LIMIT {
            return Err(SettingsError::Invalid(format!(
                "pullRequestSettings.maxReviewSize must be at most {MAX_REVIEW_SIZE_LIMIT}"
            )));
        }

        let defaults = PullRequestSettings::default();
        Ok(Self {
            default_provider,
            allowed_users: parsed.allowed_users.unwrap_or_default(),
            max_readme_size: parsed.max_readme_size.unwrap_or(DEFAULT_MAX_README_SIZE),
            pull_request: PullRequestSettings {
                max_file_count: non_zero_or(pr.max_file_count, DEFAULT_MAX_FILE_COUNT),
                max_diff_length,
                max_review_size,
                excluded_extensions: pr
                    .excluded_extensions
                    .unwrap_or(defaults.excluded_extensions),
            },
            enabled_commands: parsed.enabled_commands.unwrap_or_default(),
            destructive_operations: parsed.destructive_operations,
        })
    }

    /// An empty allow-list admits everyone.
    pub fn is_user_allowed(&self, login: &str) -> bool {
        self.allowed_users.is_empty() || self.allowed_users.iter().any(|user| user == login)
    }
}

// Zero counts as unset so `maxFileCount: 0` keeps the default.
fn non_zero_or(value: Option<usize>, default: usize) -> usize {
    match value {
        Some(0) | None => default,
        Some(value) => value,
    }
}

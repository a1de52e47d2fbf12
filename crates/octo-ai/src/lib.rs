//! Clients for the OctoThink completion backend and the issue vector index.
//! The backend fronts several LLM providers behind `/{provider}/completion`
//! and `/multi/completion`; the index stores closed-issue summaries with
//! embeddings for nearest-neighbour search.
mod backend;
mod gcp_auth;
mod issue_index;
mod types;

pub use backend::{BackendAuth, BackendClient, BackendConfig};
pub use gcp_auth::{MetadataTokenSource, DEFAULT_METADATA_BASE};
pub use issue_index::{
    FirestoreIssueIndex, FirestoreIssueIndexConfig, IssueIndex, IssueRecord, RankedIssue,
};
pub use types::{
    CompletionBackend, CompletionRequest, MultiCompletionRequest, OctoAiError, Provider,
    ProviderCompletion,
};

//! GitHub plumbing for OctoThink.
//! This crate provides webhook payload models and signature checks, GitHub App
//! installation authentication, the REST/GraphQL client used by command
//! handlers, and unified-diff line helpers for inline review comments.

pub mod github_api_client;
pub mod github_app_auth;
pub mod github_graphql;
pub mod github_transport_helpers;
pub mod patch_lines;
pub mod repo_ref;
pub mod webhook_payload;
pub mod webhook_signature;

pub use github_api_client::{GithubApiClient, GithubApiConfig};
pub use github_graphql::{DiscussionThread, ProjectV2};
pub use repo_ref::RepoRef;

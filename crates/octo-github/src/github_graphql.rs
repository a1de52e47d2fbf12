use anyhow::{anyhow, bail, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::github_api_client::GithubApiClient;

const DISCUSSION_WITH_COMMENTS_QUERY: &str = r#"
query GetDiscussionWithComments($id: ID!) {
  node(id: $id) {
    ... on Discussion {
      title
      body
      comments(first: 100) {
        nodes {
          body
        }
      }
    }
  }
}"#;

const ADD_REACTION_MUTATION: &str = r#"
mutation AddReaction($subjectId: ID!, $content: ReactionContent!) {
  addReaction(input: { subjectId: $subjectId, content: $content }) {
    reaction {
      content
    }
  }
}"#;

const ADD_DISCUSSION_COMMENT_MUTATION: &str = r#"
mutation CreateDiscussionComment($discussionId: ID!, $body: String!) {
  addDiscussionComment(input: { discussionId: $discussionId, body: $body }) {
    comment {
      id
    }
  }
}"#;

const DELETE_DISCUSSION_COMMENT_MUTATION: &str = r#"
mutation DeleteDiscussionComment($id: ID!) {
  deleteDiscussionComment(input: { id: $id }) {
    clientMutationId
  }
}"#;

const ORGANIZATION_PROJECTS_QUERY: &str = r#"
query($org: String!) {
  organization(login: $org) {
    projectsV2(first: 20) {
      nodes {
        id
        title
      }
    }
  }
}"#;

const ADD_PROJECT_ITEM_MUTATION: &str = r#"
mutation($projectId: ID!, $contentId: ID!) {
  addProjectV2ItemById(input: { projectId: $projectId contentId: $contentId }) {
    item {
      id
    }
  }
}"#;

#[derive(Debug, Deserialize)]
struct GraphqlEnvelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `DiscussionThread` holding a discussion and its comment bodies.
pub struct DiscussionThread {
    pub title: String,
    pub body: String,
    pub comments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProjectV2 {
    pub id: String,
    pub title: String,
}

impl GithubApiClient {
    /// Runs a GraphQL document and returns its `data`; any reported error fails the call.
    pub async fn graphql<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T> {
        let payload = json!({ "query": query, "variables": variables });
        let envelope: GraphqlEnvelope<T> = self
            .request_json(
                "graphql",
                self.http
                    .post(format!("{}/graphql", self.api_base))
                    .json(&payload),
            )
            .await?;
        if !envelope.errors.is_empty() {
            let messages = envelope
                .errors
                .iter()
                .map(|error| error.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            bail!("github graphql request failed: {messages}");
        }
        envelope
            .data
            .ok_or_else(|| anyhow!("github graphql response did not include data"))
    }

    pub async fn discussion_with_comments(&self, discussion_node_id: &str) -> Result<DiscussionThread> {
        #[derive(Deserialize)]
        struct Response {
            node: Option<DiscussionNode>,
        }
        #[derive(Deserialize)]
        struct DiscussionNode {
            #[serde(default)]
            title: String,
            #[serde(default)]
            body: String,
            comments: CommentConnection,
        }
        #[derive(Deserialize)]
        struct CommentConnection {
            nodes: Vec<CommentNode>,
        }
        #[derive(Deserialize)]
        struct CommentNode {
            #[serde(default)]
            body: String,
        }

        let response: Response = self
            .graphql(
                DISCUSSION_WITH_COMMENTS_QUERY,
                json!({ "id": discussion_node_id }),
            )
            .await?;
        let node = response
            .node
            .ok_or_else(|| anyhow!("discussion {discussion_node_id} was not found"))?;
        Ok(DiscussionThread {
            title: node.title,
            body: node.body,
            comments: node
                .comments
                .nodes
                .into_iter()
                .map(|comment| comment.body)
                .collect(),
        })
    }

    /// Adds a reaction (GraphQL `ReactionContent`, e.g. `ROCKET`) to any reactable node.
    pub async fn add_reaction(&self, subject_id: &str, content: &str) -> Result<()> {
        let _: Value = self
            .graphql(
                ADD_REACTION_MUTATION,
                json!({ "subjectId": subject_id, "content": content }),
            )
            .await?;
        Ok(())
    }

    pub async fn add_discussion_comment(&self, discussion_id: &str, body: &str) -> Result<String> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Response {
            add_discussion_comment: Payload,
        }
        #[derive(Deserialize)]
        struct Payload {
            comment: CreatedComment,
        }
        #[derive(Deserialize)]
        struct CreatedComment {
            id: String,
        }

        if discussion_id.trim().is_empty() || body.is_empty() {
            bail!("discussion id and content are required to create a discussion comment");
        }
        let response: Response = self
            .graphql(
                ADD_DISCUSSION_COMMENT_MUTATION,
                json!({ "discussionId": discussion_id, "body": body }),
            )
            .await?;
        Ok(response.add_discussion_comment.comment.id)
    }

    pub async fn delete_discussion_comment(&self, comment_node_id: &str) -> Result<()> {
        if comment_node_id.trim().is_empty() {
            bail!("comment id is required to delete a discussion comment");
        }
        let _: Value = self
            .graphql(
                DELETE_DISCUSSION_COMMENT_MUTATION,
                json!({ "id": comment_node_id }),
            )
            .await?;
        Ok(())
    }

    /// First 20 ProjectsV2 of an organization. User-owned projects are not listed.
    pub async fn organization_projects(&self, org: &str) -> Result<Vec<ProjectV2>> {
        #[derive(Deserialize)]
        struct Response {
            organization: Option<Organization>,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Organization {
            projects_v2: ProjectConnection,
        }
        #[derive(Deserialize)]
        struct ProjectConnection {
            nodes: Vec<ProjectV2>,
        }

        let response: Response = self
            .graphql(ORGANIZATION_PROJECTS_QUERY, json!({ "org": org }))
            .await?;
        Ok(response
            .organization
            .map(|organization| organization.projects_v2.nodes)
            .unwrap_or_default())
    }

    /// Adds an issue or pull request node to a project and returns the new item id.
    pub async fn add_project_item(&self, project_id: &str, content_id: &str) -> Result<String> {
        let response: Value = self
            .graphql(
                ADD_PROJECT_ITEM_MUTATION,
                json!({ "projectId": project_id, "contentId": content_id }),
            )
            .await?;
        response
            .pointer("/addProjectV2ItemById/item/id")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned)
            .ok_or_else(|| anyhow!("github graphql did not return a project item id"))
    }
}

#[cfg(test)]
mod tests {
    use super::ProjectV2;
    use crate::{GithubApiClient, GithubApiConfig, RepoRef};
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> GithubApiClient {
        GithubApiClient::new(
            GithubApiConfig {
                api_base: server.base_url(),
                token: "test-token".to_string(),
                request_timeout_ms: 2_000,
            },
            RepoRef::new("acme", "widgets"),
        )
        .expect("client")
    }

    #[tokio::test]
    async fn functional_discussion_with_comments_collects_comment_bodies() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/graphql")
                .body_includes("GetDiscussionWithComments")
                .body_includes("D_kw1");
            then.status(200).json_body(json!({
                "data": {"node": {
                    "title": "Roadmap",
                    "body": "What next?",
                    "comments": {"nodes": [{"body": "caching"}, {"body": "docs"}]}
                }}
            }));
        });

        let thread = client(&server)
            .discussion_with_comments("D_kw1")
            .await
            .expect("thread");
        assert_eq!(thread.title, "Roadmap");
        assert_eq!(thread.comments, vec!["caching".to_string(), "docs".to_string()]);
    }

    #[tokio::test]
    async fn functional_organization_projects_and_add_item_round_trip() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/graphql").body_includes("projectsV2");
            then.status(200).json_body(json!({
                "data": {"organization": {"projectsV2": {"nodes": [
                    {"id": "PVT_1", "title": "Sprint 2026/10"}
                ]}}}
            }));
        });
        let add = server.mock(|when, then| {
            when.method(POST)
                .path("/graphql")
                .body_includes("addProjectV2ItemById")
                .body_includes("I_node");
            then.status(200).json_body(json!({
                "data": {"addProjectV2ItemById": {"item": {"id": "PVTI_9"}}}
            }));
        });

        let github = client(&server);
        let projects = github.organization_projects("acme").await.expect("projects");
        assert_eq!(
            projects,
            vec![ProjectV2 {
                id: "PVT_1".to_string(),
                title: "Sprint 2026/10".to_string()
            }]
        );
        let item = github
            .add_project_item("PVT_1", "I_node")
            .await
            .expect("item");
        assert_eq!(item, "PVTI_9");
        add.assert_calls(1);
    }

    #[tokio::test]
    async fn regression_graphql_errors_fail_even_with_http_200() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/graphql");
            then.status(200).json_body(json!({
                "data": null,
                "errors": [{"message": "Resource not accessible by integration"}]
            }));
        });

        let error = client(&server)
            .add_reaction("DC_1", "ROCKET")
            .await
            .expect_err("graphql error");
        assert!(error
            .to_string()
            .contains("Resource not accessible by integration"));
    }

    #[tokio::test]
    async fn unit_add_discussion_comment_requires_body() {
        let server = MockServer::start();
        let error = client(&server)
            .add_discussion_comment("D_1", "")
            .await
            .expect_err("empty body");
        assert!(error.to_string().contains("required"));
    }
}

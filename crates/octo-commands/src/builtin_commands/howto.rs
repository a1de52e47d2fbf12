use anyhow::Result;
use async_trait::async_trait;

use crate::command_context::CommandContext;
use crate::command_registry::CommandHandler;
use crate::comment_render::render_howto;

/// `/howto`: lists the enabled commands on the current thread.
pub struct HowtoCommand;

#[async_trait]
impl CommandHandler for HowtoCommand {
    async fn execute(&self, ctx: &CommandContext, _args: Option<&str>) -> Result<()> {
        ctx.post_comment(&render_howto(ctx.registry().commands()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;
    use std::sync::Arc;

    use super::HowtoCommand;
    use crate::builtin_commands::builtin_registry;
    use crate::command_registry::CommandHandler;
    use crate::test_support::{
        comment, discussion, discussion_context, services, settings_with_readme, user,
        ScriptedBackend,
    };

    #[tokio::test]
    async fn functional_howto_posts_table_to_discussion_through_graphql() {
        let server = MockServer::start();
        let posted = server.mock(|when, then| {
            when.method(POST)
                .path("/graphql")
                .body_includes("addDiscussionComment")
                .body_includes("D_7")
                .body_includes("| howto | Show how to use the commands. |  -  | issue, pull_request, discussion |");
            then.status(200).json_body(json!({
                "data": {"addDiscussionComment": {"comment": {"id": "DC_1"}}}
            }));
        });
        let registry = builtin_registry(&["howto".to_string(), "discuss".to_string()])
            .expect("registry");
        let ctx = discussion_context(
            &server,
            services(Arc::new(ScriptedBackend::default()), registry, settings_with_readme(0)),
            discussion("D_7"),
            comment(2, "/howto", user("alice", "User")),
        );

        HowtoCommand.execute(&ctx, None).await.expect("howto");
        posted.assert_calls(1);
    }
}

//! The `suggest` command.

use super::{CommandLine, CommandResult, Context, Handler, report_error};
use crate::engine::SubmitRequest;
use async_trait::async_trait;

/// Handler for the `suggest` command.
///
/// `suggest <message>`
///
/// Submits a proposal to the community's suggestion channel.
pub struct SuggestHandler;

#[async_trait]
impl Handler for SuggestHandler {
    async fn handle(&self, ctx: &mut Context<'_>, line: &CommandLine<'_>) -> CommandResult {
        let Some(body) = line.rest_from(0) else {
            return ctx.reply("Suggest something. Message is required.").await;
        };

        let author = ctx.actor.profile();
        let request = SubmitRequest {
            community: ctx.community,
            author: &author,
            body,
            attachment: ctx.attachment,
            origin: ctx.origin,
        };

        match ctx.engine.submit(request).await {
            // The request message is gone; an acknowledgment would dangle.
            Ok(outcome) if outcome.origin_deleted => Ok(()),
            Ok(_) => {
                ctx.reply("Your suggestion has been sent for approval!")
                    .await
            }
            Err(e) => report_error(ctx, "suggest", e).await,
        }
    }
}

//! Resolution commands: approve, reject, reason back-fill, show.

use super::{CommandLine, CommandResult, Context, Handler, report_error, require_admin};
use crate::engine::Resolution;
use crate::transport::SuggestionId;
use async_trait::async_trait;

fn parse_id(line: &CommandLine<'_>) -> Option<SuggestionId> {
    line.arg(0).and_then(|arg| arg.parse().ok())
}

/// Handler for the `approve` command.
///
/// `approve <id>`
pub struct ApproveHandler;

#[async_trait]
impl Handler for ApproveHandler {
    async fn handle(&self, ctx: &mut Context<'_>, line: &CommandLine<'_>) -> CommandResult {
        if !require_admin(ctx).await? {
            return Ok(());
        }
        let Some(id) = parse_id(line) else {
            return ctx.reply("Usage: approve <id>").await;
        };

        match ctx
            .engine
            .resolve(ctx.community, ctx.actor.id, id, Resolution::Approve, None)
            .await
        {
            Ok(_) => ctx.tick().await,
            Err(e) => report_error(ctx, "approve", e).await,
        }
    }
}

/// Handler for the `reject` command.
///
/// `reject <id> [reason]`
pub struct RejectHandler;

#[async_trait]
impl Handler for RejectHandler {
    async fn handle(&self, ctx: &mut Context<'_>, line: &CommandLine<'_>) -> CommandResult {
        if !require_admin(ctx).await? {
            return Ok(());
        }
        let Some(id) = parse_id(line) else {
            return ctx.reply("Usage: reject <id> [reason]").await;
        };
        let reason = line.rest_from(1);

        match ctx
            .engine
            .resolve(ctx.community, ctx.actor.id, id, Resolution::Reject, reason)
            .await
        {
            Ok(_) => ctx.tick().await,
            Err(e) => report_error(ctx, "reject", e).await,
        }
    }
}

/// Handler for the `addreason` command.
///
/// `addreason <id> <reason>`
///
/// Back-fills a reason on an already rejected suggestion.
pub struct AddReasonHandler;

#[async_trait]
impl Handler for AddReasonHandler {
    async fn handle(&self, ctx: &mut Context<'_>, line: &CommandLine<'_>) -> CommandResult {
        if !require_admin(ctx).await? {
            return Ok(());
        }
        let (Some(id), Some(reason)) = (parse_id(line), line.rest_from(1)) else {
            return ctx.reply("Usage: addreason <id> <reason>").await;
        };

        match ctx
            .engine
            .add_reason(ctx.community, ctx.actor.id, id, reason)
            .await
        {
            Ok(()) => ctx.tick().await,
            Err(e) => report_error(ctx, "addreason", e).await,
        }
    }
}

/// Handler for the `showsuggestion` command.
///
/// `showsuggestion <id>`
pub struct ShowSuggestionHandler;

#[async_trait]
impl Handler for ShowSuggestionHandler {
    async fn handle(&self, ctx: &mut Context<'_>, line: &CommandLine<'_>) -> CommandResult {
        if !require_admin(ctx).await? {
            return Ok(());
        }
        let Some(id) = parse_id(line) else {
            return ctx.reply("Usage: showsuggestion <id>").await;
        };

        match ctx.engine.show(ctx.community, id).await {
            Ok(content) => ctx.display(content).await,
            Err(e) => report_error(ctx, "showsuggestion", e).await,
        }
    }
}

//! Submission ban commands.
//!
//! The who-may-ban-whom rules live here, ahead of the registry calls:
//! nobody bans themself, nobody bans the community owner, and a moderator
//! cannot touch a member of equal or higher rank unless they own the
//! community.

use super::{
    Actor, CommandLine, CommandResult, Context, Handler, parse_bool, report_error, require_admin,
    require_moderator,
};
use async_trait::async_trait;
use std::time::Duration;

/// How long a ban-list clear waits for its confirmation.
const CONFIRM_WINDOW: Duration = Duration::from_secs(30);

/// Seniority check shared by ban and unban. Replies with the refusal text
/// and returns false when the actor may not touch the target.
async fn check_target(ctx: &Context<'_>, target: &Actor, verb: &str) -> Result<bool, super::CommandError> {
    if target.id == ctx.actor.id {
        ctx.reply(format!("You can't {verb} yourself from making suggestions."))
            .await?;
        return Ok(false);
    }
    if target.is_owner {
        ctx.reply(format!(
            "You can't {verb} the community owner from making suggestions."
        ))
        .await?;
        return Ok(false);
    }
    if target.rank >= ctx.actor.rank && !ctx.actor.is_owner {
        ctx.reply(format!("You can't {verb} that member from making suggestions."))
            .await?;
        return Ok(false);
    }
    Ok(true)
}

/// Handler for the `suggestionban` command.
///
/// `suggestionban <member>`
pub struct BanHandler;

#[async_trait]
impl Handler for BanHandler {
    async fn handle(&self, ctx: &mut Context<'_>, _line: &CommandLine<'_>) -> CommandResult {
        if !require_moderator(ctx).await? {
            return Ok(());
        }
        let Some(target) = ctx.target else {
            return ctx.reply("You need to name a member to ban.").await;
        };
        if !check_target(ctx, target, "ban").await? {
            return Ok(());
        }

        match ctx.engine.ban(ctx.community, target.id, ctx.actor.id).await {
            Ok(crate::engine::BanOutcome::Added) => ctx.tick().await,
            Ok(crate::engine::BanOutcome::AlreadyBanned) => {
                ctx.reply("That member is already banned from making suggestions.")
                    .await
            }
            Err(e) => report_error(ctx, "suggestionban", e).await,
        }
    }
}

/// Handler for the `suggestionunban` command.
///
/// `suggestionunban <member>`
pub struct UnbanHandler;

#[async_trait]
impl Handler for UnbanHandler {
    async fn handle(&self, ctx: &mut Context<'_>, _line: &CommandLine<'_>) -> CommandResult {
        if !require_moderator(ctx).await? {
            return Ok(());
        }
        let Some(target) = ctx.target else {
            return ctx.reply("You need to name a member to unban.").await;
        };
        if !check_target(ctx, target, "unban").await? {
            return Ok(());
        }

        match ctx.engine.unban(ctx.community, target.id).await {
            Ok(crate::engine::UnbanOutcome::Removed) => ctx.tick().await,
            Ok(crate::engine::UnbanOutcome::NotBanned) => {
                ctx.reply("That member isn't banned from making suggestions.")
                    .await
            }
            Err(e) => report_error(ctx, "suggestionunban", e).await,
        }
    }
}

/// Handler for the `suggestionbans` command: list the ban set.
pub struct ListBansHandler;

#[async_trait]
impl Handler for ListBansHandler {
    async fn handle(&self, ctx: &mut Context<'_>, _line: &CommandLine<'_>) -> CommandResult {
        if !require_moderator(ctx).await? {
            return Ok(());
        }

        match ctx.engine.banned_members(ctx.community).await {
            Ok(bans) if bans.is_empty() => {
                ctx.reply("No members are banned from making suggestions.")
                    .await
            }
            Ok(bans) => {
                let members: Vec<String> =
                    bans.iter().map(|ban| ban.member.to_string()).collect();
                ctx.reply(format!("Banned members: {}", members.join(", ")))
                    .await
            }
            Err(e) => report_error(ctx, "suggestionbans", e).await,
        }
    }
}

/// Handler for the `suggestionclearbans` command.
///
/// Clears the whole ban set after an explicit yes within a 30 second
/// window; a timeout aborts with no mutation.
pub struct ClearBansHandler;

#[async_trait]
impl Handler for ClearBansHandler {
    async fn handle(&self, ctx: &mut Context<'_>, _line: &CommandLine<'_>) -> CommandResult {
        if !require_admin(ctx).await? {
            return Ok(());
        }

        match ctx.engine.banned_members(ctx.community).await {
            Ok(bans) if bans.is_empty() => {
                return ctx
                    .reply("No members are banned from making suggestions.")
                    .await;
            }
            Ok(_) => {}
            Err(e) => return report_error(ctx, "suggestionclearbans", e).await,
        }

        ctx.reply(
            "Are you sure you want to clear all members banned from making suggestions? \
             Respond with yes or no.",
        )
        .await?;

        let answer = tokio::time::timeout(CONFIRM_WINDOW, ctx.confirmations.recv()).await;
        match answer {
            Err(_) => {
                ctx.reply(
                    "You never responded, please use the command again to clear all the \
                     banned members.",
                )
                .await
            }
            Ok(Some(answer)) if parse_bool(&answer) == Some(true) => {
                match ctx.engine.clear_bans(ctx.community).await {
                    Ok(_) => ctx.tick().await,
                    Err(e) => report_error(ctx, "suggestionclearbans", e).await,
                }
            }
            Ok(_) => ctx.reply("Ok, I won't unban anyone.").await,
        }
    }
}

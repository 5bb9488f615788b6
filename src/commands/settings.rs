//! The `suggestset` settings group.

use super::{
    CommandLine, CommandResult, Context, Handler, parse_bool, parse_channel, report_error,
    require_admin,
};
use crate::store::CommunitySettings;
use crate::transport::{ChannelId, MessageContent, Symbol, Transport};
use async_trait::async_trait;

/// Which channel binding a subcommand touches.
#[derive(Clone, Copy)]
enum Binding {
    Submission,
    Approved,
    Rejected,
}

/// Handler for the `suggestset` group.
///
/// Subcommands: channel, approved, rejected, same, upsymbol, downsymbol,
/// autodelete, delete, attachments, settings.
pub struct SuggestSetHandler;

#[async_trait]
impl Handler for SuggestSetHandler {
    async fn handle(&self, ctx: &mut Context<'_>, line: &CommandLine<'_>) -> CommandResult {
        if !require_admin(ctx).await? {
            return Ok(());
        }
        let Some(sub) = line.shift() else {
            return ctx
                .reply(
                    "Subcommands: channel, approved, rejected, same, upsymbol, downsymbol, \
                     autodelete, delete, attachments, settings",
                )
                .await;
        };

        match sub.name().to_ascii_lowercase().as_str() {
            "channel" => set_channel(ctx, &sub, Binding::Submission).await,
            "approved" => set_channel(ctx, &sub, Binding::Approved).await,
            "rejected" => set_channel(ctx, &sub, Binding::Rejected).await,
            "same" => set_same(ctx, &sub).await,
            "upsymbol" => set_symbol(ctx, &sub, true).await,
            "downsymbol" => set_symbol(ctx, &sub, false).await,
            "autodelete" => {
                toggle(
                    ctx,
                    &sub,
                    |s| s.delete_on_submit,
                    |s, v| s.delete_on_submit = v,
                    "Auto deletion is now enabled.",
                    "Auto deletion is now disabled.",
                )
                .await
            }
            "delete" => {
                toggle(
                    ctx,
                    &sub,
                    |s| s.delete_on_resolve,
                    |s, v| s.delete_on_resolve = v,
                    "Suggestions will be deleted upon approving/rejecting from the original \
                     suggestion channel.",
                    "Suggestions will stay in the original channel after approving/rejecting.",
                )
                .await
            }
            "attachments" => {
                toggle(
                    ctx,
                    &sub,
                    |s| s.allow_attachments,
                    |s, v| s.allow_attachments = v,
                    "Attachments are now allowed on suggestions.",
                    "Attachments are now ignored on suggestions.",
                )
                .await
            }
            "settings" => show_settings(ctx).await,
            other => {
                ctx.reply(format!("Unknown suggestset subcommand: {other}"))
                    .await
            }
        }
    }
}

/// Bind or clear one of the three channels. No argument clears the binding.
async fn set_channel(ctx: &Context<'_>, line: &CommandLine<'_>, binding: Binding) -> CommandResult {
    let channel = match line.arg(0) {
        Some(arg) => match parse_channel(arg) {
            Some(channel) => Some(channel),
            None => return ctx.reply(format!("That doesn't look like a channel: {arg}")).await,
        },
        None => None,
    };

    let result = ctx
        .engine
        .update_settings(ctx.community, |s| match binding {
            Binding::Submission => s.submission_channel = channel,
            Binding::Approved => s.approved_channel = channel,
            Binding::Rejected => s.rejected_channel = channel,
        })
        .await;

    match result {
        Ok(_) => ctx.tick().await,
        Err(e) => report_error(ctx, "suggestset", e).await,
    }
}

async fn set_same(ctx: &Context<'_>, line: &CommandLine<'_>) -> CommandResult {
    let Some(same) = line.arg(0).and_then(parse_bool) else {
        return ctx.reply("Usage: suggestset same <true|false>").await;
    };

    match ctx.engine.update_settings(ctx.community, |s| s.same_channel = same).await {
        Ok(_) => {
            ctx.reply(if same {
                "Suggestions won't be reposted anywhere, only their title will change accordingly."
            } else {
                "Suggestions will go to their appropriate channels upon approving/rejecting."
            })
            .await
        }
        Err(e) => report_error(ctx, "suggestset", e).await,
    }
}

/// Set or clear a custom vote symbol. A new symbol is validated by reacting
/// with it on the request message first.
async fn set_symbol(ctx: &Context<'_>, line: &CommandLine<'_>, up: bool) -> CommandResult {
    let symbol = match line.arg(0) {
        Some(glyph) => {
            let symbol = Symbol::new(glyph);
            if let Some((channel, message)) = ctx.origin
                && ctx
                    .engine
                    .transport()
                    .add_reaction(channel, message, &symbol)
                    .await
                    .is_err()
            {
                return ctx.reply("Uh oh, I cannot use that emoji.").await;
            }
            Some(symbol)
        }
        None => None,
    };

    let result = ctx
        .engine
        .update_settings(ctx.community, |s| {
            if up {
                s.up_symbol = symbol.clone();
            } else {
                s.down_symbol = symbol.clone();
            }
        })
        .await;

    match result {
        Ok(_) => ctx.tick().await,
        Err(e) => report_error(ctx, "suggestset", e).await,
    }
}

/// Flip or explicitly set a boolean setting. An explicit value always wins;
/// the flip happens only when the argument is omitted.
async fn toggle(
    ctx: &Context<'_>,
    line: &CommandLine<'_>,
    get: fn(&CommunitySettings) -> bool,
    set: fn(&mut CommunitySettings, bool),
    enabled_text: &str,
    disabled_text: &str,
) -> CommandResult {
    let explicit = line.arg(0).and_then(parse_bool);

    let mut enabled = false;
    let result = ctx
        .engine
        .update_settings(ctx.community, |s| {
            let target = explicit.unwrap_or(!get(s));
            set(s, target);
            enabled = target;
        })
        .await;

    match result {
        Ok(_) => ctx.reply(if enabled { enabled_text } else { disabled_text }).await,
        Err(e) => report_error(ctx, "suggestset", e).await,
    }
}

fn format_channel(channel: Option<ChannelId>) -> String {
    match channel {
        Some(channel) => format!("#{channel}"),
        None => "None".to_string(),
    }
}

/// Current settings overview.
async fn show_settings(ctx: &Context<'_>) -> CommandResult {
    let settings = match ctx.engine.settings(ctx.community).await {
        Ok(settings) => settings,
        Err(e) => return report_error(ctx, "suggestset", e).await,
    };

    let mut content = MessageContent {
        title: "Suggestion settings".to_string(),
        footer: "*required to function properly".to_string(),
        ..Default::default()
    };
    content.push_field("Same channel*:", settings.same_channel.to_string());
    content.push_field(
        "Suggestion channel*:",
        format_channel(settings.submission_channel),
    );
    content.push_field("Approved channel:", format_channel(settings.approved_channel));
    content.push_field("Rejected channel:", format_channel(settings.rejected_channel));
    content.push_field("Up symbol:", settings.up_or_default().to_string());
    content.push_field("Down symbol:", settings.down_or_default().to_string());
    content.push_field(
        "Delete suggestion command upon use:",
        settings.delete_on_submit.to_string(),
    );
    content.push_field(
        "Delete suggestion upon approving/rejecting:",
        settings.delete_on_resolve.to_string(),
    );
    content.push_field("Allow attachments:", settings.allow_attachments.to_string());

    ctx.display(content).await
}

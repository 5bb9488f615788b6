//! Text command surface.
//!
//! A thin layer mapping command lines onto engine operations: a [`Handler`]
//! per command, a [`Registry`] for dispatch, and a [`Context`] carrying the
//! requesting actor as resolved by the front-end. Replies are a success
//! tick or a short plain-text explanation; permission failures never leak
//! internal state.

mod bans;
mod line;
mod resolve;
mod settings;
mod suggest;

pub use bans::{BanHandler, ClearBansHandler, ListBansHandler, UnbanHandler};
pub use line::CommandLine;
pub use resolve::{AddReasonHandler, ApproveHandler, RejectHandler, ShowSuggestionHandler};
pub use settings::SuggestSetHandler;
pub use suggest::SuggestHandler;

use crate::engine::Engine;
use crate::error::SuggestError;
use crate::transport::{ChannelId, CommunityId, MessageContent, MessageId, Profile};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// A member acting through the command surface, with the seniority data the
/// ban rules need. Resolution from platform identities happens in the
/// front-end.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: u64,
    pub name: String,
    pub discriminator: String,
    /// Seniority rank inside the community; higher outranks lower.
    pub rank: u32,
    pub is_owner: bool,
    pub is_admin: bool,
    pub is_moderator: bool,
}

impl Actor {
    pub fn profile(&self) -> Profile {
        Profile {
            id: self.id,
            name: self.name.clone(),
            discriminator: self.discriminator.clone(),
        }
    }
}

/// A reply to the requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Success acknowledgment.
    Tick,
    Text(String),
    Display(MessageContent),
}

/// Errors that can occur while handling a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("send error: {0}")]
    Send(#[from] mpsc::error::SendError<Reply>),
}

/// Result type for command handlers.
pub type CommandResult = Result<(), CommandError>;

/// Handler context passed to each command handler.
pub struct Context<'a> {
    pub community: CommunityId,
    /// The requesting member.
    pub actor: &'a Actor,
    /// Ban/unban target resolved by the front-end, when the command names
    /// one.
    pub target: Option<&'a Actor>,
    /// The message that carried the command, when the front-end has one.
    pub origin: Option<(ChannelId, MessageId)>,
    /// Single attachment image URL on the request message.
    pub attachment: Option<&'a str>,
    pub engine: &'a Arc<Engine>,
    /// Sender for replies to the requester.
    pub replies: &'a mpsc::Sender<Reply>,
    /// Follow-up answers for confirmation prompts (ban-list clearing).
    pub confirmations: &'a mut mpsc::Receiver<String>,
}

impl Context<'_> {
    pub async fn reply(&self, text: impl Into<String>) -> CommandResult {
        self.replies.send(Reply::Text(text.into())).await?;
        Ok(())
    }

    pub async fn tick(&self) -> CommandResult {
        self.replies.send(Reply::Tick).await?;
        Ok(())
    }

    pub async fn display(&self, content: MessageContent) -> CommandResult {
        self.replies.send(Reply::Display(content)).await?;
        Ok(())
    }
}

/// A command handler.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: &mut Context<'_>, line: &CommandLine<'_>) -> CommandResult;
}

/// Command registry for dispatching input lines to handlers.
pub struct Registry {
    handlers: HashMap<&'static str, Arc<dyn Handler>>,
}

impl Registry {
    /// Build the registry with all built-in commands and their aliases.
    pub fn new() -> Self {
        let mut handlers: HashMap<&'static str, Arc<dyn Handler>> = HashMap::new();

        let mut add = |names: &[&'static str], handler: Arc<dyn Handler>| {
            for name in names {
                handlers.insert(name, Arc::clone(&handler));
            }
        };

        add(&["suggest"], Arc::new(SuggestHandler));
        add(&["approve"], Arc::new(ApproveHandler));
        add(&["reject"], Arc::new(RejectHandler));
        add(&["addreason"], Arc::new(AddReasonHandler));
        add(&["showsuggestion"], Arc::new(ShowSuggestionHandler));
        add(&["suggestset", "suggestion"], Arc::new(SuggestSetHandler));
        add(
            &["suggestionban", "suggestban", "bansuggest"],
            Arc::new(BanHandler),
        );
        add(
            &["suggestionunban", "suggestunban", "unbansuggest"],
            Arc::new(UnbanHandler),
        );
        add(
            &["suggestionbans", "listsuggestionbans"],
            Arc::new(ListBansHandler),
        );
        add(
            &["suggestionclearbans", "clearsuggestionbans"],
            Arc::new(ClearBansHandler),
        );

        Self { handlers }
    }

    /// Dispatch one input line. Blank input is ignored; unknown commands
    /// get a plain-text reply.
    pub async fn dispatch(&self, ctx: &mut Context<'_>, input: &str) -> CommandResult {
        let Some(line) = CommandLine::parse(input) else {
            return Ok(());
        };
        let name = line.name().to_ascii_lowercase();

        match self.handlers.get(name.as_str()) {
            Some(handler) => {
                crate::metrics::record_command(&name);
                let handler = Arc::clone(handler);
                handler.handle(ctx, &line).await
            }
            None => ctx.reply(format!("Unknown command: {name}")).await,
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Reply with the user-facing explanation for a failed engine call and
/// record it in the error counter. Internal faults also hit the log.
pub(crate) async fn report_error(
    ctx: &Context<'_>,
    command: &'static str,
    err: SuggestError,
) -> CommandResult {
    crate::metrics::record_command_error(command, err.error_code());
    match &err {
        SuggestError::AlreadyExists(_) | SuggestError::Db(_) | SuggestError::Transport(_) => {
            tracing::error!(command, error = %err, "command failed");
        }
        _ => {}
    }
    ctx.reply(err.user_message()).await
}

/// Admin gate. Replies and returns false when the actor lacks the rank.
pub(crate) async fn require_admin(ctx: &Context<'_>) -> Result<bool, CommandError> {
    if ctx.actor.is_admin || ctx.actor.is_owner {
        return Ok(true);
    }
    ctx.reply("You don't have permission to do that.").await?;
    Ok(false)
}

/// Moderator gate (admins and the owner pass too).
pub(crate) async fn require_moderator(ctx: &Context<'_>) -> Result<bool, CommandError> {
    if ctx.actor.is_moderator || ctx.actor.is_admin || ctx.actor.is_owner {
        return Ok(true);
    }
    ctx.reply("You don't have permission to do that.").await?;
    Ok(false)
}

/// Loose boolean parsing for toggle arguments and confirmations.
pub(crate) fn parse_bool(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Channel argument parsing; a leading `#` is accepted.
pub(crate) fn parse_channel(input: &str) -> Option<ChannelId> {
    input.trim().trim_start_matches('#').parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("yes"), Some(true));
        assert_eq!(parse_bool("On"), Some(true));
        assert_eq!(parse_bool("FALSE"), Some(false));
        assert_eq!(parse_bool("no"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_parse_channel() {
        assert_eq!(parse_channel("#42"), Some(42));
        assert_eq!(parse_channel("42"), Some(42));
        assert_eq!(parse_channel("#general"), None);
    }

    #[test]
    fn test_registry_knows_aliases() {
        let registry = Registry::new();
        for name in [
            "suggest",
            "approve",
            "reject",
            "addreason",
            "showsuggestion",
            "suggestset",
            "suggestion",
            "suggestionban",
            "bansuggest",
            "suggestionunban",
            "unbansuggest",
            "suggestionbans",
            "suggestionclearbans",
        ] {
            assert!(registry.handlers.contains_key(name), "missing {name}");
        }
    }
}

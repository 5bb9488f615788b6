//! The suggestion lifecycle.
//!
//! `Pending → {Approved, Rejected}`, both terminal. Submission allocates an
//! id, creates the record, posts the display and seeds the vote reactions;
//! resolution tallies the votes, routes the display and writes the terminal
//! state; reason back-fill is the only mutation allowed on a finished
//! record. The reaction guard enforces single-choice voting, and the
//! erasure sweep anonymizes an author across all communities.

use super::router::Transition;
use super::{Engine, display, notify, router, tally};
use crate::error::{SuggestError, from_transport};
use crate::store::{DbError, SuggestionRecord};
use crate::transport::{
    ChannelId, CommunityId, MSG_ORPHANED, MemberId, MessageContent, MessageId, Profile,
    SuggestionId, Symbol, TransportError,
};
use tracing::{info, warn};

/// A submission request.
pub struct SubmitRequest<'a> {
    pub community: CommunityId,
    pub author: &'a Profile,
    pub body: &'a str,
    /// Single attachment image URL; dropped unless the community allows
    /// attachments.
    pub attachment: Option<&'a str>,
    /// The message that carried the request, deleted when the community has
    /// `delete_on_submit` set.
    pub origin: Option<(ChannelId, MessageId)>,
}

/// What a successful submission did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub id: SuggestionId,
    pub message_id: MessageId,
    /// Whether the triggering request message was deleted.
    pub origin_deleted: bool,
}

/// Terminal resolution of a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Approve,
    Reject,
}

impl Resolution {
    fn transition(self) -> Transition {
        match self {
            Self::Approve => Transition::Approve,
            Self::Reject => Transition::Reject,
        }
    }

    fn past_tense(self) -> &'static str {
        match self {
            Self::Approve => "approved",
            Self::Reject => "rejected",
        }
    }
}

impl Engine {
    /// Submit a new suggestion.
    ///
    /// The ban check runs before any store mutation. The record is created
    /// with `message_id = 0` before the transport post, so a failed post
    /// leaves an unposted record that lookups report as nonexistent while
    /// the id sequence stays gap-free.
    pub async fn submit(&self, req: SubmitRequest<'_>) -> Result<SubmitOutcome, SuggestError> {
        let settings = self.db.settings().load(req.community).await?;

        if self.db.bans().contains(req.community, req.author.id).await? {
            return Err(SuggestError::Banned);
        }
        let channel = router::resolve(&settings, Transition::Submit)
            .ok_or(SuggestError::NoChannelConfigured)?;

        let id = self.allocate_id(req.community).await?;
        let attachment = req.attachment.filter(|_| settings.allow_attachments);
        let record = SuggestionRecord::new(req.author, req.body, attachment);

        if let Err(e) = self.db.suggestions().create(req.community, id, &record).await {
            return Err(match e {
                DbError::Duplicate => {
                    tracing::error!(
                        community = req.community,
                        id,
                        "suggestion id already taken; allocator invariant violated"
                    );
                    SuggestError::AlreadyExists(id)
                }
                other => other.into(),
            });
        }

        let author = display::AuthorView::resolve(Some(req.author), &record);
        let content = display::base(id, &record, &author);
        let message_id = self
            .transport
            .post_message(channel, &content)
            .await
            .map_err(from_transport)?;

        self.seed_votes(channel, message_id, &settings.up_or_default(), &settings.down_or_default())
            .await?;

        self.mutate(req.community, id, |r| r.message_id = message_id)
            .await?;

        let mut origin_deleted = false;
        if settings.delete_on_submit
            && let Some((origin_channel, origin_message)) = req.origin
        {
            match self.transport.delete_message(origin_channel, origin_message).await {
                Ok(()) => origin_deleted = true,
                Err(e) => {
                    warn!(community = req.community, error = %e, "failed to delete request message")
                }
            }
        }

        crate::metrics::inc_suggestions_submitted();
        info!(community = req.community, id, message_id, "suggestion submitted");

        Ok(SubmitOutcome {
            id,
            message_id,
            origin_deleted,
        })
    }

    async fn seed_votes(
        &self,
        channel: ChannelId,
        message: MessageId,
        up: &Symbol,
        down: &Symbol,
    ) -> Result<(), SuggestError> {
        self.transport
            .add_reaction(channel, message, up)
            .await
            .map_err(from_transport)?;
        self.transport
            .add_reaction(channel, message, down)
            .await
            .map_err(from_transport)?;
        Ok(())
    }

    /// Resolve a suggestion to a terminal state.
    ///
    /// The per-key critical section covers the whole read-check-mutate, so
    /// concurrent resolutions serialize: the loser observes `finished` and
    /// gets `AlreadyFinished`.
    pub async fn resolve(
        &self,
        community: CommunityId,
        moderator: MemberId,
        id: SuggestionId,
        resolution: Resolution,
        reason: Option<&str>,
    ) -> Result<SuggestionRecord, SuggestError> {
        let _guard = self.suggestion_locks.acquire((community, id)).await;

        let mut record = self
            .db
            .suggestions()
            .fetch(community, id)
            .await?
            .filter(SuggestionRecord::is_posted)
            .ok_or(SuggestError::NotFound(id))?;
        if record.finished {
            return Err(SuggestError::AlreadyFinished(id));
        }

        let settings = self.db.settings().load(community).await?;
        let source = settings
            .submission_channel
            .ok_or(SuggestError::NoChannelConfigured)?;

        let fetched = match self.transport.fetch_message(source, record.message_id).await {
            Ok(message) => message,
            Err(TransportError::NotFound(_)) => return Err(SuggestError::SourceMessageMissing),
            Err(e) => return Err(from_transport(e)),
        };

        let up = settings.up_or_default();
        let down = settings.down_or_default();
        let totals = tally::tally(&fetched.reactions, &up, &down);

        record.finished = true;
        match resolution {
            Resolution::Approve => record.approved = true,
            Resolution::Reject => record.rejected = true,
        }
        if let Some(reason) = reason {
            record.has_reason = true;
            record.reason = Some(reason.to_string());
        }

        let author_profile = match record.author_id {
            Some(member) => self.transport.fetch_user(member).await.ok().flatten(),
            None => None,
        };
        let author = display::AuthorView::resolve(author_profile.as_ref(), &record);

        let mut content = display::base(id, &record, &author);
        content.push_field(display::RESULTS_FIELD, totals.render(&up, &down));
        if let Some(reason) = &record.reason {
            content.push_field(display::REASON_FIELD, reason.clone());
        }

        record.message_id = self
            .route_display(&settings, resolution, source, record.message_id, &content)
            .await?;

        self.db.suggestions().update(community, id, &record).await?;

        match resolution {
            Resolution::Approve => crate::metrics::inc_suggestions_approved(),
            Resolution::Reject => crate::metrics::inc_suggestions_rejected(),
        }
        info!(
            community,
            id,
            moderator,
            outcome = resolution.past_tense(),
            up = totals.up,
            down = totals.down,
            "suggestion resolved"
        );

        notify::notify_author(
            self.transport.as_ref(),
            record.author_id,
            &format!("Your suggestion has been {}!", resolution.past_tense()),
            &content,
        )
        .await;

        Ok(record)
    }

    /// Move or edit the display according to the routing policy, returning
    /// the message id to store.
    async fn route_display(
        &self,
        settings: &crate::store::CommunitySettings,
        resolution: Resolution,
        source: ChannelId,
        message_id: MessageId,
        content: &MessageContent,
    ) -> Result<MessageId, SuggestError> {
        if settings.same_channel {
            // Edit in place; nothing moves.
            self.transport
                .edit_message(source, message_id, content)
                .await
                .map_err(from_transport)?;
            return Ok(message_id);
        }

        let destination = router::resolve(settings, resolution.transition());
        if let Some(destination) = destination {
            if settings.delete_on_resolve
                && let Err(e) = self.transport.delete_message(source, message_id).await
            {
                warn!(error = %e, "failed to delete source message");
            }
            self.transport
                .post_message(destination, content)
                .await
                .map_err(from_transport)
        } else if settings.delete_on_resolve {
            // No destination configured: the record alone carries the
            // outcome from here on.
            if let Err(e) = self.transport.delete_message(source, message_id).await {
                warn!(error = %e, "failed to delete source message");
            }
            Ok(MSG_ORPHANED)
        } else {
            Ok(message_id)
        }
    }

    /// Back-fill a reason on a rejected suggestion.
    ///
    /// The live display is edited best-effort (an orphaned record has no
    /// message to edit); the reason itself is always persisted.
    pub async fn add_reason(
        &self,
        community: CommunityId,
        moderator: MemberId,
        id: SuggestionId,
        reason: &str,
    ) -> Result<(), SuggestError> {
        let _guard = self.suggestion_locks.acquire((community, id)).await;

        let mut record = self
            .db
            .suggestions()
            .fetch(community, id)
            .await?
            .filter(SuggestionRecord::is_posted)
            .ok_or(SuggestError::NotFound(id))?;
        if !record.rejected {
            return Err(SuggestError::NotRejected(id));
        }
        if record.has_reason {
            return Err(SuggestError::ReasonAlreadySet(id));
        }

        record.has_reason = true;
        record.reason = Some(reason.to_string());

        if record.message_id > MSG_ORPHANED {
            let settings = self.db.settings().load(community).await?;
            let channel = if settings.same_channel {
                settings.submission_channel
            } else {
                settings.rejected_channel
            };
            if let Some(channel) = channel {
                self.append_reason_field(channel, record.message_id, reason)
                    .await;
            }
        }

        self.db.suggestions().update(community, id, &record).await?;
        info!(community, id, moderator, "reason back-filled");
        Ok(())
    }

    /// Append the Reason field to whatever the live message displays.
    async fn append_reason_field(&self, channel: ChannelId, message: MessageId, reason: &str) {
        let mut content = match self.transport.fetch_message(channel, message).await {
            Ok(fetched) => fetched.content,
            Err(e) => {
                warn!(error = %e, "reason back-fill could not locate the display");
                return;
            }
        };
        content.push_field(display::REASON_FIELD, reason);
        if let Err(e) = self.transport.edit_message(channel, message, &content).await {
            warn!(error = %e, "failed to edit display for reason back-fill");
        }
    }

    /// Rebuild the current display content from the stored record.
    pub async fn show(
        &self,
        community: CommunityId,
        id: SuggestionId,
    ) -> Result<MessageContent, SuggestError> {
        let record = self
            .db
            .suggestions()
            .fetch(community, id)
            .await?
            .filter(SuggestionRecord::is_posted)
            .ok_or(SuggestError::NotFound(id))?;

        let author_profile = match record.author_id {
            Some(member) => self.transport.fetch_user(member).await.ok().flatten(),
            None => None,
        };
        let author = display::AuthorView::resolve(author_profile.as_ref(), &record);
        Ok(display::from_record(id, &record, &author))
    }

    /// Single-choice voting guard, driven by reaction-add events.
    ///
    /// When anyone but the engine reacts on a tracked submission message,
    /// their other reactions on that message are removed. Runs once per
    /// event; failures are logged and swallowed.
    pub async fn reaction_guard(
        &self,
        community: CommunityId,
        channel: ChannelId,
        message: MessageId,
        member: MemberId,
        added: &Symbol,
    ) {
        if member == self.self_member {
            return;
        }

        let settings = match self.db.settings().load(community).await {
            Ok(settings) => settings,
            Err(e) => {
                warn!(community, error = %e, "reaction guard could not load settings");
                return;
            }
        };
        if settings.submission_channel != Some(channel) {
            return;
        }

        let fetched = match self.transport.fetch_message(channel, message).await {
            Ok(fetched) => fetched,
            Err(_) => return,
        };

        for reaction in &fetched.reactions {
            if reaction.symbol != *added && reaction.members.contains(&member) {
                if let Err(e) = self
                    .transport
                    .remove_reaction(channel, message, &reaction.symbol, member)
                    .await
                {
                    tracing::debug!(member, error = %e, "failed to strip duplicate vote");
                }
            }
        }
    }

    /// Data-erasure hook: anonymize every suggestion authored by `member`
    /// across all communities. Bodies and resolutions survive. Returns how
    /// many records were cleared.
    pub async fn erase_member(&self, member: MemberId) -> Result<u64, SuggestError> {
        let mut cleared = 0;
        for community in self.db.settings().communities().await? {
            for id in self.db.settings().allocated_ids(community).await? {
                let Some(record) = self.db.suggestions().fetch(community, id).await? else {
                    continue;
                };
                if record.author_id == Some(member) {
                    self.db.suggestions().clear_author(community, id).await?;
                    cleared += 1;
                }
            }
        }
        if cleared > 0 {
            info!(member, cleared, "author data erased");
        }
        Ok(cleared)
    }

    /// Scoped read-modify-write of one record under its critical section.
    pub(crate) async fn mutate<F>(
        &self,
        community: CommunityId,
        id: SuggestionId,
        update: F,
    ) -> Result<SuggestionRecord, SuggestError>
    where
        F: FnOnce(&mut SuggestionRecord),
    {
        let _guard = self.suggestion_locks.acquire((community, id)).await;

        let mut record = self
            .db
            .suggestions()
            .fetch(community, id)
            .await?
            .ok_or(SuggestError::NotFound(id))?;
        update(&mut record);
        self.db.suggestions().update(community, id, &record).await?;
        Ok(record)
    }
}

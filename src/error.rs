//! Unified error handling for suggestd.
//!
//! One variant per recoverable lifecycle failure, with a static code for
//! metric labeling and a plain-text explanation for the reply surface.

use crate::store::DbError;
use crate::transport::{SuggestionId, TransportError};
use thiserror::Error;

/// Errors surfaced by lifecycle operations.
#[derive(Debug, Error)]
pub enum SuggestError {
    #[error("no suggestion channel configured")]
    NoChannelConfigured,

    #[error("suggestion channel deleted")]
    ChannelDeleted,

    #[error("suggestion {0} not found")]
    NotFound(SuggestionId),

    #[error("suggestion {0} already finished")]
    AlreadyFinished(SuggestionId),

    #[error("suggestion {0} has not been rejected")]
    NotRejected(SuggestionId),

    #[error("suggestion {0} already has a reason")]
    ReasonAlreadySet(SuggestionId),

    #[error("member is banned from submitting")]
    Banned,

    #[error("source message missing")]
    SourceMessageMissing,

    /// Allocator invariant violation: a record already exists under a
    /// freshly allocated id. Never user-caused; the operation aborts with
    /// prior state untouched.
    #[error("record already exists for suggestion {0}")]
    AlreadyExists(SuggestionId),

    #[error("transport denied the operation")]
    Forbidden,

    #[error("store error: {0}")]
    Db(#[from] DbError),

    #[error("transport error: {0}")]
    Transport(TransportError),
}

impl SuggestError {
    /// Static error code for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoChannelConfigured => "no_channel_configured",
            Self::ChannelDeleted => "channel_deleted",
            Self::NotFound(_) => "not_found",
            Self::AlreadyFinished(_) => "already_finished",
            Self::NotRejected(_) => "not_rejected",
            Self::ReasonAlreadySet(_) => "reason_already_set",
            Self::Banned => "banned",
            Self::SourceMessageMissing => "source_message_missing",
            Self::AlreadyExists(_) => "already_exists",
            Self::Forbidden => "forbidden",
            Self::Db(_) => "store_error",
            Self::Transport(_) => "transport_error",
        }
    }

    /// Short plain-text explanation shown to the requester. Never leaks
    /// internal state.
    pub fn user_message(&self) -> String {
        match self {
            Self::NoChannelConfigured => {
                "Uh oh, no channel has been set for suggestions.".to_string()
            }
            Self::ChannelDeleted => {
                "Uh oh, it looks like the suggestion channel has been deleted.".to_string()
            }
            Self::NotFound(_) => "Uh oh, that suggestion doesn't seem to exist.".to_string(),
            Self::AlreadyFinished(_) => "This suggestion has been finished already.".to_string(),
            Self::NotRejected(_) => "This suggestion hasn't been rejected.".to_string(),
            Self::ReasonAlreadySet(_) => "This suggestion already has a reason.".to_string(),
            Self::Banned => "You are banned from making suggestions here.".to_string(),
            Self::SourceMessageMissing => {
                "Uh oh, message with this ID doesn't exist.".to_string()
            }
            Self::Forbidden => "I'm not allowed to do that.".to_string(),
            Self::AlreadyExists(_) | Self::Db(_) | Self::Transport(_) => {
                "Something went wrong, please try again later.".to_string()
            }
        }
    }
}

/// Map a transport failure outside of message lookups: a missing channel
/// means the binding is stale, everything else passes through.
pub(crate) fn from_transport(err: TransportError) -> SuggestError {
    match err {
        TransportError::ChannelMissing(_) => SuggestError::ChannelDeleted,
        TransportError::Forbidden => SuggestError::Forbidden,
        other => SuggestError::Transport(other),
    }
}

//! Destination resolution for suggestion transitions.

use crate::store::CommunitySettings;
use crate::transport::ChannelId;

/// A requested movement of a suggestion's display message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Submit,
    Approve,
    Reject,
}

/// Resolve the channel a transition targets, if one is configured.
///
/// Submissions always go to the submission channel. In same-channel mode
/// resolutions stay where the suggestion was posted (edit in place); any
/// absent destination means "do not repost".
pub fn resolve(settings: &CommunitySettings, transition: Transition) -> Option<ChannelId> {
    match transition {
        Transition::Submit => settings.submission_channel,
        Transition::Approve | Transition::Reject if settings.same_channel => {
            settings.submission_channel
        }
        Transition::Approve => settings.approved_channel,
        Transition::Reject => settings.rejected_channel,
    }
}

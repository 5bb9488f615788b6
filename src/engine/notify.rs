//! Best-effort author notification.

use crate::transport::{MemberId, MessageContent, Transport, TransportError};

/// Tell the author their suggestion was resolved. A `Forbidden` from the
/// transport is discarded here, at this one call site; the author may have
/// closed their direct messages. Other failures are logged and dropped.
pub(crate) async fn notify_author(
    transport: &dyn Transport,
    author: Option<MemberId>,
    text: &str,
    content: &MessageContent,
) {
    let Some(member) = author else { return };

    match transport.send_direct(member, text, content).await {
        Ok(()) => {}
        Err(TransportError::Forbidden) => {
            crate::metrics::inc_notifications_blocked();
            tracing::debug!(member, "author unreachable for notification");
        }
        Err(e) => {
            tracing::warn!(member, error = %e, "failed to notify author");
        }
    }
}

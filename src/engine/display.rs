//! Display content building.
//!
//! Rebuilds the user-visible representation of a suggestion from its stored
//! record: title line, state-dependent author line, body, footer, optional
//! attachment image and the Reason field.

use crate::store::SuggestionRecord;
use crate::transport::{MessageContent, Profile, SuggestionId};

/// Field name for the vote results appended at resolution time.
pub const RESULTS_FIELD: &str = "Results:";
/// Field name for a rejection reason.
pub const REASON_FIELD: &str = "Reason:";

/// Author identity as shown on a display: the live profile when the
/// transport still resolves it, else the snapshot captured at submission,
/// else an anonymous placeholder (post-erasure).
#[derive(Debug, Clone)]
pub struct AuthorView {
    pub id: Option<u64>,
    pub name: String,
    pub discriminator: String,
}

impl AuthorView {
    pub fn resolve(profile: Option<&Profile>, record: &SuggestionRecord) -> Self {
        if let Some(profile) = profile {
            return Self {
                id: Some(profile.id),
                name: profile.name.clone(),
                discriminator: profile.discriminator.clone(),
            };
        }
        match (&record.author_name, &record.author_discriminator) {
            (Some(name), Some(discriminator)) => Self {
                id: record.author_id,
                name: name.clone(),
                discriminator: discriminator.clone(),
            },
            _ => Self {
                id: None,
                name: "Unknown".to_string(),
                discriminator: "0000".to_string(),
            },
        }
    }
}

/// State-dependent author line.
fn author_line(record: &SuggestionRecord, author: &AuthorView) -> String {
    if record.finished {
        if record.approved {
            format!("Approved suggestion by {}", author.name)
        } else {
            format!("Rejected suggestion by {}", author.name)
        }
    } else {
        format!("Suggestion by {}", author.name)
    }
}

/// Base display for a record: everything except appended fields.
pub fn base(id: SuggestionId, record: &SuggestionRecord, author: &AuthorView) -> MessageContent {
    MessageContent {
        title: format!("Suggestion #{id}"),
        author_line: author_line(record, author),
        body: record.body.clone(),
        fields: Vec::new(),
        image: record.attachment_url.clone(),
        footer: format!(
            "Suggested by {}#{} ({})",
            author.name,
            author.discriminator,
            author.id.unwrap_or(0)
        ),
    }
}

/// Full display rebuild for `show` and reason back-fill: base content plus
/// the Reason field when one is recorded.
pub fn from_record(
    id: SuggestionId,
    record: &SuggestionRecord,
    author: &AuthorView,
) -> MessageContent {
    let mut content = base(id, record, author);
    if record.has_reason
        && let Some(reason) = &record.reason
    {
        content.push_field(REASON_FIELD, reason.clone());
    }
    content
}

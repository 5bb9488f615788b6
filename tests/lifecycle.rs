//! Integration tests for the suggestion lifecycle: submission, resolution,
//! routing, tallying and the reaction guard.

mod common;

use common::{APPROVED_CHANNEL, COMMUNITY, SUBMIT_CHANNEL, author, testbed};
use std::sync::Arc;
use suggestd::SuggestError;
use suggestd::engine::display::{REASON_FIELD, RESULTS_FIELD};
use suggestd::engine::{Resolution, SubmitRequest};
use suggestd::transport::{MSG_ORPHANED, Symbol, Transport};

#[tokio::test]
async fn test_submit_posts_display_and_seeds_votes() {
    let bed = testbed().await;

    let outcome = bed.submit(21, "Add dark mode").await;
    assert_eq!(outcome.id, 1);

    let content = bed.transport.content(outcome.message_id).unwrap();
    assert_eq!(content.title, "Suggestion #1");
    assert_eq!(content.author_line, "Suggestion by member21");
    assert_eq!(content.body, "Add dark mode");
    assert_eq!(content.footer, "Suggested by member21#0001 (21)");

    // Both vote symbols seeded by the engine, no member entries yet.
    let reactions = bed.transport.reactions(outcome.message_id);
    assert_eq!(reactions.len(), 2);
    assert!(reactions.iter().all(|r| r.count == 1 && r.members.is_empty()));
}

#[tokio::test]
async fn test_submit_ids_are_sequential() {
    let bed = testbed().await;

    for expected in 1..=4u64 {
        let outcome = bed.submit(21, "another one").await;
        assert_eq!(outcome.id, expected);
    }
}

#[tokio::test]
async fn test_concurrent_submissions_never_share_an_id() {
    let bed = testbed().await;

    let mut handles = Vec::new();
    for member in 0..12u64 {
        let engine = Arc::clone(&bed.engine);
        handles.push(tokio::spawn(async move {
            let profile = author(100 + member);
            engine
                .submit(SubmitRequest {
                    community: COMMUNITY,
                    author: &profile,
                    body: "concurrent",
                    attachment: None,
                    origin: None,
                })
                .await
                .expect("submit")
                .id
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort_unstable();
    assert_eq!(ids, (1..=12).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_submit_without_channel_fails() {
    let bed = testbed().await;
    bed.engine
        .update_settings(COMMUNITY, |s| s.submission_channel = None)
        .await
        .unwrap();

    let profile = author(21);
    let err = bed
        .engine
        .submit(SubmitRequest {
            community: COMMUNITY,
            author: &profile,
            body: "nowhere to go",
            attachment: None,
            origin: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, SuggestError::NoChannelConfigured));
}

#[tokio::test]
async fn test_banned_member_cannot_submit() {
    let bed = testbed().await;
    bed.engine.ban(COMMUNITY, 21, 1).await.unwrap();

    let profile = author(21);
    let err = bed
        .engine
        .submit(SubmitRequest {
            community: COMMUNITY,
            author: &profile,
            body: "let me in",
            attachment: None,
            origin: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, SuggestError::Banned));

    // Rejected before any store mutation: the id space is untouched.
    assert_eq!(bed.engine.settings(COMMUNITY).await.unwrap().next_id, 1);

    // Unban restores submission.
    bed.engine.unban(COMMUNITY, 21).await.unwrap();
    assert_eq!(bed.submit(21, "let me in").await.id, 1);
}

#[tokio::test]
async fn test_delete_on_submit_removes_request_message() {
    let bed = testbed().await;
    bed.engine
        .update_settings(COMMUNITY, |s| s.delete_on_submit = true)
        .await
        .unwrap();

    // The triggering request message lives in the submission channel.
    let request_id = bed
        .transport
        .post_message(SUBMIT_CHANNEL, &Default::default())
        .await
        .unwrap();

    let profile = author(21);
    let outcome = bed
        .engine
        .submit(SubmitRequest {
            community: COMMUNITY,
            author: &profile,
            body: "tidy",
            attachment: None,
            origin: Some((SUBMIT_CHANNEL, request_id)),
        })
        .await
        .unwrap();

    assert!(outcome.origin_deleted);
    assert!(bed.transport.content(request_id).is_none());
}

#[tokio::test]
async fn test_attachment_respects_allow_flag() {
    let bed = testbed().await;

    let profile = author(21);
    let outcome = bed
        .engine
        .submit(SubmitRequest {
            community: COMMUNITY,
            author: &profile,
            body: "with image",
            attachment: Some("http://img/1.png"),
            origin: None,
        })
        .await
        .unwrap();
    let content = bed.transport.content(outcome.message_id).unwrap();
    assert_eq!(content.image.as_deref(), Some("http://img/1.png"));

    bed.engine
        .update_settings(COMMUNITY, |s| s.allow_attachments = false)
        .await
        .unwrap();
    let outcome = bed
        .engine
        .submit(SubmitRequest {
            community: COMMUNITY,
            author: &profile,
            body: "no image",
            attachment: Some("http://img/2.png"),
            origin: None,
        })
        .await
        .unwrap();
    let content = bed.transport.content(outcome.message_id).unwrap();
    assert!(content.image.is_none());
}

#[tokio::test]
async fn test_approve_without_destination_deletes_and_orphans() {
    let bed = testbed().await;
    let outcome = bed.submit(21, "Add dark mode").await;

    let record = bed
        .engine
        .resolve(COMMUNITY, 1, outcome.id, Resolution::Approve, None)
        .await
        .unwrap();

    // delete_on_resolve defaults true, no approved channel configured.
    assert!(record.finished && record.approved && !record.rejected);
    assert_eq!(record.message_id, MSG_ORPHANED);
    assert!(bed.transport.content(outcome.message_id).is_none());
}

#[tokio::test]
async fn test_approve_with_destination_reposts() {
    let bed = testbed().await;
    bed.engine
        .update_settings(COMMUNITY, |s| s.approved_channel = Some(APPROVED_CHANNEL))
        .await
        .unwrap();
    let outcome = bed.submit(21, "Add dark mode").await;

    let record = bed
        .engine
        .resolve(COMMUNITY, 1, outcome.id, Resolution::Approve, None)
        .await
        .unwrap();

    // Source deleted, fresh post in the approved channel.
    assert!(bed.transport.content(outcome.message_id).is_none());
    assert_ne!(record.message_id, outcome.message_id);
    assert_eq!(
        bed.transport.channel_messages(APPROVED_CHANNEL),
        vec![record.message_id]
    );

    let content = bed.transport.content(record.message_id).unwrap();
    assert_eq!(content.author_line, "Approved suggestion by member21");
    assert!(content.field(RESULTS_FIELD).is_some());
}

#[tokio::test]
async fn test_keep_source_when_delete_on_resolve_off() {
    let bed = testbed().await;
    bed.engine
        .update_settings(COMMUNITY, |s| {
            s.approved_channel = Some(APPROVED_CHANNEL);
            s.delete_on_resolve = false;
        })
        .await
        .unwrap();
    let outcome = bed.submit(21, "keep me around").await;

    let record = bed
        .engine
        .resolve(COMMUNITY, 1, outcome.id, Resolution::Approve, None)
        .await
        .unwrap();

    // Reposted, but the original stays.
    assert!(bed.transport.content(outcome.message_id).is_some());
    assert!(bed.transport.content(record.message_id).is_some());
    assert_ne!(record.message_id, outcome.message_id);
}

#[tokio::test]
async fn test_no_destination_no_delete_keeps_message_id() {
    let bed = testbed().await;
    bed.engine
        .update_settings(COMMUNITY, |s| s.delete_on_resolve = false)
        .await
        .unwrap();
    let outcome = bed.submit(21, "stay put").await;

    let record = bed
        .engine
        .resolve(COMMUNITY, 1, outcome.id, Resolution::Approve, None)
        .await
        .unwrap();

    // Nothing to repost into, nothing deleted: the record alone flips.
    assert_eq!(record.message_id, outcome.message_id);
    assert!(bed.transport.content(outcome.message_id).is_some());
    assert!(record.finished && record.approved);
}

#[tokio::test]
async fn test_same_channel_reject_edits_in_place() {
    let bed = testbed().await;
    bed.engine
        .update_settings(COMMUNITY, |s| s.same_channel = true)
        .await
        .unwrap();
    let outcome = bed.submit(21, "Use tabs everywhere").await;

    let record = bed
        .engine
        .resolve(
            COMMUNITY,
            1,
            outcome.id,
            Resolution::Reject,
            Some("duplicate"),
        )
        .await
        .unwrap();

    assert_eq!(record.message_id, outcome.message_id);
    assert!(record.finished && record.rejected && !record.approved);
    assert!(record.has_reason);

    let content = bed.transport.content(outcome.message_id).unwrap();
    assert_eq!(content.author_line, "Rejected suggestion by member21");
    assert_eq!(content.field(REASON_FIELD), Some("duplicate"));
    assert_eq!(
        bed.transport.channel_messages(SUBMIT_CHANNEL),
        vec![outcome.message_id]
    );
}

#[tokio::test]
async fn test_tally_excludes_engine_seed() {
    let bed = testbed().await;
    let outcome = bed.submit(21, "Add dark mode").await;

    let up = Symbol::default_up();
    for member in [31, 32, 33] {
        bed.transport.react(outcome.message_id, member, &up);
    }

    bed.engine
        .update_settings(COMMUNITY, |s| s.approved_channel = Some(APPROVED_CHANNEL))
        .await
        .unwrap();
    let record = bed
        .engine
        .resolve(COMMUNITY, 1, outcome.id, Resolution::Approve, None)
        .await
        .unwrap();

    let content = bed.transport.content(record.message_id).unwrap();
    assert_eq!(
        content.field(RESULTS_FIELD),
        Some("3x \u{2705}\n0x \u{274e}")
    );
}

#[tokio::test]
async fn test_resolution_is_at_most_once() {
    let bed = testbed().await;
    let outcome = bed.submit(21, "Add dark mode").await;

    bed.engine
        .resolve(COMMUNITY, 1, outcome.id, Resolution::Approve, None)
        .await
        .unwrap();
    let err = bed
        .engine
        .resolve(COMMUNITY, 1, outcome.id, Resolution::Reject, None)
        .await
        .unwrap_err();
    assert!(matches!(err, SuggestError::AlreadyFinished(id) if id == outcome.id));
}

#[tokio::test]
async fn test_concurrent_resolutions_have_one_winner() {
    let bed = testbed().await;
    // Same-channel mode keeps both racers on the edit path.
    bed.engine
        .update_settings(COMMUNITY, |s| s.same_channel = true)
        .await
        .unwrap();
    let outcome = bed.submit(21, "race me").await;

    let mut handles = Vec::new();
    for resolution in [Resolution::Approve, Resolution::Reject] {
        let engine = Arc::clone(&bed.engine);
        handles.push(tokio::spawn(async move {
            engine
                .resolve(COMMUNITY, 1, outcome.id, resolution, None)
                .await
        }));
    }

    let mut wins = 0;
    let mut already_finished = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => wins += 1,
            Err(SuggestError::AlreadyFinished(_)) => already_finished += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!((wins, already_finished), (1, 1));

    let record = bed
        .engine
        .db()
        .suggestions()
        .fetch(COMMUNITY, outcome.id)
        .await
        .unwrap()
        .unwrap();
    // Terminal flags are consistent whoever won.
    assert!(record.finished);
    assert!(record.approved ^ record.rejected);
}

#[tokio::test]
async fn test_resolve_unknown_id_is_not_found() {
    let bed = testbed().await;
    let err = bed
        .engine
        .resolve(COMMUNITY, 1, 41, Resolution::Approve, None)
        .await
        .unwrap_err();
    assert!(matches!(err, SuggestError::NotFound(41)));
}

#[tokio::test]
async fn test_resolve_after_out_of_band_deletion() {
    let bed = testbed().await;
    let outcome = bed.submit(21, "gone soon").await;

    bed.transport
        .delete_message(SUBMIT_CHANNEL, outcome.message_id)
        .await
        .unwrap();

    let err = bed
        .engine
        .resolve(COMMUNITY, 1, outcome.id, Resolution::Approve, None)
        .await
        .unwrap_err();
    assert!(matches!(err, SuggestError::SourceMessageMissing));

    // The record is still pending; a later retry could succeed.
    let record = bed
        .engine
        .db()
        .suggestions()
        .fetch(COMMUNITY, outcome.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!record.finished);
}

#[tokio::test]
async fn test_author_is_notified_on_resolution() {
    let bed = testbed().await;
    let outcome = bed.submit(21, "tell me").await;

    bed.engine
        .resolve(COMMUNITY, 1, outcome.id, Resolution::Approve, None)
        .await
        .unwrap();

    let outbox = bed.transport.outbox();
    assert_eq!(outbox.len(), 1);
    assert_eq!(outbox[0].member, 21);
    assert_eq!(outbox[0].text, "Your suggestion has been approved!");
}

#[tokio::test]
async fn test_unreachable_author_is_swallowed() {
    let bed = testbed().await;
    bed.transport.set_unreachable(21);
    let outcome = bed.submit(21, "dms closed").await;

    // Resolution succeeds; the refused notification is discarded.
    bed.engine
        .resolve(COMMUNITY, 1, outcome.id, Resolution::Reject, None)
        .await
        .unwrap();
    assert!(bed.transport.outbox().is_empty());
}

#[tokio::test]
async fn test_add_reason_state_rules() {
    let bed = testbed().await;
    bed.engine
        .update_settings(COMMUNITY, |s| s.same_channel = true)
        .await
        .unwrap();

    let approved = bed.submit(21, "first").await;
    let rejected = bed.submit(21, "second").await;
    bed.engine
        .resolve(COMMUNITY, 1, approved.id, Resolution::Approve, None)
        .await
        .unwrap();
    bed.engine
        .resolve(COMMUNITY, 1, rejected.id, Resolution::Reject, None)
        .await
        .unwrap();

    // Approved records take no reason.
    let err = bed
        .engine
        .add_reason(COMMUNITY, 1, approved.id, "nope")
        .await
        .unwrap_err();
    assert!(matches!(err, SuggestError::NotRejected(_)));

    // First back-fill succeeds and edits the live display.
    bed.engine
        .add_reason(COMMUNITY, 1, rejected.id, "low demand")
        .await
        .unwrap();
    let content = bed.transport.content(rejected.message_id).unwrap();
    assert_eq!(content.field(REASON_FIELD), Some("low demand"));
    // The Results field from resolution time is still there.
    assert!(content.field(RESULTS_FIELD).is_some());

    // Second back-fill is refused.
    let err = bed
        .engine
        .add_reason(COMMUNITY, 1, rejected.id, "changed my mind")
        .await
        .unwrap_err();
    assert!(matches!(err, SuggestError::ReasonAlreadySet(_)));
}

#[tokio::test]
async fn test_add_reason_on_orphaned_record_persists() {
    let bed = testbed().await;
    let outcome = bed.submit(21, "orphan me").await;
    bed.engine
        .resolve(COMMUNITY, 1, outcome.id, Resolution::Reject, None)
        .await
        .unwrap();

    // No rejected channel, delete_on_resolve: the display is gone, the
    // reason still lands in the record.
    bed.engine
        .add_reason(COMMUNITY, 1, outcome.id, "late reason")
        .await
        .unwrap();

    let shown = bed.engine.show(COMMUNITY, outcome.id).await.unwrap();
    assert_eq!(shown.field(REASON_FIELD), Some("late reason"));
}

#[tokio::test]
async fn test_show_rebuilds_current_state() {
    let bed = testbed().await;
    let outcome = bed.submit(21, "Add dark mode").await;

    let pending = bed.engine.show(COMMUNITY, outcome.id).await.unwrap();
    assert_eq!(pending.author_line, "Suggestion by member21");

    bed.engine
        .resolve(COMMUNITY, 1, outcome.id, Resolution::Reject, Some("dupe"))
        .await
        .unwrap();

    let finished = bed.engine.show(COMMUNITY, outcome.id).await.unwrap();
    assert_eq!(finished.author_line, "Rejected suggestion by member21");
    assert_eq!(finished.field(REASON_FIELD), Some("dupe"));

    let err = bed.engine.show(COMMUNITY, 404).await.unwrap_err();
    assert!(matches!(err, SuggestError::NotFound(404)));
}

#[tokio::test]
async fn test_reaction_guard_enforces_single_choice() {
    let bed = testbed().await;
    let outcome = bed.submit(21, "vote once").await;

    let up = Symbol::default_up();
    let down = Symbol::default_down();

    // Member 31 votes up, then changes their mind and votes down.
    bed.transport.react(outcome.message_id, 31, &up);
    bed.transport.react(outcome.message_id, 31, &down);
    bed.engine
        .reaction_guard(COMMUNITY, SUBMIT_CHANNEL, outcome.message_id, 31, &down)
        .await;

    let reactions = bed.transport.reactions(outcome.message_id);
    let up_entry = reactions.iter().find(|r| r.symbol == up).unwrap();
    let down_entry = reactions.iter().find(|r| r.symbol == down).unwrap();
    assert!(!up_entry.members.contains(&31));
    assert!(down_entry.members.contains(&31));
    // Seeds survive.
    assert_eq!(up_entry.count, 1);
    assert_eq!(down_entry.count, 2);
}

#[tokio::test]
async fn test_reaction_guard_skips_engine_and_other_channels() {
    let bed = testbed().await;
    let outcome = bed.submit(21, "leave the seeds").await;

    let up = Symbol::default_up();
    bed.transport.react(outcome.message_id, 31, &up);

    // The engine's own reaction event does nothing.
    bed.engine
        .reaction_guard(
            COMMUNITY,
            SUBMIT_CHANNEL,
            outcome.message_id,
            common::ENGINE_MEMBER,
            &Symbol::default_down(),
        )
        .await;
    // Events outside the submission channel do nothing.
    bed.engine
        .reaction_guard(
            COMMUNITY,
            APPROVED_CHANNEL,
            outcome.message_id,
            31,
            &Symbol::default_down(),
        )
        .await;

    let reactions = bed.transport.reactions(outcome.message_id);
    let up_entry = reactions.iter().find(|r| r.symbol == up).unwrap();
    assert!(up_entry.members.contains(&31));
}

#[tokio::test]
async fn test_custom_symbols_seed_and_tally() {
    let bed = testbed().await;
    bed.engine
        .update_settings(COMMUNITY, |s| {
            s.up_symbol = Some(Symbol::new("👍"));
            s.down_symbol = Some(Symbol::new("👎"));
            s.same_channel = true;
        })
        .await
        .unwrap();

    let outcome = bed.submit(21, "custom votes").await;
    let reactions = bed.transport.reactions(outcome.message_id);
    assert!(reactions.iter().any(|r| r.symbol == Symbol::new("👍")));
    assert!(reactions.iter().any(|r| r.symbol == Symbol::new("👎")));

    bed.transport
        .react(outcome.message_id, 31, &Symbol::new("👎"));
    let record = bed
        .engine
        .resolve(COMMUNITY, 1, outcome.id, Resolution::Reject, None)
        .await
        .unwrap();

    let content = bed.transport.content(record.message_id).unwrap();
    assert_eq!(content.field(RESULTS_FIELD), Some("0x 👍\n1x 👎"));
}

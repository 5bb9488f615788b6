//! Integration test common infrastructure.
//!
//! Wires the engine to the in-memory transport and an in-memory database,
//! with a submission channel already bound.

#![allow(dead_code)]

use std::sync::Arc;
use suggestd::engine::{Engine, SubmitOutcome, SubmitRequest};
use suggestd::store::Database;
use suggestd::transport::{
    ChannelId, CommunityId, InMemoryTransport, MemberId, Profile, Transport,
};

pub const COMMUNITY: CommunityId = 7;
pub const SUBMIT_CHANNEL: ChannelId = 10;
pub const APPROVED_CHANNEL: ChannelId = 11;
pub const REJECTED_CHANNEL: ChannelId = 12;
/// The engine's own platform member id; its reactions are the vote seeds.
pub const ENGINE_MEMBER: MemberId = 999;

pub struct TestBed {
    pub engine: Arc<Engine>,
    pub transport: Arc<InMemoryTransport>,
}

/// Fresh engine with all three channels open and the submission channel
/// bound for [`COMMUNITY`].
pub async fn testbed() -> TestBed {
    let db = Database::new(":memory:").await.expect("database");
    let transport = Arc::new(InMemoryTransport::new());
    for channel in [SUBMIT_CHANNEL, APPROVED_CHANNEL, REJECTED_CHANNEL] {
        transport.open_channel(channel);
    }

    let dyn_transport: Arc<dyn Transport> = Arc::clone(&transport);
    let engine = Arc::new(Engine::new(db, dyn_transport, ENGINE_MEMBER));
    engine
        .update_settings(COMMUNITY, |s| s.submission_channel = Some(SUBMIT_CHANNEL))
        .await
        .expect("bind submission channel");

    TestBed { engine, transport }
}

pub fn author(id: MemberId) -> Profile {
    Profile {
        id,
        name: format!("member{id}"),
        discriminator: "0001".to_string(),
    }
}

impl TestBed {
    /// Submit on behalf of `author_id`, expecting success.
    pub async fn submit(&self, author_id: MemberId, body: &str) -> SubmitOutcome {
        let profile = author(author_id);
        self.engine
            .submit(SubmitRequest {
                community: COMMUNITY,
                author: &profile,
                body,
                attachment: None,
                origin: None,
            })
            .await
            .expect("submit")
    }
}

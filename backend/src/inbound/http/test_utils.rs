//! Mock-backed state for handler tests.

use std::sync::Arc;

use actix_web::web;

use crate::domain::ports::{
    MockForumEventSink, MockMemberRegistration, MockNotificationFeed, MockNotificationInbox,
    MockReputationQuery,
};
use crate::inbound::http::state::HttpState;

/// One mock per driving port. Unconfigured mocks panic when called, so each
/// test only sets up the port it exercises.
#[derive(Default)]
pub struct MockPorts {
    pub events: MockForumEventSink,
    pub reputation: MockReputationQuery,
    pub inbox: MockNotificationInbox,
    pub members: MockMemberRegistration,
    pub feed: MockNotificationFeed,
}

impl MockPorts {
    pub fn into_data(self) -> web::Data<HttpState> {
        web::Data::new(HttpState {
            events: Arc::new(self.events),
            reputation: Arc::new(self.reputation),
            inbox: Arc::new(self.inbox),
            members: Arc::new(self.members),
            feed: Arc::new(self.feed),
        })
    }
}

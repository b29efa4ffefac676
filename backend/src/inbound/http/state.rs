//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and only ever see driving
//! ports, so they can be exercised against mocks without any I/O.

use std::sync::Arc;

use crate::domain::ports::{
    ForumEventSink, MemberRegistration, NotificationFeed, NotificationInbox, ReputationQuery,
};

/// Port implementations backing the HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub events: Arc<dyn ForumEventSink>,
    pub reputation: Arc<dyn ReputationQuery>,
    pub inbox: Arc<dyn NotificationInbox>,
    pub members: Arc<dyn MemberRegistration>,
    pub feed: Arc<dyn NotificationFeed>,
}

impl HttpState {
    /// Back every driving port with one service and attach the live feed.
    pub fn from_service<T>(service: Arc<T>, feed: Arc<dyn NotificationFeed>) -> Self
    where
        T: ForumEventSink + ReputationQuery + NotificationInbox + MemberRegistration + 'static,
    {
        Self {
            events: service.clone(),
            reputation: service.clone(),
            inbox: service.clone(),
            members: service,
            feed,
        }
    }
}

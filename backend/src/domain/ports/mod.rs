//! Domain ports for the hexagonal boundary.
//!
//! Driven ports (repositories, directory, publisher) are implemented by the
//! outbound adapters. Driving ports (event sink, queries, inbox, registration)
//! are implemented by the domain services and consumed by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod forum_event_sink;
mod member_registration;
mod notification_inbox;
mod notification_publisher;
mod notification_repository;
mod reputation_query;
mod score_repository;
mod user_directory;

#[cfg(test)]
pub use forum_event_sink::MockForumEventSink;
pub use forum_event_sink::ForumEventSink;
#[cfg(test)]
pub use member_registration::MockMemberRegistration;
pub use member_registration::{MemberRegistration, RegisterMemberRequest};
#[cfg(test)]
pub use notification_inbox::MockNotificationInbox;
pub use notification_inbox::NotificationInbox;
#[cfg(test)]
pub use notification_publisher::{MockNotificationFeed, MockNotificationPublisher};
pub use notification_publisher::{
    NoOpNotificationPublisher, NotificationFeed, NotificationPublisher,
    NotificationPublisherError,
};
#[cfg(test)]
pub use notification_repository::MockNotificationRepository;
pub use notification_repository::{NotificationRepository, NotificationRepositoryError};
#[cfg(test)]
pub use reputation_query::MockReputationQuery;
pub use reputation_query::{LeaderboardEntry, RankUpAnnouncement, ReputationQuery, ScoreView};
#[cfg(test)]
pub use score_repository::MockScoreRepository;
pub use score_repository::{ScoreRepository, ScoreRepositoryError};
#[cfg(test)]
pub use user_directory::MockUserDirectory;
pub use user_directory::{UserDirectory, UserDirectoryError};

//! Live push of freshly stored notifications.

mod broadcast_publisher;

pub use broadcast_publisher::{BroadcastNotificationPublisher, DEFAULT_FEED_CAPACITY};

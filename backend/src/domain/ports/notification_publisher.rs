//! Push transport for freshly appended notifications.
//!
//! Storage stays pull-based; a publisher only forwards records to whoever is
//! listening right now. Publishing is best effort and never fails an append.

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::domain::{NotificationRecord, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors exposed when forwarding a notification.
    pub enum NotificationPublisherError {
        /// The transport rejected the record.
        Delivery { message: String } => "notification push failed: {message}",
    }
}

/// Outbound push of stored notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    /// Forward a stored record to live subscribers of its recipient.
    async fn publish(&self, record: &NotificationRecord) -> Result<(), NotificationPublisherError>;
}

/// Live per-recipient feed consumed by streaming endpoints.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationFeed: Send + Sync {
    /// Records published for `recipient` from now on.
    fn subscribe(&self, recipient: &UserId) -> BoxStream<'static, NotificationRecord>;
}

/// Publisher that drops every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpNotificationPublisher;

#[async_trait]
impl NotificationPublisher for NoOpNotificationPublisher {
    async fn publish(&self, _record: &NotificationRecord) -> Result<(), NotificationPublisherError> {
        Ok(())
    }
}

//! Port for notification persistence.
//!
//! Records are partitioned by recipient: every read or mutation names the
//! recipient so an adapter can never satisfy a lookup from someone else's
//! inbox.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{NewNotification, NotificationId, NotificationRecord, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by notification repository adapters.
    pub enum NotificationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "notification repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "notification repository query failed: {message}",
    }
}

/// Per-recipient notification log.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Store a new unread record and assign it the next sequence id.
    async fn append(
        &self,
        notification: &NewNotification,
        created_at: DateTime<Utc>,
    ) -> Result<NotificationRecord, NotificationRepositoryError>;

    /// All records for `recipient`, newest first.
    async fn list_for_recipient(
        &self,
        recipient: &UserId,
    ) -> Result<Vec<NotificationRecord>, NotificationRepositoryError>;

    /// Flag one record as read. Returns `false` if `recipient` has no record
    /// with that id; already-read records still return `true`.
    async fn mark_read(
        &self,
        recipient: &UserId,
        id: NotificationId,
    ) -> Result<bool, NotificationRepositoryError>;

    /// Flag every unread record as read, returning how many changed.
    async fn mark_all_read(&self, recipient: &UserId) -> Result<u64, NotificationRepositoryError>;

    /// Count of unread records.
    async fn unread_count(&self, recipient: &UserId) -> Result<u64, NotificationRepositoryError>;
}

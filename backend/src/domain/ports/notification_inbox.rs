//! Driving port for reading and acknowledging a member's notifications.

use async_trait::async_trait;

use crate::domain::{NotificationId, NotificationRecord, ReputationError, UserId};

/// Inbox operations exposed to inbound adapters.
///
/// Every call is scoped to a recipient; ids from another member's inbox are
/// reported as not found. Every call fails with
/// [`ReputationError::UnknownUser`] when the recipient is not registered.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationInbox: Send + Sync {
    /// All notifications, newest first.
    async fn notifications(
        &self,
        recipient: &UserId,
    ) -> Result<Vec<NotificationRecord>, ReputationError>;

    /// Number of unread notifications.
    async fn unread_count(&self, recipient: &UserId) -> Result<u64, ReputationError>;

    /// Mark one notification read. Repeating the call is harmless.
    ///
    /// # Errors
    /// [`ReputationError::NotificationNotFound`] when the id is not in the
    /// recipient's inbox.
    async fn mark_read(
        &self,
        recipient: &UserId,
        id: NotificationId,
    ) -> Result<(), ReputationError>;

    /// Mark everything read, returning how many records changed.
    async fn mark_all_read(&self, recipient: &UserId) -> Result<u64, ReputationError>;
}

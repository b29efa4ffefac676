//! Recipient-partitioned notification log with optional push forwarding.

use std::sync::Arc;

use mockable::Clock;
use tracing::{debug, warn};

use crate::domain::ports::{
    NotificationPublisher, NotificationRepository, NotificationRepositoryError, UserDirectory,
    UserDirectoryError,
};
use crate::domain::{NewNotification, NotificationId, NotificationRecord, ReputationError, UserId};

/// Owner of every notification record.
pub struct NotificationStore<N, D> {
    repo: Arc<N>,
    directory: Arc<D>,
    publisher: Arc<dyn NotificationPublisher>,
    clock: Arc<dyn Clock>,
}

impl<N, D> NotificationStore<N, D> {
    pub fn new(
        repo: Arc<N>,
        directory: Arc<D>,
        publisher: Arc<dyn NotificationPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repo,
            directory,
            publisher,
            clock,
        }
    }
}

pub(crate) fn map_notification_error(error: NotificationRepositoryError) -> ReputationError {
    match error {
        NotificationRepositoryError::Connection { message }
        | NotificationRepositoryError::Query { message } => {
            ReputationError::storage_unavailable(message)
        }
    }
}

pub(crate) fn map_directory_error(error: UserDirectoryError) -> ReputationError {
    match error {
        UserDirectoryError::Connection { message } | UserDirectoryError::Query { message } => {
            ReputationError::storage_unavailable(message)
        }
        UserDirectoryError::Duplicate { message } => ReputationError::duplicate_member(message),
    }
}

impl<N, D> NotificationStore<N, D>
where
    N: NotificationRepository,
    D: UserDirectory,
{
    /// Store a notification for a known recipient and forward it to live
    /// subscribers.
    ///
    /// # Errors
    /// - [`ReputationError::UnknownRecipient`] when the directory has no such
    ///   member.
    /// - [`ReputationError::StorageUnavailable`] on directory or repository
    ///   failure.
    pub async fn append(
        &self,
        notification: NewNotification,
    ) -> Result<NotificationRecord, ReputationError> {
        let known = self
            .directory
            .find(&notification.recipient)
            .await
            .map_err(map_directory_error)?;
        if known.is_none() {
            return Err(ReputationError::unknown_recipient(
                notification.recipient.to_string(),
            ));
        }

        let record = self
            .repo
            .append(&notification, self.clock.utc())
            .await
            .map_err(|err| {
                debug!(recipient = %notification.recipient, error = %err, "notification append failed");
                map_notification_error(err)
            })?;

        if let Err(err) = self.publisher.publish(&record).await {
            warn!(
                recipient = %record.recipient_id,
                notification_id = %record.id,
                error = %err,
                "notification stored but push failed"
            );
        }
        Ok(record)
    }

    /// Newest first.
    ///
    /// # Errors
    /// [`ReputationError::StorageUnavailable`] on repository failure.
    pub async fn list(&self, recipient: &UserId) -> Result<Vec<NotificationRecord>, ReputationError> {
        self.repo
            .list_for_recipient(recipient)
            .await
            .map_err(map_notification_error)
    }

    /// # Errors
    /// [`ReputationError::StorageUnavailable`] on repository failure.
    pub async fn unread_count(&self, recipient: &UserId) -> Result<u64, ReputationError> {
        self.repo
            .unread_count(recipient)
            .await
            .map_err(map_notification_error)
    }

    /// Idempotent: marking an already-read record succeeds.
    ///
    /// # Errors
    /// - [`ReputationError::NotificationNotFound`] when `id` is not in the
    ///   recipient's partition.
    /// - [`ReputationError::StorageUnavailable`] on repository failure.
    pub async fn mark_read(
        &self,
        recipient: &UserId,
        id: NotificationId,
    ) -> Result<(), ReputationError> {
        let found = self
            .repo
            .mark_read(recipient, id)
            .await
            .map_err(map_notification_error)?;
        if found {
            Ok(())
        } else {
            Err(ReputationError::notification_not_found(id.get()))
        }
    }

    /// Returns how many records flipped to read.
    ///
    /// # Errors
    /// [`ReputationError::StorageUnavailable`] on repository failure.
    pub async fn mark_all_read(&self, recipient: &UserId) -> Result<u64, ReputationError> {
        self.repo
            .mark_all_read(recipient)
            .await
            .map_err(map_notification_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        MockNotificationPublisher, MockNotificationRepository, MockUserDirectory,
        NoOpNotificationPublisher, NotificationPublisherError,
    };
    use crate::domain::{Handle, Member, NotificationKind};
    use chrono::{DateTime, Utc};
    use mockable::DefaultClock;

    fn member(id: &UserId) -> Member {
        Member::new(id.clone(), Handle::new("bob").expect("handle"))
    }

    fn stored(notification: &NewNotification, created_at: DateTime<Utc>) -> NotificationRecord {
        NotificationRecord {
            id: NotificationId::new(7),
            recipient_id: notification.recipient.clone(),
            kind: notification.kind,
            message: notification.message.clone(),
            link: notification.link.clone(),
            created_at,
            read: false,
        }
    }

    fn store(
        repo: MockNotificationRepository,
        directory: MockUserDirectory,
        publisher: Arc<dyn NotificationPublisher>,
    ) -> NotificationStore<MockNotificationRepository, MockUserDirectory> {
        NotificationStore::new(
            Arc::new(repo),
            Arc::new(directory),
            publisher,
            Arc::new(DefaultClock),
        )
    }

    #[tokio::test]
    async fn append_to_unknown_recipient_is_rejected_before_storage() {
        let mut directory = MockUserDirectory::new();
        directory.expect_find().return_once(|_| Ok(None));
        let mut repo = MockNotificationRepository::new();
        repo.expect_append().times(0);

        let error = store(repo, directory, Arc::new(NoOpNotificationPublisher))
            .append(NewNotification::new(
                UserId::random(),
                NotificationKind::Mention,
                "hi",
                None,
            ))
            .await
            .expect_err("unknown recipient");
        assert!(matches!(error, ReputationError::UnknownRecipient { .. }));
    }

    #[tokio::test]
    async fn append_publishes_stored_record() {
        let recipient = UserId::random();
        let known = member(&recipient);
        let mut directory = MockUserDirectory::new();
        directory.expect_find().return_once(move |_| Ok(Some(known)));
        let mut repo = MockNotificationRepository::new();
        repo.expect_append()
            .times(1)
            .returning(|notification, at| Ok(stored(notification, at)));
        let mut publisher = MockNotificationPublisher::new();
        publisher
            .expect_publish()
            .withf(|record: &NotificationRecord| record.id == NotificationId::new(7))
            .times(1)
            .return_once(|_| Ok(()));

        let record = store(repo, directory, Arc::new(publisher))
            .append(NewNotification::new(
                recipient.clone(),
                NotificationKind::Reply,
                "replied",
                Some("/post/1".to_owned()),
            ))
            .await
            .expect("append succeeds");
        assert_eq!(record.recipient_id, recipient);
        assert!(!record.read);
    }

    #[tokio::test]
    async fn push_failure_does_not_fail_append() {
        let recipient = UserId::random();
        let known = member(&recipient);
        let mut directory = MockUserDirectory::new();
        directory.expect_find().return_once(move |_| Ok(Some(known)));
        let mut repo = MockNotificationRepository::new();
        repo.expect_append()
            .returning(|notification, at| Ok(stored(notification, at)));
        let mut publisher = MockNotificationPublisher::new();
        publisher
            .expect_publish()
            .return_once(|_| Err(NotificationPublisherError::delivery("no listeners")));

        store(repo, directory, Arc::new(publisher))
            .append(NewNotification::new(recipient, NotificationKind::System, "x", None))
            .await
            .expect("append still succeeds");
    }

    #[tokio::test]
    async fn mark_read_outside_partition_is_not_found() {
        let mut repo = MockNotificationRepository::new();
        repo.expect_mark_read().return_once(|_, _| Ok(false));

        let error = store(repo, MockUserDirectory::new(), Arc::new(NoOpNotificationPublisher))
            .mark_read(&UserId::random(), NotificationId::new(3))
            .await
            .expect_err("not found");
        assert_eq!(error, ReputationError::notification_not_found(3_i64));
    }

    #[tokio::test]
    async fn repository_failures_map_to_storage_unavailable() {
        let mut repo = MockNotificationRepository::new();
        repo.expect_list_for_recipient()
            .return_once(|_| Err(NotificationRepositoryError::connection("down")));

        let error = store(repo, MockUserDirectory::new(), Arc::new(NoOpNotificationPublisher))
            .list(&UserId::random())
            .await
            .expect_err("unavailable");
        assert!(matches!(error, ReputationError::StorageUnavailable { .. }));
    }
}

//! In-process notification log, partitioned by recipient.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::ports::{NotificationRepository, NotificationRepositoryError};
use crate::domain::{NewNotification, NotificationId, NotificationRecord, UserId};

#[derive(Default)]
struct Inboxes {
    last_id: i64,
    by_recipient: HashMap<UserId, Vec<NotificationRecord>>,
}

/// Notification repository held entirely in memory.
///
/// Each recipient owns a separate vector, so a lookup can only ever touch the
/// named recipient's records.
#[derive(Default)]
pub struct InMemoryNotificationRepository {
    inboxes: Mutex<Inboxes>,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn append(
        &self,
        notification: &NewNotification,
        created_at: DateTime<Utc>,
    ) -> Result<NotificationRecord, NotificationRepositoryError> {
        let mut inboxes = self.inboxes.lock().await;
        inboxes.last_id += 1;
        let record = NotificationRecord {
            id: NotificationId::new(inboxes.last_id),
            recipient_id: notification.recipient.clone(),
            kind: notification.kind,
            message: notification.message.clone(),
            link: notification.link.clone(),
            created_at,
            read: false,
        };
        inboxes
            .by_recipient
            .entry(notification.recipient.clone())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn list_for_recipient(
        &self,
        recipient: &UserId,
    ) -> Result<Vec<NotificationRecord>, NotificationRepositoryError> {
        let inboxes = self.inboxes.lock().await;
        Ok(inboxes
            .by_recipient
            .get(recipient)
            .map(|records| records.iter().rev().cloned().collect())
            .unwrap_or_default())
    }

    async fn mark_read(
        &self,
        recipient: &UserId,
        id: NotificationId,
    ) -> Result<bool, NotificationRepositoryError> {
        let mut inboxes = self.inboxes.lock().await;
        let record = inboxes
            .by_recipient
            .get_mut(recipient)
            .and_then(|records| records.iter_mut().find(|record| record.id == id));
        Ok(record.map(|record| record.read = true).is_some())
    }

    async fn mark_all_read(&self, recipient: &UserId) -> Result<u64, NotificationRepositoryError> {
        let mut inboxes = self.inboxes.lock().await;
        let mut changed = 0_u64;
        if let Some(records) = inboxes.by_recipient.get_mut(recipient) {
            for record in records.iter_mut().filter(|record| !record.read) {
                record.read = true;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn unread_count(&self, recipient: &UserId) -> Result<u64, NotificationRepositoryError> {
        let inboxes = self.inboxes.lock().await;
        let unread = inboxes
            .by_recipient
            .get(recipient)
            .map_or(0, |records| records.iter().filter(|record| !record.read).count());
        Ok(u64::try_from(unread).unwrap_or(u64::MAX))
    }
}

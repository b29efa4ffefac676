//! PostgreSQL-backed `NotificationRepository`.
//!
//! Every statement filters on `recipient_id`, so a notification can only be
//! read or acknowledged through its owner's partition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{NotificationRepository, NotificationRepositoryError};
use crate::domain::{NewNotification, NotificationId, NotificationKind, NotificationRecord, UserId};

use super::diesel_error_mapping::map_basic_diesel_error;
use super::models::{NewNotificationRow, NotificationRow};
use super::pool::{DbPool, PoolError};
use super::schema::notifications;

/// Diesel implementation of the notification port.
#[derive(Clone)]
pub struct DieselNotificationRepository {
    pool: DbPool,
}

impl DieselNotificationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> NotificationRepositoryError {
    NotificationRepositoryError::connection(error.into_message())
}

fn map_diesel_error(error: DieselError) -> NotificationRepositoryError {
    map_basic_diesel_error(
        error,
        NotificationRepositoryError::query,
        NotificationRepositoryError::connection,
    )
}

fn row_to_record(row: NotificationRow) -> Result<NotificationRecord, NotificationRepositoryError> {
    let kind = NotificationKind::parse(&row.kind).ok_or_else(|| {
        NotificationRepositoryError::query(format!("unrecognised notification kind {}", row.kind))
    })?;
    Ok(NotificationRecord {
        id: NotificationId::new(row.id),
        recipient_id: UserId::from_uuid(row.recipient_id),
        kind,
        message: row.message,
        link: row.link,
        created_at: row.created_at,
        read: row.is_read,
    })
}

fn count_as_u64(count: usize) -> u64 {
    u64::try_from(count).unwrap_or(u64::MAX)
}

#[async_trait]
impl NotificationRepository for DieselNotificationRepository {
    async fn append(
        &self,
        notification: &NewNotification,
        created_at: DateTime<Utc>,
    ) -> Result<NotificationRecord, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = diesel::insert_into(notifications::table)
            .values(&NewNotificationRow {
                recipient_id: *notification.recipient.as_uuid(),
                kind: notification.kind.as_str(),
                message: &notification.message,
                link: notification.link.as_deref(),
                created_at,
            })
            .returning(NotificationRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        row_to_record(row)
    }

    async fn list_for_recipient(
        &self,
        recipient: &UserId,
    ) -> Result<Vec<NotificationRecord>, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<NotificationRow> = notifications::table
            .filter(notifications::recipient_id.eq(recipient.as_uuid()))
            .order(notifications::id.desc())
            .select(NotificationRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_record).collect()
    }

    async fn mark_read(
        &self,
        recipient: &UserId,
        id: NotificationId,
    ) -> Result<bool, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let touched = diesel::update(notifications::table)
            .filter(
                notifications::id
                    .eq(id.get())
                    .and(notifications::recipient_id.eq(recipient.as_uuid())),
            )
            .set(notifications::is_read.eq(true))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(touched > 0)
    }

    async fn mark_all_read(&self, recipient: &UserId) -> Result<u64, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let touched = diesel::update(notifications::table)
            .filter(
                notifications::recipient_id
                    .eq(recipient.as_uuid())
                    .and(notifications::is_read.eq(false)),
            )
            .set(notifications::is_read.eq(true))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(count_as_u64(touched))
    }

    async fn unread_count(&self, recipient: &UserId) -> Result<u64, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let unread: i64 = notifications::table
            .filter(
                notifications::recipient_id
                    .eq(recipient.as_uuid())
                    .and(notifications::is_read.eq(false)),
            )
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(u64::try_from(unread).unwrap_or_default())
    }
}

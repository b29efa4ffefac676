//! PostgreSQL-backed `UserDirectory`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::ports::{UserDirectory, UserDirectoryError};
use crate::domain::{Handle, Member, UserId};

use super::diesel_error_mapping::{is_unique_violation, map_basic_diesel_error};
use super::models::{MemberRow, NewMemberRow};
use super::pool::{DbPool, PoolError};
use super::schema::members;

/// Diesel implementation of the member directory.
#[derive(Clone)]
pub struct DieselUserDirectory {
    pool: DbPool,
}

impl DieselUserDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserDirectoryError {
    UserDirectoryError::connection(error.into_message())
}

fn map_diesel_error(error: DieselError) -> UserDirectoryError {
    map_basic_diesel_error(
        error,
        UserDirectoryError::query,
        UserDirectoryError::connection,
    )
}

fn row_to_member(row: MemberRow) -> Result<Member, UserDirectoryError> {
    let handle = Handle::new(row.handle).map_err(|error| {
        warn!(member_id = %row.id, %error, "stored handle failed validation");
        UserDirectoryError::query(format!("invalid stored handle: {error}"))
    })?;
    Ok(Member::new(UserId::from_uuid(row.id), handle))
}

#[async_trait]
impl UserDirectory for DieselUserDirectory {
    async fn register(&self, member: &Member) -> Result<(), UserDirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(members::table)
            .values(&NewMemberRow {
                id: *member.id.as_uuid(),
                handle: member.handle.as_ref(),
            })
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|error| {
                if is_unique_violation(&error) {
                    UserDirectoryError::duplicate(format!(
                        "id {} or handle {}",
                        member.id, member.handle
                    ))
                } else {
                    map_diesel_error(error)
                }
            })
    }

    async fn resolve_handle(&self, handle: &str) -> Result<Option<UserId>, UserDirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let id = members::table
            .filter(members::handle.eq(handle))
            .select(members::id)
            .first::<uuid::Uuid>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(id.map(UserId::from_uuid))
    }

    async fn find(&self, user_id: &UserId) -> Result<Option<Member>, UserDirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<MemberRow> = members::table
            .filter(members::id.eq(user_id.as_uuid()))
            .select(MemberRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_member).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use uuid::Uuid;

    #[rstest]
    fn valid_rows_convert_to_members() {
        let id = Uuid::new_v4();
        let member = row_to_member(MemberRow {
            id,
            handle: "alice".to_owned(),
        })
        .expect("valid row");
        assert_eq!(member.id, UserId::from_uuid(id));
        assert_eq!(member.handle.as_ref(), "alice");
    }

    #[rstest]
    fn corrupt_handles_are_reported() {
        let error = row_to_member(MemberRow {
            id: Uuid::new_v4(),
            handle: "not a handle".to_owned(),
        })
        .expect_err("invalid handle");
        assert!(matches!(error, UserDirectoryError::Query { .. }));
    }
}

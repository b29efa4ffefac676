//! PostgreSQL-backed `ScoreRepository`.
//!
//! The account row carries a `version` column; an award is a conditional
//! update on that column plus the event insert, committed in one
//! transaction.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{ScoreRepository, ScoreRepositoryError};
use crate::domain::{
    PointEvent, PointReason, RankTierId, ScoreRecord, ScoreUpdate, UserId, UserScore,
};

use super::diesel_error_mapping::map_basic_diesel_error;
use super::models::{NewPointEventRow, NewUserScoreRow, PointEventRow, UserScoreRow};
use super::pool::{DbPool, PoolError};
use super::schema::{point_events, user_scores};

/// Diesel implementation of the score port.
#[derive(Clone)]
pub struct DieselScoreRepository {
    pool: DbPool,
}

impl DieselScoreRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Columns written by an award. `None` leaves the pending announcement as
/// it is.
#[derive(AsChangeset)]
#[diesel(table_name = user_scores)]
struct ScoreChanges<'a> {
    total_points: i64,
    current_tier_id: &'a str,
    version: i64,
    pending_rank_up: Option<&'a str>,
    updated_at: chrono::DateTime<Utc>,
}

enum ApplyFailure {
    Stale,
    Diesel(DieselError),
}

impl From<DieselError> for ApplyFailure {
    fn from(error: DieselError) -> Self {
        Self::Diesel(error)
    }
}

fn map_pool_error(error: PoolError) -> ScoreRepositoryError {
    ScoreRepositoryError::connection(error.into_message())
}

fn map_diesel_error(error: DieselError) -> ScoreRepositoryError {
    map_basic_diesel_error(
        error,
        ScoreRepositoryError::query,
        ScoreRepositoryError::connection,
    )
}

fn limit_for_db(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn row_to_score(row: UserScoreRow) -> UserScore {
    UserScore {
        user_id: UserId::from_uuid(row.user_id),
        total_points: row.total_points,
        current_tier_id: RankTierId::new(row.current_tier_id),
    }
}

fn row_to_record(row: UserScoreRow) -> ScoreRecord {
    let version = row.version;
    let pending_rank_up = row.pending_rank_up.clone().map(RankTierId::new);
    ScoreRecord {
        score: row_to_score(row),
        version,
        pending_rank_up,
    }
}

fn row_to_event(row: PointEventRow) -> Result<PointEvent, ScoreRepositoryError> {
    let reason: PointReason = row.reason.parse().map_err(|_| {
        ScoreRepositoryError::query(format!("unrecognised point reason {}", row.reason))
    })?;
    Ok(PointEvent {
        id: row.id,
        user_id: UserId::from_uuid(row.user_id),
        amount: row.amount,
        reason,
        occurred_at: row.occurred_at,
    })
}

impl DieselScoreRepository {
    /// Explain a conditional update that touched nothing.
    async fn stale_update_error(
        &self,
        user_id: Uuid,
        expected: i64,
    ) -> ScoreRepositoryError {
        let mut conn = match self.pool.get().await {
            Ok(conn) => conn,
            Err(error) => return map_pool_error(error),
        };
        let current = user_scores::table
            .filter(user_scores::user_id.eq(user_id))
            .select(user_scores::version)
            .first::<i64>(&mut conn)
            .await
            .optional();
        match current {
            Ok(Some(actual)) => ScoreRepositoryError::version_mismatch(expected, actual),
            Ok(None) => ScoreRepositoryError::missing_account(user_id.to_string()),
            Err(error) => map_diesel_error(error),
        }
    }
}

#[async_trait]
impl ScoreRepository for DieselScoreRepository {
    async fn find_score(
        &self,
        user_id: &UserId,
    ) -> Result<Option<ScoreRecord>, ScoreRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserScoreRow> = user_scores::table
            .filter(user_scores::user_id.eq(user_id.as_uuid()))
            .select(UserScoreRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(row_to_record))
    }

    async fn open_account(&self, score: &UserScore) -> Result<bool, ScoreRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let inserted = diesel::insert_into(user_scores::table)
            .values(&NewUserScoreRow {
                user_id: *score.user_id.as_uuid(),
                total_points: score.total_points,
                current_tier_id: score.current_tier_id.as_ref(),
            })
            .on_conflict(user_scores::user_id)
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(inserted > 0)
    }

    async fn apply_update(&self, update: &ScoreUpdate) -> Result<ScoreRecord, ScoreRepositoryError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        let user_id = *update.event.user_id.as_uuid();
        let expected = update.expected_version;
        let changes = ScoreChanges {
            total_points: update.new_total,
            current_tier_id: update.new_tier_id.as_ref(),
            version: expected + 1,
            pending_rank_up: update.rank_up.as_ref().map(AsRef::as_ref),
            updated_at: update.event.occurred_at,
        };
        let event = NewPointEventRow {
            id: update.event.id,
            user_id,
            amount: update.event.amount,
            reason: update.event.reason.as_str(),
            occurred_at: update.event.occurred_at,
        };

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let outcome = conn
            .transaction::<UserScoreRow, ApplyFailure, _>(|conn| {
                async move {
                    let row = diesel::update(user_scores::table)
                        .filter(
                            user_scores::user_id
                                .eq(user_id)
                                .and(user_scores::version.eq(expected)),
                        )
                        .set(&changes)
                        .returning(UserScoreRow::as_returning())
                        .get_result(conn)
                        .await
                        .optional()?
                        .ok_or(ApplyFailure::Stale)?;

                    diesel::insert_into(point_events::table)
                        .values(&event)
                        .execute(conn)
                        .await?;
                    Ok(row)
                }
                .scope_boxed()
            })
            .await;
        drop(conn);

        match outcome {
            Ok(row) => Ok(row_to_record(row)),
            Err(ApplyFailure::Stale) => Err(self.stale_update_error(user_id, expected).await),
            Err(ApplyFailure::Diesel(error)) => Err(map_diesel_error(error)),
        }
    }

    async fn take_pending_rank_up(
        &self,
        user_id: &UserId,
    ) -> Result<Option<RankTierId>, ScoreRepositoryError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        let user_id = *user_id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let pending = conn
            .transaction::<Option<String>, DieselError, _>(|conn| {
                async move {
                    let pending = user_scores::table
                        .filter(user_scores::user_id.eq(user_id))
                        .select(user_scores::pending_rank_up)
                        .for_update()
                        .first::<Option<String>>(conn)
                        .await
                        .optional()?
                        .flatten();
                    if pending.is_some() {
                        diesel::update(user_scores::table)
                            .filter(user_scores::user_id.eq(user_id))
                            .set(user_scores::pending_rank_up.eq(None::<String>))
                            .execute(conn)
                            .await?;
                    }
                    Ok(pending)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        Ok(pending.map(RankTierId::new))
    }

    async fn list_events(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<PointEvent>, ScoreRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<PointEventRow> = point_events::table
            .filter(point_events::user_id.eq(user_id.as_uuid()))
            .order(point_events::seq.desc())
            .limit(limit_for_db(limit))
            .select(PointEventRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_event).collect()
    }

    async fn top_scores(&self, limit: usize) -> Result<Vec<UserScore>, ScoreRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<UserScoreRow> = user_scores::table
            .order((user_scores::total_points.desc(), user_scores::user_id.asc()))
            .limit(limit_for_db(limit))
            .select(UserScoreRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(row_to_score).collect())
    }
}

//! Port for score account persistence.
//!
//! The [`ScoreRepository`] stores one score row per user plus the append-only
//! point event log. Updates are guarded by an optimistic version so that
//! several writers (tasks or processes) cannot interleave a read-modify-write.

use async_trait::async_trait;

use crate::domain::{PointEvent, RankTierId, ScoreRecord, ScoreUpdate, UserId, UserScore};

use super::define_port_error;

define_port_error! {
    /// Errors raised by score repository adapters.
    pub enum ScoreRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "score repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "score repository query failed: {message}",
        /// No score account exists for the user.
        MissingAccount { user_id: String } =>
            "no score account for user {user_id}",
        /// The stored version moved on since the caller read it.
        VersionMismatch { expected: i64, actual: i64 } =>
            "version mismatch: expected {expected}, found {actual}",
    }
}

/// Port for score accounts and their point event log.
///
/// # Version Semantics
///
/// - A new account starts at version 0.
/// - Each successful [`ScoreRepository::apply_update`] increments the version.
/// - An update whose `expected_version` differs from the stored version fails
///   with [`ScoreRepositoryError::VersionMismatch`] and writes nothing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScoreRepository: Send + Sync {
    /// Fetch the score row for a user, if an account exists.
    async fn find_score(&self, user_id: &UserId)
    -> Result<Option<ScoreRecord>, ScoreRepositoryError>;

    /// Open an account. Returns `false` when one already exists, leaving it
    /// untouched.
    async fn open_account(&self, score: &UserScore) -> Result<bool, ScoreRepositoryError>;

    /// Atomically append `update.event` and move the account to the new total
    /// and tier. Either both land or neither does.
    ///
    /// When `update.rank_up` is set it replaces any unclaimed announcement;
    /// otherwise the stored announcement is left as it is.
    async fn apply_update(&self, update: &ScoreUpdate)
    -> Result<ScoreRecord, ScoreRepositoryError>;

    /// Read and clear the unclaimed rank-up announcement in one step.
    async fn take_pending_rank_up(
        &self,
        user_id: &UserId,
    ) -> Result<Option<RankTierId>, ScoreRepositoryError>;

    /// Point events for a user, newest first.
    async fn list_events(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<PointEvent>, ScoreRepositoryError>;

    /// Highest totals first; equal totals ordered by user id.
    async fn top_scores(&self, limit: usize) -> Result<Vec<UserScore>, ScoreRepositoryError>;
}

//! Cumulative point totals with per-user serialised updates.
//!
//! Two layers keep a user's read-modify-write from interleaving:
//! an in-process async lock per user id, and the repository's optimistic
//! version check for writers in other processes. A version mismatch is
//! retried with linear backoff until the retry budget runs out.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use mockable::Clock;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::ports::{ScoreRepository, ScoreRepositoryError};
use crate::domain::{
    PointEvent, PointReason, RankEvaluator, RankTier, RankTierId, ReputationError, ScoreRecord,
    ScoreUpdate, UserId, UserScore,
};

/// How often a conflicting update is retried before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Sleep before attempt `n + 1` is `backoff * n`.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_millis(20),
        }
    }
}

/// Result of one successful [`ScoreLedger::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub new_total: i64,
    /// The stored tier id differs from the one before the update.
    pub tier_changed: bool,
    /// Set when `tier_changed`.
    pub new_tier: Option<RankTier>,
    /// The new tier sits strictly above the previous one.
    pub advanced: bool,
    /// Audit record written with the update.
    pub event: PointEvent,
}

#[derive(Default)]
struct UserLocks {
    slots: Mutex<HashMap<UserId, Arc<AsyncMutex<()>>>>,
}

struct UserLockGuard<'a> {
    locks: &'a UserLocks,
    user_id: UserId,
    slot: Arc<AsyncMutex<()>>,
    held: Option<OwnedMutexGuard<()>>,
}

impl UserLocks {
    async fn acquire(&self, user_id: &UserId) -> UserLockGuard<'_> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(user_id.clone()).or_default())
        };
        // Built before the wait: a cancelled acquire still prunes its slot.
        // `waiting` is declared later, so it drops before `guard`.
        let mut guard = UserLockGuard {
            locks: self,
            user_id: user_id.clone(),
            slot,
            held: None,
        };
        let waiting = Arc::clone(&guard.slot).lock_owned();
        guard.held = Some(waiting.await);
        guard
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Drop for UserLockGuard<'_> {
    fn drop(&mut self) {
        drop(self.held.take());
        let mut slots = self
            .locks
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Only the map and this guard still reference the slot: nobody waits.
        if Arc::strong_count(&self.slot) == 2 {
            slots.remove(&self.user_id);
        }
    }
}

/// Owner of every user's score account and point event log.
pub struct ScoreLedger<S> {
    repo: Arc<S>,
    evaluator: RankEvaluator,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
    locks: UserLocks,
}

impl<S> ScoreLedger<S> {
    pub fn new(
        repo: Arc<S>,
        evaluator: RankEvaluator,
        clock: Arc<dyn Clock>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            repo,
            evaluator,
            clock,
            retry: RetryPolicy {
                max_attempts: retry.max_attempts.max(1),
                ..retry
            },
            locks: UserLocks::default(),
        }
    }

    pub fn evaluator(&self) -> &RankEvaluator {
        &self.evaluator
    }
}

pub(crate) fn map_score_error(error: ScoreRepositoryError) -> ReputationError {
    match error {
        ScoreRepositoryError::Connection { message } | ScoreRepositoryError::Query { message } => {
            ReputationError::storage_unavailable(message)
        }
        ScoreRepositoryError::MissingAccount { user_id } => {
            ReputationError::storage_unavailable(format!("score account vanished for {user_id}"))
        }
        ScoreRepositoryError::VersionMismatch { expected, actual } => {
            ReputationError::storage_unavailable(format!(
                "unexpected version mismatch (expected {expected}, found {actual})"
            ))
        }
    }
}

impl<S> ScoreLedger<S>
where
    S: ScoreRepository,
{
    /// Open a zero-point account in the first tier. Returns `false` if the
    /// account already existed.
    ///
    /// # Errors
    /// [`ReputationError::StorageUnavailable`] on repository failure.
    pub async fn open_account(&self, user_id: &UserId) -> Result<bool, ReputationError> {
        let opening = UserScore::opening(
            user_id.clone(),
            self.evaluator.table().first().id.clone(),
        );
        self.repo.open_account(&opening).await.map_err(map_score_error)
    }

    /// Add `amount` points to `user_id` for `reason`.
    ///
    /// Calls for the same user are serialised; calls for different users run
    /// independently.
    ///
    /// # Errors
    /// - [`ReputationError::InvalidEvent`] for a non-positive amount or a
    ///   total that would overflow.
    /// - [`ReputationError::UnknownUser`] when no account exists.
    /// - [`ReputationError::ConcurrencyConflict`] once the retry budget is
    ///   spent on version mismatches.
    /// - [`ReputationError::StorageUnavailable`] on repository failure.
    pub async fn apply(
        &self,
        user_id: &UserId,
        amount: i64,
        reason: PointReason,
    ) -> Result<ApplyOutcome, ReputationError> {
        if amount <= 0 {
            return Err(ReputationError::invalid_event(format!(
                "points for {reason} must be positive, found {amount}"
            )));
        }

        let _guard = self.locks.acquire(user_id).await;
        let event = PointEvent {
            id: Uuid::new_v4(),
            user_id: user_id.clone(),
            amount,
            reason,
            occurred_at: self.clock.utc(),
        };

        for attempt in 1..=self.retry.max_attempts {
            let current = self.load(user_id).await?;
            let update = self.plan_update(&current, &event)?;

            match self.repo.apply_update(&update).await {
                Ok(stored) => return Ok(self.outcome(&current, stored, event)),
                Err(ScoreRepositoryError::VersionMismatch { expected, actual }) => {
                    warn!(
                        user_id = %user_id,
                        reason = %reason,
                        attempt,
                        expected,
                        actual,
                        "score update lost a version race; retrying"
                    );
                    if attempt < self.retry.max_attempts {
                        tokio::time::sleep(self.retry.backoff * attempt).await;
                    }
                }
                Err(ScoreRepositoryError::MissingAccount { .. }) => {
                    return Err(ReputationError::unknown_user(user_id.clone()));
                }
                Err(other) => {
                    debug!(user_id = %user_id, error = %other, "score update failed");
                    return Err(map_score_error(other));
                }
            }
        }

        Err(ReputationError::concurrency_conflict(
            user_id.clone(),
            self.retry.max_attempts,
        ))
    }

    /// Current stored score.
    ///
    /// # Errors
    /// [`ReputationError::UnknownUser`] when no account exists.
    pub async fn score(&self, user_id: &UserId) -> Result<UserScore, ReputationError> {
        Ok(self.load(user_id).await?.score)
    }

    /// Newest-first point events.
    ///
    /// # Errors
    /// [`ReputationError::StorageUnavailable`] on repository failure.
    pub async fn history(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<PointEvent>, ReputationError> {
        self.repo
            .list_events(user_id, limit)
            .await
            .map_err(map_score_error)
    }

    /// Read and clear the pending rank-up announcement.
    ///
    /// # Errors
    /// [`ReputationError::StorageUnavailable`] on repository failure.
    pub async fn take_pending_rank_up(
        &self,
        user_id: &UserId,
    ) -> Result<Option<RankTierId>, ReputationError> {
        self.repo
            .take_pending_rank_up(user_id)
            .await
            .map_err(map_score_error)
    }

    /// Highest totals first.
    ///
    /// # Errors
    /// [`ReputationError::StorageUnavailable`] on repository failure.
    pub async fn top(&self, limit: usize) -> Result<Vec<UserScore>, ReputationError> {
        self.repo.top_scores(limit).await.map_err(map_score_error)
    }

    async fn load(&self, user_id: &UserId) -> Result<ScoreRecord, ReputationError> {
        self.repo
            .find_score(user_id)
            .await
            .map_err(map_score_error)?
            .ok_or_else(|| ReputationError::unknown_user(user_id.clone()))
    }

    fn plan_update(
        &self,
        current: &ScoreRecord,
        event: &PointEvent,
    ) -> Result<ScoreUpdate, ReputationError> {
        let new_total = current
            .score
            .total_points
            .checked_add(event.amount)
            .ok_or_else(|| {
                ReputationError::invalid_event(format!(
                    "adding {} points would overflow the total for {}",
                    event.amount, event.user_id
                ))
            })?;
        let new_tier = self.evaluator.evaluate(new_total);
        let advanced = self
            .evaluator
            .has_advanced(&current.score.current_tier_id, &new_tier.id);

        Ok(ScoreUpdate {
            event: event.clone(),
            expected_version: current.version,
            new_total,
            new_tier_id: new_tier.id.clone(),
            rank_up: advanced.then(|| new_tier.id.clone()),
        })
    }

    fn outcome(&self, before: &ScoreRecord, after: ScoreRecord, event: PointEvent) -> ApplyOutcome {
        let tier_changed = after.score.current_tier_id != before.score.current_tier_id;
        let advanced = self
            .evaluator
            .has_advanced(&before.score.current_tier_id, &after.score.current_tier_id);
        let new_tier = tier_changed
            .then(|| self.evaluator.table().tier(&after.score.current_tier_id).cloned())
            .flatten();

        if advanced {
            info!(
                user_id = %after.score.user_id,
                from = %before.score.current_tier_id,
                to = %after.score.current_tier_id,
                "member ranked up"
            );
        }

        ApplyOutcome {
            new_total: after.score.total_points,
            tier_changed,
            new_tier,
            advanced,
            event,
        }
    }
}

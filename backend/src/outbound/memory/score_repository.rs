//! In-process score accounts.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::ports::{ScoreRepository, ScoreRepositoryError};
use crate::domain::{PointEvent, RankTierId, ScoreRecord, ScoreUpdate, UserId, UserScore};

#[derive(Default)]
struct Ledger {
    accounts: HashMap<UserId, ScoreRecord>,
    events: HashMap<UserId, Vec<PointEvent>>,
}

/// Score repository held entirely in memory.
///
/// One mutex covers accounts and events so an update lands in both or
/// neither.
#[derive(Default)]
pub struct InMemoryScoreRepository {
    ledger: Mutex<Ledger>,
}

impl InMemoryScoreRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScoreRepository for InMemoryScoreRepository {
    async fn find_score(
        &self,
        user_id: &UserId,
    ) -> Result<Option<ScoreRecord>, ScoreRepositoryError> {
        Ok(self.ledger.lock().await.accounts.get(user_id).cloned())
    }

    async fn open_account(&self, score: &UserScore) -> Result<bool, ScoreRepositoryError> {
        let mut ledger = self.ledger.lock().await;
        if ledger.accounts.contains_key(&score.user_id) {
            return Ok(false);
        }
        ledger.accounts.insert(
            score.user_id.clone(),
            ScoreRecord {
                score: score.clone(),
                version: 0,
                pending_rank_up: None,
            },
        );
        Ok(true)
    }

    async fn apply_update(&self, update: &ScoreUpdate) -> Result<ScoreRecord, ScoreRepositoryError> {
        let mut ledger = self.ledger.lock().await;
        let user_id = &update.event.user_id;
        let Some(account) = ledger.accounts.get_mut(user_id) else {
            return Err(ScoreRepositoryError::missing_account(user_id.to_string()));
        };
        if account.version != update.expected_version {
            return Err(ScoreRepositoryError::version_mismatch(
                update.expected_version,
                account.version,
            ));
        }

        account.score.total_points = update.new_total;
        account.score.current_tier_id = update.new_tier_id.clone();
        account.version += 1;
        if let Some(tier) = &update.rank_up {
            account.pending_rank_up = Some(tier.clone());
        }
        let stored = account.clone();

        ledger
            .events
            .entry(user_id.clone())
            .or_default()
            .push(update.event.clone());
        Ok(stored)
    }

    async fn take_pending_rank_up(
        &self,
        user_id: &UserId,
    ) -> Result<Option<RankTierId>, ScoreRepositoryError> {
        let mut ledger = self.ledger.lock().await;
        Ok(ledger
            .accounts
            .get_mut(user_id)
            .and_then(|account| account.pending_rank_up.take()))
    }

    async fn list_events(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<PointEvent>, ScoreRepositoryError> {
        let ledger = self.ledger.lock().await;
        Ok(ledger
            .events
            .get(user_id)
            .map(|events| events.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn top_scores(&self, limit: usize) -> Result<Vec<UserScore>, ScoreRepositoryError> {
        let ledger = self.ledger.lock().await;
        let mut scores: Vec<UserScore> = ledger
            .accounts
            .values()
            .map(|account| account.score.clone())
            .collect();
        scores.sort_by(|left, right| {
            right
                .total_points
                .cmp(&left.total_points)
                .then_with(|| left.user_id.cmp(&right.user_id))
        });
        scores.truncate(limit);
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PointReason;
    use chrono::Utc;
    use rstest::{fixture, rstest};
    use uuid::Uuid;

    fn opening(user_id: &UserId) -> UserScore {
        UserScore::opening(user_id.clone(), RankTierId::from("newbie"))
    }

    fn update(user_id: &UserId, expected_version: i64, new_total: i64) -> ScoreUpdate {
        ScoreUpdate {
            event: PointEvent {
                id: Uuid::new_v4(),
                user_id: user_id.clone(),
                amount: 10,
                reason: PointReason::PostCreated,
                occurred_at: Utc::now(),
            },
            expected_version,
            new_total,
            new_tier_id: RankTierId::from("newbie"),
            rank_up: None,
        }
    }

    #[fixture]
    fn repo() -> InMemoryScoreRepository {
        InMemoryScoreRepository::new()
    }

    #[rstest]
    #[tokio::test]
    async fn open_account_is_idempotent(repo: InMemoryScoreRepository) {
        let user_id = UserId::random();
        assert!(repo.open_account(&opening(&user_id)).await.expect("open"));
        assert!(!repo.open_account(&opening(&user_id)).await.expect("reopen"));
        let record = repo
            .find_score(&user_id)
            .await
            .expect("find")
            .expect("account exists");
        assert_eq!(record.version, 0);
    }

    #[rstest]
    #[tokio::test]
    async fn stale_version_writes_nothing(repo: InMemoryScoreRepository) {
        let user_id = UserId::random();
        repo.open_account(&opening(&user_id)).await.expect("open");
        repo.apply_update(&update(&user_id, 0, 10))
            .await
            .expect("first update");

        let error = repo
            .apply_update(&update(&user_id, 0, 20))
            .await
            .expect_err("stale");
        assert_eq!(error, ScoreRepositoryError::version_mismatch(0_i64, 1_i64));
        assert_eq!(repo.list_events(&user_id, 10).await.expect("events").len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn missing_account_is_reported(repo: InMemoryScoreRepository) {
        let user_id = UserId::random();
        let error = repo
            .apply_update(&update(&user_id, 0, 10))
            .await
            .expect_err("missing");
        assert!(matches!(error, ScoreRepositoryError::MissingAccount { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn pending_rank_up_is_taken_once(repo: InMemoryScoreRepository) {
        let user_id = UserId::random();
        repo.open_account(&opening(&user_id)).await.expect("open");
        let mut ranked = update(&user_id, 0, 60);
        ranked.new_tier_id = RankTierId::from("member");
        ranked.rank_up = Some(RankTierId::from("member"));
        repo.apply_update(&ranked).await.expect("update");
        repo.apply_update(&update(&user_id, 1, 70))
            .await
            .expect("plain update keeps announcement");

        assert_eq!(
            repo.take_pending_rank_up(&user_id).await.expect("take"),
            Some(RankTierId::from("member"))
        );
        assert_eq!(repo.take_pending_rank_up(&user_id).await.expect("take"), None);
    }

    #[rstest]
    #[tokio::test]
    async fn top_scores_break_ties_by_user_id(repo: InMemoryScoreRepository) {
        let mut ids: Vec<UserId> = (0..3).map(|_| UserId::random()).collect();
        for id in &ids {
            repo.open_account(&opening(id)).await.expect("open");
        }
        let leader = UserId::random();
        repo.open_account(&opening(&leader)).await.expect("open");
        repo.apply_update(&update(&leader, 0, 30)).await.expect("lead");

        let top = repo.top_scores(3).await.expect("top");
        ids.sort();
        let expected: Vec<UserId> = std::iter::once(leader).chain(ids.into_iter().take(2)).collect();
        let actual: Vec<UserId> = top.into_iter().map(|score| score.user_id).collect();
        assert_eq!(actual, expected);
    }
}

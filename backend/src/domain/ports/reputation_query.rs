//! Driving port for score, activity and leaderboard reads.

use async_trait::async_trait;

use crate::domain::{PointEvent, RankTier, ReputationError, UserId};

/// A user's total together with the full tier it earns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreView {
    pub user_id: UserId,
    pub total_points: i64,
    pub tier: RankTier,
}

/// Rank-up the member has not been shown yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankUpAnnouncement {
    pub user_id: UserId,
    pub tier: RankTier,
}

/// One leaderboard row; `position` starts at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub position: usize,
    pub score: ScoreView,
}

/// Read side of the reputation service consumed by inbound adapters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReputationQuery: Send + Sync {
    /// Current total and tier.
    ///
    /// # Errors
    /// [`ReputationError::UnknownUser`] when the user has no account.
    async fn user_score(&self, user_id: &UserId) -> Result<ScoreView, ReputationError>;

    /// Most recent point events, newest first.
    async fn activity(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<PointEvent>, ReputationError>;

    /// Return and clear the pending rank-up announcement (poll-and-clear).
    async fn take_rank_up(
        &self,
        user_id: &UserId,
    ) -> Result<Option<RankUpAnnouncement>, ReputationError>;

    /// Highest totals first.
    async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, ReputationError>;
}

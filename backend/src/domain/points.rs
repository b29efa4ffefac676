//! Point awards, score accounts and the configured point schedule.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{RankTierId, ReputationError, UserId};

/// Why points were awarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PointReason {
    PostCreated,
    CommentCreated,
    LikeReceived,
    DepositConfirmed,
}

impl PointReason {
    /// Every recognised reason.
    pub const ALL: [Self; 4] = [
        Self::PostCreated,
        Self::CommentCreated,
        Self::LikeReceived,
        Self::DepositConfirmed,
    ];

    /// Stable wire and storage code.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PostCreated => "post_created",
            Self::CommentCreated => "comment_created",
            Self::LikeReceived => "like_received",
            Self::DepositConfirmed => "deposit_confirmed",
        }
    }
}

impl fmt::Display for PointReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PointReason {
    type Err = ReputationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|reason| reason.as_str() == value)
            .ok_or_else(|| ReputationError::invalid_event(format!("unrecognised reason '{value}'")))
    }
}

/// Points granted per reason. A zero entry disables scoring for that reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointSchedule {
    pub post_created: i64,
    pub comment_created: i64,
    pub like_received: i64,
    pub deposit_confirmed: i64,
}

impl PointSchedule {
    /// Amount configured for `reason`.
    pub fn amount_for(&self, reason: PointReason) -> i64 {
        match reason {
            PointReason::PostCreated => self.post_created,
            PointReason::CommentCreated => self.comment_created,
            PointReason::LikeReceived => self.like_received,
            PointReason::DepositConfirmed => self.deposit_confirmed,
        }
    }

    /// Reject negative entries.
    ///
    /// # Errors
    /// Returns [`ReputationError::Config`] naming the first negative reason.
    pub fn validate(self) -> Result<Self, ReputationError> {
        for reason in PointReason::ALL {
            let amount = self.amount_for(reason);
            if amount < 0 {
                return Err(ReputationError::config(format!(
                    "points for {reason} must not be negative, found {amount}"
                )));
            }
        }
        Ok(self)
    }
}

impl Default for PointSchedule {
    fn default() -> Self {
        Self {
            post_created: 10,
            comment_created: 5,
            like_received: 2,
            deposit_confirmed: 10,
        }
    }
}

/// Append-only audit record of one ledger application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointEvent {
    pub id: Uuid,
    pub user_id: UserId,
    pub amount: i64,
    pub reason: PointReason,
    pub occurred_at: DateTime<Utc>,
}

/// A user's cumulative score and the tier it currently earns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserScore {
    pub user_id: UserId,
    pub total_points: i64,
    pub current_tier_id: RankTierId,
}

impl UserScore {
    /// A freshly opened account.
    pub fn opening(user_id: UserId, first_tier: RankTierId) -> Self {
        Self {
            user_id,
            total_points: 0,
            current_tier_id: first_tier,
        }
    }
}

/// Stored score row: the score plus its optimistic-concurrency version and
/// any rank-up the member has not yet been shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRecord {
    pub score: UserScore,
    pub version: i64,
    pub pending_rank_up: Option<RankTierId>,
}

/// Everything one ledger application writes, applied atomically by the
/// repository when the stored version still equals `expected_version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreUpdate {
    pub event: PointEvent,
    pub expected_version: i64,
    pub new_total: i64,
    pub new_tier_id: RankTierId,
    /// Replaces any unclaimed announcement when set.
    pub rank_up: Option<RankTierId>,
}

//! Notification records addressed to a single recipient.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::UserId;

/// Monotonically assigned notification identifier.
///
/// Ordering by id is the tie-breaker for records created within the same
/// clock tick.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
#[schema(value_type = i64, example = 42)]
pub struct NotificationId(i64);

impl NotificationId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What triggered the notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    RankUp,
    Mention,
    Reply,
    System,
}

impl NotificationKind {
    /// Stable storage code.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RankUp => "rank_up",
            Self::Mention => "mention",
            Self::Reply => "reply",
            Self::System => "system",
        }
    }

    /// Inverse of [`Self::as_str`].
    pub fn parse(raw: &str) -> Option<Self> {
        [Self::RankUp, Self::Mention, Self::Reply, Self::System]
            .into_iter()
            .find(|kind| kind.as_str() == raw)
    }
}

/// A notification about to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub recipient: UserId,
    pub kind: NotificationKind,
    pub message: String,
    pub link: Option<String>,
}

impl NewNotification {
    pub fn new(
        recipient: UserId,
        kind: NotificationKind,
        message: impl Into<String>,
        link: Option<String>,
    ) -> Self {
        Self {
            recipient,
            kind,
            message: message.into(),
            link,
        }
    }
}

/// A stored notification. Only `read` ever changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: NotificationId,
    pub recipient_id: UserId,
    pub kind: NotificationKind,
    pub message: String,
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

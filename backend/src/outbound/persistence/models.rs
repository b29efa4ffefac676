//! Diesel row structs. Internal to the persistence layer.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{members, notifications, point_events, user_scores};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = members)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MemberRow {
    pub id: Uuid,
    pub handle: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = members)]
pub(crate) struct NewMemberRow<'a> {
    pub id: Uuid,
    pub handle: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = user_scores)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserScoreRow {
    pub user_id: Uuid,
    pub total_points: i64,
    pub current_tier_id: String,
    pub version: i64,
    pub pending_rank_up: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_scores)]
pub(crate) struct NewUserScoreRow<'a> {
    pub user_id: Uuid,
    pub total_points: i64,
    pub current_tier_id: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = point_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PointEventRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = point_events)]
pub(crate) struct NewPointEventRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub reason: &'a str,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct NotificationRow {
    pub id: i64,
    pub recipient_id: Uuid,
    pub kind: String,
    pub message: String,
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = notifications)]
pub(crate) struct NewNotificationRow<'a> {
    pub recipient_id: Uuid,
    pub kind: &'a str,
    pub message: &'a str,
    pub link: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

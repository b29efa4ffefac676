//! Score, activity, rank-up and leaderboard handlers.
//!
//! ```text
//! GET    /api/v1/users/{id}/score
//! GET    /api/v1/users/{id}/activity?limit=
//! DELETE /api/v1/users/{id}/rank-up
//! GET    /api/v1/leaderboard?limit=
//! ```

use actix_web::{HttpResponse, delete, get, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{LeaderboardEntry, RankUpAnnouncement, ScoreView};
use crate::domain::{PointEvent, PointReason, RankTier};
use crate::inbound::http::ApiResult;
use crate::inbound::http::error::ApiError;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{LimitQuery, parse_user_id};

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResponse {
    pub user_id: String,
    #[schema(example = 120)]
    pub total_points: i64,
    pub tier: RankTier,
}

impl From<ScoreView> for ScoreResponse {
    fn from(view: ScoreView) -> Self {
        Self {
            user_id: view.user_id.to_string(),
            total_points: view.total_points,
            tier: view.tier,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PointEventResponse {
    pub id: String,
    pub amount: i64,
    pub reason: PointReason,
    /// RFC 3339 timestamp.
    pub occurred_at: String,
}

impl From<PointEvent> for PointEventResponse {
    fn from(event: PointEvent) -> Self {
        Self {
            id: event.id.to_string(),
            amount: event.amount,
            reason: event.reason,
            occurred_at: event.occurred_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RankUpResponse {
    pub user_id: String,
    pub tier: RankTier,
}

impl From<RankUpAnnouncement> for RankUpResponse {
    fn from(announcement: RankUpAnnouncement) -> Self {
        Self {
            user_id: announcement.user_id.to_string(),
            tier: announcement.tier,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntryResponse {
    /// One-based rank on the board.
    pub position: usize,
    #[serde(flatten)]
    pub score: ScoreResponse,
}

impl From<LeaderboardEntry> for LeaderboardEntryResponse {
    fn from(entry: LeaderboardEntry) -> Self {
        Self {
            position: entry.position,
            score: entry.score.into(),
        }
    }
}

/// Current total and tier.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/score",
    params(("id" = String, Path, description = "Member id (UUID)")),
    responses(
        (status = 200, description = "Score and tier", body = ScoreResponse),
        (status = 400, description = "Malformed id", body = ApiError),
        (status = 404, description = "Unknown user", body = ApiError),
        (status = 503, description = "Storage unavailable", body = ApiError)
    ),
    tags = ["scores"],
    operation_id = "getUserScore"
)]
#[get("/users/{id}/score")]
pub async fn get_score(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<ScoreResponse>> {
    let user_id = parse_user_id("id", &path)?;
    let view = state.reputation.user_score(&user_id).await?;
    Ok(web::Json(view.into()))
}

/// Point awards, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/activity",
    params(("id" = String, Path, description = "Member id (UUID)"), LimitQuery),
    responses(
        (status = 200, description = "Recent point events", body = [PointEventResponse]),
        (status = 400, description = "Malformed id or limit", body = ApiError),
        (status = 404, description = "Unknown user", body = ApiError)
    ),
    tags = ["scores"],
    operation_id = "getUserActivity"
)]
#[get("/users/{id}/activity")]
pub async fn get_activity(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    query: web::Query<LimitQuery>,
) -> ApiResult<web::Json<Vec<PointEventResponse>>> {
    let user_id = parse_user_id("id", &path)?;
    let limit = query.resolve()?;
    let events = state.reputation.activity(&user_id, limit).await?;
    Ok(web::Json(events.into_iter().map(Into::into).collect()))
}

/// Claim the pending rank-up announcement. A second call returns 204.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}/rank-up",
    params(("id" = String, Path, description = "Member id (UUID)")),
    responses(
        (status = 200, description = "Announcement claimed", body = RankUpResponse),
        (status = 204, description = "Nothing pending"),
        (status = 400, description = "Malformed id", body = ApiError)
    ),
    tags = ["scores"],
    operation_id = "takeRankUp"
)]
#[delete("/users/{id}/rank-up")]
pub async fn take_rank_up(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user_id = parse_user_id("id", &path)?;
    let response = match state.reputation.take_rank_up(&user_id).await? {
        Some(announcement) => HttpResponse::Ok().json(RankUpResponse::from(announcement)),
        None => HttpResponse::NoContent().finish(),
    };
    Ok(response)
}

/// Highest totals first; ties ordered by user id.
#[utoipa::path(
    get,
    path = "/api/v1/leaderboard",
    params(LimitQuery),
    responses(
        (status = 200, description = "Leaderboard", body = [LeaderboardEntryResponse]),
        (status = 400, description = "Malformed limit", body = ApiError)
    ),
    tags = ["scores"],
    operation_id = "getLeaderboard"
)]
#[get("/leaderboard")]
pub async fn get_leaderboard(
    state: web::Data<HttpState>,
    query: web::Query<LimitQuery>,
) -> ApiResult<web::Json<Vec<LeaderboardEntryResponse>>> {
    let limit = query.resolve()?;
    let entries = state.reputation.leaderboard(limit).await?;
    Ok(web::Json(entries.into_iter().map(Into::into).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RankTable, ReputationError, UserId};
    use crate::inbound::http::test_utils::MockPorts;
    use actix_web::{App, http::StatusCode, test};
    use chrono::Utc;
    use uuid::Uuid;

    fn member_tier() -> RankTier {
        RankTable::forum_default()
            .tiers_ordered_ascending()
            .nth(1)
            .cloned()
            .expect("default table has a second tier")
    }

    macro_rules! app {
        ($ports:expr) => {
            test::init_service(
                App::new()
                    .app_data($ports.into_data())
                    .service(get_score)
                    .service(get_activity)
                    .service(take_rank_up)
                    .service(get_leaderboard),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn score_reports_total_and_tier() {
        let user_id = UserId::random();
        let view = ScoreView {
            user_id: user_id.clone(),
            total_points: 60,
            tier: member_tier(),
        };
        let mut ports = MockPorts::default();
        ports
            .reputation
            .expect_user_score()
            .return_once(move |_| Ok(view));
        let app = app!(ports);

        let request = test::TestRequest::get()
            .uri(&format!("/users/{user_id}/score"))
            .to_request();
        let body: ScoreResponse = test::call_and_read_body_json(&app, request).await;

        assert_eq!(body.total_points, 60);
        assert_eq!(body.tier.id.as_ref(), "member");
    }

    #[actix_web::test]
    async fn unknown_users_are_not_found() {
        let mut ports = MockPorts::default();
        ports
            .reputation
            .expect_user_score()
            .return_once(|user_id| Err(ReputationError::unknown_user(user_id.clone())));
        let app = app!(ports);

        let request = test::TestRequest::get()
            .uri(&format!("/users/{}/score", UserId::random()))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn malformed_ids_never_reach_the_port() {
        let app = app!(MockPorts::default());
        let request = test::TestRequest::get()
            .uri("/users/alice/score")
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn activity_passes_the_limit_through() {
        let user_id = UserId::random();
        let event = PointEvent {
            id: Uuid::new_v4(),
            user_id: user_id.clone(),
            amount: 10,
            reason: PointReason::PostCreated,
            occurred_at: Utc::now(),
        };
        let mut ports = MockPorts::default();
        ports
            .reputation
            .expect_activity()
            .withf(|_, limit| *limit == 5)
            .return_once(move |_, _| Ok(vec![event]));
        let app = app!(ports);

        let request = test::TestRequest::get()
            .uri(&format!("/users/{user_id}/activity?limit=5"))
            .to_request();
        let body: Vec<PointEventResponse> = test::call_and_read_body_json(&app, request).await;
        assert_eq!(body.len(), 1);
        assert!(body.iter().all(|event| event.reason == PointReason::PostCreated));
    }

    #[actix_web::test]
    async fn rank_up_is_claimed_then_empty() {
        let user_id = UserId::random();
        let announcement = RankUpAnnouncement {
            user_id: user_id.clone(),
            tier: member_tier(),
        };
        let mut ports = MockPorts::default();
        let mut pending = Some(announcement);
        ports
            .reputation
            .expect_take_rank_up()
            .times(2)
            .returning(move |_| Ok(pending.take()));
        let app = app!(ports);

        let uri = format!("/users/{user_id}/rank-up");
        let first = test::call_service(&app, test::TestRequest::delete().uri(&uri).to_request()).await;
        assert_eq!(first.status(), StatusCode::OK);
        let second =
            test::call_service(&app, test::TestRequest::delete().uri(&uri).to_request()).await;
        assert_eq!(second.status(), StatusCode::NO_CONTENT);
    }

    #[actix_web::test]
    async fn leaderboard_rejects_zero_limit() {
        let app = app!(MockPorts::default());
        let request = test::TestRequest::get()
            .uri("/leaderboard?limit=0")
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint of the inbound layer together
//! with the payload schemas they exchange. The document backs Swagger UI in
//! debug builds.

use utoipa::OpenApi;

use crate::domain::{NotificationKind, PointReason, RankTier};
use crate::inbound::http::error::{ApiError, ErrorCode};
use crate::inbound::http::events::{
    DeliveryReport, DeliveryStepReport, DispatchReportResponse, ForumEventBody,
    NotificationStep, ScoringReport, StepError, StepStatus,
};
use crate::inbound::http::members::{MemberResponse, RegisterMemberBody};
use crate::inbound::http::notifications::{
    MarkAllReadResponse, NotificationResponse, UnreadCountResponse,
};
use crate::inbound::http::scores::{
    LeaderboardEntryResponse, PointEventResponse, RankUpResponse, ScoreResponse,
};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Forum reputation API",
        description = "Point scoring, rank progression and notification inboxes for forum members."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::members::register_member,
        crate::inbound::http::events::dispatch_event,
        crate::inbound::http::scores::get_score,
        crate::inbound::http::scores::get_activity,
        crate::inbound::http::scores::take_rank_up,
        crate::inbound::http::scores::get_leaderboard,
        crate::inbound::http::notifications::list_notifications,
        crate::inbound::http::notifications::unread_count,
        crate::inbound::http::notifications::mark_read,
        crate::inbound::http::notifications::mark_all_read,
        crate::inbound::http::notifications::stream_notifications,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ApiError,
        ErrorCode,
        RankTier,
        PointReason,
        NotificationKind,
        RegisterMemberBody,
        MemberResponse,
        ForumEventBody,
        DispatchReportResponse,
        ScoringReport,
        NotificationStep,
        DeliveryReport,
        DeliveryStepReport,
        StepStatus,
        StepError,
        ScoreResponse,
        PointEventResponse,
        RankUpResponse,
        LeaderboardEntryResponse,
        NotificationResponse,
        UnreadCountResponse,
        MarkAllReadResponse,
    )),
    tags(
        (name = "members", description = "Member registration"),
        (name = "events", description = "Forum event intake and fan-out"),
        (name = "scores", description = "Scores, activity, rank-ups and the leaderboard"),
        (name = "notifications", description = "Per-member notification inboxes"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

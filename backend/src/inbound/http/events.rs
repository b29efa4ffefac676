//! Forum event intake.
//!
//! ```text
//! POST /api/v1/events
//! ```
//!
//! The response is a multi-status report: scoring and each notification
//! delivery succeed or fail independently, so a 200 may still carry failed
//! steps.

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    Delivery, DispatchReport, ForumEvent, ForumEventParts, NotificationId, NotificationKind,
    PointReason, ReputationError, ScoringSummary, StepOutcome,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::error::{ApiError, ErrorCode};
use crate::inbound::http::state::HttpState;

/// A forum action reported by a collaborator.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForumEventBody {
    /// One of `post_created`, `comment_created`, `like_received`,
    /// `deposit_confirmed`.
    #[serde(rename = "type")]
    #[schema(example = "comment_created")]
    pub kind: String,
    /// Author of the post, comment or like; the depositor for deposits.
    pub actor_id: String,
    pub content: Option<String>,
    pub replied_to_author_id: Option<String>,
    /// Confirmed deposit sum. Only valid for `deposit_confirmed`.
    pub amount: Option<i64>,
    pub link: Option<String>,
}

impl From<ForumEventBody> for ForumEventParts {
    fn from(body: ForumEventBody) -> Self {
        Self {
            kind: body.kind,
            actor_id: body.actor_id,
            content: body.content,
            replied_to_author_id: body.replied_to_author_id,
            amount: body.amount,
            link: body.link,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Skipped,
    Succeeded,
    Failed,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepError {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&ReputationError> for StepError {
    fn from(error: &ReputationError) -> Self {
        let api = ApiError::from(error.clone());
        let message = if api.code == ErrorCode::InternalError {
            "Internal server error".to_owned()
        } else {
            api.message
        };
        Self {
            code: api.code,
            message,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationStep {
    pub status: StepStatus,
    pub notification_id: Option<i64>,
    pub error: Option<StepError>,
}

impl From<&StepOutcome<NotificationId>> for NotificationStep {
    fn from(outcome: &StepOutcome<NotificationId>) -> Self {
        let (status, error) = status_of(outcome);
        let notification_id = match outcome {
            StepOutcome::Succeeded(id) => Some(id.get()),
            StepOutcome::Skipped | StepOutcome::Failed(_) => None,
        };
        Self {
            status,
            notification_id,
            error,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoringReport {
    pub status: StepStatus,
    pub error: Option<StepError>,
    pub awarded: Option<i64>,
    pub new_total: Option<i64>,
    pub tier_changed: Option<bool>,
    pub new_tier: Option<String>,
    pub rank_up: Option<NotificationStep>,
}

impl From<&StepOutcome<ScoringSummary>> for ScoringReport {
    fn from(outcome: &StepOutcome<ScoringSummary>) -> Self {
        let (status, error) = status_of(outcome);
        let summary = match outcome {
            StepOutcome::Succeeded(summary) => Some(summary),
            StepOutcome::Skipped | StepOutcome::Failed(_) => None,
        };
        Self {
            status,
            error,
            awarded: summary.map(|s| s.awarded),
            new_total: summary.map(|s| s.new_total),
            tier_changed: summary.map(|s| s.tier_changed),
            new_tier: summary.and_then(|s| s.new_tier.as_ref().map(ToString::to_string)),
            rank_up: summary.map(|s| NotificationStep::from(&s.rank_up)),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReport {
    pub kind: NotificationKind,
    /// User id, or the raw handle of an unresolved mention.
    pub target: String,
    #[serde(flatten)]
    pub step: NotificationStep,
}

impl From<&Delivery> for DeliveryReport {
    fn from(delivery: &Delivery) -> Self {
        Self {
            kind: delivery.kind,
            target: delivery.target.clone(),
            step: NotificationStep::from(&delivery.outcome),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryStepReport {
    pub status: StepStatus,
    pub error: Option<StepError>,
    pub deliveries: Vec<DeliveryReport>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReportResponse {
    pub reason: PointReason,
    /// True when no step or delivery failed.
    pub complete: bool,
    pub scoring: ScoringReport,
    pub delivery: DeliveryStepReport,
}

fn status_of<T>(outcome: &StepOutcome<T>) -> (StepStatus, Option<StepError>) {
    match outcome {
        StepOutcome::Skipped => (StepStatus::Skipped, None),
        StepOutcome::Succeeded(_) => (StepStatus::Succeeded, None),
        StepOutcome::Failed(error) => (StepStatus::Failed, Some(StepError::from(error))),
    }
}

impl From<DispatchReport> for DispatchReportResponse {
    fn from(report: DispatchReport) -> Self {
        let (delivery_status, delivery_error) = status_of(&report.delivery);
        let deliveries = match &report.delivery {
            StepOutcome::Succeeded(deliveries) => deliveries.iter().map(Into::into).collect(),
            StepOutcome::Skipped | StepOutcome::Failed(_) => Vec::new(),
        };
        Self {
            reason: report.reason,
            complete: report.is_complete(),
            scoring: ScoringReport::from(&report.scoring),
            delivery: DeliveryStepReport {
                status: delivery_status,
                error: delivery_error,
                deliveries,
            },
        }
    }
}

/// Score the event and fan out its notifications.
#[utoipa::path(
    post,
    path = "/api/v1/events",
    request_body = ForumEventBody,
    responses(
        (status = 200, description = "Per-step outcome", body = DispatchReportResponse),
        (status = 400, description = "Unrecognised type or malformed field", body = ApiError)
    ),
    tags = ["events"],
    operation_id = "dispatchForumEvent"
)]
#[post("/events")]
pub async fn dispatch_event(
    state: web::Data<HttpState>,
    payload: web::Json<ForumEventBody>,
) -> ApiResult<web::Json<DispatchReportResponse>> {
    let event = ForumEvent::try_from(ForumEventParts::from(payload.into_inner()))?;
    let report = state.events.dispatch(event).await?;
    Ok(web::Json(report.into()))
}

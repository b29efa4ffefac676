//! Notification inbox handlers and the live server-sent-events feed.
//!
//! ```text
//! GET  /api/v1/users/{id}/notifications
//! GET  /api/v1/users/{id}/notifications/unread-count
//! GET  /api/v1/users/{id}/notifications/stream
//! POST /api/v1/users/{id}/notifications/{notificationId}/read
//! POST /api/v1/users/{id}/notifications/read-all
//! ```

use actix_web::{HttpResponse, get, http::header, post, web};
use futures_util::StreamExt;
use futures_util::stream;
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use crate::domain::{NotificationId, NotificationKind, NotificationRecord};
use crate::inbound::http::ApiResult;
use crate::inbound::http::error::ApiError;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::parse_user_id;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    #[schema(example = 42)]
    pub id: i64,
    pub kind: NotificationKind,
    #[schema(example = "@bob replied to your comment")]
    pub message: String,
    pub link: Option<String>,
    /// RFC 3339 timestamp.
    pub created_at: String,
    pub read: bool,
}

impl From<NotificationRecord> for NotificationResponse {
    fn from(record: NotificationRecord) -> Self {
        Self {
            id: record.id.get(),
            kind: record.kind,
            message: record.message,
            link: record.link,
            created_at: record.created_at.to_rfc3339(),
            read: record.read,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountResponse {
    pub unread: u64,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkAllReadResponse {
    /// Notifications that flipped from unread to read.
    pub updated: u64,
}

/// Encode one record as an SSE frame.
fn sse_frame(record: NotificationRecord) -> web::Bytes {
    let id = record.id;
    match serde_json::to_string(&NotificationResponse::from(record)) {
        Ok(data) => web::Bytes::from(format!("event: notification\nid: {id}\ndata: {data}\n\n")),
        Err(error) => {
            warn!(%error, notification_id = %id, "failed to encode notification frame");
            web::Bytes::from_static(b": encoding failure\n\n")
        }
    }
}

/// The recipient's inbox, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/notifications",
    params(("id" = String, Path, description = "Recipient id (UUID)")),
    responses(
        (status = 200, description = "Notifications", body = [NotificationResponse]),
        (status = 400, description = "Malformed id", body = ApiError),
        (status = 404, description = "Unknown member", body = ApiError),
        (status = 503, description = "Storage unavailable", body = ApiError)
    ),
    tags = ["notifications"],
    operation_id = "listNotifications"
)]
#[get("/users/{id}/notifications")]
pub async fn list_notifications(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<NotificationResponse>>> {
    let recipient = parse_user_id("id", &path)?;
    let records = state.inbox.notifications(&recipient).await?;
    Ok(web::Json(records.into_iter().map(Into::into).collect()))
}

/// Badge count of unread notifications.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/notifications/unread-count",
    params(("id" = String, Path, description = "Recipient id (UUID)")),
    responses(
        (status = 200, description = "Unread count", body = UnreadCountResponse),
        (status = 400, description = "Malformed id", body = ApiError),
        (status = 404, description = "Unknown member", body = ApiError)
    ),
    tags = ["notifications"],
    operation_id = "countUnreadNotifications"
)]
#[get("/users/{id}/notifications/unread-count")]
pub async fn unread_count(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<UnreadCountResponse>> {
    let recipient = parse_user_id("id", &path)?;
    let unread = state.inbox.unread_count(&recipient).await?;
    Ok(web::Json(UnreadCountResponse { unread }))
}

/// Mark one notification read. Repeating the call is harmless.
#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/notifications/{notificationId}/read",
    params(
        ("id" = String, Path, description = "Recipient id (UUID)"),
        ("notificationId" = i64, Path, description = "Notification id")
    ),
    responses(
        (status = 204, description = "Marked read"),
        (status = 400, description = "Malformed id", body = ApiError),
        (status = 404, description = "Unknown member, or not in this recipient's inbox", body = ApiError)
    ),
    tags = ["notifications"],
    operation_id = "markNotificationRead"
)]
#[post("/users/{id}/notifications/{notification_id}/read")]
pub async fn mark_read(
    state: web::Data<HttpState>,
    path: web::Path<(String, i64)>,
) -> ApiResult<HttpResponse> {
    let (raw_recipient, raw_id) = path.into_inner();
    let recipient = parse_user_id("id", &raw_recipient)?;
    state
        .inbox
        .mark_read(&recipient, NotificationId::new(raw_id))
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Mark the whole inbox read.
#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/notifications/read-all",
    params(("id" = String, Path, description = "Recipient id (UUID)")),
    responses(
        (status = 200, description = "Count of updated notifications", body = MarkAllReadResponse),
        (status = 400, description = "Malformed id", body = ApiError),
        (status = 404, description = "Unknown member", body = ApiError)
    ),
    tags = ["notifications"],
    operation_id = "markAllNotificationsRead"
)]
#[post("/users/{id}/notifications/read-all")]
pub async fn mark_all_read(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<MarkAllReadResponse>> {
    let recipient = parse_user_id("id", &path)?;
    let updated = state.inbox.mark_all_read(&recipient).await?;
    Ok(web::Json(MarkAllReadResponse { updated }))
}

/// Live feed of notifications stored from now on, as server-sent events.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/notifications/stream",
    params(("id" = String, Path, description = "Recipient id (UUID)")),
    responses(
        (status = 200, description = "text/event-stream of notification frames"),
        (status = 400, description = "Malformed id", body = ApiError)
    ),
    tags = ["notifications"],
    operation_id = "streamNotifications"
)]
#[get("/users/{id}/notifications/stream")]
pub async fn stream_notifications(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let recipient = parse_user_id("id", &path)?;
    let frames = stream::once(async { web::Bytes::from_static(b": connected\n\n") })
        .chain(state.feed.subscribe(&recipient).map(sse_frame))
        .map(Ok::<_, actix_web::Error>);

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(frames))
}

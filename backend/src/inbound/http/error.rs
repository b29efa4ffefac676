//! Transport error payload and the mapping from domain failures.
//!
//! Handlers return [`ApiResult`]; `?` on a [`ReputationError`] converts it
//! into an [`ApiError`] whose [`ErrorCode`] picks the HTTP status.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::error;
use utoipa::ToSchema;

use crate::domain::ReputationError;
use crate::middleware::trace::TraceId;

/// Response header carrying the request's trace identifier.
pub const TRACE_ID_HEADER: &str = "trace-id";

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Stable machine-readable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidRequest,
    NotFound,
    Conflict,
    ServiceUnavailable,
    InternalError,
}

/// JSON error body returned by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    #[schema(example = "invalid_request")]
    pub code: ErrorCode,
    #[schema(example = "invalid event: unrecognised reason gift")]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiError {
    /// Build an error, capturing the trace id of the current request if any.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            trace_id: TraceId::current().map(|id| id.to_string()),
            details: None,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    fn redacted(&self) -> Self {
        if self.code != ErrorCode::InternalError {
            return self.clone();
        }
        let mut redacted = Self::internal("Internal server error");
        redacted.trace_id = self.trace_id.clone();
        redacted
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        status_for(self.code)
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = &self.trace_id {
            builder.insert_header((TRACE_ID_HEADER, id.clone()));
        }
        builder.json(self.redacted())
    }
}

impl From<ReputationError> for ApiError {
    fn from(err: ReputationError) -> Self {
        let message = err.to_string();
        match err {
            ReputationError::InvalidEvent { .. } => Self::invalid_request(message),
            ReputationError::UnknownRecipient { recipient } => {
                Self::not_found(message).with_details(json!({ "recipient": recipient }))
            }
            ReputationError::UnknownUser { user_id } => {
                Self::not_found(message).with_details(json!({ "userId": user_id.to_string() }))
            }
            ReputationError::NotificationNotFound { id } => {
                Self::not_found(message).with_details(json!({ "notificationId": id }))
            }
            ReputationError::DuplicateMember { .. } => Self::conflict(message),
            ReputationError::ConcurrencyConflict { attempts, .. } => Self::conflict(message)
                .with_details(json!({ "retryable": true, "attempts": attempts })),
            ReputationError::StorageUnavailable { .. } => {
                Self::service_unavailable(message).with_details(json!({ "retryable": true }))
            }
            ReputationError::StepTimedOut { step, timeout_ms } => Self::service_unavailable(message)
                .with_details(json!({ "step": step, "timeoutMs": timeout_ms })),
            ReputationError::Config { .. } => {
                error!(error = %message, "configuration error reached a request");
                Self::internal(message)
            }
        }
    }
}

/// Turn extractor rejections (malformed JSON, path or query) into the
/// standard error body.
pub fn extractor_error(err: impl std::fmt::Display) -> actix_web::Error {
    ApiError::invalid_request(err.to_string()).into()
}

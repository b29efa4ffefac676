//! Member registration.
//!
//! ```text
//! POST /api/v1/members
//! ```

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::ports::RegisterMemberRequest;
use crate::domain::{Handle, Member};
use crate::inbound::http::ApiResult;
use crate::inbound::http::error::ApiError;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::parse_user_id;

/// Registration payload. A missing `id` gets a fresh UUID.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterMemberBody {
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: Option<String>,
    #[schema(example = "alice")]
    pub handle: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    pub id: String,
    pub handle: String,
}

impl From<Member> for MemberResponse {
    fn from(member: Member) -> Self {
        Self {
            id: member.id.to_string(),
            handle: member.handle.to_string(),
        }
    }
}

fn parse_register_body(body: RegisterMemberBody) -> Result<RegisterMemberRequest, ApiError> {
    let id = body
        .id
        .as_deref()
        .map(|raw| parse_user_id("id", raw))
        .transpose()?;
    let handle = Handle::new(body.handle.as_str()).map_err(|err| {
        ApiError::invalid_request(err.to_string()).with_details(json!({
            "field": "handle",
            "value": body.handle,
            "code": "invalid_handle",
        }))
    })?;
    Ok(RegisterMemberRequest { id, handle })
}

/// Register a forum member and open their reputation account.
#[utoipa::path(
    post,
    path = "/api/v1/members",
    request_body = RegisterMemberBody,
    responses(
        (status = 201, description = "Member registered", body = MemberResponse),
        (status = 400, description = "Invalid id or handle", body = ApiError),
        (status = 409, description = "Id or handle already taken", body = ApiError),
        (status = 503, description = "Storage unavailable", body = ApiError)
    ),
    tags = ["members"],
    operation_id = "registerMember"
)]
#[post("/members")]
pub async fn register_member(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterMemberBody>,
) -> ApiResult<HttpResponse> {
    let request = parse_register_body(payload.into_inner())?;
    let member = state.members.register(request).await?;
    Ok(HttpResponse::Created().json(MemberResponse::from(member)))
}

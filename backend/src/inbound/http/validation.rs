//! Request parsing shared by the handlers.

use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;

use crate::domain::UserId;
use crate::inbound::http::error::ApiError;

/// Page size when the client does not ask for one.
pub const DEFAULT_LIMIT: usize = 20;
/// Upper bound on any page size.
pub const MAX_LIMIT: usize = 100;

pub(crate) fn parse_user_id(field: &'static str, raw: &str) -> Result<UserId, ApiError> {
    UserId::new(raw).map_err(|err| {
        ApiError::invalid_request(format!("{field} must be a UUID")).with_details(json!({
            "field": field,
            "value": raw,
            "code": "invalid_uuid",
            "reason": err.to_string(),
        }))
    })
}

/// `?limit=` query parameter.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitQuery {
    /// Number of entries to return, 1 to 100. Defaults to 20.
    pub limit: Option<usize>,
}

impl LimitQuery {
    pub(crate) fn resolve(&self) -> Result<usize, ApiError> {
        match self.limit {
            None => Ok(DEFAULT_LIMIT),
            Some(limit) if (1..=MAX_LIMIT).contains(&limit) => Ok(limit),
            Some(limit) => Err(ApiError::invalid_request(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            ))
            .with_details(json!({ "field": "limit", "value": limit }))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::error::ErrorCode;
    use rstest::rstest;

    #[rstest]
    fn valid_user_ids_parse() {
        let id = UserId::random();
        assert_eq!(parse_user_id("userId", id.as_ref()).expect("uuid"), id);
    }

    #[rstest]
    fn malformed_user_ids_name_the_field() {
        let error = parse_user_id("userId", "alice").expect_err("not a uuid");
        assert_eq!(error.code, ErrorCode::InvalidRequest);
        let details = error.details.expect("details");
        assert_eq!(details["field"], "userId");
        assert_eq!(details["code"], "invalid_uuid");
    }

    #[rstest]
    #[case(None, Ok(DEFAULT_LIMIT))]
    #[case(Some(1), Ok(1))]
    #[case(Some(MAX_LIMIT), Ok(MAX_LIMIT))]
    #[case(Some(0), Err(()))]
    #[case(Some(MAX_LIMIT + 1), Err(()))]
    fn limits_are_bounded(#[case] limit: Option<usize>, #[case] expected: Result<usize, ()>) {
        let resolved = LimitQuery { limit }.resolve().map_err(|_| ());
        assert_eq!(resolved, expected);
    }
}

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::{Caller, UserId};
use crate::workflows::catalog::domain::ShelterId;

/// Headers set by the authenticating gateway in front of this service.
pub const USER_ID_HEADER: &str = "x-user-id";
pub const ROLE_HEADER: &str = "x-user-role";
pub const SHELTER_ID_HEADER: &str = "x-shelter-id";

#[derive(Debug, thiserror::Error)]
pub enum IdentityRejection {
    #[error("missing x-user-id header")]
    MissingUser,
    #[error("x-user-id must be a positive integer, found '{0}'")]
    MalformedUser(String),
}

impl IntoResponse for IdentityRejection {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Build a caller from raw claim values. A missing role or an unparseable shelter id narrows
/// access rather than failing the request.
pub fn resolve(
    user_id: Option<&str>,
    role: Option<&str>,
    shelter_id: Option<&str>,
) -> Result<Caller, IdentityRejection> {
    let raw_user = user_id.ok_or(IdentityRejection::MissingUser)?;
    let user_id = match raw_user.parse::<u64>() {
        Ok(id) if id > 0 => UserId(id),
        _ => return Err(IdentityRejection::MalformedUser(raw_user.to_string())),
    };
    let shelter_id = shelter_id
        .and_then(|raw| raw.parse::<u64>().ok())
        .map(ShelterId);

    Ok(Caller::from_claims(role.unwrap_or_default(), user_id, shelter_id))
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = IdentityRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        resolve(
            header(parts, USER_ID_HEADER),
            header(parts, ROLE_HEADER),
            header(parts, SHELTER_ID_HEADER),
        )
    }
}

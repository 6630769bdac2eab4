use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::errors::AppError;

/// Caller identity, as established by the session collaborator upstream.
/// This core only consumes the result: a `x-user-id` header carrying the
/// authenticated uuid. Absent or malformed means 401.
pub struct UserId(pub Uuid);

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing x-user-id header".into()))?;
        let id = Uuid::parse_str(raw)
            .map_err(|_| AppError::Unauthorized("malformed x-user-id header".into()))?;
        Ok(Self(id))
    }
}

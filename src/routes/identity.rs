use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::{
    error::AppError,
    services::user_service::{self, ActingUser},
    state::SharedState,
};

/// Header carrying the caller's user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Resolve the caller from `X-User-Id`; a missing, malformed or unknown id is a 401.
impl FromRequestParts<SharedState> for ActingUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized("missing X-User-Id header".into()))?;
        let user_id = header
            .to_str()
            .ok()
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .ok_or_else(|| AppError::Unauthorized("malformed X-User-Id header".into()))?;
        Ok(user_service::identify(state, user_id).await?)
    }
}

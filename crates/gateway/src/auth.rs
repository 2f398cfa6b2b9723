//! Caller identity extraction.
//!
//! Authentication lives upstream; the gateway trusts the `x-user-id` header
//! set by the fronting proxy.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;

const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller's user id.
pub struct UserId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::unauthorized("missing x-user-id header"))?;

        let id = header
            .to_str()
            .ok()
            .and_then(|value| value.parse::<i64>().ok())
            .ok_or_else(|| ApiError::bad_request("invalid x-user-id header"))?;

        Ok(Self(id))
    }
}

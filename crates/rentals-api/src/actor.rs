//! Actor identity resolution for API requests.
//!
//! The resolution chain: `x-user-id` header > `x-actor` header > `system`.
//! Every mutation and every history read is attributed to the resolved actor.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use rentals_core::validate::validate_actor;

use crate::envelope::ApiError;

/// Primary header carrying the caller identity.
pub const USER_HEADER: &str = "x-user-id";
/// Secondary header, accepted for clients that name the actor directly.
pub const ACTOR_HEADER: &str = "x-actor";
/// Identity used when a request names no actor.
pub const DEFAULT_ACTOR: &str = "system";

/// Header reader trait for dependency injection in tests.
trait HeaderReader {
    /// `None` when absent or blank, `Some(Err(()))` when not valid UTF-8.
    fn read(&self, name: &str) -> Option<Result<String, ()>>;
}

impl HeaderReader for HeaderMap {
    fn read(&self, name: &str) -> Option<Result<String, ()>> {
        let value = self.get(name)?;
        match value.to_str() {
            Ok(v) if v.trim().is_empty() => None,
            Ok(v) => Some(Ok(v.trim().to_string())),
            Err(_) => Some(Err(())),
        }
    }
}

fn resolve_actor_with(headers: &dyn HeaderReader) -> Result<String, ApiError> {
    for name in [USER_HEADER, ACTOR_HEADER] {
        match headers.read(name) {
            Some(Ok(actor)) => {
                return validate_actor(&actor).map_err(|e| ApiError::from_validation(vec![e]));
            }
            Some(Err(())) => {
                return Err(ApiError::bad_request(
                    format!("header {name} is not valid UTF-8"),
                    Some("send the actor identity as plain ASCII or UTF-8 text"),
                ));
            }
            None => {}
        }
    }
    Ok(DEFAULT_ACTOR.to_string())
}

/// Resolve the actor for a request from its headers.
///
/// # Errors
///
/// Returns a 400 [`ApiError`] when the header is not UTF-8 or exceeds the
/// actor length limit.
pub fn resolve_actor(headers: &HeaderMap) -> Result<String, ApiError> {
    resolve_actor_with(headers)
}

/// Extractor yielding the resolved actor identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        resolve_actor(&parts.headers).map(Self)
    }
}

//! Route table and shared extraction helpers.

mod health;
mod history;
mod properties;

use axum::Router;
use axum::http::Uri;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::envelope::ApiError;
use crate::state::AppState;

/// Build the full API router over `state`.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/properties",
            post(properties::create).get(properties::list),
        )
        .route("/properties/code/:code", get(properties::get_by_code))
        .route(
            "/properties/:id",
            get(properties::get)
                .patch(properties::update)
                .delete(properties::delete),
        )
        .route("/properties/:id/events", post(properties::record_event))
        .route("/properties/:id/history", get(history::history))
        .route(
            "/properties/:id/history/fields/:field",
            get(history::field_provenance),
        )
        .route("/properties/:id/history/export", get(history::export))
        .route("/properties/:id/audit", get(history::audit_trail))
        .route("/history/recent", get(history::recent))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::route_not_found(uri.path())
}

/// Parse a property id path segment.
fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| {
        ApiError::bad_request(
            format!("'{raw}' is not a valid property id"),
            Some("property ids are UUIDs; use /properties/code/:code to look up by code"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).ok(), Some(id));
    }

    #[test]
    fn parse_id_rejects_codes() {
        let err = parse_id("PROP-20250101-001").expect_err("not a uuid");
        assert_eq!(err.status.as_u16(), 400);
    }
}

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use rentals_core::model::Property;
use rentals_core::request::{
    CreatePropertyRequest, DeletePropertyRequest, PropertyListQuery, RecordEventRequest,
    UpdatePropertyRequest,
};
use rentals_core::service::{EventOutcome, UpdateOutcome};
use rentals_core::store::PropertyPage;

use super::parse_id;
use crate::actor::Actor;
use crate::envelope::{ApiError, Envelope, created, ok};
use crate::state::AppState;

type Created<T> = (StatusCode, Json<Envelope<T>>);

pub(super) async fn create(
    State(state): State<AppState>,
    Actor(actor): Actor,
    body: Result<Json<CreatePropertyRequest>, JsonRejection>,
) -> Result<Created<Property>, ApiError> {
    let Json(request) = body?;
    let property = state.rentals.properties.create(&request, &actor)?;
    Ok(created(property))
}

pub(super) async fn list(
    State(state): State<AppState>,
    query: Result<Query<PropertyListQuery>, QueryRejection>,
) -> Result<Json<Envelope<PropertyPage>>, ApiError> {
    let Query(query) = query?;
    Ok(ok(state.rentals.properties.list(&query)?))
}

pub(super) async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Envelope<Property>>, ApiError> {
    let id = parse_id(&id)?;
    Ok(ok(state.rentals.properties.get(id)?))
}

pub(super) async fn get_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Envelope<Property>>, ApiError> {
    Ok(ok(state.rentals.properties.get_by_code(&code)?))
}

pub(super) async fn update(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<String>,
    body: Result<Json<UpdatePropertyRequest>, JsonRejection>,
) -> Result<Json<Envelope<UpdateOutcome>>, ApiError> {
    let id = parse_id(&id)?;
    let Json(request) = body?;
    Ok(ok(state.rentals.properties.update(id, &request, &actor)?))
}

/// The body is optional on DELETE; an empty body means no reason.
pub(super) async fn delete(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Envelope<Property>>, ApiError> {
    let id = parse_id(&id)?;
    let request = parse_optional_body::<DeletePropertyRequest>(&body)?;
    Ok(ok(state.rentals.properties.delete(id, &request, &actor)?))
}

pub(super) async fn record_event(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<String>,
    body: Result<Json<RecordEventRequest>, JsonRejection>,
) -> Result<Created<EventOutcome>, ApiError> {
    let id = parse_id(&id)?;
    let Json(request) = body?;
    let outcome = state.rentals.properties.record_event(id, &request, &actor)?;
    Ok(created(outcome))
}

fn parse_optional_body<T>(body: &[u8]) -> Result<T, ApiError>
where
    T: serde::de::DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        ApiError::bad_request(
            format!("failed to parse request body: {e}"),
            Some("send a JSON object or no body at all"),
        )
    })
}

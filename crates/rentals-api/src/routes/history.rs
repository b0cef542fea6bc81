use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use rentals_core::history::{AuditRecord, HistoryEntry, HistoryPage};
use rentals_core::request::{ExportQuery, HistoryQuery, RecentActivityQuery};
use rentals_core::service::FieldProvenance;
use serde::Deserialize;
use tracing::debug;

use super::parse_id;
use crate::actor::Actor;
use crate::envelope::{ApiError, Envelope, ok};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct LimitQuery {
    limit: Option<usize>,
}

pub(super) async fn history(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<String>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<Envelope<HistoryPage>>, ApiError> {
    let id = parse_id(&id)?;
    let Query(query) = query?;
    Ok(ok(state.rentals.history.history(id, &query, &actor)?))
}

pub(super) async fn field_provenance(
    State(state): State<AppState>,
    Path((id, field)): Path<(String, String)>,
) -> Result<Json<Envelope<FieldProvenance>>, ApiError> {
    let id = parse_id(&id)?;
    Ok(ok(state.rentals.history.field_provenance(id, &field)?))
}

/// Returns the rendered document itself, not the envelope.
pub(super) async fn export(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<String>,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let Query(query) = query?;
    let export = state.rentals.history.export(id, &query, &actor)?;
    debug!(
        filename = %export.filename,
        records = export.record_count,
        "serving history export"
    );
    let disposition = format!("attachment; filename=\"{}\"", export.filename);
    Ok((
        [
            (header::CONTENT_TYPE, export.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.body,
    )
        .into_response())
}

pub(super) async fn audit_trail(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> Result<Json<Envelope<Vec<AuditRecord>>>, ApiError> {
    let id = parse_id(&id)?;
    let Query(query) = query?;
    Ok(ok(state.rentals.history.audit_trail(id, query.limit)?))
}

pub(super) async fn recent(
    State(state): State<AppState>,
    query: Result<Query<RecentActivityQuery>, QueryRejection>,
) -> Result<Json<Envelope<Vec<HistoryEntry>>>, ApiError> {
    let Query(query) = query?;
    Ok(ok(state.rentals.history.recent_activity(&query)?))
}

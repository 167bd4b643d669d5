//! Handlers for records carrying items attributes.
//!
//! Submissions are flat JSON objects in the shape the form widget posts:
//! each items field's rows arrive JSON-encoded under its attribute name.
//! Every registered field is filled before anything is saved, so a single
//! failing field leaves the stored record unchanged.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use items_core::error::CoreError;
use items_core::submission::Submission;
use items_core::types::DbId;
use items_core::widget::{render_view, DisplayMode};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;
use crate::store::StoredRecord;

#[derive(Debug, Deserialize)]
pub struct ViewParams {
    #[serde(default)]
    pub mode: DisplayMode,
}

fn record_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Record",
        id,
    })
}

/// GET /api/v1/records
pub async fn list_records(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let records = state.records.read().await;
    let data: Vec<StoredRecord> = records.list().cloned().collect();
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/records/{id}
pub async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let records = state.records.read().await;
    let record = records.get(id).cloned().ok_or_else(|| record_not_found(id))?;
    Ok(Json(DataResponse { data: record }))
}

/// POST /api/v1/records
///
/// Create a record from a submission. Fields absent from the submission are
/// left unset.
pub async fn create_record(
    State(state): State<AppState>,
    Json(submission): Json<Submission>,
) -> AppResult<impl IntoResponse> {
    let mut attributes = serde_json::Map::new();
    state.fields.fill_all(&submission, &mut attributes)?;

    let record = state.records.write().await.insert(attributes);
    tracing::info!(record_id = record.id, "Record created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: record })))
}

/// PUT /api/v1/records/{id}
///
/// Apply a submission to an existing record. Only submitted fields change.
pub async fn update_record(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(submission): Json<Submission>,
) -> AppResult<impl IntoResponse> {
    let mut records = state.records.write().await;
    let mut record = records.get(id).cloned().ok_or_else(|| record_not_found(id))?;

    state.fields.fill_all(&submission, &mut record)?;

    if !records.save(record.clone()) {
        return Err(AppError::InternalError(format!(
            "record {id} disappeared during update"
        )));
    }
    tracing::info!(record_id = id, "Record updated");

    Ok(Json(DataResponse { data: record }))
}

/// GET /api/v1/records/{id}/fields/{attribute}/view?mode=index|detail|form
///
/// The view the row-list widget renders for one field of one record.
pub async fn get_field_view(
    State(state): State<AppState>,
    Path((id, attribute)): Path<(DbId, String)>,
    Query(params): Query<ViewParams>,
) -> AppResult<impl IntoResponse> {
    let field = state
        .fields
        .get(&attribute)
        .ok_or_else(|| AppError::Core(CoreError::UnknownField(attribute.clone())))?;

    let records = state.records.read().await;
    let record = records.get(id).ok_or_else(|| record_not_found(id))?;

    let view = render_view(
        &field.meta(),
        record.attributes.get(field.attribute()),
        params.mode,
    );
    Ok(Json(DataResponse { data: view }))
}

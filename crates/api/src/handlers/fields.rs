//! Handlers exposing the registered items fields to the front end.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use items_core::error::CoreError;
use items_core::items::FieldMeta;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/fields
///
/// Serialized configuration of every registered field, in registration order.
pub async fn list_fields(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let fields: Vec<FieldMeta> = state.fields.iter().map(|f| f.meta()).collect();
    Ok(Json(DataResponse { data: fields }))
}

/// GET /api/v1/fields/{attribute}
pub async fn get_field(
    State(state): State<AppState>,
    Path(attribute): Path<String>,
) -> AppResult<impl IntoResponse> {
    let field = state
        .fields
        .get(&attribute)
        .ok_or(AppError::Core(CoreError::UnknownField(attribute)))?;

    Ok(Json(DataResponse { data: field.meta() }))
}

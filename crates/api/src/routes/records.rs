//! Route definitions for the `/records` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::records;
use crate::state::AppState;

/// Routes mounted at `/records`.
///
/// ```text
/// GET    /                               -> list_records
/// POST   /                               -> create_record
/// GET    /{id}                           -> get_record
/// PUT    /{id}                           -> update_record
/// GET    /{id}/fields/{attribute}/view   -> get_field_view
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(records::list_records).post(records::create_record),
        )
        .route(
            "/{id}",
            get(records::get_record).put(records::update_record),
        )
        .route(
            "/{id}/fields/{attribute}/view",
            get(records::get_field_view),
        )
}

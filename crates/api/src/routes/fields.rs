//! Route definitions for the `/fields` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::fields;
use crate::state::AppState;

/// Routes mounted at `/fields`.
///
/// ```text
/// GET    /              -> list_fields
/// GET    /{attribute}   -> get_field
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(fields::list_fields))
        .route("/{attribute}", get(fields::get_field))
}

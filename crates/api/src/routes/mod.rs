pub mod fields;
pub mod health;
pub mod records;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /fields                                   list registered fields
/// /fields/{attribute}                       field configuration
///
/// /records                                  list, create
/// /records/{id}                             get, update
/// /records/{id}/fields/{attribute}/view     widget view (?mode=index|detail|form)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/fields", fields::router())
        .nest("/records", records::router())
}

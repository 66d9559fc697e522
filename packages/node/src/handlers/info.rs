//! Service information handler — `GET /`.

use axum::{extract::State, Json};
use nanopub_submitter_api::ServiceInfo;

use super::AppState;

/// `GET /`
///
/// Returns the service name and build information.
pub async fn info(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json((*state.info).clone())
}

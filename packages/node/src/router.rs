//! Assembles the Axum [`Router`] from the handler modules.

use std::any::Any;

use axum::{
    extract::DefaultBodyLimit,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::{
    error::AppError,
    handlers::{info, submit, AppState},
};

/// Largest accepted submission body.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Build the complete application router with shared state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(info::info))
        .route("/submit", post(submit::submit))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("router: handler panicked: {detail}");
    AppError::Internal("Failed to process the nanopublication".into()).into_response()
}

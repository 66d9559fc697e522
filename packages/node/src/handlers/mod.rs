//! HTTP request handlers for the submission service.
//!
//! Handlers are thin async functions that receive Axum extractors and return
//! `Result<impl IntoResponse, AppError>`; the work happens in
//! [`Submitter`](crate::submission::Submitter).

pub mod info;
pub mod submit;

use std::sync::Arc;

use nanopub_submitter_api::ServiceInfo;

use crate::submission::Submitter;

/// Display name reported by `GET /`.
pub const SERVICE_NAME: &str = "Nanopublication Submission Service";

/// Shared application state threaded through all Axum handlers via [`axum::extract::State`].
#[derive(Clone)]
pub struct AppState {
    pub submitter: Submitter,
    pub info: Arc<ServiceInfo>,
}

impl AppState {
    pub fn new(submitter: Submitter) -> Self {
        Self {
            submitter,
            info: Arc::new(service_info()),
        }
    }
}

/// Build information for this binary.
///
/// `SUBMITTER_BUILD_VERSION` and `SUBMITTER_BUILT_AT` are read at compile
/// time; unset values are reported as `"unknown"`.
pub fn service_info() -> ServiceInfo {
    ServiceInfo {
        name: SERVICE_NAME.into(),
        package_version: env!("CARGO_PKG_VERSION").into(),
        version: option_env!("SUBMITTER_BUILD_VERSION")
            .unwrap_or("unknown")
            .into(),
        built_at: option_env!("SUBMITTER_BUILT_AT").unwrap_or("unknown").into(),
    }
}

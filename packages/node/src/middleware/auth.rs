//! Bearer-token authentication for the submission endpoint.
//!
//! When `SUBMITTER_TOKENS` is empty the service is open and [`RequireToken`]
//! always succeeds. Otherwise the request must carry
//! `Authorization: Bearer <token>` with one of the configured tokens.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use nanopub_submitter_api::{error::codes, ErrorResponse};

use crate::handlers::AppState;

// ---------------------------------------------------------------------------
// Auth errors
// ---------------------------------------------------------------------------

/// An authentication failure that maps to HTTP 401.
#[derive(Debug)]
pub struct AuthError(pub String);

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = ErrorResponse::new(codes::UNAUTHORIZED, self.0.clone());
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Bearer")],
            Json(body),
        )
            .into_response()
    }
}

// ---------------------------------------------------------------------------
// RequireToken extractor
// ---------------------------------------------------------------------------

/// Axum extractor that enforces the configured bearer tokens.
pub struct RequireToken;

impl<S> FromRequestParts<S> for RequireToken
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AuthError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let app_state = AppState::from_ref(state);
        let result = check_token(parts, &app_state.submitter.config().tokens);
        async move {
            result.map_err(AuthError)?;
            Ok(RequireToken)
        }
    }
}

/// Verify the `Authorization` header against `tokens`.
///
/// An empty `tokens` list accepts every request.
pub(crate) fn check_token(parts: &Parts, tokens: &[String]) -> Result<(), String> {
    if tokens.is_empty() {
        return Ok(());
    }

    let value = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| "missing Authorization header".to_string())?;

    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .ok_or_else(|| "Authorization header must use the Bearer scheme".to_string())?;

    if tokens.iter().any(|t| t == token) {
        Ok(())
    } else {
        tracing::debug!("auth: rejected unknown bearer token");
        Err("invalid token".into())
    }
}

//! Submission handler — `POST /submit`.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
};
use nanopub_submitter::{DEFAULT_ENCODING, TRIG_MEDIA_TYPE};
use nanopub_submitter_api::SubmitQuery;
use tracing::warn;

use super::AppState;
use crate::{
    error::AppError,
    middleware::auth::RequireToken,
    submission::{SubmitError, SubmitOverrides},
};

/// `POST /submit`
///
/// Accepts a TriG document (single nanopublication or bundle) and runs the
/// submission pipeline on it. Responds `201 Created` with the final URI in
/// `Location` and a plain-text summary as the body.
///
/// Query parameters:
/// - `servers` — comma-separated target servers replacing the configured ones.
/// - `uri_replace` — `OLD|NEW` rewrite rule for the reported URI.
pub async fn submit(
    State(state): State<AppState>,
    _auth: RequireToken,
    Query(query): Query<SubmitQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let data = decode_document(content_type, &body)?;

    let overrides = SubmitOverrides {
        servers: query.server_list(),
        uri_replace: query.uri_replace,
    };
    let result = state.submitter.submit(&data, overrides).await?;

    let location = location_header(result.location());
    Ok((
        StatusCode::CREATED,
        [
            (header::LOCATION, location),
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            ),
        ],
        result.to_string(),
    ))
}

/// `Location` value for `uri`.
///
/// IRIs outside visible ASCII are percent-encoded character by character;
/// the nanopub is already published at this point, so this cannot fail.
fn location_header(uri: &str) -> HeaderValue {
    if let Ok(value) = HeaderValue::from_str(uri) {
        if uri.bytes().all(|b| b.is_ascii_graphic()) {
            return value;
        }
    }
    let encoded: String = uri
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() {
                c.to_string()
            } else {
                urlencoding::encode(c.encode_utf8(&mut [0; 4])).into_owned()
            }
        })
        .collect();
    warn!("submit: nanopub URI {uri} percent-encoded for the Location header");
    HeaderValue::from_str(&encoded).unwrap_or_else(|_| HeaderValue::from_static("/"))
}

/// Check the declared media type and charset and decode the body.
///
/// Only `application/trig` is accepted. The charset defaults to UTF-8;
/// US-ASCII is accepted as a subset of it.
pub(crate) fn decode_document(
    content_type: Option<&str>,
    body: &[u8],
) -> Result<String, SubmitError> {
    let (media, charset) = match content_type {
        Some(value) => parse_content_type(value),
        None => return Err(SubmitError::UnsupportedContentType("(none)".into())),
    };
    if media != TRIG_MEDIA_TYPE {
        return Err(SubmitError::UnsupportedContentType(media));
    }

    let charset = charset.unwrap_or_else(|| DEFAULT_ENCODING.to_string());
    match charset.as_str() {
        "utf-8" | "utf8" => {}
        "us-ascii" | "ascii" => {
            if !body.is_ascii() {
                return Err(SubmitError::InvalidEncoding(charset));
            }
        }
        _ => return Err(SubmitError::UnsupportedCharset(charset)),
    }
    String::from_utf8(body.to_vec()).map_err(|_| SubmitError::InvalidEncoding(charset))
}

/// Split a `Content-Type` value into its lowercased media type and charset.
fn parse_content_type(value: &str) -> (String, Option<String>) {
    let mut params = value.split(';');
    let media = params.next().unwrap_or_default().trim().to_ascii_lowercase();
    let charset = params.find_map(|param| {
        let (key, val) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| val.trim().trim_matches('"').to_ascii_lowercase())
    });
    (media, charset)
}

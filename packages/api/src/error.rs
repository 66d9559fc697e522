//! Standard error response body.

use serde::{Deserialize, Serialize};

/// The JSON body returned for all error responses.
///
/// ```json
/// { "error": "Failed to make TrustyURI for nanopub.", "code": "stamping_failed" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Human-readable description of the problem.
    pub error: String,

    /// Machine-readable error code.
    ///
    /// | `code` | HTTP status |
    /// |--------|------------|
    /// | `unsupported_content_type` | 400 |
    /// | `unsupported_charset` | 400 |
    /// | `invalid_rdf` | 400 |
    /// | `uri_not_found` | 400 |
    /// | `unauthorized` | 401 |
    /// | `stamping_failed` | 500 |
    /// | `publish_failed` | 500 |
    /// | `internal_error` | 500 |
    pub code: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a static code and message.
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            error: error.into(),
        }
    }
}

/// Well-known error codes.
pub mod codes {
    pub const UNSUPPORTED_CONTENT_TYPE: &str = "unsupported_content_type";
    pub const UNSUPPORTED_CHARSET: &str = "unsupported_charset";
    pub const INVALID_RDF: &str = "invalid_rdf";
    pub const URI_NOT_FOUND: &str = "uri_not_found";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const STAMPING_FAILED: &str = "stamping_failed";
    pub const PUBLISH_FAILED: &str = "publish_failed";
    pub const INTERNAL_ERROR: &str = "internal_error";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialises_error_and_code() {
        let e = ErrorResponse::new(codes::INVALID_RDF, "Invalid RDF");
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["code"], "invalid_rdf");
        assert_eq!(json["error"], "Invalid RDF");
    }
}
